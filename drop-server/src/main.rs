use clap::Parser;

use drop_server::api;
use drop_server::cli::Cli;
use drop_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let state = AppState::init(&cli.data_dir).await?;
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(cli.addr).await?;
    log::info!("listening on {}", cli.addr);
    axum::serve(listener, app).await?;

    Ok(())
}
