use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[clap(name = "drop-server")]
#[clap(about = "Self-hosted file drop server", long_about = None)]
pub struct Cli {
    /// Address to listen on
    #[clap(long, default_value = "127.0.0.1:8080")]
    pub addr: SocketAddr,

    /// Directory holding uploaded blobs and the registry snapshot
    #[clap(long, default_value = "./drop-data")]
    pub data_dir: PathBuf,
}
