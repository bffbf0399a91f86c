use std::path::Path;
use std::sync::Arc;

use fs_blob::BlobStore;
use fs_registry::FileRegistry;
use tokio::sync::Mutex;

/// Shared application state.
///
/// The registry mutex serializes every mutation of the mapping and its
/// snapshot. Blob names are unique per record, so blob I/O needs no lock
/// of its own.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Mutex<FileRegistry>>,
    pub blobs: BlobStore,
}

impl AppState {
    /// Prepare the data directory, open the blob store and load the
    /// registry snapshot.
    pub async fn init(data_dir: &Path) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(data_dir).await?;

        let blobs = BlobStore::open(data_dir.join(fs_blob::UPLOADS_FOLDER)).await?;
        let registry = FileRegistry::load(
            "files".to_string(),
            &data_dir.join(fs_registry::REGISTRY_FILE),
        )?;
        log::info!("registry loaded with {} record(s)", registry.len());

        // Diagnostics only. Repair stays lazy: the download path removes a
        // record once its missing blob is actually observed.
        for record in registry.records() {
            if !blobs.contains(&record.stored_filename).await {
                log::warn!(
                    "record {} has no backing blob {}",
                    record.id,
                    record.stored_filename
                );
            }
        }

        Ok(Self {
            registry: Arc::new(Mutex::new(registry)),
            blobs,
        })
    }
}
