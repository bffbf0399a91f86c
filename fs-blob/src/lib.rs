use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use drop_error::{DropError, Result};
use tokio::fs;

/// Blob folder name inside the data directory.
pub const UPLOADS_FOLDER: &str = "uploads";

/// Directory of raw uploaded content, one blob per registry record.
///
/// Blob names are derived from the record id, so they never collide with
/// each other or with client-supplied names. The store applies no locking
/// of its own; callers serialize mutations through the registry.
#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    /// Open the store, creating its directory when needed.
    pub async fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    /// Derive the on-disk name for a record: the id plus the original
    /// name's final extension, when it has one.
    pub fn stored_name(id: &str, original_filename: &str) -> String {
        match Path::new(original_filename)
            .extension()
            .and_then(|ext| ext.to_str())
        {
            Some(ext) => format!("{id}.{ext}"),
            None => id.to_string(),
        }
    }

    pub fn path_of(&self, stored_name: &str) -> PathBuf {
        self.root.join(stored_name)
    }

    pub async fn contains(&self, stored_name: &str) -> bool {
        fs::try_exists(self.path_of(stored_name))
            .await
            .unwrap_or(false)
    }

    /// Write blob content under `stored_name`.
    ///
    /// The bytes go to a temporary `.part` file first and are renamed into
    /// place once fully written, so a failed write never leaves a partial
    /// blob under a live name.
    pub async fn put(&self, stored_name: &str, content: &[u8]) -> Result<()> {
        let tmp = self.root.join(format!("{stored_name}.part"));
        if let Err(err) = fs::write(&tmp, content).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(err.into());
        }
        fs::rename(&tmp, self.path_of(stored_name)).await?;
        log::debug!("blob {} written ({} bytes)", stored_name, content.len());
        Ok(())
    }

    /// Open a blob for sequential reading.
    pub async fn get(&self, stored_name: &str) -> Result<fs::File> {
        match fs::File::open(self.path_of(stored_name)).await {
            Ok(file) => Ok(file),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(DropError::NotFound(stored_name.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Remove a blob. A blob that is already gone counts as removed: an
    /// earlier partial failure may have deleted it first.
    pub async fn delete(&self, stored_name: &str) -> Result<()> {
        match fs::remove_file(self.path_of(stored_name)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
