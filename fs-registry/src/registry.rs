use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use drop_error::{DropError, Result};

use crate::record::FileRecord;

/// The authoritative `id -> FileRecord` mapping, persisted as a full JSON
/// snapshot that is rewritten on every mutation.
///
/// The snapshot is a single JSON object keyed by record id. There is no
/// incremental journal; rewriting the whole mapping is acceptable only
/// because record counts stay small (a personal or small-team file drop).
pub struct FileRegistry {
    label: String,
    path: PathBuf,
    entries: BTreeMap<String, FileRecord>,
}

impl FileRegistry {
    /// Load the registry from its snapshot file.
    ///
    /// An absent snapshot starts an empty registry. A malformed snapshot is
    /// logged and discarded, also starting empty. Neither is a fatal
    /// condition; only an unreadable file (I/O failure) is an error.
    pub fn load(label: String, path: &Path) -> Result<Self> {
        let entries = if path.exists() {
            let file = File::open(path)?;
            match serde_json::from_reader(file) {
                Ok(entries) => entries,
                Err(err) => {
                    log::warn!(
                        "{}: malformed snapshot at {}, discarding: {}",
                        label,
                        path.display(),
                        err
                    );
                    BTreeMap::new()
                }
            }
        } else {
            log::info!(
                "{}: no snapshot at {}, starting empty",
                label,
                path.display()
            );
            BTreeMap::new()
        };

        Ok(Self {
            label,
            path: PathBuf::from(path),
            entries,
        })
    }

    /// Add a record and persist the full snapshot.
    ///
    /// When persisting fails the in-memory entry REMAINS and the error is
    /// returned; the snapshot catches up on the next successful mutation.
    pub fn insert(&mut self, record: FileRecord) -> Result<()> {
        self.entries.insert(record.id.clone(), record);
        self.persist()
    }

    /// Look up a record by id.
    pub fn get(&self, id: &str) -> Option<&FileRecord> {
        self.entries.get(id)
    }

    /// All live records, in no guaranteed order. Ordering is a
    /// presentation concern applied by the consumer.
    pub fn records(&self) -> Vec<FileRecord> {
        self.entries.values().cloned().collect()
    }

    /// Remove a record (no-op when absent) and persist the full snapshot.
    pub fn remove(&mut self, id: &str) -> Result<()> {
        self.entries.remove(id);
        self.persist()
    }

    /// Drop a record whose backing blob was discovered missing.
    ///
    /// Invoked by the download path as a self-healing repair; the registry
    /// never verifies blob presence proactively.
    pub fn reconcile_missing(&mut self, id: &str) -> Result<()> {
        log::warn!("{}: blob missing for {}, removing record", self.label, id);
        self.remove(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize the entire mapping and overwrite the snapshot file.
    ///
    /// The content goes to a temporary file in the same directory and is
    /// renamed into place, so a crash mid-write never leaves a torn
    /// snapshot behind.
    fn persist(&self) -> Result<()> {
        self.write_snapshot().map_err(|err| {
            DropError::Storage(self.label.clone(), err.to_string())
        })
    }

    fn write_snapshot(&self) -> Result<()> {
        let parent = self.path.parent().ok_or_else(|| {
            DropError::Storage(
                self.label.clone(),
                "snapshot path has no parent directory".to_owned(),
            )
        })?;
        fs::create_dir_all(parent)?;

        let tmp = self.path.with_extension("json.tmp");
        let file = File::create(&tmp)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &self.entries)
            .map_err(|err| DropError::Storage(self.label.clone(), err.to_string()))?;
        writer.flush()?;
        fs::rename(&tmp, &self.path)?;

        log::info!(
            "{}: {} record(s) written to snapshot",
            self.label,
            self.entries.len()
        );
        Ok(())
    }
}
