use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Metadata describing one uploaded file.
///
/// The camelCase field names are the registry snapshot's on-disk format;
/// API consumers receive records in the same shape. Records are immutable
/// once created, there is no update operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    /// Opaque unique id, generated at upload time. Registry key and
    /// lookup handle for download/delete.
    pub id: String,
    /// Client-supplied name. Untrusted, used for display and the download
    /// disposition header only.
    pub original_filename: String,
    /// On-disk blob name, derived from `id` plus the original extension.
    pub stored_filename: String,
    /// Byte length as reported by the upload transport.
    pub size: u64,
    /// Client-declared content type, untrusted.
    pub mime_type: String,
    /// Milliseconds since the Unix epoch, assigned server-side when the
    /// registry entry is created.
    pub upload_time: u64,
}

impl FileRecord {
    /// Build a record for a freshly uploaded file, stamped with the
    /// current time.
    pub fn new(
        id: String,
        original_filename: String,
        stored_filename: String,
        size: u64,
        mime_type: String,
    ) -> Self {
        Self {
            id,
            original_filename,
            stored_filename,
            size,
            mime_type,
            upload_time: now_millis(),
        }
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
