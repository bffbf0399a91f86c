use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DropError>;

#[derive(Error, Debug)]
pub enum DropError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Storage error: {0} {1}")]
    Storage(String, String),
    #[error("Parsing error")]
    Parse,
    #[error("Not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<serde_json::Error> for DropError {
    fn from(_: serde_json::Error) -> Self {
        Self::Parse
    }
}
