use std::path::PathBuf;

use thiserror::Error;

use crate::codec::DecodeError;

/// Errors from the policy store and policy file helpers.
#[derive(Debug, Error)]
pub enum AclError {
    /// The database file could not be opened or its schema ensured.
    #[error("open database: {0}")]
    Open(String),

    #[error("read policy file {}", .path.display())]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("write policy file {}", .path.display())]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("encode policy: {0}")]
    Encode(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    /// Writing the policy failed; nothing was changed.
    #[error("update policy: {0}")]
    Update(String),

    #[error("storage: {0}")]
    Storage(String),
}
