//! Reading and writing standalone policy files.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::codec::{self, Origin};
use crate::error::AclError;
use crate::model::AclPolicy;

/// Read and decode a policy file.
pub fn load_policy_file(path: &Path) -> Result<AclPolicy, AclError> {
    let body = fs::read(path).map_err(|source| AclError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), bytes = body.len(), "policy file read");
    Ok(codec::decode_from(&body, Origin::File(path.to_path_buf()))?)
}

/// Replace the file's contents with `text`, creating it if needed.
pub fn write_policy_file(path: &Path, text: &str) -> Result<(), AclError> {
    fs::write(path, text).map_err(|source| AclError::FileWrite {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), bytes = text.len(), "policy file written");
    Ok(())
}
