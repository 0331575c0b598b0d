pub mod organization;
pub mod policy;
pub mod schema;

use std::path::Path;
use std::sync::Arc;

use meshacl_sql::{SQLStore, SqliteOptions, SqliteStore};
use tracing::debug;

use crate::error::AclError;

/// The only component with database access: reads and replaces the policy
/// stored on organization records.
pub struct PolicyStore {
    pub(crate) sql: Arc<dyn SQLStore>,
}

impl PolicyStore {
    /// Open the database file at `path` with the default single-connection,
    /// WAL-mode settings and ensure the schema exists.
    pub fn open(path: &Path) -> Result<Self, AclError> {
        Self::open_with(path, SqliteOptions::default())
    }

    pub fn open_with(path: &Path, options: SqliteOptions) -> Result<Self, AclError> {
        let sql = SqliteStore::open_with(path, options)
            .map_err(|e| AclError::Open(format!("{}: {}", path.display(), e)))?;
        let store = Self::with_sql(Arc::new(sql)).map_err(|e| match e {
            AclError::Open(msg) => AclError::Open(format!("{}: {}", path.display(), msg)),
            other => other,
        })?;
        debug!(path = %path.display(), "policy store ready");
        Ok(store)
    }

    /// In-memory database (useful for tests).
    pub fn open_in_memory() -> Result<Self, AclError> {
        let sql = SqliteStore::open_in_memory().map_err(|e| AclError::Open(e.to_string()))?;
        Self::with_sql(Arc::new(sql))
    }

    /// Wrap an already opened SQL store, initializing the schema.
    pub fn with_sql(sql: Arc<dyn SQLStore>) -> Result<Self, AclError> {
        let store = Self { sql };
        store.init_schema().map_err(|e| match e {
            AclError::Storage(msg) => AclError::Open(msg),
            other => other,
        })?;
        Ok(store)
    }

    /// Ensure the organizations table exists. Idempotent.
    pub fn init_schema(&self) -> Result<(), AclError> {
        schema::init_schema(self.sql.as_ref()).map_err(|e| AclError::Storage(e.to_string()))
    }
}

pub(crate) fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Random stable id (UUIDv4, no dashes).
pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string().replace('-', "")
}
