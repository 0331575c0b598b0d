use thiserror::Error;

/// Errors from the embedded SQL store. Nothing here is retried.
#[derive(Error, Debug)]
pub enum SQLError {
    #[error("query error: {0}")]
    Query(String),

    #[error("execution error: {0}")]
    Execution(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("transaction error: {0}")]
    Transaction(String),

    /// Another process holds the database lock.
    #[error("database busy: {0}")]
    Busy(String),
}

impl SQLError {
    /// Classify a rusqlite error, reporting lock contention as `Busy`.
    pub(crate) fn from_sqlite(e: rusqlite::Error, kind: fn(String) -> SQLError) -> Self {
        match e.sqlite_error_code() {
            Some(rusqlite::ErrorCode::DatabaseBusy) | Some(rusqlite::ErrorCode::DatabaseLocked) => {
                SQLError::Busy(e.to_string())
            }
            _ => kind(e.to_string()),
        }
    }
}
