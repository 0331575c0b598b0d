use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use rusqlite::types::{ToSql, ToSqlOutput, ValueRef};
use rusqlite::{Connection, TransactionBehavior, params_from_iter};
use tracing::debug;

use crate::error::SQLError;
use crate::traits::{Row, SQLStore, Value};

/// SQLite `journal_mode` setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalMode {
    Delete,
    Wal,
}

impl JournalMode {
    fn as_str(self) -> &'static str {
        match self {
            JournalMode::Delete => "DELETE",
            JournalMode::Wal => "WAL",
        }
    }
}

/// SQLite `synchronous` setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Synchronous {
    Off,
    Normal,
    Full,
}

impl Synchronous {
    fn as_str(self) -> &'static str {
        match self {
            Synchronous::Off => "OFF",
            Synchronous::Normal => "NORMAL",
            Synchronous::Full => "FULL",
        }
    }
}

/// Connection settings for [`SqliteStore`].
///
/// SQLite's file locking does not coordinate with a connection pool, so the
/// store never holds more than one connection: `max_open` must be 1.
#[derive(Debug, Clone)]
pub struct SqliteOptions {
    pub journal_mode: JournalMode,
    pub synchronous: Synchronous,
    pub foreign_keys: bool,

    /// Maximum number of open connections. Only 1 is accepted.
    pub max_open: u32,

    /// Connections kept open between operations (0 or 1).
    pub max_idle: u32,

    /// An idle connection older than this is closed and reopened on next use.
    pub idle_timeout: Duration,
}

impl Default for SqliteOptions {
    fn default() -> Self {
        Self {
            journal_mode: JournalMode::Wal,
            synchronous: Synchronous::Normal,
            foreign_keys: true,
            max_open: 1,
            max_idle: 1,
            idle_timeout: Duration::from_secs(60 * 60),
        }
    }
}

impl SqliteOptions {
    fn validate(&self) -> Result<(), SQLError> {
        if self.max_open != 1 {
            return Err(SQLError::Connection(format!(
                "sqlite store holds exactly one connection, max_open={} requested",
                self.max_open
            )));
        }
        if self.max_idle > self.max_open {
            return Err(SQLError::Connection(format!(
                "max_idle={} exceeds max_open={}",
                self.max_idle, self.max_open
            )));
        }
        Ok(())
    }

    fn pragmas(&self) -> String {
        format!(
            "PRAGMA journal_mode={}; PRAGMA synchronous={}; PRAGMA foreign_keys={};",
            self.journal_mode.as_str(),
            self.synchronous.as_str(),
            if self.foreign_keys { "ON" } else { "OFF" },
        )
    }
}

enum Target {
    File(PathBuf),
    Memory,
}

struct Slot {
    conn: Option<Connection>,
    last_used: Instant,
}

/// SqliteStore is a SQLStore implementation backed by rusqlite (bundled SQLite).
///
/// Every operation runs on the single connection held in `slot`, serialized by
/// the mutex.
pub struct SqliteStore {
    target: Target,
    options: SqliteOptions,
    slot: Mutex<Slot>,
}

impl SqliteStore {
    /// Open or create a SQLite database at the given path with default options.
    pub fn open(path: &Path) -> Result<Self, SQLError> {
        Self::open_with(path, SqliteOptions::default())
    }

    /// Open or create a SQLite database at the given path.
    pub fn open_with(path: &Path, options: SqliteOptions) -> Result<Self, SQLError> {
        options.validate()?;
        let target = Target::File(path.to_path_buf());
        let conn = connect(&target, &options)?;
        debug!(
            path = %path.display(),
            journal_mode = options.journal_mode.as_str(),
            synchronous = options.synchronous.as_str(),
            "sqlite store opened"
        );
        Ok(Self {
            target,
            options,
            slot: Mutex::new(Slot {
                conn: Some(conn),
                last_used: Instant::now(),
            }),
        })
    }

    /// Create an in-memory SQLite database (useful for tests).
    ///
    /// The database lives only as long as its connection, so it is never
    /// recycled on idle.
    pub fn open_in_memory() -> Result<Self, SQLError> {
        let options = SqliteOptions::default();
        let target = Target::Memory;
        let conn = connect(&target, &options)?;
        Ok(Self {
            target,
            options,
            slot: Mutex::new(Slot {
                conn: Some(conn),
                last_used: Instant::now(),
            }),
        })
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&mut Connection) -> Result<T, SQLError>,
    ) -> Result<T, SQLError> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|e| SQLError::Connection(e.to_string()))?;

        let recyclable = matches!(self.target, Target::File(_));
        if recyclable
            && slot.conn.is_some()
            && slot.last_used.elapsed() > self.options.idle_timeout
        {
            debug!("closing idle sqlite connection");
            slot.conn = None;
        }

        let mut conn = match slot.conn.take() {
            Some(conn) => conn,
            None => connect(&self.target, &self.options)?,
        };

        let result = f(&mut conn);

        slot.last_used = Instant::now();
        if self.options.max_idle > 0 || !recyclable {
            slot.conn = Some(conn);
        }
        result
    }
}

fn connect(target: &Target, options: &SqliteOptions) -> Result<Connection, SQLError> {
    let conn = match target {
        Target::File(path) => Connection::open(path),
        Target::Memory => Connection::open_in_memory(),
    }
    .map_err(|e| SQLError::Connection(e.to_string()))?;

    conn.execute_batch(&options.pragmas())
        .map_err(|e| SQLError::from_sqlite(e, SQLError::Connection))?;

    Ok(conn)
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(rusqlite::types::Value::Null),
            Value::Integer(i) => ToSqlOutput::from(*i),
            Value::Real(f) => ToSqlOutput::from(*f),
            Value::Text(s) => ToSqlOutput::from(s.as_str()),
            Value::Blob(b) => ToSqlOutput::from(b.as_slice()),
        })
    }
}

/// Keep the column's storage class: a BLOB stays a blob, TEXT stays text.
fn value_from_ref(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(f) => Value::Real(f),
        ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Blob(b.to_vec()),
    }
}

impl SQLStore for SqliteStore {
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, SQLError> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(sql)
                .map_err(|e| SQLError::Query(e.to_string()))?;

            let column_names: Vec<String> = stmt
                .column_names()
                .iter()
                .map(|s| s.to_string())
                .collect();

            let rows = stmt
                .query_map(params_from_iter(params.iter()), |row| {
                    let mut columns = Vec::with_capacity(column_names.len());
                    for (i, name) in column_names.iter().enumerate() {
                        columns.push((name.clone(), value_from_ref(row.get_ref(i)?)));
                    }
                    Ok(Row { columns })
                })
                .map_err(|e| SQLError::Query(e.to_string()))?;

            let mut result = Vec::new();
            for row in rows {
                result.push(row.map_err(|e| SQLError::Query(e.to_string()))?);
            }
            Ok(result)
        })
    }

    fn exec(&self, sql: &str, params: &[Value]) -> Result<u64, SQLError> {
        self.with_conn(|conn| {
            let affected = conn
                .execute(sql, params_from_iter(params.iter()))
                .map_err(|e| SQLError::from_sqlite(e, SQLError::Execution))?;
            Ok(affected as u64)
        })
    }

    fn exec_tx(&self, statements: &[(&str, &[Value])]) -> Result<u64, SQLError> {
        self.with_conn(|conn| {
            // IMMEDIATE takes the write lock up front; a busy database fails here.
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(|e| SQLError::from_sqlite(e, SQLError::Transaction))?;

            let mut affected = 0u64;
            for &(sql, params) in statements {
                affected += tx
                    .execute(sql, params_from_iter(params.iter()))
                    .map_err(|e| SQLError::from_sqlite(e, SQLError::Execution))?
                    as u64;
            }

            tx.commit()
                .map_err(|e| SQLError::from_sqlite(e, SQLError::Transaction))?;
            Ok(affected)
        })
    }
}
