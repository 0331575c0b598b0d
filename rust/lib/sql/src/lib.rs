pub mod error;
pub mod sqlite;
pub mod traits;

pub use error::SQLError;
pub use sqlite::{JournalMode, SqliteOptions, SqliteStore, Synchronous};
pub use traits::{Row, SQLStore, Value};
