use crate::error::SQLError;

/// One SQLite value. Variants follow SQLite's storage classes, so a column
/// read back keeps the class it was stored with.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    /// SQLite's name for the storage class, as `typeof()` reports it.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Integer(_) => "integer",
            Value::Real(_) => "real",
            Value::Text(_) => "text",
            Value::Blob(_) => "blob",
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

/// Result row. Columns keep the order of the SELECT list.
#[derive(Debug, Clone)]
pub struct Row {
    pub columns: Vec<(String, Value)>,
}

impl Row {
    /// Value of the named column; `None` if the query did not select it.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find_map(|(column, value)| (column == name).then_some(value))
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_text)
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_integer)
    }

    /// Integer column read as a flag; SQLite stores booleans as 0/1.
    pub fn flag(&self, name: &str) -> Option<bool> {
        self.integer(name).map(|i| i != 0)
    }
}

/// Statement execution against an embedded database.
pub trait SQLStore: Send + Sync {
    /// Run a SELECT and collect every row.
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, SQLError>;

    /// Run one INSERT/UPDATE/DELETE; returns the rows changed.
    fn exec(&self, sql: &str, params: &[Value]) -> Result<u64, SQLError>;

    /// Execute statements inside one transaction and return the total affected
    /// row count. Either every statement is committed or none is.
    fn exec_tx(&self, statements: &[(&str, &[Value])]) -> Result<u64, SQLError>;
}
