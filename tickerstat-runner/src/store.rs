//! Store trait and the value types that cross the persistence boundary.
//!
//! The store is schema-agnostic: it sees ordered column → value mappings and
//! returns rows as plain value vectors. Success and failure are signalled with
//! HTTP-style `Status` codes, never with errors.

use rusqlite::types::{ToSql, ToSqlOutput, Value as SqlValue, ValueRef};
use serde::Serialize;
use std::fmt;

/// Outcome of a store operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// 200
    Ok,
    /// 201
    Created,
    /// 400: generic failure, including unknown tables and empty inputs.
    BadRequest,
    /// 403: a destructive operation was refused.
    Forbidden,
}

impl Status {
    pub fn code(self) -> u16 {
        match self {
            Status::Ok => 200,
            Status::Created => 201,
            Status::BadRequest => 400,
            Status::Forbidden => 403,
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, Status::Ok | Status::Created)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Status::Ok => "OK",
            Status::Created => "Created",
            Status::BadRequest => "Bad Request",
            Status::Forbidden => "Forbidden",
        };
        write!(f, "{} {reason}", self.code())
    }
}

/// Whether the store holds a live connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Active,
    Inactive,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Active => f.write_str("active"),
            ConnectionStatus::Inactive => f.write_str("inactive"),
        }
    }
}

/// A bound parameter or a column read back from a row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Value {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Integers widen to `f64`; SQLite may store a whole-number double as an integer.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Real(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Real(x) => write!(f, "{x}"),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::Integer(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl From<SqlValue> for Value {
    fn from(v: SqlValue) -> Self {
        match v {
            SqlValue::Null => Value::Null,
            SqlValue::Integer(i) => Value::Integer(i),
            SqlValue::Real(f) => Value::Real(f),
            SqlValue::Text(s) => Value::Text(s),
            SqlValue::Blob(b) => Value::Text(String::from_utf8_lossy(&b).into_owned()),
        }
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(SqlValue::Null),
            Value::Integer(i) => ToSqlOutput::Owned(SqlValue::Integer(*i)),
            Value::Real(f) => ToSqlOutput::Owned(SqlValue::Real(*f)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}

/// One row, columns in table order.
pub type Row = Vec<Value>;

/// Ordered column → value mapping for an insert.
///
/// Setting a column twice replaces the earlier value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields(Vec<(String, Value)>);

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.set(column, value);
        self
    }

    pub fn set(&mut self, column: &str, value: impl Into<Value>) {
        let value = value.into();
        match self.0.iter_mut().find(|(c, _)| c == column) {
            Some(slot) => slot.1 = value,
            None => self.0.push((column.to_string(), value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.iter().find(|(c, _)| c == column).map(|(_, v)| v)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(c, _)| c.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.0.iter().map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: AsRef<str>, V: Into<Value>> FromIterator<(K, V)> for Fields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = Fields::new();
        for (column, value) in iter {
            fields.set(column.as_ref(), value);
        }
        fields
    }
}

/// CRUD primitives over arbitrary tables, owned by exactly one commander.
///
/// Implementations convert every driver failure into a `Status` (or an empty
/// result) and log it; nothing here returns an error.
pub trait Store {
    fn status(&self) -> ConnectionStatus;

    /// Name of the underlying database, used to confirm a drop.
    fn database_name(&self) -> String;

    /// Idempotent creation with the fixed summary schema.
    fn create_table(&mut self, name: &str) -> Status;

    fn insert(&mut self, table: &str, fields: &Fields) -> Status;

    /// `SELECT * FROM table [WHERE condition]` with positional `?` parameters.
    fn select(&mut self, table: &str, condition: Option<&str>, values: &[Value]) -> Vec<Row>;

    fn select_all(&mut self, table: &str) -> Vec<Row> {
        self.select(table, None, &[])
    }

    fn list_tables(&mut self) -> Vec<String>;

    /// Delete matching rows. A blank condition deletes every row.
    fn delete(&mut self, table: &str, condition: &str, values: &[Value]) -> Status;

    fn drop_table(&mut self, table: &str) -> Status;

    /// Close the connection and destroy the database.
    fn drop_database(&mut self) -> Status;

    /// Idempotent.
    fn close(&mut self);
}
