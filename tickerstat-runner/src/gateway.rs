//! SQLite persistence gateway.
//!
//! Owns exactly one `rusqlite::Connection`. Values are always bound as
//! parameters; only table and column identifiers are interpolated, and only
//! after passing `validate_identifier`. Every driver error is logged and turned
//! into a `Status` (or an empty result) at the `Store` boundary.

use crate::store::{ConnectionStatus, Fields, Row, Status, Store, Value};
use rusqlite::{params_from_iter, Connection, OpenFlags};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Columns of every summary table, in table order after `id`.
pub const SUMMARY_COLUMNS: [&str; 8] = [
    "ticker", "metric", "mean", "median", "std", "low", "max", "count",
];

const MAX_IDENTIFIER_LEN: usize = 64;

/// Failures inside the gateway. Never crosses the `Store` boundary.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("connection is not active")]
    Inactive,

    #[error("invalid identifier '{0}'")]
    InvalidIdentifier(String),

    #[error("table '{0}' does not exist")]
    NoSuchTable(String),

    #[error("table '{table}' has no column(s) {columns:?}")]
    UnknownColumns { table: String, columns: Vec<String> },

    #[error("no fields to insert")]
    NoFields,

    #[error("SQL error: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Where the database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbLocation {
    File(PathBuf),
    InMemory,
}

impl DbLocation {
    /// `":memory:"` selects an in-memory database; anything else is a file path.
    pub fn parse(path: &str) -> Self {
        if path.trim() == ":memory:" {
            DbLocation::InMemory
        } else {
            DbLocation::File(PathBuf::from(path))
        }
    }
}

/// Connection settings for the gateway.
#[derive(Clone)]
pub struct GatewayConfig {
    pub location: DbLocation,
    /// Applied as `PRAGMA key`: encrypts under SQLCipher, ignored by plain SQLite.
    pub password: Option<String>,
}

impl GatewayConfig {
    pub fn in_memory() -> Self {
        Self {
            location: DbLocation::InMemory,
            password: None,
        }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            location: DbLocation::File(path.into()),
            password: None,
        }
    }
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("location", &self.location)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// The single live connection to the relational store.
pub struct SqliteGateway {
    location: DbLocation,
    conn: Option<Connection>,
    status: ConnectionStatus,
}

impl SqliteGateway {
    /// Open the connection, creating the file and its parent directories if
    /// missing. A failed open leaves the gateway `Inactive`.
    pub fn connect(config: &GatewayConfig) -> Self {
        Self::with_connection(config, open(config, true))
    }

    /// Like `connect`, but a missing database file is an error rather than
    /// created empty.
    pub fn connect_existing(config: &GatewayConfig) -> Self {
        Self::with_connection(config, open(config, false))
    }

    fn with_connection(
        config: &GatewayConfig,
        opened: Result<Connection, PersistenceError>,
    ) -> Self {
        match opened {
            Ok(conn) => {
                info!(location = ?config.location, "database connection active");
                Self {
                    location: config.location.clone(),
                    conn: Some(conn),
                    status: ConnectionStatus::Active,
                }
            }
            Err(e) => {
                error!(location = ?config.location, error = %e, "database connection failed");
                Self {
                    location: config.location.clone(),
                    conn: None,
                    status: ConnectionStatus::Inactive,
                }
            }
        }
    }

    pub fn open_in_memory() -> Self {
        Self::connect(&GatewayConfig::in_memory())
    }

    pub fn location(&self) -> &DbLocation {
        &self.location
    }

    /// Actual column names of `table`, empty if it does not exist.
    pub fn columns(&self, table: &str) -> Vec<String> {
        self.try_columns(table).unwrap_or_else(|e| {
            warn!(table, error = %e, "could not read table columns");
            Vec::new()
        })
    }

    fn conn(&self) -> Result<&Connection, PersistenceError> {
        self.conn.as_ref().ok_or(PersistenceError::Inactive)
    }

    fn try_columns(&self, table: &str) -> Result<Vec<String>, PersistenceError> {
        let conn = self.conn()?;
        let sql = format!("PRAGMA table_info({})", quoted(table)?);
        let mut stmt = conn.prepare(&sql)?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }

    fn try_create_table(&self, name: &str) -> Result<(), PersistenceError> {
        let conn = self.conn()?;
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                ticker VARCHAR(10),
                metric VARCHAR(20),
                mean DOUBLE,
                median DOUBLE,
                std DOUBLE,
                low DOUBLE,
                max DOUBLE,
                count INT
            )",
            quoted(name)?
        );
        conn.execute_batch(&sql)?;
        Ok(())
    }

    fn try_insert(&self, table: &str, fields: &Fields) -> Result<(), PersistenceError> {
        if fields.is_empty() {
            return Err(PersistenceError::NoFields);
        }
        let known = self.try_columns(table)?;
        if known.is_empty() {
            return Err(PersistenceError::NoSuchTable(table.to_string()));
        }
        let unknown: Vec<String> = fields
            .columns()
            .filter(|c| !known.iter().any(|k| k.eq_ignore_ascii_case(c)))
            .map(String::from)
            .collect();
        if !unknown.is_empty() {
            return Err(PersistenceError::UnknownColumns {
                table: table.to_string(),
                columns: unknown,
            });
        }

        let columns = fields
            .columns()
            .map(quoted)
            .collect::<Result<Vec<_>, _>>()?
            .join(", ");
        let placeholders = vec!["?"; fields.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({columns}) VALUES ({placeholders})",
            quoted(table)?
        );

        self.conn()?.execute(&sql, params_from_iter(fields.values()))?;
        Ok(())
    }

    fn try_select(
        &self,
        table: &str,
        condition: Option<&str>,
        values: &[Value],
    ) -> Result<Vec<Row>, PersistenceError> {
        let conn = self.conn()?;
        let mut sql = format!("SELECT * FROM {}", quoted(table)?);
        let condition = condition.map(str::trim).filter(|c| !c.is_empty());
        if let Some(cond) = condition {
            sql.push_str(" WHERE ");
            sql.push_str(cond);
        }
        let bound: &[Value] = if condition.is_some() { values } else { &[] };

        let mut stmt = conn.prepare(&sql)?;
        let width = stmt.column_count();
        let rows = stmt
            .query_map(params_from_iter(bound.iter()), |row| {
                (0..width)
                    .map(|i| row.get::<_, rusqlite::types::Value>(i).map(Value::from))
                    .collect::<Result<Row, _>>()
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn try_list_tables(&self) -> Result<Vec<String>, PersistenceError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }

    fn try_delete(
        &self,
        table: &str,
        condition: &str,
        values: &[Value],
    ) -> Result<usize, PersistenceError> {
        let conn = self.conn()?;
        let condition = condition.trim();
        let deleted = if condition.is_empty() {
            conn.execute(&format!("DELETE FROM {}", quoted(table)?), [])?
        } else {
            let sql = format!("DELETE FROM {} WHERE {condition}", quoted(table)?);
            conn.execute(&sql, params_from_iter(values.iter()))?
        };
        Ok(deleted)
    }

    fn try_drop_table(&self, table: &str) -> Result<(), PersistenceError> {
        let sql = format!("DROP TABLE IF EXISTS {}", quoted(table)?);
        self.conn()?.execute_batch(&sql)?;
        Ok(())
    }

    fn try_drop_database(&mut self) -> Result<(), PersistenceError> {
        self.conn()?;
        self.close();
        if let DbLocation::File(path) = &self.location {
            std::fs::remove_file(path)?;
            for suffix in ["-wal", "-shm", "-journal"] {
                remove_if_exists(&side_file(path, suffix))?;
            }
        }
        Ok(())
    }
}

impl Store for SqliteGateway {
    fn status(&self) -> ConnectionStatus {
        self.status
    }

    fn database_name(&self) -> String {
        match &self.location {
            DbLocation::InMemory => ":memory:".to_string(),
            DbLocation::File(path) => path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
        }
    }

    fn create_table(&mut self, name: &str) -> Status {
        match self.try_create_table(name) {
            Ok(()) => {
                debug!(table = name, "table ensured");
                Status::Ok
            }
            Err(e) => {
                error!(table = name, error = %e, "failed to create table");
                Status::BadRequest
            }
        }
    }

    fn insert(&mut self, table: &str, fields: &Fields) -> Status {
        match self.try_insert(table, fields) {
            Ok(()) => Status::Created,
            Err(e) => {
                error!(table, error = %e, "failed to insert record");
                Status::BadRequest
            }
        }
    }

    fn select(&mut self, table: &str, condition: Option<&str>, values: &[Value]) -> Vec<Row> {
        self.try_select(table, condition, values)
            .unwrap_or_else(|e| {
                error!(table, error = %e, "failed to select records");
                Vec::new()
            })
    }

    fn list_tables(&mut self) -> Vec<String> {
        self.try_list_tables().unwrap_or_else(|e| {
            error!(error = %e, "failed to list tables");
            Vec::new()
        })
    }

    fn delete(&mut self, table: &str, condition: &str, values: &[Value]) -> Status {
        match self.try_delete(table, condition, values) {
            Ok(n) => {
                info!(table, deleted = n, "deleted records");
                Status::Ok
            }
            Err(e) => {
                error!(table, error = %e, "failed to delete records");
                Status::BadRequest
            }
        }
    }

    fn drop_table(&mut self, table: &str) -> Status {
        match self.try_drop_table(table) {
            Ok(()) => {
                info!(table, "table dropped");
                Status::Ok
            }
            Err(e) => {
                error!(table, error = %e, "failed to drop table");
                Status::BadRequest
            }
        }
    }

    fn drop_database(&mut self) -> Status {
        match self.try_drop_database() {
            Ok(()) => {
                info!(location = ?self.location, "database dropped");
                Status::Ok
            }
            Err(e) => {
                error!(location = ?self.location, error = %e, "failed to drop database");
                Status::BadRequest
            }
        }
    }

    fn close(&mut self) {
        if let Some(conn) = self.conn.take() {
            if let Err((_, e)) = conn.close() {
                warn!(error = %e, "error while closing connection");
            }
            info!("connection closed");
        }
        self.status = ConnectionStatus::Inactive;
    }
}

fn open(config: &GatewayConfig, create: bool) -> Result<Connection, PersistenceError> {
    let conn = match &config.location {
        DbLocation::InMemory => Connection::open_in_memory()?,
        DbLocation::File(path) if create => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            Connection::open(path)?
        }
        DbLocation::File(path) => {
            let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX;
            Connection::open_with_flags(path, flags)?
        }
    };
    if let Some(password) = &config.password {
        conn.pragma_update(None, "key", password)?;
    }
    Ok(conn)
}

/// `[A-Za-z_][A-Za-z0-9_]*`, at most 64 characters.
pub fn validate_identifier(name: &str) -> Result<&str, PersistenceError> {
    let mut chars = name.chars();
    let valid = name.len() <= MAX_IDENTIFIER_LEN
        && chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(name)
    } else {
        Err(PersistenceError::InvalidIdentifier(name.to_string()))
    }
}

fn quoted(name: &str) -> Result<String, PersistenceError> {
    validate_identifier(name).map(|n| format!("\"{n}\""))
}

fn side_file(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

fn remove_if_exists(path: &Path) -> Result<(), std::io::Error> {
    match std::fs::remove_file(path) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}
