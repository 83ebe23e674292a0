//! Commander: runs both sources once, then fronts the store with a
//! validated CRUD facade and one-time table initialization.

use crate::config::AppConfig;
use crate::gateway::SqliteGateway;
use crate::rows::{flatten, StorageRow};
use crate::store::{ConnectionStatus, Fields, Row, Status, Store, Value};
use serde::Serialize;
use tickerstat_core::data::{fetch, HttpTransport};
use tickerstat_core::TickerSummary;
use tracing::{info, warn};

pub const STOCKS_TABLE: &str = "stocks";
pub const CRYPTO_TABLE: &str = "crypto";

/// Explicit consent for a destructive operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
    /// Report what would happen; touch nothing.
    DryRun,
    /// Drop the named table.
    Table(String),
    /// Drop the named database.
    Database(String),
}

/// What `init_tables` did with one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum TableInit {
    /// Table existed; nothing written.
    AlreadyPresent,
    /// Table created, but its source produced no summary.
    NoData,
    Created { inserted: usize, failed: usize },
    CreateFailed,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InitReport {
    pub tables: Vec<(String, TableInit)>,
}

impl InitReport {
    pub fn get(&self, table: &str) -> Option<TableInit> {
        self.tables
            .iter()
            .find(|(name, _)| name == table)
            .map(|(_, init)| *init)
    }

    pub fn inserted(&self) -> usize {
        self.tables
            .iter()
            .map(|(_, init)| match init {
                TableInit::Created { inserted, .. } => *inserted,
                _ => 0,
            })
            .sum()
    }
}

/// Owns the store and the summaries fetched at construction.
pub struct Commander<S: Store = SqliteGateway> {
    store: S,
    stocks: Option<TickerSummary>,
    crypto: Option<TickerSummary>,
}

impl Commander<SqliteGateway> {
    /// Open the database and fetch both sources. Fetch failures leave the
    /// corresponding summary empty; they never fail construction.
    pub fn connect(config: &AppConfig, transport: &dyn HttpTransport) -> Self {
        let store = SqliteGateway::connect(&config.gateway_config());
        let stocks = fetch(transport, &config.stock_source());
        let crypto = fetch(transport, &config.crypto_source());
        Self::from_parts(store, stocks, crypto)
    }
}

impl<S: Store> Commander<S> {
    pub fn from_parts(
        store: S,
        stocks: Option<TickerSummary>,
        crypto: Option<TickerSummary>,
    ) -> Self {
        Self {
            store,
            stocks,
            crypto,
        }
    }

    pub fn stock_data(&self) -> Option<&TickerSummary> {
        self.stocks.as_ref()
    }

    pub fn crypto_data(&self) -> Option<&TickerSummary> {
        self.crypto.as_ref()
    }

    pub fn status(&self) -> ConnectionStatus {
        self.store.status()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Live table list from the store.
    pub fn tables(&mut self) -> Vec<String> {
        self.store.list_tables()
    }

    /// Create `stocks` and `crypto` if missing and fill them from the
    /// fetched summaries. Existing tables are left alone, so calling this
    /// again never duplicates rows.
    pub fn init_tables(&mut self) -> InitReport {
        let existing = self.store.list_tables();
        let plan = [
            (STOCKS_TABLE, self.stocks.as_ref().map(flatten)),
            (CRYPTO_TABLE, self.crypto.as_ref().map(flatten)),
        ];

        let mut report = InitReport::default();
        for (table, rows) in plan {
            let outcome = if existing.iter().any(|t| t == table) {
                info!(table, "table already present; skipping initialization");
                TableInit::AlreadyPresent
            } else {
                self.init_table(table, rows.as_deref())
            };
            report.tables.push((table.to_string(), outcome));
        }
        report
    }

    /// Current row count of each summary table, whether or not this run
    /// created it. Missing tables count as zero.
    pub fn row_counts(&mut self) -> Vec<(&'static str, usize)> {
        [STOCKS_TABLE, CRYPTO_TABLE]
            .into_iter()
            .map(|table| (table, self.extract_table(table).len()))
            .collect()
    }

    fn init_table(&mut self, table: &str, rows: Option<&[StorageRow]>) -> TableInit {
        if self.store.create_table(table) != Status::Ok {
            warn!(table, "could not create table");
            return TableInit::CreateFailed;
        }
        let Some(rows) = rows else {
            warn!(table, "no summary available; table left empty");
            return TableInit::NoData;
        };

        let mut inserted = 0;
        let mut failed = 0;
        for row in rows {
            if self.store.insert(table, &row.to_fields()) == Status::Created {
                inserted += 1;
            } else {
                warn!(table, ticker = %row.ticker, metric = %row.metric, "row insert failed");
                failed += 1;
            }
        }
        info!(table, inserted, failed, "table initialized");
        TableInit::Created { inserted, failed }
    }

    pub fn enter_record(&mut self, table: &str, fields: &Fields) -> Status {
        if !self.is_known_table(table) {
            return Status::BadRequest;
        }
        if fields.is_empty() {
            warn!(table, "refusing to insert an empty record");
            return Status::BadRequest;
        }
        self.store.insert(table, fields)
    }

    pub fn extract_record(
        &mut self,
        table: &str,
        condition: Option<&str>,
        values: &[Value],
    ) -> Vec<Row> {
        if !self.is_known_table(table) {
            return Vec::new();
        }
        self.store.select(table, condition, values)
    }

    pub fn extract_table(&mut self, table: &str) -> Vec<Row> {
        if !self.is_known_table(table) {
            return Vec::new();
        }
        self.store.select_all(table)
    }

    /// Whole-table wipes are refused here; use `drop_table`.
    pub fn delete_record(&mut self, table: &str, condition: &str, values: &[Value]) -> Status {
        if !self.is_known_table(table) {
            return Status::BadRequest;
        }
        if condition.trim().is_empty() {
            warn!(table, "refusing to delete without a condition");
            return Status::BadRequest;
        }
        self.store.delete(table, condition, values)
    }

    pub fn drop_table(&mut self, table: &str, confirmation: &Confirmation) -> Status {
        if !matches!(confirmation, Confirmation::Table(name) if name == table) {
            info!(table, ?confirmation, "drop table not confirmed");
            return Status::Forbidden;
        }
        if !self.is_known_table(table) {
            return Status::BadRequest;
        }
        self.store.drop_table(table)
    }

    pub fn drop_database(&mut self, confirmation: &Confirmation) -> Status {
        let database = self.store.database_name();
        if !matches!(confirmation, Confirmation::Database(name) if *name == database) {
            info!(database = %database, ?confirmation, "drop database not confirmed");
            return Status::Forbidden;
        }
        self.store.drop_database()
    }

    /// Idempotent.
    pub fn close(&mut self) {
        self.store.close();
    }

    fn is_known_table(&mut self, table: &str) -> bool {
        let known = self.store.list_tables().iter().any(|t| t == table);
        if !known {
            warn!(table, "unknown table");
        }
        known
    }
}
