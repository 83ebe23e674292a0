//! tickerstat runner: configuration, persistence and orchestration.
//!
//! This crate builds on `tickerstat-core` to provide:
//! - Settings from TOML and secrets from the environment / `.env`
//! - A SQLite persistence gateway behind the `Store` trait
//! - Flattening of summaries into storage rows
//! - The `Commander`: fetch both sources, initialize tables once, CRUD facade

pub mod commander;
pub mod config;
pub mod gateway;
pub mod rows;
pub mod store;

pub use commander::{Commander, Confirmation, InitReport, TableInit, CRYPTO_TABLE, STOCKS_TABLE};
pub use config::{AppConfig, ConfigurationError, Secrets, Settings};
pub use gateway::{DbLocation, GatewayConfig, PersistenceError, SqliteGateway, SUMMARY_COLUMNS};
pub use rows::{flatten, RowFilter, StorageRow, StoredRow};
pub use store::{ConnectionStatus, Fields, Row, Status, Store, Value};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn value_types_are_send_sync() {
        assert_send::<Value>();
        assert_sync::<Value>();
        assert_send::<Fields>();
        assert_sync::<Fields>();
        assert_send::<StorageRow>();
        assert_sync::<StorageRow>();
        assert_send::<InitReport>();
        assert_sync::<InitReport>();
    }

    #[test]
    fn config_is_send_sync() {
        assert_send::<AppConfig>();
        assert_sync::<AppConfig>();
        assert_send::<ConfigurationError>();
        assert_sync::<ConfigurationError>();
    }

    #[test]
    fn gateway_can_move_between_threads() {
        assert_send::<SqliteGateway>();
        assert_send::<Commander<SqliteGateway>>();
    }
}
