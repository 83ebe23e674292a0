//! tickerstat core: series records, summary statistics, standing classifier
//! and the market data sources that feed them.
//!
//! - Domain types (raw records, field statistics, summaries, standing)
//! - Summarizer: records → per-field mean/std/median/min/max
//! - Classifier: fixed rule table over open/high/low/close statistics
//! - Sources: Alpha Vantage (equities) and CryptoCompare (crypto) behind one
//!   `SeriesSource` strategy trait and a best-effort fetch pipeline

pub mod classify;
pub mod data;
pub mod domain;
pub mod error;
pub mod summarize;

pub use classify::classify;
pub use domain::{FieldStats, RawSeriesRecord, SeriesStats, SeriesSummary, Standing, TickerSummary};
pub use error::{MissingFieldError, NetworkError, ParseError, SourceError, ValidationError};
pub use summarize::summarize;
