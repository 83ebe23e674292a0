//! Domain types for market series summaries.

pub mod record;
pub mod standing;
pub mod stats;

pub use record::RawSeriesRecord;
pub use standing::Standing;
pub use stats::{FieldStats, SeriesStats, SeriesSummary, TickerSummary};
