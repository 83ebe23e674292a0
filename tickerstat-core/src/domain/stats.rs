//! Summary types produced by the summarizer and classifier.

use super::record::RawSeriesRecord;
use super::standing::Standing;
use crate::classify::classify;
use crate::error::SourceError;
use crate::summarize::summarize;
use serde::{Deserialize, Serialize};

/// Descriptive statistics for one field of a series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldStats {
    pub mean: f64,
    /// Sample standard deviation (N-1 denominator).
    pub std: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
}

/// Per-field statistics in requested field order, plus the record count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesStats {
    pub fields: Vec<(String, FieldStats)>,
    pub count: usize,
}

impl SeriesStats {
    pub fn get(&self, field: &str) -> Option<&FieldStats> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, stats)| stats)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldStats)> {
        self.fields.iter().map(|(name, stats)| (name.as_str(), stats))
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|(name, _)| name.as_str()).collect()
    }
}

/// A summarized and classified series. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSummary {
    pub stats: SeriesStats,
    pub standing: Standing,
}

impl SeriesSummary {
    /// Summarize `records` over `fields` and classify the result.
    pub fn build(records: &[RawSeriesRecord], fields: &[&str]) -> Result<Self, SourceError> {
        let stats = summarize(records, fields)?;
        let standing = classify(&stats)?;
        Ok(Self { stats, standing })
    }

    pub fn count(&self) -> usize {
        self.stats.count
    }

    pub fn get(&self, field: &str) -> Option<&FieldStats> {
        self.stats.get(field)
    }
}

/// What a source adapter hands back: a summary keyed by its ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerSummary {
    pub ticker: String,
    pub summary: SeriesSummary,
}
