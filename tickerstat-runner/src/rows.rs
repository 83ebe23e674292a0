//! Flattening summaries into storage rows and reading them back.

use crate::store::{Fields, Row, Value};
use serde::Serialize;
use tickerstat_core::{FieldStats, TickerSummary};

/// One persisted (ticker, metric) statistic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StorageRow {
    pub ticker: String,
    pub metric: String,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub low: f64,
    pub max: f64,
    pub count: i64,
}

impl StorageRow {
    /// The only place `FieldStats.min` becomes the `low` column.
    pub fn from_stats(ticker: &str, metric: &str, stats: &FieldStats, count: usize) -> Self {
        Self {
            ticker: ticker.to_string(),
            metric: metric.to_string(),
            mean: stats.mean,
            median: stats.median,
            std: stats.std,
            low: stats.min,
            max: stats.max,
            count: i64::try_from(count).unwrap_or(i64::MAX),
        }
    }

    pub fn to_fields(&self) -> Fields {
        Fields::new()
            .with("ticker", self.ticker.as_str())
            .with("metric", self.metric.as_str())
            .with("mean", self.mean)
            .with("median", self.median)
            .with("std", self.std)
            .with("low", self.low)
            .with("max", self.max)
            .with("count", self.count)
    }
}

/// One row per summarized field, in field order.
pub fn flatten(summary: &TickerSummary) -> Vec<StorageRow> {
    let count = summary.summary.count();
    summary
        .summary
        .stats
        .iter()
        .map(|(metric, stats)| StorageRow::from_stats(&summary.ticker, metric, stats, count))
        .collect()
}

/// A row read back from a summary table.
///
/// Only `id` is guaranteed; inserts may name any subset of columns, so the
/// rest read back as `None` when NULL.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredRow {
    pub id: i64,
    pub ticker: Option<String>,
    pub metric: Option<String>,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub std: Option<f64>,
    pub low: Option<f64>,
    pub max: Option<f64>,
    pub count: Option<i64>,
}

impl StoredRow {
    /// `None` if the row does not have the summary table shape.
    pub fn from_row(row: &Row) -> Option<Self> {
        let [id, ticker, metric, mean, median, std, low, max, count] = row.as_slice() else {
            return None;
        };
        Some(Self {
            id: id.as_i64()?,
            ticker: text(ticker),
            metric: text(metric),
            mean: mean.as_f64(),
            median: median.as_f64(),
            std: std.as_f64(),
            low: low.as_f64(),
            max: max.as_f64(),
            count: count.as_i64(),
        })
    }

    /// The full storage row, if every column is set.
    pub fn complete(&self) -> Option<StorageRow> {
        Some(StorageRow {
            ticker: self.ticker.clone()?,
            metric: self.metric.clone()?,
            mean: self.mean?,
            median: self.median?,
            std: self.std?,
            low: self.low?,
            max: self.max?,
            count: self.count?,
        })
    }
}

/// Equality filter on `ticker` and `metric`, rendered as a parameterized condition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowFilter {
    pub ticker: Option<String>,
    pub metric: Option<String>,
}

impl RowFilter {
    /// `None` when neither column is constrained.
    pub fn condition(&self) -> Option<(String, Vec<Value>)> {
        let mut clauses = Vec::new();
        let mut values = Vec::new();
        for (column, value) in [("ticker", &self.ticker), ("metric", &self.metric)] {
            if let Some(value) = value {
                clauses.push(format!("{column} = ?"));
                values.push(Value::from(value.as_str()));
            }
        }
        if clauses.is_empty() {
            None
        } else {
            Some((clauses.join(" AND "), values))
        }
    }
}

fn text(value: &Value) -> Option<String> {
    value.as_str().map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tickerstat_core::{RawSeriesRecord, SeriesSummary};

    fn summary() -> TickerSummary {
        let records: Vec<RawSeriesRecord> = [(10.0, 12.0, 9.0, 11.0), (11.0, 13.0, 10.0, 12.0)]
            .into_iter()
            .map(|(o, h, l, c)| {
                RawSeriesRecord::new(None)
                    .with("open", o)
                    .with("high", h)
                    .with("low", l)
                    .with("close", c)
            })
            .collect();
        TickerSummary {
            ticker: "IBM".into(),
            summary: SeriesSummary::build(&records, &["open", "high", "low", "close"]).unwrap(),
        }
    }

    #[test]
    fn flatten_maps_min_to_low() {
        let rows = flatten(&summary());
        assert_eq!(rows.len(), 4);

        let low = &rows[2];
        assert_eq!(low.metric, "low");
        assert_eq!(low.low, 9.0);
        assert_eq!(low.max, 10.0);
        assert_eq!(low.count, 2);
        assert!(rows.iter().all(|r| r.ticker == "IBM"));
    }

    #[test]
    fn fields_follow_schema_order() {
        let fields = flatten(&summary())[0].to_fields();
        assert_eq!(
            fields.columns().collect::<Vec<_>>(),
            crate::gateway::SUMMARY_COLUMNS.to_vec()
        );
    }

    #[test]
    fn from_row_reads_back() {
        let row: Row = vec![
            Value::Integer(7),
            "IBM".into(),
            "close".into(),
            Value::Real(11.5),
            Value::Real(11.5),
            Value::Real(0.5),
            Value::Integer(11),
            Value::Real(12.0),
            Value::Integer(2),
        ];
        let stored = StoredRow::from_row(&row).unwrap();
        assert_eq!(stored.id, 7);
        assert_eq!(stored.low, Some(11.0));
        assert_eq!(stored.metric.as_deref(), Some("close"));
        assert_eq!(stored.complete().map(|r| r.count), Some(2));
    }

    #[test]
    fn from_row_keeps_rows_with_null_columns() {
        let row: Row = vec![
            Value::Integer(3),
            "BTC".into(),
            "close".into(),
            Value::Real(42000.0),
            Value::Null,
            Value::Null,
            Value::Null,
            Value::Null,
            Value::Null,
        ];
        let stored = StoredRow::from_row(&row).unwrap();
        assert_eq!(stored.ticker.as_deref(), Some("BTC"));
        assert_eq!(stored.mean, Some(42000.0));
        assert_eq!(stored.median, None);
        assert_eq!(stored.count, None);
        assert!(stored.complete().is_none());
    }

    #[test]
    fn filter_renders_bound_condition() {
        assert_eq!(RowFilter::default().condition(), None);

        let filter = RowFilter {
            ticker: Some("IBM".into()),
            metric: Some("close".into()),
        };
        let (condition, values) = filter.condition().unwrap();
        assert_eq!(condition, "ticker = ? AND metric = ?");
        assert_eq!(values, vec![Value::from("IBM"), Value::from("close")]);

        let by_metric = RowFilter {
            ticker: None,
            metric: Some("open".into()),
        };
        assert_eq!(by_metric.condition().unwrap().0, "metric = ?");
    }

    #[test]
    fn from_row_rejects_other_shapes() {
        assert!(StoredRow::from_row(&vec![Value::Integer(1)]).is_none());
    }
}
