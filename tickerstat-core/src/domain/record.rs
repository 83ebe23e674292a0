//! RawSeriesRecord: one time-step of vendor data, before numeric coercion.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One period of a market series as the vendor sent it.
///
/// Values are kept as raw JSON scalars; the summarizer coerces them to `f64`.
/// A field the vendor omitted for this period is simply absent from `values`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSeriesRecord {
    /// Period label (trading date for stocks, UTC day for crypto).
    pub stamp: Option<String>,
    pub values: BTreeMap<String, Value>,
}

impl RawSeriesRecord {
    pub fn new(stamp: Option<String>) -> Self {
        Self {
            stamp,
            values: BTreeMap::new(),
        }
    }

    /// Builder-style insert, handy for fixtures.
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: &str, value: impl Into<Value>) {
        self.values.insert(field.to_string(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    pub fn has(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
