//! Alpha Vantage equities source.
//!
//! `GET {base_url}/query?{params}&apikey={key}`. The response holds one
//! "... Time Series ..." object (its exact name depends on the `function`
//! parameter) mapping dates to string-encoded values keyed "1. open",
//! "2. high", and so on, plus a "Meta Data" object carrying the symbol.
//!
//! Alpha Vantage reports throttling and bad requests with HTTP 200 and a
//! "Note", "Information" or "Error Message" key instead of a series.

use super::source::{ensure_value_fields, ExtractedSeries, HttpRequest, SeriesSource};
use crate::domain::RawSeriesRecord;
use crate::error::ParseError;
use serde_json::{Map, Value};

pub const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co";
pub const DEFAULT_PARAMS: &str = "function=TIME_SERIES_MONTHLY&symbol=IBM&outputsize=full";

/// Fields summarized for equities.
pub const STOCK_FIELDS: [&str; 5] = ["open", "high", "low", "close", "volume"];

const SERIES_KEY_MARKER: &str = "Time Series";
const META_KEY: &str = "Meta Data";
const SYMBOL_KEY: &str = "2. Symbol";
const VENDOR_MESSAGE_KEYS: [&str; 3] = ["Error Message", "Note", "Information"];

pub struct AlphaVantageSource {
    base_url: String,
    params: String,
    api_key: String,
}

impl AlphaVantageSource {
    /// `params` is the caller's query string, e.g. `function=TIME_SERIES_DAILY&symbol=MSFT`.
    pub fn new(
        base_url: impl Into<String>,
        params: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            params: params.into(),
            api_key: api_key.into(),
        }
    }
}

impl SeriesSource for AlphaVantageSource {
    fn name(&self) -> &str {
        "alpha_vantage"
    }

    fn request(&self) -> HttpRequest {
        let base = self.base_url.trim().trim_end_matches('/');
        let params = self.params.trim().trim_start_matches('?');
        HttpRequest::new(format!("{base}/query?{params}")).query("apikey", &self.api_key)
    }

    fn extract(&self, body: &Value) -> Result<ExtractedSeries, ParseError> {
        let root = body.as_object().ok_or(ParseError::UnexpectedShape {
            key: "<root>".into(),
            expected: "object",
        })?;

        let Some((series_key, series)) = find_series(root) else {
            return Err(vendor_message(root)
                .unwrap_or_else(|| ParseError::MissingKey(SERIES_KEY_MARKER.into())));
        };
        let series = series.as_object().ok_or_else(|| ParseError::UnexpectedShape {
            key: series_key.clone(),
            expected: "object",
        })?;

        let ticker = root
            .get(META_KEY)
            .and_then(|meta| meta.get(SYMBOL_KEY))
            .and_then(Value::as_str)
            .unwrap_or("UNKNOWN")
            .to_string();

        let mut records = Vec::with_capacity(series.len());
        for (date, values) in series {
            let values = values.as_object().ok_or_else(|| ParseError::UnexpectedShape {
                key: date.clone(),
                expected: "object",
            })?;
            let mut record = RawSeriesRecord::new(Some(date.clone()));
            for (key, value) in values {
                let field = strip_ordinal(key);
                if STOCK_FIELDS.contains(&field) {
                    record.insert(field, value.clone());
                }
            }
            records.push(record);
        }

        ensure_value_fields(&records, &STOCK_FIELDS)?;
        Ok(ExtractedSeries { ticker, records })
    }

    fn fields(&self) -> &[&'static str] {
        &STOCK_FIELDS
    }
}

/// The first key containing "Time Series".
fn find_series(root: &Map<String, Value>) -> Option<(&String, &Value)> {
    root.iter().find(|(key, _)| key.contains(SERIES_KEY_MARKER))
}

fn vendor_message(root: &Map<String, Value>) -> Option<ParseError> {
    VENDOR_MESSAGE_KEYS.iter().find_map(|key| {
        root.get(*key)
            .and_then(Value::as_str)
            .map(|msg| ParseError::VendorMessage(msg.to_string()))
    })
}

/// "1. open" -> "open"; keys without an ordinal prefix pass through.
fn strip_ordinal(key: &str) -> &str {
    match key.split_once(". ") {
        Some((prefix, rest)) if prefix.chars().all(|c| c.is_ascii_digit()) => rest,
        _ => key,
    }
}
