//! CryptoCompare daily history source.
//!
//! `GET {base_url}/histoday?fsym={symbol}&tsym=usd&limit={days}` with an
//! `authorization: Apikey {key}` header. Records live under `Data.Data` as
//! numeric OHLCV objects with a unix `time` and conversion metadata.

use super::source::{ensure_value_fields, ExtractedSeries, HttpRequest, SeriesSource};
use crate::domain::RawSeriesRecord;
use crate::error::ParseError;
use chrono::DateTime;
use serde_json::Value;

pub const DEFAULT_BASE_URL: &str = "https://min-api.cryptocompare.com/data/v2";
pub const DEFAULT_SYMBOL: &str = "BTC";
pub const DEFAULT_LIMIT: u32 = 30;

/// Fields summarized for crypto.
pub const CRYPTO_FIELDS: [&str; 6] = ["open", "high", "low", "close", "volumefrom", "volumeto"];

const QUOTE_CURRENCY: &str = "usd";

pub struct CryptoCompareSource {
    base_url: String,
    symbol: String,
    limit: u32,
    api_key: String,
}

impl CryptoCompareSource {
    pub fn new(
        base_url: impl Into<String>,
        symbol: impl Into<String>,
        limit: u32,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            symbol: symbol.into(),
            limit,
            api_key: api_key.into(),
        }
    }

    /// The ticker results are stored under: the requested symbol, upper-cased.
    pub fn ticker(&self) -> String {
        self.symbol.trim().to_uppercase()
    }
}

impl SeriesSource for CryptoCompareSource {
    fn name(&self) -> &str {
        "cryptocompare"
    }

    fn request(&self) -> HttpRequest {
        let base = self.base_url.trim().trim_end_matches('/');
        HttpRequest::new(format!("{base}/histoday"))
            .query("fsym", self.ticker())
            .query("tsym", QUOTE_CURRENCY)
            .query("limit", self.limit)
            .header("authorization", format!("Apikey {}", self.api_key))
    }

    fn extract(&self, body: &Value) -> Result<ExtractedSeries, ParseError> {
        if body.get("Response").and_then(Value::as_str) == Some("Error") {
            let msg = body
                .get("Message")
                .and_then(Value::as_str)
                .unwrap_or("unspecified error");
            return Err(ParseError::VendorMessage(msg.to_string()));
        }

        let outer = body
            .get("Data")
            .ok_or_else(|| ParseError::MissingKey("Data".into()))?;
        let rows = outer
            .get("Data")
            .ok_or_else(|| ParseError::MissingKey("Data.Data".into()))?
            .as_array()
            .ok_or(ParseError::UnexpectedShape {
                key: "Data.Data".into(),
                expected: "array",
            })?;

        let mut records = Vec::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            let obj = row.as_object().ok_or_else(|| ParseError::UnexpectedShape {
                key: format!("Data.Data[{i}]"),
                expected: "object",
            })?;
            let stamp = obj
                .get("time")
                .and_then(Value::as_i64)
                .and_then(|ts| DateTime::from_timestamp(ts, 0))
                .map(|dt| dt.date_naive().to_string());

            let mut record = RawSeriesRecord::new(stamp);
            for field in CRYPTO_FIELDS {
                if let Some(value) = obj.get(field) {
                    record.insert(field, value.clone());
                }
            }
            records.push(record);
        }

        ensure_value_fields(&records, &CRYPTO_FIELDS)?;
        Ok(ExtractedSeries {
            ticker: self.ticker(),
            records,
        })
    }

    fn fields(&self) -> &[&'static str] {
        &CRYPTO_FIELDS
    }
}
