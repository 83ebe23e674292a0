//! Source strategy and HTTP transport traits.
//!
//! A `SeriesSource` describes one vendor: how to build the request, how to
//! reshape its JSON into records, and which fields to summarize. The
//! `HttpTransport` trait abstracts the blocking HTTP client so the fetch
//! pipeline can be driven by canned responses in tests.

use crate::domain::RawSeriesRecord;
use crate::error::{NetworkError, ParseError};
use serde_json::Value;

/// A GET request: base URL, extra query pairs, and headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
}

impl HttpRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
        }
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn header(mut self, key: &str, value: impl ToString) -> Self {
        self.headers.push((key.to_string(), value.to_string()));
        self
    }

    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn header_value(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

/// Status code and raw body of a completed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Blocking HTTP GET. Only transport failures are errors; any status is a response.
pub trait HttpTransport: Send + Sync {
    fn get(&self, request: &HttpRequest) -> Result<HttpResponse, NetworkError>;
}

/// Records reshaped out of a vendor response, with the ticker they belong to.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedSeries {
    pub ticker: String,
    pub records: Vec<RawSeriesRecord>,
}

/// One market data vendor.
pub trait SeriesSource: Send + Sync {
    /// Human-readable name of this source, used in log lines.
    fn name(&self) -> &str;

    /// The request that fetches this source's series.
    fn request(&self) -> HttpRequest;

    /// Reshape a parsed response body into records.
    fn extract(&self, body: &Value) -> Result<ExtractedSeries, ParseError>;

    /// Fields to summarize, in output order.
    fn fields(&self) -> &[&'static str];
}

/// Fail when records exist but none of them carries any of `fields`.
///
/// An empty record list passes; the summarizer reports that case itself.
pub fn ensure_value_fields(
    records: &[RawSeriesRecord],
    fields: &[&str],
) -> Result<(), ParseError> {
    if records.is_empty() {
        return Ok(());
    }
    let any = records
        .iter()
        .any(|r| fields.iter().any(|field| r.has(field)));
    if any {
        Ok(())
    } else {
        Err(ParseError::NoValueFields {
            expected: fields.iter().map(|f| f.to_string()).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_builder_collects_pairs() {
        let req = HttpRequest::new("https://example.test/histoday")
            .query("fsym", "ETH")
            .query("limit", 7)
            .header("authorization", "Apikey abc");

        assert_eq!(req.query_value("limit"), Some("7"));
        assert_eq!(req.header_value("Authorization"), Some("Apikey abc"));
        assert_eq!(req.query_value("tsym"), None);
    }

    #[test]
    fn records_without_any_wanted_field_are_rejected() {
        let records = vec![RawSeriesRecord::new(None).with("time", 1)];
        let err = ensure_value_fields(&records, &["open", "close"]).unwrap_err();
        assert!(matches!(err, ParseError::NoValueFields { .. }));
    }

    #[test]
    fn one_wanted_field_is_enough() {
        let records = vec![
            RawSeriesRecord::new(None).with("time", 1),
            RawSeriesRecord::new(None).with("close", 3.0),
        ];
        assert!(ensure_value_fields(&records, &["open", "close"]).is_ok());
    }
}
