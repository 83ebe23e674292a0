//! Fetch pipeline: request → status check → JSON → extract → summarize → classify.
//!
//! `fetch` is best-effort: every failure is logged and collapses to `None`.
//! Callers treat "no data" as a normal outcome. `try_fetch` exposes the
//! underlying error for callers that want to report it.

use super::source::{HttpTransport, SeriesSource};
use crate::domain::{SeriesSummary, TickerSummary};
use crate::error::{NetworkError, ParseError, SourceError};
use serde_json::Value;
use tracing::{debug, info, warn};

/// Run the pipeline for one source, logging and swallowing any failure.
pub fn fetch(transport: &dyn HttpTransport, source: &dyn SeriesSource) -> Option<TickerSummary> {
    match try_fetch(transport, source) {
        Ok(result) => {
            info!(
                source = source.name(),
                ticker = %result.ticker,
                records = result.summary.count(),
                standing = %result.summary.standing,
                "series summarized"
            );
            Some(result)
        }
        Err(e) => {
            warn!(source = source.name(), error = %e, "fetch failed, no data");
            None
        }
    }
}

/// Run the pipeline for one source.
pub fn try_fetch(
    transport: &dyn HttpTransport,
    source: &dyn SeriesSource,
) -> Result<TickerSummary, SourceError> {
    let request = source.request();
    debug!(source = source.name(), url = %request.url, "requesting series");

    let response = transport.get(&request)?;
    if response.status != 200 {
        return Err(NetworkError::from_status(response.status).into());
    }

    let body = parse_body(&response.body)?;
    let series = source.extract(&body)?;
    debug!(
        source = source.name(),
        ticker = %series.ticker,
        records = series.records.len(),
        "series extracted"
    );

    let summary = SeriesSummary::build(&series.records, source.fields())?;
    Ok(TickerSummary {
        ticker: series.ticker,
        summary,
    })
}

/// Parse a response body, rejecting empty and `null` bodies before anything else.
pub fn parse_body(body: &str) -> Result<Value, ParseError> {
    if body.trim().is_empty() {
        return Err(ParseError::EmptyBody);
    }
    let value: Value =
        serde_json::from_str(body).map_err(|e| ParseError::InvalidJson(e.to_string()))?;
    let empty = match &value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    };
    if empty {
        return Err(ParseError::EmptyBody);
    }
    Ok(value)
}
