//! Integration tests for the fetch pipeline, driven by a canned transport.
//!
//! No network access: every response is served from memory.

use std::sync::Mutex;
use tickerstat_core::data::{
    fetch, try_fetch, AlphaVantageSource, CryptoCompareSource, HttpRequest, HttpResponse,
    HttpTransport,
};
use tickerstat_core::{NetworkError, ParseError, SourceError, Standing};

/// Serves one fixed response and records every request it sees.
struct CannedTransport {
    response: Result<HttpResponse, NetworkError>,
    seen: Mutex<Vec<HttpRequest>>,
}

impl CannedTransport {
    fn status(status: u16, body: &str) -> Self {
        Self {
            response: Ok(HttpResponse {
                status,
                body: body.to_string(),
            }),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn unreachable() -> Self {
        Self {
            response: Err(NetworkError::Unreachable("connection refused".into())),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn requests(&self) -> Vec<HttpRequest> {
        self.seen.lock().unwrap().clone()
    }
}

impl HttpTransport for CannedTransport {
    fn get(&self, request: &HttpRequest) -> Result<HttpResponse, NetworkError> {
        self.seen.lock().unwrap().push(request.clone());
        self.response.clone()
    }
}

fn stock_source() -> AlphaVantageSource {
    AlphaVantageSource::new(
        "https://www.alphavantage.co",
        "function=TIME_SERIES_MONTHLY&symbol=IBM&outputsize=full",
        "test-key",
    )
}

fn crypto_source() -> CryptoCompareSource {
    CryptoCompareSource::new("https://min-api.cryptocompare.com/data/v2", "eth", 3, "k")
}

const IBM_MONTHLY: &str = r#"{
    "Meta Data": {
        "1. Information": "Monthly Prices (open, high, low, close) and Volumes",
        "2. Symbol": "IBM",
        "3. Last Refreshed": "2024-03-28",
        "4. Time Zone": "US/Eastern"
    },
    "Monthly Time Series": {
        "2024-03-28": {"1. open": "185.4900", "2. high": "199.1800", "3. low": "185.1800", "4. close": "190.9600", "5. volume": "99921776"},
        "2024-02-29": {"1. open": "183.6300", "2. high": "188.9500", "3. low": "178.7500", "4. close": "185.0300", "5. volume": "82172127"},
        "2024-01-31": {"1. open": "162.8300", "2. high": "196.9000", "3. low": "157.8850", "4. close": "183.6600", "5. volume": "128121557"}
    }
}"#;

const ETH_DAILY: &str = r#"{
    "Response": "Success",
    "Message": "",
    "Data": {
        "Aggregated": false,
        "TimeFrom": 1704067200,
        "TimeTo": 1704240000,
        "Data": [
            {"time": 1704067200, "high": 2370.1, "low": 2265.2, "open": 2281.3, "volumefrom": 210000.5, "volumeto": 490000000.2, "close": 2352.4, "conversionType": "direct", "conversionSymbol": ""},
            {"time": 1704153600, "high": 2430.8, "low": 2340.5, "open": 2352.4, "volumefrom": 330000.1, "volumeto": 790000000.9, "close": 2355.6, "conversionType": "direct", "conversionSymbol": ""},
            {"time": 1704240000, "high": 2386.9, "low": 2111.0, "open": 2355.6, "volumefrom": 500000.7, "volumeto": 1100000000.4, "close": 2209.5, "conversionType": "direct", "conversionSymbol": ""}
        ]
    }
}"#;

#[test]
fn stock_series_is_summarized_and_classified() {
    let transport = CannedTransport::status(200, IBM_MONTHLY);
    let result = fetch(&transport, &stock_source()).expect("summary");

    assert_eq!(result.ticker, "IBM");
    assert_eq!(result.summary.count(), 3);
    assert_eq!(
        result.summary.stats.field_names(),
        vec!["open", "high", "low", "close", "volume"]
    );

    // high.mean ≈ 195.0, low.mean ≈ 173.9, close.std ≈ 3.7 → not risky;
    // close median 185.03 vs mean 186.55 → skew ≈ -1.5 → stable
    assert_eq!(result.summary.standing, Standing::Stable);

    let close = result.summary.get("close").unwrap();
    assert_eq!(close.min, 183.66);
    assert_eq!(close.max, 190.96);
    assert_eq!(close.median, 185.03);

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].query_value("apikey"), Some("test-key"));
}

#[test]
fn crypto_series_is_summarized_under_requested_symbol() {
    let transport = CannedTransport::status(200, ETH_DAILY);
    let result = fetch(&transport, &crypto_source()).expect("summary");

    assert_eq!(result.ticker, "ETH");
    assert_eq!(result.summary.count(), 3);
    assert_eq!(result.summary.stats.fields.len(), 6);
    // range ≈ 156.7 and close std ≈ 83 → risky
    assert_eq!(result.summary.standing, Standing::Risky);

    let requests = transport.requests();
    assert_eq!(requests[0].header_value("authorization"), Some("Apikey k"));
    assert_eq!(requests[0].query_value("limit"), Some("3"));
}

#[test]
fn rate_limited_response_is_no_data() {
    let transport = CannedTransport::status(429, r#"{"message": "slow down"}"#);
    assert!(fetch(&transport, &stock_source()).is_none());
    assert!(fetch(&transport, &crypto_source()).is_none());
}

#[test]
fn each_named_status_maps_to_its_own_error() {
    let cases = [
        (401, NetworkError::Unauthorized),
        (403, NetworkError::Forbidden),
        (404, NetworkError::NotFound),
        (429, NetworkError::RateLimited),
        (500, NetworkError::ServerError),
        (503, NetworkError::ServiceUnavailable),
        (302, NetworkError::UnexpectedStatus(302)),
    ];
    for (status, expected) in cases {
        let transport = CannedTransport::status(status, IBM_MONTHLY);
        let err = try_fetch(&transport, &stock_source()).unwrap_err();
        assert_eq!(err, SourceError::Network(expected), "status {status}");
    }
}

#[test]
fn unreachable_host_is_no_data() {
    let transport = CannedTransport::unreachable();
    assert!(fetch(&transport, &crypto_source()).is_none());
    assert!(matches!(
        try_fetch(&transport, &crypto_source()),
        Err(SourceError::Network(NetworkError::Unreachable(_)))
    ));
}

#[test]
fn empty_body_fails_before_parsing() {
    let transport = CannedTransport::status(200, "");
    assert_eq!(
        try_fetch(&transport, &stock_source()).unwrap_err(),
        SourceError::Parse(ParseError::EmptyBody)
    );
    let transport = CannedTransport::status(200, "null");
    assert!(fetch(&transport, &crypto_source()).is_none());
}

#[test]
fn empty_history_is_a_validation_failure() {
    let transport =
        CannedTransport::status(200, r#"{"Response": "Success", "Data": {"Data": []}}"#);
    assert!(matches!(
        try_fetch(&transport, &crypto_source()),
        Err(SourceError::Validation(_))
    ));
}

#[test]
fn non_numeric_value_is_no_data() {
    let body = r#"{
        "Meta Data": {"2. Symbol": "IBM"},
        "Monthly Time Series": {
            "2024-01-31": {"1. open": "n/a", "2. high": "1", "3. low": "1", "4. close": "1", "5. volume": "1"}
        }
    }"#;
    let transport = CannedTransport::status(200, body);
    assert!(matches!(
        try_fetch(&transport, &stock_source()),
        Err(SourceError::Validation(_))
    ));
    assert!(fetch(&transport, &stock_source()).is_none());
}
