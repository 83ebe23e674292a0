//! Market data sources and the shared fetch pipeline.

pub mod alpha_vantage;
pub mod cryptocompare;
pub mod fetch;
pub mod http;
pub mod source;

pub use alpha_vantage::{AlphaVantageSource, STOCK_FIELDS};
pub use cryptocompare::{CryptoCompareSource, CRYPTO_FIELDS};
pub use fetch::{fetch, try_fetch};
pub use http::ReqwestTransport;
pub use source::{ExtractedSeries, HttpRequest, HttpResponse, HttpTransport, SeriesSource};
