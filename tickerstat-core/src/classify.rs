//! Standing classifier: a fixed rule table over open/high/low/close statistics.

use crate::domain::{FieldStats, SeriesStats, Standing};
use crate::error::MissingFieldError;

/// `high.mean - low.mean` above this (together with volatility) is risky.
pub const RISKY_RANGE: f64 = 10.0;
/// `close.std` above this (together with range) is risky.
pub const RISKY_VOLATILITY: f64 = 5.0;
/// `|close.median - close.mean|` above this marks a directional skew.
pub const SKEW_THRESHOLD: f64 = 2.0;

/// The three quantities the rule table looks at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StandingInputs {
    pub price_range: f64,
    pub volatility: f64,
    pub skew: f64,
}

impl StandingInputs {
    pub fn from_stats(stats: &SeriesStats) -> Result<Self, MissingFieldError> {
        // open is not used by the rules, but a summary without it is not OHLC.
        require(stats, "open")?;
        let high = require(stats, "high")?;
        let low = require(stats, "low")?;
        let close = require(stats, "close")?;

        Ok(Self {
            price_range: high.mean - low.mean,
            volatility: close.std,
            skew: close.median - close.mean,
        })
    }

    /// First matching rule wins; risky dominates any skew.
    pub fn standing(&self) -> Standing {
        if self.price_range > RISKY_RANGE && self.volatility > RISKY_VOLATILITY {
            Standing::Risky
        } else if self.skew > SKEW_THRESHOLD {
            Standing::Improving
        } else if self.skew < -SKEW_THRESHOLD {
            Standing::Declining
        } else {
            Standing::Stable
        }
    }
}

/// Classify a summarized series.
pub fn classify(stats: &SeriesStats) -> Result<Standing, MissingFieldError> {
    StandingInputs::from_stats(stats).map(|inputs| inputs.standing())
}

fn require<'a>(stats: &'a SeriesStats, field: &str) -> Result<&'a FieldStats, MissingFieldError> {
    stats.get(field).ok_or_else(|| MissingFieldError {
        field: field.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(mean: f64) -> FieldStats {
        FieldStats {
            mean,
            std: 0.0,
            median: mean,
            min: mean,
            max: mean,
        }
    }

    fn stats(high_mean: f64, low_mean: f64, close: FieldStats) -> SeriesStats {
        SeriesStats {
            fields: vec![
                ("open".into(), flat(50.0)),
                ("high".into(), flat(high_mean)),
                ("low".into(), flat(low_mean)),
                ("close".into(), close),
            ],
            count: 10,
        }
    }

    fn close(mean: f64, median: f64, std: f64) -> FieldStats {
        FieldStats {
            mean,
            std,
            median,
            min: mean.min(median) - 1.0,
            max: mean.max(median) + 1.0,
        }
    }

    #[test]
    fn wide_range_and_volatile_is_risky() {
        let s = stats(110.0, 90.0, close(100.0, 100.0, 6.0));
        assert_eq!(classify(&s).unwrap(), Standing::Risky);
    }

    #[test]
    fn risky_dominates_skew() {
        let s = stats(110.0, 90.0, close(100.0, 110.0, 6.0));
        assert_eq!(classify(&s).unwrap(), Standing::Risky);
    }

    #[test]
    fn positive_skew_is_improving() {
        let s = stats(50.0, 48.0, close(52.0, 55.0, 1.0));
        assert_eq!(classify(&s).unwrap(), Standing::Improving);
    }

    #[test]
    fn negative_skew_is_declining() {
        let s = stats(50.0, 48.0, close(50.0, 47.0, 1.0));
        assert_eq!(classify(&s).unwrap(), Standing::Declining);
    }

    #[test]
    fn small_skew_is_stable() {
        let s = stats(50.0, 48.0, close(50.0, 50.5, 1.0));
        assert_eq!(classify(&s).unwrap(), Standing::Stable);
    }

    #[test]
    fn range_alone_is_not_risky() {
        let s = stats(110.0, 90.0, close(100.0, 100.0, 5.0));
        assert_eq!(classify(&s).unwrap(), Standing::Stable);
    }

    #[test]
    fn thresholds_are_strict() {
        let inputs = StandingInputs {
            price_range: 10.0,
            volatility: 100.0,
            skew: 2.0,
        };
        assert_eq!(inputs.standing(), Standing::Stable);
    }

    #[test]
    fn missing_close_is_reported() {
        let s = SeriesStats {
            fields: vec![
                ("open".into(), flat(1.0)),
                ("high".into(), flat(1.0)),
                ("low".into(), flat(1.0)),
            ],
            count: 1,
        };
        assert_eq!(
            classify(&s).unwrap_err(),
            MissingFieldError {
                field: "close".into()
            }
        );
    }
}
