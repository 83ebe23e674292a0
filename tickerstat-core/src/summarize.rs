//! Series summarizer: reduces a record list to per-field descriptive statistics.
//!
//! Pure functions: records and field names in, `SeriesStats` out. Numeric
//! semantics follow the usual descriptive-statistics conventions: sample
//! standard deviation (N-1) and the average of the two middle values as the
//! median of an even-length column.

use crate::domain::{FieldStats, RawSeriesRecord, SeriesStats};
use crate::error::ValidationError;
use serde_json::Value;

/// Summarize `fields` across `records`.
///
/// A field missing from some records (or `null` there) is computed over the
/// records that carry it. A field missing from every record is an error.
pub fn summarize(
    records: &[RawSeriesRecord],
    fields: &[&str],
) -> Result<SeriesStats, ValidationError> {
    if records.is_empty() {
        return Err(ValidationError::EmptySeries);
    }

    let mut out = Vec::with_capacity(fields.len());
    for &field in fields {
        let column = column(records, field)?;
        if column.is_empty() {
            return Err(ValidationError::FieldAbsent {
                field: field.to_string(),
            });
        }
        let stats = field_stats(&column);
        if !stats.mean.is_finite() || !stats.std.is_finite() {
            return Err(ValidationError::Unrepresentable {
                field: field.to_string(),
            });
        }
        out.push((field.to_string(), stats));
    }

    Ok(SeriesStats {
        fields: out,
        count: records.len(),
    })
}

/// Extract one field as `f64`, skipping records where it is absent.
fn column(records: &[RawSeriesRecord], field: &str) -> Result<Vec<f64>, ValidationError> {
    let mut values = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        let Some(raw) = record.get(field) else {
            continue;
        };
        if let Some(v) = coerce(field, index, raw)? {
            values.push(v);
        }
    }
    Ok(values)
}

fn coerce(field: &str, index: usize, raw: &Value) -> Result<Option<f64>, ValidationError> {
    let parsed = match raw {
        Value::Null => return Ok(None),
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    let v = parsed.ok_or_else(|| ValidationError::NotNumeric {
        field: field.to_string(),
        index,
        value: raw.to_string(),
    })?;

    if !v.is_finite() {
        return Err(ValidationError::NotFinite {
            field: field.to_string(),
            index,
        });
    }
    Ok(Some(v))
}

/// Statistics for a non-empty column.
pub fn field_stats(values: &[f64]) -> FieldStats {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    // Rounding in the sum can push the mean a hair outside [min, max].
    let mean = mean(values).clamp(min, max);

    FieldStats {
        mean,
        std: sample_std(values, mean),
        median: median(values),
        min,
        max,
    }
}

/// Arithmetic mean. Falls back to summing values scaled by the largest
/// magnitude when the plain sum overflows.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let n = values.len() as f64;
    let sum = values.iter().sum::<f64>();
    if sum.is_finite() {
        return sum / n;
    }
    let scale = magnitude(values);
    values.iter().map(|v| v / scale).sum::<f64>() / n * scale
}

/// Sample standard deviation around a precomputed mean; 0.0 for fewer than 2 values.
///
/// Infinite only when the true result is beyond `f64::MAX`.
pub fn sample_std(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let dof = (values.len() - 1) as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / dof;
    if variance.is_finite() {
        return variance.sqrt();
    }
    let scale = magnitude(values);
    let scaled = values
        .iter()
        .map(|v| (v / scale - mean / scale).powi(2))
        .sum::<f64>()
        / dof;
    scaled.sqrt() * scale
}

/// Largest absolute value; only called on columns with an overflowing sum.
fn magnitude(values: &[f64]) -> f64 {
    values.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()))
}

pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        sorted[mid - 1] / 2.0 + sorted[mid] / 2.0
    } else {
        sorted[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(pairs: &[(&str, Value)]) -> RawSeriesRecord {
        let mut r = RawSeriesRecord::new(None);
        for (k, v) in pairs {
            r.insert(k, v.clone());
        }
        r
    }

    #[test]
    fn empty_series_is_rejected() {
        assert_eq!(summarize(&[], &["open"]), Err(ValidationError::EmptySeries));
    }

    #[test]
    fn single_record_has_zero_std() {
        let records = vec![rec(&[("close", Value::from(42.5))])];
        let stats = summarize(&records, &["close"]).unwrap();
        let close = stats.get("close").unwrap();

        assert_eq!(stats.count, 1);
        assert_eq!(close.std, 0.0);
        assert_eq!(close.mean, 42.5);
        assert_eq!(close.median, 42.5);
        assert_eq!(close.min, 42.5);
        assert_eq!(close.max, 42.5);
    }

    #[test]
    fn known_values() {
        let records: Vec<_> = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]
            .iter()
            .map(|&v| rec(&[("x", Value::from(v))]))
            .collect();
        let s = *summarize(&records, &["x"]).unwrap().get("x").unwrap();

        assert!((s.mean - 5.0).abs() < 1e-12);
        // population std is 2.0; sample std is sqrt(32/7)
        assert!((s.std - (32.0_f64 / 7.0).sqrt()).abs() < 1e-12);
        assert_eq!(s.median, 4.5);
        assert_eq!(s.min, 2.0);
        assert_eq!(s.max, 9.0);
    }

    #[test]
    fn odd_length_median_is_middle_value() {
        assert_eq!(median(&[9.0, 1.0, 5.0]), 5.0);
    }

    #[test]
    fn numeric_strings_are_coerced() {
        let records = vec![
            rec(&[("open", Value::from("10.0"))]),
            rec(&[("open", Value::from(" 20.0 "))]),
        ];
        let s = summarize(&records, &["open"]).unwrap();
        assert_eq!(s.get("open").unwrap().mean, 15.0);
    }

    #[test]
    fn non_numeric_value_is_rejected() {
        let records = vec![rec(&[("open", Value::from("n/a"))])];
        let err = summarize(&records, &["open"]).unwrap_err();
        assert!(matches!(err, ValidationError::NotNumeric { index: 0, .. }));
    }

    #[test]
    fn nan_string_is_rejected() {
        let records = vec![rec(&[("open", Value::from("NaN"))])];
        let err = summarize(&records, &["open"]).unwrap_err();
        assert!(matches!(err, ValidationError::NotFinite { .. }));
    }

    #[test]
    fn field_missing_from_some_records_uses_the_rest() {
        let records = vec![
            rec(&[("open", Value::from(1.0)), ("volume", Value::from(100.0))]),
            rec(&[("open", Value::from(3.0))]),
            rec(&[("open", Value::from(5.0)), ("volume", Value::Null)]),
        ];
        let s = summarize(&records, &["open", "volume"]).unwrap();

        assert_eq!(s.count, 3);
        assert_eq!(s.get("open").unwrap().mean, 3.0);
        assert_eq!(s.get("volume").unwrap().mean, 100.0);
    }

    #[test]
    fn field_missing_from_every_record_is_rejected() {
        let records = vec![rec(&[("open", Value::from(1.0))])];
        let err = summarize(&records, &["open", "close"]).unwrap_err();
        assert_eq!(
            err,
            ValidationError::FieldAbsent {
                field: "close".into()
            }
        );
    }

    #[test]
    fn mean_survives_an_overflowing_sum() {
        let m = mean(&[f64::MAX, f64::MAX, f64::MAX / 2.0]);
        assert!(m.is_finite());
        assert!((m / f64::MAX - 2.5 / 3.0).abs() < 1e-12);

        let balanced = mean(&[f64::MAX, f64::MAX, -f64::MAX]);
        assert!((balanced / f64::MAX - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn huge_values_keep_finite_stats_when_representable() {
        let s = field_stats(&[f64::MAX, f64::MAX, f64::MAX / 2.0]);
        assert!(s.mean.is_finite() && s.std.is_finite());
        assert!(s.min <= s.mean && s.mean <= s.max);
        // deviations are MAX/6, MAX/6, -MAX/3: variance (MAX^2/6)/2
        assert!((s.std / f64::MAX - (1.0_f64 / 12.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn std_beyond_f64_range_is_rejected() {
        let records: Vec<_> = [f64::MAX, f64::MAX, -f64::MAX]
            .iter()
            .map(|&v| rec(&[("volume", Value::from(v))]))
            .collect();
        let err = summarize(&records, &["volume"]).unwrap_err();
        assert_eq!(
            err,
            ValidationError::Unrepresentable {
                field: "volume".into()
            }
        );
    }

    #[test]
    fn mean_of_repeated_decimal_stays_in_range() {
        let s = field_stats(&[0.1, 0.1, 0.1]);
        assert!(s.mean <= s.max && s.mean >= s.min);
    }
}
