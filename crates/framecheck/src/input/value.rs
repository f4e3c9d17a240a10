//! Scalar cell values and numeric bounds.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Formats tried, in order, when interpreting text as a date or timestamp.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%m/%d/%Y", "%d-%m-%Y"];

/// A single cell value.
///
/// `Float(NaN)` is treated as null by every predicate in this crate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    DateTime(NaiveDateTime),
}

impl Value {
    /// Returns true for `Null` and for NaN floats.
    pub fn is_null(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Float(f) => f.is_nan(),
            _ => false,
        }
    }

    /// Numeric view of the value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) if !f.is_nan() => Some(*f),
            _ => None,
        }
    }

    /// Text view of the value, if it is text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Timestamp view of the value, if it is one.
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Value::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    /// String-rendered form used for length measurement.
    pub fn render(&self) -> String {
        match self {
            Value::Null => "nan".to_string(),
            Value::Bool(true) => "True".to_string(),
            Value::Bool(false) => "False".to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => format_float(*f),
            Value::Text(s) => s.clone(),
            Value::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    /// Hashable identity used for set membership and duplicate detection.
    ///
    /// Integers and integral floats share a key so `1` and `1.0` compare equal.
    pub fn key(&self) -> Option<ValueKey> {
        match self {
            _ if self.is_null() => None,
            Value::Bool(b) => Some(ValueKey::Bool(*b)),
            Value::Int(i) => Some(ValueKey::Int(*i)),
            Value::Float(f) => {
                if f.fract() == 0.0 && f.abs() < 9.0e15 {
                    Some(ValueKey::Int(*f as i64))
                } else {
                    Some(ValueKey::Float(f.to_bits()))
                }
            }
            Value::Text(s) => Some(ValueKey::Text(s.clone())),
            Value::DateTime(dt) => Some(ValueKey::DateTime(*dt)),
            Value::Null => None,
        }
    }

    /// Order two non-null values of compatible kinds.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a.partial_cmp(&b),
                _ => None,
            },
        }
    }

    /// Short name of the value's variant, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::DateTime(_) => "datetime",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            return Ok(());
        }
        f.write_str(&self.render())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Value::DateTime(dt)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Hash key for a non-null [`Value`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueKey {
    Bool(bool),
    Int(i64),
    Float(u64),
    Text(String),
    DateTime(NaiveDateTime),
}

/// A numeric bound stored in a constraint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    /// The bound as a float for comparison.
    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Int(i) => *i as f64,
            Number::Float(f) => *f,
        }
    }

    /// Order two numbers. Integers compare exactly; any float side compares
    /// as `f64`.
    pub fn compare(&self, other: &Number) -> Option<Ordering> {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => Some(a.cmp(b)),
            _ => self.as_f64().partial_cmp(&other.as_f64()),
        }
    }

    /// Convert a non-null numeric value into a bound.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(i) => Some(Number::Int(*i)),
            Value::Float(f) if !f.is_nan() => Some(Number::Float(*f)),
            _ => None,
        }
    }

    /// Parse a textual bound, keeping integers integral.
    pub fn parse(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if let Ok(i) = trimmed.parse::<i64>() {
            return Some(Number::Int(i));
        }
        trimmed
            .parse::<f64>()
            .ok()
            .filter(|f| !f.is_nan())
            .map(Number::Float)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(i) => write!(f, "{}", i),
            Number::Float(v) => f.write_str(&format_float(*v)),
        }
    }
}

/// Render a float the way a dataframe library prints it: integral values keep
/// a trailing `.0`, magnitudes from 1e16 up use exponent form (`1e+16`), and
/// everything else uses the shortest round-trip form.
pub(crate) fn format_float(f: f64) -> String {
    if f.is_nan() {
        "nan".to_string()
    } else if f.is_infinite() {
        let sign = if f > 0.0 { "" } else { "-" };
        format!("{}inf", sign)
    } else if f.abs() >= 1e16 {
        let rendered = format!("{:e}", f);
        match rendered.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{}e+{}", mantissa, exponent)
            }
            _ => rendered,
        }
    } else if f.fract() == 0.0 {
        format!("{:.1}", f)
    } else {
        format!("{}", f)
    }
}

/// Parse a date or timestamp string using the shared formats.
pub fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(dt);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(trimmed, format) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Interpret a numeric cell as Unix epoch seconds.
///
/// Only the first 10 digits of the non-negative integral part are used, so
/// millisecond and nanosecond epochs land on the same second.
pub fn datetime_from_epoch(text: &str) -> Option<NaiveDateTime> {
    let trimmed = text.trim();
    let number: f64 = trimmed.parse().ok()?;
    if !number.is_finite() {
        return None;
    }
    let integral = format!("{}", number.max(0.0).trunc() as u64);
    let digits = &integral[..integral.len().min(10)];
    let seconds: i64 = digits.parse().ok()?;
    DateTime::from_timestamp(seconds, 0).map(|dt| dt.naive_utc())
}

/// Returns true if the text looks like an epoch number rather than a date.
pub fn looks_like_epoch(text: &str) -> bool {
    let trimmed = text.trim();
    let head: String = trimmed.chars().take(10).collect();
    !head.is_empty() && head.parse::<f64>().is_ok() && !head.contains('-') && !head.contains('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nan_is_null() {
        assert!(Value::Null.is_null());
        assert!(Value::Float(f64::NAN).is_null());
        assert!(!Value::Float(0.0).is_null());
        assert!(Value::Float(f64::NAN).key().is_none());
    }

    #[test]
    fn test_render() {
        assert_eq!(Value::Int(42).render(), "42");
        assert_eq!(Value::Float(55.12).render(), "55.12");
        assert_eq!(Value::Float(3.0).render(), "3.0");
        assert_eq!(Value::Bool(true).render(), "True");
        assert_eq!(Value::from("abc").render(), "abc");
    }

    #[test]
    fn test_large_floats_use_exponent_form() {
        assert_eq!(format_float(1e16), "1e+16");
        assert_eq!(format_float(-2.5e20), "-2.5e+20");
        assert_eq!(format_float(9.0e15), "9000000000000000.0");
        assert_eq!(Number::parse(&format_float(1e16)), Some(Number::Float(1e16)));
    }

    #[test]
    fn test_number_compare_is_exact_for_integers() {
        let bound = Number::Int(9_007_199_254_740_992);
        let above = Number::Int(9_007_199_254_740_993);
        assert_eq!(above.compare(&bound), Some(Ordering::Greater));
        assert_eq!(Number::Int(i64::MAX).compare(&Number::Int(i64::MAX - 1)), Some(Ordering::Greater));
        assert_eq!(Number::Int(2).compare(&Number::Float(2.5)), Some(Ordering::Less));
        assert_eq!(Number::Float(f64::NAN).compare(&Number::Int(1)), None);
    }

    #[test]
    fn test_int_and_integral_float_share_key() {
        assert_eq!(Value::Int(1).key(), Value::Float(1.0).key());
        assert_ne!(Value::Int(1).key(), Value::Float(1.5).key());
        assert_ne!(Value::Int(1).key(), Value::from("1").key());
    }

    #[test]
    fn test_compare_mixed_numbers() {
        assert_eq!(Value::Int(2).compare(&Value::Float(1.5)), Some(Ordering::Greater));
        assert_eq!(Value::from("a").compare(&Value::Int(1)), None);
    }

    #[test]
    fn test_number_parse() {
        assert_eq!(Number::parse("5"), Some(Number::Int(5)));
        assert_eq!(Number::parse("5.5"), Some(Number::Float(5.5)));
        assert_eq!(Number::parse("NaN"), None);
        assert_eq!(Number::parse("abc"), None);
    }

    #[test]
    fn test_parse_datetime_formats() {
        let expected = NaiveDate::from_ymd_opt(2023, 3, 15)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(parse_datetime("2023-03-15"), Some(expected));
        assert_eq!(parse_datetime("2023/03/15"), Some(expected));
        assert_eq!(parse_datetime("15/03/2023"), Some(expected));
        assert!(parse_datetime("2023-03-15 10:30:00").is_some());
        assert!(parse_datetime("not a date").is_none());
    }

    #[test]
    fn test_epoch_uses_first_ten_digits() {
        let seconds = datetime_from_epoch("1678838400").unwrap();
        let millis = datetime_from_epoch("1678838400000").unwrap();
        assert_eq!(seconds, millis);
        assert_eq!(seconds.date(), NaiveDate::from_ymd_opt(2023, 3, 15).unwrap());
        assert!(looks_like_epoch("1678838400"));
        assert!(!looks_like_epoch("2023-03-15"));
    }
}
