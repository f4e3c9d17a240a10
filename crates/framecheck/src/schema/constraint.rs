//! Typed constraint values and the per-column constraint record.

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as Json;

use crate::error::{FrameCheckError, Result};
use crate::input::{is_null_token, parse_bool, parse_datetime, Number, Value};

use super::check::CheckKind;
use super::literal::{parse_set, render_set};

/// Date format used for persisted date bounds.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A single constraint value, one variant per [`CheckKind`].
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    DataType(String),
    /// `true` means nulls are allowed.
    Nullable(bool),
    /// `true` means non-null values must be distinct.
    Unique(bool),
    MinLength(usize),
    MaxLength(usize),
    ValueRange(Vec<Value>),
    MinValue(Option<Number>),
    MaxValue(Option<Number>),
    MinDate(Option<NaiveDate>),
    MaxDate(Option<NaiveDate>),
}

impl Constraint {
    pub fn kind(&self) -> CheckKind {
        match self {
            Constraint::DataType(_) => CheckKind::DataType,
            Constraint::Nullable(_) => CheckKind::Nullable,
            Constraint::Unique(_) => CheckKind::Unique,
            Constraint::MinLength(_) => CheckKind::MinLength,
            Constraint::MaxLength(_) => CheckKind::MaxLength,
            Constraint::ValueRange(_) => CheckKind::ValueRange,
            Constraint::MinValue(_) => CheckKind::MinValue,
            Constraint::MaxValue(_) => CheckKind::MaxValue,
            Constraint::MinDate(_) => CheckKind::MinDate,
            Constraint::MaxDate(_) => CheckKind::MaxDate,
        }
    }

    /// Native JSON form: scalars stay scalars, ranges become arrays, missing
    /// bounds become `null`.
    pub fn to_json(&self) -> Json {
        match self {
            Constraint::DataType(name) => Json::String(name.clone()),
            Constraint::Nullable(b) | Constraint::Unique(b) => Json::Bool(*b),
            Constraint::MinLength(n) | Constraint::MaxLength(n) => Json::from(*n),
            Constraint::ValueRange(values) => Json::Array(values.iter().map(value_to_json).collect()),
            Constraint::MinValue(bound) | Constraint::MaxValue(bound) => match bound {
                Some(Number::Int(i)) => Json::from(*i),
                Some(Number::Float(f)) => {
                    serde_json::Number::from_f64(*f).map_or(Json::Null, Json::Number)
                }
                None => Json::Null,
            },
            Constraint::MinDate(date) | Constraint::MaxDate(date) => match date {
                Some(d) => Json::String(d.format(DATE_FORMAT).to_string()),
                None => Json::Null,
            },
        }
    }

    /// Read a constraint of the given kind from its JSON form.
    pub fn from_json(kind: CheckKind, json: &Json) -> std::result::Result<Self, String> {
        let constraint = match kind {
            CheckKind::DataType => match json {
                Json::String(s) => Constraint::DataType(s.clone()),
                other => return Err(shape_error(kind, "a type name", other)),
            },
            CheckKind::Nullable | CheckKind::Unique => {
                let flag = json_bool(json).ok_or_else(|| shape_error(kind, "a boolean", json))?;
                if kind == CheckKind::Nullable {
                    Constraint::Nullable(flag)
                } else {
                    Constraint::Unique(flag)
                }
            }
            CheckKind::MinLength | CheckKind::MaxLength => {
                let n = json_length(json).ok_or_else(|| shape_error(kind, "a length", json))?;
                if kind == CheckKind::MinLength {
                    Constraint::MinLength(n)
                } else {
                    Constraint::MaxLength(n)
                }
            }
            CheckKind::ValueRange => match json {
                Json::Array(items) => Constraint::ValueRange(
                    items
                        .iter()
                        .map(|item| json_to_value(item).ok_or_else(|| shape_error(kind, "a scalar", item)))
                        .collect::<std::result::Result<_, _>>()?,
                ),
                other => return Err(shape_error(kind, "an array", other)),
            },
            CheckKind::MinValue | CheckKind::MaxValue => {
                let bound = match json {
                    Json::Null => None,
                    Json::Number(n) => Some(match n.as_i64() {
                        Some(i) => Number::Int(i),
                        None => Number::Float(n.as_f64().unwrap_or(f64::NAN)),
                    }),
                    other => return Err(shape_error(kind, "a number or null", other)),
                };
                if kind == CheckKind::MinValue {
                    Constraint::MinValue(bound)
                } else {
                    Constraint::MaxValue(bound)
                }
            }
            CheckKind::MinDate | CheckKind::MaxDate => {
                let date = match json {
                    Json::Null => None,
                    Json::String(s) => {
                        Some(parse_date(s).ok_or_else(|| shape_error(kind, "a date", json))?)
                    }
                    other => return Err(shape_error(kind, "a date or null", other)),
                };
                if kind == CheckKind::MinDate {
                    Constraint::MinDate(date)
                } else {
                    Constraint::MaxDate(date)
                }
            }
        };
        Ok(constraint)
    }

    /// Text form used in flat constraint files.
    pub fn to_cell(&self) -> String {
        match self {
            Constraint::DataType(name) => name.clone(),
            Constraint::Nullable(b) | Constraint::Unique(b) => {
                String::from(if *b { "True" } else { "False" })
            }
            Constraint::MinLength(n) | Constraint::MaxLength(n) => n.to_string(),
            Constraint::ValueRange(values) => render_set(values),
            Constraint::MinValue(bound) | Constraint::MaxValue(bound) => {
                bound.map_or_else(|| "NaN".to_string(), |n| n.to_string())
            }
            Constraint::MinDate(date) | Constraint::MaxDate(date) => date
                .map_or_else(|| "NaN".to_string(), |d| d.format(DATE_FORMAT).to_string()),
        }
    }

    /// Parse a constraint of the given kind from its text form.
    ///
    /// Used for flat constraint files and for command-line overrides.
    pub fn parse(kind: CheckKind, text: &str) -> Result<Self> {
        let trimmed = text.trim();
        let invalid = || {
            FrameCheckError::Literal(format!("invalid {} value '{}'", kind, trimmed))
        };

        let constraint = match kind {
            CheckKind::DataType => {
                if trimmed.is_empty() {
                    return Err(invalid());
                }
                Constraint::DataType(trimmed.to_string())
            }
            CheckKind::Nullable => Constraint::Nullable(parse_bool(trimmed).ok_or_else(invalid)?),
            CheckKind::Unique => Constraint::Unique(parse_bool(trimmed).ok_or_else(invalid)?),
            CheckKind::MinLength => Constraint::MinLength(parse_length(trimmed).ok_or_else(invalid)?),
            CheckKind::MaxLength => Constraint::MaxLength(parse_length(trimmed).ok_or_else(invalid)?),
            CheckKind::ValueRange => Constraint::ValueRange(parse_set(trimmed)?),
            CheckKind::MinValue => Constraint::MinValue(parse_bound(trimmed).ok_or_else(invalid)?),
            CheckKind::MaxValue => Constraint::MaxValue(parse_bound(trimmed).ok_or_else(invalid)?),
            CheckKind::MinDate => Constraint::MinDate(parse_date_bound(trimmed).ok_or_else(invalid)?),
            CheckKind::MaxDate => Constraint::MaxDate(parse_date_bound(trimmed).ok_or_else(invalid)?),
        };
        Ok(constraint)
    }
}

fn shape_error(kind: CheckKind, expected: &str, found: &Json) -> String {
    format!("{} must be {}, found {}", kind, expected, found)
}

fn json_bool(json: &Json) -> Option<bool> {
    match json {
        Json::Bool(b) => Some(*b),
        Json::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        _ => None,
    }
}

fn json_length(json: &Json) -> Option<usize> {
    let n = json.as_f64()?;
    (n >= 0.0 && n.fract() == 0.0).then_some(n as usize)
}

fn value_to_json(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Int(i) => Json::from(*i),
        Value::Float(f) => serde_json::Number::from_f64(*f).map_or(Json::Null, Json::Number),
        Value::Text(s) => Json::String(s.clone()),
        Value::DateTime(_) => Json::String(value.render()),
    }
}

fn json_to_value(json: &Json) -> Option<Value> {
    match json {
        Json::Null => Some(Value::Null),
        Json::Bool(b) => Some(Value::Bool(*b)),
        Json::Number(n) => Some(match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Float(n.as_f64()?),
        }),
        Json::String(s) => Some(Value::Text(s.clone())),
        Json::Array(_) | Json::Object(_) => None,
    }
}

fn parse_length(text: &str) -> Option<usize> {
    if let Ok(n) = text.parse::<usize>() {
        return Some(n);
    }
    let f: f64 = text.parse().ok()?;
    (f >= 0.0 && f.fract() == 0.0).then_some(f as usize)
}

/// `Some(None)` for a missing bound, `None` for garbage.
fn parse_bound(text: &str) -> Option<Option<Number>> {
    if is_null_token(text) {
        return Some(None);
    }
    Number::parse(text).map(Some)
}

fn parse_date_bound(text: &str) -> Option<Option<NaiveDate>> {
    if is_null_token(text) {
        return Some(None);
    }
    parse_date(text).map(Some)
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), DATE_FORMAT)
        .ok()
        .or_else(|| parse_datetime(text).map(|dt| dt.date()))
}

/// The ordered constraints of a single column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnConstraints {
    constraints: IndexMap<CheckKind, Constraint>,
}

impl ColumnConstraints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a constraint, replacing any existing one of the same kind.
    pub fn insert(&mut self, constraint: Constraint) {
        self.constraints.insert(constraint.kind(), constraint);
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, constraint: Constraint) -> Self {
        self.insert(constraint);
        self
    }

    pub fn get(&self, kind: CheckKind) -> Option<&Constraint> {
        self.constraints.get(&kind)
    }

    pub fn contains(&self, kind: CheckKind) -> bool {
        self.constraints.contains_key(&kind)
    }

    /// Constraints in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Constraint> + '_ {
        self.constraints.values()
    }

    pub fn kinds(&self) -> impl Iterator<Item = CheckKind> + '_ {
        self.constraints.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// Point override: every constraint in `other` replaces the one of the
    /// same kind. Existing kinds keep their position.
    pub fn merge(&mut self, other: &ColumnConstraints) {
        for constraint in other.iter() {
            self.insert(constraint.clone());
        }
    }

    /// Declared type name, if any.
    pub fn data_type(&self) -> Option<&str> {
        match self.get(CheckKind::DataType) {
            Some(Constraint::DataType(name)) => Some(name),
            _ => None,
        }
    }

    /// Build a record from a JSON object.
    pub fn from_json_map(map: &IndexMap<String, Json>) -> std::result::Result<Self, String> {
        let mut record = ColumnConstraints::new();
        for (key, json) in map {
            let kind: CheckKind = key.parse().map_err(|e: FrameCheckError| e.to_string())?;
            record.insert(Constraint::from_json(kind, json)?);
        }
        Ok(record)
    }
}

impl FromIterator<Constraint> for ColumnConstraints {
    fn from_iter<I: IntoIterator<Item = Constraint>>(iter: I) -> Self {
        let mut record = ColumnConstraints::new();
        for constraint in iter {
            record.insert(constraint);
        }
        record
    }
}

impl Serialize for ColumnConstraints {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(self.len()))?;
        for constraint in self.iter() {
            map.serialize_entry(constraint.kind().name(), &constraint.to_json())?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ColumnConstraints {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let map = IndexMap::<String, Json>::deserialize(deserializer)?;
        ColumnConstraints::from_json_map(&map).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_overrides_and_keeps_order() {
        let mut record = ColumnConstraints::new()
            .with(Constraint::DataType("int64".into()))
            .with(Constraint::Nullable(false))
            .with(Constraint::MinValue(Some(Number::Int(0))));

        let patch = ColumnConstraints::new()
            .with(Constraint::MinValue(Some(Number::Int(18))))
            .with(Constraint::MaxValue(Some(Number::Int(65))));
        record.merge(&patch);

        let kinds: Vec<_> = record.kinds().collect();
        assert_eq!(
            kinds,
            vec![
                CheckKind::DataType,
                CheckKind::Nullable,
                CheckKind::MinValue,
                CheckKind::MaxValue
            ]
        );
        assert_eq!(
            record.get(CheckKind::MinValue),
            Some(&Constraint::MinValue(Some(Number::Int(18))))
        );
    }

    #[test]
    fn test_json_shapes() {
        assert_eq!(Constraint::Nullable(true).to_json(), Json::Bool(true));
        assert_eq!(Constraint::MinValue(None).to_json(), Json::Null);
        assert_eq!(
            Constraint::MaxDate(NaiveDate::from_ymd_opt(2024, 2, 29)).to_json(),
            Json::String("2024-02-29".into())
        );

        let range = Constraint::ValueRange(vec![Value::from("A"), Value::Int(1), Value::Null]);
        let parsed = Constraint::from_json(CheckKind::ValueRange, &range.to_json()).unwrap();
        assert_eq!(parsed, range);
    }

    #[test]
    fn test_json_rejects_wrong_shape() {
        assert!(Constraint::from_json(CheckKind::Nullable, &Json::String("yes".into())).is_err());
        assert!(Constraint::from_json(CheckKind::MinLength, &Json::from(-1)).is_err());
        assert!(Constraint::from_json(CheckKind::MinDate, &Json::String("soon".into())).is_err());
    }

    #[test]
    fn test_cells_parse_back() {
        let constraints = vec![
            Constraint::DataType("float64".into()),
            Constraint::Nullable(false),
            Constraint::MinLength(3),
            Constraint::ValueRange(vec![Value::from("x"), Value::Null]),
            Constraint::MinValue(Some(Number::Float(1.5))),
            Constraint::MaxValue(Some(Number::Float(3.0))),
            Constraint::MaxValue(None),
            Constraint::MinDate(NaiveDate::from_ymd_opt(2020, 1, 31)),
            Constraint::MaxDate(None),
        ];
        for constraint in constraints {
            let cell = constraint.to_cell();
            let parsed = Constraint::parse(constraint.kind(), &cell).unwrap();
            assert_eq!(parsed, constraint, "cell {:?}", cell);
        }
    }

    #[test]
    fn test_parse_lenient_cells() {
        assert_eq!(
            Constraint::parse(CheckKind::MaxLength, "5.0").unwrap(),
            Constraint::MaxLength(5)
        );
        assert_eq!(
            Constraint::parse(CheckKind::Unique, "true").unwrap(),
            Constraint::Unique(true)
        );
        assert!(Constraint::parse(CheckKind::MinValue, "abc").is_err());
    }

    #[test]
    fn test_record_deserialize_rejects_unknown_kind() {
        let json = r#"{"data_type": "int64", "colour": "blue"}"#;
        assert!(serde_json::from_str::<ColumnConstraints>(json).is_err());
    }
}
