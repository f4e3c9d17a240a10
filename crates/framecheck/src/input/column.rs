//! Typed columns and the column-kind classification shared by discovery and
//! verification.

use std::collections::HashMap;

use crate::error::{FrameCheckError, Result};

use super::dtype::DType;
use super::value::{datetime_from_epoch, looks_like_epoch, parse_datetime, Value, ValueKey};

static NULL: Value = Value::Null;

/// Broad column family used to select which constraints apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Numeric,
    DateTime,
    Categorical,
    Text,
    Boolean,
    /// An `object` column with no non-null values.
    Other,
}

impl ColumnKind {
    /// Categorical, free text and all-null object columns share the textual
    /// constraint family.
    pub fn is_textual(&self) -> bool {
        matches!(
            self,
            ColumnKind::Categorical | ColumnKind::Text | ColumnKind::Other
        )
    }
}

/// Classify a column by its runtime type.
pub fn classify(column: &Column) -> ColumnKind {
    match column.dtype() {
        DType::Int8 | DType::Int16 | DType::Int32 | DType::Int64 => ColumnKind::Numeric,
        DType::Float32 | DType::Float64 => ColumnKind::Numeric,
        DType::DateTime => ColumnKind::DateTime,
        DType::Category => ColumnKind::Categorical,
        DType::Bool => ColumnKind::Boolean,
        DType::Object => {
            if column.iter().all(Value::is_null) {
                ColumnKind::Other
            } else {
                ColumnKind::Text
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum ColumnData {
    Plain(Vec<Value>),
    Categorical {
        categories: Vec<Value>,
        codes: Vec<Option<u32>>,
    },
}

/// A named, typed sequence of values.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    dtype: DType,
    data: ColumnData,
}

impl Column {
    /// Create a column with an explicit type. `Category` columns are encoded
    /// on construction.
    pub fn new(name: impl Into<String>, dtype: DType, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            dtype: DType::Object,
            data: ColumnData::Plain(values),
        }
        .with_dtype(dtype)
    }

    /// Create a column, inferring its type from the values.
    pub fn from_values(name: impl Into<String>, values: Vec<Value>) -> Self {
        let dtype = infer_dtype(&values);
        let values = if dtype.is_float() {
            values
                .into_iter()
                .map(|v| match v {
                    Value::Int(i) => Value::Float(i as f64),
                    other => other,
                })
                .collect()
        } else {
            values
        };
        Self::new(name, dtype, values)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Kind of this column, see [`classify`].
    pub fn kind(&self) -> ColumnKind {
        classify(self)
    }

    pub fn len(&self) -> usize {
        match &self.data {
            ColumnData::Plain(values) => values.len(),
            ColumnData::Categorical { codes, .. } => codes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value at `row`; out-of-range rows read as null.
    pub fn get(&self, row: usize) -> &Value {
        match &self.data {
            ColumnData::Plain(values) => values.get(row).unwrap_or(&NULL),
            ColumnData::Categorical { categories, codes } => codes
                .get(row)
                .copied()
                .flatten()
                .and_then(|code| categories.get(code as usize))
                .unwrap_or(&NULL),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> + '_ {
        (0..self.len()).map(move |row| self.get(row))
    }

    /// Owned copy of every value in row order.
    pub fn values(&self) -> Vec<Value> {
        self.iter().cloned().collect()
    }

    pub fn null_count(&self) -> usize {
        self.iter().filter(|v| v.is_null()).count()
    }

    /// Distinct categories, for categorical columns.
    pub fn categories(&self) -> Option<&[Value]> {
        match &self.data {
            ColumnData::Categorical { categories, .. } => Some(categories),
            ColumnData::Plain(_) => None,
        }
    }

    /// Returns true if any non-null value occurs more than once.
    pub fn has_duplicates(&self) -> bool {
        let mut seen = std::collections::HashSet::new();
        self.iter()
            .filter_map(Value::key)
            .any(|key| !seen.insert(key))
    }

    /// Relabel the column type, re-encoding storage when moving into or out
    /// of `Category`. Values are not converted.
    pub(crate) fn with_dtype(self, dtype: DType) -> Self {
        let column = if dtype == DType::Category {
            self.into_categorical()
        } else {
            self.into_plain()
        };
        Self { dtype, ..column }
    }

    /// Replace the values, keeping name and type.
    pub(crate) fn with_values(&self, values: Vec<Value>) -> Self {
        Self::new(self.name.clone(), self.dtype, values)
    }

    /// Convert every value to `target`, failing on the first value that
    /// cannot be represented.
    pub fn cast(&self, target: DType) -> Result<Column> {
        if target == self.dtype {
            return Ok(self.clone());
        }

        let mut converted = Vec::with_capacity(self.len());
        for value in self.iter() {
            if value.is_null() {
                converted.push(Value::Null);
                continue;
            }
            let cast = cast_value(value, target).ok_or_else(|| FrameCheckError::TypeCoercion {
                column: self.name.clone(),
                value: value.render(),
                target: target.name().to_string(),
            })?;
            converted.push(cast);
        }

        Ok(Column::new(self.name.clone(), target, converted))
    }

    fn into_categorical(self) -> Self {
        if matches!(self.data, ColumnData::Categorical { .. }) {
            return self;
        }

        let mut categories = Vec::new();
        let mut index: HashMap<ValueKey, u32> = HashMap::new();
        let mut codes = Vec::with_capacity(self.len());

        for value in self.iter() {
            match value.key() {
                None => codes.push(None),
                Some(key) => {
                    let code = *index.entry(key).or_insert_with(|| {
                        categories.push(value.clone());
                        (categories.len() - 1) as u32
                    });
                    codes.push(Some(code));
                }
            }
        }

        Self {
            name: self.name,
            dtype: DType::Category,
            data: ColumnData::Categorical { categories, codes },
        }
    }

    fn into_plain(self) -> Self {
        match self.data {
            ColumnData::Plain(_) => self,
            ColumnData::Categorical { .. } => {
                let values = self.values();
                Self {
                    name: self.name,
                    dtype: self.dtype,
                    data: ColumnData::Plain(values),
                }
            }
        }
    }
}

/// Infer a storage type from loaded values.
fn infer_dtype(values: &[Value]) -> DType {
    let mut non_null = values.iter().filter(|v| !v.is_null()).peekable();
    if non_null.peek().is_none() {
        return DType::Object;
    }

    let (mut bools, mut ints, mut floats, mut dates, mut other) = (0, 0, 0, 0, 0);
    for value in non_null {
        match value {
            Value::Bool(_) => bools += 1,
            Value::Int(_) => ints += 1,
            Value::Float(_) => floats += 1,
            Value::DateTime(_) => dates += 1,
            _ => other += 1,
        }
    }

    match (bools, ints, floats, dates, other) {
        (_, 0, 0, 0, 0) => DType::Bool,
        (0, _, 0, 0, 0) => DType::Int64,
        (0, _, _, 0, 0) => DType::Float64,
        (0, 0, 0, _, 0) => DType::DateTime,
        _ => DType::Object,
    }
}

fn cast_value(value: &Value, target: DType) -> Option<Value> {
    match target {
        DType::Bool => match value {
            Value::Bool(b) => Some(Value::Bool(*b)),
            Value::Int(0) => Some(Value::Bool(false)),
            Value::Int(1) => Some(Value::Bool(true)),
            Value::Text(s) => parse_bool(s).map(Value::Bool),
            _ => None,
        },
        DType::Int8 | DType::Int16 | DType::Int32 | DType::Int64 => {
            let int = match value {
                Value::Int(i) => *i,
                Value::Bool(b) => i64::from(*b),
                Value::Float(f) => integral(*f)?,
                Value::Text(s) => {
                    let trimmed = s.trim();
                    match trimmed.parse::<i64>() {
                        Ok(i) => i,
                        Err(_) => integral(trimmed.parse::<f64>().ok()?)?,
                    }
                }
                _ => return None,
            };
            let (lo, hi) = target.integer_bounds()?;
            (lo..=hi).contains(&int).then_some(Value::Int(int))
        }
        DType::Float32 | DType::Float64 => {
            let float = match value {
                Value::Int(i) => *i as f64,
                Value::Float(f) => *f,
                Value::Bool(b) => f64::from(u8::from(*b)),
                Value::Text(s) => s.trim().parse::<f64>().ok()?,
                _ => return None,
            };
            if target == DType::Float32 {
                Some(Value::Float(float as f32 as f64))
            } else {
                Some(Value::Float(float))
            }
        }
        DType::Object | DType::Category => Some(value.clone()),
        DType::DateTime => match value {
            Value::DateTime(dt) => Some(Value::DateTime(*dt)),
            Value::Int(_) | Value::Float(_) => datetime_from_epoch(&value.render()).map(Value::DateTime),
            Value::Text(s) if looks_like_epoch(s) => datetime_from_epoch(s).map(Value::DateTime),
            Value::Text(s) => parse_datetime(s).map(Value::DateTime),
            _ => None,
        },
    }
}

fn integral(f: f64) -> Option<i64> {
    (f.is_finite() && f.fract() == 0.0 && f.abs() < 9.2e18).then_some(f as i64)
}

/// Parse a boolean token.
pub(crate) fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}
