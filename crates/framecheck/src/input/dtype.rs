//! Column storage types.

use std::fmt;
use std::str::FromStr;

use crate::error::FrameCheckError;

/// Concrete runtime type of a column.
///
/// Names follow the dataframe conventions used by persisted constraint files
/// (`int64`, `float32`, `object`, `category`, `datetime64[ns]`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    /// Free-form values, usually text.
    Object,
    /// Text stored as distinct categories plus per-row codes.
    Category,
    DateTime,
}

impl DType {
    /// Canonical type name.
    pub fn name(&self) -> &'static str {
        match self {
            DType::Bool => "bool",
            DType::Int8 => "int8",
            DType::Int16 => "int16",
            DType::Int32 => "int32",
            DType::Int64 => "int64",
            DType::Float32 => "float32",
            DType::Float64 => "float64",
            DType::Object => "object",
            DType::Category => "category",
            DType::DateTime => "datetime64[ns]",
        }
    }

    /// Parse a type name, accepting common aliases.
    pub fn from_name(name: &str) -> Option<Self> {
        let dtype = match name.trim().to_ascii_lowercase().as_str() {
            "bool" | "boolean" => DType::Bool,
            "int8" => DType::Int8,
            "int16" => DType::Int16,
            "int32" => DType::Int32,
            "int64" | "int" => DType::Int64,
            "float32" => DType::Float32,
            "float64" | "float" => DType::Float64,
            "object" | "str" | "string" => DType::Object,
            "category" => DType::Category,
            "datetime64[ns]" | "datetime64" | "datetime" => DType::DateTime,
            _ => return None,
        };
        Some(dtype)
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, DType::Int8 | DType::Int16 | DType::Int32 | DType::Int64)
    }

    pub fn is_float(&self) -> bool {
        matches!(self, DType::Float32 | DType::Float64)
    }

    /// Returns true for integer and float types (booleans are not numeric).
    pub fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_float()
    }

    /// Inclusive value range representable by an integer type.
    pub fn integer_bounds(&self) -> Option<(i64, i64)> {
        match self {
            DType::Int8 => Some((i8::MIN as i64, i8::MAX as i64)),
            DType::Int16 => Some((i16::MIN as i64, i16::MAX as i64)),
            DType::Int32 => Some((i32::MIN as i64, i32::MAX as i64)),
            DType::Int64 => Some((i64::MIN, i64::MAX)),
            _ => None,
        }
    }

    /// Smallest integer type that can hold every value in `[min, max]`.
    pub fn smallest_integer(min: i64, max: i64) -> Self {
        [DType::Int8, DType::Int16, DType::Int32]
            .into_iter()
            .find(|dtype| {
                dtype
                    .integer_bounds()
                    .is_some_and(|(lo, hi)| min >= lo && max <= hi)
            })
            .unwrap_or(DType::Int64)
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DType {
    type Err = FrameCheckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DType::from_name(s).ok_or_else(|| {
            FrameCheckError::UnsupportedFormat(format!("unknown data type '{}'", s))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for dtype in [
            DType::Bool,
            DType::Int8,
            DType::Int16,
            DType::Int32,
            DType::Int64,
            DType::Float32,
            DType::Float64,
            DType::Object,
            DType::Category,
            DType::DateTime,
        ] {
            assert_eq!(DType::from_name(dtype.name()), Some(dtype));
        }
        assert_eq!(DType::from_name("datetime"), Some(DType::DateTime));
        assert_eq!(DType::from_name("decimal"), None);
        assert_eq!("INT64".parse::<DType>().unwrap(), DType::Int64);
        assert!("decimal".parse::<DType>().is_err());
    }

    #[test]
    fn test_smallest_integer() {
        assert_eq!(DType::smallest_integer(0, 100), DType::Int8);
        assert_eq!(DType::smallest_integer(-200, 100), DType::Int16);
        assert_eq!(DType::smallest_integer(0, 70_000), DType::Int32);
        assert_eq!(DType::smallest_integer(0, 5_000_000_000), DType::Int64);
    }

    #[test]
    fn test_bool_is_not_numeric() {
        assert!(!DType::Bool.is_numeric());
        assert!(DType::Float32.is_numeric());
    }
}
