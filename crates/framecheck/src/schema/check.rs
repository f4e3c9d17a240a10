//! The closed set of constraint kinds.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FrameCheckError;

/// A kind of per-column constraint, and the check that verifies it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    /// Concrete runtime type name.
    DataType,
    /// Whether nulls are allowed.
    Nullable,
    /// Whether non-null values must be distinct.
    Unique,
    MinLength,
    MaxLength,
    /// Closed allow-list of values.
    ValueRange,
    MinValue,
    MaxValue,
    MinDate,
    MaxDate,
}

impl CheckKind {
    /// Every kind, in canonical column order for persisted files.
    pub const ALL: [CheckKind; 10] = [
        CheckKind::DataType,
        CheckKind::Nullable,
        CheckKind::Unique,
        CheckKind::MinLength,
        CheckKind::MaxLength,
        CheckKind::ValueRange,
        CheckKind::MinValue,
        CheckKind::MaxValue,
        CheckKind::MinDate,
        CheckKind::MaxDate,
    ];

    /// Persisted name of this kind.
    pub fn name(&self) -> &'static str {
        match self {
            CheckKind::DataType => "data_type",
            CheckKind::Nullable => "nullable",
            CheckKind::Unique => "unique",
            CheckKind::MinLength => "min_length",
            CheckKind::MaxLength => "max_length",
            CheckKind::ValueRange => "value_range",
            CheckKind::MinValue => "min_value",
            CheckKind::MaxValue => "max_value",
            CheckKind::MinDate => "min_date",
            CheckKind::MaxDate => "max_date",
        }
    }

    /// Returns true if the check always runs regardless of column kind.
    pub fn is_generic(&self) -> bool {
        matches!(self, CheckKind::DataType | CheckKind::Nullable)
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CheckKind {
    type Err = FrameCheckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        // Older constraint files spell min_length without the "n"
        if trimmed == "min_legth" {
            return Ok(CheckKind::MinLength);
        }
        CheckKind::ALL
            .into_iter()
            .find(|kind| kind.name() == trimmed)
            .ok_or_else(|| FrameCheckError::UnsupportedFormat(format!("unknown check '{}'", s)))
    }
}
