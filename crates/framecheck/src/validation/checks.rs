//! One check function per constraint kind.
//!
//! Every check has the same shape: it takes the constraint value and the
//! target column and returns an outcome plus the positions of the rows that
//! broke the constraint.

use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::NaiveDate;

use crate::input::{Column, ColumnKind, DType, Number, Value};
use crate::schema::Constraint;

use super::result::CheckOutcome;

/// Outcome of a check and the rows that caused its breaks.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckResult {
    pub outcome: CheckOutcome,
    /// Failing row positions, in row order. Empty for summary-only checks.
    pub rows: Vec<usize>,
}

impl CheckResult {
    fn from_rows(rows: Vec<usize>) -> Self {
        Self {
            outcome: CheckOutcome::Breaks(rows.len()),
            rows,
        }
    }

    fn passed() -> Self {
        Self::from_rows(Vec::new())
    }

    fn not_applicable() -> Self {
        Self {
            outcome: CheckOutcome::NotApplicable,
            rows: Vec::new(),
        }
    }
}

/// Run the check matching `constraint` against `column`.
pub fn run_check(constraint: &Constraint, column: &Column) -> CheckResult {
    match constraint {
        Constraint::DataType(expected) => check_data_type(expected, column),
        Constraint::Nullable(allowed) => check_nullable(*allowed, column),
        Constraint::Unique(required) => check_unique(*required, column),
        Constraint::MinLength(bound) => check_length(column, |len| len < *bound),
        Constraint::MaxLength(bound) => check_length(column, |len| len > *bound),
        Constraint::ValueRange(allowed) => check_value_range(allowed, column),
        Constraint::MinValue(bound) => check_value(*bound, column, Ordering::Less),
        Constraint::MaxValue(bound) => check_value(*bound, column, Ordering::Greater),
        Constraint::MinDate(bound) => check_date(*bound, column, |d, b| d < b),
        Constraint::MaxDate(bound) => check_date(*bound, column, |d, b| d > b),
    }
}

/// Summary-only: one break on a type mismatch, never any rows.
fn check_data_type(expected: &str, column: &Column) -> CheckResult {
    let matches = expected == column.dtype().name()
        || DType::from_name(expected) == Some(column.dtype());

    CheckResult {
        outcome: CheckOutcome::Breaks(usize::from(!matches)),
        rows: Vec::new(),
    }
}

fn check_nullable(allowed: bool, column: &Column) -> CheckResult {
    if allowed {
        return CheckResult::passed();
    }
    CheckResult::from_rows(matching_rows(column, Value::is_null))
}

/// Later occurrences of a non-null value break; the first does not.
fn check_unique(required: bool, column: &Column) -> CheckResult {
    if !required {
        return CheckResult::passed();
    }

    let mut seen = HashSet::new();
    let rows = column
        .iter()
        .enumerate()
        .filter_map(|(row, value)| {
            let key = value.key()?;
            (!seen.insert(key)).then_some(row)
        })
        .collect();
    CheckResult::from_rows(rows)
}

fn check_length(column: &Column, breaks: impl Fn(usize) -> bool) -> CheckResult {
    if !column.kind().is_textual() {
        return CheckResult::not_applicable();
    }
    CheckResult::from_rows(matching_rows(column, |value| {
        !value.is_null() && breaks(value.render().chars().count())
    }))
}

fn check_value_range(allowed: &[Value], column: &Column) -> CheckResult {
    let allowed: HashSet<_> = allowed.iter().filter_map(Value::key).collect();
    CheckResult::from_rows(matching_rows(column, |value| {
        value.key().is_some_and(|key| !allowed.contains(&key))
    }))
}

/// Rows whose value orders as `breaking` against the bound. Integer values
/// and integer bounds compare exactly.
fn check_value(bound: Option<Number>, column: &Column, breaking: Ordering) -> CheckResult {
    if column.kind() != ColumnKind::Numeric {
        return CheckResult::not_applicable();
    }
    let Some(bound) = bound else {
        return CheckResult::passed();
    };

    CheckResult::from_rows(matching_rows(column, |value| {
        Number::from_value(value).and_then(|v| v.compare(&bound)) == Some(breaking)
    }))
}

fn check_date(
    bound: Option<NaiveDate>,
    column: &Column,
    breaks: impl Fn(NaiveDate, NaiveDate) -> bool,
) -> CheckResult {
    if column.dtype() != DType::DateTime {
        return CheckResult::not_applicable();
    }
    let Some(bound) = bound else {
        return CheckResult::passed();
    };

    CheckResult::from_rows(matching_rows(column, |value| {
        value.as_datetime().is_some_and(|dt| breaks(dt.date(), bound))
    }))
}

fn matching_rows(column: &Column, predicate: impl Fn(&Value) -> bool) -> Vec<usize> {
    column
        .iter()
        .enumerate()
        .filter(|(_, value)| predicate(value))
        .map(|(row, _)| row)
        .collect()
}
