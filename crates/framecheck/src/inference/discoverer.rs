//! Constraint discovery from a reference table.

use std::cmp::Ordering;
use std::collections::HashSet;

use tracing::{debug, info};

use crate::input::{Column, ColumnKind, DataTable, Number, Value};
use crate::schema::{ColumnConstraints, Constraint, ConstraintSet};

/// Derives a [`ConstraintSet`] from the contents of a table.
///
/// Every column gets `data_type` and `nullable`. Further constraints depend
/// on the column kind:
///
/// | Kind                      | Constraints                                         |
/// |---------------------------|-----------------------------------------------------|
/// | numeric                   | `min_value`, `max_value`                            |
/// | datetime                  | `min_date`, `max_date`                              |
/// | categorical / text        | `unique`, `min_length`, `max_length`, `value_range` |
/// | boolean                   | none                                                |
#[derive(Debug, Clone, Default)]
pub struct Discoverer;

impl Discoverer {
    pub fn new() -> Self {
        Self
    }

    /// Discover constraints for every column, in table column order.
    pub fn discover(&self, table: &DataTable) -> ConstraintSet {
        let mut set = ConstraintSet::new();

        for column in table.columns() {
            let record = self.discover_column(column);
            debug!(
                column = %column.name(),
                dtype = %column.dtype(),
                constraints = record.len(),
                "Discovered column constraints"
            );
            set.insert(column.name(), record);
        }

        info!(
            columns = set.len(),
            rows = table.row_count(),
            "Constraint discovery complete"
        );
        set
    }

    /// Discover the constraint record of a single column.
    pub fn discover_column(&self, column: &Column) -> ColumnConstraints {
        let mut record = ColumnConstraints::new()
            .with(Constraint::DataType(column.dtype().name().to_string()))
            .with(Constraint::Nullable(column.null_count() > 0));

        match column.kind() {
            ColumnKind::Numeric => {
                let (min, max) = numeric_bounds(column);
                record.insert(Constraint::MinValue(min));
                record.insert(Constraint::MaxValue(max));
            }
            ColumnKind::DateTime => {
                let dates = column.iter().filter_map(Value::as_datetime);
                let (min, max) = dates.fold((None, None), |(lo, hi), dt| {
                    (
                        Some(lo.map_or(dt, |l: chrono::NaiveDateTime| l.min(dt))),
                        Some(hi.map_or(dt, |h: chrono::NaiveDateTime| h.max(dt))),
                    )
                });
                record.insert(Constraint::MinDate(min.map(|dt| dt.date())));
                record.insert(Constraint::MaxDate(max.map(|dt| dt.date())));
            }
            ColumnKind::Categorical | ColumnKind::Text | ColumnKind::Other => {
                let (min_length, max_length) = length_bounds(column);
                record.insert(Constraint::Unique(!column.has_duplicates()));
                record.insert(Constraint::MinLength(min_length));
                record.insert(Constraint::MaxLength(max_length));
                record.insert(Constraint::ValueRange(distinct_values(column)));
            }
            ColumnKind::Boolean => {}
        }

        record
    }
}

/// Column minimum and maximum, ignoring nulls; integer columns keep integer
/// bounds.
fn numeric_bounds(column: &Column) -> (Option<Number>, Option<Number>) {
    let mut min: Option<Number> = None;
    let mut max: Option<Number> = None;

    for number in column.iter().filter_map(Number::from_value) {
        if min.is_none_or(|m| number.compare(&m) == Some(Ordering::Less)) {
            min = Some(number);
        }
        if max.is_none_or(|m| number.compare(&m) == Some(Ordering::Greater)) {
            max = Some(number);
        }
    }

    (min, max)
}

/// Shortest and longest rendered length of the non-null values, `(0, 0)` for
/// an all-null column.
fn length_bounds(column: &Column) -> (usize, usize) {
    let lengths = column
        .iter()
        .filter(|v| !v.is_null())
        .map(|v| v.render().chars().count());

    lengths
        .fold(None, |bounds: Option<(usize, usize)>, len| match bounds {
            None => Some((len, len)),
            Some((lo, hi)) => Some((lo.min(len), hi.max(len))),
        })
        .unwrap_or((0, 0))
}

/// Distinct values in first-appearance order, with a trailing null if the
/// column has any nulls.
fn distinct_values(column: &Column) -> Vec<Value> {
    let mut seen = HashSet::new();
    let mut values = Vec::new();
    let mut has_null = false;

    for value in column.iter() {
        match value.key() {
            None => has_null = true,
            Some(key) => {
                if seen.insert(key) {
                    values.push(value.clone());
                }
            }
        }
    }

    if has_null {
        values.push(Value::Null);
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::DType;
    use crate::schema::CheckKind;
    use chrono::NaiveDate;

    fn discover(column: Column) -> ColumnConstraints {
        Discoverer::new().discover_column(&column)
    }

    #[test]
    fn test_numeric_column() {
        let record = discover(Column::from_values(
            "age",
            vec![Value::Int(25), Value::Null, Value::Int(-5), Value::Int(150)],
        ));

        assert_eq!(
            record.kinds().collect::<Vec<_>>(),
            vec![
                CheckKind::DataType,
                CheckKind::Nullable,
                CheckKind::MinValue,
                CheckKind::MaxValue
            ]
        );
        assert_eq!(record.get(CheckKind::Nullable), Some(&Constraint::Nullable(true)));
        assert_eq!(
            record.get(CheckKind::MinValue),
            Some(&Constraint::MinValue(Some(Number::Int(-5))))
        );
        assert_eq!(
            record.get(CheckKind::MaxValue),
            Some(&Constraint::MaxValue(Some(Number::Int(150))))
        );
    }

    #[test]
    fn test_large_integer_bounds_are_exact() {
        let record = discover(Column::from_values(
            "id",
            vec![Value::Int(9_007_199_254_740_992), Value::Int(9_007_199_254_740_993)],
        ));
        assert_eq!(
            record.get(CheckKind::MaxValue),
            Some(&Constraint::MaxValue(Some(Number::Int(9_007_199_254_740_993))))
        );
        assert_eq!(
            record.get(CheckKind::MinValue),
            Some(&Constraint::MinValue(Some(Number::Int(9_007_199_254_740_992))))
        );
    }

    #[test]
    fn test_all_null_numeric_has_null_bounds() {
        let record = discover(Column::new("x", DType::Float64, vec![Value::Null, Value::Null]));
        assert_eq!(record.get(CheckKind::MinValue), Some(&Constraint::MinValue(None)));
        assert_eq!(record.get(CheckKind::MaxValue), Some(&Constraint::MaxValue(None)));
    }

    #[test]
    fn test_text_column() {
        let record = discover(Column::from_values(
            "code",
            vec![Value::from("A"), Value::from("BBB"), Value::Null, Value::from("A")],
        ));

        assert_eq!(record.get(CheckKind::DataType), Some(&Constraint::DataType("object".into())));
        assert_eq!(record.get(CheckKind::Unique), Some(&Constraint::Unique(false)));
        assert_eq!(record.get(CheckKind::MinLength), Some(&Constraint::MinLength(1)));
        assert_eq!(record.get(CheckKind::MaxLength), Some(&Constraint::MaxLength(3)));
        assert_eq!(
            record.get(CheckKind::ValueRange),
            Some(&Constraint::ValueRange(vec![
                Value::from("A"),
                Value::from("BBB"),
                Value::Null
            ]))
        );
    }

    #[test]
    fn test_all_null_text_column() {
        let record = discover(Column::from_values("empty", vec![Value::Null, Value::Null]));
        assert_eq!(record.get(CheckKind::Nullable), Some(&Constraint::Nullable(true)));
        assert_eq!(record.get(CheckKind::Unique), Some(&Constraint::Unique(true)));
        assert_eq!(record.get(CheckKind::MinLength), Some(&Constraint::MinLength(0)));
        assert_eq!(record.get(CheckKind::ValueRange), Some(&Constraint::ValueRange(vec![Value::Null])));
    }

    #[test]
    fn test_datetime_column() {
        let day = |d| {
            NaiveDate::from_ymd_opt(2023, 3, d)
                .unwrap()
                .and_hms_opt(12, 30, 0)
                .unwrap()
        };
        let record = discover(Column::from_values(
            "when",
            vec![Value::DateTime(day(15)), Value::DateTime(day(2)), Value::Null],
        ));

        assert_eq!(
            record.get(CheckKind::DataType),
            Some(&Constraint::DataType("datetime64[ns]".into()))
        );
        assert_eq!(
            record.get(CheckKind::MinDate),
            Some(&Constraint::MinDate(NaiveDate::from_ymd_opt(2023, 3, 2)))
        );
        assert_eq!(
            record.get(CheckKind::MaxDate),
            Some(&Constraint::MaxDate(NaiveDate::from_ymd_opt(2023, 3, 15)))
        );
    }

    #[test]
    fn test_boolean_column_gets_generic_pair_only() {
        let record = discover(Column::from_values("flag", vec![Value::Bool(true), Value::Bool(false)]));
        assert_eq!(record.len(), 2);
        assert!(record.kinds().all(|kind| kind.is_generic()));
    }

    #[test]
    fn test_discover_keeps_column_order() {
        let table = DataTable::from_rows(
            &["z", "a", "m"],
            vec![vec![Value::Int(1), Value::from("x"), Value::Bool(true)]],
        )
        .unwrap();
        let set = Discoverer::new().discover(&table);
        assert_eq!(set.column_names().collect::<Vec<_>>(), vec!["z", "a", "m"]);
    }

    #[test]
    fn test_empty_table_gives_empty_set() {
        assert!(Discoverer::new().discover(&DataTable::default()).is_empty());
    }
}
