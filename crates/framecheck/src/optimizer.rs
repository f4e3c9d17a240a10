//! Memory-oriented type narrowing and date-column guessing.
//!
//! The optimizer never changes the row count, the column set or the column
//! order of a table. Every conversion is lossless; anything that would lose
//! information is skipped and the column is left as it was.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::input::{parse_datetime, Column, DType, DataTable, Value};

// Column names that hint at date content.
static DATE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)fecha|date|dt|maturity|erod").unwrap());

/// Optimizer configuration.
#[derive(Debug, Clone)]
pub struct OptimizerConfig {
    /// Narrow integer and float columns to the smallest lossless type.
    pub downcast_numeric: bool,
    /// Store text columns with repeated values as categories.
    pub categorize_text: bool,
    /// Parse text columns with date-like names as timestamps.
    pub guess_dates: bool,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            downcast_numeric: true,
            categorize_text: true,
            guess_dates: true,
        }
    }
}

/// Narrows column types and detects date columns by name.
pub struct TypeOptimizer {
    config: OptimizerConfig,
}

impl TypeOptimizer {
    pub fn new() -> Self {
        Self {
            config: OptimizerConfig::default(),
        }
    }

    pub fn with_config(config: OptimizerConfig) -> Self {
        Self { config }
    }

    /// Return an optimized copy of `table`.
    pub fn optimize(&self, table: &DataTable) -> DataTable {
        let mut optimized = table.clone();
        let names: Vec<String> = table.column_names().map(str::to_string).collect();

        for name in names {
            let Some(column) = optimized.column(&name) else {
                continue;
            };
            let Some(replacement) = self.optimize_column(column) else {
                continue;
            };

            debug!(
                column = %name,
                from = %column.dtype(),
                to = %replacement.dtype(),
                "Converted column"
            );
            // Conversions keep the row count, so replacement cannot fail
            if optimized.replace_column(replacement).is_err() {
                continue;
            }
        }

        optimized
    }

    fn optimize_column(&self, column: &Column) -> Option<Column> {
        let dtype = column.dtype();

        if self.config.guess_dates
            && matches!(dtype, DType::Object | DType::Category)
            && DATE_NAME.is_match(column.name())
        {
            if let Some(dates) = parse_dates(column) {
                return Some(dates);
            }
        }

        if self.config.downcast_numeric {
            if dtype.is_integer() {
                return downcast_integer(column);
            }
            if dtype == DType::Float64 {
                return downcast_float(column);
            }
        }

        if self.config.categorize_text && dtype == DType::Object && column.has_duplicates() {
            return Some(column.clone().with_dtype(DType::Category));
        }

        None
    }
}

impl Default for TypeOptimizer {
    fn default() -> Self {
        Self::new()
    }
}

fn downcast_integer(column: &Column) -> Option<Column> {
    let ints = column.iter().filter_map(|v| match v {
        Value::Int(i) => Some(*i),
        _ => None,
    });
    let (min, max) = ints.fold((0i64, 0i64), |(lo, hi), i| (lo.min(i), hi.max(i)));

    let target = DType::smallest_integer(min, max);
    (target != column.dtype()).then(|| column.clone().with_dtype(target))
}

fn downcast_float(column: &Column) -> Option<Column> {
    let lossless = column
        .iter()
        .filter_map(Value::as_f64)
        .all(|f| (f as f32 as f64) == f);

    lossless.then(|| column.clone().with_dtype(DType::Float32))
}

/// Parse every non-null cell as a date, or give up on the whole column.
fn parse_dates(column: &Column) -> Option<Column> {
    let mut parsed = Vec::with_capacity(column.len());
    let mut any = false;

    for value in column.iter() {
        if value.is_null() {
            parsed.push(Value::Null);
            continue;
        }
        let dt = parse_datetime(value.as_str()?)?;
        parsed.push(Value::DateTime(dt));
        any = true;
    }

    any.then(|| Column::new(column.name(), DType::DateTime, parsed))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> DataTable {
        DataTable::from_rows(
            &["id", "score", "ratio", "city", "name", "start_date", "notes_dt"],
            vec![
                vec![
                    Value::Int(1),
                    Value::Float(0.5),
                    Value::Float(0.1),
                    Value::from("Lima"),
                    Value::from("Ana"),
                    Value::from("2023-01-05"),
                    Value::from("soon"),
                ],
                vec![
                    Value::Int(300),
                    Value::Float(2.0),
                    Value::Float(0.2),
                    Value::from("Lima"),
                    Value::from("Luis"),
                    Value::Null,
                    Value::from("2023-01-05"),
                ],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_optimize_narrows_types() {
        let optimized = TypeOptimizer::new().optimize(&table());
        let dtype = |name: &str| optimized.column(name).map(Column::dtype);

        assert_eq!(dtype("id"), Some(DType::Int16));
        assert_eq!(dtype("score"), Some(DType::Float32));
        // 0.1 does not survive an f32 round trip
        assert_eq!(dtype("ratio"), Some(DType::Float64));
        assert_eq!(dtype("city"), Some(DType::Category));
        assert_eq!(dtype("name"), Some(DType::Object));
        assert_eq!(dtype("start_date"), Some(DType::DateTime));
        assert_eq!(dtype("notes_dt"), Some(DType::Object));
    }

    #[test]
    fn test_optimize_preserves_shape_and_input() {
        let original = table();
        let optimized = TypeOptimizer::new().optimize(&original);

        assert_eq!(optimized.row_count(), original.row_count());
        assert_eq!(
            optimized.column_names().collect::<Vec<_>>(),
            original.column_names().collect::<Vec<_>>()
        );
        assert_eq!(original.column("id").map(Column::dtype), Some(DType::Int64));
        assert_eq!(
            optimized.column("city").unwrap().values(),
            original.column("city").unwrap().values()
        );
    }

    #[test]
    fn test_date_guessing_can_be_disabled() {
        let optimizer = TypeOptimizer::with_config(OptimizerConfig {
            guess_dates: false,
            ..OptimizerConfig::default()
        });
        let optimized = optimizer.optimize(&table());
        assert_eq!(
            optimized.column("start_date").map(Column::dtype),
            Some(DType::Object)
        );
    }
}
