//! In-memory table and source metadata.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{FrameCheckError, Result};

use super::column::Column;
use super::value::Value;

/// Metadata about a loaded data file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// File name without path.
    pub file: String,
    /// Full path to the file.
    pub path: PathBuf,
    /// SHA-256 hash of the file contents.
    pub hash: String,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Detected format (csv, tsv, etc.).
    pub format: String,
    /// Number of data rows (excluding header).
    pub row_count: usize,
    /// Number of columns.
    pub column_count: usize,
    /// When the file was loaded.
    pub loaded_at: DateTime<Utc>,
}

impl SourceMetadata {
    /// Create metadata for a file that has been loaded.
    pub fn new(
        path: PathBuf,
        hash: String,
        size_bytes: u64,
        format: String,
        row_count: usize,
        column_count: usize,
    ) -> Self {
        let file = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            file,
            path,
            hash,
            size_bytes,
            format,
            row_count,
            column_count,
            loaded_at: Utc::now(),
        }
    }
}

/// An ordered collection of uniquely named, equal-length columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataTable {
    columns: IndexMap<String, Column>,
}

impl DataTable {
    /// Build a table, rejecting duplicate names and ragged columns.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let mut map = IndexMap::with_capacity(columns.len());
        let expected_len = columns.first().map(Column::len);

        for column in columns {
            if Some(column.len()) != expected_len {
                return Err(FrameCheckError::InvalidTable(format!(
                    "column '{}' has {} rows, expected {}",
                    column.name(),
                    column.len(),
                    expected_len.unwrap_or_default()
                )));
            }
            let name = column.name().to_string();
            if map.insert(name.clone(), column).is_some() {
                return Err(FrameCheckError::InvalidTable(format!(
                    "duplicate column name '{}'",
                    name
                )));
            }
        }

        Ok(Self { columns: map })
    }

    /// Build a table from row-major values, inferring each column's type.
    pub fn from_rows(headers: &[&str], rows: Vec<Vec<Value>>) -> Result<Self> {
        let mut columns: Vec<Vec<Value>> = vec![Vec::with_capacity(rows.len()); headers.len()];
        for (row_idx, row) in rows.into_iter().enumerate() {
            if row.len() != headers.len() {
                return Err(FrameCheckError::InvalidTable(format!(
                    "row {} has {} values, expected {}",
                    row_idx,
                    row.len(),
                    headers.len()
                )));
            }
            for (values, value) in columns.iter_mut().zip(row) {
                values.push(value);
            }
        }

        Self::new(
            headers
                .iter()
                .zip(columns)
                .map(|(name, values)| Column::from_values(*name, values))
                .collect(),
        )
    }

    /// Get the number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Get the number of rows.
    pub fn row_count(&self) -> usize {
        self.columns.values().next().map(Column::len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Column names in table order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.columns.keys().map(String::as_str)
    }

    /// Columns in table order.
    pub fn columns(&self) -> impl Iterator<Item = &Column> + '_ {
        self.columns.values()
    }

    /// Get a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    /// Get a column by name or fail with a lookup error.
    pub fn require_column(&self, name: &str) -> Result<&Column> {
        self.column(name)
            .ok_or_else(|| FrameCheckError::column_not_found(name))
    }

    pub fn contains_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Replace an existing column in place, keeping its position.
    pub fn replace_column(&mut self, column: Column) -> Result<()> {
        if column.len() != self.row_count() {
            return Err(FrameCheckError::InvalidTable(format!(
                "replacement column '{}' has {} rows, expected {}",
                column.name(),
                column.len(),
                self.row_count()
            )));
        }
        let slot = self
            .columns
            .get_mut(column.name())
            .ok_or_else(|| FrameCheckError::column_not_found(column.name()))?;
        *slot = column;
        Ok(())
    }

    /// Owned copy of one row, in column order.
    pub fn row(&self, index: usize) -> Vec<Value> {
        self.columns
            .values()
            .map(|column| column.get(index).clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::DType;

    fn sample() -> DataTable {
        DataTable::from_rows(
            &["name", "age"],
            vec![
                vec![Value::from("Alice"), Value::Int(30)],
                vec![Value::from("Bob"), Value::Null],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_from_rows() {
        let table = sample();
        assert_eq!(table.column_count(), 2);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column_names().collect::<Vec<_>>(), vec!["name", "age"]);
        assert_eq!(table.column("age").map(Column::dtype), Some(DType::Int64));
        assert_eq!(table.row(1), vec![Value::from("Bob"), Value::Null]);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let result = DataTable::new(vec![
            Column::from_values("a", vec![Value::Int(1)]),
            Column::from_values("a", vec![Value::Int(2)]),
        ]);
        assert!(matches!(result, Err(FrameCheckError::InvalidTable(_))));
    }

    #[test]
    fn test_ragged_columns_rejected() {
        let result = DataTable::new(vec![
            Column::from_values("a", vec![Value::Int(1)]),
            Column::from_values("b", vec![Value::Int(1), Value::Int(2)]),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_replace_missing_column_is_lookup_error() {
        let mut table = sample();
        let err = table
            .replace_column(Column::from_values("zzz", vec![Value::Null, Value::Null]))
            .unwrap_err();
        assert!(matches!(err, FrameCheckError::ColumnNotFound { .. }));
    }

    #[test]
    fn test_empty_table() {
        let table = DataTable::default();
        assert!(table.is_empty());
        assert_eq!(table.row_count(), 0);
    }
}
