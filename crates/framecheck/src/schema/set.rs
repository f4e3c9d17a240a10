//! The per-table constraint set.

use indexmap::IndexMap;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{FrameCheckError, Result};
use crate::inference::Discoverer;
use crate::input::{DType, DataTable};

use super::check::CheckKind;
use super::constraint::ColumnConstraints;

/// Constraints for every column of a table, in table column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstraintSet {
    columns: IndexMap<String, ColumnConstraints>,
}

impl ConstraintSet {
    /// Create an empty constraint set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Discover constraints from a reference table.
    ///
    /// A table with no columns yields an empty set.
    pub fn generate(table: &DataTable) -> Self {
        Discoverer::new().discover(table)
    }

    /// Add or replace the record for a column.
    pub fn insert(&mut self, column: impl Into<String>, record: ColumnConstraints) {
        self.columns.insert(column.into(), record);
    }

    /// Merge `patch` into the record of an existing column.
    ///
    /// Fails with a lookup error if the column is not part of the set.
    pub fn modify(&mut self, column: &str, patch: &ColumnConstraints) -> Result<()> {
        let record = self
            .columns
            .get_mut(column)
            .ok_or_else(|| FrameCheckError::column_not_found(column))?;
        record.merge(patch);
        Ok(())
    }

    pub fn get(&self, column: &str) -> Option<&ColumnConstraints> {
        self.columns.get(column)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ColumnConstraints)> + '_ {
        self.columns.iter().map(|(name, record)| (name.as_str(), record))
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.columns.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Declared type of every column that has one.
    ///
    /// Fails if a declared type name is not recognized.
    pub fn dtypes(&self) -> Result<IndexMap<String, DType>> {
        let mut dtypes = IndexMap::new();
        for (name, record) in &self.columns {
            if let Some(type_name) = record.data_type() {
                dtypes.insert(name.clone(), type_name.parse::<DType>()?);
            }
        }
        Ok(dtypes)
    }

    /// Check kinds used anywhere in the set, in first-appearance order.
    pub fn kinds(&self) -> Vec<CheckKind> {
        let mut kinds: Vec<CheckKind> = Vec::new();
        for record in self.columns.values() {
            for kind in record.kinds() {
                if !kinds.contains(&kind) {
                    kinds.push(kind);
                }
            }
        }
        kinds
    }

    /// Every record must carry at least a type and a nullability flag.
    pub(crate) fn validate(&self) -> std::result::Result<(), String> {
        for (name, record) in &self.columns {
            for required in [CheckKind::DataType, CheckKind::Nullable] {
                if !record.contains(required) {
                    return Err(format!("column '{}' is missing '{}'", name, required));
                }
            }
        }
        Ok(())
    }
}

impl Serialize for ConstraintSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.columns.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ConstraintSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let columns = IndexMap::<String, ColumnConstraints>::deserialize(deserializer)?;
        let set = ConstraintSet { columns };
        set.validate().map_err(D::Error::custom)?;
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Value;
    use crate::schema::Constraint;

    fn sample() -> ConstraintSet {
        let table = DataTable::from_rows(
            &["id", "name"],
            vec![
                vec![Value::Int(1), Value::from("a")],
                vec![Value::Int(2), Value::Null],
            ],
        )
        .unwrap();
        ConstraintSet::generate(&table)
    }

    #[test]
    fn test_modify_unknown_column_is_lookup_error() {
        let mut set = sample();
        let patch = ColumnConstraints::new().with(Constraint::Nullable(true));
        let err = set.modify("nonexistent_column", &patch).unwrap_err();
        assert!(matches!(err, FrameCheckError::ColumnNotFound { .. }));
        assert!(set.get("nonexistent_column").is_none());
    }

    #[test]
    fn test_modify_overrides_value() {
        let mut set = sample();
        let patch = ColumnConstraints::new().with(Constraint::Nullable(true));
        set.modify("id", &patch).unwrap();
        assert_eq!(
            set.get("id").and_then(|r| r.get(CheckKind::Nullable)),
            Some(&Constraint::Nullable(true))
        );
    }

    #[test]
    fn test_dtypes() {
        let dtypes = sample().dtypes().unwrap();
        assert_eq!(dtypes.get("id"), Some(&DType::Int64));
        assert_eq!(dtypes.get("name"), Some(&DType::Object));

        let mut set = ConstraintSet::new();
        set.insert(
            "x",
            ColumnConstraints::new().with(Constraint::DataType("decimal".into())),
        );
        assert!(set.dtypes().is_err());
    }

    #[test]
    fn test_deserialize_requires_generic_kinds() {
        let json = r#"{"age": {"data_type": "int64"}}"#;
        assert!(serde_json::from_str::<ConstraintSet>(json).is_err());
    }
}
