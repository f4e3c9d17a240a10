//! Verification results: break-count summary and evidence rows.

use std::fmt;
use std::io::Write;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{FrameCheckError, Result};
use crate::input::{DataTable, Value};
use crate::schema::{create_file, CheckKind};

/// Header of the label column in evidence tables.
pub const VALIDATION_HEADER: &str = "Validation";

/// Result of running one check against one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CheckOutcome {
    /// Number of rows that violated the constraint.
    Breaks(usize),
    /// The check does not apply to this column's kind.
    NotApplicable,
}

impl CheckOutcome {
    /// Break count, if the check applied.
    pub fn breaks(&self) -> Option<usize> {
        match self {
            CheckOutcome::Breaks(n) => Some(*n),
            CheckOutcome::NotApplicable => None,
        }
    }

    pub fn is_applicable(&self) -> bool {
        matches!(self, CheckOutcome::Breaks(_))
    }
}

impl fmt::Display for CheckOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckOutcome::Breaks(n) => write!(f, "{}", n),
            CheckOutcome::NotApplicable => f.write_str("N/A"),
        }
    }
}

/// Break counts indexed by column and check kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Summary {
    columns: IndexMap<String, IndexMap<CheckKind, CheckOutcome>>,
}

impl Summary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of a check.
    pub fn record(&mut self, column: &str, kind: CheckKind, outcome: CheckOutcome) {
        self.columns
            .entry(column.to_string())
            .or_default()
            .insert(kind, outcome);
    }

    /// Outcome of a single check.
    pub fn get(&self, column: &str, kind: CheckKind) -> Option<CheckOutcome> {
        self.columns.get(column)?.get(&kind).copied()
    }

    /// All outcomes for one column.
    pub fn column(&self, column: &str) -> Option<&IndexMap<CheckKind, CheckOutcome>> {
        self.columns.get(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &IndexMap<CheckKind, CheckOutcome>)> + '_ {
        self.columns.iter().map(|(name, checks)| (name.as_str(), checks))
    }

    /// Check kinds present anywhere, in first-appearance order.
    pub fn kinds(&self) -> Vec<CheckKind> {
        let mut kinds: Vec<CheckKind> = Vec::new();
        for checks in self.columns.values() {
            for kind in checks.keys() {
                if !kinds.contains(kind) {
                    kinds.push(*kind);
                }
            }
        }
        kinds
    }

    /// Sum of every applicable break count.
    pub fn total_breaks(&self) -> usize {
        self.columns
            .values()
            .flat_map(|checks| checks.values())
            .filter_map(CheckOutcome::breaks)
            .sum()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Write one row per column and one column per check kind; inapplicable
    /// and absent checks are empty cells.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let kinds = self.kinds();
        let mut csv_writer = csv::Writer::from_writer(writer);

        let mut header = vec!["column".to_string()];
        header.extend(kinds.iter().map(|kind| kind.name().to_string()));
        csv_writer.write_record(&header)?;

        for (name, checks) in &self.columns {
            let mut row = vec![name.clone()];
            for kind in &kinds {
                let cell = checks
                    .get(kind)
                    .and_then(CheckOutcome::breaks)
                    .map(|n| n.to_string())
                    .unwrap_or_default();
                row.push(cell);
            }
            csv_writer.write_record(&row)?;
        }

        csv_writer.flush().map_err(csv::Error::from)?;
        Ok(())
    }

    /// Save as CSV.
    pub fn save_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut writer = create_file(path)?;
        self.write_csv(&mut writer)?;
        writer.flush().map_err(|e| FrameCheckError::io(path, e))
    }
}

/// A failing row, tagged with the check it failed.
#[derive(Debug, Clone, PartialEq)]
pub struct EvidenceRow {
    /// Position of the row in the verified table.
    pub row: usize,
    /// The row's values, in table column order.
    pub values: Vec<Value>,
    /// `"<check>: <column>"` or `"<rule>: <query>"`.
    pub label: String,
}

/// Concatenated failing rows of every check.
///
/// A row appears once per check it failed, so the table can be longer than
/// the verified table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvidenceTable {
    columns: Vec<String>,
    rows: Vec<EvidenceRow>,
}

impl EvidenceTable {
    /// Create an empty evidence table with the verified table's columns.
    pub fn new(table: &DataTable) -> Self {
        Self {
            columns: table.column_names().map(str::to_string).collect(),
            rows: Vec::new(),
        }
    }

    /// Append the given rows of `table` under one label.
    pub fn extend(&mut self, table: &DataTable, rows: &[usize], label: &str) {
        self.rows.extend(rows.iter().map(|&row| EvidenceRow {
            row,
            values: table.row(row),
            label: label.to_string(),
        }));
    }

    /// Column names, without the label column.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[EvidenceRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct labels, in first-appearance order.
    pub fn labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = Vec::new();
        for row in &self.rows {
            if !labels.contains(&row.label.as_str()) {
                labels.push(&row.label);
            }
        }
        labels
    }

    /// Rows carrying exactly this label.
    pub fn for_label<'a>(&'a self, label: &'a str) -> impl Iterator<Item = &'a EvidenceRow> + 'a {
        self.rows.iter().filter(move |row| row.label == label)
    }

    /// Every row that failed a check on the named column.
    pub fn for_column<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a EvidenceRow> + 'a {
        self.rows.iter().filter(move |row| {
            row.label
                .split_once(": ")
                .is_some_and(|(_, target)| target == column)
        })
    }

    /// Write the rows plus a trailing `Validation` column.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        let mut header = self.columns.clone();
        header.push(VALIDATION_HEADER.to_string());
        csv_writer.write_record(&header)?;

        for row in &self.rows {
            let mut record: Vec<String> = row.values.iter().map(|v| v.to_string()).collect();
            record.push(row.label.clone());
            csv_writer.write_record(&record)?;
        }

        csv_writer.flush().map_err(csv::Error::from)?;
        Ok(())
    }

    /// Save as CSV.
    pub fn save_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut writer = create_file(path)?;
        self.write_csv(&mut writer)?;
        writer.flush().map_err(|e| FrameCheckError::io(path, e))
    }
}

/// Summary and evidence of a constraint verification.
#[derive(Debug, Clone, PartialEq)]
pub struct Verification {
    pub summary: Summary,
    pub evidence: EvidenceTable,
}

impl Verification {
    /// Returns true if no check found a break.
    pub fn passed(&self) -> bool {
        self.summary.total_breaks() == 0
    }
}
