//! Verification of a table against a constraint set.

use std::borrow::Cow;

use tracing::{debug, info};

use crate::error::Result;
use crate::input::DataTable;
use crate::schema::ConstraintSet;

use super::checks::run_check;
use super::result::{EvidenceTable, Summary, Verification};

/// Verification options.
#[derive(Debug, Clone, Default)]
pub struct VerifyOptions {
    /// Cast each column to its declared `data_type` before checking.
    pub enforce_dtypes: bool,
}

/// Checks tables against constraint sets.
#[derive(Debug, Clone, Default)]
pub struct Verifier {
    options: VerifyOptions,
}

impl Verifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: VerifyOptions) -> Self {
        Self { options }
    }

    /// Run every constraint of `constraints` against `table`.
    ///
    /// Fails with a lookup error if a constrained column is missing from the
    /// table, and with a type-coercion error if enforcement cannot cast a
    /// column. Either failure aborts the whole verification. `table` itself is
    /// never modified.
    pub fn verify(&self, table: &DataTable, constraints: &ConstraintSet) -> Result<Verification> {
        for column in constraints.column_names() {
            table.require_column(column)?;
        }

        let table = if self.options.enforce_dtypes {
            Cow::Owned(enforce_dtypes(table, constraints)?)
        } else {
            Cow::Borrowed(table)
        };

        let mut summary = Summary::new();
        let mut evidence = EvidenceTable::new(&table);

        for (name, record) in constraints.iter() {
            let column = table.require_column(name)?;

            for constraint in record.iter() {
                let kind = constraint.kind();
                let result = run_check(constraint, column);

                debug!(column = %name, check = %kind, outcome = %result.outcome, "Ran check");

                summary.record(name, kind, result.outcome);
                if !result.rows.is_empty() {
                    evidence.extend(&table, &result.rows, &format!("{}: {}", kind, name));
                }
            }
        }

        info!(
            columns = summary.len(),
            breaks = summary.total_breaks(),
            evidence_rows = evidence.len(),
            "Verification complete"
        );

        Ok(Verification { summary, evidence })
    }
}

/// Copy of `table` with every constrained column cast to its declared type.
pub fn enforce_dtypes(table: &DataTable, constraints: &ConstraintSet) -> Result<DataTable> {
    let mut enforced = table.clone();

    for (name, dtype) in constraints.dtypes()? {
        let column = enforced.require_column(&name)?;
        if column.dtype() == dtype {
            continue;
        }
        debug!(column = %name, from = %column.dtype(), to = %dtype, "Enforcing declared type");
        let cast = column.cast(dtype)?;
        enforced.replace_column(cast)?;
    }

    Ok(enforced)
}
