//! Evaluation of custom rules against a table.

use serde::Serialize;
use tracing::{debug, info};

use crate::error::Result;
use crate::input::DataTable;
use crate::validation::EvidenceTable;

use super::expression::RowPredicate;
use super::rule::CustomRuleList;

/// Break count of one rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleSummary {
    pub name: String,
    /// The rule's query text.
    pub rule: String,
    pub count: usize,
}

/// Summary and evidence of a custom-rule run.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomVerification {
    pub summary: Vec<RuleSummary>,
    pub evidence: EvidenceTable,
}

impl CustomVerification {
    /// Sum of every rule's break count.
    pub fn total_breaks(&self) -> usize {
        self.summary.iter().map(|s| s.count).sum()
    }
}

/// Runs custom rules. Rows matching a rule's query are breaks.
#[derive(Debug, Clone, Default)]
pub struct CustomVerifier;

impl CustomVerifier {
    pub fn new() -> Self {
        Self
    }

    /// Evaluate every rule, in list order.
    ///
    /// Every query is compiled before any is evaluated, so a malformed query
    /// or an unknown column aborts the run without partial results.
    pub fn verify(&self, table: &DataTable, rules: &CustomRuleList) -> Result<CustomVerification> {
        let compiled = rules
            .iter()
            .map(|rule| Ok((rule, RowPredicate::compile(&rule.name, &rule.query, table)?)))
            .collect::<Result<Vec<_>>>()?;

        let mut summary = Vec::with_capacity(compiled.len());
        let mut evidence = EvidenceTable::new(table);

        for (rule, predicate) in compiled {
            let rows = predicate.matching_rows(table);
            debug!(rule = %rule.name, breaks = rows.len(), "Evaluated custom rule");

            evidence.extend(table, &rows, &rule.label());
            summary.push(RuleSummary {
                name: rule.name.clone(),
                rule: rule.query.clone(),
                count: rows.len(),
            });
        }

        let verification = CustomVerification { summary, evidence };
        info!(
            rules = verification.summary.len(),
            breaks = verification.total_breaks(),
            "Custom rule verification complete"
        );
        Ok(verification)
    }
}
