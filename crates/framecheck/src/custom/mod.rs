//! Custom rules: named row predicates that flag anomalous rows, independent
//! of the per-column constraint model.

mod expression;
mod rule;
mod verifier;

pub use expression::{parse_query, RowPredicate};
pub use rule::{CustomRule, CustomRuleList};
pub use verifier::{CustomVerification, CustomVerifier, RuleSummary};
