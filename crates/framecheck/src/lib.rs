//! FrameCheck: constraint discovery and verification for tabular datasets.
//!
//! FrameCheck learns what a dataset looks like from a reference table (types,
//! nullability, uniqueness, lengths, allowed values, numeric and date bounds),
//! stores those constraints, and later checks other tables against them.
//!
//! # Workflow
//!
//! - **Discover**: derive a [`ConstraintSet`] from a reference table
//! - **Persist**: save and reload it as JSON or flat CSV, editing single
//!   columns in between
//! - **Verify**: run every constraint against a target table and get a
//!   [`Summary`] of break counts plus an [`EvidenceTable`] of failing rows
//! - **Custom rules**: flag anomalous rows with named SQL-style predicates
//!
//! # Example
//!
//! ```no_run
//! use framecheck::FrameCheck;
//!
//! let framecheck = FrameCheck::new();
//! let constraints = framecheck.discover("reference.csv").unwrap();
//! let result = framecheck.verify("new_batch.csv", &constraints).unwrap();
//!
//! println!("Breaks: {}", result.summary.total_breaks());
//! println!("Evidence rows: {}", result.evidence.len());
//! ```

pub mod custom;
pub mod error;
pub mod inference;
pub mod input;
pub mod optimizer;
pub mod schema;
pub mod validation;

mod framecheck;

pub use crate::framecheck::{FrameCheck, FrameCheckConfig};
pub use custom::{CustomRule, CustomRuleList, CustomVerification, CustomVerifier, RuleSummary};
pub use error::{FrameCheckError, Result};
pub use inference::Discoverer;
pub use input::{
    Column, ColumnKind, DType, DataTable, Number, Parser, ParserConfig, ReadOptions, SourceMetadata,
    Value,
};
pub use optimizer::{OptimizerConfig, TypeOptimizer};
pub use schema::{CheckKind, ColumnConstraints, Constraint, ConstraintSet};
pub use validation::{
    CheckOutcome, EvidenceTable, Summary, Verification, Verifier, VerifyOptions,
};
