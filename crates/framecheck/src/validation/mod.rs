//! Verification engine: runs each persisted constraint against a table and
//! collects break counts and evidence rows.

mod checks;
mod result;
mod verifier;

pub use checks::{run_check, CheckResult};
pub use result::{CheckOutcome, EvidenceRow, EvidenceTable, Summary, Verification, VALIDATION_HEADER};
pub use verifier::{enforce_dtypes, Verifier, VerifyOptions};
