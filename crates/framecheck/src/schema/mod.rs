//! Constraint model: check kinds, typed constraints, per-table constraint
//! sets and their persisted forms.

mod check;
mod constraint;
mod literal;
mod persistence;
mod set;

pub use check::CheckKind;
pub use constraint::{ColumnConstraints, Constraint, DATE_FORMAT};
pub use literal::{parse_set, render_set};
pub use persistence::{FileFormat, INDEX_HEADER};
pub(crate) use persistence::{create_file, open_file};
pub use set::ConstraintSet;
