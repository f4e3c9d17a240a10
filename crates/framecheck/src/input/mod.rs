//! Input parsing and the in-memory table model.

mod column;
mod dtype;
mod parser;
mod source;
mod spreadsheet;
mod value;

pub use column::{classify, Column, ColumnKind};
pub(crate) use column::parse_bool;
pub use dtype::DType;
pub use parser::{is_null_token, Parser, ParserConfig, ReadOptions};
pub use source::{DataTable, SourceMetadata};
pub use value::{datetime_from_epoch, looks_like_epoch, parse_datetime, Number, Value, ValueKey};
pub(crate) use value::format_float;
