//! Spreadsheet reading: the first worksheet of an Excel or ODF workbook as
//! header names plus raw per-column cells.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use tracing::debug;

use crate::error::{FrameCheckError, Result};

use super::value::Value;

/// Extensions read as workbooks rather than delimited text.
const EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Workbook format of `path` (its lowercased extension), if it is one.
pub(crate) fn spreadsheet_format(path: &Path) -> Option<String> {
    let extension = path.extension()?.to_string_lossy().to_ascii_lowercase();
    EXTENSIONS.contains(&extension.as_str()).then_some(extension)
}

/// Read the first worksheet. The first row holds the column names.
pub(crate) fn read_first_sheet(
    path: &Path,
    max_rows: Option<usize>,
) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| FrameCheckError::parse(path, e.to_string()))?;

    let Some(sheet) = workbook.sheet_names().first().cloned() else {
        return Err(FrameCheckError::EmptyData("No worksheets found".to_string()));
    };
    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| FrameCheckError::parse(path, e.to_string()))?;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .map(|row| row.iter().map(cell_text).collect())
        .unwrap_or_default();

    let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for row in rows.take(max_rows.unwrap_or(usize::MAX)) {
        for (col_idx, column) in cells.iter_mut().enumerate() {
            column.push(row.get(col_idx).map(cell_text).unwrap_or_default());
        }
    }

    debug!(
        path = %path.display(),
        sheet = %sheet,
        columns = headers.len(),
        "Read worksheet"
    );
    Ok((headers, cells))
}

/// Raw text of a cell, in the form the delimited loader would have seen.
///
/// Whole numbers lose their fraction (`3.0` reads as `3`) so integer columns
/// stored as floats still infer as `int64`. Empty and error cells are blank.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Int(i) => i.to_string(),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|dt| Value::DateTime(dt).render())
            .unwrap_or_default(),
        _ => String::new(),
    }
}
