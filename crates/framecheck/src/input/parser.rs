//! Table loader: delimited text with delimiter detection, or the first sheet
//! of a workbook, with per-column type inference.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use indexmap::IndexMap;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{FrameCheckError, Result};
use crate::optimizer::{OptimizerConfig, TypeOptimizer};

use super::column::{parse_bool, Column};
use super::dtype::DType;
use super::source::{DataTable, SourceMetadata};
use super::spreadsheet::{read_first_sheet, spreadsheet_format};
use super::value::Value;

/// Delimiters to try when auto-detecting.
const DELIMITERS: &[u8] = &[b'\t', b',', b';', b'|'];

/// Parser configuration.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Delimiter to use (None = auto-detect).
    pub delimiter: Option<u8>,
    /// Maximum rows to read (None = all).
    pub max_rows: Option<usize>,
    /// Quote character.
    pub quote: u8,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            delimiter: None,
            max_rows: None,
            quote: b'"',
        }
    }
}

/// Per-load options: explicit column types and optional downcasting.
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    /// Columns to read with a fixed type instead of the inferred one.
    pub dtypes: IndexMap<String, DType>,
    /// Narrow numeric columns and categorize repetitive text after loading.
    pub downcast: bool,
}

impl ReadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the given columns with fixed types.
    pub fn with_dtypes(mut self, dtypes: IndexMap<String, DType>) -> Self {
        self.dtypes = dtypes;
        self
    }

    /// Enable or disable downcasting.
    pub fn with_downcast(mut self, downcast: bool) -> Self {
        self.downcast = downcast;
        self
    }
}

/// Parses tabular data files into typed tables.
pub struct Parser {
    config: ParserConfig,
}

impl Parser {
    /// Create a new parser with default configuration.
    pub fn new() -> Self {
        Self {
            config: ParserConfig::default(),
        }
    }

    /// Create a parser with custom configuration.
    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Parse a file with inferred column types.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<(DataTable, SourceMetadata)> {
        self.parse_file_with(path, &ReadOptions::default())
    }

    /// Parse a file, applying explicit types and downcasting from `options`.
    ///
    /// Workbooks (`.xlsx`, `.xlsm`, `.xlsb`, `.xls`, `.ods`) are read from
    /// their first sheet; anything else is read as delimited text.
    pub fn parse_file_with(
        &self,
        path: impl AsRef<Path>,
        options: &ReadOptions,
    ) -> Result<(DataTable, SourceMetadata)> {
        let path = path.as_ref();

        let mut file = File::open(path).map_err(|e| FrameCheckError::io(path, e))?;
        let size_bytes = file
            .metadata()
            .map_err(|e| FrameCheckError::io(path, e))?
            .len();

        let mut contents = Vec::new();
        file.read_to_end(&mut contents)
            .map_err(|e| FrameCheckError::io(path, e))?;

        let mut hasher = Sha256::new();
        hasher.update(&contents);
        let hash = format!("sha256:{:x}", hasher.finalize());

        let (table, format) = match spreadsheet_format(path) {
            Some(format) => {
                let (headers, cells) = read_first_sheet(path, self.config.max_rows)?;
                (build_table(&headers, cells, options)?, format)
            }
            None => {
                let delimiter = match self.config.delimiter {
                    Some(d) => d,
                    None => detect_delimiter(&contents)?,
                };
                let table = self.parse_bytes(&contents, delimiter, options)?;
                let format = match delimiter {
                    b'\t' => "tsv",
                    b',' => "csv",
                    b';' => "csv-semicolon",
                    b'|' => "psv",
                    _ => "delimited",
                };
                (table, format.to_string())
            }
        };

        debug!(
            path = %path.display(),
            rows = table.row_count(),
            columns = table.column_count(),
            format = %format,
            "Loaded table"
        );

        let metadata = SourceMetadata::new(
            path.to_path_buf(),
            hash,
            size_bytes,
            format,
            table.row_count(),
            table.column_count(),
        );

        Ok((table, metadata))
    }

    /// Parse in-memory CSV text with a known delimiter.
    pub fn parse_str(&self, text: &str, delimiter: u8, options: &ReadOptions) -> Result<DataTable> {
        self.parse_bytes(text.as_bytes(), delimiter, options)
    }

    fn parse_bytes(&self, bytes: &[u8], delimiter: u8, options: &ReadOptions) -> Result<DataTable> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .quote(self.config.quote)
            .flexible(true)
            .from_reader(bytes);

        let headers: Vec<String> = reader.headers()?.iter().map(|s| s.to_string()).collect();
        let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];

        for (row_idx, result) in reader.records().enumerate() {
            if let Some(max) = self.config.max_rows {
                if row_idx >= max {
                    break;
                }
            }

            let record = result?;
            // Short rows are padded with empty cells, long rows truncated
            for (col_idx, column) in cells.iter_mut().enumerate() {
                column.push(record.get(col_idx).unwrap_or("").to_string());
            }
        }

        build_table(&headers, cells, options)
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

/// Type raw per-column cells into a table. A header with no data rows gives
/// a table with zero rows.
fn build_table(
    headers: &[String],
    cells: Vec<Vec<String>>,
    options: &ReadOptions,
) -> Result<DataTable> {
    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(FrameCheckError::EmptyData("No columns found".to_string()));
    }

    let mut columns = Vec::with_capacity(headers.len());
    for (name, raw) in headers.iter().zip(cells) {
        let column = match options.dtypes.get(name) {
            Some(dtype) => text_column(name, &raw).cast(*dtype)?,
            None => typed_column(name, &raw),
        };
        columns.push(column);
    }

    let table = DataTable::new(columns)?;

    if options.downcast {
        let optimizer = TypeOptimizer::with_config(OptimizerConfig {
            guess_dates: false,
            ..OptimizerConfig::default()
        });
        return Ok(optimizer.optimize(&table));
    }

    Ok(table)
}

/// Check if a raw cell represents a missing/null value.
pub fn is_null_token(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("na")
        || trimmed.eq_ignore_ascii_case("n/a")
        || trimmed.eq_ignore_ascii_case("nan")
        || trimmed.eq_ignore_ascii_case("null")
        || trimmed.eq_ignore_ascii_case("none")
        || trimmed.eq_ignore_ascii_case("nil")
        || trimmed == "."
        || trimmed == "-"
}

/// Raw cells as an untyped text column.
fn text_column(name: &str, raw: &[String]) -> Column {
    let values = raw
        .iter()
        .map(|cell| {
            if is_null_token(cell) {
                Value::Null
            } else {
                Value::Text(cell.clone())
            }
        })
        .collect();
    Column::new(name, DType::Object, values)
}

/// Raw cells converted to the narrowest type every non-null cell satisfies.
fn typed_column(name: &str, raw: &[String]) -> Column {
    let non_null: Vec<&str> = raw
        .iter()
        .map(|s| s.trim())
        .filter(|s| !is_null_token(s))
        .collect();

    let convert = |parse: &dyn Fn(&str) -> Option<Value>| -> Vec<Value> {
        raw.iter()
            .map(|cell| {
                if is_null_token(cell) {
                    Value::Null
                } else {
                    parse(cell.trim()).unwrap_or(Value::Null)
                }
            })
            .collect()
    };

    if non_null.is_empty() {
        return text_column(name, raw);
    }

    if non_null.iter().all(|s| s.parse::<i64>().is_ok()) {
        let values = convert(&|s| s.parse::<i64>().ok().map(Value::Int));
        return Column::new(name, DType::Int64, values);
    }

    if non_null.iter().all(|s| s.parse::<f64>().is_ok()) {
        let values = convert(&|s| s.parse::<f64>().ok().map(Value::Float));
        return Column::new(name, DType::Float64, values);
    }

    let is_bool_word = |s: &str| s.eq_ignore_ascii_case("true") || s.eq_ignore_ascii_case("false");
    if non_null.iter().all(|s| is_bool_word(s)) {
        let values = convert(&|s| parse_bool(s).map(Value::Bool));
        return Column::new(name, DType::Bool, values);
    }

    text_column(name, raw)
}

/// Detect the delimiter by analyzing the first few lines.
fn detect_delimiter(bytes: &[u8]) -> Result<u8> {
    let reader = BufReader::new(bytes);
    let lines: Vec<String> = reader
        .lines()
        .take(10)
        .filter_map(|l| l.ok())
        .filter(|l| !l.trim().is_empty())
        .collect();

    if lines.is_empty() {
        return Err(FrameCheckError::EmptyData("No lines to analyze".to_string()));
    }

    let mut best_delimiter = b',';
    let mut best_score = 0;

    for &delim in DELIMITERS {
        let counts: Vec<usize> = lines
            .iter()
            .map(|line| count_delimiter_in_line(line, delim))
            .collect();

        let first_count = counts[0];
        if first_count == 0 {
            continue;
        }

        let consistent = counts.iter().all(|&c| c == first_count);
        let variance: f64 = if counts.len() > 1 {
            let mean = counts.iter().sum::<usize>() as f64 / counts.len() as f64;
            counts.iter().map(|&c| (c as f64 - mean).powi(2)).sum::<f64>() / counts.len() as f64
        } else {
            0.0
        };

        // Higher count with lower variance wins; tabs get a small bonus
        let score = if consistent {
            first_count * 1000 + (if delim == b'\t' { 100 } else { 0 })
        } else if variance < 1.0 {
            first_count * 100
        } else {
            first_count
        };

        if score > best_score {
            best_score = score;
            best_delimiter = delim;
        }
    }

    Ok(best_delimiter)
}

/// Count delimiter occurrences in a line, respecting quotes.
fn count_delimiter_in_line(line: &str, delimiter: u8) -> usize {
    let delim_char = delimiter as char;
    let mut count = 0;
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            c if c == delim_char && !in_quotes => count += 1,
            _ => {}
        }
    }

    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::Discoverer;
    use crate::schema::{CheckKind, Constraint};
    use rust_xlsxwriter::Workbook;
    use tempfile::TempDir;

    fn parse(text: &str) -> DataTable {
        Parser::new()
            .parse_str(text, b',', &ReadOptions::default())
            .unwrap()
    }

    /// First sheet: integer ids, fractional scores, a flag and zero-padded codes.
    fn write_workbook(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("batch.xlsx");
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (col, name) in ["id", "score", "active", "code"].into_iter().enumerate() {
            sheet.write_string(0, col as u16, name).unwrap();
        }
        let rows = [(1.0, 1.5, true, "007"), (2.0, 2.0, false, "011"), (3.0, 7.25, true, "011")];
        for (i, (id, score, active, code)) in rows.into_iter().enumerate() {
            let row = i as u32 + 1;
            sheet.write_number(row, 0, id).unwrap();
            sheet.write_number(row, 1, score).unwrap();
            sheet.write_boolean(row, 2, active).unwrap();
            sheet.write_string(row, 3, code).unwrap();
        }
        workbook.save(&path).unwrap();
        path
    }

    #[test]
    fn test_detect_delimiter_csv() {
        let data = b"a,b,c\n1,2,3\n4,5,6";
        assert_eq!(detect_delimiter(data).unwrap(), b',');
    }

    #[test]
    fn test_detect_delimiter_tsv() {
        let data = b"a\tb\tc\n1\t2\t3\n4\t5\t6";
        assert_eq!(detect_delimiter(data).unwrap(), b'\t');
    }

    #[test]
    fn test_parse_infers_types() {
        let table = parse("name,age,score,active\nAlice,30,1.5,true\nBob,NA,2,false\n");

        assert_eq!(table.column("name").map(Column::dtype), Some(DType::Object));
        assert_eq!(table.column("age").map(Column::dtype), Some(DType::Int64));
        assert_eq!(table.column("score").map(Column::dtype), Some(DType::Float64));
        assert_eq!(table.column("active").map(Column::dtype), Some(DType::Bool));
        assert!(table.column("age").unwrap().get(1).is_null());
    }

    #[test]
    fn test_short_rows_are_padded() {
        let table = parse("a,b\n1,2\n3\n");
        assert_eq!(table.row_count(), 2);
        assert!(table.column("b").unwrap().get(1).is_null());
    }

    #[test]
    fn test_header_only_gives_empty_table() {
        let table = parse("a,b\n");
        assert_eq!(table.row_count(), 0);
        assert_eq!(table.column_names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(table.column("a").map(Column::dtype), Some(DType::Object));
    }

    #[test]
    fn test_header_only_discovers_every_column() {
        let table = parse("zeta,alpha,mid\n");
        let constraints = Discoverer::new().discover(&table);

        assert_eq!(
            constraints.column_names().collect::<Vec<_>>(),
            vec!["zeta", "alpha", "mid"]
        );
        let record = constraints.get("alpha").unwrap();
        assert_eq!(record.get(CheckKind::DataType), Some(&Constraint::DataType("object".into())));
        assert_eq!(record.get(CheckKind::Nullable), Some(&Constraint::Nullable(false)));
        assert_eq!(record.get(CheckKind::MaxLength), Some(&Constraint::MaxLength(0)));
        assert_eq!(record.get(CheckKind::ValueRange), Some(&Constraint::ValueRange(Vec::new())));
    }

    #[test]
    fn test_explicit_dtypes_keep_leading_zeros() {
        let mut dtypes = IndexMap::new();
        dtypes.insert("code".to_string(), DType::Object);
        let options = ReadOptions::new().with_dtypes(dtypes);

        let table = Parser::new()
            .parse_str("code\n001\n002\n", b',', &options)
            .unwrap();
        assert_eq!(table.column("code").unwrap().get(0), &Value::from("001"));
    }

    #[test]
    fn test_explicit_datetime_accepts_epochs_and_strings() {
        let mut dtypes = IndexMap::new();
        dtypes.insert("when".to_string(), DType::DateTime);
        let options = ReadOptions::new().with_dtypes(dtypes);

        let table = Parser::new()
            .parse_str("when\n1678838400\n2023-03-15\n", b',', &options)
            .unwrap();
        let column = table.column("when").unwrap();
        assert_eq!(column.dtype(), DType::DateTime);
        assert_eq!(column.get(0), column.get(1));
    }

    #[test]
    fn test_explicit_dtype_failure_is_coercion_error() {
        let mut dtypes = IndexMap::new();
        dtypes.insert("n".to_string(), DType::Int64);
        let options = ReadOptions::new().with_dtypes(dtypes);

        let result = Parser::new().parse_str("n\n1\nabc\n", b',', &options);
        assert!(matches!(result, Err(FrameCheckError::TypeCoercion { .. })));
    }

    #[test]
    fn test_downcast_option() {
        let options = ReadOptions::new().with_downcast(true);
        let table = Parser::new()
            .parse_str("n,c\n1,x\n2,x\n", b',', &options)
            .unwrap();
        assert_eq!(table.column("n").map(Column::dtype), Some(DType::Int8));
        assert_eq!(table.column("c").map(Column::dtype), Some(DType::Category));
    }

    #[test]
    fn test_workbook_infers_types() {
        let dir = TempDir::new().unwrap();
        let path = write_workbook(&dir);

        let (table, metadata) = Parser::new().parse_file(&path).unwrap();
        assert_eq!(metadata.format, "xlsx");
        assert_eq!(metadata.row_count, 3);
        assert!(metadata.hash.starts_with("sha256:"));

        assert_eq!(
            table.column_names().collect::<Vec<_>>(),
            vec!["id", "score", "active", "code"]
        );
        assert_eq!(table.column("id").map(Column::dtype), Some(DType::Int64));
        assert_eq!(table.column("id").unwrap().get(2), &Value::Int(3));
        assert_eq!(table.column("score").map(Column::dtype), Some(DType::Float64));
        assert_eq!(table.column("active").map(Column::dtype), Some(DType::Bool));
        assert_eq!(table.column("code").map(Column::dtype), Some(DType::Int64));
    }

    #[test]
    fn test_workbook_honours_read_options() {
        let dir = TempDir::new().unwrap();
        let path = write_workbook(&dir);

        let mut dtypes = IndexMap::new();
        dtypes.insert("code".to_string(), DType::Object);
        let options = ReadOptions::new().with_dtypes(dtypes).with_downcast(true);

        let (table, _) = Parser::new().parse_file_with(&path, &options).unwrap();
        let code = table.column("code").unwrap();
        assert_eq!(code.get(0), &Value::from("007"));
        assert_eq!(code.dtype(), DType::Category);
        assert_eq!(table.column("id").map(Column::dtype), Some(DType::Int8));
        assert_eq!(table.column("score").map(Column::dtype), Some(DType::Float32));
    }

    #[test]
    fn test_is_null_token() {
        assert!(is_null_token(""));
        assert!(is_null_token("NA"));
        assert!(is_null_token("NaN"));
        assert!(is_null_token("null"));
        assert!(is_null_token("."));
        assert!(!is_null_token("value"));
        assert!(!is_null_token("0"));
    }
}
