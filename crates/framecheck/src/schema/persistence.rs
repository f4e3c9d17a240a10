//! Persistence for constraint sets - JSON and flat CSV files.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use tracing::debug;

use crate::error::{FrameCheckError, Result};

use super::check::CheckKind;
use super::constraint::{ColumnConstraints, Constraint};
use super::set::ConstraintSet;

/// Header of the column-name column in flat constraint files.
pub const INDEX_HEADER: &str = "attribute";

/// Persisted file formats, selected by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Csv,
}

impl FileFormat {
    /// Pick the format from a file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "json" => Ok(FileFormat::Json),
            "csv" => Ok(FileFormat::Csv),
            _ => Err(FrameCheckError::UnsupportedFormat(format!(
                "'{}' (expected .json or .csv)",
                path.display()
            ))),
        }
    }
}

/// Create a file for writing, creating parent directories as needed.
pub(crate) fn create_file(path: &Path) -> Result<BufWriter<File>> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| FrameCheckError::io(parent, e))?;
        }
    }
    let file = File::create(path).map_err(|e| FrameCheckError::io(path, e))?;
    Ok(BufWriter::new(file))
}

pub(crate) fn open_file(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).map_err(|e| FrameCheckError::io(path, e))?;
    Ok(BufReader::new(file))
}

impl ConstraintSet {
    /// Save the constraint set; the format follows the file extension.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use framecheck::ConstraintSet;
    /// # fn example(constraints: &ConstraintSet) -> framecheck::Result<()> {
    /// constraints.save("constraints.json")?;
    /// constraints.save("constraints.csv")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let format = FileFormat::from_path(path)?;

        let mut writer = create_file(path)?;
        match format {
            FileFormat::Json => {
                serde_json::to_writer_pretty(&mut writer, self)?;
            }
            FileFormat::Csv => self.write_csv(&mut writer)?,
        }
        writer.flush().map_err(|e| FrameCheckError::io(path, e))?;

        debug!(path = %path.display(), columns = self.len(), "Saved constraints");
        Ok(())
    }

    /// Load a constraint set saved with [`save`](Self::save).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let format = FileFormat::from_path(path)?;
        let reader = open_file(path)?;

        let set = match format {
            FileFormat::Json => serde_json::from_reader(reader)
                .map_err(|e| FrameCheckError::parse(path, e.to_string()))?,
            FileFormat::Csv => Self::read_csv(reader, path)?,
        };

        debug!(path = %path.display(), columns = set.len(), "Loaded constraints");
        Ok(set)
    }

    fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let kinds = self.kinds();
        let mut csv_writer = csv::Writer::from_writer(writer);

        let mut header = vec![INDEX_HEADER.to_string()];
        header.extend(kinds.iter().map(|kind| kind.name().to_string()));
        csv_writer.write_record(&header)?;

        for (name, record) in self.iter() {
            let mut row = Vec::with_capacity(kinds.len() + 1);
            row.push(name.to_string());
            for kind in &kinds {
                row.push(record.get(*kind).map(Constraint::to_cell).unwrap_or_default());
            }
            csv_writer.write_record(&row)?;
        }

        csv_writer.flush().map_err(csv::Error::from)?;
        Ok(())
    }

    fn read_csv<R: std::io::Read>(reader: R, path: &Path) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        if headers.is_empty() {
            return Err(FrameCheckError::parse(path, "missing header row"));
        }

        // The first column holds column names whatever its header says
        let kinds: Vec<CheckKind> = headers
            .iter()
            .skip(1)
            .map(|name| {
                name.parse::<CheckKind>()
                    .map_err(|_| FrameCheckError::parse(path, format!("unknown constraint '{}'", name)))
            })
            .collect::<Result<_>>()?;

        let mut set = ConstraintSet::new();
        for record in csv_reader.records() {
            let record = record?;
            let Some(column) = record.get(0) else {
                continue;
            };

            let mut constraints = ColumnConstraints::new();
            for (kind, cell) in kinds.iter().zip(record.iter().skip(1)) {
                if cell.trim().is_empty() {
                    continue;
                }
                let constraint = Constraint::parse(*kind, cell).map_err(|e| {
                    FrameCheckError::parse(path, format!("column '{}', {}: {}", column, kind, e))
                })?;
                constraints.insert(constraint);
            }
            set.insert(column, constraints);
        }

        set.validate()
            .map_err(|message| FrameCheckError::parse(path, message))?;
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{DataTable, Number, Value};
    use tempfile::TempDir;

    fn sample() -> ConstraintSet {
        let table = DataTable::from_rows(
            &["age", "city"],
            vec![
                vec![Value::Int(25), Value::from("Lima")],
                vec![Value::Int(40), Value::Null],
                vec![Value::Int(33), Value::from("O'Hare")],
            ],
        )
        .unwrap();
        let mut set = ConstraintSet::generate(&table);
        let patch = ColumnConstraints::new().with(Constraint::MaxValue(None));
        set.modify("age", &patch).unwrap();
        set
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(FileFormat::from_path(Path::new("a.JSON")).unwrap(), FileFormat::Json);
        assert_eq!(FileFormat::from_path(Path::new("a.csv")).unwrap(), FileFormat::Csv);
        assert!(matches!(
            FileFormat::from_path(Path::new("a.xlsx")),
            Err(FrameCheckError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_json_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("constraints.json");
        let set = sample();

        set.save(&path).unwrap();
        assert_eq!(ConstraintSet::load(&path).unwrap(), set);
    }

    #[test]
    fn test_csv_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("constraints.csv");
        let set = sample();

        set.save(&path).unwrap();
        let loaded = ConstraintSet::load(&path).unwrap();
        assert_eq!(loaded, set);

        // Absent kinds stay absent
        assert!(loaded.get("age").unwrap().get(CheckKind::ValueRange).is_none());
        assert_eq!(
            loaded.get("age").unwrap().get(CheckKind::MinValue),
            Some(&Constraint::MinValue(Some(Number::Int(25))))
        );
    }

    #[test]
    fn test_csv_keeps_large_float_bounds_as_floats() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("constraints.csv");

        let mut set = ConstraintSet::new();
        set.insert(
            "balance",
            ColumnConstraints::new()
                .with(Constraint::DataType("float64".into()))
                .with(Constraint::Nullable(false))
                .with(Constraint::MinValue(Some(Number::Float(-2.5e20))))
                .with(Constraint::MaxValue(Some(Number::Float(1e16)))),
        );

        set.save(&path).unwrap();
        assert!(fs::read_to_string(&path).unwrap().contains("1e+16"));
        assert_eq!(ConstraintSet::load(&path).unwrap(), set);
    }

    #[test]
    fn test_csv_layout() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("constraints.csv");
        sample().save(&path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("attribute,data_type,nullable,min_value,max_value,unique,min_length,max_length,value_range")
        );
        assert_eq!(lines.next(), Some("age,int64,False,25,NaN,,,,"));
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("constraints.yaml");
        assert!(matches!(
            sample().save(&path),
            Err(FrameCheckError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            ConstraintSet::load(&path),
            Err(FrameCheckError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_malformed_files_are_parse_errors() {
        let dir = TempDir::new().unwrap();

        let json = dir.path().join("bad.json");
        fs::write(&json, "{ not json").unwrap();
        assert!(matches!(ConstraintSet::load(&json), Err(FrameCheckError::Parse { .. })));

        let csv = dir.path().join("bad.csv");
        fs::write(&csv, "attribute,data_type,nullable,value_range\ncity,object,True,{'A'\n").unwrap();
        assert!(matches!(ConstraintSet::load(&csv), Err(FrameCheckError::Parse { .. })));
    }
}
