//! Modify command - change one column's constraints in a stored set.

use std::path::PathBuf;

use colored::Colorize;
use framecheck::{CheckKind, ColumnConstraints, Constraint, ConstraintSet};

/// Parse `kind=value` overrides into a patch.
pub(crate) fn parse_overrides(items: &[String]) -> Result<ColumnConstraints, Box<dyn std::error::Error>> {
    let mut patch = ColumnConstraints::new();
    for item in items {
        let (kind, value) = item
            .split_once('=')
            .ok_or_else(|| format!("Expected KIND=VALUE, got '{}'", item))?;
        let kind: CheckKind = kind.trim().parse()?;
        patch.insert(Constraint::parse(kind, value.trim())?);
    }
    Ok(patch)
}

pub fn run(
    constraints: PathBuf,
    column: String,
    set: Vec<String>,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut stored = ConstraintSet::load(&constraints)?;
    let patch = parse_overrides(&set)?;

    stored.modify(&column, &patch)?;

    let output_path = output.unwrap_or(constraints);
    stored.save(&output_path)?;

    for constraint in patch.iter() {
        println!(
            "{} {}.{} = {}",
            "Set".green().bold(),
            column.cyan(),
            constraint.kind(),
            constraint.to_cell()
        );
    }
    println!("{} {}", "Saved to".green().bold(), output_path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_overrides() {
        let patch = parse_overrides(&["max_value=100".into(), "nullable = true".into()]).unwrap();
        assert_eq!(patch.len(), 2);
        assert!(patch.contains(CheckKind::MaxValue));
        assert_eq!(patch.get(CheckKind::Nullable), Some(&Constraint::Nullable(true)));
    }

    #[test]
    fn test_run_updates_constraints_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("constraints.json");

        let mut stored = ConstraintSet::new();
        stored.insert(
            "age",
            ColumnConstraints::new()
                .with(Constraint::DataType("int64".into()))
                .with(Constraint::Nullable(false)),
        );
        stored.save(&path).unwrap();

        run(path.clone(), "age".into(), vec!["nullable=True".into()], None).unwrap();

        let reloaded = ConstraintSet::load(&path).unwrap();
        assert_eq!(
            reloaded.get("age").and_then(|r| r.get(CheckKind::Nullable)),
            Some(&Constraint::Nullable(true))
        );
        assert!(run(path, "height".into(), vec!["nullable=True".into()], None).is_err());
    }

    #[test]
    fn test_parse_overrides_rejects_missing_value() {
        assert!(parse_overrides(&["max_value".into()]).is_err());
        assert!(parse_overrides(&["colour=red".into()]).is_err());
    }
}
