//! CLI command implementations.

pub mod custom;
pub mod discover;
pub mod modify;
pub mod rules;
pub mod verify;

use std::path::{Path, PathBuf};

/// `data.csv` -> `data.constraints.json`
pub(crate) fn default_constraints_path(data: &Path) -> PathBuf {
    let stem = data.file_stem().unwrap_or_default().to_string_lossy();
    data.with_file_name(format!("{}.constraints.json", stem))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_constraints_path() {
        assert_eq!(
            default_constraints_path(Path::new("dir/loans.csv")),
            PathBuf::from("dir/loans.constraints.json")
        );
    }
}
