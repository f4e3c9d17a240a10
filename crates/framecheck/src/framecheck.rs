//! Main FrameCheck struct and public API.

use std::path::Path;

use tracing::info;

use crate::custom::{CustomRuleList, CustomVerification, CustomVerifier};
use crate::error::Result;
use crate::inference::Discoverer;
use crate::input::{DataTable, Parser, ParserConfig, ReadOptions, SourceMetadata};
use crate::optimizer::{OptimizerConfig, TypeOptimizer};
use crate::schema::ConstraintSet;
use crate::validation::{Verification, Verifier, VerifyOptions};

/// Configuration for FrameCheck.
#[derive(Debug, Clone)]
pub struct FrameCheckConfig {
    /// Parser configuration.
    pub parser: ParserConfig,
    /// Type optimizer configuration.
    pub optimizer: OptimizerConfig,
    /// Verification options.
    pub verify: VerifyOptions,
    /// Run the type optimizer on every loaded table.
    pub optimize: bool,
}

impl Default for FrameCheckConfig {
    fn default() -> Self {
        Self {
            parser: ParserConfig::default(),
            optimizer: OptimizerConfig::default(),
            verify: VerifyOptions::default(),
            optimize: true,
        }
    }
}

/// Loads tables, discovers their constraints and verifies tables against
/// stored constraints and custom rules.
pub struct FrameCheck {
    config: FrameCheckConfig,
    parser: Parser,
    optimizer: TypeOptimizer,
    discoverer: Discoverer,
    verifier: Verifier,
    custom: CustomVerifier,
}

impl FrameCheck {
    /// Create a new instance with default configuration.
    pub fn new() -> Self {
        Self::with_config(FrameCheckConfig::default())
    }

    /// Create an instance with custom configuration.
    pub fn with_config(config: FrameCheckConfig) -> Self {
        let parser = Parser::with_config(config.parser.clone());
        let optimizer = TypeOptimizer::with_config(config.optimizer.clone());
        let verifier = Verifier::with_options(config.verify.clone());

        Self {
            config,
            parser,
            optimizer,
            discoverer: Discoverer::new(),
            verifier,
            custom: CustomVerifier::new(),
        }
    }

    pub fn config(&self) -> &FrameCheckConfig {
        &self.config
    }

    /// Load a data file, optimizing column types if configured.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<(DataTable, SourceMetadata)> {
        let (table, source) = self.parser.parse_file(path)?;
        let table = if self.config.optimize {
            self.optimizer.optimize(&table)
        } else {
            table
        };
        Ok((table, source))
    }

    /// Load a data file with explicit column types.
    pub fn load_with(
        &self,
        path: impl AsRef<Path>,
        options: &ReadOptions,
    ) -> Result<(DataTable, SourceMetadata)> {
        self.parser.parse_file_with(path, options)
    }

    /// Load a reference file and discover its constraints.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use framecheck::FrameCheck;
    ///
    /// let framecheck = FrameCheck::new();
    /// let constraints = framecheck.discover("reference.csv").unwrap();
    /// constraints.save("constraints.json").unwrap();
    /// ```
    pub fn discover(&self, path: impl AsRef<Path>) -> Result<ConstraintSet> {
        let (table, source) = self.load(path)?;
        info!(file = %source.file, hash = %source.hash, "Discovering constraints");
        Ok(self.discover_table(&table))
    }

    /// Discover constraints of an in-memory table.
    pub fn discover_table(&self, table: &DataTable) -> ConstraintSet {
        self.discoverer.discover(table)
    }

    /// Load a target file and verify it against `constraints`.
    ///
    /// With type enforcement on, columns are read directly as their declared
    /// types and the optimizer is skipped.
    pub fn verify(&self, path: impl AsRef<Path>, constraints: &ConstraintSet) -> Result<Verification> {
        let (table, source) = if self.config.verify.enforce_dtypes {
            let options = ReadOptions::new().with_dtypes(constraints.dtypes()?);
            self.load_with(path, &options)?
        } else {
            self.load(path)?
        };

        info!(file = %source.file, hash = %source.hash, "Verifying constraints");
        self.verify_table(&table, constraints)
    }

    /// Verify an in-memory table against `constraints`.
    pub fn verify_table(&self, table: &DataTable, constraints: &ConstraintSet) -> Result<Verification> {
        self.verifier.verify(table, constraints)
    }

    /// Load a target file and run custom rules against it.
    pub fn verify_custom(&self, path: impl AsRef<Path>, rules: &CustomRuleList) -> Result<CustomVerification> {
        let (table, source) = self.load(path)?;
        info!(file = %source.file, rules = rules.len(), "Running custom rules");
        self.verify_custom_table(&table, rules)
    }

    /// Run custom rules against an in-memory table.
    pub fn verify_custom_table(&self, table: &DataTable, rules: &CustomRuleList) -> Result<CustomVerification> {
        self.custom.verify(table, rules)
    }
}

impl Default for FrameCheck {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::custom::CustomRule;
    use crate::error::FrameCheckError;
    use crate::input::DType;
    use crate::schema::CheckKind;
    use crate::validation::CheckOutcome;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_file(content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_discover_then_verify_same_file_passes() {
        let file = create_test_file(
            "id,city,score,start_date\n1,Lima,1.5,2023-01-05\n2,Lima,2.5,2023-02-05\n3,Cusco,,2023-03-05\n",
        );
        let framecheck = FrameCheck::new();

        let constraints = framecheck.discover(file.path()).unwrap();
        assert_eq!(constraints.len(), 4);
        assert_eq!(
            constraints.get("start_date").and_then(|r| r.data_type()),
            Some("datetime64[ns]")
        );
        assert_eq!(constraints.get("city").and_then(|r| r.data_type()), Some("category"));

        let result = framecheck.verify(file.path(), &constraints).unwrap();
        assert!(result.passed());
        assert!(result.evidence.is_empty());
    }

    #[test]
    fn test_verify_with_enforced_types() {
        let reference = create_test_file("code,amount\n001,10\n002,20\n");
        let target = create_test_file("code,amount\n003,30\n004,abc\n");

        let framecheck = FrameCheck::with_config(FrameCheckConfig {
            optimize: false,
            ..FrameCheckConfig::default()
        });
        let constraints = framecheck.discover(reference.path()).unwrap();

        let enforcing = FrameCheck::with_config(FrameCheckConfig {
            optimize: false,
            verify: VerifyOptions { enforce_dtypes: true },
            ..FrameCheckConfig::default()
        });
        let err = enforcing.verify(target.path(), &constraints).unwrap_err();
        assert!(matches!(err, FrameCheckError::TypeCoercion { ref column, .. } if column == "amount"));
    }

    #[test]
    fn test_load_with_explicit_types() {
        let file = create_test_file("code\n001\n002\n");
        let mut dtypes = indexmap::IndexMap::new();
        dtypes.insert("code".to_string(), DType::Object);

        let (table, source) = FrameCheck::new()
            .load_with(file.path(), &ReadOptions::new().with_dtypes(dtypes))
            .unwrap();
        assert_eq!(table.column("code").map(|c| c.dtype()), Some(DType::Object));
        assert!(source.hash.starts_with("sha256:"));
    }

    #[test]
    fn test_verify_custom() {
        let file = create_test_file("age\n85\n40\n");
        let rules: CustomRuleList = [CustomRule::new("overage", "age > 80")].into_iter().collect();

        let result = FrameCheck::new().verify_custom(file.path(), &rules).unwrap();
        assert_eq!(result.summary[0].count, 1);
    }

    #[test]
    fn test_verify_reports_not_applicable() {
        let framecheck = FrameCheck::new();
        let table = DataTable::from_rows(&["n"], vec![vec![12345i64.into()]]).unwrap();

        let mut constraints = framecheck.discover_table(&table);
        let patch = crate::schema::ColumnConstraints::new()
            .with(crate::schema::Constraint::MinLength(3));
        constraints.modify("n", &patch).unwrap();

        let result = framecheck.verify_table(&table, &constraints).unwrap();
        assert_eq!(result.summary.get("n", CheckKind::MinLength), Some(CheckOutcome::NotApplicable));
    }
}
