//! Custom rules and the ordered rule list.

use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FrameCheckError, Result};
use crate::schema::{create_file, open_file, FileFormat};

use super::expression::parse_query;

/// A named row predicate describing an anomaly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomRule {
    pub name: String,
    pub query: String,
}

impl CustomRule {
    pub fn new(name: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            query: query.into(),
        }
    }

    /// Check that the query parses, without binding it to any table.
    pub fn validate(&self) -> Result<()> {
        parse_query(&self.query)
            .map(|_| ())
            .map_err(|message| FrameCheckError::InvalidQuery {
                rule: self.name.clone(),
                message,
            })
    }

    /// Evidence label for rows matched by this rule.
    pub fn label(&self) -> String {
        format!("{}: {}", self.name, self.query)
    }
}

/// Ordered list of custom rules.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomRuleList {
    rules: Vec<CustomRule>,
}

impl CustomRuleList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule. An exact duplicate (same name and query) is ignored.
    ///
    /// Returns true if the rule was added.
    pub fn add(&mut self, rule: CustomRule) -> bool {
        if self.rules.contains(&rule) {
            return false;
        }
        self.rules.push(rule);
        true
    }

    /// Remove every rule with the given name.
    ///
    /// Returns the number of rules removed; fails if there were none.
    pub fn remove(&mut self, name: &str) -> Result<usize> {
        let before = self.rules.len();
        self.rules.retain(|rule| rule.name != name);
        let removed = before - self.rules.len();

        if removed == 0 {
            return Err(FrameCheckError::RuleNotFound {
                name: name.to_string(),
            });
        }
        Ok(removed)
    }

    pub fn get(&self, name: &str) -> Option<&CustomRule> {
        self.rules.iter().find(|rule| rule.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CustomRule> + '_ {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Save as a JSON array or a `name,query` CSV, by extension.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let format = FileFormat::from_path(path)?;

        let mut writer = create_file(path)?;
        match format {
            FileFormat::Json => serde_json::to_writer_pretty(&mut writer, self)?,
            FileFormat::Csv => {
                let mut csv_writer = csv::Writer::from_writer(&mut writer);
                csv_writer.write_record(["name", "query"])?;
                for rule in &self.rules {
                    csv_writer.write_record([&rule.name, &rule.query])?;
                }
                csv_writer.flush().map_err(csv::Error::from)?;
            }
        }
        writer.flush().map_err(|e| FrameCheckError::io(path, e))?;

        debug!(path = %path.display(), rules = self.len(), "Saved custom rules");
        Ok(())
    }

    /// Load a rule list saved with [`save`](Self::save).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let format = FileFormat::from_path(path)?;
        let reader = open_file(path)?;

        let loaded: Vec<CustomRule> = match format {
            FileFormat::Json => serde_json::from_reader(reader)
                .map_err(|e| FrameCheckError::parse(path, e.to_string()))?,
            FileFormat::Csv => csv::Reader::from_reader(reader)
                .deserialize()
                .collect::<std::result::Result<_, _>>()
                .map_err(|e: csv::Error| FrameCheckError::parse(path, e.to_string()))?,
        };

        let mut list = CustomRuleList::new();
        for rule in loaded {
            list.add(rule);
        }

        debug!(path = %path.display(), rules = list.len(), "Loaded custom rules");
        Ok(list)
    }
}

impl FromIterator<CustomRule> for CustomRuleList {
    fn from_iter<I: IntoIterator<Item = CustomRule>>(iter: I) -> Self {
        let mut list = CustomRuleList::new();
        for rule in iter {
            list.add(rule);
        }
        list
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn rules() -> CustomRuleList {
        [
            CustomRule::new("overage", "age > 80"),
            CustomRule::new("bad_status", "status NOT IN ('A', 'B')"),
            CustomRule::new("overage", "age > 100"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_add_ignores_exact_duplicates() {
        let mut list = rules();
        assert!(!list.add(CustomRule::new("overage", "age > 80")));
        assert!(list.add(CustomRule::new("overage", "age >= 80")));
        assert_eq!(list.len(), 4);
    }

    #[test]
    fn test_remove_by_name_removes_all() {
        let mut list = rules();
        assert_eq!(list.remove("overage").unwrap(), 2);
        assert_eq!(list.len(), 1);
        assert!(matches!(list.remove("overage"), Err(FrameCheckError::RuleNotFound { .. })));
    }

    #[test]
    fn test_validate() {
        assert!(CustomRule::new("ok", "a > 1 AND b = 'x'").validate().is_ok());
        assert!(CustomRule::new("bad", "a >").validate().is_err());
    }

    #[test]
    fn test_round_trips() {
        let dir = TempDir::new().unwrap();
        let list = rules();

        for name in ["rules.json", "rules.csv"] {
            let path = dir.path().join(name);
            list.save(&path).unwrap();
            assert_eq!(CustomRuleList::load(&path).unwrap(), list);
        }
    }

    #[test]
    fn test_json_layout() {
        let json = serde_json::to_value(rules()).unwrap();
        assert_eq!(json[0]["name"], "overage");
        assert_eq!(json[0]["query"], "age > 80");
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rules.txt");
        assert!(matches!(
            rules().save(&path),
            Err(FrameCheckError::UnsupportedFormat(_))
        ));
    }
}
