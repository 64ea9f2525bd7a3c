//! Run configuration loaded from TOML.
//!
//! ```toml
//! schema = "IFC4"
//! batch_size = 1000
//! output_format = "turtle"
//!
//! [[classification.rules]]
//! category = "Pipe"
//! patterns = ["pipe", "piping"]
//!
//! [[classification.navis_rules]]
//! category = "Hanger"
//! patterns = ["hgr", "anvil_"]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::classify::{RuleSet, RuleSpec};
use crate::convert::streaming::DEFAULT_BATCH_SIZE;
use crate::error::{ConfigError, ConfigResult};
use crate::graph::serialize::OutputFormat;
use crate::source::model::DEFAULT_SCHEMA;

/// Top-level configuration. Every field has a default, so an empty file is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BimConfig {
    /// Schema assumed for models that do not declare one.
    #[serde(default = "default_schema")]
    pub schema: String,
    /// Triples per streaming batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default)]
    pub output_format: OutputFormat,
    #[serde(default)]
    pub classification: ClassificationConfig,
}

/// Classification overrides. Each absent table falls back to its built-in one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationConfig {
    /// Proxy elements of a converted model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<RuleSpec>>,
    /// Display names of a Navisworks hierarchy export.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub navis_rules: Option<Vec<RuleSpec>>,
}

fn default_schema() -> String {
    DEFAULT_SCHEMA.into()
}
fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

impl Default for BimConfig {
    fn default() -> Self {
        Self {
            schema: default_schema(),
            batch_size: default_batch_size(),
            output_format: OutputFormat::default(),
            classification: ClassificationConfig::default(),
        }
    }
}

impl BimConfig {
    /// Load from a TOML file and validate it.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        tracing::debug!(path = %path.display(), schema = %config.schema, "config loaded");
        Ok(config)
    }

    /// Reject values no run could use.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        Ok(())
    }

    /// The classification table: the configured rules, or the built-in table.
    pub fn rule_set(&self) -> ConfigResult<RuleSet> {
        match &self.classification.rules {
            Some(specs) => RuleSet::from_specs(specs),
            None => Ok(RuleSet::default()),
        }
    }

    /// The Navisworks classification table: configured, or built-in.
    pub fn navis_rule_set(&self) -> ConfigResult<RuleSet> {
        match &self.classification.navis_rules {
            Some(specs) => RuleSet::from_specs(specs),
            None => Ok(RuleSet::navis_default()),
        }
    }

    /// A starter config with both built-in rule tables written out.
    pub fn to_toml_with_rules(&self) -> ConfigResult<String> {
        let mut config = self.clone();
        let classification = &mut config.classification;
        classification.rules.get_or_insert_with(RuleSet::default_specs);
        classification.navis_rules.get_or_insert_with(RuleSet::navis_default_specs);
        toml::to_string_pretty(&config).map_err(|e| ConfigError::Parse {
            path: "<generated>".into(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bim-graph.toml");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn empty_file_gives_defaults() {
        let (_dir, path) = write("");
        let config = BimConfig::load(&path).unwrap();
        assert_eq!(config, BimConfig::default());
        assert_eq!(config.schema, "IFC4");
        assert_eq!(config.batch_size, 1000);
        assert_eq!(config.output_format, OutputFormat::Turtle);
        assert_eq!(config.rule_set().unwrap().len(), RuleSet::default().len());
        let navis = config.navis_rule_set().unwrap();
        assert_eq!(navis.len(), RuleSet::navis_default().len());
        assert_eq!(navis.classify_str(Some("VG3-101")), "Valve");
    }

    #[test]
    fn navis_rules_override_only_the_navis_table() {
        let (_dir, path) = write("[[classification.navis_rules]]\ncategory = \"Skid\"\npatterns = [\"skd-\"]\n");
        let config = BimConfig::load(&path).unwrap();
        let navis = config.navis_rule_set().unwrap();
        assert_eq!(navis.classify_str(Some("SKD-04")), "Skid");
        assert_eq!(navis.classify_str(Some("Hgr-3001")), "Other");
        assert_eq!(config.rule_set().unwrap().classify_str(Some("Spring Hanger")), "Hanger");
    }

    #[test]
    fn overrides_and_custom_rules() {
        let (_dir, path) = write(
            r#"
schema = "IFC2X3"
batch_size = 250
output_format = "ntriples"

[[classification.rules]]
category = "Skid"
patterns = ["skid"]

[[classification.rules]]
category = "Pipe"
patterns = ["pipe"]
"#,
        );
        let config = BimConfig::load(&path).unwrap();
        assert_eq!(config.schema, "IFC2X3");
        assert_eq!(config.batch_size, 250);
        assert_eq!(config.output_format, OutputFormat::NTriples);
        let rules = config.rule_set().unwrap();
        assert_eq!(rules.categories().collect::<Vec<_>>(), vec!["Skid", "Pipe"]);
        assert_eq!(rules.classify_str(Some("Pump skid A")), "Skid");
        assert_eq!(rules.classify_str(Some("Valve")), "Other");
    }

    #[test]
    fn zero_batch_size_rejected() {
        let (_dir, path) = write("batch_size = 0\n");
        assert!(matches!(BimConfig::load(&path), Err(ConfigError::ZeroBatchSize)));
    }

    #[test]
    fn bad_toml_and_missing_file() {
        let (dir, path) = write("batch_size = \"many\"\n");
        assert!(matches!(BimConfig::load(&path), Err(ConfigError::Parse { .. })));
        let missing = dir.path().join("absent.toml");
        assert!(matches!(BimConfig::load(&missing), Err(ConfigError::Read { .. })));
    }

    #[test]
    fn invalid_rule_pattern_surfaces_on_rule_set() {
        let (_dir, path) = write("[[classification.rules]]\ncategory = \"Bad\"\npatterns = [\"(\"]\n");
        let config = BimConfig::load(&path).unwrap();
        assert!(matches!(config.rule_set(), Err(ConfigError::InvalidPattern { .. })));
    }

    #[test]
    fn starter_config_round_trips() {
        let text = BimConfig::default().to_toml_with_rules().unwrap();
        let (_dir, path) = write(&text);
        let config = BimConfig::load(&path).unwrap();
        assert_eq!(config.rule_set().unwrap().len(), RuleSet::default().len());
        assert_eq!(config.rule_set().unwrap().classify_str(Some("Member System 3")), "MemberSystem");
        let navis = config.navis_rule_set().unwrap();
        assert_eq!(navis.len(), RuleSet::navis_default().len());
        assert_eq!(navis.classify_str(Some("41P-101A")), "Equipment");
    }
}
