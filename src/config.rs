//! Run configuration, loaded once and validated before any fetch.

use crate::errors::{Result, schema_error};
use crate::source::SheetSpec;
use crate::vocabulary::LibraryType;
use anyhow::Context;
use regex::{Regex, RegexBuilder};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Everything the assembly needs to know about its sources, declared
/// in one YAML file. Unknown keys are rejected at load time so typos
/// fail here, not deep inside processing.
#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Spreadsheet holding the tracking worksheets.
    pub spreadsheet_id: String,
    /// Drive folder with delivered metrics.
    pub metrics_folder_id: String,
    pub sheets: Vec<SheetSpec>,
    /// 10x platform label to library type.
    pub platforms: HashMap<String, LibraryType>,
    pub reference_parent_dir: PathBuf,
    /// Default genome per species, used when no delivered metrics
    /// exist for a project.
    #[serde(default)]
    pub species_genomes: HashMap<String, String>,
    /// Regex per species restricting which historical references are
    /// plausible; matched case-insensitively.
    #[serde(default)]
    pub species_genome_patterns: HashMap<String, String>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Config> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        let config: Config =
            serde_yaml::from_str(&raw).with_context(|| format!("cannot parse {}", path.display()))?;
        config.check()?;
        Ok(config)
    }

    /// Validate the configuration eagerly, before any fetch.
    pub fn check(&self) -> Result<()> {
        if self.sheets.is_empty() {
            return Err(schema_error("no sheets declared".to_owned()));
        }
        if !self.sheets.iter().any(|sheet| sheet.join) {
            return Err(schema_error(
                "at least one sheet must be joinable".to_owned(),
            ));
        }
        for sheet in &self.sheets {
            sheet.check()?;
        }
        if self.platforms.is_empty() {
            return Err(schema_error(
                "the 10x platform vocabulary is empty".to_owned(),
            ));
        }
        for (species, pattern) in &self.species_genome_patterns {
            build_pattern(pattern).map_err(|e| {
                schema_error(format!("species {species}: bad genome pattern: {e}"))
            })?;
        }
        Ok(())
    }

    /// The genome regex for a species, if one is configured. Patterns
    /// were compiled once in [Config::check], so this cannot fail.
    pub fn genome_pattern(&self, species: Option<&str>) -> Option<Regex> {
        let pattern = self.species_genome_patterns.get(species?)?;
        build_pattern(pattern).ok()
    }
}

fn build_pattern(pattern: &str) -> std::result::Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::source::Field;

    fn minimal_yaml() -> &'static str {
        "\
spreadsheet_id: sheet-1
metrics_folder_id: folder-1
sheets:
  - sheet_id: '0'
    columns:
      Library ID: library_id
      Sample: sample_name
      Platform: 10x_platform
      Project: project
platforms:
  3' GEX: Gene Expression
reference_parent_dir: /refs
species_genomes:
  human: GRCh38-2020-A
species_genome_patterns:
  human: '^grch'
"
    }

    #[test]
    fn loads_and_checks() {
        let config: Config = serde_yaml::from_str(minimal_yaml()).unwrap();
        config.check().unwrap();
        assert_eq!(config.sheets.len(), 1);
        assert_eq!(
            config.sheets[0].columns["Platform"],
            Field::TenxPlatform
        );
        assert!(config.sheets[0].join);
        assert_eq!(
            config.platforms["3' GEX"],
            LibraryType::GeneExpression
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let yaml = format!("{}unexpected_key: 1\n", minimal_yaml());
        assert!(serde_yaml::from_str::<Config>(&yaml).is_err());
    }

    #[test]
    fn all_auxiliary_sheets_is_an_error() {
        let mut config: Config = serde_yaml::from_str(minimal_yaml()).unwrap();
        config.sheets[0].join = false;
        assert!(config.check().is_err());
    }

    #[test]
    fn bad_genome_pattern_is_caught_at_load() {
        let mut config: Config = serde_yaml::from_str(minimal_yaml()).unwrap();
        config
            .species_genome_patterns
            .insert("mouse".to_owned(), "[unclosed".to_owned());
        assert!(config.check().is_err());
    }

    #[test]
    fn genome_pattern_is_case_insensitive() {
        let config: Config = serde_yaml::from_str(minimal_yaml()).unwrap();
        let pattern = config.genome_pattern(Some("human")).unwrap();
        assert!(pattern.is_match("GRCh38-2020-A"));
        assert!(config.genome_pattern(Some("zebrafish")).is_none());
        assert!(config.genome_pattern(None).is_none());
    }
}
