// Configuration file handling

use crate::multi::setup::{OptionMap, ReporterEntry, deserialize_options};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable holding the `name=dest name=dest` setup string
pub const ENV_MULTI: &str = "multi";

/// Base name of the configuration file
pub const CONFIG_FILE_NAME: &str = ".multireportrc";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    /// Options shared by every reporter
    #[serde(default, deserialize_with = "deserialize_options")]
    pub options: OptionMap,

    /// Reporter name to destination, in table order
    #[serde(default)]
    pub reporters: IndexMap<String, ReporterEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneralConfig {
    /// Log level for this crate's diagnostics
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

pub fn default_log_level() -> String {
    String::from("warn")
}

impl Config {
    /// Load configuration from default locations
    pub fn load() -> Option<Self> {
        // Check locations in order:
        // 1. .multireportrc (current directory)
        // 2. ~/.multireportrc (home directory)
        // 3. .multireportrc.toml (current directory)
        // 4. ~/.multireportrc.toml (home directory)

        let path = Self::candidates().into_iter().find(|path| path.exists())?;
        Self::load_from_file(&path)
    }

    /// Candidate file locations, in lookup order
    pub fn candidates() -> Vec<PathBuf> {
        let toml_name = format!("{}.toml", CONFIG_FILE_NAME);
        let cwd = std::env::current_dir().ok();
        let home = dirs::home_dir();

        [CONFIG_FILE_NAME, toml_name.as_str()]
            .into_iter()
            .flat_map(|name| {
                [cwd.as_ref(), home.as_ref()]
                    .into_iter()
                    .flatten()
                    .map(move |dir| dir.join(name))
            })
            .collect()
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        let config = Self::parse(&content);
        match &config {
            Some(_) => debug!("Loaded configuration from {}", path.display()),
            None => warn!("Ignoring unparsable configuration file {}", path.display()),
        }
        config
    }

    /// Parse configuration from TOML string
    pub fn parse(content: &str) -> Option<Self> {
        toml::from_str(content).ok()
    }

    /// Generate configuration as TOML
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_else(|_| String::new())
    }

    /// Starter configuration written by `--init-config`
    pub fn sample() -> Self {
        let mut options = OptionMap::new();
        options.insert("color".to_string(), "false".to_string());

        let mut reporters = IndexMap::new();
        reporters.insert("spec".to_string(), ReporterEntry::Destination("-".into()));

        Self {
            general: GeneralConfig::default(),
            options,
            reporters,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml = r#"
[general]
log_level = "debug"

[options]
color = true
retries = 2

[reporters]
spec = "-"
junit = { destination = "reports/junit.xml", options = { suite_name = "e2e" } }
dot = "-"
"#;

        let config = Config::parse(toml).expect("Failed to parse config");
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.options["color"], "true");
        assert_eq!(config.options["retries"], "2");

        let names: Vec<_> = config.reporters.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["spec", "junit", "dot"]);

        let ReporterEntry::Detailed { destination, options } = &config.reporters["junit"] else {
            panic!("expected detailed junit entry");
        };
        assert_eq!(destination, "reports/junit.xml");
        assert_eq!(options.as_ref().unwrap()["suite_name"], "e2e");
    }

    #[test]
    fn test_sample_round_trips() {
        let sample = Config::sample();
        let parsed = Config::parse(&sample.to_toml()).expect("sample should parse");
        assert_eq!(parsed, sample);
    }

    #[test]
    fn test_candidates_order() {
        let candidates = Config::candidates();
        assert!(!candidates.is_empty());
        assert!(candidates[0].ends_with(CONFIG_FILE_NAME));
        assert!(candidates.last().unwrap().ends_with(".multireportrc.toml"));
    }
}
