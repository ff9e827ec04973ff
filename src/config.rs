//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.lobdash.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".lobdash.toml";

/// Placeholder replaced by the category name in section titles.
pub const CATEGORY_PLACEHOLDER: &str = "{category}";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Source field names.
    #[serde(default)]
    pub fields: FieldsConfig,

    /// Metric settings.
    #[serde(default)]
    pub metrics: MetricsConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
        }
    }
}

fn default_output() -> String {
    "lobdash_report.md".to_string()
}

/// Names of the source keys mapped onto record fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldsConfig {
    /// Grouping key.
    #[serde(default = "default_category_field")]
    pub category: String,

    /// Classification key.
    #[serde(default = "default_classification_field")]
    pub classification: String,

    /// Creation timestamp key.
    #[serde(default = "default_timestamp_field")]
    pub timestamp: String,
}

impl Default for FieldsConfig {
    fn default() -> Self {
        Self {
            category: default_category_field(),
            classification: default_classification_field(),
            timestamp: default_timestamp_field(),
        }
    }
}

fn default_category_field() -> String {
    "lob".to_string()
}

fn default_classification_field() -> String {
    "infra_type".to_string()
}

fn default_timestamp_field() -> String {
    "createdtime".to_string()
}

/// Metric settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Classification value whose share is reported per category.
    #[serde(default = "default_highlight")]
    pub highlight: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            highlight: default_highlight(),
        }
    }
}

fn default_highlight() -> String {
    "FCVM".to_string()
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Include the classification distribution per category.
    #[serde(default = "default_true")]
    pub include_classification: bool,

    /// Include the monthly counts per category.
    #[serde(default = "default_true")]
    pub include_monthly: bool,

    /// Title of the classification section. `{category}` is substituted.
    #[serde(default = "default_classification_title")]
    pub classification_title: String,

    /// Title of the monthly section. `{category}` is substituted.
    #[serde(default = "default_monthly_title")]
    pub monthly_title: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            include_classification: true,
            include_monthly: true,
            classification_title: default_classification_title(),
            monthly_title: default_monthly_title(),
        }
    }
}

impl ReportConfig {
    /// Classification section title for `category`.
    pub fn classification_title_for(&self, category: &str) -> String {
        self.classification_title.replace(CATEGORY_PLACEHOLDER, category)
    }

    /// Monthly section title for `category`.
    pub fn monthly_title_for(&self, category: &str) -> String {
        self.monthly_title.replace(CATEGORY_PLACEHOLDER, category)
    }
}

fn default_true() -> bool {
    true
}

fn default_classification_title() -> String {
    "{category} - Infrastructure Types Distribution".to_string()
}

fn default_monthly_title() -> String {
    "{category} - Items Created Per Month".to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.lobdash.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// Only explicitly provided values override the file.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }
        if let Some(ref highlight) = args.highlight {
            self.metrics.highlight = highlight.clone();
        }
        if let Some(ref field) = args.category_field {
            self.fields.category = field.clone();
        }
        if let Some(ref field) = args.classification_field {
            self.fields.classification = field.clone();
        }
        if let Some(ref field) = args.timestamp_field {
            self.fields.timestamp = field.clone();
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Log level once CLI flags are merged in. `quiet` wins over `verbose`.
    pub fn log_level(&self, quiet: bool) -> tracing::Level {
        if quiet {
            tracing::Level::ERROR
        } else if self.general.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::tests::make_args;
    use crate::cli::Args;
    use std::path::PathBuf;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.fields.category, "lob");
        assert_eq!(config.fields.classification, "infra_type");
        assert_eq!(config.fields.timestamp, "createdtime");
        assert_eq!(config.metrics.highlight, "FCVM");
        assert!(config.report.include_monthly);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
output = "custom_report.md"
verbose = true

[fields]
category = "business_unit"

[metrics]
highlight = "VM"

[report]
include_monthly = false
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.output, "custom_report.md");
        assert!(config.general.verbose);
        assert_eq!(config.fields.category, "business_unit");
        assert_eq!(config.fields.classification, "infra_type");
        assert_eq!(config.metrics.highlight, "VM");
        assert!(!config.report.include_monthly);
        assert!(config.report.include_classification);
    }

    #[test]
    fn test_section_titles() {
        let report = ReportConfig::default();
        assert_eq!(
            report.classification_title_for("Retail"),
            "Retail - Infrastructure Types Distribution"
        );
        assert_eq!(
            report.monthly_title_for("Retail"),
            "Retail - Items Created Per Month"
        );
    }

    #[test]
    fn test_merge_with_args() {
        let mut config = Config::default();
        let mut args = make_args();
        args.highlight = Some("VM".to_string());
        args.category_field = Some("team".to_string());
        args.output = Some(PathBuf::from("out.json"));

        config.merge_with_args(&args);

        assert_eq!(config.metrics.highlight, "VM");
        assert_eq!(config.fields.category, "team");
        assert_eq!(config.fields.timestamp, "createdtime");
        assert_eq!(config.general.output, "out.json");
    }

    #[test]
    fn test_merge_keeps_file_values() {
        let mut config: Config = toml::from_str("[metrics]\nhighlight = \"BM\"\n").unwrap();
        config.merge_with_args(&make_args());
        assert_eq!(config.metrics.highlight, "BM");
    }

    #[test]
    fn test_log_level() {
        let mut config = Config::default();
        assert_eq!(config.log_level(false), tracing::Level::INFO);

        config.merge_with_args(&Args {
            verbose: true,
            ..make_args()
        });
        assert_eq!(config.log_level(false), tracing::Level::DEBUG);

        let config: Config = toml::from_str("[general]\nverbose = true\n").unwrap();
        assert_eq!(config.log_level(false), tracing::Level::DEBUG);
        assert_eq!(config.log_level(true), tracing::Level::ERROR);
    }

    #[test]
    fn test_load_from_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(Config::load_from_dir(dir.path()).unwrap().is_none());

        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "[fields]\ncategory = \"unit\"\n")
            .unwrap();
        let config = Config::load_from_dir(dir.path()).unwrap().unwrap();
        assert_eq!(config.fields.category, "unit");

        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "[fields\n").unwrap();
        assert!(Config::load_from_dir(dir.path()).is_err());
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[fields]"));
        assert!(toml_str.contains("[metrics]"));
        assert!(toml_str.contains("[report]"));

        let reparsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(reparsed.metrics.highlight, "FCVM");
    }
}
