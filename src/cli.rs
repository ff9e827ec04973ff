//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// lobdash - line-of-business dashboard aggregation
///
/// Groups records by line of business and reports, per category, the
/// classification distribution, records created per month, and the share
/// of a highlighted classification. Markdown/JSON reports.
///
/// Examples:
///   lobdash --input records.json
///   lobdash --input data/ --format json --output dashboard.json
///   lobdash --input records.jsonl --highlight VM --category Retail,Banking
///   lobdash --input records.json --min-percentage 50
///   lobdash --input records.json --dry-run
///   lobdash --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Record file (.json, .jsonl, .ndjson) or directory of record files
    #[arg(
        short,
        long,
        value_name = "PATH",
        required_unless_present = "init_config"
    )]
    pub input: Option<PathBuf>,

    /// Output file path for the report
    ///
    /// Defaults to the config file value, or lobdash_report.md
    /// (lobdash_report.json with --format json).
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Print the report to stdout instead of writing a file
    #[arg(long)]
    pub stdout: bool,

    /// Classification value whose share is reported per category
    #[arg(long, value_name = "VALUE", env = "LOBDASH_HIGHLIGHT")]
    pub highlight: Option<String>,

    /// Source key holding the category (default: lob)
    #[arg(long, value_name = "KEY")]
    pub category_field: Option<String>,

    /// Source key holding the classification (default: infra_type)
    #[arg(long, value_name = "KEY")]
    pub classification_field: Option<String>,

    /// Source key holding the creation timestamp (default: createdtime)
    #[arg(long, value_name = "KEY")]
    pub timestamp_field: Option<String>,

    /// Only report these categories (comma-separated or repeated)
    #[arg(long = "category", value_name = "NAME", value_delimiter = ',')]
    pub categories: Vec<String>,

    /// Fail if any reported category's highlight percentage is below this value
    ///
    /// Useful for CI pipelines. Exit code 2 when the threshold is breached.
    #[arg(long, value_name = "PCT")]
    pub min_percentage: Option<u32>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .lobdash.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Dry run: load records and list categories without writing a report
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .lobdash.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl OutputFormat {
    /// File extension used when no output path is configured.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "md",
            OutputFormat::Json => "json",
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        match self.input {
            Some(ref input) if !input.exists() => {
                return Err(format!("Input path does not exist: {}", input.display()));
            }
            None => return Err("An input path is required (--input)".to_string()),
            _ => {}
        }

        if let Some(pct) = self.min_percentage {
            if pct > 100 {
                return Err("Min percentage must be between 0 and 100".to_string());
            }
        }

        if matches!(self.highlight.as_deref(), Some("")) {
            return Err("Highlight value must not be empty".to_string());
        }

        for field in [
            &self.category_field,
            &self.classification_field,
            &self.timestamp_field,
        ]
        .into_iter()
        .flatten()
        {
            if field.is_empty() {
                return Err("Field names must not be empty".to_string());
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn make_args() -> Args {
        Args {
            input: Some(std::env::temp_dir()),
            output: None,
            format: OutputFormat::Markdown,
            stdout: false,
            highlight: None,
            category_field: None,
            classification_field: None,
            timestamp_field: None,
            categories: Vec::new(),
            min_percentage: None,
            config: None,
            verbose: false,
            quiet: false,
            dry_run: false,
            init_config: false,
        }
    }

    #[test]
    fn test_parse_from_command_line() {
        let args = Args::try_parse_from([
            "lobdash",
            "--input",
            "records.json",
            "--format",
            "json",
            "--category",
            "Retail,Banking",
            "--category",
            "Markets",
            "--min-percentage",
            "40",
            "--highlight",
            "VM",
        ])
        .unwrap();

        assert_eq!(args.input, Some(PathBuf::from("records.json")));
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.categories, vec!["Retail", "Banking", "Markets"]);
        assert_eq!(args.min_percentage, Some(40));
        assert_eq!(args.highlight.as_deref(), Some("VM"));
    }

    #[test]
    fn test_input_required_unless_init_config() {
        assert!(Args::try_parse_from(["lobdash"]).is_err());
        assert!(Args::try_parse_from(["lobdash", "--init-config"]).is_ok());
    }

    #[test]
    fn test_validation_missing_input() {
        let mut args = make_args();
        args.input = Some(PathBuf::from("/definitely/not/here.json"));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_min_percentage() {
        let mut args = make_args();
        args.min_percentage = Some(100);
        assert!(args.validate().is_ok());
        args.min_percentage = Some(101);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_empty_values() {
        let mut args = make_args();
        args.highlight = Some(String::new());
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.timestamp_field = Some(String::new());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }
}
