//! lobdash - Line-of-business dashboard aggregation
//!
//! A CLI tool that groups business records by line of business and
//! produces per-category classification distributions, monthly creation
//! counts, and the share of a highlighted classification.
//!
//! Exit codes:
//!   0 - Success (no category below threshold, or no --min-percentage set)
//!   1 - Runtime error (unreadable input, bad config, write failure, etc.)
//!   2 - A category's highlight percentage is below --min-percentage

use anyhow::{Context, Result};
use chrono::Utc;
use lobdash::cli::{Args, OutputFormat};
use lobdash::config::{Config, CONFIG_FILE_NAME};
use lobdash::ingest::{self, FieldMapping};
use lobdash::models::{Dashboard, Report, ReportMetadata};
use lobdash::{analysis, report};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // The config decides the default verbosity, so it is read before logging starts.
    let (mut config, origin) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    init_logging(&config, &args);

    info!("lobdash v{}", env!("CARGO_PKG_VERSION"));
    origin.log();
    debug!("Arguments: {:?}", args);

    match run(args, config) {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Dashboard failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .lobdash.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize field names, the highlight value, and report sections.");
    Ok(())
}

/// Initialize logging from the merged config and the `--quiet` flag.
fn init_logging(config: &Config, args: &Args) {
    let level = config.log_level(args.quiet);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Load, aggregate and report with an already merged config. Returns the exit code (0 or 2).
fn run(args: Args, config: Config) -> Result<i32> {
    let start_time = Instant::now();

    let input = args
        .input
        .clone()
        .context("An input path is required (--input)")?;

    // Step 1: Load records
    let mapping = FieldMapping::from(&config.fields);
    info!(
        "Loading records from {} (category={}, classification={}, timestamp={})",
        input.display(),
        mapping.category,
        mapping.classification,
        mapping.timestamp
    );
    let loaded = ingest::load_records(&input, &mapping)
        .with_context(|| format!("Failed to load records from {}", input.display()))?;

    if loaded.skipped > 0 {
        warn!(
            "{} entries had no usable `{}` field and were skipped",
            loaded.skipped, mapping.category
        );
    }

    // Step 2: Aggregate
    let highlight = config.metrics.highlight.clone();
    let mut dashboard = analysis::build_dashboard(&loaded.records, &highlight);

    if args.dry_run {
        return handle_dry_run(&dashboard);
    }

    if !args.categories.is_empty() {
        for missing in args
            .categories
            .iter()
            .filter(|name| !dashboard.categories.contains_key(*name))
        {
            warn!("Requested category not present in records: {}", missing);
        }
        dashboard.retain_categories(&args.categories);
    }

    // Step 3: Build the report
    let metadata = ReportMetadata {
        source: input.display().to_string(),
        generated_at: Utc::now(),
        records_loaded: loaded.records.len(),
        records_skipped: loaded.skipped,
        files_read: loaded.files.len(),
        highlight: highlight.clone(),
        category_count: dashboard.categories.len(),
        duration_seconds: start_time.elapsed().as_secs_f64(),
    };

    let report = Report {
        metadata,
        dashboard,
    };

    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report, &config.report),
    };

    // Step 4: Write the report
    if args.stdout {
        println!("{}", output);
    } else {
        let output_path = output_path(&args, &config);
        std::fs::write(&output_path, &output)
            .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

        print_summary(&report);
        println!(
            "\n✅ Dashboard complete! Report saved to: {}",
            output_path.display()
        );
    }

    // Check --min-percentage threshold
    if let Some(threshold) = args.min_percentage {
        let below = report.dashboard.below_threshold(threshold);

        if !below.is_empty() {
            for bundle in &below {
                eprintln!(
                    "⛔ {}: {}% {} (below {}%)",
                    bundle.category, bundle.summary.percentage, highlight, threshold
                );
            }
            eprintln!(
                "\n⛔ {} categor{} below threshold. Failing (exit code 2).",
                below.len(),
                if below.len() == 1 { "y" } else { "ies" }
            );
            return Ok(2);
        }
    }

    Ok(0)
}

/// Print a short per-category summary to stdout.
fn print_summary(report: &Report) {
    let dashboard = &report.dashboard;

    println!("\n📊 Dashboard Summary:");
    println!("   Records: {}", report.metadata.records_loaded);
    println!("   Categories: {}", dashboard.categories.len());
    for bundle in dashboard.categories.values() {
        println!(
            "   - {}: {} records, {}% {}",
            bundle.category, bundle.summary.total, bundle.summary.percentage, dashboard.highlight
        );
    }
    println!("   Duration: {:.3}s", report.metadata.duration_seconds);
}

/// Handle --dry-run: list categories and record counts, then exit.
fn handle_dry_run(dashboard: &Dashboard) -> Result<i32> {
    println!("\n🔍 Dry run: {} records loaded\n", dashboard.total_records);

    if dashboard.categories.is_empty() {
        println!("   No categories found.");
    } else {
        println!("   Found {} categories:\n", dashboard.categories.len());
        for bundle in dashboard.categories.values() {
            println!("     📁 {} ({} records)", bundle.category, bundle.summary.total);
        }
    }

    println!("\n✅ Dry run complete. No report was written.");
    Ok(0)
}

/// Resolve the report path: explicit flag, then config, adjusted to the format.
fn output_path(args: &Args, config: &Config) -> PathBuf {
    let path = PathBuf::from(&config.general.output);

    // The config default is a Markdown file name; keep the extension in
    // step with --format unless a path was given explicitly.
    if args.output.is_none() && path.extension().and_then(|e| e.to_str()) == Some("md") {
        return path.with_extension(args.format.extension());
    }

    path
}

/// Where the configuration came from, reported once logging is up.
#[derive(Debug)]
enum ConfigOrigin {
    Explicit(PathBuf),
    DefaultFile,
    Builtin,
    Unreadable(String),
}

impl ConfigOrigin {
    fn log(&self) {
        match self {
            ConfigOrigin::Explicit(path) => info!("Loaded config from: {}", path.display()),
            ConfigOrigin::DefaultFile => info!("Loaded default config from {}", CONFIG_FILE_NAME),
            ConfigOrigin::Builtin => debug!("No config file found, using defaults"),
            ConfigOrigin::Unreadable(reason) => warn!("Failed to load config: {}", reason),
        }
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<(Config, ConfigOrigin)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, ConfigOrigin::Explicit(config_path.clone())));
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok((config, ConfigOrigin::DefaultFile)),
        Ok(None) => Ok((Config::default(), ConfigOrigin::Builtin)),
        Err(e) => Ok((Config::default(), ConfigOrigin::Unreadable(format!("{:#}", e)))),
    }
}
