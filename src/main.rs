//! aptitrack - practice-test tracker for aptitude test prep
//!
//! A CLI tool that keeps a per-question attempt log and turns it into a
//! dashboard of accuracy, time overruns, weak units and a study plan.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Error (invalid arguments, config, malformed CSV, I/O failure)

mod analysis;
mod cli;
mod config;
mod data;
mod models;
mod report;

use analysis::AnalysisOptions;
use anyhow::{Context, Result};
use chrono::Local;
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE};
use models::{AttemptRecord, Catalog, DateRange};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn, Level, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Load configuration before logging so `general.verbose` can take effect
    let (config, config_source) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    init_logging(args.log_level(config.general.verbose));

    info!("aptitrack v{}", env!("CARGO_PKG_VERSION"));
    info!("Using {}", config_source);
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args, config) {
        error!("aptitrack failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .aptitrack.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to set your user, goals, exam date and report sections.");
    Ok(())
}

/// Initialize logging on stderr so `-o -` keeps stdout clean.
fn init_logging(level: Level) {
    let subscriber = log_subscriber(level, std::io::stderr);

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("Warning: tracing subscriber already set");
    }
}

fn log_subscriber<W>(level: Level, writer: W) -> impl Subscriber + Send + Sync + 'static
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(writer)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish()
}

/// Dispatch to the requested mode.
fn run(args: Args, mut config: Config) -> Result<()> {
    config.merge_with_args(&args);
    config.validate()?;

    if args.list_users {
        return handle_list_users(&config);
    }

    let catalog = load_catalog(&config)?;

    if let Some(ref path) = args.export_catalog {
        data::write_catalog(path, &catalog)
            .with_context(|| format!("Failed to export catalog to {}", path.display()))?;
        println!(
            "✅ Exported {} questions to {}",
            catalog.len(),
            path.display()
        );
        return Ok(());
    }

    let log_path = resolve_log_path(&args, &config);

    if let Some(ref row) = args.append {
        return handle_append(row, &log_path, &catalog);
    }

    run_report(&args, &config, &catalog, &log_path)
}

/// Build the dashboard and write the report.
fn run_report(args: &Args, config: &Config, catalog: &Catalog, log_path: &Path) -> Result<()> {
    let attempts = data::load_attempts_or_empty(log_path)
        .with_context(|| format!("Failed to load attempt log {}", log_path.display()))?;
    if attempts.is_empty() {
        warn!("No attempts recorded in {}", log_path.display());
    }

    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let range = resolve_range(args, config, &attempts);
    info!("Analysis window: {}", range);

    let options = AnalysisOptions {
        user: display_name(args, config),
        range,
        target_accuracy: config.goals.target_accuracy_pct / 100.0,
        time_policy: config.goals.time_policy,
        top_units: config.analysis.top_units,
        today,
        exam_date: config.goals.exam_date,
        daily_minutes: config.goals.daily_study_minutes,
    };

    let dashboard = analysis::build_dashboard(&attempts, catalog, &options);

    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&dashboard)?,
        OutputFormat::Markdown => report::generate_markdown_report(&dashboard, &config.report),
    };

    let output_path = resolve_output_path(&config.general.output, args.format);
    if output_path == Path::new("-") {
        print!("{}", output);
        return Ok(());
    }

    std::fs::write(&output_path, &output)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    // Print summary
    let kpis = &dashboard.kpis;
    println!("\n📊 Dashboard Summary ({}):", options.user);
    println!("   Attempts: {} in {}", kpis.attempts, range);
    println!(
        "   Accuracy: {:.1}% (target {:.1}%) {}",
        kpis.accuracy * 100.0,
        kpis.target_accuracy * 100.0,
        if kpis.target_met() { "✅" } else { "⚠️" }
    );
    println!("   Time overrun: {:.1}%", kpis.overrun_rate * 100.0);
    if let Some((unit, score)) = dashboard.priority_units.first() {
        println!("   Top priority: {} ({:.2})", unit, score);
    }
    println!("   Streak: {} day(s)", dashboard.streak.current);
    println!("\n✅ Report saved to: {}", output_path.display());

    Ok(())
}

/// Handle --append: validate one row and add it to the log.
fn handle_append(row: &str, log_path: &Path, catalog: &Catalog) -> Result<()> {
    let record = data::parse_attempt_line(row).context("Invalid --append row")?;

    if catalog.get(&record.question_id).is_none() {
        warn!(
            "Question {} is not in the catalog; it will be counted as unknown",
            record.question_id
        );
    }

    let summary = describe_attempt(&record);
    let total = data::append_attempt(log_path, record)
        .with_context(|| format!("Failed to append to {}", log_path.display()))?;

    println!("✅ Recorded {}", summary);
    println!("   {} now holds {} attempt(s)", log_path.display(), total);
    Ok(())
}

fn describe_attempt(record: &AttemptRecord) -> String {
    format!(
        "{} {} {} in {:.0}s",
        record.date.format("%Y-%m-%d"),
        record.question_id,
        if record.correct { "〇" } else { "✕" },
        record.response_time_seconds
    )
}

/// Handle --list-users: print users with a log in the data directory.
fn handle_list_users(config: &Config) -> Result<()> {
    let dir = Path::new(&config.data.data_dir);
    let users = data::list_users(dir)
        .with_context(|| format!("Failed to list users in {}", dir.display()))?;

    if users.is_empty() {
        println!("No user logs found in {}", dir.display());
    } else {
        println!("👤 Users in {}:", dir.display());
        for user in &users {
            println!("   {}", user);
        }
    }
    Ok(())
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is set up, so problems go straight to stderr. The
/// returned label names where the settings came from.
fn load_config(args: &Args) -> Result<(Config, String)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, format!("config from {}", config_path.display())));
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok((config, format!("default config from {}", CONFIG_FILE))),
        Ok(None) => Ok((Config::default(), "built-in defaults".to_string())),
        Err(e) => {
            eprintln!("⚠️  Failed to load config: {:#}", e);
            Ok((Config::default(), "built-in defaults".to_string()))
        }
    }
}

/// Load the catalog file, or fall back to the built-in catalog.
fn load_catalog(config: &Config) -> Result<Catalog> {
    match config.data.catalog {
        Some(ref path) => {
            let catalog = data::load_catalog(Path::new(path))
                .with_context(|| format!("Failed to load catalog {}", path))?;
            if catalog.is_empty() {
                warn!("Catalog {} has no questions; every attempt will be unknown", path);
            } else {
                info!("Loaded {} questions from {}", catalog.len(), path);
            }
            Ok(catalog)
        }
        None => {
            debug!("Using built-in catalog");
            Ok(data::default_catalog())
        }
    }
}

/// `--log` wins; otherwise `<data_dir>/<user>.csv`.
fn resolve_log_path(args: &Args, config: &Config) -> PathBuf {
    match args.log {
        Some(ref path) => path.clone(),
        None => data::user_log_path(Path::new(&config.data.data_dir), &config.general.user),
    }
}

fn display_name(args: &Args, config: &Config) -> String {
    args.log
        .as_ref()
        .and_then(|p| p.file_stem())
        .and_then(|s| s.to_str())
        .map(String::from)
        .unwrap_or_else(|| config.general.user.clone())
}

/// Pick the analysis window.
///
/// Explicit bounds win, then `--all`, then the configured number of days
/// ending at the latest record.
fn resolve_range(args: &Args, config: &Config, attempts: &[AttemptRecord]) -> DateRange {
    if args.from.is_some() || args.to.is_some() {
        return DateRange::new(args.from, args.to);
    }
    if args.all || config.analysis.window_days == 0 {
        return DateRange::default();
    }

    match attempts.iter().map(|r| r.date).max() {
        Some(latest) => DateRange::trailing(latest, config.analysis.window_days),
        None => DateRange::default(),
    }
}

/// Swap a Markdown extension for `.json` when writing JSON to the default name.
fn resolve_output_path(output: &str, format: OutputFormat) -> PathBuf {
    let path = PathBuf::from(output);
    match format {
        OutputFormat::Json if path.extension().is_some_and(|e| e == "md") => {
            path.with_extension("json")
        }
        _ => path,
    }
}
