//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::data::schema::parse_date;
use crate::models::TimePolicy;
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;

/// aptitrack - practice-test tracker for aptitude test prep
///
/// Log every solved question, then get a dashboard of accuracy, time
/// overruns, weak units and a review plan. Markdown/JSON reports.
///
/// Examples:
///   aptitrack --log attempts.csv
///   aptitrack --user hanako --days 14 --format json -o report.json
///   aptitrack --user hanako --append "2026-10-14,N-A01,〇,110,-,5"
///   aptitrack --export-catalog master.csv
///   aptitrack --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Attempt log CSV to analyze
    ///
    /// Overrides --data-dir/--user.
    #[arg(short, long, value_name = "FILE")]
    pub log: Option<PathBuf>,

    /// Directory holding one log per user (<dir>/<user>.csv)
    #[arg(long, value_name = "DIR", env = "APTITRACK_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// User whose log to use
    #[arg(short, long, value_name = "NAME", env = "APTITRACK_USER")]
    pub user: Option<String>,

    /// Question catalog CSV (defaults to the built-in 30-question catalog)
    #[arg(long, value_name = "FILE")]
    pub catalog: Option<PathBuf>,

    /// First day of the analysis window (YYYY-MM-DD)
    #[arg(long, value_name = "DATE", value_parser = parse_date_arg, conflicts_with = "all")]
    pub from: Option<NaiveDate>,

    /// Last day of the analysis window (YYYY-MM-DD)
    #[arg(long, value_name = "DATE", value_parser = parse_date_arg, conflicts_with = "all")]
    pub to: Option<NaiveDate>,

    /// Analyze the N days up to the latest record
    #[arg(long, value_name = "N", conflicts_with_all = ["from", "to", "all"])]
    pub days: Option<u32>,

    /// Analyze the whole log
    #[arg(long)]
    pub all: bool,

    /// Number of priority units to list
    #[arg(long, value_name = "N")]
    pub top: Option<usize>,

    /// Target accuracy in percent (0 - 100)
    #[arg(long, value_name = "PCT")]
    pub target_rate: Option<f64>,

    /// How strictly target times are applied
    #[arg(long, value_name = "POLICY")]
    pub time_policy: Option<TimePolicy>,

    /// Exam date; limits the study plan to the days before it
    #[arg(long, value_name = "DATE", value_parser = parse_date_arg)]
    pub exam_date: Option<NaiveDate>,

    /// Study minutes available per day for the plan
    #[arg(long, value_name = "MINUTES")]
    pub daily_minutes: Option<u32>,

    /// Reference date for streaks and plans (default: today)
    #[arg(long, value_name = "DATE", value_parser = parse_date_arg)]
    pub today: Option<NaiveDate>,

    /// Output file path for the report ("-" for stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Append one attempt to the log and exit
    ///
    /// Format: date,question_id,〇|✕,seconds[,cause[,study_minutes]]
    #[arg(long, value_name = "ROW")]
    pub append: Option<String>,

    /// Write the active catalog as CSV and exit
    #[arg(long, value_name = "FILE")]
    pub export_catalog: Option<PathBuf>,

    /// List users found in the data directory and exit
    #[arg(long)]
    pub list_users: bool,

    /// Path to configuration file
    ///
    /// If not specified, looks for .aptitrack.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .aptitrack.toml configuration file
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

fn parse_date_arg(s: &str) -> Result<NaiveDate, String> {
    parse_date(s).ok_or_else(|| format!("invalid date '{}', expected YYYY-MM-DD", s))
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

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(rate) = self.target_rate {
            if !(0.0..=100.0).contains(&rate) {
                return Err("Target rate must be between 0 and 100".to_string());
            }
        }

        if self.top == Some(0) {
            return Err("Top must be at least 1".to_string());
        }

        if self.days == Some(0) {
            return Err("Days must be at least 1".to_string());
        }

        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                return Err(format!("--from {} is after --to {}", from, to));
            }
        }

        if let Some(ref user) = self.user {
            if user.is_empty() || user.contains(['/', '\\']) {
                return Err(format!("Invalid user name: '{}'", user));
            }
        }

        if let Some(ref catalog) = self.catalog {
            if !catalog.is_file() {
                return Err(format!("Catalog file does not exist: {}", catalog.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `verbose_default` comes from the config file; `--quiet` beats it.
    pub fn log_level(&self, verbose_default: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || verbose_default {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            log: Some(PathBuf::from("attempts.csv")),
            data_dir: None,
            user: None,
            catalog: None,
            from: None,
            to: None,
            days: None,
            all: false,
            top: None,
            target_rate: None,
            time_policy: None,
            exam_date: None,
            daily_minutes: None,
            today: None,
            output: None,
            format: OutputFormat::Markdown,
            append: None,
            export_catalog: None,
            list_users: false,
            config: None,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_validation_ok() {
        assert!(make_args().validate().is_ok());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_target_rate() {
        let mut args = make_args();
        args.target_rate = Some(120.0);
        assert!(args.validate().is_err());

        args.target_rate = Some(75.0);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_date_order() {
        let mut args = make_args();
        args.from = parse_date("2026-10-10");
        args.to = parse_date("2026-10-01");
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_user_name() {
        let mut args = make_args();
        args.log = None;
        args.user = Some("../etc".to_string());
        assert!(args.validate().is_err());

        args.user = Some("hanako".to_string());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_parse_from_command_line() {
        let args = Args::try_parse_from([
            "aptitrack",
            "--user",
            "hanako",
            "--from",
            "2026/10/01",
            "--time-policy",
            "strict",
            "--format",
            "json",
        ])
        .unwrap();

        assert_eq!(args.user.as_deref(), Some("hanako"));
        assert_eq!(args.from, parse_date("2026-10-01"));
        assert_eq!(args.time_policy, Some(TimePolicy::Strict));
        assert_eq!(args.format, OutputFormat::Json);
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(false), tracing::Level::INFO);
        assert_eq!(args.log_level(true), tracing::Level::DEBUG);

        args.verbose = true;
        assert_eq!(args.log_level(false), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(true), tracing::Level::ERROR);
    }

    #[test]
    fn test_log_with_user() {
        let args = Args::try_parse_from([
            "aptitrack",
            "--log",
            "fixtures/attempts.csv",
            "--user",
            "hanako",
        ])
        .unwrap();

        assert_eq!(args.log, Some(PathBuf::from("fixtures/attempts.csv")));
        assert_eq!(args.user.as_deref(), Some("hanako"));
        assert!(args.validate().is_ok());
    }
}
