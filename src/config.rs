//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.aptitrack.toml` files.

use crate::models::TimePolicy;
use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name.
pub const CONFIG_FILE: &str = ".aptitrack.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Study goals.
    #[serde(default)]
    pub goals: GoalsConfig,

    /// Analysis settings.
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Data file locations.
    #[serde(default)]
    pub data: DataConfig,

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

    /// User whose log is analyzed when none is given.
    #[serde(default = "default_user")]
    pub user: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
            user: default_user(),
        }
    }
}

fn default_output() -> String {
    "aptitrack_report.md".to_string()
}

fn default_user() -> String {
    "default".to_string()
}

/// Study goals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalsConfig {
    /// Target accuracy in percent.
    #[serde(default = "default_target_accuracy")]
    pub target_accuracy_pct: f64,

    /// How strictly target times are applied.
    #[serde(default)]
    pub time_policy: TimePolicy,

    /// Minutes available per day for the study plan.
    #[serde(default = "default_daily_minutes")]
    pub daily_study_minutes: u32,

    /// Exam date, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exam_date: Option<NaiveDate>,
}

impl Default for GoalsConfig {
    fn default() -> Self {
        Self {
            target_accuracy_pct: default_target_accuracy(),
            time_policy: TimePolicy::default(),
            daily_study_minutes: default_daily_minutes(),
            exam_date: None,
        }
    }
}

fn default_target_accuracy() -> f64 {
    80.0
}

fn default_daily_minutes() -> u32 {
    60
}

/// Analysis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Days up to the latest record analyzed by default (0 = whole log).
    #[serde(default = "default_window_days")]
    pub window_days: u32,

    /// Number of priority units to list.
    #[serde(default = "default_top_units")]
    pub top_units: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            window_days: default_window_days(),
            top_units: default_top_units(),
        }
    }
}

fn default_window_days() -> u32 {
    7
}

fn default_top_units() -> usize {
    5
}

/// Data file locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory holding one attempt log per user.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Catalog CSV; the built-in catalog is used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<String>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            catalog: None,
        }
    }
}

fn default_data_dir() -> String {
    "user_data".to_string()
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Include the per-unit statistics table.
    #[serde(default = "default_true")]
    pub include_unit_table: bool,

    /// Include the daily accuracy table.
    #[serde(default = "default_true")]
    pub include_trend: bool,

    /// Include the difficulty roadmap.
    #[serde(default = "default_true")]
    pub include_roadmap: bool,

    /// Include the weekly study plan.
    #[serde(default = "default_true")]
    pub include_plan: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            include_unit_table: true,
            include_trend: true,
            include_roadmap: true,
            include_plan: true,
        }
    }
}

fn default_true() -> bool {
    true
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
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref user) = args.user {
            self.general.user = user.clone();
        }
        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }

        // Goals
        if let Some(rate) = args.target_rate {
            self.goals.target_accuracy_pct = rate;
        }
        if let Some(policy) = args.time_policy {
            self.goals.time_policy = policy;
        }
        if let Some(minutes) = args.daily_minutes {
            self.goals.daily_study_minutes = minutes;
        }
        if args.exam_date.is_some() {
            self.goals.exam_date = args.exam_date;
        }

        // Analysis
        if let Some(days) = args.days {
            self.analysis.window_days = days;
        }
        if let Some(top) = args.top {
            self.analysis.top_units = top;
        }

        // Data locations
        if let Some(ref dir) = args.data_dir {
            self.data.data_dir = dir.display().to_string();
        }
        if let Some(ref catalog) = args.catalog {
            self.data.catalog = Some(catalog.display().to_string());
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Check values that the CLI cannot reject up front.
    pub fn validate(&self) -> Result<()> {
        let target_pct = self.goals.target_accuracy_pct;
        if !(0.0..=100.0).contains(&target_pct) {
            bail!("target_accuracy_pct must be between 0 and 100, got {}", target_pct);
        }
        if self.analysis.top_units == 0 {
            bail!("analysis.top_units must be at least 1");
        }
        Ok(())
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
    use crate::cli::Args;
    use clap::Parser;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.output, "aptitrack_report.md");
        assert_eq!(config.goals.target_accuracy_pct, 80.0);
        assert_eq!(config.goals.daily_study_minutes, 60);
        assert_eq!(config.analysis.window_days, 7);
        assert_eq!(config.data.data_dir, "user_data");
        assert!(config.data.catalog.is_none());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
output = "weekly.md"
user = "hanako"

[goals]
target_accuracy_pct = 75
time_policy = "strict"
exam_date = "2026-12-01"

[analysis]
top_units = 3
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.output, "weekly.md");
        assert_eq!(config.general.user, "hanako");
        assert_eq!(config.goals.target_accuracy_pct, 75.0);
        assert_eq!(config.goals.time_policy, TimePolicy::Strict);
        assert_eq!(
            config.goals.exam_date,
            NaiveDate::from_ymd_opt(2026, 12, 1)
        );
        assert_eq!(config.analysis.top_units, 3);
        assert_eq!(config.analysis.window_days, 7);
        assert!(config.report.include_plan);
    }

    #[test]
    fn test_merge_with_args() {
        let mut config = Config::default();
        config.goals.target_accuracy_pct = 70.0;
        config.analysis.top_units = 8;

        let args = Args::try_parse_from([
            "aptitrack",
            "--user",
            "taro",
            "--target-rate",
            "90",
            "--time-policy",
            "lenient",
        ])
        .unwrap();
        config.merge_with_args(&args);

        assert_eq!(config.general.user, "taro");
        assert_eq!(config.goals.target_accuracy_pct, 90.0);
        assert_eq!(config.goals.time_policy, TimePolicy::Lenient);
        // Not given on the command line, so the file value stays.
        assert_eq!(config.analysis.top_units, 8);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[goals]"));
        assert!(toml_str.contains("[data]"));

        let reparsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(reparsed.analysis.top_units, 5);
    }

    #[test]
    fn test_validate_rejects_bad_file_values() {
        assert!(Config::default().validate().is_ok());

        let config: Config = toml::from_str("[analysis]\ntop_units = 0\n").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("top_units"));

        let config: Config = toml::from_str("[goals]\ntarget_accuracy_pct = 120\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_verbose_from_file() {
        let config: Config = toml::from_str("[general]\nverbose = true\n").unwrap();
        assert!(config.general.verbose);

        let args = Args::try_parse_from(["aptitrack"]).unwrap();
        assert_eq!(args.log_level(config.general.verbose), tracing::Level::DEBUG);
    }
}
