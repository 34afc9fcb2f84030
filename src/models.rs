//! Data models for the practice tracker.
//!
//! This module contains the core records (attempts and catalog entries)
//! and the result structures that make up a dashboard report.

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Unit name used for attempts whose question id is not in the catalog.
pub const UNKNOWN_UNIT: &str = "unknown";

/// Difficulty level of a catalog question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// 低 - foundation problems
    Low,
    /// 中 - standard problems
    Medium,
    /// 高 - advanced problems
    High,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Low => write!(f, "Low"),
            Difficulty::Medium => write!(f, "Medium"),
            Difficulty::High => write!(f, "High"),
        }
    }
}

impl Difficulty {
    /// All levels, easiest first.
    pub const ALL: [Difficulty; 3] = [Difficulty::Low, Difficulty::Medium, Difficulty::High];

    /// Returns the symbol used in catalog CSV files.
    pub fn symbol(&self) -> &'static str {
        match self {
            Difficulty::Low => "低",
            Difficulty::Medium => "中",
            Difficulty::High => "高",
        }
    }

    /// Parses a CSV symbol or an English name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "低" | "low" | "easy" => Some(Difficulty::Low),
            "中" | "medium" | "mid" | "normal" => Some(Difficulty::Medium),
            "高" | "high" | "hard" => Some(Difficulty::High),
            _ => None,
        }
    }
}

/// How strictly target times are applied when judging overruns.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum TimePolicy {
    /// Target time as listed in the catalog
    #[default]
    Standard,
    /// Target time reduced by 10%
    Strict,
    /// Target time extended by 10%
    Lenient,
}

impl TimePolicy {
    /// Multiplier applied to every catalog target time.
    pub fn factor(&self) -> f64 {
        match self {
            TimePolicy::Standard => 1.0,
            TimePolicy::Strict => 0.9,
            TimePolicy::Lenient => 1.1,
        }
    }
}

impl fmt::Display for TimePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimePolicy::Standard => write!(f, "standard"),
            TimePolicy::Strict => write!(f, "strict (-10%)"),
            TimePolicy::Lenient => write!(f, "lenient (+10%)"),
        }
    }
}

/// One recorded solving of a single question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// Day the question was solved.
    pub date: NaiveDate,
    /// Catalog question id (may not resolve).
    pub question_id: String,
    /// Whether the answer was correct.
    pub correct: bool,
    /// Time spent answering, in seconds.
    pub response_time_seconds: f64,
    /// Why the answer was wrong. Always `None` for correct answers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_cause: Option<String>,
    /// Time spent reviewing the item, in minutes.
    pub study_minutes: f64,
}

/// Catalog entry describing one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionMeta {
    pub question_id: String,
    pub subject: String,
    pub genre: String,
    pub unit: String,
    pub target_time_seconds: f64,
    pub target_accuracy_pct: f64,
    pub difficulty: Difficulty,
    /// Frequency weight; higher means the unit shows up more on the test.
    pub weight: u32,
}

/// Question catalog indexed by id, preserving file order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<QuestionMeta>,
    index: HashMap<String, usize>,
}

impl Catalog {
    /// Builds a catalog, rejecting duplicate ids.
    ///
    /// On a duplicate, returns the offending id.
    pub fn new(entries: Vec<QuestionMeta>) -> Result<Self, String> {
        let mut index = HashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            if index.insert(entry.question_id.clone(), i).is_some() {
                return Err(entry.question_id.clone());
            }
        }
        Ok(Self { entries, index })
    }

    /// Looks up a question by id.
    pub fn get(&self, question_id: &str) -> Option<&QuestionMeta> {
        self.index.get(question_id).map(|&i| &self.entries[i])
    }

    pub fn entries(&self) -> &[QuestionMeta] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Inclusive date window; open bounds match everything on that side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    /// The `days` calendar days ending at `end`, inclusive.
    pub fn trailing(end: NaiveDate, days: u32) -> Self {
        let back = u64::from(days.saturating_sub(1));
        Self {
            start: end.checked_sub_days(Days::new(back)),
            end: Some(end),
        }
    }

    /// Returns true if `date` lies within the window.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |s| date >= s) && self.end.map_or(true, |e| date <= e)
    }

    /// Copies the records that fall within the window.
    pub fn filter(&self, records: &[AttemptRecord]) -> Vec<AttemptRecord> {
        records
            .iter()
            .filter(|r| self.contains(r.date))
            .cloned()
            .collect()
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fmt_bound = |d: Option<NaiveDate>| {
            d.map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "…".to_string())
        };
        write!(f, "{} to {}", fmt_bound(self.start), fmt_bound(self.end))
    }
}

/// Aggregated statistics for one unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitStats {
    pub unit: String,
    pub attempts: usize,
    pub correct: usize,
    pub accuracy: f64,
    pub avg_response_seconds: f64,
    /// Mean catalog target time; `None` for the unknown unit.
    pub avg_target_seconds: Option<f64>,
    /// Highest catalog weight among the unit's questions; 0 when unknown.
    pub weight: u32,
}

/// Accuracy rollup for one genre.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenreStats {
    pub attempts: usize,
    pub accuracy: f64,
}

/// Consecutive-day study streak.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyStreak {
    /// Length of the run ending at the latest studied day.
    pub current: u32,
    /// Whether the latest studied day is today or yesterday.
    pub active: bool,
    /// Longest run ever recorded.
    pub longest: u32,
}

/// Projection of when the target accuracy will be reached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Forecast {
    /// Fewer than three daily points.
    InsufficientData,
    /// Accuracy has not changed day to day.
    Flat,
    /// Current accuracy already meets the target.
    Achieved,
    /// The trend line is flat or falling.
    NotImproving,
    /// The trend line has already crossed the target.
    Imminent,
    /// More than a year away at the current pace.
    BeyondYear,
    /// Projected date the target is reached.
    OnTrack { date: NaiveDate, days: u32 },
}

impl fmt::Display for Forecast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Forecast::InsufficientData => write!(f, "Not enough data (need 3+ study days)"),
            Forecast::Flat => write!(f, "No change in accuracy yet"),
            Forecast::Achieved => write!(f, "Target achieved"),
            Forecast::NotImproving => write!(f, "No improvement trend; revisit study method"),
            Forecast::Imminent => write!(f, "Almost there"),
            Forecast::BeyondYear => write!(f, "Over a year away; pace needs to increase"),
            Forecast::OnTrack { date, days } => {
                write!(f, "Expected by {} ({} days)", date.format("%Y/%m/%d"), days)
            }
        }
    }
}

/// Summary of the last seven days of study.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeeklySummary {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub study_days: usize,
    pub attempts: usize,
    pub study_minutes: f64,
    pub accuracy: f64,
    /// Most practiced unit and its attempt count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_unit: Option<(String, usize)>,
}

/// Progress state of one difficulty tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoadmapStatus {
    NotStarted,
    InProgress,
    Complete,
}

impl fmt::Display for RoadmapStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoadmapStatus::NotStarted => write!(f, "Not started"),
            RoadmapStatus::InProgress => write!(f, "In progress"),
            RoadmapStatus::Complete => write!(f, "Complete"),
        }
    }
}

/// Study phase derived from the difficulty roadmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudyPhase {
    Foundation,
    Standard,
    Advanced,
}

impl fmt::Display for StudyPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StudyPhase::Foundation => write!(f, "Foundation (基礎固め)"),
            StudyPhase::Standard => write!(f, "Standard practice (標準演習)"),
            StudyPhase::Advanced => write!(f, "Advanced practice (応用演習)"),
        }
    }
}

/// Coverage and accuracy for one difficulty tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyProgress {
    pub difficulty: Difficulty,
    /// Distinct catalog questions attempted at least once.
    pub solved: usize,
    /// Catalog questions at this difficulty.
    pub total: usize,
    /// `solved / total` as a percentage.
    pub coverage_pct: f64,
    pub accuracy: f64,
    pub attempts: usize,
    pub status: RoadmapStatus,
}

/// Difficulty-ordered roadmap with the current phase and next steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Roadmap {
    pub tiers: Vec<DifficultyProgress>,
    pub phase: StudyPhase,
    pub next_steps: Vec<String>,
}

/// Why a unit was placed in the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanReason {
    /// Due on the forgetting curve.
    Review,
    /// Among the weakest units.
    Weakness,
}

impl fmt::Display for PlanReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanReason::Review => write!(f, "review"),
            PlanReason::Weakness => write!(f, "weak point"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanItem {
    pub unit: String,
    pub reason: PlanReason,
}

/// Units scheduled for a single day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanDay {
    pub date: NaiveDate,
    pub items: Vec<PlanItem>,
    pub minutes: u32,
}

/// Topic of a detailed insight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightCategory {
    Weakness,
    Pace,
    Growth,
    TimeManagement,
}

impl fmt::Display for InsightCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InsightCategory::Weakness => write!(f, "Weak point"),
            InsightCategory::Pace => write!(f, "Exam pace"),
            InsightCategory::Growth => write!(f, "Growth"),
            InsightCategory::TimeManagement => write!(f, "Time management"),
        }
    }
}

/// How urgently an insight should be acted on. Most urgent sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightPriority {
    Urgent,
    High,
    Medium,
    Low,
}

impl InsightPriority {
    /// Returns an emoji marker for the priority.
    pub fn emoji(&self) -> &'static str {
        match self {
            InsightPriority::Urgent => "🔴",
            InsightPriority::High => "🟠",
            InsightPriority::Medium => "🟡",
            InsightPriority::Low => "🟢",
        }
    }
}

/// One data-driven observation about the study log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub category: InsightCategory,
    pub priority: InsightPriority,
    pub message: String,
}

/// Achievement earned from the study log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "badge", rename_all = "snake_case")]
pub enum Badge {
    /// Ten or more attempts.
    Beginner,
    /// Latest run of consecutive study days.
    Streak { days: u32, active: bool },
    /// Five or more attempts in a genre at 80% accuracy or better.
    GenreMaster { genre: String },
    /// Fast and accurate: average time within 80% of target.
    Speedster,
}

impl fmt::Display for Badge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Badge::Beginner => write!(f, "🥚 Beginner (10+ questions)"),
            Badge::Streak { days, active: true } => write!(f, "🔥 {}-day streak", days),
            Badge::Streak { days, active: false } => write!(f, "🕒 Last streak: {} day(s)", days),
            Badge::GenreMaster { genre } => write!(f, "🏆 {} master", genre),
            Badge::Speedster => write!(f, "⚡ Speedster"),
        }
    }
}

/// Headline numbers shown at the top of the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Kpis {
    pub attempts: usize,
    pub accuracy: f64,
    pub target_accuracy: f64,
    pub overrun_rate: f64,
    pub study_minutes: f64,
    pub unknown_questions: usize,
}

impl Kpis {
    /// Returns true if accuracy meets the target.
    pub fn target_met(&self) -> bool {
        self.attempts > 0 && self.accuracy >= self.target_accuracy
    }
}

/// Metadata about the generated report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Display name of the student.
    pub user: String,
    pub generated_at: DateTime<Utc>,
    /// Reference day used for streaks, weekly numbers and forecasts.
    pub today: NaiveDate,
    pub range: DateRange,
    pub time_policy: TimePolicy,
    pub catalog_size: usize,
    /// Records in the log before date filtering.
    pub total_records: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exam_date: Option<NaiveDate>,
}

/// The complete dashboard report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dashboard {
    pub metadata: ReportMetadata,
    pub kpis: Kpis,
    pub daily_trend: Vec<(NaiveDate, f64)>,
    pub priority_units: Vec<(String, f64)>,
    pub unit_stats: Vec<UnitStats>,
    pub error_causes: BTreeMap<String, usize>,
    pub subjects: BTreeMap<String, f64>,
    pub genres: BTreeMap<String, GenreStats>,
    pub streak: StudyStreak,
    pub forecast: Forecast,
    pub weekly: WeeklySummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roadmap: Option<Roadmap>,
    pub plan: Vec<PlanDay>,
    pub advice: Vec<String>,
    pub insights: Vec<Insight>,
    pub badges: Vec<Badge>,
}
