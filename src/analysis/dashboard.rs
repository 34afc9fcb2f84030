//! Dashboard assembly.
//!
//! Window metrics (KPIs, trend, priorities, causes, rollups, forecast) use
//! only the records inside the selected date range. Streaks, the weekly
//! summary, the roadmap and the plan track long-running progress and use the
//! whole log.

use super::aggregator::{
    daily_trend, error_cause_breakdown, genre_rollup, overall_accuracy, overrun_rate,
    overrun_rate_with_factor, priority_units, subject_rollup, total_study_minutes, unit_stats,
    unresolved_count,
};
use super::insights::{
    achievement_badges, coach_advice, difficulty_roadmap, exam_pace_insight, forecast,
    study_streak, time_excess_insight, weakest_unit_insight, weekly_change_insight,
    weekly_summary,
};
use super::plan::weekly_plan;
use crate::models::{
    AttemptRecord, Catalog, Dashboard, DateRange, Kpis, ReportMetadata, TimePolicy,
};
use chrono::{NaiveDate, Utc};
use tracing::debug;

/// Inputs that shape a dashboard beyond the data itself.
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// Student name shown in the report.
    pub user: String,
    pub range: DateRange,
    /// Target accuracy as a fraction (0.8 = 80%).
    pub target_accuracy: f64,
    pub time_policy: TimePolicy,
    /// Number of priority units to list.
    pub top_units: usize,
    pub today: NaiveDate,
    pub exam_date: Option<NaiveDate>,
    /// Study time available per day for the plan.
    pub daily_minutes: u32,
}

/// Computes every dashboard section from one snapshot of the data.
pub fn build_dashboard(
    attempts: &[AttemptRecord],
    catalog: &Catalog,
    options: &AnalysisOptions,
) -> Dashboard {
    let window = options.range.filter(attempts);
    debug!(
        "Analysing {} of {} records in range {}",
        window.len(),
        attempts.len(),
        options.range
    );

    let overrun = match options.time_policy {
        TimePolicy::Standard => overrun_rate(&window, catalog),
        policy => overrun_rate_with_factor(&window, catalog, policy.factor()),
    };

    let kpis = Kpis {
        attempts: window.len(),
        accuracy: overall_accuracy(&window),
        target_accuracy: options.target_accuracy,
        overrun_rate: overrun,
        study_minutes: total_study_minutes(&window),
        unknown_questions: unresolved_count(&window, catalog),
    };

    let trend = daily_trend(&window);
    let streak = study_streak(attempts, options.today);
    let forecast = forecast(&trend, kpis.accuracy, kpis.target_accuracy, options.today);
    let advice = coach_advice(kpis.accuracy, kpis.target_accuracy, kpis.overrun_rate, &streak);

    let factor = options.time_policy.factor();
    let mut insights: Vec<_> = [
        weakest_unit_insight(&window, catalog),
        exam_pace_insight(
            kpis.accuracy,
            kpis.target_accuracy,
            options.today,
            options.exam_date,
        ),
        weekly_change_insight(attempts, options.today),
        time_excess_insight(&window, catalog, factor),
    ]
    .into_iter()
    .flatten()
    .collect();
    insights.sort_by_key(|i| i.priority);
    let badges = achievement_badges(&window, catalog, &streak, factor);

    let plan = weekly_plan(
        attempts,
        catalog,
        options.today,
        options.exam_date,
        options.daily_minutes,
    );
    debug!("Planned {} study days", plan.len());

    Dashboard {
        metadata: ReportMetadata {
            user: options.user.clone(),
            generated_at: Utc::now(),
            today: options.today,
            range: options.range,
            time_policy: options.time_policy,
            catalog_size: catalog.len(),
            total_records: attempts.len(),
            exam_date: options.exam_date,
        },
        priority_units: priority_units(&window, catalog, options.top_units),
        unit_stats: unit_stats(&window, catalog),
        error_causes: error_cause_breakdown(&window),
        subjects: subject_rollup(&window, catalog),
        genres: genre_rollup(&window, catalog),
        weekly: weekly_summary(attempts, catalog, options.today),
        roadmap: difficulty_roadmap(attempts, catalog),
        daily_trend: trend,
        kpis,
        streak,
        forecast,
        plan,
        advice,
        insights,
        badges,
    }
}
