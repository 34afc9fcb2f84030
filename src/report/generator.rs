//! Markdown report generation.
//!
//! This module renders a [`Dashboard`] as a Markdown document or as JSON.
//! Chart-style series (daily trend, subject and genre rollups) are emitted
//! as tables.

use crate::config::ReportConfig;
use crate::models::{
    Badge, Dashboard, Forecast, Insight, Kpis, PlanDay, ReportMetadata, Roadmap, RoadmapStatus,
    StudyStreak, UnitStats, WeeklySummary,
};
use anyhow::Result;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(dashboard: &Dashboard, sections: &ReportConfig) -> String {
    let mut output = String::new();

    // Title
    output.push_str(&format!(
        "# aptitrack Dashboard: {}\n\n",
        dashboard.metadata.user
    ));

    output.push_str(&generate_metadata_section(&dashboard.metadata));
    output.push_str(&generate_summary_section(&dashboard.kpis));
    output.push_str(&generate_badge_section(&dashboard.badges));
    output.push_str(&generate_advice_section(&dashboard.advice));
    output.push_str(&generate_insight_section(&dashboard.insights));

    if sections.include_trend {
        output.push_str(&generate_trend_section(&dashboard.daily_trend));
    }

    output.push_str(&generate_priority_section(&dashboard.priority_units));

    if sections.include_unit_table {
        output.push_str(&generate_unit_table(&dashboard.unit_stats));
    }

    output.push_str(&generate_cause_section(dashboard));
    output.push_str(&generate_rollup_section(dashboard));
    output.push_str(&generate_progress_section(
        &dashboard.streak,
        &dashboard.forecast,
        &dashboard.weekly,
    ));

    if sections.include_roadmap {
        if let Some(ref roadmap) = dashboard.roadmap {
            output.push_str(&generate_roadmap_section(roadmap));
        }
    }

    if sections.include_plan {
        output.push_str(&generate_plan_section(&dashboard.plan));
    }

    output.push_str(&generate_footer());

    output
}

fn pct(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

/// Escapes characters that would break a table cell.
fn cell(text: &str) -> String {
    text.replace('|', "\\|")
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **User:** {}\n", metadata.user));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Period:** {}\n", metadata.range));
    section.push_str(&format!(
        "- **Reference Day:** {}\n",
        metadata.today.format("%Y-%m-%d")
    ));
    section.push_str(&format!("- **Time Policy:** {}\n", metadata.time_policy));
    section.push_str(&format!(
        "- **Catalog Questions:** {}\n",
        metadata.catalog_size
    ));
    section.push_str(&format!("- **Logged Attempts:** {}\n", metadata.total_records));
    if let Some(exam) = metadata.exam_date {
        section.push_str(&format!("- **Exam Date:** {}\n", exam.format("%Y-%m-%d")));
    }
    section.push('\n');

    section
}

/// Generate the KPI summary section.
fn generate_summary_section(kpis: &Kpis) -> String {
    let mut section = String::new();

    section.push_str("## Summary\n\n");

    if kpis.attempts == 0 {
        section.push_str("No attempts recorded in this period.\n\n");
        return section;
    }

    section.push_str("| Accuracy | Target | Time Overrun | Study Time | Attempts |\n");
    section.push_str("|:---:|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| **{}** | {} | {} | {:.0} min | {} |\n\n",
        pct(kpis.accuracy),
        pct(kpis.target_accuracy),
        pct(kpis.overrun_rate),
        kpis.study_minutes,
        kpis.attempts
    ));

    if kpis.target_met() {
        section.push_str("✅ Target accuracy reached.\n\n");
    } else {
        section.push_str(&format!(
            "⚠️ {:.1} points below target.\n\n",
            (kpis.target_accuracy - kpis.accuracy) * 100.0
        ));
    }

    if kpis.unknown_questions > 0 {
        section.push_str(&format!(
            "> {} attempt(s) reference questions missing from the catalog; \
             they count toward accuracy but not toward time metrics.\n\n",
            kpis.unknown_questions
        ));
    }

    section
}

/// Generate the coaching advice section.
fn generate_advice_section(advice: &[String]) -> String {
    if advice.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Advice\n\n");
    for line in advice {
        section.push_str(&format!("- {}\n", line));
    }
    section.push('\n');

    section
}

/// Generate the achievements line.
fn generate_badge_section(badges: &[Badge]) -> String {
    if badges.is_empty() {
        return String::new();
    }

    let labels: Vec<String> = badges.iter().map(|b| format!("`{}`", b)).collect();
    format!("## Achievements\n\n{}\n\n", labels.join(" "))
}

/// Generate the detailed insights section.
fn generate_insight_section(insights: &[Insight]) -> String {
    if insights.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Insights\n\n");
    for insight in insights {
        section.push_str(&format!(
            "- {} **{}:** {}\n",
            insight.priority.emoji(),
            insight.category,
            insight.message
        ));
    }
    section.push('\n');

    section
}

/// Generate the daily accuracy table.
fn generate_trend_section(trend: &[(chrono::NaiveDate, f64)]) -> String {
    if trend.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Daily Accuracy\n\n");
    section.push_str("| Date | Accuracy |\n");
    section.push_str("|:---|:---:|\n");
    for (date, accuracy) in trend {
        section.push_str(&format!(
            "| {} | {} |\n",
            date.format("%Y-%m-%d"),
            pct(*accuracy)
        ));
    }
    section.push('\n');

    section
}

/// Generate the priority units section.
fn generate_priority_section(priorities: &[(String, f64)]) -> String {
    let mut section = String::new();

    section.push_str("## Priority Units\n\n");

    if priorities.is_empty() {
        section.push_str("No units to prioritize yet.\n\n");
        return section;
    }

    section.push_str("| # | Unit | Score |\n");
    section.push_str("|:---:|:---|:---:|\n");
    for (i, (unit, score)) in priorities.iter().enumerate() {
        section.push_str(&format!("| {} | {} | {:.2} |\n", i + 1, cell(unit), score));
    }
    section.push('\n');

    section
}

/// Generate the per-unit statistics table.
fn generate_unit_table(stats: &[UnitStats]) -> String {
    if stats.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Unit Statistics\n\n");
    section.push_str("| Unit | Attempts | Accuracy | Avg Time | Target Time | Weight |\n");
    section.push_str("|:---|:---:|:---:|:---:|:---:|:---:|\n");

    let mut rows: Vec<_> = stats.iter().collect();
    rows.sort_by(|a, b| {
        a.accuracy
            .total_cmp(&b.accuracy)
            .then_with(|| a.unit.cmp(&b.unit))
    });

    for s in rows {
        let target = s
            .avg_target_seconds
            .map(|t| format!("{:.0}s", t))
            .unwrap_or_else(|| "-".to_string());
        section.push_str(&format!(
            "| {} | {} | {} | {:.0}s | {} | {} |\n",
            cell(&s.unit),
            s.attempts,
            pct(s.accuracy),
            s.avg_response_seconds,
            target,
            s.weight
        ));
    }
    section.push('\n');

    section
}

/// Generate the error cause breakdown.
fn generate_cause_section(dashboard: &Dashboard) -> String {
    if dashboard.error_causes.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Error Causes\n\n");
    section.push_str("| Cause | Count |\n");
    section.push_str("|:---|:---:|\n");

    let mut causes: Vec<_> = dashboard.error_causes.iter().collect();
    causes.sort_by_key(|(_, count)| std::cmp::Reverse(**count));

    for (cause, count) in causes {
        section.push_str(&format!("| {} | {} |\n", cell(cause), count));
    }
    section.push('\n');

    section
}

/// Generate the subject and genre rollups.
fn generate_rollup_section(dashboard: &Dashboard) -> String {
    if dashboard.kpis.attempts == 0 {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Subjects\n\n");
    section.push_str("| Subject | Accuracy |\n");
    section.push_str("|:---|:---:|\n");
    for (subject, accuracy) in &dashboard.subjects {
        section.push_str(&format!("| {} | {} |\n", cell(subject), pct(*accuracy)));
    }
    section.push('\n');

    if !dashboard.genres.is_empty() {
        section.push_str("### Genres\n\n");
        section.push_str("| Genre | Attempts | Accuracy |\n");
        section.push_str("|:---|:---:|:---:|\n");
        for (genre, stats) in &dashboard.genres {
            section.push_str(&format!(
                "| {} | {} | {} |\n",
                cell(genre),
                stats.attempts,
                pct(stats.accuracy)
            ));
        }
        section.push('\n');
    }

    section
}

/// Generate the streak, forecast and weekly summary section.
fn generate_progress_section(
    streak: &StudyStreak,
    forecast: &Forecast,
    weekly: &WeeklySummary,
) -> String {
    let mut section = String::new();

    section.push_str("## Progress\n\n");

    let streak_note = if streak.active { "" } else { " (broken)" };
    section.push_str(&format!(
        "- **Study Streak:** {} day(s){} | longest {} day(s)\n",
        streak.current, streak_note, streak.longest
    ));
    section.push_str(&format!("- **Target Forecast:** {}\n\n", forecast));

    section.push_str("### Last 7 Days\n\n");
    if weekly.attempts == 0 {
        section.push_str("No study in the last 7 days.\n\n");
        return section;
    }

    if let (Some(start), Some(end)) = (weekly.start, weekly.end) {
        section.push_str(&format!(
            "*{} to {}*\n\n",
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d")
        ));
    }
    section.push_str(&format!("- **Study Days:** {}\n", weekly.study_days));
    section.push_str(&format!("- **Attempts:** {}\n", weekly.attempts));
    section.push_str(&format!("- **Accuracy:** {}\n", pct(weekly.accuracy)));
    section.push_str(&format!("- **Study Time:** {:.0} min\n", weekly.study_minutes));
    if let Some((ref unit, count)) = weekly.top_unit {
        section.push_str(&format!("- **Most Practiced:** {} ({})\n", unit, count));
    }
    section.push('\n');

    section
}

/// Generate the difficulty roadmap section.
fn generate_roadmap_section(roadmap: &Roadmap) -> String {
    let mut section = String::new();

    section.push_str("## Difficulty Roadmap\n\n");
    section.push_str(&format!("**Current Phase:** {}\n\n", roadmap.phase));

    section.push_str("| Difficulty | Coverage | Accuracy | Status |\n");
    section.push_str("|:---|:---:|:---:|:---|\n");
    for tier in &roadmap.tiers {
        let badge = match tier.status {
            RoadmapStatus::Complete => "✅",
            RoadmapStatus::InProgress => "🔄",
            RoadmapStatus::NotStarted => "⬜",
        };
        let accuracy = if tier.attempts == 0 {
            "-".to_string()
        } else {
            pct(tier.accuracy)
        };
        section.push_str(&format!(
            "| {} {} | {}/{} ({:.0}%) | {} | {} {} |\n",
            tier.difficulty.symbol(),
            tier.difficulty,
            tier.solved,
            tier.total,
            tier.coverage_pct,
            accuracy,
            badge,
            tier.status
        ));
    }
    section.push('\n');

    if !roadmap.next_steps.is_empty() {
        section.push_str("**Next Steps:**\n\n");
        for step in &roadmap.next_steps {
            section.push_str(&format!("- {}\n", step));
        }
        section.push('\n');
    }

    section
}

/// Generate the study plan section.
fn generate_plan_section(plan: &[PlanDay]) -> String {
    let mut section = String::new();

    section.push_str("## Study Plan\n\n");

    if plan.is_empty() {
        section.push_str("Nothing to schedule yet.\n\n");
        return section;
    }

    section.push_str("| Date | Units | Minutes |\n");
    section.push_str("|:---|:---|:---:|\n");
    for day in plan {
        let units = day
            .items
            .iter()
            .map(|item| format!("{} ({})", cell(&item.unit), item.reason))
            .collect::<Vec<_>>()
            .join(", ");
        section.push_str(&format!(
            "| {} | {} | {} |\n",
            day.date.format("%m/%d (%a)"),
            units,
            day.minutes
        ));
    }
    section.push('\n');

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!(
        "*Report generated by aptitrack v{}*\n",
        env!("CARGO_PKG_VERSION")
    ));

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(dashboard: &Dashboard) -> Result<String> {
    serde_json::to_string_pretty(dashboard).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{build_dashboard, AnalysisOptions};
    use crate::data::seed::default_catalog;
    use crate::models::{AttemptRecord, DateRange, TimePolicy};
    use chrono::NaiveDate;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn attempt(day: &str, id: &str, correct: bool, secs: f64, cause: Option<&str>) -> AttemptRecord {
        AttemptRecord {
            date: date(day),
            question_id: id.to_string(),
            correct,
            response_time_seconds: secs,
            error_cause: cause.map(String::from),
            study_minutes: 10.0,
        }
    }

    fn create_test_dashboard(records: &[AttemptRecord]) -> Dashboard {
        let options = AnalysisOptions {
            user: "hanako".to_string(),
            range: DateRange::default(),
            target_accuracy: 0.8,
            time_policy: TimePolicy::Standard,
            top_units: 5,
            today: date("2026-10-05"),
            exam_date: None,
            daily_minutes: 60,
        };
        build_dashboard(records, &default_catalog(), &options)
    }

    fn sample_records() -> Vec<AttemptRecord> {
        vec![
            attempt("2026-10-03", "N-A01", true, 110.0, None),
            attempt("2026-10-04", "N-A02", false, 120.0, Some("時間不足")),
            attempt("2026-10-05", "N-B02", false, 90.0, Some("計算ミス")),
            attempt("2026-10-05", "L-A01", true, 12.0, None),
        ]
    }

    #[test]
    fn test_generate_markdown_report() {
        let dashboard = create_test_dashboard(&sample_records());
        let markdown = generate_markdown_report(&dashboard, &ReportConfig::default());

        assert!(markdown.contains("# aptitrack Dashboard: hanako"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("## Summary"));
        assert!(markdown.contains("| **50.0%** | 80.0% |"));
        assert!(markdown.contains("## Priority Units"));
        assert!(markdown.contains("## Error Causes"));
        assert!(markdown.contains("時間不足"));
        assert!(markdown.contains("## Difficulty Roadmap"));
        assert!(markdown.contains("## Study Plan"));
    }

    #[test]
    fn test_sections_can_be_disabled() {
        let dashboard = create_test_dashboard(&sample_records());
        let sections = ReportConfig {
            include_unit_table: false,
            include_trend: false,
            include_roadmap: false,
            include_plan: false,
        };
        let markdown = generate_markdown_report(&dashboard, &sections);

        assert!(!markdown.contains("## Unit Statistics"));
        assert!(!markdown.contains("## Daily Accuracy"));
        assert!(!markdown.contains("## Difficulty Roadmap"));
        assert!(!markdown.contains("## Study Plan"));
        assert!(markdown.contains("## Priority Units"));
    }

    #[test]
    fn test_empty_dashboard() {
        let dashboard = create_test_dashboard(&[]);
        let markdown = generate_markdown_report(&dashboard, &ReportConfig::default());

        assert!(markdown.contains("No attempts recorded in this period."));
        assert!(markdown.contains("No units to prioritize yet."));
        assert!(!markdown.contains("## Error Causes"));
        assert!(!markdown.contains("## Subjects"));
    }

    #[test]
    fn test_generate_metadata_section() {
        let mut dashboard = create_test_dashboard(&sample_records());
        dashboard.metadata.exam_date = Some(date("2026-11-01"));

        let section = generate_metadata_section(&dashboard.metadata);

        assert!(section.contains("hanako"));
        assert!(section.contains("- **Catalog Questions:** 30"));
        assert!(section.contains("- **Exam Date:** 2026-11-01"));
    }

    #[test]
    fn test_insights_and_badges_sections() {
        let mut records = Vec::new();
        for day in ["2026-10-01", "2026-10-02", "2026-10-03", "2026-10-04", "2026-10-05"] {
            records.push(attempt(day, "N-B01", true, 40.0, None));
            records.push(attempt(day, "N-A03", false, 200.0, Some("時間不足")));
        }
        let dashboard = create_test_dashboard(&records);
        let markdown = generate_markdown_report(&dashboard, &ReportConfig::default());

        assert!(markdown.contains("## Achievements"));
        assert!(markdown.contains("`🥚 Beginner (10+ questions)`"));
        assert!(markdown.contains("`🔥 5-day streak`"));
        assert!(markdown.contains("## Insights"));
        assert!(markdown.contains("🟠 **Weak point:** 「対戦・リーグ戦の推論」"));

        let empty = create_test_dashboard(&[]);
        let markdown = generate_markdown_report(&empty, &ReportConfig::default());
        assert!(!markdown.contains("## Achievements"));
        assert!(!markdown.contains("## Insights"));
    }

    #[test]
    fn test_plan_section_with_small_budget() {
        let records = vec![attempt("2026-10-04", "N-A03", false, 200.0, None)];
        let options = AnalysisOptions {
            user: "hanako".to_string(),
            range: DateRange::default(),
            target_accuracy: 0.8,
            time_policy: TimePolicy::Standard,
            top_units: 5,
            today: date("2026-10-05"),
            exam_date: None,
            daily_minutes: 10,
        };
        let dashboard = build_dashboard(&records, &default_catalog(), &options);
        assert!(dashboard.plan.is_empty());

        let markdown = generate_plan_section(&dashboard.plan);
        assert!(markdown.contains("Nothing to schedule yet."));
        assert!(!markdown.contains("| Date |"));
    }

    #[test]
    fn test_table_cells_escape_pipes() {
        let section = generate_priority_section(&[("A|B".to_string(), 1.5)]);
        assert!(section.contains("| 1 | A\\|B | 1.50 |"));
    }

    #[test]
    fn test_generate_json_report() {
        let dashboard = create_test_dashboard(&sample_records());
        let json = generate_json_report(&dashboard).unwrap();

        assert!(json.contains("\"kpis\""));
        assert!(json.contains("\"priority_units\""));
        assert!(json.contains("\"status\""));

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["kpis"]["attempts"], 4);
    }
}
