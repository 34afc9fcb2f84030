//! Seven-day review plan.
//!
//! Units come from two sources: reviews due on the forgetting curve (units
//! studied 1, 3, 7, 14 or 30 days earlier) and the weakest units by
//! priority score. Reviews are placed first; weak units fill whatever daily
//! time is left.

use super::aggregator::priority_units;
use crate::models::{AttemptRecord, Catalog, PlanDay, PlanItem, PlanReason};
use chrono::{Duration, NaiveDate};

/// Days after a study session when the unit should be reviewed.
pub const REVIEW_INTERVALS: [i64; 5] = [1, 3, 7, 14, 30];

/// Minutes budgeted for one unit.
pub const UNIT_MINUTES: u32 = 20;

/// Longest plan produced.
const PLAN_DAYS: i64 = 7;

/// Builds a day-by-day plan starting at `today`.
///
/// The plan covers seven days, or fewer if `exam_date` comes sooner. No plan
/// is produced for an empty log or an exam date in the past.
pub fn weekly_plan(
    records: &[AttemptRecord],
    catalog: &Catalog,
    today: NaiveDate,
    exam_date: Option<NaiveDate>,
    daily_minutes: u32,
) -> Vec<PlanDay> {
    if records.is_empty() {
        return Vec::new();
    }

    let horizon = match exam_date {
        Some(exam) => {
            let days_left = (exam - today).num_days();
            if days_left < 0 {
                return Vec::new();
            }
            days_left.min(PLAN_DAYS)
        }
        None => PLAN_DAYS,
    };

    let weak: Vec<String> = priority_units(records, catalog, usize::MAX)
        .into_iter()
        .map(|(unit, _)| unit)
        .collect();

    let mut plan = Vec::new();

    for offset in 0..horizon {
        let day = today + Duration::days(offset);
        let mut items: Vec<PlanItem> = Vec::new();
        let mut minutes = 0u32;

        for unit in review_units(records, catalog, day) {
            if minutes + UNIT_MINUTES > daily_minutes {
                break;
            }
            items.push(PlanItem {
                unit,
                reason: PlanReason::Review,
            });
            minutes += UNIT_MINUTES;
        }

        for unit in &weak {
            if minutes + UNIT_MINUTES > daily_minutes {
                break;
            }
            if items.iter().any(|i| &i.unit == unit) {
                continue;
            }
            items.push(PlanItem {
                unit: unit.clone(),
                reason: PlanReason::Weakness,
            });
            minutes += UNIT_MINUTES;
        }

        if !items.is_empty() {
            plan.push(PlanDay {
                date: day,
                items,
                minutes,
            });
        }
    }

    plan
}

/// Units studied exactly one review interval before `day`.
///
/// Ordered by interval, then by first appearance in the log.
fn review_units(records: &[AttemptRecord], catalog: &Catalog, day: NaiveDate) -> Vec<String> {
    let mut units: Vec<String> = Vec::new();

    for interval in REVIEW_INTERVALS {
        let studied_on = day - Duration::days(interval);
        for record in records.iter().filter(|r| r.date == studied_on) {
            if let Some(meta) = catalog.get(&record.question_id) {
                if !units.contains(&meta.unit) {
                    units.push(meta.unit.clone());
                }
            }
        }
    }

    units
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Difficulty, QuestionMeta};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn attempt(day: &str, id: &str, correct: bool) -> AttemptRecord {
        AttemptRecord {
            date: date(day),
            question_id: id.to_string(),
            correct,
            response_time_seconds: 60.0,
            error_cause: None,
            study_minutes: 0.0,
        }
    }

    fn question(id: &str, unit: &str, weight: u32) -> QuestionMeta {
        QuestionMeta {
            question_id: id.to_string(),
            subject: "非言語".to_string(),
            genre: "計算".to_string(),
            unit: unit.to_string(),
            target_time_seconds: 90.0,
            target_accuracy_pct: 80.0,
            difficulty: Difficulty::Medium,
            weight,
        }
    }

    fn create_test_catalog() -> Catalog {
        Catalog::new(vec![
            question("Q1", "濃度算", 5),
            question("Q2", "損益算", 4),
            question("Q3", "仕事算", 3),
        ])
        .unwrap()
    }

    #[test]
    fn test_plan_places_reviews_first() {
        let catalog = create_test_catalog();
        // 仕事算 studied yesterday (due today); 濃度算 is the weakest unit.
        let records = vec![
            attempt("2026-10-09", "Q3", true),
            attempt("2026-10-08", "Q1", false),
            attempt("2026-10-08", "Q2", true),
        ];

        let plan = weekly_plan(&records, &catalog, date("2026-10-10"), None, 40);

        let first = &plan[0];
        assert_eq!(first.date, date("2026-10-10"));
        assert_eq!(first.items[0].unit, "仕事算");
        assert_eq!(first.items[0].reason, PlanReason::Review);
        assert_eq!(first.items[1].unit, "濃度算");
        assert_eq!(first.items[1].reason, PlanReason::Weakness);
        assert_eq!(first.minutes, 40);
    }

    #[test]
    fn test_plan_respects_daily_budget() {
        let catalog = create_test_catalog();
        let records = vec![
            attempt("2026-10-09", "Q1", false),
            attempt("2026-10-09", "Q2", false),
            attempt("2026-10-09", "Q3", false),
        ];

        let plan = weekly_plan(&records, &catalog, date("2026-10-10"), None, 50);

        assert_eq!(plan.len(), 7);
        for day in &plan {
            assert!(day.minutes <= 50);
            assert_eq!(day.items.len(), 2);
        }
    }

    #[test]
    fn test_plan_stops_at_exam() {
        let catalog = create_test_catalog();
        let records = vec![attempt("2026-10-09", "Q1", false)];
        let today = date("2026-10-10");

        let plan = weekly_plan(&records, &catalog, today, Some(date("2026-10-13")), 60);
        assert_eq!(plan.len(), 3);
        assert!(plan.iter().all(|d| d.date < date("2026-10-13")));

        assert!(weekly_plan(&records, &catalog, today, Some(date("2026-10-01")), 60).is_empty());
        assert!(weekly_plan(&records, &catalog, today, Some(today), 60).is_empty());
    }

    #[test]
    fn test_plan_empty_log() {
        let catalog = create_test_catalog();
        assert!(weekly_plan(&[], &catalog, date("2026-10-10"), None, 60).is_empty());
    }

    #[test]
    fn test_plan_budget_too_small() {
        let catalog = create_test_catalog();
        let records = vec![attempt("2026-10-09", "Q1", false)];
        assert!(weekly_plan(&records, &catalog, date("2026-10-10"), None, 10).is_empty());
    }
}
