//! Derived insights built on top of the aggregator.
//!
//! Streaks, the accuracy forecast, the weekly summary, the difficulty
//! roadmap and the rule-based coach messages all live here. Functions that
//! depend on "today" take it as an argument so results stay reproducible.

use super::aggregator::{
    genre_rollup, overall_accuracy, study_dates, total_study_minutes, unit_stats,
};
use crate::models::{
    AttemptRecord, Badge, Catalog, Difficulty, DifficultyProgress, Forecast, Insight,
    InsightCategory, InsightPriority, Roadmap, RoadmapStatus, StudyPhase, StudyStreak,
    WeeklySummary,
};
use chrono::{Duration, NaiveDate};
use std::collections::{BTreeMap, HashSet};

/// Accuracy a difficulty tier needs before it counts as complete.
const TIER_ACCURACY: f64 = 0.8;
/// Coverage (percent of catalog questions attempted) a tier needs.
const TIER_COVERAGE_PCT: f64 = 70.0;
/// Slope at or below which the trend is treated as flat.
const MIN_IMPROVING_SLOPE: f64 = 0.001;
/// A unit needs this many attempts before it can be called the weakest.
const WEAK_MIN_ATTEMPTS: usize = 3;
const WEAK_ACCURACY: f64 = 0.5;
/// Attempts needed for the beginner and speedster badges.
const BADGE_MIN_ATTEMPTS: usize = 10;
const MASTER_MIN_ATTEMPTS: usize = 5;
const BADGE_ACCURACY: f64 = 0.8;
/// Speedster: average time at most this share of the target time.
const SPEEDSTER_TIME_RATIO: f64 = 0.8;

/// Current and longest run of consecutive study days.
pub fn study_streak(records: &[AttemptRecord], today: NaiveDate) -> StudyStreak {
    let dates = study_dates(records);
    let Some(&last) = dates.last() else {
        return StudyStreak::default();
    };

    let mut current = 1u32;
    for pair in dates.windows(2).rev() {
        if (pair[1] - pair[0]).num_days() == 1 {
            current += 1;
        } else {
            break;
        }
    }

    let mut longest = 1u32;
    let mut run = 1u32;
    for pair in dates.windows(2) {
        if (pair[1] - pair[0]).num_days() == 1 {
            run += 1;
        } else {
            run = 1;
        }
        longest = longest.max(run);
    }

    StudyStreak {
        current,
        active: (today - last).num_days() <= 1,
        longest,
    }
}

/// Projects when `target_rate` will be reached from the daily trend.
///
/// Fits a least-squares line with the day index as x. `current_rate` is the
/// accuracy over the whole analysis window.
pub fn forecast(
    trend: &[(NaiveDate, f64)],
    current_rate: f64,
    target_rate: f64,
    today: NaiveDate,
) -> Forecast {
    if trend.len() < 3 {
        return Forecast::InsufficientData;
    }

    let n = trend.len() as f64;
    let mean_x = (n - 1.0) / 2.0;
    let mean_y = trend.iter().map(|(_, y)| y).sum::<f64>() / n;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (i, (_, y)) in trend.iter().enumerate() {
        let dx = i as f64 - mean_x;
        let dy = y - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    if syy == 0.0 {
        return Forecast::Flat;
    }
    if current_rate >= target_rate {
        return Forecast::Achieved;
    }

    let slope = sxy / sxx;
    if slope <= MIN_IMPROVING_SLOPE {
        return Forecast::NotImproving;
    }

    let intercept = mean_y - slope * mean_x;
    let days_needed = (target_rate - intercept) / slope;
    let remaining = days_needed - (n - 1.0);

    if remaining <= 0.0 {
        Forecast::Imminent
    } else if remaining > 365.0 {
        Forecast::BeyondYear
    } else {
        let days = remaining as u32;
        Forecast::OnTrack {
            date: today + Duration::days(i64::from(days)),
            days,
        }
    }
}

/// Summary of the seven days leading up to and including `today`.
pub fn weekly_summary(
    records: &[AttemptRecord],
    catalog: &Catalog,
    today: NaiveDate,
) -> WeeklySummary {
    let start = today - Duration::days(7);
    let week: Vec<AttemptRecord> = records
        .iter()
        .filter(|r| r.date >= start && r.date <= today)
        .cloned()
        .collect();

    if week.is_empty() {
        return WeeklySummary {
            start: Some(start),
            end: Some(today),
            ..WeeklySummary::default()
        };
    }

    let mut per_unit: BTreeMap<&str, usize> = BTreeMap::new();
    for record in &week {
        if let Some(meta) = catalog.get(&record.question_id) {
            *per_unit.entry(meta.unit.as_str()).or_default() += 1;
        }
    }
    // First unit by name wins ties.
    let top_unit = per_unit
        .into_iter()
        .fold(None::<(&str, usize)>, |best, (unit, count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((unit, count)),
        })
        .map(|(unit, count)| (unit.to_string(), count));

    WeeklySummary {
        start: Some(start),
        end: Some(today),
        study_days: study_dates(&week).len(),
        attempts: week.len(),
        study_minutes: total_study_minutes(&week),
        accuracy: overall_accuracy(&week),
        top_unit,
    }
}

/// Coverage and accuracy per difficulty tier plus the current phase.
///
/// Returns `None` when no attempt resolves against the catalog.
pub fn difficulty_roadmap(records: &[AttemptRecord], catalog: &Catalog) -> Option<Roadmap> {
    let resolved: Vec<(&AttemptRecord, Difficulty)> = records
        .iter()
        .filter_map(|r| catalog.get(&r.question_id).map(|m| (r, m.difficulty)))
        .collect();

    if resolved.is_empty() {
        return None;
    }

    let attempted: HashSet<&str> = resolved.iter().map(|(r, _)| r.question_id.as_str()).collect();

    let tiers: Vec<DifficultyProgress> = Difficulty::ALL
        .iter()
        .map(|&difficulty| {
            let tier: Vec<&AttemptRecord> = resolved
                .iter()
                .filter(|(_, d)| *d == difficulty)
                .map(|(r, _)| *r)
                .collect();
            let attempts = tier.len();
            let correct = tier.iter().filter(|r| r.correct).count();
            let solved = tier
                .iter()
                .map(|r| r.question_id.as_str())
                .collect::<HashSet<_>>()
                .len();
            let total = catalog
                .entries()
                .iter()
                .filter(|m| m.difficulty == difficulty)
                .count();

            let accuracy = if attempts == 0 {
                0.0
            } else {
                correct as f64 / attempts as f64
            };
            let coverage_pct = if total == 0 {
                0.0
            } else {
                solved as f64 / total as f64 * 100.0
            };

            let status = if accuracy >= TIER_ACCURACY && coverage_pct >= TIER_COVERAGE_PCT {
                RoadmapStatus::Complete
            } else if attempts > 0 {
                RoadmapStatus::InProgress
            } else {
                RoadmapStatus::NotStarted
            };

            DifficultyProgress {
                difficulty,
                solved,
                total,
                coverage_pct,
                accuracy,
                attempts,
                status,
            }
        })
        .collect();

    let complete = |d: Difficulty| {
        tiers
            .iter()
            .any(|t| t.difficulty == d && t.status == RoadmapStatus::Complete)
    };
    let coverage = |d: Difficulty| {
        tiers
            .iter()
            .find(|t| t.difficulty == d)
            .map(|t| t.coverage_pct)
            .unwrap_or(0.0)
    };

    let (phase, next_steps) = if complete(Difficulty::Low) && complete(Difficulty::Medium) {
        (
            StudyPhase::Advanced,
            vec![
                "Keep working through advanced problems.".to_string(),
                "Push accuracy on high-difficulty questions.".to_string(),
                "Start cutting down response times.".to_string(),
            ],
        )
    } else if complete(Difficulty::Low) {
        let steps = match first_unsolved_unit(catalog, Difficulty::Medium, &attempted) {
            Some(unit) => vec![
                format!("Next, take on 「{}」.", unit),
                "Aim for 80% accuracy on standard problems.".to_string(),
                format!("Current coverage: {:.0}%", coverage(Difficulty::Medium)),
            ],
            None => vec![
                "Review the standard problems once more.".to_string(),
                "Hold accuracy steady at 80%.".to_string(),
            ],
        };
        (StudyPhase::Standard, steps)
    } else {
        let steps = match first_unsolved_unit(catalog, Difficulty::Low, &attempted) {
            Some(unit) => vec![
                format!("Start with 「{}」.", unit),
                "Aim for 80% accuracy on foundation problems.".to_string(),
                format!("Current coverage: {:.0}%", coverage(Difficulty::Low)),
            ],
            None => vec![
                "Review the foundation problems to lock them in.".to_string(),
                "Hold accuracy steady at 80%.".to_string(),
            ],
        };
        (StudyPhase::Foundation, steps)
    };

    Some(Roadmap {
        tiers,
        phase,
        next_steps,
    })
}

/// Unit with the most unattempted questions at `difficulty`.
///
/// Ties go to the unit that appears first in the catalog.
fn first_unsolved_unit(
    catalog: &Catalog,
    difficulty: Difficulty,
    attempted: &HashSet<&str>,
) -> Option<String> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for meta in catalog.entries() {
        if meta.difficulty != difficulty || attempted.contains(meta.question_id.as_str()) {
            continue;
        }
        match counts.iter_mut().find(|(u, _)| *u == meta.unit) {
            Some((_, n)) => *n += 1,
            None => counts.push((meta.unit.as_str(), 1)),
        }
    }

    // Stable sort keeps catalog order among equal counts.
    counts.sort_by_key(|(_, n)| std::cmp::Reverse(*n));
    counts.first().map(|(u, _)| u.to_string())
}

/// Rule-based study advice, most important first.
pub fn coach_advice(
    current_rate: f64,
    target_rate: f64,
    overrun_rate: f64,
    streak: &StudyStreak,
) -> Vec<String> {
    let mut advice = Vec::new();

    if current_rate >= target_rate {
        advice.push(
            "Excellent accuracy! Keep it up and start taking on harder problems.".to_string(),
        );
    } else if current_rate >= target_rate - 0.1 {
        advice.push(
            "Almost at your goal! Targeted review of weak units will get you there.".to_string(),
        );
    } else {
        advice.push(
            "Build the foundation first: concentrate on the units with the lowest accuracy."
                .to_string(),
        );
    }

    if overrun_rate > 0.3 {
        advice.push("You are running over time a lot. Work on answering faster.".to_string());
    } else if overrun_rate < 0.1 {
        advice.push("Your pace is great. Just watch out for careless mistakes.".to_string());
    }

    let streak_days = if streak.active { streak.current } else { 0 };
    if streak_days >= 3 {
        advice.push(format!(
            "{} days in a row! You have made studying a habit.",
            streak_days
        ));
    } else if streak_days == 0 {
        advice.push("Nothing logged today yet. How about solving just one question?".to_string());
    }

    advice
}

/// Least accurate unit with enough attempts, if it is below 50%.
pub fn weakest_unit_insight(records: &[AttemptRecord], catalog: &Catalog) -> Option<Insight> {
    let worst = unit_stats(records, catalog)
        .into_iter()
        .filter(|s| {
            s.avg_target_seconds.is_some()
                && s.attempts >= WEAK_MIN_ATTEMPTS
                && s.accuracy < WEAK_ACCURACY
        })
        .min_by(|a, b| {
            a.accuracy
                .total_cmp(&b.accuracy)
                .then_with(|| a.unit.cmp(&b.unit))
        })?;

    let genre = catalog
        .entries()
        .iter()
        .find(|m| m.unit == worst.unit)
        .map(|m| m.genre.as_str())
        .unwrap_or("");

    Some(Insight {
        category: InsightCategory::Weakness,
        priority: InsightPriority::High,
        message: format!(
            "「{}」 is your weakest unit ({:.1}% accuracy). {}",
            worst.unit,
            worst.accuracy * 100.0,
            genre_tip(genre)
        ),
    })
}

fn genre_tip(genre: &str) -> &'static str {
    if genre.contains("推論") {
        "Follow each premise to its conclusion and check every proposition carefully."
    } else if genre.contains("図表") {
        "Estimate with rounded numbers first to cut down calculation errors."
    } else if genre.contains("計算") || genre.contains("特殊算") {
        "Learn to recognise problem patterns instead of memorising formulas."
    } else if genre.contains("確率") {
        "Always draw a table or tree to lay out the cases."
    } else if genre.contains("読解") {
        "Work on reading speed before grammar details."
    } else {
        "Repeat the basic problems until the patterns sink in."
    }
}

/// Whether the remaining days before the exam are enough to close the gap.
///
/// `None` without an exam date or once the exam day has arrived.
pub fn exam_pace_insight(
    current_rate: f64,
    target_rate: f64,
    today: NaiveDate,
    exam_date: Option<NaiveDate>,
) -> Option<Insight> {
    let days_left = (exam_date? - today).num_days();
    if days_left <= 0 {
        return None;
    }

    let gap = target_rate - current_rate;
    if gap > 0.2 && days_left < 30 {
        Some(Insight {
            category: InsightCategory::Pace,
            priority: InsightPriority::Urgent,
            message: format!(
                "{} days left and {:.1} points to gain: you need about {:.2} points a day. \
                 Switch to focused study.",
                days_left,
                gap * 100.0,
                gap / days_left as f64 * 100.0
            ),
        })
    } else if gap > 0.0 && days_left >= 30 {
        Some(Insight {
            category: InsightCategory::Pace,
            priority: InsightPriority::Medium,
            message: format!(
                "{} days left: the target is within reach. Keep this pace and shore up weak units.",
                days_left
            ),
        })
    } else if gap <= 0.0 {
        Some(Insight {
            category: InsightCategory::Pace,
            priority: InsightPriority::Low,
            message: "Target already reached! Hold your level and move on to harder problems."
                .to_string(),
        })
    } else {
        None
    }
}

/// Accuracy of the last seven days compared with the seven days before.
///
/// Needs at least ten attempts overall and data in both weeks; changes
/// within five points are not reported.
pub fn weekly_change_insight(records: &[AttemptRecord], today: NaiveDate) -> Option<Insight> {
    if records.len() < BADGE_MIN_ATTEMPTS {
        return None;
    }

    let week_ago = today - Duration::days(7);
    let two_weeks_ago = today - Duration::days(14);
    let this_week: Vec<AttemptRecord> = records
        .iter()
        .filter(|r| r.date >= week_ago && r.date <= today)
        .cloned()
        .collect();
    let last_week: Vec<AttemptRecord> = records
        .iter()
        .filter(|r| r.date >= two_weeks_ago && r.date < week_ago)
        .cloned()
        .collect();

    if this_week.is_empty() || last_week.is_empty() {
        return None;
    }

    let change = overall_accuracy(&this_week) - overall_accuracy(&last_week);
    let message = if change > 0.05 {
        format!(
            "Up {:.1} points on last week. Great growth, keep it going.",
            change * 100.0
        )
    } else if change < -0.05 {
        format!(
            "Down {:.1} points on last week. You may need a rest; go back to the basics.",
            -change * 100.0
        )
    } else {
        return None;
    };

    Some(Insight {
        category: InsightCategory::Growth,
        priority: InsightPriority::Medium,
        message,
    })
}

/// Mean seconds over (or under) target across resolved attempts.
///
/// Target times are scaled by `time_factor`.
pub fn time_excess_insight(
    records: &[AttemptRecord],
    catalog: &Catalog,
    time_factor: f64,
) -> Option<Insight> {
    let excess: Vec<f64> = records
        .iter()
        .filter_map(|r| {
            catalog
                .get(&r.question_id)
                .map(|m| r.response_time_seconds - m.target_time_seconds * time_factor)
        })
        .collect();
    if excess.is_empty() {
        return None;
    }

    let mean = excess.iter().sum::<f64>() / excess.len() as f64;
    if mean > 10.0 {
        Some(Insight {
            category: InsightCategory::TimeManagement,
            priority: InsightPriority::Medium,
            message: format!(
                "On average {:.0}s over target. Time to shift from accuracy first to speed.",
                mean
            ),
        })
    } else if mean < -5.0 {
        Some(Insight {
            category: InsightCategory::TimeManagement,
            priority: InsightPriority::Low,
            message: "Your speed is good. Leave time to re-check answers for careless mistakes."
                .to_string(),
        })
    } else {
        None
    }
}

/// Badges earned by the attempts in `records`.
///
/// The streak badge reflects `streak`, which the caller computes over the
/// whole log.
pub fn achievement_badges(
    records: &[AttemptRecord],
    catalog: &Catalog,
    streak: &StudyStreak,
    time_factor: f64,
) -> Vec<Badge> {
    let mut badges = Vec::new();

    if records.len() >= BADGE_MIN_ATTEMPTS {
        badges.push(Badge::Beginner);
    }

    if streak.current > 0 {
        badges.push(Badge::Streak {
            days: streak.current,
            active: streak.active,
        });
    }

    for (genre, stats) in genre_rollup(records, catalog) {
        if stats.attempts >= MASTER_MIN_ATTEMPTS && stats.accuracy >= BADGE_ACCURACY {
            badges.push(Badge::GenreMaster { genre });
        }
    }

    if records.len() >= BADGE_MIN_ATTEMPTS && overall_accuracy(records) >= BADGE_ACCURACY {
        let timed: Vec<(f64, f64)> = records
            .iter()
            .filter_map(|r| {
                catalog
                    .get(&r.question_id)
                    .map(|m| (r.response_time_seconds, m.target_time_seconds * time_factor))
            })
            .collect();
        if !timed.is_empty() {
            let n = timed.len() as f64;
            let avg_time = timed.iter().map(|(t, _)| t).sum::<f64>() / n;
            let avg_target = timed.iter().map(|(_, t)| t).sum::<f64>() / n;
            if avg_target > 0.0 && avg_time <= avg_target * SPEEDSTER_TIME_RATIO {
                badges.push(Badge::Speedster);
            }
        }
    }

    badges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QuestionMeta;

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
            study_minutes: 10.0,
        }
    }

    fn question(id: &str, unit: &str, difficulty: Difficulty) -> QuestionMeta {
        QuestionMeta {
            question_id: id.to_string(),
            subject: "非言語".to_string(),
            genre: "推論".to_string(),
            unit: unit.to_string(),
            target_time_seconds: 90.0,
            target_accuracy_pct: 80.0,
            difficulty,
            weight: 3,
        }
    }

    fn create_test_catalog() -> Catalog {
        Catalog::new(vec![
            question("Q1", "比と割合", Difficulty::Low),
            question("Q2", "確率", Difficulty::Low),
            question("Q3", "濃度算", Difficulty::Medium),
            question("Q4", "損益算", Difficulty::Medium),
            question("Q5", "速度算", Difficulty::High),
        ])
        .unwrap()
    }

    #[test]
    fn test_study_streak() {
        let records = vec![
            attempt("2026-10-01", "Q1", true),
            attempt("2026-10-02", "Q1", true),
            attempt("2026-10-03", "Q1", true),
            attempt("2026-10-05", "Q1", true),
            attempt("2026-10-06", "Q1", true),
            attempt("2026-10-06", "Q2", true),
        ];

        let streak = study_streak(&records, date("2026-10-07"));
        assert_eq!(streak.current, 2);
        assert_eq!(streak.longest, 3);
        assert!(streak.active);

        let lapsed = study_streak(&records, date("2026-10-09"));
        assert!(!lapsed.active);
        assert_eq!(lapsed.current, 2);

        assert_eq!(study_streak(&[], date("2026-10-09")), StudyStreak::default());
    }

    #[test]
    fn test_forecast_insufficient_and_flat() {
        let today = date("2026-10-10");
        let two = vec![(date("2026-10-01"), 0.5), (date("2026-10-02"), 0.6)];
        assert_eq!(forecast(&two, 0.55, 0.8, today), Forecast::InsufficientData);

        let flat = vec![
            (date("2026-10-01"), 0.5),
            (date("2026-10-02"), 0.5),
            (date("2026-10-03"), 0.5),
        ];
        assert_eq!(forecast(&flat, 0.5, 0.8, today), Forecast::Flat);
    }

    #[test]
    fn test_forecast_on_track() {
        let today = date("2026-10-10");
        // y = 0.5 + 0.1x over x = 0..2; reaches 0.8 at x = 3, one day past x = 2.
        let trend = vec![
            (date("2026-10-01"), 0.5),
            (date("2026-10-02"), 0.6),
            (date("2026-10-03"), 0.7),
        ];

        match forecast(&trend, 0.6, 0.8, today) {
            Forecast::OnTrack { date: when, days } => {
                assert!(days <= 1);
                assert_eq!(when, today + Duration::days(i64::from(days)));
            }
            Forecast::Imminent => {}
            other => panic!("unexpected forecast: {:?}", other),
        }

        assert_eq!(forecast(&trend, 0.9, 0.8, today), Forecast::Achieved);
    }

    #[test]
    fn test_forecast_declining() {
        let trend = vec![
            (date("2026-10-01"), 0.7),
            (date("2026-10-02"), 0.6),
            (date("2026-10-03"), 0.5),
        ];
        assert_eq!(
            forecast(&trend, 0.6, 0.8, date("2026-10-04")),
            Forecast::NotImproving
        );
    }

    #[test]
    fn test_forecast_beyond_year() {
        // 0.002 per day starting from 0.1 needs ~400 days to reach 0.9.
        let trend = vec![
            (date("2026-10-01"), 0.100),
            (date("2026-10-02"), 0.102),
            (date("2026-10-03"), 0.104),
        ];
        assert_eq!(
            forecast(&trend, 0.102, 0.9, date("2026-10-04")),
            Forecast::BeyondYear
        );
    }

    #[test]
    fn test_weekly_summary() {
        let catalog = create_test_catalog();
        let records = vec![
            attempt("2026-09-01", "Q1", false),
            attempt("2026-10-05", "Q3", true),
            attempt("2026-10-06", "Q3", false),
            attempt("2026-10-06", "Q1", true),
            attempt("2026-10-08", "Q9", true),
        ];

        let weekly = weekly_summary(&records, &catalog, date("2026-10-08"));

        assert_eq!(weekly.attempts, 4);
        assert_eq!(weekly.study_days, 3);
        assert_eq!(weekly.study_minutes, 40.0);
        assert_eq!(weekly.accuracy, 0.75);
        assert_eq!(weekly.top_unit, Some(("濃度算".to_string(), 2)));
        assert_eq!(weekly.start, Some(date("2026-10-01")));
    }

    #[test]
    fn test_weekly_summary_empty_week() {
        let catalog = create_test_catalog();
        let records = vec![attempt("2026-01-01", "Q1", true)];

        let weekly = weekly_summary(&records, &catalog, date("2026-10-08"));
        assert_eq!(weekly.attempts, 0);
        assert_eq!(weekly.accuracy, 0.0);
        assert!(weekly.top_unit.is_none());
    }

    #[test]
    fn test_roadmap_foundation_phase() {
        let catalog = create_test_catalog();
        let records = vec![attempt("2026-10-01", "Q1", true)];

        let roadmap = difficulty_roadmap(&records, &catalog).unwrap();

        assert_eq!(roadmap.phase, StudyPhase::Foundation);
        let low = &roadmap.tiers[0];
        assert_eq!(low.difficulty, Difficulty::Low);
        assert_eq!(low.solved, 1);
        assert_eq!(low.total, 2);
        assert_eq!(low.coverage_pct, 50.0);
        assert_eq!(low.status, RoadmapStatus::InProgress);
        assert_eq!(roadmap.tiers[2].status, RoadmapStatus::NotStarted);
        assert!(roadmap.next_steps[0].contains("確率"));
    }

    #[test]
    fn test_roadmap_standard_and_advanced() {
        let catalog = create_test_catalog();
        let mut records = vec![
            attempt("2026-10-01", "Q1", true),
            attempt("2026-10-01", "Q2", true),
        ];

        let roadmap = difficulty_roadmap(&records, &catalog).unwrap();
        assert_eq!(roadmap.tiers[0].status, RoadmapStatus::Complete);
        assert_eq!(roadmap.phase, StudyPhase::Standard);
        assert!(roadmap.next_steps[0].contains("濃度算"));

        records.push(attempt("2026-10-02", "Q3", true));
        records.push(attempt("2026-10-02", "Q4", true));
        let roadmap = difficulty_roadmap(&records, &catalog).unwrap();
        assert_eq!(roadmap.phase, StudyPhase::Advanced);
    }

    #[test]
    fn test_roadmap_requires_resolved_attempts() {
        let catalog = create_test_catalog();
        assert!(difficulty_roadmap(&[], &catalog).is_none());
        assert!(difficulty_roadmap(&[attempt("2026-10-01", "ZZ", true)], &catalog).is_none());
    }

    #[test]
    fn test_coach_advice() {
        let active = StudyStreak {
            current: 4,
            active: true,
            longest: 4,
        };
        let advice = coach_advice(0.85, 0.8, 0.05, &active);
        assert_eq!(advice.len(), 3);
        assert!(advice[0].starts_with("Excellent"));
        assert!(advice[2].contains("4 days"));

        let advice = coach_advice(0.75, 0.8, 0.2, &StudyStreak::default());
        assert!(advice[0].starts_with("Almost"));
        assert!(advice.last().unwrap().contains("Nothing logged"));

        let advice = coach_advice(0.4, 0.8, 0.5, &StudyStreak::default());
        assert!(advice[0].starts_with("Build"));
        assert!(advice[1].contains("over time"));
    }

    fn many(day: &str, id: &str, correct: usize, wrong: usize) -> Vec<AttemptRecord> {
        let mut records = Vec::new();
        for _ in 0..correct {
            records.push(attempt(day, id, true));
        }
        for _ in 0..wrong {
            records.push(attempt(day, id, false));
        }
        records
    }

    #[test]
    fn test_weakest_unit_insight() {
        let catalog = create_test_catalog();
        let mut records = many("2026-10-01", "Q3", 1, 3);
        records.extend(many("2026-10-01", "Q4", 1, 2));
        // Lowest accuracy but too few attempts to count.
        records.extend(many("2026-10-01", "Q5", 0, 2));

        let insight = weakest_unit_insight(&records, &catalog).unwrap();
        assert_eq!(insight.category, InsightCategory::Weakness);
        assert_eq!(insight.priority, InsightPriority::High);
        assert!(insight.message.contains("濃度算"));
        assert!(insight.message.contains("25.0%"));

        let strong = many("2026-10-01", "Q1", 3, 1);
        assert!(weakest_unit_insight(&strong, &catalog).is_none());
    }

    #[test]
    fn test_exam_pace_insight() {
        let today = date("2026-10-01");

        let urgent = exam_pace_insight(0.5, 0.8, today, Some(date("2026-10-11"))).unwrap();
        assert_eq!(urgent.priority, InsightPriority::Urgent);
        assert!(urgent.message.starts_with("10 days left"));

        let steady = exam_pace_insight(0.7, 0.8, today, Some(date("2026-12-01"))).unwrap();
        assert_eq!(steady.priority, InsightPriority::Medium);

        let done = exam_pace_insight(0.9, 0.8, today, Some(date("2026-10-05"))).unwrap();
        assert_eq!(done.priority, InsightPriority::Low);

        // Small gap close to the exam: nothing to say.
        assert!(exam_pace_insight(0.7, 0.8, today, Some(date("2026-10-11"))).is_none());
        assert!(exam_pace_insight(0.5, 0.8, today, Some(today)).is_none());
        assert!(exam_pace_insight(0.5, 0.8, today, None).is_none());
    }

    #[test]
    fn test_weekly_change_insight() {
        let today = date("2026-10-15");
        let mut records = many("2026-10-05", "Q1", 2, 3);
        records.extend(many("2026-10-12", "Q1", 4, 1));

        let insight = weekly_change_insight(&records, today).unwrap();
        assert_eq!(insight.category, InsightCategory::Growth);
        assert!(insight.message.starts_with("Up 40.0 points"));

        let mut declining = many("2026-10-05", "Q1", 4, 1);
        declining.extend(many("2026-10-12", "Q1", 2, 3));
        let insight = weekly_change_insight(&declining, today).unwrap();
        assert!(insight.message.starts_with("Down 40.0 points"));

        // Nothing from the previous week.
        let recent_only = many("2026-10-12", "Q1", 5, 5);
        assert!(weekly_change_insight(&recent_only, today).is_none());
        assert!(weekly_change_insight(&records[..5], today).is_none());
    }

    #[test]
    fn test_time_excess_insight() {
        let catalog = create_test_catalog();
        let mut slow = attempt("2026-10-01", "Q1", true);
        slow.response_time_seconds = 105.0;

        let insight = time_excess_insight(&[slow.clone()], &catalog, 1.0).unwrap();
        assert_eq!(insight.priority, InsightPriority::Medium);
        assert!(insight.message.contains("15s over"));

        // Lenient targets absorb the excess: 105 vs 99 is within 10s.
        assert!(time_excess_insight(&[slow], &catalog, 1.1).is_none());

        // 60s against a 90s target.
        let fast = attempt("2026-10-01", "Q1", true);
        let insight = time_excess_insight(&[fast], &catalog, 1.0).unwrap();
        assert_eq!(insight.priority, InsightPriority::Low);

        assert!(time_excess_insight(&[attempt("2026-10-01", "X", true)], &catalog, 1.0).is_none());
    }

    #[test]
    fn test_achievement_badges() {
        let catalog = create_test_catalog();
        let records = many("2026-10-01", "Q1", 9, 1);
        let streak = StudyStreak {
            current: 4,
            active: true,
            longest: 6,
        };

        let badges = achievement_badges(&records, &catalog, &streak, 1.0);
        assert_eq!(
            badges,
            vec![
                Badge::Beginner,
                Badge::Streak {
                    days: 4,
                    active: true
                },
                Badge::GenreMaster {
                    genre: "推論".to_string()
                },
                Badge::Speedster,
            ]
        );

        // With 72s targets, 60s misses the 57.6s cut.
        let strict = achievement_badges(&records, &catalog, &streak, 0.8);
        assert!(!strict.contains(&Badge::Speedster));

        let few = many("2026-10-01", "Q1", 3, 0);
        let badges = achievement_badges(&few, &catalog, &StudyStreak::default(), 1.0);
        assert!(badges.is_empty());
    }
}
