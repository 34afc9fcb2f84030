//! Attempt aggregation and statistics.
//!
//! Every function here is pure: it reads an immutable snapshot of attempt
//! records and the catalog and returns a fresh result. Empty input yields
//! zero or empty output, never an error.

use crate::models::{AttemptRecord, Catalog, GenreStats, UnitStats, UNKNOWN_UNIT};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

/// Fraction of correct attempts; 0 for an empty slice.
pub fn overall_accuracy(records: &[AttemptRecord]) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    let correct = records.iter().filter(|r| r.correct).count();
    correct as f64 / records.len() as f64
}

/// Fraction of attempts slower than the question's target time.
///
/// Attempts whose id is not in the catalog are left out of the denominator.
pub fn overrun_rate(records: &[AttemptRecord], catalog: &Catalog) -> f64 {
    overrun_rate_with_factor(records, catalog, 1.0)
}

/// Like [`overrun_rate`], with every target time multiplied by `factor`.
pub fn overrun_rate_with_factor(records: &[AttemptRecord], catalog: &Catalog, factor: f64) -> f64 {
    let mut timed = 0usize;
    let mut over = 0usize;

    for record in records {
        if let Some(meta) = catalog.get(&record.question_id) {
            timed += 1;
            if record.response_time_seconds > meta.target_time_seconds * factor {
                over += 1;
            }
        }
    }

    if timed == 0 {
        0.0
    } else {
        over as f64 / timed as f64
    }
}

/// Accuracy per distinct date, oldest first.
pub fn daily_trend(records: &[AttemptRecord]) -> Vec<(NaiveDate, f64)> {
    let mut by_day: BTreeMap<NaiveDate, (usize, usize)> = BTreeMap::new();

    for record in records {
        let entry = by_day.entry(record.date).or_default();
        entry.1 += 1;
        if record.correct {
            entry.0 += 1;
        }
    }

    by_day
        .into_iter()
        .map(|(date, (correct, total))| (date, correct as f64 / total as f64))
        .collect()
}

/// Per-unit statistics, sorted by unit name.
///
/// Attempts with an unresolved id are grouped under [`UNKNOWN_UNIT`].
pub fn unit_stats(records: &[AttemptRecord], catalog: &Catalog) -> Vec<UnitStats> {
    #[derive(Default)]
    struct Acc {
        attempts: usize,
        correct: usize,
        response_total: f64,
        target_total: f64,
        targeted: usize,
    }

    let mut by_unit: BTreeMap<&str, Acc> = BTreeMap::new();

    for record in records {
        let meta = catalog.get(&record.question_id);
        let unit = meta.map(|m| m.unit.as_str()).unwrap_or(UNKNOWN_UNIT);
        let acc = by_unit.entry(unit).or_default();
        acc.attempts += 1;
        acc.response_total += record.response_time_seconds;
        if record.correct {
            acc.correct += 1;
        }
        if let Some(meta) = meta {
            acc.target_total += meta.target_time_seconds;
            acc.targeted += 1;
        }
    }

    let weights = unit_weights(catalog);

    by_unit
        .into_iter()
        .map(|(unit, acc)| UnitStats {
            unit: unit.to_string(),
            attempts: acc.attempts,
            correct: acc.correct,
            accuracy: acc.correct as f64 / acc.attempts as f64,
            avg_response_seconds: acc.response_total / acc.attempts as f64,
            avg_target_seconds: (acc.targeted > 0).then(|| acc.target_total / acc.targeted as f64),
            weight: weights.get(unit).copied().unwrap_or(0),
        })
        .collect()
}

/// Units most in need of review, highest score first.
///
/// The score is `(1 - unit accuracy) * unit weight`, where the unit weight
/// is the highest catalog weight among the unit's questions. Only units with
/// attempts are ranked; the unknown unit has no weight and is skipped. Ties
/// are broken by unit name.
pub fn priority_units(
    records: &[AttemptRecord],
    catalog: &Catalog,
    top_n: usize,
) -> Vec<(String, f64)> {
    let mut scored: Vec<(String, f64)> = unit_stats(records, catalog)
        .into_iter()
        .filter(|s| s.avg_target_seconds.is_some())
        .map(|s| {
            let score = (1.0 - s.accuracy) * f64::from(s.weight);
            (s.unit, score)
        })
        .collect();

    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    scored.truncate(top_n);

    scored
}

/// Count of incorrect attempts per error cause.
///
/// Incorrect attempts without a cause are not counted.
pub fn error_cause_breakdown(records: &[AttemptRecord]) -> BTreeMap<String, usize> {
    let mut causes: BTreeMap<String, usize> = BTreeMap::new();

    for record in records.iter().filter(|r| !r.correct) {
        if let Some(cause) = record.error_cause.as_deref() {
            *causes.entry(cause.to_string()).or_default() += 1;
        }
    }

    causes
}

/// Accuracy per catalog subject.
///
/// Every subject in the catalog gets an entry; subjects without attempts
/// report 0.
pub fn subject_rollup(records: &[AttemptRecord], catalog: &Catalog) -> BTreeMap<String, f64> {
    let mut counts: BTreeMap<String, (usize, usize)> = catalog
        .entries()
        .iter()
        .map(|m| (m.subject.clone(), (0, 0)))
        .collect();

    for record in records {
        if let Some(meta) = catalog.get(&record.question_id) {
            if let Some(entry) = counts.get_mut(&meta.subject) {
                entry.1 += 1;
                if record.correct {
                    entry.0 += 1;
                }
            }
        }
    }

    counts
        .into_iter()
        .map(|(subject, (correct, total))| {
            let accuracy = if total == 0 {
                0.0
            } else {
                correct as f64 / total as f64
            };
            (subject, accuracy)
        })
        .collect()
}

/// Attempts and accuracy per genre, for genres that have attempts.
pub fn genre_rollup(records: &[AttemptRecord], catalog: &Catalog) -> BTreeMap<String, GenreStats> {
    let mut counts: BTreeMap<String, (usize, usize)> = BTreeMap::new();

    for record in records {
        if let Some(meta) = catalog.get(&record.question_id) {
            let entry = counts.entry(meta.genre.clone()).or_default();
            entry.1 += 1;
            if record.correct {
                entry.0 += 1;
            }
        }
    }

    counts
        .into_iter()
        .map(|(genre, (correct, total))| {
            (
                genre,
                GenreStats {
                    attempts: total,
                    accuracy: correct as f64 / total as f64,
                },
            )
        })
        .collect()
}

/// Number of attempts whose id is not in the catalog.
pub fn unresolved_count(records: &[AttemptRecord], catalog: &Catalog) -> usize {
    records
        .iter()
        .filter(|r| catalog.get(&r.question_id).is_none())
        .count()
}

/// Total review time in minutes.
pub fn total_study_minutes(records: &[AttemptRecord]) -> f64 {
    records.iter().map(|r| r.study_minutes).sum()
}

/// Distinct dates with at least one attempt, ascending.
pub fn study_dates(records: &[AttemptRecord]) -> Vec<NaiveDate> {
    records
        .iter()
        .map(|r| r.date)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn unit_weights(catalog: &Catalog) -> BTreeMap<&str, u32> {
    let mut weights: BTreeMap<&str, u32> = BTreeMap::new();
    for meta in catalog.entries() {
        let w = weights.entry(meta.unit.as_str()).or_insert(0);
        *w = (*w).max(meta.weight);
    }
    weights
}
