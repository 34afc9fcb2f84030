//! CSV schemas for the attempt log and the question catalog.
//!
//! Rows are read as raw strings and validated into domain records here, so
//! nothing downstream ever sees a malformed value.

use crate::models::{AttemptRecord, Catalog, Difficulty, QuestionMeta};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Attempt log header, in file order.
pub const ATTEMPT_COLUMNS: [&str; 6] = [
    "日付",
    "問題ID",
    "正誤",
    "解答時間(秒)",
    "ミスの原因",
    "学習投入時間(分)",
];

/// Catalog header, in file order.
pub const CATALOG_COLUMNS: [&str; 8] = [
    "問題ID",
    "科目",
    "ジャンル",
    "単元",
    "目標解答時間(秒)",
    "目標正答率(%)",
    "難易度",
    "出題頻度(重み)",
];

/// Symbol written for a correct answer.
pub const CORRECT_MARK: &str = "〇";
/// Symbol written for an incorrect answer.
pub const INCORRECT_MARK: &str = "✕";
/// Placeholder written when there is no error cause.
pub const NO_CAUSE: &str = "-";

/// Errors raised while reading or writing data files.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to encode CSV: {0}")]
    Encode(#[source] std::io::Error),

    #[error("missing columns {missing:?} (found {found:?})")]
    MissingColumns {
        missing: Vec<String>,
        found: Vec<String>,
    },

    #[error("row {row}, column {column}: {message}")]
    InvalidField {
        row: usize,
        column: &'static str,
        message: String,
    },

    #[error("duplicate question id '{0}' in catalog")]
    DuplicateQuestion(String),
}

/// One line of the attempt log as it appears on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptRow {
    #[serde(rename = "日付")]
    pub date: String,
    #[serde(rename = "問題ID")]
    pub question_id: String,
    #[serde(rename = "正誤")]
    pub result: String,
    #[serde(rename = "解答時間(秒)")]
    pub response_time: String,
    #[serde(rename = "ミスの原因", default)]
    pub error_cause: String,
    #[serde(rename = "学習投入時間(分)", default)]
    pub study_minutes: String,
}

impl AttemptRow {
    /// Validates the row. `row` is the 1-based line number used in errors.
    pub fn into_record(self, row: usize) -> Result<AttemptRecord, ImportError> {
        let date = parse_date(&self.date).ok_or_else(|| ImportError::InvalidField {
            row,
            column: ATTEMPT_COLUMNS[0],
            message: format!("unrecognised date '{}'", self.date),
        })?;

        let question_id = self.question_id.trim().to_string();
        if question_id.is_empty() {
            return Err(ImportError::InvalidField {
                row,
                column: ATTEMPT_COLUMNS[1],
                message: "question id is empty".to_string(),
            });
        }

        let correct = parse_mark(&self.result).ok_or_else(|| ImportError::InvalidField {
            row,
            column: ATTEMPT_COLUMNS[2],
            message: format!(
                "expected {} or {}, got '{}'",
                CORRECT_MARK, INCORRECT_MARK, self.result
            ),
        })?;

        let response_time_seconds = parse_amount(&self.response_time, row, ATTEMPT_COLUMNS[3])?;
        let study_minutes = parse_amount(&self.study_minutes, row, ATTEMPT_COLUMNS[5])?;

        let cause = self.error_cause.trim();
        let error_cause = if correct || cause.is_empty() || cause == NO_CAUSE {
            None
        } else {
            Some(cause.to_string())
        };

        Ok(AttemptRecord {
            date,
            question_id,
            correct,
            response_time_seconds,
            error_cause,
            study_minutes,
        })
    }

    pub fn from_record(record: &AttemptRecord) -> Self {
        Self {
            date: record.date.format("%Y-%m-%d").to_string(),
            question_id: record.question_id.clone(),
            result: mark(record.correct).to_string(),
            response_time: record.response_time_seconds.to_string(),
            error_cause: record
                .error_cause
                .clone()
                .unwrap_or_else(|| NO_CAUSE.to_string()),
            study_minutes: record.study_minutes.to_string(),
        }
    }
}

/// One line of the question catalog as it appears on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogRow {
    #[serde(rename = "問題ID")]
    pub question_id: String,
    #[serde(rename = "科目")]
    pub subject: String,
    #[serde(rename = "ジャンル")]
    pub genre: String,
    #[serde(rename = "単元")]
    pub unit: String,
    #[serde(rename = "目標解答時間(秒)")]
    pub target_time: String,
    #[serde(rename = "目標正答率(%)")]
    pub target_accuracy: String,
    #[serde(rename = "難易度")]
    pub difficulty: String,
    #[serde(rename = "出題頻度(重み)")]
    pub weight: String,
}

impl CatalogRow {
    /// Validates the row. `row` is the 1-based line number used in errors.
    pub fn into_meta(self, row: usize) -> Result<QuestionMeta, ImportError> {
        let required = |value: &str, column: &'static str| {
            let value = value.trim();
            if value.is_empty() {
                Err(ImportError::InvalidField {
                    row,
                    column,
                    message: "value is empty".to_string(),
                })
            } else {
                Ok(value.to_string())
            }
        };

        let question_id = required(&self.question_id, CATALOG_COLUMNS[0])?;
        let subject = required(&self.subject, CATALOG_COLUMNS[1])?;
        let genre = required(&self.genre, CATALOG_COLUMNS[2])?;
        let unit = required(&self.unit, CATALOG_COLUMNS[3])?;
        let target_time_seconds = parse_amount(&self.target_time, row, CATALOG_COLUMNS[4])?;

        let target_accuracy_pct = parse_amount(&self.target_accuracy, row, CATALOG_COLUMNS[5])?;
        if target_accuracy_pct > 100.0 {
            return Err(ImportError::InvalidField {
                row,
                column: CATALOG_COLUMNS[5],
                message: format!("{} is above 100", target_accuracy_pct),
            });
        }

        let difficulty =
            Difficulty::parse(&self.difficulty).ok_or_else(|| ImportError::InvalidField {
                row,
                column: CATALOG_COLUMNS[6],
                message: format!("expected 低, 中 or 高, got '{}'", self.difficulty),
            })?;

        let weight = self
            .weight
            .trim()
            .parse::<u32>()
            .map_err(|_| ImportError::InvalidField {
                row,
                column: CATALOG_COLUMNS[7],
                message: format!("expected a whole number, got '{}'", self.weight),
            })?;

        Ok(QuestionMeta {
            question_id,
            subject,
            genre,
            unit,
            target_time_seconds,
            target_accuracy_pct,
            difficulty,
            weight,
        })
    }

    pub fn from_meta(meta: &QuestionMeta) -> Self {
        Self {
            question_id: meta.question_id.clone(),
            subject: meta.subject.clone(),
            genre: meta.genre.clone(),
            unit: meta.unit.clone(),
            target_time: meta.target_time_seconds.to_string(),
            target_accuracy: meta.target_accuracy_pct.to_string(),
            difficulty: meta.difficulty.symbol().to_string(),
            weight: meta.weight.to_string(),
        }
    }
}

/// Parses a complete attempt log.
pub fn parse_attempts(content: &str) -> Result<Vec<AttemptRecord>, ImportError> {
    let mut reader = reader_for(content, true);
    check_headers(&mut reader, &ATTEMPT_COLUMNS)?;

    let mut records = Vec::new();
    for (idx, row) in reader.deserialize::<AttemptRow>().enumerate() {
        // Line 1 is the header.
        records.push(row?.into_record(idx + 2)?);
    }
    Ok(records)
}

/// Parses a complete catalog, rejecting duplicate ids.
pub fn parse_catalog(content: &str) -> Result<Catalog, ImportError> {
    let mut reader = reader_for(content, true);
    check_headers(&mut reader, &CATALOG_COLUMNS)?;

    let mut entries = Vec::new();
    for (idx, row) in reader.deserialize::<CatalogRow>().enumerate() {
        entries.push(row?.into_meta(idx + 2)?);
    }
    Catalog::new(entries).map_err(ImportError::DuplicateQuestion)
}

/// Parses a single headerless attempt line, e.g. `2026-10-14,N-A01,〇,110,-,5`.
///
/// Trailing cause and study-time fields may be omitted.
pub fn parse_attempt_line(line: &str) -> Result<AttemptRecord, ImportError> {
    let mut reader = reader_for(line, false);
    let record = reader
        .records()
        .next()
        .transpose()?
        .ok_or_else(|| ImportError::InvalidField {
            row: 1,
            column: ATTEMPT_COLUMNS[0],
            message: "row is empty".to_string(),
        })?;

    let field = |i: usize| record.get(i).unwrap_or("").to_string();
    if record.len() < 4 {
        return Err(ImportError::InvalidField {
            row: 1,
            column: ATTEMPT_COLUMNS[record.len().min(3)],
            message: format!("expected at least 4 fields, got {}", record.len()),
        });
    }

    AttemptRow {
        date: field(0),
        question_id: field(1),
        result: field(2),
        response_time: field(3),
        error_cause: field(4),
        study_minutes: field(5),
    }
    .into_record(1)
}

/// Encodes attempts as CSV with the standard header.
pub fn attempts_to_csv(records: &[AttemptRecord]) -> Result<String, ImportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    if records.is_empty() {
        writer.write_record(ATTEMPT_COLUMNS)?;
    }
    for record in records {
        writer.serialize(AttemptRow::from_record(record))?;
    }
    finish(writer)
}

/// Encodes a catalog as CSV with the standard header.
pub fn catalog_to_csv(catalog: &Catalog) -> Result<String, ImportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    if catalog.is_empty() {
        writer.write_record(CATALOG_COLUMNS)?;
    }
    for meta in catalog.entries() {
        writer.serialize(CatalogRow::from_meta(meta))?;
    }
    finish(writer)
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String, ImportError> {
    let bytes = writer
        .into_inner()
        .map_err(|e| ImportError::Encode(e.into_error()))?;
    String::from_utf8(bytes)
        .map_err(|e| ImportError::Encode(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

fn reader_for(content: &str, has_headers: bool) -> csv::Reader<&[u8]> {
    // Spreadsheet exports often start with a UTF-8 BOM.
    let content = content.trim_start_matches('\u{feff}');
    csv::ReaderBuilder::new()
        .has_headers(has_headers)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes())
}

fn check_headers(reader: &mut csv::Reader<&[u8]>, expected: &[&str]) -> Result<(), ImportError> {
    let found: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
    let missing: Vec<String> = expected
        .iter()
        .filter(|col| !found.iter().any(|h| h.as_str() == **col))
        .map(|col| col.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ImportError::MissingColumns { missing, found })
    }
}

/// Accepts `YYYY-MM-DD` or `YYYY/MM/DD`, optionally followed by a time.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let day = value
        .trim()
        .split(|c: char| c == ' ' || c == 'T')
        .next()
        .unwrap_or("");
    ["%Y-%m-%d", "%Y/%m/%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(day, fmt).ok())
}

fn mark(correct: bool) -> &'static str {
    if correct {
        CORRECT_MARK
    } else {
        INCORRECT_MARK
    }
}

fn parse_mark(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "〇" | "○" | "o" | "true" | "1" | "correct" => Some(true),
        "✕" | "×" | "x" | "false" | "0" | "incorrect" => Some(false),
        _ => None,
    }
}

/// Non-negative number; a blank cell reads as 0.
fn parse_amount(value: &str, row: usize, column: &'static str) -> Result<f64, ImportError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(0.0);
    }
    match value.parse::<f64>() {
        Ok(n) if n.is_finite() && n >= 0.0 => Ok(n),
        _ => Err(ImportError::InvalidField {
            row,
            column,
            message: format!("expected a non-negative number, got '{}'", value),
        }),
    }
}
