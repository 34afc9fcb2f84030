//! Built-in question catalog.
//!
//! Thirty SPI-style questions covering the 非言語 (non-verbal) and 言語
//! (verbal) subjects. Used whenever no catalog file is supplied.

use crate::models::{Catalog, Difficulty, QuestionMeta};
use Difficulty::{High, Low, Medium};

type SeedRow = (&'static str, &'static str, &'static str, &'static str, u32, u32, Difficulty, u32);

#[rustfmt::skip]
const SEED: [SeedRow; 30] = [
    ("N-A01", "非言語", "推論", "集合の推論 (ベン図)", 120, 85, High, 4),
    ("N-A02", "非言語", "推論", "論理的な推論 (真偽・順序)", 100, 80, High, 5),
    ("N-A03", "非言語", "推論", "対戦・リーグ戦の推論", 150, 75, High, 5),
    ("N-A04", "非言語", "推論", "命題・三段論法", 90, 90, Low, 3),
    ("N-A05", "非言語", "推論", "領域 (座標平面)", 180, 65, High, 3),
    ("N-A06", "非言語", "推論", "物の流れ", 160, 70, High, 4),
    ("N-B01", "非言語", "計算・文章題", "比と割合の計算", 60, 95, Low, 5),
    ("N-B02", "非言語", "計算・文章題", "濃度算", 100, 80, Medium, 5),
    ("N-B03", "非言語", "計算・文章題", "割引・割増計算", 90, 85, Medium, 3),
    ("N-B04", "非言語", "計算・文章題", "損益算", 110, 90, Medium, 5),
    ("N-B05", "非言語", "計算・文章題", "仕事算", 90, 80, Medium, 4),
    ("N-B06", "非言語", "計算・文章題", "速度算", 130, 75, High, 5),
    ("N-B07", "非言語", "計算・文章題", "料金の割引", 100, 70, Medium, 5),
    ("N-C01", "非言語", "確率・場合", "確率 (基礎)", 70, 70, Low, 5),
    ("N-C02", "非言語", "確率・場合", "場合の数", 120, 65, High, 5),
    ("N-D01", "非言語", "図表の読み取り", "グラフ・表の計算", 150, 75, High, 3),
    ("N-D02", "非言語", "図表の読み取り", "増加率の把握", 140, 80, Medium, 4),
    ("N-D03", "非言語", "図表の読み取り", "複数情報の読み取り", 180, 70, High, 3),
    ("N-E01", "非言語", "特殊算・その他", "植木算・年齢算", 90, 85, Low, 3),
    ("N-E02", "非言語", "特殊算・その他", "集合の計算", 100, 80, Medium, 3),
    ("N-E03", "非言語", "特殊算・その他", "分割払い", 110, 75, Medium, 3),
    ("N-E04", "非言語", "特殊算・その他", "不定方程式", 120, 60, Low, 1),
    ("L-A01", "言語", "語彙知識", "二語の関係", 15, 95, Low, 4),
    ("L-A02", "言語", "語彙知識", "熟語の成り立ち", 20, 90, Medium, 4),
    ("L-A03", "言語", "語彙知識", "語句の定義", 25, 85, Medium, 5),
    ("L-B01", "言語", "文法・表現", "語句の用法", 30, 80, Medium, 4),
    ("L-B02", "言語", "文法・表現", "空欄補充", 40, 75, Medium, 4),
    ("L-B03", "言語", "文法・表現", "文の並べ替え", 100, 70, High, 5),
    ("L-C01", "言語", "文章読解", "長文読解", 480, 70, High, 5),
    ("L-C02", "言語", "文章読解", "論理的読解", 180, 65, High, 4),
];

/// Returns the built-in catalog.
pub fn default_catalog() -> Catalog {
    let entries = SEED
        .iter()
        .map(
            |&(id, subject, genre, unit, time, accuracy, difficulty, weight)| QuestionMeta {
                question_id: id.to_string(),
                subject: subject.to_string(),
                genre: genre.to_string(),
                unit: unit.to_string(),
                target_time_seconds: f64::from(time),
                target_accuracy_pct: f64::from(accuracy),
                difficulty,
                weight,
            },
        )
        .collect();

    // Seed ids are unique; see test_default_catalog.
    Catalog::new(entries).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog() {
        let catalog = default_catalog();
        assert_eq!(catalog.len(), 30);
        assert_eq!(catalog.get("N-A01").map(|m| m.target_time_seconds), Some(120.0));
        assert_eq!(catalog.get("L-C01").map(|m| m.difficulty), Some(Difficulty::High));
    }

    #[test]
    fn test_default_catalog_subjects() {
        let catalog = default_catalog();
        let verbal = catalog
            .entries()
            .iter()
            .filter(|m| m.subject == "言語")
            .count();
        assert_eq!(verbal, 8);
    }
}
