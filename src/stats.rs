//! Summary numbers over the journal: distributions, streaks, trends.

use crate::catalog;
use crate::model::{DiscoveredPattern, PatternType, ReflectionEntry};
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use itertools::Itertools;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

const ENERGY_TREND_WINDOW: usize = 30;
const HEATMAP_WEEKS: usize = 4;
const QUESTION_SHORT_CHARS: usize = 12;
const RADAR_SATURATION: f64 = 3.0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountItem {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionStat {
    pub id: &'static str,
    pub emoji: &'static str,
    pub short_name: String,
    pub rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnergyPoint {
    pub index: usize,
    pub energy: u8,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadarScore {
    pub pattern_type: PatternType,
    pub label: &'static str,
    pub score: f64,
}

/// Mean energy over entries that report one, 0.0 when none do.
pub fn average_energy(entries: &[ReflectionEntry]) -> f64 {
    let rated: Vec<f64> = entries.iter().filter(|e| e.has_energy()).map(|e| e.energy_level as f64).collect();
    if rated.is_empty() {
        return 0.0;
    }
    rated.iter().sum::<f64>() / rated.len() as f64
}

fn distribution<'a>(values: impl Iterator<Item = &'a str>) -> Vec<CountItem> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for v in values {
        *counts.entry(v).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .sorted_by(|(na, ca), (nb, cb)| cb.cmp(ca).then_with(|| na.cmp(nb)))
        .map(|(name, count)| CountItem { name: name.to_string(), count })
        .collect()
}

pub fn tag_distribution(entries: &[ReflectionEntry]) -> Vec<CountItem> {
    distribution(entries.iter().flat_map(|e| e.tags.iter().map(String::as_str)))
}

pub fn emotion_distribution(entries: &[ReflectionEntry]) -> Vec<CountItem> {
    distribution(entries.iter().map(|e| e.emotion.as_str()).filter(|e| !e.is_empty()))
}

/// Consecutive writing days ending today or yesterday; 0 once a day was skipped.
pub fn streak_days(entries: &[ReflectionEntry], today: NaiveDate, offset: FixedOffset) -> usize {
    let days: BTreeSet<NaiveDate> = entries.iter().map(|e| e.date.with_timezone(&offset).date_naive()).collect();
    let Some(&latest) = days.iter().next_back() else {
        return 0;
    };
    if (today - latest).num_days() > 1 {
        return 0;
    }
    let mut streak = 1;
    for (newer, older) in days.iter().rev().tuple_windows() {
        if (*newer - *older).num_days() == 1 {
            streak += 1;
        } else {
            break;
        }
    }
    streak
}

fn short_question(q: &str) -> String {
    let first = q.lines().next().unwrap_or_default();
    let trimmed = first.replace("오늘 하루 중 ", "").replace("있었나요?", "").replace("있나요?", "");
    crate::text::prefix_chars(&trimmed, QUESTION_SHORT_CHARS).to_string()
}

/// Share of entries answering each catalog question, most answered first.
/// Questions nobody answered are left out.
pub fn question_response_rates(entries: &[ReflectionEntry]) -> Vec<QuestionStat> {
    let total = entries.len();
    if total == 0 {
        return vec![];
    }
    catalog::QUESTIONS
        .iter()
        .filter_map(|q| {
            let answered = entries.iter().filter(|e| e.answer_to(q.id).is_some()).count();
            (answered > 0).then(|| QuestionStat {
                id: q.id,
                emoji: q.emoji,
                short_name: short_question(q.question),
                rate: answered as f64 / total as f64,
            })
        })
        .sorted_by(|a, b| b.rate.total_cmp(&a.rate))
        .collect()
}

/// Energy of the last 30 entries that report one, oldest first.
pub fn energy_trend(entries: &[ReflectionEntry]) -> Vec<EnergyPoint> {
    let mut recent: Vec<&ReflectionEntry> = entries.iter().collect();
    recent.sort_by(|a, b| b.date.cmp(&a.date));
    recent
        .into_iter()
        .take(ENERGY_TREND_WINDOW)
        .filter(|e| e.has_energy())
        .rev()
        .enumerate()
        .map(|(index, e)| EnergyPoint { index, energy: e.energy_level, date: e.date })
        .collect()
}

/// Entry counts for the last four weeks. Row 0 is the current week,
/// column 6 is today (or the same weekday offset in earlier weeks).
pub fn weekly_heatmap(entries: &[ReflectionEntry], today: NaiveDate, offset: FixedOffset) -> [[usize; 7]; HEATMAP_WEEKS] {
    let mut grid = [[0usize; 7]; HEATMAP_WEEKS];
    for entry in entries {
        let days_ago = (today - entry.date.with_timezone(&offset).date_naive()).num_days();
        if !(0..(HEATMAP_WEEKS as i64 * 7)).contains(&days_ago) {
            continue;
        }
        let week = (days_ago / 7) as usize;
        let day = (days_ago % 7) as usize;
        grid[week][6 - day] += 1;
    }
    grid
}

/// Unresolved pattern load per type, saturating at three patterns.
pub fn pattern_radar(patterns: &[DiscoveredPattern]) -> Vec<RadarScore> {
    PatternType::ALL
        .iter()
        .filter(|t| **t != PatternType::PositivePattern)
        .map(|&t| {
            let count = patterns.iter().filter(|p| p.pattern_type == t && !p.is_resolved).count();
            RadarScore { pattern_type: t, label: t.label(), score: (count as f64 / RADAR_SATURATION).min(1.0) }
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct JournalStats {
    pub total_entries: usize,
    pub average_energy: f64,
    pub streak_days: usize,
    pub active_patterns: usize,
    pub resolved_patterns: usize,
    pub tag_distribution: Vec<CountItem>,
    pub emotion_distribution: Vec<CountItem>,
    pub question_rates: Vec<QuestionStat>,
    pub energy_trend: Vec<EnergyPoint>,
    pub weekly_heatmap: [[usize; 7]; HEATMAP_WEEKS],
    pub pattern_radar: Vec<RadarScore>,
}

impl JournalStats {
    pub fn compute(
        entries: &[ReflectionEntry],
        patterns: &[DiscoveredPattern],
        now: DateTime<Utc>,
        offset: FixedOffset,
    ) -> Self {
        let today = now.with_timezone(&offset).date_naive();
        let resolved = patterns.iter().filter(|p| p.is_resolved).count();
        Self {
            total_entries: entries.len(),
            average_energy: average_energy(entries),
            streak_days: streak_days(entries, today, offset),
            active_patterns: patterns.len() - resolved,
            resolved_patterns: resolved,
            tag_distribution: tag_distribution(entries),
            emotion_distribution: emotion_distribution(entries),
            question_rates: question_response_rates(entries),
            energy_trend: energy_trend(entries),
            weekly_heatmap: weekly_heatmap(entries, today, offset),
            pattern_radar: pattern_radar(patterns),
        }
    }
}
