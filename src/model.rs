use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One answered (or skipped) question inside a reflection entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionAnswer {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub question_id: String,
    pub question: String,
    #[serde(default)]
    pub answer: String,
}

impl QuestionAnswer {
    pub fn new(question_id: impl Into<String>, question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            question_id: question_id.into(),
            question: question.into(),
            answer: answer.into(),
        }
    }

    pub fn is_answered(&self) -> bool {
        !self.answer.is_empty()
    }
}

/// A journal record. Entries are created once and only ever deleted, never edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReflectionEntry {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub answers: Vec<QuestionAnswer>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub emotion: String,
    /// 1-10, 0 when not reported.
    #[serde(default)]
    pub energy_level: u8,
}

impl ReflectionEntry {
    pub fn new(answers: Vec<QuestionAnswer>, tags: Vec<String>, emotion: impl Into<String>, energy_level: u8) -> Self {
        Self {
            id: Uuid::new_v4(),
            date: Utc::now(),
            answers,
            tags,
            emotion: emotion.into(),
            energy_level,
        }
    }

    /// Same entry, stamped with a different creation time.
    pub fn at(mut self, date: DateTime<Utc>) -> Self {
        self.date = date;
        self
    }

    pub fn has_energy(&self) -> bool {
        self.energy_level > 0
    }

    pub fn first_answer(&self) -> Option<&str> {
        self.answers.iter().find(|a| a.is_answered()).map(|a| a.answer.as_str())
    }

    pub fn answer_to(&self, question_id: &str) -> Option<&QuestionAnswer> {
        self.answers.iter().find(|a| a.question_id == question_id && a.is_answered())
    }

    /// All answers joined by a single space, skipped ones included as empty strings.
    pub fn joined_answers(&self) -> String {
        self.answers.iter().map(|a| a.answer.as_str()).collect::<Vec<_>>().join(" ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    RecurringTheme,
    EmotionPattern,
    EnergyPattern,
    KeywordPattern,
    TimePattern,
    PositivePattern,
    QuestionPattern,
}

impl PatternType {
    pub const ALL: [PatternType; 7] = [
        PatternType::RecurringTheme,
        PatternType::EmotionPattern,
        PatternType::EnergyPattern,
        PatternType::KeywordPattern,
        PatternType::TimePattern,
        PatternType::PositivePattern,
        PatternType::QuestionPattern,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PatternType::RecurringTheme => "반복 주제",
            PatternType::EmotionPattern => "감정",
            PatternType::EnergyPattern => "에너지",
            PatternType::KeywordPattern => "키워드",
            PatternType::TimePattern => "시간대",
            PatternType::PositivePattern => "강점",
            PatternType::QuestionPattern => "질문 응답",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PatternType::RecurringTheme => "recurring_theme",
            PatternType::EmotionPattern => "emotion_pattern",
            PatternType::EnergyPattern => "energy_pattern",
            PatternType::KeywordPattern => "keyword_pattern",
            PatternType::TimePattern => "time_pattern",
            PatternType::PositivePattern => "positive_pattern",
            PatternType::QuestionPattern => "question_pattern",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternSeverity {
    High,
    Mid,
    Low,
    Positive,
}

impl PatternSeverity {
    /// Sort ordinal: lower ranks are shown first.
    pub fn rank(self) -> u8 {
        match self {
            PatternSeverity::High => 0,
            PatternSeverity::Mid => 1,
            PatternSeverity::Low => 2,
            PatternSeverity::Positive => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PatternSeverity::High => "주의 필요",
            PatternSeverity::Mid => "관찰 중",
            PatternSeverity::Low => "참고",
            PatternSeverity::Positive => "강점",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PatternSeverity::High => "high",
            PatternSeverity::Mid => "mid",
            PatternSeverity::Low => "low",
            PatternSeverity::Positive => "positive",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternEvidence {
    pub date: DateTime<Utc>,
    pub excerpt: String,
}

impl PatternEvidence {
    pub fn new(date: DateTime<Utc>, excerpt: impl Into<String>) -> Self {
        Self { date, excerpt: excerpt.into() }
    }
}

/// A derived observation. Regenerated on every analysis run; only the
/// resolved flag survives between runs, matched through `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredPattern {
    pub id: String,
    #[serde(rename = "type")]
    pub pattern_type: PatternType,
    pub name: String,
    pub description: String,
    pub frequency: usize,
    pub severity: PatternSeverity,
    pub evidence: Vec<PatternEvidence>,
    pub insight: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_resolved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub possible_causes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symptoms: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_pattern_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_score: Option<f64>,
}

impl DiscoveredPattern {
    /// Blank pattern carrying only identity; detectors fill the rest with struct update syntax.
    pub fn new(id: impl Into<String>, pattern_type: PatternType, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            pattern_type,
            name: String::new(),
            description: String::new(),
            frequency: 0,
            severity: PatternSeverity::Low,
            evidence: Vec::new(),
            insight: String::new(),
            created_at,
            is_resolved: false,
            resolved_at: None,
            possible_causes: None,
            symptoms: None,
            related_pattern_ids: None,
            correlation_score: None,
        }
    }
}

/// Part of the day an entry was written in, by local hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimePeriod {
    Dawn,
    Morning,
    Afternoon,
    Night,
}

impl TimePeriod {
    pub const ALL: [TimePeriod; 4] = [TimePeriod::Dawn, TimePeriod::Morning, TimePeriod::Afternoon, TimePeriod::Night];

    pub fn from_hour(hour: u32) -> Self {
        match hour {
            0..=5 => TimePeriod::Dawn,
            6..=11 => TimePeriod::Morning,
            12..=17 => TimePeriod::Afternoon,
            _ => TimePeriod::Night,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TimePeriod::Dawn => "새벽",
            TimePeriod::Morning => "오전",
            TimePeriod::Afternoon => "오후",
            TimePeriod::Night => "밤",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Deterministic pattern keys. Every id the engine emits is built here so
/// resolved state keeps matching across runs.
pub mod pattern_id {
    use super::TimePeriod;

    pub const ENERGY_LOW: &str = "energy_low";
    pub const NEVER_AGAIN: &str = "q_never_again_frequent";
    pub const ENERGY_DRAIN: &str = "q_energy_drain_frequent";

    pub fn tag(tag: &str) -> String {
        format!("tag_{tag}")
    }

    pub fn tag_pair(a: &str, b: &str) -> String {
        format!("tag_{a}+{b}")
    }

    pub fn emotion(emoji: &str) -> String {
        format!("emotion_{emoji}")
    }

    pub fn keyword(word: &str) -> String {
        format!("word_{word}")
    }

    pub fn time(period: TimePeriod) -> String {
        format!("time_{}", period.label())
    }

    pub fn positive(tag: &str) -> String {
        format!("positive_{tag}")
    }
}
