use crate::catalog;
use crate::config::EngineConfig;
use crate::model::{
    pattern_id, DiscoveredPattern, PatternEvidence, PatternSeverity, PatternType, ReflectionEntry, TimePeriod,
};
use crate::text;
use ahash::AHashMap;
use chrono::{DateTime, Timelike, Utc};
use itertools::Itertools;
use std::collections::{BTreeMap, BTreeSet};

/// Shared input for every detector: the entry history newest-first.
pub struct DetectionContext<'a> {
    pub entries: Vec<&'a ReflectionEntry>,
    pub config: &'a EngineConfig,
    pub now: DateTime<Utc>,
}

impl<'a> DetectionContext<'a> {
    /// Orders `entries` newest-first, whatever order the caller kept them in.
    pub fn new(entries: &'a [ReflectionEntry], config: &'a EngineConfig, now: DateTime<Utc>) -> Self {
        let mut ordered: Vec<&ReflectionEntry> = entries.iter().collect();
        ordered.sort_by(|a, b| b.date.cmp(&a.date));
        Self { entries: ordered, config, now }
    }

    /// The `n` most recent entries.
    pub fn recent(&self, n: usize) -> &[&'a ReflectionEntry] {
        &self.entries[..n.min(self.entries.len())]
    }
}

/// A self-contained scan over the entry history.
pub trait Detector: Send + Sync {
    fn name(&self) -> &'static str;
    fn detect(&self, ctx: &DetectionContext<'_>) -> Vec<DiscoveredPattern>;
}

/// Detectors in the order their output is concatenated.
pub fn default_detectors() -> Vec<Box<dyn Detector>> {
    vec![
        Box::new(TagDetector),
        Box::new(EmotionDetector),
        Box::new(EnergyDetector),
        Box::new(KeywordDetector),
        Box::new(QuestionDetector),
        Box::new(TimeOfDayDetector),
        Box::new(PositiveDetector),
    ]
}

fn answer_evidence(entries: &[&ReflectionEntry], limit: usize) -> Vec<PatternEvidence> {
    entries
        .iter()
        .take(limit)
        .map(|e| PatternEvidence::new(e.date, text::first_answer_excerpt(e)))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagKey<'a> {
    Single(&'a str),
    Pair(&'a str, &'a str),
}

impl TagKey<'_> {
    fn id(self) -> String {
        match self {
            TagKey::Single(tag) => pattern_id::tag(tag),
            TagKey::Pair(a, b) => pattern_id::tag_pair(a, b),
        }
    }
}

struct TagGroup<'a> {
    key: TagKey<'a>,
    items: Vec<&'a ReflectionEntry>,
}

/// Groups are keyed by pattern id, so a free-form tag spelled `A+B` and the
/// pair (A, B) share one group. The pair spelling wins for naming.
fn add_to_group<'a>(groups: &mut BTreeMap<String, TagGroup<'a>>, key: TagKey<'a>, entry: &'a ReflectionEntry) {
    let group = groups.entry(key.id()).or_insert_with(|| TagGroup { key, items: Vec::new() });
    if matches!(key, TagKey::Pair(..)) {
        group.key = key;
    }
    if group.items.last().map_or(true, |e| e.id != entry.id) {
        group.items.push(entry);
    }
}

/// Tags and unordered tag pairs shared by several entries.
pub struct TagDetector;

impl Detector for TagDetector {
    fn name(&self) -> &'static str {
        "tag"
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Vec<DiscoveredPattern> {
        let cfg = ctx.config;
        let mut groups: BTreeMap<String, TagGroup<'_>> = BTreeMap::new();
        for &entry in &ctx.entries {
            let tags: Vec<&str> = entry
                .tags
                .iter()
                .map(String::as_str)
                .filter(|t| !t.is_empty())
                .sorted()
                .dedup()
                .collect();
            for &tag in &tags {
                add_to_group(&mut groups, TagKey::Single(tag), entry);
            }
            for (&a, &b) in tags.iter().tuple_combinations() {
                add_to_group(&mut groups, TagKey::Pair(a, b), entry);
            }
        }

        groups
            .into_iter()
            .filter(|(_, group)| group.items.len() >= cfg.tag_min_support)
            .map(|(id, TagGroup { key, items })| {
                let count = items.len();
                let severity = if count >= cfg.tag_high_support {
                    PatternSeverity::High
                } else if count >= cfg.tag_mid_support {
                    PatternSeverity::Mid
                } else {
                    PatternSeverity::Low
                };
                let (name, description, insight) = match key {
                    TagKey::Single(tag) => (
                        format!("\"{tag}\" 반복 언급"),
                        format!("최근 {count}회의 회고에서 이 주제가 반복적으로 등장합니다."),
                        "같은 주제가 반복될 때는 의지력이 아닌 환경/프로세스를 바꿔야 할 때입니다.",
                    ),
                    TagKey::Pair(a, b) => (
                        format!("\"{a}\"와 \"{b}\"이 함께 등장"),
                        format!("최근 {count}회의 회고에서 이 두 영역이 함께 등장합니다."),
                        "이 두 영역이 함께 등장한다는 것은 서로 영향을 주고받고 있을 가능성이 높습니다. 하나를 해결하면 다른 하나도 나아질 수 있습니다.",
                    ),
                };
                DiscoveredPattern {
                    name,
                    description,
                    frequency: count,
                    severity,
                    evidence: answer_evidence(&items, cfg.evidence_limit),
                    insight: insight.to_string(),
                    ..DiscoveredPattern::new(id, PatternType::RecurringTheme, ctx.now)
                }
            })
            .collect()
    }
}

/// Negative emotions that keep coming back in the recent window.
pub struct EmotionDetector;

impl Detector for EmotionDetector {
    fn name(&self) -> &'static str {
        "emotion"
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Vec<DiscoveredPattern> {
        let cfg = ctx.config;
        let mut groups: BTreeMap<&str, Vec<&ReflectionEntry>> = BTreeMap::new();
        for &entry in ctx.recent(cfg.emotion_window) {
            if catalog::is_negative_emotion(&entry.emotion) {
                groups.entry(entry.emotion.as_str()).or_default().push(entry);
            }
        }

        groups
            .into_iter()
            .filter(|(_, items)| items.len() >= cfg.emotion_min_count)
            .map(|(emoji, items)| {
                let count = items.len();
                let name = catalog::emotion_by_emoji(emoji).map(|e| e.label).unwrap_or(emoji);
                DiscoveredPattern {
                    name: format!("{name} 감정이 지속적으로 등장"),
                    description: format!(
                        "최근 {}회 회고 중 {count}회에서 \"{name}\" 감정이 나타납니다.",
                        cfg.emotion_window
                    ),
                    frequency: count,
                    severity: if count >= cfg.emotion_high_count { PatternSeverity::High } else { PatternSeverity::Mid },
                    evidence: answer_evidence(&items, cfg.evidence_limit),
                    insight: format!(
                        "감정은 신호입니다. \"{name}\"이 반복적으로 나타난다면, 이 감정을 유발하는 트리거를 찾아보세요. 특정 사람, 상황, 시간대와 연결될 수 있습니다."
                    ),
                    ..DiscoveredPattern::new(pattern_id::emotion(emoji), PatternType::EmotionPattern, ctx.now)
                }
            })
            .collect()
    }
}

/// Sustained low energy across the recent entries that report it.
pub struct EnergyDetector;

impl Detector for EnergyDetector {
    fn name(&self) -> &'static str {
        "energy"
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Vec<DiscoveredPattern> {
        let cfg = ctx.config;
        let rated: Vec<&ReflectionEntry> = ctx
            .recent(cfg.energy_window)
            .iter()
            .copied()
            .filter(|e| e.has_energy())
            .collect();
        if rated.len() < cfg.energy_min_entries {
            return vec![];
        }
        let mean = rated.iter().map(|e| e.energy_level as f64).sum::<f64>() / rated.len() as f64;
        if mean > cfg.energy_low_mean {
            return vec![];
        }

        vec![DiscoveredPattern {
            name: "에너지 레벨 지속 저하".to_string(),
            description: format!("최근 {}회 회고의 평균 에너지가 {mean:.1}/10입니다.", rated.len()),
            frequency: rated.len(),
            severity: if mean <= cfg.energy_high_mean { PatternSeverity::High } else { PatternSeverity::Mid },
            evidence: rated
                .iter()
                .take(cfg.evidence_limit)
                .map(|e| PatternEvidence::new(e.date, format!("에너지 {}/10", e.energy_level)))
                .collect(),
            insight: "낮은 에너지가 반복될 때 흔한 원인: 수면 부족, 과도한 컨텍스트 스위칭, 성취감 없는 작업 반복. 에너지가 높았던 날과 비교해보세요.".to_string(),
            ..DiscoveredPattern::new(pattern_id::ENERGY_LOW, PatternType::EnergyPattern, ctx.now)
        }]
    }
}

/// Words that show up across many recent entries.
pub struct KeywordDetector;

impl Detector for KeywordDetector {
    fn name(&self) -> &'static str {
        "keyword"
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Vec<DiscoveredPattern> {
        let cfg = ctx.config;
        let recent = ctx.recent(cfg.keyword_window);
        let mut support: AHashMap<String, Vec<&ReflectionEntry>> = AHashMap::new();
        for &entry in recent {
            let joined = entry.joined_answers();
            let unique: BTreeSet<&str> = text::keywords(&joined).collect();
            for word in unique {
                support.entry(word.to_string()).or_default().push(entry);
            }
        }

        support
            .into_iter()
            .filter(|(_, items)| items.len() >= cfg.keyword_min_support)
            .sorted_by(|(wa, a), (wb, b)| b.len().cmp(&a.len()).then_with(|| wa.cmp(wb)))
            .take(cfg.keyword_top)
            .map(|(word, items)| {
                let count = items.len();
                let evidence = items
                    .iter()
                    .take(cfg.evidence_limit)
                    .map(|e| PatternEvidence::new(e.date, text::keyword_excerpt(&e.joined_answers(), &word)))
                    .collect();
                DiscoveredPattern {
                    name: format!("\"{word}\" 키워드가 반복 등장"),
                    description: format!(
                        "최근 {}회 회고 중 {count}회에서 \"{word}\"가 등장합니다.",
                        cfg.keyword_window
                    ),
                    frequency: count,
                    severity: if count >= cfg.keyword_mid_support { PatternSeverity::Mid } else { PatternSeverity::Low },
                    evidence,
                    insight: format!(
                        "반복되는 키워드는 무의식이 보내는 신호일 수 있습니다. \"{word}\"에 대해 깊이 생각해볼 시간을 가져보세요."
                    ),
                    ..DiscoveredPattern::new(pattern_id::keyword(&word), PatternType::KeywordPattern, ctx.now)
                }
            })
            .collect()
    }
}

/// Two fixed checks on specific catalog questions: recurring "never again"
/// answers and recurring energy drains.
pub struct QuestionDetector;

impl QuestionDetector {
    fn answered(recent: &[&ReflectionEntry], question_id: &str) -> Vec<PatternEvidence> {
        recent
            .iter()
            .filter_map(|e| {
                e.answer_to(question_id)
                    .map(|a| PatternEvidence::new(e.date, text::excerpt(&a.answer, text::EXCERPT_CHARS)))
            })
            .collect()
    }
}

impl Detector for QuestionDetector {
    fn name(&self) -> &'static str {
        "question"
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Vec<DiscoveredPattern> {
        let cfg = ctx.config;
        let recent = ctx.recent(cfg.question_window);
        if recent.len() < cfg.question_min_entries {
            return vec![];
        }
        let mut out = Vec::new();

        let never_again = Self::answered(recent, catalog::NEVER_AGAIN);
        if never_again.len() >= cfg.question_min_answers {
            let count = never_again.len();
            out.push(DiscoveredPattern {
                name: "반복하기 싫은 일이 계속 생김".to_string(),
                description: format!(
                    "최근 {}회 회고 중 {count}회에서 '반복하고 싶지 않은 일'에 답변했습니다. 같은 유형의 불만이 반복되고 있을 수 있습니다.",
                    recent.len()
                ),
                frequency: count,
                severity: PatternSeverity::Mid,
                evidence: never_again.into_iter().take(cfg.evidence_limit).collect(),
                insight: "매번 반복하기 싫다고 느끼는 일이 있다면, 그것을 '피하는 것'이 아니라 '구조적으로 제거'할 방법을 고민해보세요. 프로세스 변경, 위임, 자동화 등.".to_string(),
                ..DiscoveredPattern::new(pattern_id::NEVER_AGAIN, PatternType::QuestionPattern, ctx.now)
            });
        }

        let energy_drain = Self::answered(recent, catalog::ENERGY_DRAIN);
        if energy_drain.len() >= cfg.question_min_answers {
            let count = energy_drain.len();
            out.push(DiscoveredPattern {
                name: "에너지 소모 요인이 지속적으로 존재".to_string(),
                description: format!(
                    "최근 {}회 회고 중 {count}회에서 에너지가 빠지는 순간을 보고했습니다.",
                    recent.len()
                ),
                frequency: count,
                severity: if count >= cfg.question_high_answers { PatternSeverity::High } else { PatternSeverity::Mid },
                evidence: energy_drain.into_iter().take(cfg.evidence_limit).collect(),
                insight: "에너지를 소모하는 요인이 계속 있다면, 그 요인을 줄이거나 에너지를 회복하는 루틴을 의도적으로 배치해보세요.".to_string(),
                ..DiscoveredPattern::new(pattern_id::ENERGY_DRAIN, PatternType::QuestionPattern, ctx.now)
            });
        }

        out
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct PeriodStats {
    count: usize,
    negative: usize,
    low_energy: usize,
}

/// Parts of the day where negative emotion or low energy concentrate.
pub struct TimeOfDayDetector;

impl Detector for TimeOfDayDetector {
    fn name(&self) -> &'static str {
        "time_of_day"
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Vec<DiscoveredPattern> {
        let cfg = ctx.config;
        let offset = cfg.offset();
        let mut periods = [PeriodStats::default(); 4];
        for entry in &ctx.entries {
            let period = TimePeriod::from_hour(entry.date.with_timezone(&offset).hour());
            let stats = &mut periods[period.index()];
            stats.count += 1;
            if catalog::is_negative_emotion(&entry.emotion) {
                stats.negative += 1;
            }
            if entry.has_energy() && entry.energy_level <= cfg.low_energy_max {
                stats.low_energy += 1;
            }
        }

        TimePeriod::ALL
            .iter()
            .filter_map(|&period| {
                let stats = periods[period.index()];
                if stats.count < cfg.time_min_entries {
                    return None;
                }
                let negative_ratio = stats.negative as f64 / stats.count as f64;
                let low_ratio = stats.low_energy as f64 / stats.count as f64;
                if negative_ratio < cfg.time_negative_ratio && low_ratio < cfg.time_low_energy_ratio {
                    return None;
                }
                let label = period.label();
                Some(DiscoveredPattern {
                    name: format!("{label} 시간대에 부정적 상태 집중"),
                    description: format!(
                        "{label}에 작성된 {}개의 회고 중 부정 감정 {}회, 낮은 에너지 {}회가 관찰됩니다.",
                        stats.count, stats.negative, stats.low_energy
                    ),
                    frequency: stats.count,
                    severity: PatternSeverity::Mid,
                    insight: format!("{label} 시간대에 특히 힘든 패턴이 보입니다. 이 시간대의 활동, 환경, 루틴을 점검해보세요."),
                    ..DiscoveredPattern::new(pattern_id::time(period), PatternType::TimePattern, ctx.now)
                })
            })
            .collect()
    }
}

/// The tag most often present when the user felt good or energetic.
pub struct PositiveDetector;

impl Detector for PositiveDetector {
    fn name(&self) -> &'static str {
        "positive"
    }

    fn detect(&self, ctx: &DetectionContext<'_>) -> Vec<DiscoveredPattern> {
        let cfg = ctx.config;
        let positive: Vec<&ReflectionEntry> = ctx
            .entries
            .iter()
            .copied()
            .filter(|e| catalog::is_positive_emotion(&e.emotion) || e.energy_level >= cfg.positive_energy_min)
            .collect();
        if positive.len() < cfg.positive_min_entries {
            return vec![];
        }

        let mut tag_counts: BTreeMap<&str, usize> = BTreeMap::new();
        for entry in &positive {
            for tag in entry.tags.iter().filter(|t| !t.is_empty()).unique() {
                *tag_counts.entry(tag.as_str()).or_insert(0) += 1;
            }
        }
        // Highest count wins; on a tie the lexicographically smallest tag.
        let Some((tag, count)) = tag_counts
            .into_iter()
            .max_by(|(ta, ca), (tb, cb)| ca.cmp(cb).then_with(|| tb.cmp(ta)))
        else {
            return vec![];
        };
        if count < cfg.positive_min_tag_count {
            return vec![];
        }

        let with_tag: Vec<&ReflectionEntry> = positive
            .iter()
            .copied()
            .filter(|e| e.tags.iter().any(|t| t == tag))
            .collect();
        vec![DiscoveredPattern {
            name: format!("\"{tag}\" 영역에서 에너지를 얻음"),
            description: format!(
                "긍정적 감정이나 높은 에너지를 보인 {}개 회고 중 {count}개가 \"{tag}\"와 연관됩니다.",
                positive.len()
            ),
            frequency: count,
            severity: PatternSeverity::Positive,
            evidence: answer_evidence(&with_tag, cfg.positive_evidence_limit),
            insight: "이 영역에 더 많은 시간과 에너지를 투자할 방법을 고민해보세요. 강점을 살리는 것이 약점을 보완하는 것보다 효과적인 경우가 많습니다.".to_string(),
            ..DiscoveredPattern::new(pattern_id::positive(tag), PatternType::PositivePattern, ctx.now)
        }]
    }
}
