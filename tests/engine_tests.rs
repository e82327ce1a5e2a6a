use chrono::{DateTime, Duration, TimeZone, Utc};
use retroscope::config::EngineConfig;
use retroscope::engine::{carry_resolved_state, sort_patterns};
use retroscope::model::{DiscoveredPattern, PatternSeverity, PatternType, QuestionAnswer, ReflectionEntry};
use retroscope::{analyze, PatternEngine};

fn day(n: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 4, 21, 0, 0).unwrap() + Duration::days(n)
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 20, 9, 0, 0).unwrap()
}

fn entry(n: i64, tags: &[&str], emotion: &str, energy: u8, answer: &str) -> ReflectionEntry {
    let answers = vec![QuestionAnswer::new("never_again", "반복하고 싶지 않은 일은?", answer)];
    ReflectionEntry::new(answers, tags.iter().map(|t| t.to_string()).collect(), emotion, energy).at(day(n))
}

fn meeting_week() -> Vec<ReflectionEntry> {
    (0..5)
        .map(|i| entry(i, &["회의"], "😤", if i % 2 == 0 { 2 } else { 3 }, "회의가 너무 길어서 집중하지 못했다"))
        .collect()
}

fn find<'a>(patterns: &'a [DiscoveredPattern], id: &str) -> &'a DiscoveredPattern {
    patterns.iter().find(|p| p.id == id).unwrap_or_else(|| panic!("missing pattern {id}"))
}

#[test]
fn fewer_than_two_entries_yield_nothing() {
    let engine = PatternEngine::default();
    assert!(engine.analyze_at(&[], &[], now()).is_empty());

    let one = vec![entry(0, &["회의", "야근", "보고"], "😤", 1, "회의 야근 보고")];
    assert!(engine.analyze_at(&one, &[], now()).is_empty());
}

#[test]
fn meeting_week_links_theme_to_emotion() {
    let out = PatternEngine::default().analyze_at(&meeting_week(), &[], now());

    let theme = find(&out, "tag_회의");
    assert_eq!(theme.pattern_type, PatternType::RecurringTheme);
    assert_eq!(theme.severity, PatternSeverity::High);
    assert_eq!(theme.frequency, 5);
    assert_eq!(theme.evidence.len(), 4);
    assert_eq!(theme.evidence[0].date, day(4));

    let emotion = find(&out, "emotion_😤");
    assert_eq!(emotion.severity, PatternSeverity::High);
    assert!(emotion.name.contains("답답함"));
    assert!(emotion.related_pattern_ids.as_ref().unwrap().contains(&"tag_회의".to_string()));
    assert!(emotion.possible_causes.as_ref().unwrap().contains(&theme.name));
    assert!(theme.symptoms.as_ref().unwrap().contains(&emotion.name));

    let energy = find(&out, "energy_low");
    assert_eq!(energy.severity, PatternSeverity::High);

    // time patterns carry no evidence and so never link
    let night = find(&out, "time_밤");
    assert!(night.related_pattern_ids.is_none());

    assert!(find(&out, "q_never_again_frequent").frequency == 5);
}

#[test]
fn analysis_is_idempotent_for_a_fixed_clock() {
    let entries = meeting_week();
    let engine = PatternEngine::default();
    let first = engine.analyze_at(&entries, &[], now());
    let second = engine.analyze_at(&entries, &first, now());
    assert_eq!(first, second);
}

#[test]
fn input_order_does_not_matter() {
    let entries = meeting_week();
    let mut reversed = entries.clone();
    reversed.reverse();
    let engine = PatternEngine::default();
    assert_eq!(engine.analyze_at(&entries, &[], now()), engine.analyze_at(&reversed, &[], now()));
}

#[test]
fn resolved_state_survives_reanalysis() {
    let entries = meeting_week();
    let engine = PatternEngine::default();
    let mut first = engine.analyze_at(&entries, &[], now());
    let resolved_at = Utc.with_ymd_and_hms(2024, 3, 10, 8, 0, 0).unwrap();
    for p in first.iter_mut().filter(|p| p.id == "tag_회의") {
        p.is_resolved = true;
        p.resolved_at = Some(resolved_at);
    }

    let second = engine.analyze_at(&entries, &first, now());
    let theme = find(&second, "tag_회의");
    assert!(theme.is_resolved);
    assert_eq!(theme.resolved_at, Some(resolved_at));
    assert_eq!(second.last().map(|p| p.id.as_str()), Some("tag_회의"));
    assert_eq!(second.iter().filter(|p| p.is_resolved).count(), 1);
}

#[test]
fn unresolved_previous_patterns_change_nothing() {
    let entries = meeting_week();
    let engine = PatternEngine::default();
    let first = engine.analyze_at(&entries, &[], now());
    let second = engine.analyze_at(&entries, &first, now());
    assert!(second.iter().all(|p| !p.is_resolved));
}

#[test]
fn expired_patterns_disappear_silently() {
    let engine = PatternEngine::default();
    let mut previous = engine.analyze_at(&meeting_week(), &[], now());
    for p in previous.iter_mut() {
        p.is_resolved = true;
    }
    let quiet = vec![entry(0, &["산책"], "😊", 8, "산책"), entry(1, &["독서"], "😌", 7, "독서")];
    let out = engine.analyze_at(&quiet, &previous, now());
    assert!(out.iter().all(|p| !p.id.starts_with("tag_회의")));
}

#[test]
fn output_is_sorted_by_resolution_then_severity() {
    let out = PatternEngine::default().analyze_at(&meeting_week(), &[], now());
    assert!(out
        .windows(2)
        .all(|w| (w[0].is_resolved, w[0].severity.rank()) <= (w[1].is_resolved, w[1].severity.rank())));
}

#[test]
fn sort_is_stable_within_a_rank() {
    let at = now();
    let mk = |id: &str, severity: PatternSeverity, resolved: bool| DiscoveredPattern {
        severity,
        is_resolved: resolved,
        ..DiscoveredPattern::new(id, PatternType::RecurringTheme, at)
    };
    let mut patterns = vec![
        mk("low", PatternSeverity::Low, false),
        mk("resolved_high", PatternSeverity::High, true),
        mk("positive", PatternSeverity::Positive, false),
        mk("high_1", PatternSeverity::High, false),
        mk("mid", PatternSeverity::Mid, false),
        mk("high_2", PatternSeverity::High, false),
    ];
    sort_patterns(&mut patterns);
    let ids: Vec<&str> = patterns.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["high_1", "high_2", "mid", "low", "positive", "resolved_high"]);
}

#[test]
fn first_resolved_duplicate_wins() {
    let at = now();
    let t1 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let t2 = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
    let existing = vec![
        DiscoveredPattern { is_resolved: false, ..DiscoveredPattern::new("x", PatternType::RecurringTheme, at) },
        DiscoveredPattern { is_resolved: true, resolved_at: Some(t1), ..DiscoveredPattern::new("x", PatternType::RecurringTheme, at) },
        DiscoveredPattern { is_resolved: true, resolved_at: Some(t2), ..DiscoveredPattern::new("x", PatternType::RecurringTheme, at) },
    ];
    let mut fresh = vec![DiscoveredPattern::new("x", PatternType::RecurringTheme, at)];
    carry_resolved_state(&mut fresh, &existing);
    assert!(fresh[0].is_resolved);
    assert_eq!(fresh[0].resolved_at, Some(t1));
}

#[test]
fn custom_thresholds_change_detection() {
    let cfg = EngineConfig { tag_min_support: 6, ..EngineConfig::default() };
    let out = PatternEngine::new(cfg).analyze_at(&meeting_week(), &[], now());
    assert!(out.iter().all(|p| p.id != "tag_회의"));
}

#[test]
fn free_function_uses_stock_thresholds() {
    let out = analyze(&meeting_week(), &[]);
    assert!(out.iter().any(|p| p.id == "tag_회의"));
}

#[test]
fn pattern_ids_stay_unique_and_never_self_link() {
    let mut entries: Vec<_> = (0..3).map(|i| entry(i, &["A", "B"], "😔", 3, "야근")).collect();
    entries.extend((0..3).map(|i| entry(i, &["A+B"], "😔", 3, "야근")));
    let out = PatternEngine::default().analyze_at(&entries, &[], now());

    let mut ids: Vec<&str> = out.iter().map(|p| p.id.as_str()).collect();
    ids.sort_unstable();
    let total = ids.len();
    ids.dedup();
    assert_eq!(ids.len(), total);

    for p in &out {
        let Some(related) = &p.related_pattern_ids else { continue };
        assert!(!related.contains(&p.id), "{} links to itself", p.id);
        let mut unique = related.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), related.len(), "{} repeats a partner", p.id);
    }
}
