use chrono::{DateTime, Duration, TimeZone, Utc};
use retroscope::config::EngineConfig;
use retroscope::detectors::{
    DetectionContext, Detector, EmotionDetector, EnergyDetector, KeywordDetector, PositiveDetector, QuestionDetector,
    TagDetector, TimeOfDayDetector,
};
use retroscope::model::{DiscoveredPattern, PatternSeverity, QuestionAnswer, ReflectionEntry};

fn day(n: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 21, 0, 0).unwrap() + Duration::days(n)
}

fn entry(n: i64, tags: &[&str], emotion: &str, energy: u8, answers: &[(&str, &str)]) -> ReflectionEntry {
    let answers = answers.iter().map(|(q, a)| QuestionAnswer::new(*q, "", *a)).collect();
    ReflectionEntry::new(answers, tags.iter().map(|t| t.to_string()).collect(), emotion, energy).at(day(n))
}

fn run(detector: &dyn Detector, entries: &[ReflectionEntry]) -> Vec<DiscoveredPattern> {
    run_with(detector, entries, &EngineConfig::default())
}

fn run_with(detector: &dyn Detector, entries: &[ReflectionEntry], cfg: &EngineConfig) -> Vec<DiscoveredPattern> {
    let ctx = DetectionContext::new(entries, cfg, day(100));
    detector.detect(&ctx)
}

fn find<'a>(patterns: &'a [DiscoveredPattern], id: &str) -> Option<&'a DiscoveredPattern> {
    patterns.iter().find(|p| p.id == id)
}

#[test]
fn tag_severity_follows_support_count() {
    for (n, expected) in [(3, PatternSeverity::Low), (4, PatternSeverity::Mid), (5, PatternSeverity::High), (7, PatternSeverity::High)] {
        let entries: Vec<_> = (0..n).map(|i| entry(i, &["업무"], "", 0, &[("gratitude", "고마웠다")])).collect();
        let out = run(&TagDetector, &entries);
        let p = find(&out, "tag_업무").expect("tag pattern");
        assert_eq!(p.frequency, n as usize);
        assert_eq!(p.severity, expected, "support {n}");
    }
}

#[test]
fn tag_below_noise_floor_is_ignored() {
    let entries = vec![entry(0, &["건강"], "", 0, &[]), entry(1, &["건강"], "", 0, &[]), entry(2, &["관계"], "", 0, &[])];
    assert!(run(&TagDetector, &entries).is_empty());
}

#[test]
fn tag_pairs_use_one_canonical_key() {
    let entries = vec![entry(0, &["A", "B"], "", 0, &[]), entry(1, &["A", "B"], "", 0, &[]), entry(2, &["B", "A"], "", 0, &[])];
    let out = run(&TagDetector, &entries);
    let pairs: Vec<&DiscoveredPattern> = out.iter().filter(|p| p.id.contains('+')).collect();
    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].id, "tag_A+B");
    assert_eq!(pairs[0].frequency, 3);
    assert!(find(&out, "tag_B+A").is_none());
}

#[test]
fn duplicate_and_empty_tags_count_once() {
    let entries: Vec<_> = (0..3).map(|i| entry(i, &["업무", "업무", ""], "", 0, &[])).collect();
    let out = run(&TagDetector, &entries);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].id, "tag_업무");
    assert_eq!(out[0].frequency, 3);
}

#[test]
fn tag_evidence_takes_newest_four_first_answers() {
    let long = "가".repeat(100);
    let entries: Vec<_> = (0..6)
        .map(|i| entry(i, &["업무"], "", 0, &[("proud_moment", ""), ("never_again", long.as_str())]))
        .collect();
    let out = run(&TagDetector, &entries);
    let p = find(&out, "tag_업무").unwrap();
    assert_eq!(p.evidence.len(), 4);
    assert_eq!(p.evidence[0].date, day(5));
    assert_eq!(p.evidence[3].date, day(2));
    assert_eq!(p.evidence[0].excerpt, format!("{}...", "가".repeat(80)));
}

#[test]
fn emotion_only_counts_negative_codes_in_window() {
    let mut entries: Vec<_> = (0..3).map(|i| entry(i, &[], "😔", 0, &[])).collect();
    entries.extend((3..6).map(|i| entry(i, &[], "😊", 0, &[])));
    let out = run(&EmotionDetector, &entries);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].id, "emotion_😔");
    assert_eq!(out[0].severity, PatternSeverity::Mid);
    assert_eq!(out[0].frequency, 3);
}

#[test]
fn emotion_outside_recent_window_is_not_seen() {
    // three old negative entries followed by ten newer neutral ones
    let mut entries: Vec<_> = (0..3).map(|i| entry(i, &[], "😰", 0, &[])).collect();
    entries.extend((3..13).map(|i| entry(i, &[], "😐", 0, &[])));
    assert!(run(&EmotionDetector, &entries).is_empty());
}

#[test]
fn emotion_reaches_high_at_five() {
    let entries: Vec<_> = (0..5).map(|i| entry(i, &[], "😮‍💨", 0, &[])).collect();
    let out = run(&EmotionDetector, &entries);
    assert_eq!(out[0].severity, PatternSeverity::High);
}

#[test]
fn energy_mean_three_is_high() {
    let entries: Vec<_> = [2, 3, 4].iter().enumerate().map(|(i, &e)| entry(i as i64, &[], "", e, &[])).collect();
    let out = run(&EnergyDetector, &entries);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].id, "energy_low");
    assert_eq!(out[0].severity, PatternSeverity::High);
    assert_eq!(out[0].frequency, 3);
}

#[test]
fn energy_mean_four_is_mid_and_above_four_is_nothing() {
    let fours: Vec<_> = (0..3).map(|i| entry(i, &[], "", 4, &[])).collect();
    assert_eq!(run(&EnergyDetector, &fours)[0].severity, PatternSeverity::Mid);

    let fives: Vec<_> = (0..3).map(|i| entry(i, &[], "", 5, &[])).collect();
    assert!(run(&EnergyDetector, &fives).is_empty());
}

#[test]
fn energy_ignores_unreported_levels() {
    let entries = vec![entry(0, &[], "", 0, &[]), entry(1, &[], "", 2, &[]), entry(2, &[], "", 0, &[]), entry(3, &[], "", 1, &[])];
    assert!(run(&EnergyDetector, &entries).is_empty());
}

#[test]
fn energy_uses_only_seven_most_recent() {
    let mut entries: Vec<_> = (0..3).map(|i| entry(i, &[], "", 1, &[])).collect();
    entries.extend((3..10).map(|i| entry(i, &[], "", 8, &[])));
    assert!(run(&EnergyDetector, &entries).is_empty());
}

#[test]
fn keyword_needs_four_entries() {
    let mut entries: Vec<_> = (0..4).map(|i| entry(i, &[], "", 0, &[("never_again", "긴 회의 때문에 지쳤다")])).collect();
    let out = run(&KeywordDetector, &entries);
    let p = find(&out, "word_회의").expect("keyword pattern");
    assert_eq!(p.severity, PatternSeverity::Low);
    assert_eq!(p.frequency, 4);
    assert!(p.evidence.iter().all(|e| e.excerpt.contains("회의")));

    entries.truncate(3);
    assert!(run(&KeywordDetector, &entries).is_empty());
}

#[test]
fn keyword_counts_once_per_entry_and_reaches_mid_at_six() {
    let entries: Vec<_> = (0..6).map(|i| entry(i, &[], "", 0, &[("a", "회의 회의 회의"), ("b", "회의")])).collect();
    let out = run(&KeywordDetector, &entries);
    let p = find(&out, "word_회의").unwrap();
    assert_eq!(p.frequency, 6);
    assert_eq!(p.severity, PatternSeverity::Mid);
}

#[test]
fn keyword_keeps_top_three_with_stable_ties() {
    let entries: Vec<_> = (0..4).map(|i| entry(i, &[], "", 0, &[("a", "회의 야근 보고서 출장 발표")])).collect();
    let out = run(&KeywordDetector, &entries);
    let ids: Vec<&str> = out.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["word_발표", "word_보고서", "word_야근"]);
}

#[test]
fn keyword_skips_stopwords() {
    let entries: Vec<_> = (0..5).map(|i| entry(i, &[], "", 0, &[("a", "그리고 오늘 하지만")])).collect();
    assert!(run(&KeywordDetector, &entries).is_empty());
}

#[test]
fn question_needs_five_recent_entries() {
    let entries: Vec<_> = (0..4).map(|i| entry(i, &[], "", 0, &[("never_again", "또 야근")])).collect();
    assert!(run(&QuestionDetector, &entries).is_empty());
}

#[test]
fn never_again_answers_flag_recurring_complaints() {
    let mut entries: Vec<_> = (0..4).map(|i| entry(i, &[], "", 0, &[("never_again", "또 야근")])).collect();
    entries.push(entry(4, &[], "", 0, &[("never_again", "")]));
    let out = run(&QuestionDetector, &entries);
    assert_eq!(out.len(), 1);
    let p = &out[0];
    assert_eq!(p.id, "q_never_again_frequent");
    assert_eq!(p.severity, PatternSeverity::Mid);
    assert_eq!(p.frequency, 4);
    assert_eq!(p.evidence[0].excerpt, "또 야근...");
    assert_eq!(p.evidence[0].date, day(3));
}

#[test]
fn energy_drain_answers_escalate_at_six() {
    let entries: Vec<_> = (0..6).map(|i| entry(i, &[], "", 0, &[("energy_drain", "회의")])).collect();
    let out = run(&QuestionDetector, &entries);
    let p = find(&out, "q_energy_drain_frequent").unwrap();
    assert_eq!(p.severity, PatternSeverity::High);

    let five: Vec<_> = (0..5).map(|i| entry(i, &[], "", 0, &[("energy_drain", "회의")])).collect();
    let out = run(&QuestionDetector, &five);
    assert_eq!(find(&out, "q_energy_drain_frequent").unwrap().severity, PatternSeverity::Mid);
}

#[test]
fn night_entries_with_negative_mood_form_time_pattern() {
    let entries: Vec<_> = (0..3).map(|i| entry(i, &[], "😤", 6, &[])).collect();
    let out = run(&TimeOfDayDetector, &entries);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].id, "time_밤");
    assert_eq!(out[0].severity, PatternSeverity::Mid);
    assert!(out[0].evidence.is_empty());
}

#[test]
fn low_energy_ratio_alone_triggers_time_pattern() {
    let morning = |n: i64, energy: u8| {
        let mut e = entry(n, &[], "😊", energy, &[]);
        e.date = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap() + Duration::days(n);
        e
    };
    let entries = vec![morning(0, 2), morning(1, 3), morning(2, 8), morning(3, 9)];
    let out = run(&TimeOfDayDetector, &entries);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].id, "time_오전");
    assert_eq!(out[0].frequency, 4);

    let healthy = vec![morning(0, 2), morning(1, 8), morning(2, 8), morning(3, 9)];
    assert!(run(&TimeOfDayDetector, &healthy).is_empty());
}

#[test]
fn time_buckets_follow_configured_offset() {
    // 14:00 UTC is 23:00 at +09:00
    let entries: Vec<_> = (0..3)
        .map(|i| {
            let mut e = entry(i, &[], "😔", 0, &[]);
            e.date = Utc.with_ymd_and_hms(2024, 3, 1, 14, 0, 0).unwrap() + Duration::days(i);
            e
        })
        .collect();
    assert_eq!(run(&TimeOfDayDetector, &entries)[0].id, "time_오후");

    let cfg = EngineConfig { utc_offset_minutes: 9 * 60, ..EngineConfig::default() };
    assert_eq!(run_with(&TimeOfDayDetector, &entries, &cfg)[0].id, "time_밤");
}

#[test]
fn positive_pattern_names_most_frequent_tag() {
    let entries = vec![
        entry(0, &["운동"], "😊", 0, &[("proud_moment", "달리기 완주")]),
        entry(1, &["운동", "독서"], "", 8, &[]),
        entry(2, &["독서"], "🔥", 0, &[]),
        entry(3, &["운동"], "😔", 2, &[]),
        entry(4, &["운동"], "💡", 0, &[]),
    ];
    let out = run(&PositiveDetector, &entries);
    assert_eq!(out.len(), 1);
    let p = &out[0];
    assert_eq!(p.id, "positive_운동");
    assert_eq!(p.frequency, 3);
    assert_eq!(p.severity, PatternSeverity::Positive);
    assert_eq!(p.evidence.len(), 3);
}

#[test]
fn positive_tie_picks_smallest_tag() {
    let entries = vec![
        entry(0, &["b"], "😊", 0, &[]),
        entry(1, &["b"], "😊", 0, &[]),
        entry(2, &["a"], "😊", 0, &[]),
        entry(3, &["a"], "😊", 0, &[]),
    ];
    assert_eq!(run(&PositiveDetector, &entries)[0].id, "positive_a");
}

#[test]
fn positive_needs_repeated_tag() {
    let entries = vec![entry(0, &["a"], "😊", 0, &[]), entry(1, &["b"], "😌", 0, &[]), entry(2, &["c"], "", 9, &[])];
    assert!(run(&PositiveDetector, &entries).is_empty());
}

#[test]
fn plus_spelled_tag_shares_the_pair_pattern() {
    let mut entries: Vec<_> = (0..3).map(|i| entry(i, &["A", "B"], "", 0, &[])).collect();
    entries.extend((3..6).map(|i| entry(i, &["A+B"], "", 0, &[])));
    let out = run(&TagDetector, &entries);
    let merged: Vec<&DiscoveredPattern> = out.iter().filter(|p| p.id == "tag_A+B").collect();
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].frequency, 6);
    assert_eq!(merged[0].name, "\"A\"와 \"B\"이 함께 등장");
}

#[test]
fn entry_carrying_both_spellings_counts_once() {
    let entries: Vec<_> = (0..3).map(|i| entry(i, &["A", "B", "A+B"], "", 0, &[])).collect();
    let out = run(&TagDetector, &entries);
    let ids: Vec<&str> = out.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids.iter().filter(|id| **id == "tag_A+B").count(), 1);
    assert_eq!(find(&out, "tag_A+B").unwrap().frequency, 3);
    assert_eq!(find(&out, "tag_A+B").unwrap().evidence.len(), 3);
}

#[test]
fn keyword_uses_only_fifteen_most_recent() {
    let mut entries: Vec<_> = (0..4).map(|i| entry(i, &[], "", 0, &[("a", "회의 때문에 늦음")])).collect();
    entries.extend((4..19).map(|i| entry(i, &[], "", 0, &[("a", "산책")])));
    let out = run(&KeywordDetector, &entries);
    assert!(find(&out, "word_회의").is_none());
    assert_eq!(find(&out, "word_산책").unwrap().frequency, 15);
}

#[test]
fn question_uses_only_ten_most_recent() {
    let mut entries: Vec<_> = (0..4).map(|i| entry(i, &[], "", 0, &[("never_again", "또 야근")])).collect();
    entries.extend((4..14).map(|i| entry(i, &[], "", 0, &[("gratitude", "가족")])));
    assert!(run(&QuestionDetector, &entries).is_empty());
}
