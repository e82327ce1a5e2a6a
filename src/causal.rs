//! Cause/symptom inference over correlated patterns.
//!
//! Correlated pairs are labelled with two static priority tables. A pattern
//! type that ranks higher as a cause than its partner, where the partner can
//! be a symptom at all, is recorded as the partner's possible cause, and the
//! partner as its symptom. Equal cause priorities produce no label.

use crate::config::EngineConfig;
use crate::correlation::{self, Correlation};
use crate::model::{DiscoveredPattern, PatternType};
use ahash::AHashMap;
use itertools::Itertools;

pub fn cause_priority(t: PatternType) -> u8 {
    match t {
        PatternType::KeywordPattern => 4,
        PatternType::RecurringTheme => 3,
        PatternType::QuestionPattern => 2,
        PatternType::TimePattern => 1,
        PatternType::EmotionPattern | PatternType::EnergyPattern | PatternType::PositivePattern => 0,
    }
}

pub fn symptom_priority(t: PatternType) -> u8 {
    match t {
        PatternType::EmotionPattern => 4,
        PatternType::EnergyPattern => 3,
        PatternType::QuestionPattern => 2,
        _ => 0,
    }
}

/// How a partner pattern relates to the pattern being annotated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// The partner is a likely cause of this pattern.
    Cause,
    /// The partner is a likely symptom of this pattern.
    Symptom,
    Unclassified,
}

pub fn classify(me: PatternType, other: PatternType) -> Relation {
    let mine = cause_priority(me);
    let theirs = cause_priority(other);
    if theirs > mine {
        if symptom_priority(me) > 0 {
            return Relation::Cause;
        }
    } else if mine > theirs {
        if symptom_priority(other) > 0 {
            return Relation::Symptom;
        }
    }
    // TODO: equal priorities between two symptom types hint at a shared external cause; not inferred yet.
    Relation::Unclassified
}

/// Fills the relationship fields of every pattern from `correlations`.
/// Fields stay `None` when a pattern has no partner or no label of that kind.
pub fn annotate(mut patterns: Vec<DiscoveredPattern>, correlations: &[Correlation]) -> Vec<DiscoveredPattern> {
    let lookup: AHashMap<String, (PatternType, String)> = patterns
        .iter()
        .map(|p| (p.id.clone(), (p.pattern_type, p.name.clone())))
        .collect();

    for pattern in patterns.iter_mut() {
        let related: Vec<(&str, f64)> = correlations
            .iter()
            .filter_map(|c| c.partner_of(&pattern.id).map(|other| (other, c.strength)))
            .collect();
        if related.is_empty() {
            pattern.possible_causes = None;
            pattern.symptoms = None;
            pattern.related_pattern_ids = None;
            pattern.correlation_score = None;
            continue;
        }

        let mut causes = Vec::new();
        let mut symptoms = Vec::new();
        for (other_id, _) in &related {
            let Some((other_type, other_name)) = lookup.get(*other_id) else { continue };
            match classify(pattern.pattern_type, *other_type) {
                Relation::Cause => causes.push(other_name.clone()),
                Relation::Symptom => symptoms.push(other_name.clone()),
                Relation::Unclassified => {}
            }
        }
        let causes: Vec<String> = causes.into_iter().unique().collect();
        let symptoms: Vec<String> = symptoms.into_iter().unique().collect();

        pattern.correlation_score = Some(related.iter().map(|(_, s)| s).sum::<f64>() / related.len() as f64);
        pattern.related_pattern_ids = Some(related.iter().map(|(id, _)| id.to_string()).collect());
        pattern.possible_causes = (!causes.is_empty()).then_some(causes);
        pattern.symptoms = (!symptoms.is_empty()).then_some(symptoms);
    }
    patterns
}

/// Correlate, then label. Fewer than two patterns are returned untouched.
pub fn analyze_relationships(patterns: Vec<DiscoveredPattern>, config: &EngineConfig) -> Vec<DiscoveredPattern> {
    if patterns.len() < 2 {
        return patterns;
    }
    let correlations = correlation::compute_correlations(
        &patterns,
        config.offset(),
        config.correlation_min_shared_days,
        config.correlation_min_score,
    );
    tracing::debug!(patterns = patterns.len(), correlations = correlations.len(), "correlated patterns");
    annotate(patterns, &correlations)
}
