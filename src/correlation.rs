use crate::model::DiscoveredPattern;
use chrono::{FixedOffset, NaiveDate};
use std::collections::BTreeSet;

/// Two patterns whose evidence falls on largely the same calendar days.
#[derive(Debug, Clone, PartialEq)]
pub struct Correlation {
    pub a: String,
    pub b: String,
    pub shared_days: usize,
    pub strength: f64,
}

impl Correlation {
    /// The id on the other side of the link, if `id` takes part in it.
    pub fn partner_of(&self, id: &str) -> Option<&str> {
        if self.a == id {
            Some(&self.b)
        } else if self.b == id {
            Some(&self.a)
        } else {
            None
        }
    }
}

/// Calendar days (in `offset` local time) on which a pattern has evidence.
pub fn evidence_days(pattern: &DiscoveredPattern, offset: FixedOffset) -> BTreeSet<NaiveDate> {
    pattern
        .evidence
        .iter()
        .map(|e| e.date.with_timezone(&offset).date_naive())
        .collect()
}

/// Shared day count and Jaccard similarity of two day sets.
pub fn jaccard(a: &BTreeSet<NaiveDate>, b: &BTreeSet<NaiveDate>) -> (usize, f64) {
    let shared = a.intersection(b).count();
    let union = a.len() + b.len() - shared;
    let strength = if union > 0 { (shared as f64) / (union as f64) } else { 0.0 };
    (shared, strength)
}

/// Pairwise links between patterns, strongest first. A pair is kept only
/// when it shares at least `min_shared_days` days and reaches `min_strength`.
pub fn compute_correlations(
    patterns: &[DiscoveredPattern],
    offset: FixedOffset,
    min_shared_days: usize,
    min_strength: f64,
) -> Vec<Correlation> {
    let days: Vec<BTreeSet<NaiveDate>> = patterns.iter().map(|p| evidence_days(p, offset)).collect();
    let mut out = Vec::new();
    for i in 0..patterns.len() {
        for j in (i + 1)..patterns.len() {
            let (shared, strength) = jaccard(&days[i], &days[j]);
            if shared < min_shared_days || strength < min_strength {
                continue;
            }
            out.push(Correlation {
                a: patterns[i].id.clone(),
                b: patterns[j].id.clone(),
                shared_days: shared,
                strength,
            });
        }
    }
    // stable: equal strengths keep pair order
    out.sort_by(|x, y| y.strength.total_cmp(&x.strength));
    out
}
