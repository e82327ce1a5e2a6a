use crate::causal;
use crate::config::EngineConfig;
use crate::detectors::{self, DetectionContext, Detector};
use crate::model::{DiscoveredPattern, ReflectionEntry};
use ahash::AHashMap;
use chrono::{DateTime, Utc};

/// Runs every detector over an entry snapshot, links the results and
/// carries resolved state over from the previous run.
///
/// The engine is pure apart from the wall clock used for `created_at`;
/// use [`PatternEngine::analyze_at`] to pin it.
pub struct PatternEngine {
    config: EngineConfig,
    detectors: Vec<Box<dyn Detector>>,
}

impl Default for PatternEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl PatternEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config, detectors: detectors::default_detectors() }
    }

    pub fn analyze(&self, entries: &[ReflectionEntry], existing: &[DiscoveredPattern]) -> Vec<DiscoveredPattern> {
        self.analyze_at(entries, existing, Utc::now())
    }

    pub fn analyze_at(
        &self,
        entries: &[ReflectionEntry],
        existing: &[DiscoveredPattern],
        now: DateTime<Utc>,
    ) -> Vec<DiscoveredPattern> {
        if entries.len() < self.config.min_entries {
            return vec![];
        }

        let ctx = DetectionContext::new(entries, &self.config, now);
        let mut patterns = Vec::new();
        for detector in &self.detectors {
            let found = detector.detect(&ctx);
            tracing::debug!(detector = detector.name(), found = found.len(), "detector finished");
            patterns.extend(found);
        }

        let mut patterns = causal::analyze_relationships(patterns, &self.config);
        carry_resolved_state(&mut patterns, existing);
        sort_patterns(&mut patterns);
        patterns
    }
}

/// Analysis with the stock thresholds.
pub fn analyze(entries: &[ReflectionEntry], existing: &[DiscoveredPattern]) -> Vec<DiscoveredPattern> {
    PatternEngine::default().analyze(entries, existing)
}

/// Marks patterns resolved when a resolved pattern with the same id exists.
pub fn carry_resolved_state(patterns: &mut [DiscoveredPattern], existing: &[DiscoveredPattern]) {
    let mut resolved: AHashMap<&str, Option<DateTime<Utc>>> = AHashMap::new();
    for p in existing.iter().filter(|p| p.is_resolved) {
        resolved.entry(p.id.as_str()).or_insert(p.resolved_at);
    }
    for p in patterns.iter_mut() {
        if let Some(at) = resolved.get(p.id.as_str()) {
            p.is_resolved = true;
            p.resolved_at = *at;
        }
    }
}

/// Unresolved first, then by severity rank. Stable.
pub fn sort_patterns(patterns: &mut [DiscoveredPattern]) {
    patterns.sort_by_key(|p| (p.is_resolved, p.severity.rank()));
}
