pub mod model;
pub mod catalog;
pub mod text;
pub mod config;
pub mod detectors;
pub mod correlation;
pub mod causal;
pub mod engine;
pub mod stats;
pub mod store;

pub use engine::{analyze, PatternEngine};
pub use model::{DiscoveredPattern, PatternEvidence, PatternSeverity, PatternType, QuestionAnswer, ReflectionEntry};
