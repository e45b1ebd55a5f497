pub mod dates;
pub mod filters;
pub mod intent;
pub mod lessons;
pub mod orchestrator;
pub mod persona;
pub mod retrieval;
pub mod scoring;

// Re-export commonly used items
pub use dates::{parse_raw_window, DateRangeParser};
pub use filters::extract_filters;
pub use intent::{fallback_intent, parse_intent_response, IntentKind, IntentResolver, IntentResult};
pub use lessons::{compute_lessons, AssetWinRate, FeatureAverages, LessonsStats, TagStats};
pub use orchestrator::{PipelineNode, PipelineOutput, QueryPipeline, RetrievalLimits};
pub use persona::{extract_persona, PersonaSnapshot, RiskLevel, TradingStyle};
pub use retrieval::{rank_candidates, retrieve_evidence, RetrievalCounts, ScoredEvidence};
pub use scoring::{score_document, setup_score, SetupIndicators};
