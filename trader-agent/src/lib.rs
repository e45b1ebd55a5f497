pub mod agent;
pub mod config;
pub mod error;
pub mod llm;
pub mod pipeline;

// Re-export commonly used items
pub use agent::{ChatReply, ConversationMemory, Role, TraderAgent};
pub use config::AgentConfig;
pub use error::AgentError;
pub use llm::{LlmClient, LlmConfig, QdrantTradeSearch, TextGenerator, TradeSearch};
pub use pipeline::{
    IntentKind, IntentResult, LessonsStats, PersonaSnapshot, PipelineNode, PipelineOutput,
    QueryPipeline, ScoredEvidence,
};
