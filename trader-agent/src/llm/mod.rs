pub mod llm_client;
pub mod metrics;
pub mod prompt_formatter;
pub mod rag_retriever;

// Re-export commonly used items
pub use llm_client::{LlmClient, LlmConfig, LlmProvider, LlmResponse, TextGenerator};
pub use metrics::{MetricsTimer, PipelineMetrics};
pub use prompt_formatter::{AnswerContext, PromptFormatter};
pub use rag_retriever::{QdrantTradeSearch, TradeSearch};
