pub mod rag;

// Re-export commonly used items
pub use rag::{
    IngestStats, TradeCsvReader, TradeFormatter, TradeIngestionPipeline, VectorStore,
    CONTENT_KEY, EMBEDDING_DIM,
};
