pub mod trade_formatter;
pub mod csv_reader;
pub mod vector_store;
pub mod ingestion_pipeline;

// Re-export commonly used items
pub use trade_formatter::TradeFormatter;
pub use csv_reader::TradeCsvReader;
pub use vector_store::{trade_to_point, VectorStore, CONTENT_KEY};
pub use ingestion_pipeline::{IngestStats, TradeIngestionPipeline, EMBEDDING_DIM};
