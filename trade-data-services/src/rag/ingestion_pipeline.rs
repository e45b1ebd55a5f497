use anyhow::{anyhow, Result};
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::path::Path;
use std::sync::Arc;
use trade_core::TradeRecord;
use tracing;

use super::csv_reader::TradeCsvReader;
use super::trade_formatter::TradeFormatter;
use super::vector_store::{trade_to_point, VectorStore};

/// BGE-small-en-v1.5 output size
pub const EMBEDDING_DIM: u64 = 384;

const BATCH_SIZE: usize = 100;

/// Statistics from an ingestion run
#[derive(Debug, Default, Clone)]
pub struct IngestStats {
    pub records_loaded: usize,
    pub embeddings_generated: usize,
    pub points_uploaded: usize,
}

/// Ingestion pipeline that:
/// 1. Loads trade records from CSV
/// 2. Renders each record as one line of text
/// 3. Generates embeddings
/// 4. Uploads to Qdrant
///
/// The index is built once over the full history; there is no incremental
/// update path.
pub struct TradeIngestionPipeline {
    embedding_model: TextEmbedding,
    vector_store: Arc<VectorStore>,
}

impl TradeIngestionPipeline {
    /// Create a new ingestion pipeline
    ///
    /// `recreate` drops an existing collection so re-running ingestion over
    /// an edited CSV does not leave stale points behind.
    pub async fn new(qdrant_url: &str, collection_name: String, recreate: bool) -> Result<Self> {
        tracing::info!("Initializing ingestion pipeline for collection {}", collection_name);

        // Initialize embedding model (downloads BGE model on first run)
        tracing::info!("Loading embedding model (BGE-small-en-v1.5)...");
        let embedding_model = TextEmbedding::try_new(
            InitOptions::new(EmbeddingModel::BGESmallENV15).with_show_download_progress(true),
        )?;

        let vector_store = Arc::new(VectorStore::new(qdrant_url, collection_name).await?);
        vector_store.ensure_collection(EMBEDDING_DIM, recreate).await?;

        tracing::info!("Ingestion pipeline initialized successfully");

        Ok(Self {
            embedding_model,
            vector_store,
        })
    }

    /// Load a CSV export and ingest every row
    pub async fn ingest_csv<P: AsRef<Path>>(&mut self, path: P) -> Result<IngestStats> {
        let records = TradeCsvReader::load(path)?;
        self.ingest_records(&records).await
    }

    /// Embed and upload the given records. Point ids follow slice order.
    pub async fn ingest_records(&mut self, records: &[TradeRecord]) -> Result<IngestStats> {
        let mut stats = IngestStats {
            records_loaded: records.len(),
            ..Default::default()
        };

        if records.is_empty() {
            tracing::warn!("No trade records to ingest");
            return Ok(stats);
        }

        let mut all_points = Vec::with_capacity(records.len());
        let mut point_id = 0u64;

        for batch in records.chunks(BATCH_SIZE) {
            let texts: Vec<String> = batch.iter().map(|r| r.to_embedding_text()).collect();

            tracing::info!("Generating embeddings for batch of {} trades...", texts.len());

            let embeddings = self.embedding_model.embed(texts, None)?;
            if embeddings.len() != batch.len() {
                return Err(anyhow!(
                    "Embedding model returned {} vectors for {} trades",
                    embeddings.len(),
                    batch.len()
                ));
            }
            stats.embeddings_generated += embeddings.len();

            for (record, embedding) in batch.iter().zip(embeddings) {
                all_points.push(trade_to_point(record, embedding, point_id));
                point_id += 1;
            }
        }

        tracing::info!("Uploading {} points to Qdrant...", all_points.len());
        self.vector_store.upsert_points(all_points).await?;
        stats.points_uploaded = point_id as usize;

        tracing::info!("Ingestion complete: {:?}", stats);
        Ok(stats)
    }

    pub fn vector_store(&self) -> Arc<VectorStore> {
        Arc::clone(&self.vector_store)
    }
}
