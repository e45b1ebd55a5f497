use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use moka::future::Cache;
use qdrant_client::qdrant::value::Kind;
use std::collections::HashMap;
use std::sync::Arc;
use trade_core::TradeDocument;
use trade_data_services::{VectorStore, CONTENT_KEY};

/// Nearest-neighbour text search over the trade history. Result order is
/// the backend's and callers must not rely on it.
#[async_trait]
pub trait TradeSearch: Send + Sync {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<TradeDocument>>;
}

const QUERY_CACHE_CAPACITY: u64 = 1_000;

/// Qdrant-backed search: embeds the query with BGE-small and returns the
/// stored payloads as documents
pub struct QdrantTradeSearch {
    embedding_model: TextEmbedding,
    vector_store: Arc<VectorStore>,
    query_cache: Cache<String, Arc<Vec<f32>>>,
}

impl QdrantTradeSearch {
    pub async fn new(vector_store: Arc<VectorStore>) -> Result<Self> {
        tracing::info!("Initializing trade search with BGE-small-en-v1.5 model...");

        let embedding_model =
            TextEmbedding::try_new(InitOptions::new(EmbeddingModel::BGESmallENV15))?;

        tracing::info!(
            "Trade search ready on collection {}",
            vector_store.collection_name()
        );

        Ok(Self {
            embedding_model,
            vector_store,
            query_cache: Cache::new(QUERY_CACHE_CAPACITY),
        })
    }

    async fn embed_query(&self, query: &str) -> Result<Arc<Vec<f32>>> {
        if let Some(hit) = self.query_cache.get(query).await {
            return Ok(hit);
        }

        let embedding = self
            .embedding_model
            .embed(vec![query.to_string()], None)?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Failed to generate embedding"))?;

        let embedding = Arc::new(embedding);
        self.query_cache
            .insert(query.to_string(), Arc::clone(&embedding))
            .await;
        Ok(embedding)
    }

    /// Payload to document. Every scalar becomes a string; the embedded
    /// text is pulled out as content.
    fn to_document(payload: HashMap<String, qdrant_client::qdrant::Value>) -> TradeDocument {
        let mut content = String::new();
        let mut fields = HashMap::with_capacity(payload.len());

        for (key, value) in payload {
            let Some(text) = Self::payload_string(&value) else {
                continue;
            };
            if key == CONTENT_KEY {
                content = text;
            } else {
                fields.insert(key, text);
            }
        }

        TradeDocument::new(content, fields)
    }

    fn payload_string(value: &qdrant_client::qdrant::Value) -> Option<String> {
        match value.kind.as_ref()? {
            Kind::StringValue(s) => Some(s.clone()),
            Kind::DoubleValue(d) => Some(d.to_string()),
            Kind::IntegerValue(i) => Some(i.to_string()),
            Kind::BoolValue(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

#[async_trait]
impl TradeSearch for QdrantTradeSearch {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<TradeDocument>> {
        let embedding = self.embed_query(query).await?;

        let scored_points = self
            .vector_store
            .search(embedding.as_ref().clone(), limit as u64)
            .await
            .context("Qdrant search failed")?;

        tracing::debug!(
            "Qdrant returned {} candidates for limit {}",
            scored_points.len(),
            limit
        );

        Ok(scored_points
            .into_iter()
            .map(|p| Self::to_document(p.payload))
            .collect())
    }
}
