use anyhow::{Context, Result};
use qdrant_client::qdrant::{
    CreateCollectionBuilder, Distance, PointStruct, ScoredPoint, SearchPointsBuilder,
    UpsertPointsBuilder, VectorParamsBuilder,
};
use qdrant_client::Qdrant;
use serde_json::{Map, Value};
use trade_core::TradeRecord;
use tracing;

use super::trade_formatter::TradeFormatter;

/// Payload key holding the embedded text
pub const CONTENT_KEY: &str = "page_content";

/// Qdrant vector store for embedded trade records
pub struct VectorStore {
    client: Qdrant,
    collection_name: String,
}

impl VectorStore {
    /// Initialize Qdrant client (embedded for dev, cloud for prod)
    pub async fn new(qdrant_url: &str, collection_name: String) -> Result<Self> {
        let client = Qdrant::from_url(qdrant_url).build()?;

        tracing::info!("Connecting to Qdrant at {}", qdrant_url);

        Ok(Self {
            client,
            collection_name,
        })
    }

    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    /// Create the collection unless it is already there.
    /// With `recreate`, an existing collection is dropped first.
    pub async fn ensure_collection(&self, dimension: u64, recreate: bool) -> Result<()> {
        let exists = self
            .client
            .collection_exists(&self.collection_name)
            .await
            .context("Failed to check Qdrant collection")?;

        if exists && recreate {
            tracing::info!("Dropping Qdrant collection: {}", self.collection_name);
            self.client.delete_collection(&self.collection_name).await?;
        } else if exists {
            tracing::info!(
                "Qdrant collection {} already exists, reusing it",
                self.collection_name
            );
            return Ok(());
        }

        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.collection_name)
                    .vectors_config(VectorParamsBuilder::new(dimension, Distance::Cosine)),
            )
            .await
            .context("Failed to create Qdrant collection")?;

        tracing::info!("Created Qdrant collection: {}", self.collection_name);
        Ok(())
    }

    /// Upload points to Qdrant
    pub async fn upsert_points(&self, points: Vec<PointStruct>) -> Result<()> {
        if points.is_empty() {
            return Ok(());
        }

        tracing::info!("Upserting {} points to Qdrant", points.len());

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection_name, points).wait(true))
            .await?;

        Ok(())
    }

    /// Nearest neighbors of `query_vector`, best first, payload included
    pub async fn search(&self, query_vector: Vec<f32>, limit: u64) -> Result<Vec<ScoredPoint>> {
        let request = SearchPointsBuilder::new(&self.collection_name, query_vector, limit)
            .with_payload(true);

        let search_result = self.client.search_points(request).await?;

        Ok(search_result.result)
    }

    /// Number of points currently stored
    pub async fn point_count(&self) -> Result<u64> {
        let info = self
            .client
            .collection_info(&self.collection_name)
            .await
            .context("Failed to get collection info")?;

        Ok(info.result.and_then(|i| i.points_count).unwrap_or(0))
    }
}

/// Helper to create a Qdrant point from a trade record
///
/// The payload carries every CSV column as a string, the embedded text
/// under [`CONTENT_KEY`], and provenance metadata.
pub fn trade_to_point(record: &TradeRecord, embedding: Vec<f32>, point_id: u64) -> PointStruct {
    let git_sha = std::env::var("GIT_SHA").unwrap_or_else(|_| "dev".to_string());

    let mut payload: Map<String, Value> = record
        .to_field_map()
        .into_iter()
        .map(|(k, v)| (k, Value::String(v)))
        .collect();

    payload.insert(
        CONTENT_KEY.to_string(),
        Value::String(record.to_embedding_text()),
    );

    // Metadata & provenance
    payload.insert("schema_version".to_string(), Value::from(1));
    payload.insert(
        "embedding_model".to_string(),
        Value::from("bge-small-en-v1.5"),
    );
    payload.insert("embedding_dim".to_string(), Value::from(384));
    payload.insert("build_id".to_string(), Value::String(git_sha));

    PointStruct::new(point_id, embedding, payload)
}
