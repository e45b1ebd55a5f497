use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use trade_core::{DatasetBounds, TradeRecord};
use trade_data_services::{TradeCsvReader, VectorStore};

use super::memory::{ConversationMemory, Role};
use crate::config::AgentConfig;
use crate::error::AgentError;
use crate::llm::{
    AnswerContext, LlmClient, LlmConfig, PromptFormatter, QdrantTradeSearch, TextGenerator,
    TradeSearch,
};
use crate::pipeline::{
    extract_persona, DateRangeParser, PersonaSnapshot, PipelineOutput, QueryPipeline,
    RetrievalLimits,
};

/// Composed answer together with the pipeline output it was grounded on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub answer: String,
    pub output: PipelineOutput,
}

/// A booted trader assistant. Holds the read-only history, persona and
/// search backend; conversation state lives in the caller's
/// [`ConversationMemory`].
pub struct TraderAgent {
    config: AgentConfig,
    generator: Arc<dyn TextGenerator>,
    pipeline: QueryPipeline,
    persona: Arc<PersonaSnapshot>,
    bounds: DatasetBounds,
    history: Arc<Vec<TradeRecord>>,
}

impl TraderAgent {
    /// Derive dataset bounds and the persona once, and wire the pipeline
    pub fn boot(
        config: AgentConfig,
        generator: Arc<dyn TextGenerator>,
        search: Arc<dyn TradeSearch>,
        records: Vec<TradeRecord>,
    ) -> Result<Self, AgentError> {
        let bounds = DatasetBounds::from_records(&records).map_err(|_| AgentError::EmptyHistory)?;
        let persona = Arc::new(extract_persona(&records));
        let history = Arc::new(records);

        tracing::info!(
            "Trader agent booted: {} trades, {} → {}, style={}, risk={}",
            history.len(),
            bounds.min,
            bounds.max,
            persona.style,
            persona.risk
        );

        let pipeline = QueryPipeline::new(
            Arc::clone(&generator),
            search,
            Arc::clone(&history),
            Arc::clone(&persona),
            DateRangeParser::new(config.today, bounds),
            RetrievalLimits {
                top_k: config.top_k,
                search_k: config.search_k,
            },
        );

        Ok(Self {
            config,
            generator,
            pipeline,
            persona,
            bounds,
            history,
        })
    }

    /// Boot against the real services: CSV on disk, Qdrant, OpenAI.
    /// The collection must already be populated by the ingest tool.
    pub async fn connect(config: AgentConfig, llm_config: LlmConfig) -> anyhow::Result<Self> {
        let records = TradeCsvReader::load(&config.csv_path)
            .with_context(|| format!("Failed to load trades from {}", config.csv_path.display()))?;

        let vector_store = Arc::new(
            VectorStore::new(&config.qdrant_url, config.collection_name.clone()).await?,
        );
        let indexed = vector_store.point_count().await?;
        if indexed == 0 {
            tracing::warn!(
                "Collection {} is empty; run trade-ingest first",
                config.collection_name
            );
        }

        let search: Arc<dyn TradeSearch> = Arc::new(QdrantTradeSearch::new(vector_store).await?);
        let generator: Arc<dyn TextGenerator> = Arc::new(LlmClient::from_env(llm_config)?);

        Ok(Self::boot(config, generator, search, records)?)
    }

    pub fn persona(&self) -> &PersonaSnapshot {
        &self.persona
    }

    pub fn bounds(&self) -> DatasetBounds {
        self.bounds
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn trade_count(&self) -> usize {
        self.history.len()
    }

    /// Fresh memory sized from the configuration
    pub fn new_memory(&self) -> ConversationMemory {
        ConversationMemory::new(self.config.memory_turns)
    }

    /// Run the query pipeline only
    pub async fn run(&self, query: &str) -> Result<PipelineOutput, AgentError> {
        self.pipeline.run(query).await
    }

    /// One conversational turn: record the question, run the pipeline,
    /// compose a grounded answer and record it
    pub async fn chat(
        &self,
        memory: &mut ConversationMemory,
        query: &str,
    ) -> Result<ChatReply, AgentError> {
        memory.add(Role::User, query);

        let output = self.pipeline.run(query).await?;
        let history = memory.last_context(self.config.history_context_turns);

        let prompt = PromptFormatter::format_answer(&AnswerContext {
            query,
            intent: output.intent.intent,
            persona: &self.persona,
            window: &output.window,
            lessons: output.lessons.as_deref(),
            history: &history,
            evidence: &output.evidence,
        });

        let answer = self
            .generator
            .generate(&prompt)
            .await
            .map_err(AgentError::Generation)?;

        memory.add(Role::Assistant, answer.clone());

        Ok(ChatReply { answer, output })
    }
}
