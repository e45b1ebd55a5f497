//! Per-query state machine.
//!
//! ```text
//! intent -> dates -> retrieve -+-> lessons -> done   (intent == reflect)
//!                              +-> done              (otherwise)
//! ```
//!
//! Each run owns its own [`PipelineState`]; the history, search backend
//! and persona are shared read-only.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use trade_core::{DateWindow, StructuredFilters, TradeRecord};

use super::dates::DateRangeParser;
use super::filters::extract_filters;
use super::intent::{IntentKind, IntentResolver, IntentResult};
use super::lessons::compute_lessons;
use super::persona::PersonaSnapshot;
use super::retrieval::{retrieve_evidence, ScoredEvidence};
use crate::error::AgentError;
use crate::llm::{MetricsTimer, PipelineMetrics, PromptFormatter, TextGenerator, TradeSearch};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineNode {
    Intent,
    Dates,
    Retrieve,
    Lessons,
    Done,
}

impl PipelineNode {
    /// The only branch is after `retrieve`, on the resolved intent
    pub fn next(self, intent: Option<IntentKind>) -> PipelineNode {
        match self {
            PipelineNode::Intent => PipelineNode::Dates,
            PipelineNode::Dates => PipelineNode::Retrieve,
            PipelineNode::Retrieve if intent == Some(IntentKind::Reflect) => PipelineNode::Lessons,
            PipelineNode::Retrieve => PipelineNode::Done,
            PipelineNode::Lessons | PipelineNode::Done => PipelineNode::Done,
        }
    }
}

/// Mutable state of one run
#[derive(Debug, Default)]
struct PipelineState {
    intent: Option<IntentResult>,
    window: DateWindow,
    filters: StructuredFilters,
    evidence: Vec<ScoredEvidence>,
    lessons: Option<String>,
    metrics: PipelineMetrics,
}

/// Result of one run: everything answer composition needs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOutput {
    pub query: String,
    pub intent: IntentResult,
    /// Intent filters with regex filters filling the gaps
    pub filters: StructuredFilters,
    pub window: DateWindow,
    pub evidence: Vec<ScoredEvidence>,
    pub lessons: Option<String>,
    /// Nodes visited, in order
    pub path: Vec<PipelineNode>,
}

/// Retrieval sizing
#[derive(Debug, Clone, Copy)]
pub struct RetrievalLimits {
    pub top_k: usize,
    pub search_k: usize,
}

impl Default for RetrievalLimits {
    fn default() -> Self {
        Self {
            top_k: 5,
            search_k: 12,
        }
    }
}

pub struct QueryPipeline {
    generator: Arc<dyn TextGenerator>,
    search: Arc<dyn TradeSearch>,
    history: Arc<Vec<TradeRecord>>,
    persona: Arc<PersonaSnapshot>,
    dates: DateRangeParser,
    limits: RetrievalLimits,
}

impl QueryPipeline {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        search: Arc<dyn TradeSearch>,
        history: Arc<Vec<TradeRecord>>,
        persona: Arc<PersonaSnapshot>,
        dates: DateRangeParser,
        limits: RetrievalLimits,
    ) -> Self {
        Self {
            generator,
            search,
            history,
            persona,
            dates,
            limits,
        }
    }

    /// Run one query from `intent` to `done`
    pub async fn run(&self, query: &str) -> Result<PipelineOutput, AgentError> {
        let mut state = PipelineState::default();
        let mut path = Vec::new();
        let mut node = PipelineNode::Intent;

        while node != PipelineNode::Done {
            self.step(node, query, &mut state).await?;
            path.push(node);
            node = node.next(state.intent.as_ref().map(|i| i.intent));
        }
        path.push(PipelineNode::Done);

        state.metrics.report();

        let intent = state
            .intent
            .unwrap_or_else(|| IntentResult::new(IntentKind::Generic));

        Ok(PipelineOutput {
            query: query.to_string(),
            intent,
            filters: state.filters,
            window: state.window,
            evidence: state.evidence,
            lessons: state.lessons,
            path,
        })
    }

    async fn step(
        &self,
        node: PipelineNode,
        query: &str,
        state: &mut PipelineState,
    ) -> Result<(), AgentError> {
        match node {
            PipelineNode::Intent => {
                let timer = MetricsTimer::start();
                let intent = IntentResolver::resolve(self.generator.as_ref(), query).await;
                state.metrics.set_intent_latency(timer.stop());
                tracing::debug!("Resolved intent: {:?}", intent);
                state.intent = Some(intent);
            }
            PipelineNode::Dates => {
                state.window = self.dates.parse(query);
                tracing::debug!("Resolved date window: {}", state.window);
            }
            PipelineNode::Retrieve => {
                let mut filters = state
                    .intent
                    .as_ref()
                    .and_then(|i| i.filters.clone())
                    .unwrap_or_default();
                filters.merge_missing(&extract_filters(query));

                let timer = MetricsTimer::start();
                let (evidence, counts) = retrieve_evidence(
                    self.search.as_ref(),
                    query,
                    &filters,
                    &state.window,
                    self.limits.top_k,
                    self.limits.search_k,
                )
                .await
                .map_err(AgentError::Search)?;
                state.metrics.set_retrieval_latency(timer.stop());
                state.metrics.set_counts(counts);

                let scores: Vec<f64> = evidence.iter().map(|e| e.setup_score).collect();
                state.metrics.set_scores(&scores);

                if evidence.len() < self.limits.top_k {
                    tracing::warn!(
                        "Only {} evidence rows for top_k={} (filters={:?})",
                        evidence.len(),
                        self.limits.top_k,
                        filters
                    );
                }

                state.filters = filters;
                state.evidence = evidence;
            }
            PipelineNode::Lessons => {
                let timer = MetricsTimer::start();
                let stats = compute_lessons(&self.history, state.window);
                let prompt = PromptFormatter::format_lessons(&stats, &self.persona);
                let narrative = self
                    .generator
                    .generate(&prompt)
                    .await
                    .map_err(AgentError::Generation)?;
                state.metrics.set_lessons_latency(timer.stop());
                state.lessons = Some(narrative);
            }
            PipelineNode::Done => {}
        }
        Ok(())
    }
}
