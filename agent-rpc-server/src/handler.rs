use serde_json::{json, Value};
use std::sync::Arc;
use trader_agent::{ConversationMemory, TraderAgent};

use crate::error::RpcError;
use crate::protocol::{ChatResult, QueryParams, QueryResult};

/// Dispatches agent methods to a shared [`TraderAgent`]
pub struct AgentRequestHandler {
    agent: Arc<TraderAgent>,
}

impl AgentRequestHandler {
    pub fn new(agent: Arc<TraderAgent>) -> Self {
        Self { agent }
    }

    /// Fresh per-connection conversation memory
    pub fn new_memory(&self) -> ConversationMemory {
        self.agent.new_memory()
    }

    /// `agent.query`: run the pipeline without composing an answer
    pub async fn handle_query(&self, params: QueryParams) -> Result<QueryResult, RpcError> {
        let query = validate_query(&params)?;
        tracing::info!("Processing query: {}", query);

        let output = self.agent.run(query).await?;

        tracing::info!(
            "Query resolved: intent={}, evidence={}, window={}",
            output.intent.intent,
            output.evidence.len(),
            output.window
        );

        Ok(QueryResult::from(&output))
    }

    /// `agent.chat`: one conversational turn against this connection's memory
    pub async fn handle_chat(
        &self,
        memory: &mut ConversationMemory,
        params: QueryParams,
    ) -> Result<ChatResult, RpcError> {
        let query = validate_query(&params)?;
        tracing::info!("Processing chat turn: {}", query);

        let reply = self.agent.chat(memory, query).await?;
        Ok(ChatResult::from(&reply))
    }

    /// `agent.persona`: the snapshot derived at boot
    pub fn handle_persona(&self) -> Result<Value, RpcError> {
        let bounds = self.agent.bounds();
        Ok(json!({
            "persona": serde_json::to_value(self.agent.persona())
                .map_err(|e| RpcError::InternalError(e.to_string()))?,
            "trades": self.agent.trade_count(),
            "history": {
                "start": bounds.min.to_string(),
                "end": bounds.max.to_string(),
            },
        }))
    }
}

fn validate_query(params: &QueryParams) -> Result<&str, RpcError> {
    let query = params.query.trim();
    if query.is_empty() {
        return Err(RpcError::InvalidParams("query must not be empty".to_string()));
    }
    Ok(query)
}
