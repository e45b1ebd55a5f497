use thiserror::Error;
use trader_agent::AgentError;

#[derive(Error, Debug)]
pub enum RpcError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Search error: {0}")]
    SearchError(String),

    #[error("Generation error: {0}")]
    GenerationError(String),
}

impl RpcError {
    /// Get the JSON-RPC error code for this error
    pub fn code(&self) -> i32 {
        use crate::protocol::*;
        match self {
            RpcError::ParseError(_) => PARSE_ERROR,
            RpcError::InvalidRequest(_) => INVALID_REQUEST,
            RpcError::MethodNotFound(_) => METHOD_NOT_FOUND,
            RpcError::InvalidParams(_) => INVALID_PARAMS,
            RpcError::InternalError(_) => INTERNAL_ERROR,
            RpcError::SearchError(_) => SEARCH_ERROR,
            RpcError::GenerationError(_) => GENERATION_ERROR,
        }
    }

    /// Get additional error data (optional)
    pub fn data(&self) -> Option<serde_json::Value> {
        match self {
            RpcError::SearchError(_) | RpcError::GenerationError(_) => Some(serde_json::json!({
                "retryable": true,
                "suggestion": "Upstream service unavailable; retry later"
            })),
            _ => None,
        }
    }
}

impl From<AgentError> for RpcError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::Search(e) => RpcError::SearchError(format!("{:#}", e)),
            AgentError::Generation(e) => RpcError::GenerationError(format!("{:#}", e)),
            other => RpcError::InternalError(other.to_string()),
        }
    }
}

// Convert anyhow errors to RpcError
impl From<anyhow::Error> for RpcError {
    fn from(err: anyhow::Error) -> Self {
        RpcError::InternalError(err.to_string())
    }
}
