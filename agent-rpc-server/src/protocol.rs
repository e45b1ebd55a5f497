use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use trade_core::{DateWindow, StructuredFilters};
use trader_agent::{ChatReply, IntentKind, PipelineNode, PipelineOutput, ScoredEvidence};

/// JSON-RPC 2.0 Request
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: Option<Value>,
    pub method: String,
    pub params: Option<Value>,
}

/// JSON-RPC 2.0 Success Response
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Option<Value>,
    pub result: Value,
}

/// JSON-RPC 2.0 Error Response
#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub jsonrpc: String,
    pub id: Option<Value>,
    pub error: ErrorObject,
}

/// JSON-RPC Error Object
#[derive(Debug, Serialize)]
pub struct ErrorObject {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

// Standard JSON-RPC error codes
pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;

// Upstream service failures
pub const SEARCH_ERROR: i32 = -32003;
pub const GENERATION_ERROR: i32 = -32004;

pub const METHOD_QUERY: &str = "agent.query";
pub const METHOD_CHAT: &str = "agent.chat";
pub const METHOD_PERSONA: &str = "agent.persona";

/// Params of `agent.query` and `agent.chat`
#[derive(Debug, Deserialize)]
pub struct QueryParams {
    pub query: String,
}

/// Date window with ISO dates, `null` for an open side
#[derive(Debug, Serialize)]
pub struct DateWindowJson {
    pub start: Option<String>,
    pub end: Option<String>,
}

impl From<&DateWindow> for DateWindowJson {
    fn from(w: &DateWindow) -> Self {
        Self {
            start: w.start.map(|d| d.to_string()),
            end: w.end.map(|d| d.to_string()),
        }
    }
}

/// One evidence row
#[derive(Debug, Serialize)]
pub struct EvidenceJson {
    pub trade_id: String,
    pub setup_score: f64,
    pub fields: BTreeMap<String, String>,
}

impl From<&ScoredEvidence> for EvidenceJson {
    fn from(e: &ScoredEvidence) -> Self {
        Self {
            trade_id: e.document.trade_id().to_string(),
            setup_score: e.setup_score,
            fields: e
                .document
                .fields
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }
}

/// `agent.query` result
#[derive(Debug, Serialize)]
pub struct QueryResult {
    pub intent: IntentKind,
    pub filters: StructuredFilters,
    pub date_window: DateWindowJson,
    pub evidence: Vec<EvidenceJson>,
    pub lessons: Option<String>,
    pub path: Vec<PipelineNode>,
}

impl From<&PipelineOutput> for QueryResult {
    fn from(out: &PipelineOutput) -> Self {
        Self {
            intent: out.intent.intent,
            filters: out.filters.clone(),
            date_window: DateWindowJson::from(&out.window),
            evidence: out.evidence.iter().map(EvidenceJson::from).collect(),
            lessons: out.lessons.clone(),
            path: out.path.clone(),
        }
    }
}

/// `agent.chat` result
#[derive(Debug, Serialize)]
pub struct ChatResult {
    pub answer: String,
    pub intent: IntentKind,
    pub date_window: DateWindowJson,
    pub evidence: Vec<EvidenceJson>,
}

impl From<&ChatReply> for ChatResult {
    fn from(reply: &ChatReply) -> Self {
        Self {
            answer: reply.answer.clone(),
            intent: reply.output.intent.intent,
            date_window: DateWindowJson::from(&reply.output.window),
            evidence: reply.output.evidence.iter().map(EvidenceJson::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_parse_jsonrpc_request() {
        let json = r#"{
            "jsonrpc": "2.0",
            "id": 1,
            "method": "agent.query",
            "params": {"query": "Show recent BTC buys"}
        }"#;

        let req: JsonRpcRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.jsonrpc, "2.0");
        assert_eq!(req.method, METHOD_QUERY);

        let params: QueryParams = serde_json::from_value(req.params.unwrap()).unwrap();
        assert_eq!(params.query, "Show recent BTC buys");
    }

    #[test]
    fn test_open_window_serializes_as_null() {
        let w = DateWindow::new(NaiveDate::from_ymd_opt(2025, 7, 31), None);
        let json = serde_json::to_value(DateWindowJson::from(&w)).unwrap();
        assert_eq!(json["start"], "2025-07-31");
        assert!(json["end"].is_null());
    }
}
