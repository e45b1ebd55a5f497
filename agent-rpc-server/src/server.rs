use anyhow::{Context, Result};
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::{Framed, LinesCodec, LinesCodecError};
use trader_agent::{ConversationMemory, TraderAgent};

use crate::config::ServerConfig;
use crate::error::RpcError;
use crate::handler::AgentRequestHandler;
use crate::protocol::*;

/// Longest request line accepted, newline excluded
pub const MAX_REQUEST_BYTES: usize = 64 * 1024;

/// Line-delimited JSON-RPC server in front of the trader agent
pub struct RpcServer {
    config: ServerConfig,
    handler: Arc<AgentRequestHandler>,
}

impl RpcServer {
    /// Load the history and connect to Qdrant and the model
    pub async fn new(config: ServerConfig) -> Result<Self> {
        tracing::info!("Booting trader agent...");

        let agent = TraderAgent::connect(config.agent.clone(), config.llm.clone())
            .await
            .context("Failed to boot trader agent")?;

        let handler = Arc::new(AgentRequestHandler::new(Arc::new(agent)));

        tracing::info!("✅ Trader agent ready");

        Ok(Self { config, handler })
    }

    /// Bind and serve until the process exits
    pub async fn run(&self) -> Result<()> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind to {}", addr))?;

        tracing::info!("✅ Agent JSON-RPC Server listening on {}", addr);

        serve(listener, Arc::clone(&self.handler)).await
    }
}

/// Accept loop; one task and one conversation per connection
pub async fn serve(listener: TcpListener, handler: Arc<AgentRequestHandler>) -> Result<()> {
    loop {
        match listener.accept().await {
            Ok((socket, addr)) => {
                tracing::debug!("New connection from {}", addr);
                let handler = Arc::clone(&handler);

                tokio::spawn(async move {
                    if let Err(e) = handle_connection(socket, handler).await {
                        tracing::error!("Connection error from {}: {:#}", addr, e);
                    }
                });
            }
            Err(e) => {
                tracing::error!("Failed to accept connection: {}", e);
            }
        }
    }
}

async fn handle_connection(socket: TcpStream, handler: Arc<AgentRequestHandler>) -> Result<()> {
    let mut lines = Framed::new(socket, LinesCodec::new_with_max_length(MAX_REQUEST_BYTES));
    let mut memory = handler.new_memory();

    while let Some(frame) = lines.next().await {
        let line = match frame {
            Ok(line) => line,
            Err(LinesCodecError::MaxLineLengthExceeded) => {
                tracing::warn!("Request line over {} bytes rejected", MAX_REQUEST_BYTES);
                let response = create_error_response(
                    None,
                    RpcError::InvalidRequest(format!(
                        "request line exceeds {} bytes",
                        MAX_REQUEST_BYTES
                    )),
                );
                lines.send(response.to_string()).await?;
                // The codec skips to the next newline; a rebuilt frame resumes reading
                lines = Framed::from_parts(lines.into_parts());
                continue;
            }
            Err(e) => return Err(anyhow::Error::new(e).context("Failed to read request line")),
        };
        if line.trim().is_empty() {
            continue;
        }

        tracing::debug!("Received request: {}", line.trim());

        let response = process_request(&line, &handler, &mut memory).await;
        lines.send(response.to_string()).await?;
    }

    tracing::debug!("Connection closed after {} memory entries", memory.len());
    Ok(())
}

async fn process_request(
    line: &str,
    handler: &AgentRequestHandler,
    memory: &mut ConversationMemory,
) -> Value {
    let request: JsonRpcRequest = match serde_json::from_str(line) {
        Ok(req) => req,
        Err(e) => return create_error_response(None, RpcError::ParseError(e.to_string())),
    };

    if request.jsonrpc != "2.0" {
        return create_error_response(
            request.id,
            RpcError::InvalidRequest("JSON-RPC version must be 2.0".to_string()),
        );
    }

    let outcome = match request.method.as_str() {
        METHOD_QUERY => match parse_params(request.params) {
            Ok(params) => to_result(handler.handle_query(params).await),
            Err(e) => Err(e),
        },
        METHOD_CHAT => match parse_params(request.params) {
            Ok(params) => to_result(handler.handle_chat(memory, params).await),
            Err(e) => Err(e),
        },
        METHOD_PERSONA => handler.handle_persona(),
        other => Err(RpcError::MethodNotFound(other.to_string())),
    };

    match outcome {
        Ok(result) => create_success_response(request.id, result),
        Err(e) => {
            tracing::warn!("Request {} failed: {}", request.method, e);
            create_error_response(request.id, e)
        }
    }
}

fn parse_params(params: Option<Value>) -> Result<QueryParams, RpcError> {
    let params = params.ok_or_else(|| RpcError::InvalidParams("Missing params".to_string()))?;
    serde_json::from_value(params).map_err(|e| RpcError::InvalidParams(e.to_string()))
}

fn to_result<T: Serialize>(result: Result<T, RpcError>) -> Result<Value, RpcError> {
    result.and_then(|r| {
        serde_json::to_value(r).map_err(|e| RpcError::InternalError(e.to_string()))
    })
}

fn create_success_response(id: Option<Value>, result: Value) -> Value {
    serde_json::json!(JsonRpcResponse {
        jsonrpc: "2.0".to_string(),
        id,
        result,
    })
}

fn create_error_response(id: Option<Value>, error: RpcError) -> Value {
    serde_json::json!(JsonRpcError {
        jsonrpc: "2.0".to_string(),
        id,
        error: ErrorObject {
            code: error.code(),
            message: error.to_string(),
            data: error.data(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use serde_json::json;
    use trade_core::{Asset, Outcome, Side, TradeDocument, TradeRecord};
    use trade_data_services::TradeFormatter;
    use trader_agent::{AgentConfig, TextGenerator, TradeSearch};

    struct Canned;

    #[async_trait]
    impl TextGenerator for Canned {
        async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
            if prompt.starts_with("You are an intent classifier") {
                Ok(r#"{"intent": "list", "filters": {"Asset": "BTC"}}"#.to_string())
            } else if prompt.starts_with("You are a trader assistant") {
                Ok("T001 was a momentum breakout.".to_string())
            } else {
                Err(anyhow!("unexpected prompt"))
            }
        }
    }

    struct Fixed(Vec<TradeDocument>);

    #[async_trait]
    impl TradeSearch for Fixed {
        async fn search(&self, _query: &str, limit: usize) -> anyhow::Result<Vec<TradeDocument>> {
            Ok(self.0.iter().take(limit).cloned().collect())
        }
    }

    fn record(id: &str, asset: Asset, date: &str, rsi: f64) -> TradeRecord {
        TradeRecord {
            trade_id: id.to_string(),
            asset,
            side: Side::Buy,
            price: 100.0,
            volume: 1.0,
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            outcome: Outcome::Profit,
            tags: "breakout,momentum".to_string(),
            rsi,
            volume_change_pct: 25.0,
            sentiment_score: 0.3,
        }
    }

    async fn start() -> std::net::SocketAddr {
        let records = vec![
            record("T001", Asset::Btc, "2025-07-01", 60.0),
            record("T002", Asset::Eth, "2025-07-02", 55.0),
            record("T003", Asset::Btc, "2025-07-03", 45.0),
        ];
        let search = Fixed(records.iter().map(|r| r.to_document()).collect());
        let agent = TraderAgent::boot(
            AgentConfig::default(),
            Arc::new(Canned),
            Arc::new(search),
            records,
        )
        .unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handler = Arc::new(AgentRequestHandler::new(Arc::new(agent)));
        tokio::spawn(serve(listener, handler));
        addr
    }

    async fn call(lines: &mut Framed<TcpStream, LinesCodec>, request: Value) -> Value {
        lines.send(request.to_string()).await.unwrap();
        let reply = lines.next().await.unwrap().unwrap();
        serde_json::from_str(&reply).unwrap()
    }

    #[test]
    fn test_create_error_response() {
        let error = RpcError::MethodNotFound("test.method".to_string());
        let response = create_error_response(Some(Value::from(1)), error);

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("Method not found"));
        assert!(json.contains("-32601"));
    }

    #[tokio::test]
    async fn test_query_over_tcp() {
        let addr = start().await;
        let mut lines = Framed::new(TcpStream::connect(addr).await.unwrap(), LinesCodec::new());

        let response = call(
            &mut lines,
            json!({"jsonrpc": "2.0", "id": 1, "method": "agent.query", "params": {"query": "Show BTC buys"}}),
        )
        .await;

        assert_eq!(response["id"], 1);
        let result = &response["result"];
        assert_eq!(result["intent"], "list");
        assert_eq!(result["filters"]["Asset"], "BTC");
        assert_eq!(result["filters"]["Buy/Sell"], "Buy");
        assert_eq!(result["path"], json!(["intent", "dates", "retrieve", "done"]));

        let ids: Vec<&str> = result["evidence"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["trade_id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["T001", "T003"]);
    }

    #[tokio::test]
    async fn test_chat_and_persona_share_connection() {
        let addr = start().await;
        let mut lines = Framed::new(TcpStream::connect(addr).await.unwrap(), LinesCodec::new());

        let chat = call(
            &mut lines,
            json!({"jsonrpc": "2.0", "id": "a", "method": "agent.chat", "params": {"query": "Why BTC?"}}),
        )
        .await;
        assert_eq!(chat["result"]["answer"], "T001 was a momentum breakout.");

        let persona = call(
            &mut lines,
            json!({"jsonrpc": "2.0", "id": 2, "method": "agent.persona"}),
        )
        .await;
        assert_eq!(persona["result"]["trades"], 3);
        assert_eq!(persona["result"]["history"]["start"], "2025-07-01");
    }

    #[tokio::test]
    async fn test_oversized_line_rejected_and_connection_kept() {
        let addr = start().await;
        let mut lines = Framed::new(TcpStream::connect(addr).await.unwrap(), LinesCodec::new());

        lines.send("x".repeat(MAX_REQUEST_BYTES + 10)).await.unwrap();
        let reply: Value = serde_json::from_str(&lines.next().await.unwrap().unwrap()).unwrap();
        assert_eq!(reply["error"]["code"], INVALID_REQUEST);
        assert!(reply["id"].is_null());

        let persona = call(
            &mut lines,
            json!({"jsonrpc": "2.0", "id": 7, "method": "agent.persona"}),
        )
        .await;
        assert_eq!(persona["id"], 7);
        assert_eq!(persona["result"]["trades"], 3);
    }

    #[tokio::test]
    async fn test_protocol_errors() {
        let addr = start().await;
        let mut lines = Framed::new(TcpStream::connect(addr).await.unwrap(), LinesCodec::new());

        lines.send("not json".to_string()).await.unwrap();
        let reply: Value = serde_json::from_str(&lines.next().await.unwrap().unwrap()).unwrap();
        assert_eq!(reply["error"]["code"], PARSE_ERROR);

        let unknown = call(&mut lines, json!({"jsonrpc": "2.0", "id": 3, "method": "agent.trade"})).await;
        assert_eq!(unknown["error"]["code"], METHOD_NOT_FOUND);

        let blank = call(
            &mut lines,
            json!({"jsonrpc": "2.0", "id": 4, "method": "agent.query", "params": {"query": " "}}),
        )
        .await;
        assert_eq!(blank["error"]["code"], INVALID_PARAMS);

        let version = call(&mut lines, json!({"jsonrpc": "1.0", "id": 5, "method": "agent.query"})).await;
        assert_eq!(version["error"]["code"], INVALID_REQUEST);
    }
}
