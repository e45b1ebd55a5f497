mod config;
mod error;
mod handler;
mod protocol;
mod server;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use trader_agent::{config::parse_today, AgentConfig, LlmConfig};

use config::ServerConfig;
use server::RpcServer;

#[derive(Parser)]
#[command(name = "agent-rpc-server")]
#[command(about = "JSON-RPC server answering questions about a trade log")]
struct Cli {
    /// Server host to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Server port to bind to
    #[arg(long, default_value = "7879")]
    port: u16,

    /// Trade log CSV (overrides CSV_PATH)
    #[arg(long)]
    csv_path: Option<PathBuf>,

    /// Qdrant vector database URL (overrides QDRANT_URL)
    #[arg(long)]
    qdrant_url: Option<String>,

    /// Qdrant collection name (overrides QDRANT_COLLECTION)
    #[arg(long)]
    collection_name: Option<String>,

    /// Reference date for relative ranges, YYYY-MM-DD (overrides AGENT_TODAY)
    #[arg(long)]
    today: Option<String>,

    /// Chat model
    #[arg(long, default_value = "gpt-4o-mini")]
    model: String,

    /// Evidence rows per answer
    #[arg(long, default_value = "5")]
    top_k: usize,

    /// Candidates fetched from the vector index
    #[arg(long, default_value = "12")]
    search_k: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "agent_rpc_server={},trader_agent={},trade_data_services={}",
                cli.log_level, cli.log_level, cli.log_level
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut agent = AgentConfig::from_env()?;
    agent.top_k = cli.top_k;
    agent.search_k = cli.search_k;
    if let Some(path) = cli.csv_path {
        agent.csv_path = path;
    }
    if let Some(url) = cli.qdrant_url {
        agent.qdrant_url = url;
    }
    if let Some(name) = cli.collection_name {
        agent.collection_name = name;
    }
    if let Some(today) = cli.today.as_deref() {
        agent.today = parse_today(today)?;
    }

    let llm = LlmConfig {
        model: cli.model,
        ..LlmConfig::default()
    };

    tracing::info!("🚀 Agent JSON-RPC Server Starting");
    tracing::info!("Configuration:");
    tracing::info!("  Host: {}", cli.host);
    tracing::info!("  Port: {}", cli.port);
    tracing::info!("  Trades: {}", agent.csv_path.display());
    tracing::info!("  Qdrant URL: {}", agent.qdrant_url);
    tracing::info!("  Collection: {}", agent.collection_name);
    tracing::info!("  Today: {}", agent.today);
    tracing::info!("  Model: {}", llm.model);

    let config = ServerConfig {
        host: cli.host,
        port: cli.port,
        agent,
        llm,
    };

    let server = RpcServer::new(config).await?;
    server.run().await?;

    Ok(())
}
