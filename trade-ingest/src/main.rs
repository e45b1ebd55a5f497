use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use trade_data_services::TradeIngestionPipeline;
use tracing::{info, Level};

/// Trade log ingestion CLI
///
/// Reads the trade history CSV, embeds one text per trade and uploads the
/// vectors with their field payloads to Qdrant.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Trade history CSV
    #[arg(default_value = "trader_past_trades.csv")]
    csv_path: PathBuf,

    /// Qdrant URL
    #[arg(short = 'q', long, default_value = "http://localhost:6334")]
    qdrant_url: String,

    /// Qdrant collection name
    #[arg(short = 'c', long, default_value = "trader_trades")]
    collection: String,

    /// Drop and recreate the collection before uploading
    #[arg(short = 'r', long)]
    recreate: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn parse_log_level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.parse_log_level())
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    info!("🚀 Trade Log Ingestion Tool");
    info!("Configuration:");
    info!("  CSV: {}", args.csv_path.display());
    info!("  Qdrant URL: {}", args.qdrant_url);
    info!("  Collection: {}", args.collection);
    info!("  Recreate: {}", args.recreate);

    let mut pipeline =
        TradeIngestionPipeline::new(&args.qdrant_url, args.collection.clone(), args.recreate)
            .await
            .context("Failed to initialize ingestion pipeline")?;

    let stats = pipeline.ingest_csv(&args.csv_path).await?;
    let indexed = pipeline.vector_store().point_count().await?;

    info!("✅ Ingestion Complete!");
    info!(
        "  {} trades loaded, {} embeddings, {} points uploaded ({} in collection)",
        stats.records_loaded, stats.embeddings_generated, stats.points_uploaded, indexed
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["trade-ingest"]);
        assert_eq!(args.csv_path, PathBuf::from("trader_past_trades.csv"));
        assert_eq!(args.collection, "trader_trades");
        assert!(!args.recreate);
        assert_eq!(args.parse_log_level(), Level::INFO);
    }

    #[test]
    fn test_flags() {
        let args = Args::parse_from([
            "trade-ingest",
            "data/trades.csv",
            "--recreate",
            "-c",
            "demo",
            "-l",
            "DEBUG",
        ]);
        assert_eq!(args.csv_path, PathBuf::from("data/trades.csv"));
        assert_eq!(args.collection, "demo");
        assert!(args.recreate);
        assert_eq!(args.parse_log_level(), Level::DEBUG);
    }
}
