use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::path::PathBuf;

/// Default reference date used to resolve relative time expressions
pub const DEFAULT_TODAY: &str = "2025-08-14";

/// Configuration for the trader agent
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Trade history export
    pub csv_path: PathBuf,

    /// Reference date for "today", "last 2 weeks" and similar phrases
    pub today: NaiveDate,

    /// Evidence rows handed to answer composition
    pub top_k: usize,

    /// Candidates requested from nearest-neighbour search before filtering
    pub search_k: usize,

    /// Conversation turns kept per session
    pub memory_turns: usize,

    /// History entries rendered into the answer prompt
    pub history_context_turns: usize,

    pub qdrant_url: String,
    pub collection_name: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            csv_path: PathBuf::from("trader_past_trades.csv"),
            today: NaiveDate::from_ymd_opt(2025, 8, 14).unwrap_or_default(),
            top_k: 5,
            search_k: 12,
            memory_turns: 8,
            history_context_turns: 4,
            qdrant_url: "http://localhost:6334".to_string(),
            collection_name: "trader_trades".to_string(),
        }
    }
}

impl AgentConfig {
    /// Defaults overridden by `CSV_PATH`, `AGENT_TODAY`, `QDRANT_URL`
    /// and `QDRANT_COLLECTION`
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("CSV_PATH") {
            config.csv_path = PathBuf::from(path);
        }
        if let Ok(today) = std::env::var("AGENT_TODAY") {
            config.today = parse_today(&today)?;
        }
        if let Ok(url) = std::env::var("QDRANT_URL") {
            config.qdrant_url = url;
        }
        if let Ok(name) = std::env::var("QDRANT_COLLECTION") {
            config.collection_name = name;
        }

        Ok(config)
    }
}

/// Parse a `YYYY-MM-DD` reference date
pub fn parse_today(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .with_context(|| format!("invalid reference date {:?}, expected YYYY-MM-DD", value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AgentConfig::default();
        assert_eq!(config.today.to_string(), DEFAULT_TODAY);
        assert_eq!(config.top_k, 5);
        assert_eq!(config.search_k, 12);
        assert_eq!(config.memory_turns, 8);
        assert_eq!(config.collection_name, "trader_trades");
    }

    #[test]
    fn test_parse_today() {
        assert_eq!(parse_today(" 2024-02-29 ").unwrap().to_string(), "2024-02-29");
        assert!(parse_today("14/08/2025").is_err());
    }
}
