//! Deterministic stand-ins for the model and the search index
#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Mutex;
use trade_core::{Asset, Outcome, Side, TradeDocument, TradeRecord};
use trade_data_services::TradeFormatter;
use trader_agent::{TextGenerator, TradeSearch};

pub fn trade(
    id: &str,
    asset: Asset,
    side: Side,
    date: &str,
    outcome: Outcome,
    tags: &str,
    rsi: f64,
    vol: f64,
    sent: f64,
) -> TradeRecord {
    TradeRecord {
        trade_id: id.to_string(),
        asset,
        side,
        price: 100.0,
        volume: 2.0,
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        outcome,
        tags: tags.to_string(),
        rsi,
        volume_change_pct: vol,
        sentiment_score: sent,
    }
}

/// Small history spanning 2024-01-10 .. 2025-08-01
pub fn history() -> Vec<TradeRecord> {
    use Asset::*;
    use Outcome::*;
    use Side::*;
    vec![
        trade("T001", Btc, Buy, "2024-01-10", Profit, "breakout,momentum", 60.0, 25.0, 0.3),
        trade("T002", Btc, Buy, "2024-05-03", Loss, "stop-loss", 40.0, 2.0, -0.1),
        trade("T003", Eth, Sell, "2024-10-09", Profit, "mean-revert", 28.0, 8.0, 0.1),
        trade("T004", Doge, Buy, "2024-10-09", Profit, "meme,news-sentiment", 58.0, 40.0, 0.6),
        trade("T005", Btc, Sell, "2025-02-14", Neutral, "range-trade", 50.0, 0.0, 0.0),
        trade("T006", Btc, Buy, "2025-07-25", Profit, "volume-spike", 57.0, 30.0, 0.25),
        trade("T007", Sol, Buy, "2025-07-28", Loss, "breakout,stop-loss", 48.0, 6.0, 0.05),
        trade("T008", Btc, Buy, "2025-08-01", Loss, "swing", 46.0, 1.0, 0.0),
    ]
}

/// Returns the whole history as documents in a fixed order, whatever the query
pub struct FakeSearch {
    documents: Vec<TradeDocument>,
    pub limits: Mutex<Vec<usize>>,
    fail: bool,
}

impl FakeSearch {
    pub fn over(records: &[TradeRecord]) -> Self {
        Self {
            documents: records.iter().map(|r| r.to_document()).collect(),
            limits: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            documents: Vec::new(),
            limits: Mutex::new(Vec::new()),
            fail: true,
        }
    }
}

#[async_trait]
impl TradeSearch for FakeSearch {
    async fn search(&self, _query: &str, limit: usize) -> Result<Vec<TradeDocument>> {
        self.limits.lock().unwrap().push(limit);
        if self.fail {
            return Err(anyhow!("qdrant unavailable"));
        }
        Ok(self.documents.iter().take(limit).cloned().collect())
    }
}

/// Canned replies keyed by prompt kind; `None` simulates an outage
#[derive(Default)]
pub struct ScriptedGenerator {
    pub intent: Option<String>,
    pub lessons: Option<String>,
    pub answer: Option<String>,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn offline() -> Self {
        Self::default()
    }

    pub fn prompts_starting_with(&self, prefix: &str) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.starts_with(prefix))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        let reply = if prompt.starts_with("You are an intent classifier") {
            &self.intent
        } else if prompt.starts_with("You are an experienced trading coach") {
            &self.lessons
        } else {
            &self.answer
        };

        reply.clone().ok_or_else(|| anyhow!("model offline"))
    }
}
