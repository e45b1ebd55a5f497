//! One-shot behavioural summary of the full trade history.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use trade_core::{split_tags, TradeRecord};

use super::lessons::{asset_win_rates, mean};

const MOMENTUM_TAGS: [&str; 3] = ["breakout", "momentum", "volume-spike"];
const SENTIMENT_TAGS: [&str; 2] = ["news-sentiment", "meme"];
const MEAN_REVERSION_TAGS: [&str; 3] = ["mean-revert", "rsi-divergence", "range-trade"];

const RULE_MOMENTUM: &str = "Favor entries when RSI > 55 and volume spikes.";
const RULE_SENTIMENT: &str = "Lean into strong positive sentiment with tight stops.";
const RULE_HIGH_BETA: &str = "Size down on high-volatility meme assets.";
const RULE_CONFLUENCE: &str = "Wait for confluence: RSI alignment, rising volume, supportive sentiment.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradingStyle {
    Momentum,
    Sentiment,
    MeanReversion,
    Technical,
}

impl fmt::Display for TradingStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TradingStyle::Momentum => "Momentum",
            TradingStyle::Sentiment => "Sentiment",
            TradingStyle::MeanReversion => "MeanReversion",
            TradingStyle::Technical => "Technical",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        };
        f.write_str(s)
    }
}

/// Persona derived once at startup and never updated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaSnapshot {
    pub style: TradingStyle,
    pub risk: RiskLevel,
    pub holding: String,
    pub preferred_assets: Vec<String>,
    pub top_tags: Vec<String>,
    /// Never empty
    pub rules: Vec<String>,
}

/// Fraction of `wins` carrying any tag from `tags`, 0 when there are no wins
fn tag_ratio(wins: &[&TradeRecord], tags: &[&str]) -> f64 {
    if wins.is_empty() {
        return 0.0;
    }
    wins.iter().filter(|r| r.has_any_tag(tags)).count() as f64 / wins.len() as f64
}

/// Share of all trades placed on DOGE or PEPE
fn high_volatility_exposure(records: &[TradeRecord]) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    records.iter().filter(|r| r.asset.is_high_volatility()).count() as f64 / records.len() as f64
}

fn preferred_assets(records: &[TradeRecord]) -> Vec<String> {
    asset_win_rates(records)
        .into_iter()
        .take(3)
        .map(|a| a.asset)
        .collect()
}

fn top_tags(records: &[TradeRecord]) -> Vec<String> {
    // (count, first-seen position)
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for r in records {
        for tag in split_tags(&r.tags) {
            let next = counts.len();
            counts.entry(tag).or_insert((0, next)).0 += 1;
        }
    }

    let mut ranked: Vec<(&str, usize, usize)> =
        counts.into_iter().map(|(t, (n, seen))| (t, n, seen)).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

    ranked.into_iter().take(5).map(|(t, _, _)| t.to_string()).collect()
}

/// Derive the persona from the complete trade history
pub fn extract_persona(records: &[TradeRecord]) -> PersonaSnapshot {
    let wins: Vec<&TradeRecord> = records.iter().filter(|r| r.is_win()).collect();

    let momentum_ratio = tag_ratio(&wins, &MOMENTUM_TAGS);
    let sentiment_ratio = tag_ratio(&wins, &SENTIMENT_TAGS);
    let meanrev_ratio = tag_ratio(&wins, &MEAN_REVERSION_TAGS);
    let avg_rsi_wins = mean(wins.iter().map(|r| r.rsi));
    let avg_sentiment_wins = mean(wins.iter().map(|r| r.sentiment_score));

    let style = if momentum_ratio > 0.35 && avg_rsi_wins.map_or(false, |v| v > 55.0) {
        TradingStyle::Momentum
    } else if sentiment_ratio > 0.30 && avg_sentiment_wins.map_or(false, |v| v > 0.2) {
        TradingStyle::Sentiment
    } else if meanrev_ratio > 0.28 {
        TradingStyle::MeanReversion
    } else {
        TradingStyle::Technical
    };

    let high_beta = high_volatility_exposure(records);
    let risk = if high_beta > 0.35 {
        RiskLevel::High
    } else if high_beta > 0.15 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    let mut rules = Vec::new();
    if momentum_ratio > 0.35 {
        rules.push(RULE_MOMENTUM.to_string());
    }
    if sentiment_ratio > 0.30 {
        rules.push(RULE_SENTIMENT.to_string());
    }
    if high_beta > 0.25 {
        rules.push(RULE_HIGH_BETA.to_string());
    }
    if rules.is_empty() {
        rules.push(RULE_CONFLUENCE.to_string());
    }

    tracing::debug!(
        "Persona ratios: momentum={:.3}, sentiment={:.3}, meanrev={:.3}, high_beta={:.3}",
        momentum_ratio,
        sentiment_ratio,
        meanrev_ratio,
        high_beta
    );

    PersonaSnapshot {
        style,
        risk,
        holding: "swing".to_string(),
        preferred_assets: preferred_assets(records),
        top_tags: top_tags(records),
        rules,
    }
}
