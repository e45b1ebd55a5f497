use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::TradeId;

/// Column names of the trade log. Search payloads and structured filters
/// use the same keys.
pub mod fields {
    pub const TRADE_ID: &str = "Trade ID";
    pub const ASSET: &str = "Asset";
    pub const SIDE: &str = "Buy/Sell";
    pub const PRICE: &str = "Price";
    pub const VOLUME: &str = "Volume";
    pub const DATE: &str = "Date";
    pub const OUTCOME: &str = "Outcome";
    pub const TAGS: &str = "Tags";
    pub const RSI: &str = "RSI";
    pub const VOLUME_CHANGE_PCT: &str = "Volume_Change_Pct";
    pub const SENTIMENT_SCORE: &str = "Sentiment_Score";

    /// All columns in file order
    pub const ALL: [&str; 11] = [
        TRADE_ID,
        ASSET,
        SIDE,
        PRICE,
        VOLUME,
        DATE,
        OUTCOME,
        TAGS,
        RSI,
        VOLUME_CHANGE_PCT,
        SENTIMENT_SCORE,
    ];
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("invalid {kind}: {value:?}")]
pub struct ParseFieldError {
    kind: &'static str,
    value: String,
}

/// Traded asset symbol (closed set)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Asset {
    Btc,
    Eth,
    Sol,
    Doge,
    Pepe,
}

impl Asset {
    pub const ALL: [Asset; 5] = [Asset::Btc, Asset::Eth, Asset::Sol, Asset::Doge, Asset::Pepe];

    pub fn symbol(&self) -> &'static str {
        match self {
            Asset::Btc => "BTC",
            Asset::Eth => "ETH",
            Asset::Sol => "SOL",
            Asset::Doge => "DOGE",
            Asset::Pepe => "PEPE",
        }
    }

    /// The two meme assets carry the highest volatility in the universe
    pub fn is_high_volatility(&self) -> bool {
        matches!(self, Asset::Doge | Asset::Pepe)
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Asset {
    type Err = ParseFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Asset::ALL
            .into_iter()
            .find(|a| a.symbol().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseFieldError {
                kind: "asset",
                value: s.to_string(),
            })
    }
}

/// Trade direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "Buy",
            Side::Sell => "Sell",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = ParseFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" => Ok(Side::Buy),
            "sell" => Ok(Side::Sell),
            _ => Err(ParseFieldError {
                kind: "side",
                value: s.to_string(),
            }),
        }
    }
}

/// Realized result of a trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Profit,
    Loss,
    Neutral,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Profit => "Profit",
            Outcome::Loss => "Loss",
            Outcome::Neutral => "Neutral",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the trader's historical trade log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    #[serde(rename = "Trade ID")]
    pub trade_id: TradeId,
    #[serde(rename = "Asset")]
    pub asset: Asset,
    #[serde(rename = "Buy/Sell")]
    pub side: Side,
    #[serde(rename = "Price")]
    pub price: f64,
    #[serde(rename = "Volume")]
    pub volume: f64,
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Outcome")]
    pub outcome: Outcome,
    /// Comma-separated tag set, not validated against a vocabulary
    #[serde(rename = "Tags", default)]
    pub tags: String,
    /// Momentum oscillator in [0, 100]
    #[serde(rename = "RSI")]
    pub rsi: f64,
    #[serde(rename = "Volume_Change_Pct")]
    pub volume_change_pct: f64,
    /// Sentiment in [-1, 1]
    #[serde(rename = "Sentiment_Score")]
    pub sentiment_score: f64,
}

impl TradeRecord {
    pub fn is_win(&self) -> bool {
        self.outcome == Outcome::Profit
    }

    /// Individual tags, trimmed, empties dropped. Duplicates are kept.
    pub fn tag_list(&self) -> Vec<&str> {
        split_tags(&self.tags)
    }

    /// True when any of the record's tags equals one of `wanted` (case-insensitive)
    pub fn has_any_tag(&self, wanted: &[&str]) -> bool {
        self.tag_list()
            .iter()
            .any(|t| wanted.iter().any(|w| w.eq_ignore_ascii_case(t)))
    }
}

/// Split a comma-separated tag field
pub fn split_tags(raw: &str) -> Vec<&str> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}
