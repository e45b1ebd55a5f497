//! Setup-quality heuristic: the only ranking signal used for evidence.

use trade_core::{fields, TradeDocument, TradeRecord};

/// Per-tag contribution; tags not listed contribute nothing
pub const TAG_WEIGHTS: [(&str, f64); 9] = [
    ("breakout", 0.6),
    ("momentum", 0.6),
    ("volume-spike", 0.5),
    ("news-sentiment", 0.4),
    ("meme", 0.3),
    ("mean-revert", 0.4),
    ("rsi-divergence", 0.4),
    ("range-trade", 0.3),
    ("stop-loss", -0.2),
];

const DEFAULT_MOMENTUM: f64 = 50.0;
const DEFAULT_VOLUME_CHANGE: f64 = 0.0;
const DEFAULT_SENTIMENT: f64 = 0.0;

/// Inputs of [`setup_score`]
#[derive(Debug, Clone, PartialEq)]
pub struct SetupIndicators<'a> {
    pub momentum: f64,
    pub volume_change_pct: f64,
    pub sentiment: f64,
    /// Raw comma-separated tag field
    pub tags: &'a str,
    /// Raw outcome label
    pub outcome: &'a str,
}

impl<'a> SetupIndicators<'a> {
    /// Read indicators from a search document. A missing column takes its
    /// neutral default; if any present column fails to parse, all three
    /// indicators fall back to the neutral defaults together. `NaN` parses
    /// and then fails every threshold.
    pub fn from_document(doc: &'a TradeDocument) -> Self {
        let (momentum, volume_change_pct, sentiment) = parse_indicators(doc)
            .unwrap_or((DEFAULT_MOMENTUM, DEFAULT_VOLUME_CHANGE, DEFAULT_SENTIMENT));

        Self {
            momentum,
            volume_change_pct,
            sentiment,
            tags: doc.field(fields::TAGS).unwrap_or(""),
            outcome: doc.field(fields::OUTCOME).unwrap_or(""),
        }
    }

    pub fn from_record(record: &'a TradeRecord) -> Self {
        Self {
            momentum: record.rsi,
            volume_change_pct: record.volume_change_pct,
            sentiment: record.sentiment_score,
            tags: &record.tags,
            outcome: record.outcome.as_str(),
        }
    }
}

fn parse_indicators(doc: &TradeDocument) -> Option<(f64, f64, f64)> {
    let numeric = |name: &str, default: f64| match doc.field(name) {
        None => Some(default),
        Some(raw) => raw.trim().parse::<f64>().ok(),
    };

    Some((
        numeric(fields::RSI, DEFAULT_MOMENTUM)?,
        numeric(fields::VOLUME_CHANGE_PCT, DEFAULT_VOLUME_CHANGE)?,
        numeric(fields::SENTIMENT_SCORE, DEFAULT_SENTIMENT)?,
    ))
}

fn tag_weight(tag: &str) -> f64 {
    TAG_WEIGHTS
        .iter()
        .find(|(name, _)| *name == tag)
        .map(|(_, w)| *w)
        .unwrap_or(0.0)
}

/// Additive setup-quality score, rounded to 3 decimals
pub fn setup_score(ind: &SetupIndicators<'_>) -> f64 {
    let mut score = 0.0;

    score += if ind.momentum > 55.0 {
        1.0
    } else if ind.momentum > 45.0 {
        0.2
    } else {
        0.0
    };
    // Oversold bonus stacks on top of the tier above
    if ind.momentum < 30.0 {
        score += 0.3;
    }

    score += if ind.volume_change_pct > 20.0 {
        0.8
    } else if ind.volume_change_pct > 5.0 {
        0.2
    } else {
        0.0
    };

    score += if ind.sentiment > 0.2 {
        0.5
    } else if ind.sentiment > 0.0 {
        0.2
    } else {
        0.0
    };

    // Duplicate tags count once per occurrence
    let tags = ind.tags.to_lowercase();
    for tag in tags.split(',') {
        score += tag_weight(tag.trim());
    }

    if ind.outcome == "Profit" {
        score += 0.2;
    }

    (score * 1000.0).round() / 1000.0
}

/// Score a search document
pub fn score_document(doc: &TradeDocument) -> f64 {
    setup_score(&SetupIndicators::from_document(doc))
}
