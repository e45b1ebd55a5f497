use once_cell::sync::Lazy;
use regex::Regex;
use trade_core::{fields, Side, StructuredFilters};

static ASSET_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(BTC|ETH|SOL|DOGE|PEPE)\b").expect("hardcoded asset pattern is valid")
});

static BUY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(buy|buys|bought)\b").expect("hardcoded buy pattern is valid"));

static SELL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(sell|sells|sold)\b").expect("hardcoded sell pattern is valid"));

/// Coarse filters from raw query text: first asset symbol mentioned, and
/// the trade side. When both sides appear, `Sell` wins.
pub fn extract_filters(query: &str) -> StructuredFilters {
    let mut filters = StructuredFilters::new();

    if let Some(m) = ASSET_PATTERN.captures(query).and_then(|c| c.get(1)) {
        filters.insert(fields::ASSET, m.as_str().to_uppercase());
    }

    if BUY_PATTERN.is_match(query) {
        filters.insert(fields::SIDE, Side::Buy.as_str());
    }
    if SELL_PATTERN.is_match(query) {
        filters.insert(fields::SIDE, Side::Sell.as_str());
    }

    filters
}
