use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use super::trade_record::fields;

/// A trade as returned by nearest-neighbor search: the embedded text plus
/// the record's columns as raw strings.
///
/// Values are kept as strings because the search index is an external
/// store and nothing guarantees they still parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeDocument {
    pub content: String,
    pub fields: HashMap<String, String>,
}

impl TradeDocument {
    pub fn new(content: String, fields: HashMap<String, String>) -> Self {
        Self { content, fields }
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Numeric column, `None` when missing or not a number
    pub fn field_f64(&self, name: &str) -> Option<f64> {
        self.field(name).and_then(|v| v.trim().parse::<f64>().ok())
    }

    /// Trade date, `None` when missing or not an ISO date
    pub fn date(&self) -> Option<NaiveDate> {
        self.field(fields::DATE)
            .and_then(|v| NaiveDate::parse_from_str(v.trim(), "%Y-%m-%d").ok())
    }

    pub fn trade_id(&self) -> &str {
        self.field(fields::TRADE_ID).unwrap_or("?")
    }
}

/// Exact-match constraints keyed by column name (e.g. `Asset`, `Buy/Sell`).
/// Empty means no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StructuredFilters(BTreeMap<String, String>);

impl StructuredFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Set a constraint, replacing any previous value for the field
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.0.insert(field.into(), value.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// First writer wins: copy only the fields `self` has not set yet
    pub fn merge_missing(&mut self, other: &StructuredFilters) {
        for (field, value) in other.iter() {
            self.0
                .entry(field.to_string())
                .or_insert_with(|| value.to_string());
        }
    }

    /// Case-insensitive string match of every constraint. A document
    /// missing a constrained field compares as the empty string.
    pub fn matches(&self, document: &TradeDocument) -> bool {
        self.0.iter().all(|(field, expected)| {
            let actual = document.field(field).unwrap_or("");
            actual.to_uppercase() == expected.to_uppercase()
        })
    }
}

impl From<BTreeMap<String, String>> for StructuredFilters {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, String)> for StructuredFilters {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(asset: &str, side: &str, date: &str) -> TradeDocument {
        let mut f = HashMap::new();
        f.insert(fields::ASSET.to_string(), asset.to_string());
        f.insert(fields::SIDE.to_string(), side.to_string());
        f.insert(fields::DATE.to_string(), date.to_string());
        TradeDocument::new(String::new(), f)
    }

    #[test]
    fn test_merge_missing_first_writer_wins() {
        let mut from_intent = StructuredFilters::new();
        from_intent.insert(fields::ASSET, "ETH");

        let mut from_regex = StructuredFilters::new();
        from_regex.insert(fields::ASSET, "BTC");
        from_regex.insert(fields::SIDE, "Buy");

        from_intent.merge_missing(&from_regex);
        assert_eq!(from_intent.get(fields::ASSET), Some("ETH"));
        assert_eq!(from_intent.get(fields::SIDE), Some("Buy"));
    }

    #[test]
    fn test_matches_is_case_insensitive() {
        let mut filters = StructuredFilters::new();
        filters.insert(fields::ASSET, "btc");
        filters.insert(fields::SIDE, "BUY");

        assert!(filters.matches(&doc("BTC", "Buy", "2024-10-09")));
        assert!(!filters.matches(&doc("ETH", "Buy", "2024-10-09")));
    }

    #[test]
    fn test_missing_field_never_matches_non_empty_value() {
        let mut filters = StructuredFilters::new();
        filters.insert("Outcome", "Profit");
        assert!(!filters.matches(&doc("BTC", "Buy", "2024-10-09")));
    }

    #[test]
    fn test_empty_filters_match_everything() {
        assert!(StructuredFilters::new().matches(&doc("SOL", "Sell", "bad")));
    }

    #[test]
    fn test_document_date_parsing() {
        assert_eq!(
            doc("BTC", "Buy", "2024-10-09").date(),
            NaiveDate::from_ymd_opt(2024, 10, 9)
        );
        assert_eq!(doc("BTC", "Buy", "09/10/2024").date(), None);
    }

    #[test]
    fn test_filters_serialize_as_plain_map() {
        let mut filters = StructuredFilters::new();
        filters.insert(fields::ASSET, "BTC");
        let json = serde_json::to_string(&filters).unwrap();
        assert_eq!(json, r#"{"Asset":"BTC"}"#);

        let back: StructuredFilters = serde_json::from_str(&json).unwrap();
        assert_eq!(back, filters);
    }
}
