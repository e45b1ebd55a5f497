use std::collections::HashMap;
use trade_core::{fields, TradeDocument, TradeRecord};

/// Trait for converting trade records into the text that gets embedded and
/// the field map that travels with it through the search index
pub trait TradeFormatter {
    /// Single-line, pipe-separated rendering of every column
    fn to_embedding_text(&self) -> String;

    /// Column name -> raw string value, keyed like the CSV header
    fn to_field_map(&self) -> HashMap<String, String>;

    /// Both of the above, as search would return them
    fn to_document(&self) -> TradeDocument {
        TradeDocument::new(self.to_embedding_text(), self.to_field_map())
    }
}

impl TradeFormatter for TradeRecord {
    fn to_embedding_text(&self) -> String {
        let parts = [
            format!("Trade {}", self.trade_id),
            format!("Asset {}", self.asset),
            format!("Side {}", self.side),
            format!("Price {}", self.price),
            format!("Volume {}", self.volume),
            format!("Date {}", self.date),
            format!("Outcome {}", self.outcome),
            format!("Tags {}", self.tags),
            format!("RSI {}", self.rsi),
            format!("VolumeChangePct {}", self.volume_change_pct),
            format!("Sentiment {}", self.sentiment_score),
        ];
        parts.join(" | ")
    }

    fn to_field_map(&self) -> HashMap<String, String> {
        let values = [
            self.trade_id.clone(),
            self.asset.to_string(),
            self.side.to_string(),
            self.price.to_string(),
            self.volume.to_string(),
            self.date.to_string(),
            self.outcome.to_string(),
            self.tags.clone(),
            self.rsi.to_string(),
            self.volume_change_pct.to_string(),
            self.sentiment_score.to_string(),
        ];

        fields::ALL
            .iter()
            .zip(values)
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }
}
