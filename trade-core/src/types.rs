pub mod date_window;
pub mod document;
pub mod trade_record;

// Re-export common types
pub use date_window::{DatasetBounds, DateWindow};
pub use document::{StructuredFilters, TradeDocument};
pub use trade_record::{fields, split_tags, Asset, Outcome, ParseFieldError, Side, TradeRecord};

/// Trade identifier as it appears in the trade log (e.g., "T001")
pub type TradeId = String;
