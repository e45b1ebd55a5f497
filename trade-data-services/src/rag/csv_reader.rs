use anyhow::{anyhow, Context, Result};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use trade_core::TradeRecord;
use tracing;

/// Reader for the trader's past-trades CSV export
///
/// Expected header:
/// `Trade ID,Asset,Buy/Sell,Price,Volume,Date,Outcome,Tags,RSI,Volume_Change_Pct,Sentiment_Score`
///
/// Rows come back in file order. A row that fails to deserialize, or a
/// repeated trade id, fails the whole load.
pub struct TradeCsvReader;

impl TradeCsvReader {
    /// Load all trades from a CSV file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Vec<TradeRecord>> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(anyhow!("Trade CSV does not exist: {}", path.display()));
        }

        tracing::info!("Loading trade history from: {}", path.display());

        let reader = csv::Reader::from_path(path)
            .with_context(|| format!("Failed to open trade CSV {}", path.display()))?;

        let records = Self::read_all(reader)?;

        tracing::info!(
            "Loaded {} trades from {}",
            records.len(),
            path.display()
        );

        Ok(records)
    }

    /// Load all trades from any reader (used for in-memory fixtures)
    pub fn from_reader<R: Read>(rdr: R) -> Result<Vec<TradeRecord>> {
        Self::read_all(csv::Reader::from_reader(rdr))
    }

    fn read_all<R: Read>(mut reader: csv::Reader<R>) -> Result<Vec<TradeRecord>> {
        let mut records = Vec::new();
        let mut seen_ids = HashSet::new();

        for (idx, row) in reader.deserialize::<TradeRecord>().enumerate() {
            // Header is line 1
            let line = idx + 2;
            let record = row.with_context(|| format!("Malformed trade row at line {}", line))?;

            if !seen_ids.insert(record.trade_id.clone()) {
                return Err(anyhow!(
                    "Duplicate trade id {} at line {}",
                    record.trade_id,
                    line
                ));
            }

            records.push(record);
        }

        Ok(records)
    }
}
