use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::trade_record::TradeRecord;

/// Inclusive calendar window; a missing side is unbounded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateWindow {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self::new(Some(start), Some(end))
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |s| date >= s) && self.end.map_or(true, |e| date <= e)
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = |d: Option<NaiveDate>| d.map_or_else(|| "open".to_string(), |d| d.to_string());
        write!(f, "{} → {}", side(self.start), side(self.end))
    }
}

/// First and last trade date of the loaded history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetBounds {
    pub min: NaiveDate,
    pub max: NaiveDate,
}

impl DatasetBounds {
    pub fn new(min: NaiveDate, max: NaiveDate) -> Self {
        Self { min, max }
    }

    pub fn from_records(records: &[TradeRecord]) -> Result<Self> {
        let min = records.iter().map(|r| r.date).min();
        let max = records.iter().map(|r| r.date).max();
        match (min, max) {
            (Some(min), Some(max)) => Ok(Self { min, max }),
            _ => Err(anyhow!("cannot derive date bounds from an empty trade history")),
        }
    }

    /// Raise a start before `min` and lower an end after `max`.
    /// Absent sides stay absent.
    pub fn clamp(&self, window: DateWindow) -> DateWindow {
        DateWindow {
            start: window.start.map(|s| s.max(self.min)),
            end: window.end.map(|e| e.min(self.max)),
        }
    }
}
