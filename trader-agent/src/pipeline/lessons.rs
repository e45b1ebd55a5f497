use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use trade_core::{split_tags, DateWindow, TradeRecord};

/// Marker placed in `summary` when the window selects no rows
pub const NO_DATA_SUMMARY: &str = "No data in window.";

/// Win rate of one asset inside the window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetWinRate {
    pub asset: String,
    pub trades: usize,
    pub win_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagStats {
    pub count: usize,
    pub wins: usize,
    pub win_rate: f64,
}

/// Indicator means over winning trades; `None` when the window has no wins
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureAverages {
    pub momentum: Option<f64>,
    pub volume_change_pct: Option<f64>,
    pub sentiment: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonsStats {
    pub window: DateWindow,
    /// Sorted by win rate, highest first
    pub assets: Vec<AssetWinRate>,
    pub tags: BTreeMap<String, TagStats>,
    pub features: FeatureAverages,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl LessonsStats {
    fn empty(window: DateWindow) -> Self {
        Self {
            window,
            assets: Vec::new(),
            tags: BTreeMap::new(),
            features: FeatureAverages::default(),
            summary: Some(NO_DATA_SUMMARY.to_string()),
        }
    }

    pub fn has_data(&self) -> bool {
        self.summary.is_none()
    }
}

/// Aggregate win statistics over the records inside `window`
pub fn compute_lessons(records: &[TradeRecord], window: DateWindow) -> LessonsStats {
    let rows: Vec<&TradeRecord> = records.iter().filter(|r| window.contains(r.date)).collect();

    if rows.is_empty() {
        return LessonsStats::empty(window);
    }

    let assets = asset_win_rates(rows.iter().copied());

    let mut tags: BTreeMap<String, TagStats> = BTreeMap::new();
    for r in &rows {
        let win = r.is_win();
        for tag in split_tags(&r.tags) {
            let st = tags.entry(tag.to_string()).or_default();
            st.count += 1;
            if win {
                st.wins += 1;
            }
        }
    }
    for st in tags.values_mut() {
        st.win_rate = st.wins as f64 / st.count.max(1) as f64;
    }

    let wins: Vec<&TradeRecord> = rows.iter().copied().filter(|r| r.is_win()).collect();
    let features = FeatureAverages {
        momentum: mean(wins.iter().map(|r| r.rsi)),
        volume_change_pct: mean(wins.iter().map(|r| r.volume_change_pct)),
        sentiment: mean(wins.iter().map(|r| r.sentiment_score)),
    };

    LessonsStats {
        window,
        assets,
        tags,
        features,
        summary: None,
    }
}

/// Win rate per asset, highest first. Equal rates keep symbol order.
pub(crate) fn asset_win_rates<'a>(
    records: impl IntoIterator<Item = &'a TradeRecord>,
) -> Vec<AssetWinRate> {
    // (trades, wins) keyed by symbol
    let mut per_asset: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for r in records {
        let entry = per_asset.entry(r.asset.symbol()).or_default();
        entry.0 += 1;
        if r.is_win() {
            entry.1 += 1;
        }
    }

    let mut assets: Vec<AssetWinRate> = per_asset
        .into_iter()
        .map(|(asset, (trades, wins))| AssetWinRate {
            asset: asset.to_string(),
            trades,
            win_rate: wins as f64 / trades as f64,
        })
        .collect();
    assets.sort_by(|a, b| b.win_rate.total_cmp(&a.win_rate));
    assets
}

pub(crate) fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        None
    } else {
        Some(sum / n as f64)
    }
}
