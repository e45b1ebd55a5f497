use serde::{Deserialize, Serialize};
use trade_core::{DateWindow, StructuredFilters, TradeDocument};

use super::scoring::score_document;
use crate::llm::TradeSearch;

/// A retrieved trade annotated with its setup score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredEvidence {
    pub document: TradeDocument,
    pub setup_score: f64,
}

/// Bookkeeping from one retrieval pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetrievalCounts {
    pub candidates: usize,
    pub survivors: usize,
}

/// Survivors to collect before scanning stops
pub fn survivor_cap(top_k: usize) -> usize {
    (top_k * 4).max(24)
}

/// Filter, date-gate, score and rank a candidate list.
///
/// Candidates are scanned in the order given. A candidate with an
/// unreadable date is kept. Equal scores keep scan order.
pub fn rank_candidates(
    candidates: Vec<TradeDocument>,
    filters: &StructuredFilters,
    window: &DateWindow,
    top_k: usize,
) -> (Vec<ScoredEvidence>, RetrievalCounts) {
    let cap = survivor_cap(top_k);
    let mut counts = RetrievalCounts {
        candidates: candidates.len(),
        survivors: 0,
    };
    let mut selected: Vec<ScoredEvidence> = Vec::new();

    for document in candidates {
        if !filters.matches(&document) {
            continue;
        }
        if !window.is_unbounded() {
            if let Some(date) = document.date() {
                if !window.contains(date) {
                    continue;
                }
            }
        }

        let setup_score = score_document(&document);
        selected.push(ScoredEvidence {
            document,
            setup_score,
        });
        if selected.len() >= cap {
            break;
        }
    }
    counts.survivors = selected.len();

    // sort_by is stable
    selected.sort_by(|a, b| b.setup_score.total_cmp(&a.setup_score));
    selected.truncate(top_k);

    (selected, counts)
}

/// Over-fetch from search, then rank locally
pub async fn retrieve_evidence(
    search: &dyn TradeSearch,
    query: &str,
    filters: &StructuredFilters,
    window: &DateWindow,
    top_k: usize,
    search_k: usize,
) -> anyhow::Result<(Vec<ScoredEvidence>, RetrievalCounts)> {
    let candidates = search.search(query, search_k).await?;
    Ok(rank_candidates(candidates, filters, window, top_k))
}
