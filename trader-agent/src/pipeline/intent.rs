use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use trade_core::StructuredFilters;

use crate::llm::{PromptFormatter, TextGenerator};

/// Routing label for a user query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    Persona,
    WhyTrade,
    List,
    Best,
    Reflect,
    Generic,
}

impl IntentKind {
    pub const ALL: [IntentKind; 6] = [
        IntentKind::Persona,
        IntentKind::WhyTrade,
        IntentKind::List,
        IntentKind::Best,
        IntentKind::Reflect,
        IntentKind::Generic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IntentKind::Persona => "persona",
            IntentKind::WhyTrade => "why_trade",
            IntentKind::List => "list",
            IntentKind::Best => "best",
            IntentKind::Reflect => "reflect",
            IntentKind::Generic => "generic",
        }
    }
}

impl fmt::Display for IntentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IntentKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown intent: {}", s))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentResult {
    pub intent: IntentKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<StructuredFilters>,
}

impl IntentResult {
    pub fn new(intent: IntentKind) -> Self {
        Self {
            intent,
            filters: None,
        }
    }
}

/// Keyword groups checked in order; the first group with a hit decides
const FALLBACK_RULES: [(&[&str], IntentKind); 5] = [
    (
        &["lesson", "learn", "worked", "failed", "pattern", "insight", "reflect"],
        IntentKind::Reflect,
    ),
    (&["why did", "reason", "explain"], IntentKind::WhyTrade),
    (&["prefer", "style", "persona"], IntentKind::Persona),
    (&["show", "list", "recent"], IntentKind::List),
    (&["best", "profitable", "wins"], IntentKind::Best),
];

/// Deterministic keyword classifier used whenever the model's answer is
/// unusable
pub fn fallback_intent(query: &str) -> IntentResult {
    let q = query.to_lowercase();
    let intent = FALLBACK_RULES
        .iter()
        .find(|(words, _)| words.iter().any(|w| q.contains(w)))
        .map(|(_, kind)| *kind)
        .unwrap_or(IntentKind::Generic);
    IntentResult::new(intent)
}

/// Parse a classifier reply. Code fences and a leading `json` language tag
/// are tolerated. `None` for anything that is not an object with a known
/// `intent` and, if present, a `filters` object of string values.
pub fn parse_intent_response(raw: &str) -> Option<IntentResult> {
    let mut body = raw.trim().trim_matches('`').trim();
    if let Some(rest) = body.strip_prefix("json") {
        body = rest.trim_start();
    }

    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let obj = value.as_object()?;
    let intent = obj.get("intent")?.as_str()?.parse::<IntentKind>().ok()?;

    let filters = match obj.get("filters") {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::Object(map)) => {
            let mut filters = StructuredFilters::new();
            for (k, v) in map {
                filters.insert(k.clone(), v.as_str()?);
            }
            Some(filters)
        }
        Some(_) => return None,
    };

    Some(IntentResult { intent, filters })
}

/// Model-backed classifier with keyword fallback
pub struct IntentResolver;

impl IntentResolver {
    /// Never fails: transport errors and unusable replies both fall back to
    /// [`fallback_intent`]
    pub async fn resolve(generator: &dyn TextGenerator, query: &str) -> IntentResult {
        let prompt = PromptFormatter::format_intent(query);

        match generator.generate(&prompt).await {
            Ok(raw) => match parse_intent_response(&raw) {
                Some(result) => result,
                None => {
                    tracing::warn!("Unparseable intent reply, using keyword fallback: {:?}", raw);
                    fallback_intent(query)
                }
            },
            Err(e) => {
                tracing::warn!("Intent generation failed, using keyword fallback: {:#}", e);
                fallback_intent(query)
            }
        }
    }
}
