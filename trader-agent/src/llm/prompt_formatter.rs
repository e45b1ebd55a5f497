use trade_core::{fields, DateWindow};

use crate::pipeline::{IntentKind, LessonsStats, PersonaSnapshot, ScoredEvidence};

/// Few-shot pairs shown to the intent classifier
pub const INTENT_FEW_SHOTS: [(&str, IntentKind); 5] = [
    ("What trades do you prefer and why?", IntentKind::Persona),
    ("Why did you buy DOGE on 2024-10-09?", IntentKind::WhyTrade),
    ("Show recent BTC buys", IntentKind::List),
    ("Which were your most profitable ETH trades?", IntentKind::Best),
    (
        "What lessons did you learn last month? What worked and what failed?",
        IntentKind::Reflect,
    ),
];

/// Inputs of the final answer prompt
#[derive(Debug, Clone, Copy)]
pub struct AnswerContext<'a> {
    pub query: &'a str,
    pub intent: IntentKind,
    pub persona: &'a PersonaSnapshot,
    pub window: &'a DateWindow,
    pub lessons: Option<&'a str>,
    pub history: &'a str,
    pub evidence: &'a [ScoredEvidence],
}

/// Builds every prompt the agent sends to the model
pub struct PromptFormatter;

impl PromptFormatter {
    /// Classifier prompt asking for `{"intent": .., "filters": {..}}`
    pub fn format_intent(query: &str) -> String {
        let mut prompt = String::new();

        prompt.push_str("You are an intent classifier for a trader assistant. ");
        prompt.push_str("Return ONLY a compact JSON object with keys 'intent' and optional 'filters'. ");
        prompt.push_str("Valid intents: persona, why_trade, list, best, reflect, generic.\n");
        prompt.push_str(&format!(
            "Filter keys are trade log columns ({}, {}, {}); values are strings.\n\n",
            fields::ASSET,
            fields::SIDE,
            fields::OUTCOME
        ));

        prompt.push_str("Examples:\n");
        for (user, intent) in INTENT_FEW_SHOTS {
            prompt.push_str(&format!("User: {}\nIntent: {}\n", user, intent));
        }

        prompt.push_str(&format!("\nUser: {}\n", query));
        prompt
    }

    /// Coaching prompt over the serialized window statistics
    pub fn format_lessons(stats: &LessonsStats, persona: &PersonaSnapshot) -> String {
        let persona_json = serde_json::to_string(persona).unwrap_or_else(|_| "{}".to_string());
        let stats_json = serde_json::to_string(stats).unwrap_or_else(|_| "{}".to_string());

        let mut prompt = String::new();

        prompt.push_str("You are an experienced trading coach. ");
        prompt.push_str("Based on structured stats, write a concise reflection for the agent:\n");
        prompt.push_str("- 6–10 bullet points with what worked, what failed, and risk notes.\n");
        prompt.push_str("- Reference assets/tags and thresholds (e.g., RSI>55, ΔVol>20%).\n");
        prompt.push_str("- Keep it historical and educational; no forward-looking advice.\n");
        prompt.push_str(&format!("Persona (for tone/bias): {}\n\n", persona_json));

        prompt.push_str(&format!("Stats JSON:\n{}\n", stats_json));
        prompt
    }

    /// Final answer prompt grounded in the evidence bullets
    pub fn format_answer(ctx: &AnswerContext<'_>) -> String {
        let persona_json =
            serde_json::to_string(ctx.persona).unwrap_or_else(|_| "{}".to_string());

        let mut prompt = String::new();

        prompt.push_str("You are a trader assistant with a consistent trader personality inferred from persona.\n");
        prompt.push_str("Answer ONLY using the provided past-trade evidence and persona; do not give financial advice.\n");
        prompt.push_str("When explaining, cite metrics (RSI, ΔVol, Sentiment, Tags, SetupScore) from retrieved rows.\n");
        prompt.push_str(&format!("Intent: {}\n", ctx.intent));
        prompt.push_str(&format!("Persona: {}\n", persona_json));
        prompt.push_str(&format!("Date window: {}\n", ctx.window));
        prompt.push_str(&format!(
            "Lessons (if any):\n{}\n",
            ctx.lessons.filter(|l| !l.is_empty()).unwrap_or("(none)")
        ));
        prompt.push_str(&format!("Conversation (recent):\n{}\n\n", ctx.history));

        prompt.push_str(&format!("User query: {}\n", ctx.query));
        prompt.push_str("Relevant past trades:\n");
        prompt.push_str(&Self::evidence_bullets(ctx.evidence));
        prompt.push('\n');

        prompt
    }

    /// One line per trade, or `- (none)`
    pub fn evidence_bullets(evidence: &[ScoredEvidence]) -> String {
        if evidence.is_empty() {
            return "- (none)".to_string();
        }

        evidence
            .iter()
            .map(|e| {
                let f = |name: &str| e.document.field(name).unwrap_or("");
                format!(
                    "- {} | {} | {} @ {} x {} | {} | {} | Tags: {} | RSI {}, ΔVol {}%, Sent {} | SetupScore {}",
                    f(fields::TRADE_ID),
                    f(fields::ASSET),
                    f(fields::SIDE),
                    f(fields::PRICE),
                    f(fields::VOLUME),
                    f(fields::DATE),
                    f(fields::OUTCOME),
                    f(fields::TAGS),
                    f(fields::RSI),
                    f(fields::VOLUME_CHANGE_PCT),
                    f(fields::SENTIMENT_SCORE),
                    e.setup_score
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
