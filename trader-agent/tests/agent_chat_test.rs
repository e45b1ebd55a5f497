/// Conversation-level tests for the trader agent
///
/// These tests cover:
/// - Persona derived once at boot
/// - Answer composition grounded in evidence and recent history
/// - Memory bookkeeping across turns
mod common;

use common::{history, FakeSearch, ScriptedGenerator};
use std::sync::Arc;
use trader_agent::pipeline::{RiskLevel, TradingStyle};
use trader_agent::{AgentConfig, AgentError, Role, TraderAgent};

fn boot(generator: Arc<ScriptedGenerator>) -> TraderAgent {
    TraderAgent::boot(
        AgentConfig::default(),
        generator,
        Arc::new(FakeSearch::over(&history())),
        history(),
    )
    .unwrap()
}

#[test]
fn test_persona_from_history() {
    let agent = boot(Arc::new(ScriptedGenerator::offline()));
    let persona = agent.persona();

    // 2 of 4 wins carry a momentum tag but mean win RSI is only 50.75
    assert_eq!(persona.style, TradingStyle::Technical);
    assert_eq!(persona.risk, RiskLevel::Low);
    assert_eq!(
        persona.rules,
        vec!["Favor entries when RSI > 55 and volume spikes.".to_string()]
    );
    assert_eq!(persona.preferred_assets, vec!["DOGE", "ETH", "BTC"]);
    assert_eq!(agent.trade_count(), 8);
    assert_eq!(agent.bounds().max.to_string(), "2025-08-01");
}

#[tokio::test]
async fn test_chat_turn_composes_grounded_answer() {
    let generator = Arc::new(ScriptedGenerator {
        answer: Some("T001 was a breakout with RSI 60.".to_string()),
        ..Default::default()
    });
    let agent = boot(generator.clone());
    let mut memory = agent.new_memory();

    let reply = agent.chat(&mut memory, "Show recent BTC buys").await.unwrap();

    assert_eq!(reply.answer, "T001 was a breakout with RSI 60.");
    assert_eq!(reply.output.evidence.len(), 4);
    assert_eq!(memory.len(), 2);
    assert_eq!(memory.turns().last().unwrap().role, Role::Assistant);

    let answer_prompts = generator.prompts_starting_with("You are a trader assistant");
    assert_eq!(answer_prompts.len(), 1);
    let prompt = &answer_prompts[0];
    assert!(prompt.contains("Intent: list"));
    assert!(prompt.contains("user: Show recent BTC buys"));
    assert!(prompt.contains("- T001 | BTC | Buy @ 100 x 2 | 2024-01-10 | Profit"));
    assert!(prompt.contains("SetupScore 3.7"));
}

#[tokio::test]
async fn test_history_carries_between_turns() {
    let generator = Arc::new(ScriptedGenerator {
        answer: Some("noted".to_string()),
        ..Default::default()
    });
    let agent = boot(generator.clone());
    let mut memory = agent.new_memory();

    agent.chat(&mut memory, "Show recent BTC buys").await.unwrap();
    agent.chat(&mut memory, "and the ETH sells?").await.unwrap();

    let prompts = generator.prompts_starting_with("You are a trader assistant");
    assert!(prompts[1].contains("user: Show recent BTC buys\nassistant: noted\nuser: and the ETH sells?"));
    assert_eq!(memory.len(), 4);
}

#[tokio::test]
async fn test_answer_failure_is_reported() {
    let agent = boot(Arc::new(ScriptedGenerator::offline()));
    let mut memory = agent.new_memory();

    let err = agent.chat(&mut memory, "Show recent BTC buys").await.unwrap_err();
    assert!(matches!(err, AgentError::Generation(_)));
    // the question is still recorded
    assert_eq!(memory.len(), 1);
}
