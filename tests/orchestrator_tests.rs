//! Tests for the memory-only conversation orchestrator.

mod common;

use std::sync::Arc;

use mnemo::config::MnemoConfig;
use mnemo::orchestrator::ConversationOrchestrator;
use mnemo::session::{InMemorySessionStore, SessionStore};
use mnemo::types::Role;
use pretty_assertions::assert_eq;

use common::EchoModel;

fn orchestrator_with_store() -> (ConversationOrchestrator, Arc<InMemorySessionStore>) {
    let store = Arc::new(InMemorySessionStore::new());
    let orchestrator = ConversationOrchestrator::new(
        Arc::clone(&store) as Arc<dyn SessionStore>,
        Arc::new(EchoModel),
        MnemoConfig::default(),
    );
    (orchestrator, store)
}

#[tokio::test]
async fn prior_turns_are_replayed_as_context() {
    let (orchestrator, _store) = orchestrator_with_store();

    orchestrator.respond("s1", "Q1").await.unwrap();
    let answer = orchestrator
        .respond("s1", "what was my prior question?")
        .await
        .unwrap();

    // The echo model surfaces exactly the context it was handed; the first
    // question must still be in it.
    assert!(answer.contains("Q1"), "answer lost prior context: {answer}");
    assert!(answer.contains("what was my prior question?"));
}

#[tokio::test]
async fn empty_log_degenerates_to_single_turn() {
    let (orchestrator, store) = orchestrator_with_store();

    let answer = orchestrator.respond("fresh", "hello").await.unwrap();
    assert_eq!(answer, "hello");

    let log = store.read_all("fresh").await.unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].role, Role::User);
    assert_eq!(log[0].content, "hello");
    assert_eq!(log[1].role, Role::Assistant);
}

#[tokio::test]
async fn user_then_assistant_land_together() {
    let (orchestrator, store) = orchestrator_with_store();

    orchestrator.respond("s1", "one").await.unwrap();
    orchestrator.respond("s1", "two").await.unwrap();

    let log = store.read_all("s1").await.unwrap();
    let roles: Vec<Role> = log.iter().map(|m| m.role).collect();
    assert_eq!(roles, [Role::User, Role::Assistant, Role::User, Role::Assistant]);
}

#[tokio::test]
async fn sessions_are_isolated() {
    let (orchestrator, _store) = orchestrator_with_store();

    orchestrator.respond("a", "apple").await.unwrap();
    let answer = orchestrator.respond("b", "banana").await.unwrap();

    assert!(!answer.contains("apple"));
}
