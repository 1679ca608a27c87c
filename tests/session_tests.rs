//! Tests for the session store and message log contracts.

use mnemo::error::MnemoError;
use mnemo::session::{InMemorySessionStore, SessionStore};
use mnemo::types::ChatMessage;
use pretty_assertions::assert_eq;

#[tokio::test]
async fn get_or_create_is_idempotent() {
    let store = InMemorySessionStore::new();

    let first = store.get_or_create("s1").await;
    let second = store.get_or_create("s1").await;

    // Mutations through one handle are visible through the other.
    {
        let mut session = first.lock().await;
        session.log.append(ChatMessage::user("hello"));
    }
    let session = second.lock().await;
    assert_eq!(session.log.len(), 1);
    assert_eq!(session.log.messages()[0].content, "hello");
}

#[tokio::test]
async fn lookup_miss_does_not_create() {
    let store = InMemorySessionStore::new();

    let err = store.lookup("missing").await.unwrap_err();
    assert!(matches!(err, MnemoError::UnknownSession(ref id) if id == "missing"));
    assert!(store.is_empty());
}

#[tokio::test]
async fn read_all_is_prefix_stable() {
    let store = InMemorySessionStore::new();
    store.get_or_create("s1").await;

    let mut snapshots = Vec::new();
    for i in 0..4 {
        store
            .append_message("s1", ChatMessage::user(format!("m{i}")))
            .await
            .unwrap();
        snapshots.push(store.read_all("s1").await.unwrap());
    }

    // Each earlier snapshot is a strict prefix of every later one.
    for window in snapshots.windows(2) {
        let (earlier, later) = (&window[0], &window[1]);
        assert!(earlier.len() < later.len());
        assert_eq!(earlier.as_slice(), &later[..earlier.len()]);
    }
}

#[tokio::test]
async fn append_preserves_insertion_order() {
    let store = InMemorySessionStore::new();
    store.get_or_create("s1").await;

    store
        .append_message("s1", ChatMessage::user("one"))
        .await
        .unwrap();
    store
        .append_message("s1", ChatMessage::assistant("two"))
        .await
        .unwrap();

    let log = store.read_all("s1").await.unwrap();
    let contents: Vec<&str> = log.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, ["one", "two"]);
}

#[tokio::test]
async fn remove_and_session_ids() {
    let store = InMemorySessionStore::new();
    store.get_or_create("a").await;
    store.get_or_create("b").await;

    let mut ids = store.session_ids();
    ids.sort();
    assert_eq!(ids, ["a", "b"]);

    assert!(store.remove("a").is_some());
    assert!(store.lookup("a").await.is_err());
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn sessions_do_not_block_each_other() {
    let store = InMemorySessionStore::new();
    let a = store.get_or_create("a").await;
    let _held = a.lock().await;

    // A run holding "a" must not stop "b" from being used.
    store
        .append_message("b", ChatMessage::user("hi"))
        .await
        .unwrap_err(); // b does not exist yet
    store.get_or_create("b").await;
    store
        .append_message("b", ChatMessage::user("hi"))
        .await
        .unwrap();
    assert_eq!(store.read_all("b").await.unwrap().len(), 1);
}

#[tokio::test]
async fn try_lock_reports_busy_session() {
    let store = InMemorySessionStore::new();
    let handle = store.get_or_create("s1").await;

    let guard = handle.lock().await;
    assert!(handle.try_lock().is_none());
    drop(guard);
    assert!(handle.try_lock().is_some());
}
