//! Session store: maps session ids to message logs, with per-session
//! run exclusion.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::{MnemoError, Result};
use crate::session::log::MessageLog;
use crate::types::ChatMessage;

/// One logical dialogue: id, history, and access bookkeeping.
#[derive(Debug)]
pub struct Session {
    pub id: String,
    pub log: MessageLog,
    pub last_accessed: DateTime<Utc>,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            log: MessageLog::new(),
            last_accessed: Utc::now(),
        }
    }

    /// Record an access. Eviction policies key off this timestamp.
    pub fn touch(&mut self) {
        self.last_accessed = Utc::now();
    }
}

/// Exclusive access to one session for the duration of a run.
///
/// Holding the guard is what enforces at-most-one in-flight run per
/// session; all appends for a run happen through it.
pub type SessionGuard = OwnedMutexGuard<Session>;

/// Shared handle to one session's state.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    inner: Arc<Mutex<Session>>,
}

impl SessionHandle {
    fn new(session: Session) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    /// Acquire the session, waiting for any in-flight run to finish.
    pub async fn lock(&self) -> SessionGuard {
        self.inner.clone().lock_owned().await
    }

    /// Acquire the session only if no run is in flight.
    pub fn try_lock(&self) -> Option<SessionGuard> {
        self.inner.clone().try_lock_owned().ok()
    }
}

/// Store boundary: create-on-first-access plus ordered append/read.
///
/// A persistent backend implements the same contract and must preserve
/// append order across process restarts.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Fetch the session, creating an empty one on first reference.
    /// Idempotent; never fails.
    async fn get_or_create(&self, id: &str) -> SessionHandle;

    /// Fetch an existing session; [`MnemoError::UnknownSession`] on a miss.
    async fn lookup(&self, id: &str) -> Result<SessionHandle>;

    /// Append one message, waiting for any in-flight run first.
    async fn append_message(&self, id: &str, message: ChatMessage) -> Result<()>;

    /// The full history, in insertion order.
    async fn read_all(&self, id: &str) -> Result<Vec<ChatMessage>>;
}

/// Process-duration store backed by a map. Sessions for different ids
/// never block each other; the outer lock is only held to clone handles.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids of all live sessions.
    pub fn session_ids(&self) -> Vec<String> {
        self.sessions.read().unwrap().keys().cloned().collect()
    }

    /// Drop a session. Lifecycle beyond this is the caller's concern.
    pub fn remove(&self, id: &str) -> Option<SessionHandle> {
        self.sessions.write().unwrap().remove(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().unwrap().is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get_or_create(&self, id: &str) -> SessionHandle {
        if let Some(handle) = self.sessions.read().unwrap().get(id) {
            return handle.clone();
        }
        let mut map = self.sessions.write().unwrap();
        map.entry(id.to_string())
            .or_insert_with(|| SessionHandle::new(Session::new(id)))
            .clone()
    }

    async fn lookup(&self, id: &str) -> Result<SessionHandle> {
        self.sessions
            .read()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| MnemoError::UnknownSession(id.to_string()))
    }

    async fn append_message(&self, id: &str, message: ChatMessage) -> Result<()> {
        let handle = self.lookup(id).await?;
        let mut session = handle.lock().await;
        session.touch();
        session.log.append(message);
        Ok(())
    }

    async fn read_all(&self, id: &str) -> Result<Vec<ChatMessage>> {
        let handle = self.lookup(id).await?;
        let session = handle.lock().await;
        Ok(session.log.snapshot())
    }
}
