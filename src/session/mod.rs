//! Session state: message logs and the session store.

pub mod log;
pub mod store;

pub use log::MessageLog;
pub use store::{InMemorySessionStore, Session, SessionGuard, SessionHandle, SessionStore};
