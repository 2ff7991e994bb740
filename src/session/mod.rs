//! Server-side session state and its storage.

mod state;
mod store;

pub use state::{ResolvedKey, RowTokens, SessionState};
pub use store::{MemorySessionStore, SessionStore};
