//! Warden Core
//!
//! Wires configuration, storage and the session store together and guards
//! access to the store behind an explicitly mounted provider.

mod config;
mod error;
mod provider;

pub use config::{Config, StorageBackend};
pub use error::CoreError;
pub use provider::{open_storage, AuthProvider};

// Re-export core components
pub use warden_session::{
    AuthState, LoadOutcome, LoadState, ParseOutcome, PendingWrite, Session, SessionError,
    SessionStore, User, SESSION_KEY,
};
pub use warden_storage::{Database, FileStore, KeyValueStore, MemoryStore, StorageError};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
///
/// Filter comes from `RUST_LOG`, defaulting to `info`. Calling this more
/// than once keeps the first subscriber.
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if fmt().with_env_filter(filter).with_target(true).try_init().is_err() {
        tracing::debug!("Logging already initialized");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_twice() {
        init_logging();
        init_logging();
    }
}
