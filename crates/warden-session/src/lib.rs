//! Warden Session Management
//!
//! - At most one session is current at a time
//! - The persisted copy is restored once, asynchronously, when the store opens
//! - Sign-in and sign-out update memory immediately and persist in call order
//! - Unreadable persisted data degrades to "signed out"

mod error;
mod session;
mod state;
mod store;

pub use error::SessionError;
pub use session::{ParseOutcome, Session, User};
pub use state::{AuthState, LoadOutcome, LoadState};
pub use store::{PendingWrite, SessionStore, SESSION_KEY};

pub type Result<T> = std::result::Result<T, SessionError>;
