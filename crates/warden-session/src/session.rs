//! Session data structure

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: String,
    pub name: String,
    pub email: String,
}

/// Credential plus identity. Replaced as a whole, never edited in place.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Opaque credential
    pub token: String,
    pub user: User,
}

impl Session {
    pub fn new(token: impl Into<String>, user: User) -> Self {
        Self {
            token: token.into(),
            user,
        }
    }
}

// Keep the credential out of logs
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("user", &self.user)
            .finish()
    }
}

/// Result of interpreting a persisted value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    /// Nothing stored, an empty string, or a JSON `null`
    Empty,
    Valid(Session),
    Malformed { reason: String },
}

impl ParseOutcome {
    pub fn from_stored(raw: Option<&str>) -> Self {
        match raw {
            None | Some("") => ParseOutcome::Empty,
            Some(raw) => match serde_json::from_str::<Option<Session>>(raw) {
                Ok(Some(session)) => ParseOutcome::Valid(session),
                Ok(None) => ParseOutcome::Empty,
                Err(e) => ParseOutcome::Malformed {
                    reason: e.to_string(),
                },
            },
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, ParseOutcome::Malformed { .. })
    }

    /// Collapse to what consumers see: corrupt data reads as signed out.
    pub fn into_session(self) -> Option<Session> {
        match self {
            ParseOutcome::Valid(session) => Some(session),
            ParseOutcome::Empty | ParseOutcome::Malformed { .. } => None,
        }
    }
}
