//! Load State Machine
//!
//! ```text
//! Uninitialized
//!   ↓ store opened
//! Loading
//!   ↓ initial read completes
//! Ready
//! ```

use serde::{Deserialize, Serialize};

use crate::error::SessionError;
use crate::session::{ParseOutcome, Session};
use crate::Result;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadState {
    #[default]
    Uninitialized,
    /// Initial storage read in flight
    Loading,
    /// Initial read done; sign-in and sign-out allowed
    Ready,
}

impl LoadState {
    pub fn can_transition_to(&self, target: LoadState) -> bool {
        match (self, target) {
            (LoadState::Uninitialized, LoadState::Loading) => true,
            (LoadState::Loading, LoadState::Ready) => true,
            (a, b) if *a == b => true,
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LoadState::Uninitialized => "uninitialized",
            LoadState::Loading => "loading",
            LoadState::Ready => "ready",
        }
    }
}

impl std::fmt::Display for LoadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What the startup read found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadOutcome {
    /// No entry under the key
    Empty,
    Restored,
    /// Entry present but not a session
    Malformed,
    /// The storage read itself failed
    Unavailable,
}

impl From<&ParseOutcome> for LoadOutcome {
    fn from(outcome: &ParseOutcome) -> Self {
        match outcome {
            ParseOutcome::Empty => LoadOutcome::Empty,
            ParseOutcome::Valid(_) => LoadOutcome::Restored,
            ParseOutcome::Malformed { .. } => LoadOutcome::Malformed,
        }
    }
}

/// Snapshot handed to consumers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    pub(crate) phase: LoadState,
    pub(crate) session: Option<Session>,
    pub(crate) load_outcome: Option<LoadOutcome>,
}

impl AuthState {
    pub fn phase(&self) -> LoadState {
        self.phase
    }

    /// `None` means signed out, or not loaded yet when `is_loading()`.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn into_session(self) -> Option<Session> {
        self.session
    }

    pub fn is_loading(&self) -> bool {
        self.phase != LoadState::Ready
    }

    pub fn load_outcome(&self) -> Option<LoadOutcome> {
        self.load_outcome
    }

    pub(crate) fn advance(&mut self, target: LoadState) -> Result<()> {
        if !self.phase.can_transition_to(target) {
            return Err(SessionError::InvalidTransition {
                from: self.phase.to_string(),
                to: target.to_string(),
            });
        }
        self.phase = target;
        Ok(())
    }

    /// Loading flag, session and outcome change together.
    pub(crate) fn finish_loading(&mut self, outcome: ParseOutcome) -> Result<()> {
        self.advance(LoadState::Ready)?;
        self.load_outcome = Some(LoadOutcome::from(&outcome));
        self.session = outcome.into_session();
        Ok(())
    }

    pub(crate) fn finish_unavailable(&mut self) -> Result<()> {
        self.advance(LoadState::Ready)?;
        self.load_outcome = Some(LoadOutcome::Unavailable);
        self.session = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_transitions() {
        assert!(LoadState::Uninitialized.can_transition_to(LoadState::Loading));
        assert!(LoadState::Loading.can_transition_to(LoadState::Ready));
        assert!(LoadState::Ready.can_transition_to(LoadState::Ready));
    }

    #[test]
    fn test_invalid_transitions() {
        // No way back into loading
        assert!(!LoadState::Ready.can_transition_to(LoadState::Loading));
        assert!(!LoadState::Ready.can_transition_to(LoadState::Uninitialized));
        // Loading cannot be skipped
        assert!(!LoadState::Uninitialized.can_transition_to(LoadState::Ready));
    }

    #[test]
    fn test_finish_loading_is_single_step() {
        let mut state = AuthState::default();
        state.advance(LoadState::Loading).unwrap();
        assert!(state.is_loading());

        state.finish_loading(ParseOutcome::Empty).unwrap();
        assert!(!state.is_loading());
        assert_eq!(state.session(), None);
        assert_eq!(state.load_outcome(), Some(LoadOutcome::Empty));
    }

    #[test]
    fn test_finish_loading_requires_loading() {
        let mut state = AuthState::default();
        let err = state.finish_loading(ParseOutcome::Empty).unwrap_err();
        assert!(matches!(err, SessionError::InvalidTransition { .. }));
        assert_eq!(state.phase(), LoadState::Uninitialized);
    }
}
