//! Session Store
//!
//! Owns the current session. A single background task performs the startup
//! read and then applies writes in the order the mutations were made.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use warden_storage::KeyValueStore;

use crate::error::SessionError;
use crate::session::{ParseOutcome, Session};
use crate::state::{AuthState, LoadOutcome, LoadState};
use crate::Result;

/// Default storage key for the persisted session
pub const SESSION_KEY: &str = "user_session";

enum WriteOp {
    Put(String),
    Delete,
    /// Completes once everything queued before it has been applied
    Barrier,
}

struct WriteRequest {
    op: WriteOp,
    done: oneshot::Sender<warden_storage::Result<()>>,
}

/// Completion handle for a queued storage write.
///
/// Dropping it leaves the write running.
pub struct PendingWrite {
    rx: oneshot::Receiver<warden_storage::Result<()>>,
}

impl PendingWrite {
    /// Wait until the write reached storage.
    pub async fn persisted(self) -> Result<()> {
        match self.rx.await {
            Ok(result) => result.map_err(SessionError::from),
            Err(_) => Err(SessionError::Closed),
        }
    }
}

struct Inner {
    key: String,
    state: Arc<watch::Sender<AuthState>>,
    writes: mpsc::UnboundedSender<WriteRequest>,
}

/// Cloning yields another handle to the same store.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

impl SessionStore {
    /// Open the store and start restoring the session stored under `key`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open(storage: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        let key = key.into();

        let mut initial = AuthState::default();
        initial.phase = LoadState::Loading;

        let (state, _) = watch::channel(initial);
        let state = Arc::new(state);
        let (writes, rx) = mpsc::unbounded_channel();

        tokio::spawn(run_worker(storage, key.clone(), Arc::clone(&state), rx));

        tracing::debug!(key = %key, "Opened session store");

        Self {
            inner: Arc::new(Inner { key, state, writes }),
        }
    }

    pub fn key(&self) -> &str {
        &self.inner.key
    }

    /// Snapshot of the current state
    pub fn current(&self) -> AuthState {
        self.inner.state.borrow().clone()
    }

    pub fn session(&self) -> Option<Session> {
        self.inner.state.borrow().session.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().is_loading()
    }

    pub fn load_outcome(&self) -> Option<LoadOutcome> {
        self.inner.state.borrow().load_outcome
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.inner.state.subscribe()
    }

    /// Wait for the startup read to complete.
    pub async fn ready(&self) -> AuthState {
        let mut rx = self.subscribe();
        let state = match rx.wait_for(|state| !state.is_loading()).await {
            Ok(state) => state.clone(),
            Err(_) => self.current(),
        };
        state
    }

    /// Replace the current session. Subscribers see it immediately; the
    /// returned handle reports when it has been persisted.
    pub fn sign_in(&self, session: Session) -> Result<PendingWrite> {
        let value = serde_json::to_string(&session)?;
        let pending = self.mutate(Some(session), WriteOp::Put(value))?;

        tracing::info!(key = %self.inner.key, "Signed in");
        Ok(pending)
    }

    /// Clear the current session and its persisted entry.
    pub fn sign_out(&self) -> Result<PendingWrite> {
        let pending = self.mutate(None, WriteOp::Delete)?;

        tracing::info!(key = %self.inner.key, "Signed out");
        Ok(pending)
    }

    /// Wait until every write queued so far has been applied.
    pub async fn flush(&self) -> Result<()> {
        let (done, rx) = oneshot::channel();
        self.inner
            .writes
            .send(WriteRequest {
                op: WriteOp::Barrier,
                done,
            })
            .map_err(|_| SessionError::Closed)?;

        PendingWrite { rx }.persisted().await
    }

    // Memory update and enqueue happen under the same watch lock, so the
    // write queue order always matches the order seen by subscribers.
    fn mutate(&self, session: Option<Session>, op: WriteOp) -> Result<PendingWrite> {
        let (done, rx) = oneshot::channel();
        let request = WriteRequest { op, done };
        let writes = &self.inner.writes;

        let accepted = self.inner.state.send_if_modified(move |state| {
            if state.phase != LoadState::Ready {
                return false;
            }
            state.session = session;
            if writes.send(request).is_err() {
                tracing::warn!("Session writer stopped; change kept in memory only");
            }
            true
        });

        if !accepted {
            return Err(SessionError::NotReady);
        }

        Ok(PendingWrite { rx })
    }
}

async fn run_worker(
    storage: Arc<dyn KeyValueStore>,
    key: String,
    state: Arc<watch::Sender<AuthState>>,
    mut writes: mpsc::UnboundedReceiver<WriteRequest>,
) {
    // Read on its own task so a panicking backend still lets the store reach Ready
    let read = {
        let storage = Arc::clone(&storage);
        let key = key.clone();
        tokio::spawn(async move { storage.read(&key).await })
    };

    let loaded = match read.await {
        Ok(Ok(raw)) => Some(ParseOutcome::from_stored(raw.as_deref())),
        Ok(Err(e)) => {
            tracing::error!(key = %key, error = %e, "Failed to read stored session");
            None
        }
        Err(e) => {
            tracing::error!(key = %key, error = %e, "Stored session read aborted");
            None
        }
    };

    if let Some(ParseOutcome::Malformed { reason }) = &loaded {
        tracing::warn!(key = %key, reason = %reason, "Failed to parse stored session");
    }

    state.send_modify(|state| {
        let finished = match loaded {
            Some(outcome) => state.finish_loading(outcome),
            None => state.finish_unavailable(),
        };
        if let Err(e) = finished {
            tracing::error!(key = %key, error = %e, "Session load finished out of order");
        }
    });

    tracing::info!(
        key = %key,
        signed_in = state.borrow().session.is_some(),
        "Session store ready"
    );

    while let Some(request) = writes.recv().await {
        let result = match &request.op {
            WriteOp::Put(value) => storage.write(&key, value).await,
            WriteOp::Delete => storage.delete(&key).await,
            WriteOp::Barrier => Ok(()),
        };

        if let Err(e) = &result {
            tracing::error!(key = %key, error = %e, "Failed to persist session");
        }

        // The caller may have dropped its handle
        let _ = request.done.send(result);
    }

    tracing::debug!(key = %key, "Session writer stopped");
}
