//! Session-scoped analyzer storage.
//!
//! Concurrent clients must not share one analyzer: an edit or
//! re-ingestion from one would corrupt another's in-flight measurement.
//! [`SessionManager`] keeps one analyzer per opaque token; callers look
//! their analyzer up by token and hold its lock for the whole
//! read-modify-write sequence they perform.

use crate::analyzer::BarChartAnalyzer;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::debug;

/// Opaque handle identifying one analysis session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SessionToken(u64);

impl std::fmt::Display for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Owns all live analyzer sessions.
///
/// Tokens are never reused within a manager's lifetime.
#[derive(Debug)]
pub struct SessionManager<R> {
    sessions: RwLock<HashMap<SessionToken, Arc<Mutex<BarChartAnalyzer<R>>>>>,
    next_token: AtomicU64,
}

impl<R> Default for SessionManager<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> SessionManager<R> {
    /// Creates an empty manager.
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            next_token: AtomicU64::new(1),
        }
    }

    /// Registers an analyzer and returns its token.
    pub fn create(&self, analyzer: BarChartAnalyzer<R>) -> SessionToken {
        let token = SessionToken(self.next_token.fetch_add(1, Ordering::Relaxed));
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(token, Arc::new(Mutex::new(analyzer)));
        debug!(%token, "session created");
        token
    }

    /// Looks up the analyzer for `token`.
    ///
    /// The caller locks the returned analyzer for the duration of its
    /// operation sequence.
    pub fn get(&self, token: SessionToken) -> Option<Arc<Mutex<BarChartAnalyzer<R>>>> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&token)
            .cloned()
    }

    /// Drops the session for `token`, discarding its state. Returns
    /// whether a session existed.
    pub fn remove(&self, token: SessionToken) -> bool {
        let removed = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&token)
            .is_some();
        if removed {
            debug!(%token, "session removed");
        }
        removed
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no sessions are live.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
