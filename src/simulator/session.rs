//! Per-player game sessions
//!
//! A [`SessionStore`] keeps at most one live session per player identity.
//! The map sits behind a read-write lock and every session behind its own
//! mutex, so steps on different players never contend.

use ahash::AHashMap;
use parking_lot::{Mutex, MutexGuard, RwLock};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{RestartError, Result};
use crate::property::AttributeSet;

/// Lifecycle of a game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionStatus {
    Created,
    /// Waiting for random or manual allocation
    AttributesPending,
    Active,
    Ended,
}

/// One player's game
#[derive(Debug, Clone)]
pub struct UserSession {
    pub identity: String,
    /// `None` until allocation succeeds
    pub attributes: Option<AttributeSet>,
    pub age: i32,
    pub status: SessionStatus,
    pub last_active: Instant,
}

impl UserSession {
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            attributes: None,
            age: 0,
            status: SessionStatus::Created,
            last_active: Instant::now(),
        }
    }

    /// Open the game at `start_age`, ready for allocation
    pub fn begin(&mut self, start_age: i32) {
        self.attributes = None;
        self.age = start_age;
        self.status = SessionStatus::AttributesPending;
        self.touch();
    }

    pub fn touch(&mut self) {
        self.last_active = Instant::now();
    }

    pub fn is_ended(&self) -> bool {
        self.status == SessionStatus::Ended
    }

    pub fn idle_for(&self) -> Duration {
        self.last_active.elapsed()
    }
}

/// Live sessions keyed by player identity
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<AHashMap<String, Arc<Mutex<UserSession>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new game for `identity`, discarding any previous one
    pub fn start(&self, identity: &str, start_age: i32) -> Arc<Mutex<UserSession>> {
        let mut session = UserSession::new(identity);
        session.begin(start_age);
        let session = Arc::new(Mutex::new(session));

        let replaced = self
            .sessions
            .write()
            .insert(identity.to_string(), Arc::clone(&session))
            .is_some();
        tracing::info!(identity, start_age, replaced, "game started");

        session
    }

    pub fn find(&self, identity: &str) -> Option<Arc<Mutex<UserSession>>> {
        self.sessions.read().get(identity).cloned()
    }

    /// Run `f` with the player's session locked.
    ///
    /// The map lock is released before the session lock is taken. Once the
    /// session is locked the map is checked again, so a session evicted or
    /// replaced in between is never handed to `f`.
    pub fn with_session<T>(
        &self,
        identity: &str,
        f: impl FnOnce(&mut UserSession) -> Result<T>,
    ) -> Result<T> {
        loop {
            let session = self
                .find(identity)
                .ok_or_else(|| RestartError::SessionNotFound(identity.to_string()))?;
            if let Some(mut guard) = self.lock_current(identity, &session) {
                guard.touch();
                return f(&mut guard);
            }
            tracing::debug!(identity, "session changed while waiting for its lock");
        }
    }

    /// Lock `session`, keeping the guard only if it is still the live
    /// session for `identity`
    fn lock_current<'a>(
        &self,
        identity: &str,
        session: &'a Arc<Mutex<UserSession>>,
    ) -> Option<MutexGuard<'a, UserSession>> {
        let guard = session.lock();
        let live = self
            .sessions
            .read()
            .get(identity)
            .is_some_and(|current| Arc::ptr_eq(current, session));
        live.then_some(guard)
    }

    /// Drop the player's session; returns whether one existed
    pub fn end(&self, identity: &str) -> bool {
        let removed = self.sessions.write().remove(identity).is_some();
        if removed {
            tracing::info!(identity, "game removed");
        }
        removed
    }

    /// Remove sessions idle for longer than `timeout`.
    ///
    /// Sessions locked by an in-flight operation are skipped. Returns the
    /// number removed.
    pub fn evict_idle(&self, timeout: Duration) -> usize {
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, session| match session.try_lock() {
            Some(guard) => guard.idle_for() <= timeout,
            None => true,
        });
        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::info!(evicted, remaining = sessions.len(), "idle sessions evicted");
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}
