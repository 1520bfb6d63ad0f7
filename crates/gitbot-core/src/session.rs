//! Live comment browsers keyed by session id
//!
//! Each session wraps one [`PaginationController`] behind its own mutex, so
//! concurrent clicks on the same message are applied one at a time. The
//! registry lock only guards the map itself.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::pagination::{CommentPage, Direction, Navigation, PaginationController};

/// Inactivity window after which a comment browser stops responding
pub const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_secs(300);

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

struct Session {
    controller: PaginationController,
    /// `None` when the timeout reaches past what `Instant` can represent
    expires_at: Option<Instant>,
}

impl Session {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| now >= deadline)
    }
}

/// Result of routing a navigation event to a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Page changed; replace the hosting message
    Rendered(CommentPage),
    /// Boundary reached; acknowledge only
    Acknowledged,
    /// Session timed out; the page is returned with controls disabled
    Expired(CommentPage),
    /// No session with that id
    Missing,
}

/// Registry of open comment browsers
pub struct PaginationSessions {
    timeout: Duration,
    sessions: Mutex<HashMap<String, Arc<Mutex<Session>>>>,
}

impl Default for PaginationSessions {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_TIMEOUT)
    }
}

impl PaginationSessions {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn deadline(&self, now: Instant) -> Option<Instant> {
        now.checked_add(self.timeout)
    }

    /// Register a controller and render its first page.
    ///
    /// Sessions that expired by `now` are dropped first.
    pub fn open(
        &self,
        session_id: impl Into<String>,
        controller: PaginationController,
        now: Instant,
    ) -> CommentPage {
        let session_id = session_id.into();
        let page = controller.render_page();
        let session = Session {
            controller,
            expires_at: self.deadline(now),
        };
        let swept = self.sweep(now);
        if swept > 0 {
            tracing::debug!(swept, "expired comment sessions dropped");
        }
        tracing::debug!(session = %session_id, total = page.total, "comment session opened");
        lock(&self.sessions).insert(session_id, Arc::new(Mutex::new(session)));
        page
    }

    /// Apply a navigation event to a session
    pub fn navigate(&self, session_id: &str, direction: Direction, now: Instant) -> SessionEvent {
        let entry = lock(&self.sessions).get(session_id).cloned();
        let Some(entry) = entry else {
            return SessionEvent::Missing;
        };

        let mut session = lock(&entry);
        if session.is_expired(now) {
            let page = session.controller.render_page().disabled();
            drop(session);
            self.remove_if_same(session_id, &entry);
            tracing::debug!(session = session_id, "comment session expired");
            return SessionEvent::Expired(page);
        }

        session.expires_at = self.deadline(now);
        match session.controller.navigate(direction) {
            Navigation::Rendered(page) => {
                tracing::debug!(
                    session = session_id,
                    direction = direction.as_str(),
                    page = page.page,
                    "comment page changed"
                );
                SessionEvent::Rendered(page)
            }
            Navigation::Unchanged => SessionEvent::Acknowledged,
        }
    }

    /// Drop every expired session, returning how many were removed
    pub fn sweep(&self, now: Instant) -> usize {
        let mut sessions = lock(&self.sessions);
        let before = sessions.len();
        sessions.retain(|_, entry| !lock(entry).is_expired(now));
        before - sessions.len()
    }

    pub fn len(&self) -> usize {
        lock(&self.sessions).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn remove_if_same(&self, session_id: &str, entry: &Arc<Mutex<Session>>) {
        let mut sessions = lock(&self.sessions);
        if sessions
            .get(session_id)
            .is_some_and(|current| Arc::ptr_eq(current, entry))
        {
            sessions.remove(session_id);
        }
    }
}
