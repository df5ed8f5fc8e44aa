//! In-memory registry of live study sessions.
//!
//! Sessions are keyed by id and expire after a period of inactivity. When
//! the store is full the least recently active session is evicted.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use diagramlens_core::{LensError, LensResult};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::study::{SessionView, StudySession};

#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, StudySession>>>,
    max_sessions: usize,
}

impl SessionStore {
    pub fn new(max_sessions: usize) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            max_sessions: max_sessions.max(1),
        }
    }

    /// Store a session, evicting the stalest one if at capacity.
    pub async fn insert(&self, session: StudySession) -> Uuid {
        let id = session.id;
        let mut w = self.sessions.write().await;
        while w.len() >= self.max_sessions {
            let Some(oldest) = w
                .values()
                .min_by_key(|s| s.last_active)
                .map(|s| s.id)
            else {
                break;
            };
            w.remove(&oldest);
            info!(session = %oldest, "Evicted least recently used session");
        }
        w.insert(id, session);
        debug!(session = %id, live = w.len(), "Session stored");
        id
    }

    /// Snapshot of a session. Reading does not count as activity.
    pub async fn view(&self, id: &Uuid, include_image: bool) -> LensResult<SessionView> {
        let r = self.sessions.read().await;
        r.get(id)
            .map(|s| s.view(include_image))
            .ok_or_else(|| LensError::SessionNotFound(id.to_string()))
    }

    /// Clone of a whole session, for work done outside the lock.
    pub async fn get(&self, id: &Uuid) -> LensResult<StudySession> {
        let r = self.sessions.read().await;
        r.get(id)
            .cloned()
            .ok_or_else(|| LensError::SessionNotFound(id.to_string()))
    }

    /// Run `f` against a session under the write lock and mark it active.
    pub async fn with_session_mut<R>(
        &self,
        id: &Uuid,
        f: impl FnOnce(&mut StudySession) -> R,
    ) -> LensResult<R> {
        let mut w = self.sessions.write().await;
        let session = w
            .get_mut(id)
            .ok_or_else(|| LensError::SessionNotFound(id.to_string()))?;
        session.touch();
        Ok(f(session))
    }

    pub async fn remove(&self, id: &Uuid) -> bool {
        let mut w = self.sessions.write().await;
        w.remove(id).is_some()
    }

    /// Drop sessions idle longer than `ttl`. Returns how many were removed.
    pub async fn reap_expired(&self, ttl: Duration) -> usize {
        let mut w = self.sessions.write().await;
        let before = w.len();
        w.retain(|_, s| !s.is_expired(ttl));
        let reaped = before - w.len();
        if reaped > 0 {
            info!(reaped, live = w.len(), "Reaped expired sessions");
        }
        reaped
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.max_sessions
    }
}
