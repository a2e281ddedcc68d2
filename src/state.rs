// src/state.rs

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::FromRef;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::{
    config::Config,
    exam::{ExamEngine, session::ExamSession},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub engine: Arc<ExamEngine>,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(config: Config, engine: ExamEngine) -> Self {
        let sessions = SessionStore::new(config.session_ttl);
        Self {
            config,
            engine: Arc::new(engine),
            sessions,
        }
    }
}

impl FromRef<AppState> for Arc<ExamEngine> {
    fn from_ref(state: &AppState) -> Self {
        state.engine.clone()
    }
}

impl FromRef<AppState> for SessionStore {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}

pub type SharedSession = Arc<Mutex<ExamSession>>;

struct Entry {
    inserted_at: Instant,
    session: SharedSession,
}

/// Live sessions keyed by attempt id.
///
/// Each session has its own lock so events for one attempt are applied
/// one at a time while other attempts proceed independently.
#[derive(Clone)]
pub struct SessionStore {
    entries: Arc<RwLock<HashMap<Uuid, Entry>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Stores a session and drops any that outlived the TTL.
    pub async fn insert(&self, session: ExamSession) -> SharedSession {
        let id = session.attempt_id();
        let shared = Arc::new(Mutex::new(session));

        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, e| e.inserted_at.elapsed() < self.ttl);
        if entries.len() != before {
            tracing::debug!("Pruned {} expired session(s)", before - entries.len());
        }
        entries.insert(
            id,
            Entry {
                inserted_at: Instant::now(),
                session: shared.clone(),
            },
        );

        shared
    }

    pub async fn get(&self, id: Uuid) -> Option<SharedSession> {
        let entries = self.entries.read().await;
        entries
            .get(&id)
            .filter(|e| e.inserted_at.elapsed() < self.ttl)
            .map(|e| e.session.clone())
    }
}
