use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use crate::vehicle::form::{FormController, SharedForm};
use crate::vehicle::lookup::VehicleLookup;

pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(60 * 60);

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub lookup: VehicleLookup,
    pub sessions: SessionStore,
}

struct SessionEntry {
    form: SharedForm,
    last_touched: Instant,
}

/// In-memory form sessions. Nothing survives a restart.
///
/// A session untouched for longer than `ttl` is evicted on the next `create` or sweep.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, SessionEntry>>>,
    ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_TTL)
    }
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::default(),
            ttl,
        }
    }

    pub async fn create(&self) -> (Uuid, SharedForm) {
        self.evict_idle().await;

        let id = Uuid::new_v4();
        let form: SharedForm = Arc::new(Mutex::new(FormController::new()));
        let entry = SessionEntry {
            form: form.clone(),
            last_touched: Instant::now(),
        };
        self.inner.write().await.insert(id, entry);
        (id, form)
    }

    /// Looks up a session and marks it as active.
    pub async fn get(&self, id: Uuid) -> Option<SharedForm> {
        let mut sessions = self.inner.write().await;
        let entry = sessions.get_mut(&id)?;
        entry.last_touched = Instant::now();
        Some(entry.form.clone())
    }

    pub async fn remove(&self, id: Uuid) -> bool {
        self.inner.write().await.remove(&id).is_some()
    }

    pub async fn count(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Drops every session idle for longer than the TTL. Returns how many were dropped.
    ///
    /// A submit or lookup already running for an evicted form still completes; its
    /// result just has nowhere to be read from.
    pub async fn evict_idle(&self) -> usize {
        let mut sessions = self.inner.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| entry.last_touched.elapsed() <= self.ttl);
        let evicted = before - sessions.len();
        if evicted > 0 {
            info!("Evicted {evicted} idle form session(s)");
        }
        evicted
    }

    /// Runs `evict_idle` every `period` until the runtime shuts down.
    pub fn spawn_sweeper(&self, period: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let evicted = store.evict_idle().await;
                debug!("Session sweep finished ({evicted} evicted)");
            }
        })
    }
}
