//! Portal session registry
//!
//! Each browser is identified by an opaque `portal_sid` cookie. Behind it
//! lives one [`SessionManager`] with its own authentication service client,
//! whose cookie jar holds that browser's credential, and its own session
//! cache. Nothing is shared between portal sessions.
//!
//! File-backed caches live flat in the cache directory as
//! `<sid>.<key>.json`. Sids are never reused, so files found there at
//! startup belong to an earlier process and are deleted.

use auth_gateway::SessionLocator;
use auth_identity::{AuthServiceConfig, AuthServiceError, AuthenticationService, HttpAuthService};
use auth_session::{
    FileSessionCache, MemorySessionCache, SessionCache, SessionConfig, SessionEvent, SessionManager,
    SessionStatus,
};
use axum::http::HeaderMap;
use axum_extra::extract::cookie::CookieJar;
use dashmap::DashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Name of the cookie carrying the portal session id
pub const PORTAL_COOKIE: &str = "portal_sid";

/// Builds the authentication service client of a new portal session
pub type ServiceFactory =
    Arc<dyn Fn() -> Result<Arc<dyn AuthenticationService>, AuthServiceError> + Send + Sync>;

/// A portal session that exists but is not yet reachable through its cookie
pub struct PendingSession {
    pub sid: String,
    pub manager: Arc<SessionManager>,
}

struct PortalEntry {
    manager: Arc<SessionManager>,
    tasks: Vec<JoinHandle<()>>,
}

impl PortalEntry {
    fn abort_tasks(&self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

/// Counts reported by the status endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct RegistryStats {
    pub sessions: usize,
    pub authenticated: usize,
}

pub struct PortalRegistry {
    sessions: DashMap<String, PortalEntry>,
    factory: ServiceFactory,
    config: SessionConfig,
}

impl PortalRegistry {
    pub fn new(config: SessionConfig, factory: ServiceFactory) -> Self {
        if let Some(directory) = &config.cache.directory {
            let swept = sweep_cache_directory(directory, &config.cache.key);
            if swept > 0 {
                info!(swept, directory = %directory.display(), "Removed session caches of an earlier run");
            }
        }

        Self {
            sessions: DashMap::new(),
            factory,
            config,
        }
    }

    /// Registry whose sessions talk to the HTTP authentication service
    pub fn http(auth: &AuthServiceConfig, config: SessionConfig) -> Self {
        let auth = auth.clone();
        let factory: ServiceFactory = Arc::new(move || {
            let service = HttpAuthService::new(&auth)?;
            Ok(Arc::new(service) as Arc<dyn AuthenticationService>)
        });
        Self::new(config, factory)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Create a session manager under a fresh id without registering it.
    ///
    /// # Errors
    ///
    /// The service factory's error when no client could be built.
    pub fn open(&self) -> Result<PendingSession, AuthServiceError> {
        let sid = Uuid::new_v4().simple().to_string();
        let service = (self.factory)()?;
        let manager = Arc::new(SessionManager::new(
            service,
            self.cache_for(&sid),
            self.config.clone(),
        ));
        Ok(PendingSession { sid, manager })
    }

    /// Make a pending session reachable and start its background tasks
    pub fn register(&self, pending: PendingSession) -> String {
        let PendingSession { sid, manager } = pending;
        let tasks = vec![
            manager.spawn_silent_refresh(),
            spawn_event_log(manager.subscribe()),
        ];
        self.sessions.insert(sid.clone(), PortalEntry { manager, tasks });
        sid
    }

    pub fn get(&self, sid: &str) -> Option<Arc<SessionManager>> {
        self.sessions.get(sid).map(|entry| Arc::clone(&entry.manager))
    }

    /// Log the session out and forget it. Returns whether it existed.
    pub async fn remove(&self, sid: &str) -> bool {
        let Some((_, entry)) = self.sessions.remove(sid) else {
            return false;
        };
        entry.abort_tasks();
        if entry.manager.is_authenticated() {
            entry.manager.logout().await;
        }
        self.discard_cache(sid);
        true
    }

    /// Drop logged-out sessions and end idle ones. Returns how many were removed.
    pub async fn prune(&self) -> usize {
        let mut idle = Vec::new();
        let before = self.sessions.len();

        self.sessions.retain(|sid, entry| match entry.manager.status() {
            SessionStatus::Anonymous => {
                entry.abort_tasks();
                self.discard_cache(sid);
                false
            }
            SessionStatus::IdleExpired => {
                idle.push(sid.clone());
                true
            }
            SessionStatus::Unverified | SessionStatus::Fresh | SessionStatus::Stale => true,
        });
        let mut removed = before.saturating_sub(self.sessions.len());

        for sid in idle {
            if let Some((_, entry)) = self.sessions.remove(&sid) {
                entry.abort_tasks();
                entry.manager.expire_idle().await;
                self.discard_cache(&sid);
                removed = removed.saturating_add(1);
            }
        }

        if removed > 0 {
            debug!(removed, remaining = self.sessions.len(), "Pruned portal sessions");
        }
        removed
    }

    /// Run [`prune`](Self::prune) every `period`
    pub fn spawn_pruner(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let registry = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(registry) = registry.upgrade() else {
                    break;
                };
                registry.prune().await;
            }
        })
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn stats(&self) -> RegistryStats {
        let authenticated = self
            .sessions
            .iter()
            .filter(|entry| entry.manager.is_authenticated())
            .count();
        RegistryStats {
            sessions: self.sessions.len(),
            authenticated,
        }
    }

    fn file_cache(&self, sid: &str) -> Option<FileSessionCache> {
        let directory = self.config.cache.directory.as_ref()?;
        Some(FileSessionCache::new(directory, &format!("{sid}.{}", self.config.cache.key)))
    }

    fn cache_for(&self, sid: &str) -> Arc<dyn SessionCache> {
        match self.file_cache(sid) {
            Some(cache) => Arc::new(cache),
            None => Arc::new(MemorySessionCache::new()),
        }
    }

    /// Delete a forgotten session's cache file, if it still has one
    fn discard_cache(&self, sid: &str) {
        if let Some(cache) = self.file_cache(sid) {
            if let Err(error) = cache.clear() {
                warn!(error = %error, "Failed to remove portal session cache");
            }
        }
    }
}

impl SessionLocator for PortalRegistry {
    fn locate(&self, headers: &HeaderMap) -> Option<Arc<SessionManager>> {
        let jar = CookieJar::from_headers(headers);
        let sid = jar.get(PORTAL_COOKIE)?;
        self.get(sid.value())
    }
}

/// Delete every `*.<key>.json` (and leftover temp file) in `directory`
fn sweep_cache_directory(directory: &Path, key: &str) -> usize {
    let entries = match fs::read_dir(directory) {
        Ok(entries) => entries,
        Err(error) => {
            debug!(error = %error, directory = %directory.display(), "Session cache directory not readable");
            return 0;
        }
    };

    let suffixes = [format!(".{key}.json"), format!(".{key}.json.tmp")];
    let mut swept = 0usize;
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if !suffixes.iter().any(|suffix| name.ends_with(suffix.as_str())) {
            continue;
        }
        match fs::remove_file(entry.path()) {
            Ok(()) => swept = swept.saturating_add(1),
            Err(error) => warn!(error = %error, file = name, "Failed to remove stale session cache"),
        }
    }
    swept
}

fn spawn_event_log(mut events: broadcast::Receiver<SessionEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    let user_id = event.user_id().to_string();
                    match event {
                        SessionEvent::LoggedIn { role_id, .. } => {
                            info!(user_id = %user_id, role_id, "Portal session logged in");
                        }
                        SessionEvent::Verified { .. } => debug!(user_id = %user_id, "Portal session verified"),
                        SessionEvent::Invalidated { .. } => {
                            info!(user_id = %user_id, "Portal session invalidated by the authentication service");
                        }
                        SessionEvent::LoggedOut { .. } => info!(user_id = %user_id, "Portal session logged out"),
                        SessionEvent::IdleExpired { .. } => info!(user_id = %user_id, "Portal session idle expired"),
                    }
                }
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Session event log lagging"),
                Err(RecvError::Closed) => break,
            }
        }
    })
}
