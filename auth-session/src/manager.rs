use crate::{
    cache::{CacheEntry, SessionCache},
    clock::{elapsed, Clock, SystemClock},
    config::SessionConfig,
    error::{Result, SessionError},
    events::{SessionEvent, SessionStatus},
};
use auth_identity::{AuthServiceError, AuthenticationService, Credentials, Identity, PasswordChange};
use auth_policy::Capability;
use chrono::{DateTime, Utc};
use error_common::{Classified, FailureKind};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace, warn};

const EVENT_CAPACITY: usize = 32;

#[derive(Debug, Default)]
struct SessionState {
    identity: Option<Identity>,
    last_verified_at: Option<DateTime<Utc>>,
    last_activity_at: Option<DateTime<Utc>>,
    /// Timestamp written to the cache entry
    established_at: Option<DateTime<Utc>>,
    /// Bumped by every login, logout, invalidation and idle expiry
    generation: u64,
}

impl SessionState {
    /// Drop the identity and start a new epoch, returning the old identity
    fn reset(&mut self) -> Option<Identity> {
        self.generation = self.generation.wrapping_add(1);
        self.last_verified_at = None;
        self.last_activity_at = None;
        self.established_at = None;
        self.identity.take()
    }
}

/// Owner of one session's lifecycle.
///
/// Login, logout, verification, silent refresh and activity tracking all go
/// through here. The session cache is written on every mutation but only
/// read once, at construction; the authentication service remains the only
/// authority on whether the session is valid.
///
/// Verifications are single-flight and generation-checked: a verification
/// whose epoch ended while it was in flight (for example by a logout) is
/// discarded.
pub struct SessionManager {
    service: Arc<dyn AuthenticationService>,
    cache: Arc<dyn SessionCache>,
    clock: Arc<dyn Clock>,
    config: SessionConfig,
    state: Mutex<SessionState>,
    verify_gate: tokio::sync::Mutex<()>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionManager {
    pub fn new(
        service: Arc<dyn AuthenticationService>,
        cache: Arc<dyn SessionCache>,
        config: SessionConfig,
    ) -> Self {
        Self::with_clock(service, cache, config, Arc::new(SystemClock))
    }

    /// Create a manager, hydrating from the cache when it holds a usable entry
    pub fn with_clock(
        service: Arc<dyn AuthenticationService>,
        cache: Arc<dyn SessionCache>,
        config: SessionConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let state = hydrate(cache.as_ref(), clock.as_ref(), &config);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            service,
            cache,
            clock,
            config,
            state: Mutex::new(state),
            verify_gate: tokio::sync::Mutex::new(()),
            events,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Log in with username and password.
    ///
    /// Nothing changes locally until the service answers. On failure the
    /// session is left unauthenticated and the reason returned; it is never
    /// persisted.
    ///
    /// # Errors
    ///
    /// [`SessionError::InvalidCredentials`] for rejected credentials,
    /// [`SessionError::Transient`] when the service could not be reached.
    pub async fn login(&self, credentials: &Credentials) -> Result<Identity> {
        match self.service.login(credentials).await {
            Ok(identity) => {
                let now = self.clock.now();
                {
                    let mut state = self.state.lock();
                    state.reset();
                    state.identity = Some(identity.clone());
                    state.last_verified_at = Some(now);
                    state.last_activity_at = Some(now);
                    state.established_at = Some(now);
                    self.persist(&state);
                }

                if !identity.is_consistently_scoped() {
                    warn!(
                        user_id = %identity.id,
                        role_id = identity.role_id,
                        "Identity role and hospital scope are inconsistent; access will fail closed"
                    );
                }
                info!(user_id = %identity.id, role_id = identity.role_id, "Login succeeded");
                self.publish(SessionEvent::LoggedIn {
                    user_id: identity.id.clone(),
                    role_id: identity.role_id,
                });
                Ok(identity)
            }
            Err(error) => {
                self.end_session(None);
                warn!(
                    username = %credentials.username,
                    error_code = error.kind().code(),
                    error = %error,
                    "Login failed"
                );
                Err(error.into())
            }
        }
    }

    /// Log out. Local state and the cache are cleared before the service is
    /// told, so a failed remote logout still leaves the session logged out.
    pub async fn logout(&self) {
        let user_id = self.end_session(Some(LogoutReason::Requested));
        if let Err(error) = self.service.logout().await {
            warn!(
                user_id = user_id.as_deref().unwrap_or("-"),
                error_code = error.kind().code(),
                error = %error,
                "Remote logout failed; session cleared locally"
            );
        }
    }

    /// Confirm the current credential with the authentication service.
    ///
    /// Returns the cached identity without a network call when the session
    /// was verified within the verification interval, or when another
    /// verification is already in flight for a session verified before. A
    /// session that was never verified waits for the in-flight verification
    /// instead. A rejected verification gets one
    /// refresh attempt; if that is rejected too, the session is cleared and
    /// `Ok(None)` returned.
    ///
    /// # Errors
    ///
    /// [`SessionError::Transient`] when the service could not be reached. The
    /// session is left untouched.
    pub async fn verify(&self) -> Result<Option<Identity>> {
        if let Some(identity) = self.throttled_identity() {
            trace!(user_id = %identity.id, "Verification throttled");
            return Ok(Some(identity));
        }

        let _gate = match self.verify_gate.try_lock() {
            Ok(gate) => gate,
            Err(_) if self.last_verified_at().is_some() => {
                trace!("Verification already in flight");
                return Ok(self.state.lock().identity.clone());
            }
            Err(_) => {
                trace!("Waiting for in-flight verification of an unverified session");
                let gate = self.verify_gate.lock().await;
                if self.state.lock().identity.is_none() {
                    return Ok(None);
                }
                gate
            }
        };

        // A verification may have completed while we were checking the gate
        if let Some(identity) = self.throttled_identity() {
            return Ok(Some(identity));
        }

        let generation = self.generation();
        let outcome = match self.service.verify().await {
            Err(AuthServiceError::Unauthorized) => {
                debug!("Credential rejected, attempting refresh");
                self.service.refresh().await
            }
            other => other,
        };

        match outcome {
            Ok(identity) => Ok(self.commit_verified(generation, identity)),
            Err(AuthServiceError::Unauthorized | AuthServiceError::InvalidCredentials) => {
                self.invalidate(generation);
                Ok(None)
            }
            Err(error) => {
                warn!(
                    error_code = error.kind().code(),
                    error = %error,
                    "Session verification failed; keeping session until next check"
                );
                Err(error.into())
            }
        }
    }

    /// Periodic verification. Only runs while the session is authenticated
    /// and not idle; failures are logged and retried on the next tick.
    pub async fn silent_refresh(&self) {
        if !self.is_authenticated() {
            trace!("Silent refresh skipped, no active session");
            return;
        }

        match self.verify().await {
            Ok(Some(identity)) => trace!(user_id = %identity.id, "Silent refresh completed"),
            Ok(None) => info!("Session invalidated during silent refresh"),
            Err(error) => debug!(error = %error, "Silent refresh failed, retrying next interval"),
        }
    }

    /// Run [`silent_refresh`](Self::silent_refresh) every refresh interval.
    ///
    /// The task only holds a weak reference and ends once the manager is
    /// dropped.
    pub fn spawn_silent_refresh(self: &Arc<Self>) -> JoinHandle<()> {
        let manager: Weak<Self> = Arc::downgrade(self);
        let period = self.config.refresh_interval();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let Some(manager) = manager.upgrade() else {
                    break;
                };
                manager.silent_refresh().await;
            }
        })
    }

    /// Record user activity. Coalesced to one write per coalescing window;
    /// returns whether the timestamp moved. Never touches the network.
    pub fn touch_activity(&self) -> bool {
        let now = self.clock.now();
        let mut state = self.state.lock();

        if let Some(last) = state.last_activity_at {
            if elapsed(now, last) < self.config.activity_coalesce() {
                return false;
            }
        }

        state.last_activity_at = Some(now);
        if state.identity.is_some() {
            self.persist(&state);
        }
        true
    }

    /// True when there has been no activity for longer than the idle timeout,
    /// or none was ever recorded.
    pub fn is_idle_expired(&self) -> bool {
        let state = self.state.lock();
        self.idle_expired(&state, self.clock.now())
    }

    pub fn status(&self) -> SessionStatus {
        let state = self.state.lock();
        let now = self.clock.now();

        if state.identity.is_none() {
            return SessionStatus::Anonymous;
        }
        if self.idle_expired(&state, now) {
            return SessionStatus::IdleExpired;
        }
        match state.last_verified_at {
            None => SessionStatus::Unverified,
            Some(verified) if elapsed(now, verified) < self.config.verify_interval() => SessionStatus::Fresh,
            Some(_) => SessionStatus::Stale,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.status().is_authenticated()
    }

    /// Identity for a request: cached when fresh, verified in the foreground
    /// when unverified, verified in the background when stale. An idle-expired
    /// session is logged out here.
    ///
    /// # Errors
    ///
    /// [`SessionError::Transient`] when an unverified session could not be
    /// checked.
    pub async fn resolve(self: &Arc<Self>) -> Result<Option<Identity>> {
        match self.status() {
            SessionStatus::Anonymous => Ok(None),
            SessionStatus::IdleExpired => {
                self.expire_idle().await;
                Ok(None)
            }
            SessionStatus::Fresh => Ok(self.current_identity()),
            SessionStatus::Stale => {
                let manager = Arc::clone(self);
                tokio::spawn(async move {
                    if let Err(error) = manager.verify().await {
                        debug!(error = %error, "Background verification failed");
                    }
                });
                Ok(self.current_identity())
            }
            SessionStatus::Unverified => self.verify().await,
        }
    }

    /// End an idle session locally and remotely
    pub async fn expire_idle(&self) {
        let user_id = self.end_session(Some(LogoutReason::Idle));
        info!(user_id = user_id.as_deref().unwrap_or("-"), "Session expired after inactivity");
        if let Err(error) = self.service.logout().await {
            debug!(error = %error, "Remote logout after idle expiry failed");
        }
    }

    /// Reload the identity from `/auth/profile`.
    ///
    /// # Errors
    ///
    /// [`SessionError::NotAuthenticated`] without a session, or the mapped
    /// service failure. A rejected credential ends the session and yields
    /// `Ok(None)`.
    pub async fn refresh_profile(&self) -> Result<Option<Identity>> {
        if self.current_identity().is_none() {
            return Err(SessionError::NotAuthenticated);
        }

        let generation = self.generation();
        match self.service.profile().await {
            Ok(identity) => Ok(self.commit_verified(generation, identity)),
            Err(AuthServiceError::Unauthorized) => {
                self.invalidate(generation);
                Ok(None)
            }
            Err(error) => Err(error.into()),
        }
    }

    /// Change the current user's password. A rejection is returned to the
    /// caller and leaves the session alone.
    ///
    /// # Errors
    ///
    /// [`SessionError::NotAuthenticated`] without a session,
    /// [`SessionError::InvalidCredentials`] for a wrong current password,
    /// [`SessionError::Rejected`] when the new password is refused.
    pub async fn change_password(&self, change: &PasswordChange) -> Result<()> {
        let Some(identity) = self.current_identity() else {
            return Err(SessionError::NotAuthenticated);
        };

        match self.service.change_password(change).await {
            Ok(()) => {
                info!(user_id = %identity.id, "Password changed");
                Ok(())
            }
            Err(AuthServiceError::Unauthorized) => Err(SessionError::InvalidCredentials),
            Err(error) => {
                warn!(user_id = %identity.id, error_code = error.kind().code(), error = %error, "Password change failed");
                Err(error.into())
            }
        }
    }

    /// Identity of an authenticated, non-idle session. No network call.
    pub fn current_identity(&self) -> Option<Identity> {
        let state = self.state.lock();
        if self.idle_expired(&state, self.clock.now()) {
            return None;
        }
        state.identity.clone()
    }

    pub fn last_verified_at(&self) -> Option<DateTime<Utc>> {
        self.state.lock().last_verified_at
    }

    pub fn last_activity_at(&self) -> Option<DateTime<Utc>> {
        self.state.lock().last_activity_at
    }

    /// Advisory: whether the current identity holds `capability`
    pub fn has_capability(&self, capability: Capability) -> bool {
        self.current_identity()
            .is_some_and(|identity| auth_policy::has_capability(identity.role_id, capability))
    }

    /// Advisory: whether the current identity may manage a user of `target_role_id`
    pub fn can_manage_user(&self, target_role_id: i64) -> bool {
        self.current_identity()
            .is_some_and(|identity| auth_policy::can_manage_user(identity.role_id, target_role_id))
    }

    /// Advisory: whether the current identity may see hospital `organization_code`
    pub fn can_access_organization(&self, organization_code: &str) -> bool {
        self.current_identity()
            .is_some_and(|identity| auth_policy::can_access_organization(&identity, organization_code))
    }

    fn generation(&self) -> u64 {
        self.state.lock().generation
    }

    fn throttled_identity(&self) -> Option<Identity> {
        let state = self.state.lock();
        let now = self.clock.now();
        let verified = state.last_verified_at?;
        if self.idle_expired(&state, now) || elapsed(now, verified) >= self.config.verify_interval() {
            return None;
        }
        state.identity.clone()
    }

    fn idle_expired(&self, state: &SessionState, now: DateTime<Utc>) -> bool {
        state
            .last_activity_at
            .map_or(true, |last| elapsed(now, last) > self.config.idle_timeout())
    }

    /// Commit a confirmed identity unless its epoch has ended meanwhile
    fn commit_verified(&self, generation: u64, identity: Identity) -> Option<Identity> {
        let now = self.clock.now();
        {
            let mut state = self.state.lock();
            if state.generation != generation {
                debug!(user_id = %identity.id, "Discarding verification from an ended session");
                return state.identity.clone();
            }
            state.identity = Some(identity.clone());
            state.last_verified_at = Some(now);
            state.established_at = Some(now);
            if state.last_activity_at.is_none() {
                state.last_activity_at = Some(now);
            }
            self.persist(&state);
        }

        self.publish(SessionEvent::Verified { user_id: identity.id.clone() });
        Some(identity)
    }

    /// Clear a session the service has rejected, unless a newer epoch began
    fn invalidate(&self, generation: u64) {
        let previous = {
            let mut state = self.state.lock();
            if state.generation != generation {
                return;
            }
            state.reset()
        };
        self.clear_cache();

        if let Some(identity) = previous {
            warn!(
                user_id = %identity.id,
                error_code = FailureKind::SessionInvalidated.code(),
                "Session rejected by authentication service"
            );
            self.publish(SessionEvent::Invalidated { user_id: identity.id });
        }
    }

    /// Clear state and cache, publishing the matching event when a session existed
    fn end_session(&self, reason: Option<LogoutReason>) -> Option<String> {
        let previous = self.state.lock().reset();
        self.clear_cache();

        let identity = previous?;
        let user_id = identity.id.to_string();
        match reason {
            Some(LogoutReason::Requested) => {
                info!(user_id = %identity.id, "Logged out");
                self.publish(SessionEvent::LoggedOut { user_id: identity.id });
            }
            Some(LogoutReason::Idle) => self.publish(SessionEvent::IdleExpired { user_id: identity.id }),
            None => {}
        }
        Some(user_id)
    }

    fn persist(&self, state: &SessionState) {
        let Some(identity) = state.identity.clone() else {
            return;
        };
        let entry = CacheEntry {
            identity,
            timestamp: state.established_at.unwrap_or_else(|| self.clock.now()),
            last_activity_at: state.last_activity_at,
        };
        if let Err(error) = self.cache.store(&entry) {
            warn!(error = %error, "Failed to write session cache");
        }
    }

    fn clear_cache(&self) {
        if let Err(error) = self.cache.clear() {
            warn!(error = %error, "Failed to clear session cache");
        }
    }

    fn publish(&self, event: SessionEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

#[derive(Debug, Clone, Copy)]
enum LogoutReason {
    Requested,
    Idle,
}

fn hydrate(cache: &dyn SessionCache, clock: &dyn Clock, config: &SessionConfig) -> SessionState {
    let entry = match cache.load() {
        Ok(Some(entry)) => entry,
        Ok(None) => return SessionState::default(),
        Err(error) => {
            debug!(error_code = error.kind().code(), error = %error, "Discarding unreadable session cache entry");
            if let Err(error) = cache.clear() {
                warn!(error = %error, "Failed to clear session cache");
            }
            return SessionState::default();
        }
    };

    if entry.is_expired(clock.now(), config.cache.max_age()) {
        debug!(
            error_code = FailureKind::MalformedCache.code(),
            user_id = %entry.identity.id,
            "Discarding session cache entry past its maximum age"
        );
        if let Err(error) = cache.clear() {
            warn!(error = %error, "Failed to clear session cache");
        }
        return SessionState::default();
    }

    debug!(user_id = %entry.identity.id, "Hydrated session from cache; pending verification");
    SessionState {
        identity: Some(entry.identity),
        last_verified_at: None,
        last_activity_at: entry.last_activity_at,
        established_at: Some(entry.timestamp),
        generation: 0,
    }
}
