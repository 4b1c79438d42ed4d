use crate::config::{GuardConfig, Requirement};
use auth_identity::Identity;
use auth_session::SessionManager;
use axum::http::Uri;
use axum::response::{IntoResponse, Redirect, Response};
use error_common::{Classified, FailureKind};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Result of guarding one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    /// No session check applies
    Public,
    /// Authenticated and authorized
    Allow(Identity),
    Redirect(GuardRedirect),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RedirectReason {
    /// Not authenticated
    Login,
    /// Authenticated user on a guest-only page
    Landing,
    /// Authenticated but not allowed
    Unauthorized,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuardRedirect {
    pub location: String,
    pub reason: RedirectReason,
}

impl IntoResponse for GuardRedirect {
    fn into_response(self) -> Response {
        Redirect::to(&self.location).into_response()
    }
}

/// Request-entry enforcement of authentication and elevated access
#[derive(Debug, Clone, Default)]
pub struct RouteGuard {
    config: GuardConfig,
}

impl RouteGuard {
    pub fn new(config: GuardConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Decide what happens to a request for `uri`.
    ///
    /// Session failures never escape: they are logged and the request is
    /// treated as unauthenticated.
    pub async fn evaluate(&self, session: Option<&Arc<SessionManager>>, uri: &Uri) -> GuardOutcome {
        let path = uri.path();
        if self.is_public(path) {
            return GuardOutcome::Public;
        }

        let identity = match session {
            Some(manager) => match manager.resolve().await {
                Ok(identity) => identity,
                Err(error) => {
                    warn!(
                        path = %path,
                        error_code = error.kind().code(),
                        error = %error,
                        "Session could not be resolved; treating request as unauthenticated"
                    );
                    None
                }
            },
            None => None,
        };

        if self.is_guest_only(path) {
            return match identity {
                Some(identity) => GuardOutcome::Redirect(self.landing_redirect(&identity)),
                None => GuardOutcome::Public,
            };
        }

        let Some(identity) = identity else {
            if self.is_protected(path) {
                debug!(path = %path, "Unauthenticated request to protected path");
                return GuardOutcome::Redirect(self.login_redirect(uri));
            }
            return GuardOutcome::Public;
        };

        if identity.role().is_none() {
            warn!(user_id = %identity.id, role_id = identity.role_id, path = %path, "Unknown role denied");
            return GuardOutcome::Redirect(self.unauthorized_redirect());
        }

        if let Some(requirement) = self.failed_requirement(&identity, path) {
            warn!(
                user_id = %identity.id,
                role_id = identity.role_id,
                path = %path,
                requirement = ?requirement,
                error_code = FailureKind::AuthorizationDenied.code(),
                "Access denied"
            );
            return GuardOutcome::Redirect(self.unauthorized_redirect());
        }

        GuardOutcome::Allow(identity)
    }

    /// `/login?redirect=<path+query>` with path separators kept literal
    pub fn login_redirect(&self, uri: &Uri) -> GuardRedirect {
        let target = uri.path_and_query().map_or("/", |pq| pq.as_str());
        GuardRedirect {
            location: format!("{}?redirect={}", self.config.login_path, encode_return_path(target)),
            reason: RedirectReason::Login,
        }
    }

    pub fn landing_redirect(&self, identity: &Identity) -> GuardRedirect {
        GuardRedirect {
            location: self.config.landing.for_role(identity.role_id).to_string(),
            reason: RedirectReason::Landing,
        }
    }

    pub fn unauthorized_redirect(&self) -> GuardRedirect {
        GuardRedirect {
            location: self.config.unauthorized_path.clone(),
            reason: RedirectReason::Unauthorized,
        }
    }

    /// Where to send a user after login: `requested` when it is a local
    /// absolute path other than a guest-only page or logout, the role's
    /// landing path otherwise
    pub fn post_login_location(&self, identity: &Identity, requested: Option<&str>) -> String {
        match requested {
            Some(target) if is_local_path(target) && self.is_return_target(path_of(target)) => target.to_string(),
            _ => self.config.landing.for_role(identity.role_id).to_string(),
        }
    }

    fn is_return_target(&self, path: &str) -> bool {
        !self.is_guest_only(path) && !matches_prefix(path, &self.config.logout_path)
    }

    pub fn is_public(&self, path: &str) -> bool {
        self.config.public_paths.iter().any(|public| public == path)
            || self.config.public_prefixes.iter().any(|prefix| matches_prefix(path, prefix))
    }

    pub fn is_guest_only(&self, path: &str) -> bool {
        self.config.guest_only.iter().any(|guest| matches_prefix(path, guest))
    }

    pub fn is_protected(&self, path: &str) -> bool {
        self.config.protected_prefixes.iter().any(|prefix| matches_prefix(path, prefix))
    }

    fn failed_requirement(&self, identity: &Identity, path: &str) -> Option<&Requirement> {
        self.config
            .rules
            .iter()
            .filter(|rule| matches_prefix(path, &rule.prefix))
            .find(|rule| !satisfies(identity, &rule.requirement, &rule.prefix, path))
            .map(|rule| &rule.requirement)
    }
}

fn satisfies(identity: &Identity, requirement: &Requirement, prefix: &str, path: &str) -> bool {
    match requirement {
        Requirement::Capability { capability } => auth_policy::has_capability(identity.role_id, *capability),
        Requirement::ManageUser { target_role_id } => {
            auth_policy::can_manage_user(identity.role_id, *target_role_id)
        }
        Requirement::Organization => match organization_segment(prefix, path) {
            Some(code) => auth_policy::can_access_organization(identity, &code),
            // The listing itself is not scoped
            None => true,
        },
    }
}

/// Segment-boundary prefix match: `/admin` matches `/admin` and `/admin/x`,
/// never `/administrator`
pub fn matches_prefix(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return path.starts_with('/');
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// First path segment after `prefix`, percent-decoded
fn organization_segment<'a>(prefix: &str, path: &'a str) -> Option<std::borrow::Cow<'a, str>> {
    let rest = path.strip_prefix(prefix.trim_end_matches('/'))?;
    let segment = rest.trim_start_matches('/').split('/').next()?;
    if segment.is_empty() {
        return None;
    }
    Some(urlencoding::decode(segment).unwrap_or(std::borrow::Cow::Borrowed(segment)))
}

fn encode_return_path(target: &str) -> String {
    urlencoding::encode(target).replace("%2F", "/")
}

fn path_of(target: &str) -> &str {
    target.split(['?', '#']).next().unwrap_or(target)
}

/// A single leading `/` and no scheme-relative or backslash tricks
fn is_local_path(target: &str) -> bool {
    target.starts_with('/')
        && !target.starts_with("//")
        && !target.starts_with("/\\")
        && !target.contains(['\r', '\n'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_matching_respects_segments() {
        assert!(matches_prefix("/admin", "/admin"));
        assert!(matches_prefix("/admin/users", "/admin"));
        assert!(!matches_prefix("/administrator", "/admin"));
        assert!(matches_prefix("/anything", "/"));
        assert!(matches_prefix("/", "/"));
        assert!(!matches_prefix("/report", "/reports/export"));
    }

    #[test]
    fn test_login_redirect_keeps_slashes() {
        let guard = RouteGuard::default();
        let uri: Uri = "/patients".parse().unwrap();
        assert_eq!(guard.login_redirect(&uri).location, "/login?redirect=/patients");

        let uri: Uri = "/reports/monthly?year=2024&hospital=H1".parse().unwrap();
        assert_eq!(
            guard.login_redirect(&uri).location,
            "/login?redirect=/reports/monthly%3Fyear%3D2024%26hospital%3DH1"
        );
    }

    #[test]
    fn test_organization_segment() {
        assert_eq!(organization_segment("/hospitals", "/hospitals/H001").as_deref(), Some("H001"));
        assert_eq!(organization_segment("/hospitals", "/hospitals/H%202/visits").as_deref(), Some("H 2"));
        assert_eq!(organization_segment("/hospitals", "/hospitals"), None);
        assert_eq!(organization_segment("/hospitals", "/hospitals/"), None);
    }

    #[test]
    fn test_rules_for_role() {
        let guard = RouteGuard::default();
        let staff = Identity::new("s", 3, Some("H001"));
        let admin = Identity::new("a", 2, Some("H001"));
        let root = Identity::new("r", 1, None);

        assert!(guard.failed_requirement(&staff, "/admin/hospitals").is_some());
        assert!(guard.failed_requirement(&admin, "/admin/hospitals").is_some());
        assert!(guard.failed_requirement(&root, "/admin/hospitals").is_none());

        assert!(guard.failed_requirement(&admin, "/admin/users/admins").is_some());
        assert!(guard.failed_requirement(&admin, "/admin/users").is_none());
        assert!(guard.failed_requirement(&root, "/admin/users/superadmins").is_none());

        assert!(guard.failed_requirement(&staff, "/visits/new").is_none());
        assert!(guard.failed_requirement(&admin, "/visits").is_some());

        assert!(guard.failed_requirement(&staff, "/hospitals/H001").is_none());
        assert!(guard.failed_requirement(&staff, "/hospitals/H002").is_some());
        assert!(guard.failed_requirement(&admin, "/hospitals/H002").is_none());
        assert!(guard.failed_requirement(&staff, "/reports").is_none());
        assert!(guard.failed_requirement(&staff, "/reports/export").is_some());
    }

    #[test]
    fn test_post_login_location() {
        let guard = RouteGuard::default();
        let staff = Identity::new("s", 3, Some("H001"));

        assert_eq!(guard.post_login_location(&staff, Some("/visits?page=2")), "/visits?page=2");
        assert_eq!(guard.post_login_location(&staff, None), "/patients");
        assert_eq!(guard.post_login_location(&staff, Some("https://evil.example")), "/patients");
        assert_eq!(guard.post_login_location(&staff, Some("//evil.example")), "/patients");
        assert_eq!(guard.post_login_location(&staff, Some("/\\evil.example")), "/patients");
        assert_eq!(guard.post_login_location(&staff, Some("/login")), "/patients");
        assert_eq!(guard.post_login_location(&staff, Some("/logout")), "/patients");
        assert_eq!(guard.post_login_location(&staff, Some("/logout?x=1")), "/patients");
        assert_eq!(guard.post_login_location(&staff, Some("/logouts")), "/logouts");
    }

    #[test]
    fn test_public_paths() {
        let guard = RouteGuard::default();
        assert!(guard.is_public("/health"));
        assert!(guard.is_public("/assets/app.css"));
        assert!(guard.is_public("/logout"));
        assert!(!guard.is_public("/healthcheck"));
        assert!(!guard.is_public("/patients"));
    }
}
