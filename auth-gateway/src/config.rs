use auth_identity::Role;
use auth_policy::Capability;
use serde::{Deserialize, Serialize};

/// Route guard configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GuardConfig {
    /// Paths served without any session check
    #[serde(default = "default_public_paths")]
    pub public_paths: Vec<String>,

    /// Path prefixes served without any session check (static assets)
    #[serde(default = "default_public_prefixes")]
    pub public_prefixes: Vec<String>,

    /// Paths only meaningful to anonymous users
    #[serde(default = "default_guest_only")]
    pub guest_only: Vec<String>,

    /// Prefixes that require an authenticated session
    #[serde(default = "default_protected_prefixes")]
    pub protected_prefixes: Vec<String>,

    #[serde(default = "default_login_path")]
    pub login_path: String,

    #[serde(default = "default_unauthorized_path")]
    pub unauthorized_path: String,

    /// Never a post-login destination
    #[serde(default = "default_logout_path")]
    pub logout_path: String,

    /// Elevated access rules; every rule whose prefix matches must pass
    #[serde(default = "default_rules")]
    pub rules: Vec<AccessRule>,

    #[serde(default)]
    pub landing: LandingPaths,
}

/// A path prefix and what it takes to enter it
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AccessRule {
    pub prefix: String,
    pub requirement: Requirement,
}

impl AccessRule {
    pub fn new(prefix: impl Into<String>, requirement: Requirement) -> Self {
        Self { prefix: prefix.into(), requirement }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Requirement {
    /// The identity's role must hold the capability
    Capability { capability: Capability },
    /// The identity must be allowed to manage users of the target role
    ManageUser { target_role_id: i64 },
    /// The path segment after the prefix names a hospital the identity must
    /// be allowed to access
    Organization,
}

/// Where each role lands after login
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LandingPaths {
    #[serde(default = "default_superadmin_landing")]
    pub superadmin: String,
    #[serde(default = "default_admin_landing")]
    pub admin: String,
    #[serde(default = "default_staff_landing")]
    pub staff: String,
    /// Identities whose role is not recognised
    #[serde(default = "default_unauthorized_path")]
    pub unknown: String,
}

impl LandingPaths {
    pub fn for_role(&self, role_id: i64) -> &str {
        match Role::from_id(role_id) {
            Some(Role::Superadmin) => &self.superadmin,
            Some(Role::Admin) => &self.admin,
            Some(Role::Staff) => &self.staff,
            None => &self.unknown,
        }
    }
}

fn default_public_paths() -> Vec<String> {
    ["/health", "/status", "/unauthorized", "/logout", "/favicon.ico"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_public_prefixes() -> Vec<String> {
    vec!["/assets".to_string(), "/static".to_string()]
}

fn default_guest_only() -> Vec<String> {
    vec!["/login".to_string()]
}

fn default_protected_prefixes() -> Vec<String> {
    vec!["/".to_string()]
}

fn default_login_path() -> String { "/login".to_string() }
fn default_unauthorized_path() -> String { "/unauthorized".to_string() }
fn default_logout_path() -> String { "/logout".to_string() }
fn default_superadmin_landing() -> String { "/admin".to_string() }
fn default_admin_landing() -> String { "/dashboard".to_string() }
fn default_staff_landing() -> String { "/patients".to_string() }

fn default_rules() -> Vec<AccessRule> {
    let capability = |capability| Requirement::Capability { capability };
    vec![
        AccessRule::new("/admin", capability(Capability::ManageUsers)),
        AccessRule::new("/admin/hospitals", capability(Capability::ManageHospitals)),
        AccessRule::new("/admin/diseases", capability(Capability::ManageDiseases)),
        AccessRule::new(
            "/admin/users/superadmins",
            Requirement::ManageUser { target_role_id: Role::Superadmin.id() },
        ),
        AccessRule::new(
            "/admin/users/admins",
            Requirement::ManageUser { target_role_id: Role::Admin.id() },
        ),
        AccessRule::new("/populations", capability(Capability::ManagePopulations)),
        AccessRule::new("/visits", capability(Capability::RecordVisits)),
        AccessRule::new("/reports/export", capability(Capability::ExportData)),
        AccessRule::new("/hospitals", Requirement::Organization),
    ]
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            public_paths: default_public_paths(),
            public_prefixes: default_public_prefixes(),
            guest_only: default_guest_only(),
            protected_prefixes: default_protected_prefixes(),
            login_path: default_login_path(),
            unauthorized_path: default_unauthorized_path(),
            logout_path: default_logout_path(),
            rules: default_rules(),
            landing: LandingPaths::default(),
        }
    }
}

impl Default for LandingPaths {
    fn default() -> Self {
        Self {
            superadmin: default_superadmin_landing(),
            admin: default_admin_landing(),
            staff: default_staff_landing(),
            unknown: default_unauthorized_path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landing_paths() {
        let landing = LandingPaths::default();
        assert_eq!(landing.for_role(1), "/admin");
        assert_eq!(landing.for_role(2), "/dashboard");
        assert_eq!(landing.for_role(3), "/patients");
        assert_eq!(landing.for_role(0), "/unauthorized");
    }

    #[test]
    fn test_rules_deserialize() {
        let rules: Vec<AccessRule> = serde_json::from_str(
            r#"[
                {"prefix": "/audit", "requirement": {"type": "capability", "capability": "view_reports"}},
                {"prefix": "/admin/users/admins", "requirement": {"type": "manage_user", "target_role_id": 2}},
                {"prefix": "/hospitals", "requirement": {"type": "organization"}}
            ]"#,
        )
        .unwrap();

        assert_eq!(
            rules.first().map(|rule| &rule.requirement),
            Some(&Requirement::Capability { capability: Capability::ViewReports })
        );
        assert_eq!(rules.len(), 3);
    }

    #[test]
    fn test_unknown_capability_in_rule_is_rejected() {
        let result: Result<AccessRule, _> = serde_json::from_str(
            r#"{"prefix": "/x", "requirement": {"type": "capability", "capability": "root_shell"}}"#,
        );
        assert!(result.is_err());
    }
}
