use secrecy::SecretString;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Opaque identifier of an identity.
///
/// The authentication service may send it as a JSON string or number; it is
/// always held as text and never interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct IdentityId(String);

impl IdentityId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for IdentityId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(i64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(text) => IdentityId(text),
            RawId::Number(number) => IdentityId(number.to_string()),
        })
    }
}

/// The three roles of the portal, highest privilege first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// System-wide administrator, not bound to a hospital
    Superadmin,
    /// Administrator across hospitals
    Admin,
    /// Hospital staff, scoped to a single hospital
    Staff,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Superadmin, Role::Admin, Role::Staff];

    /// Map a wire `roleId`; anything outside {1, 2, 3} is no role at all
    pub fn from_id(role_id: i64) -> Option<Role> {
        match role_id {
            1 => Some(Role::Superadmin),
            2 => Some(Role::Admin),
            3 => Some(Role::Staff),
            _ => None,
        }
    }

    pub fn id(self) -> i64 {
        match self {
            Role::Superadmin => 1,
            Role::Admin => 2,
            Role::Staff => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Role::Superadmin => "superadmin",
            Role::Admin => "admin",
            Role::Staff => "staff",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The authenticated principal as reported by the authentication service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: IdentityId,
    /// Raw role id; kept as received so an unknown value is never coerced
    pub role_id: i64,
    #[serde(default)]
    pub organization_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

impl Identity {
    pub fn new(id: impl Into<String>, role_id: i64, organization_code: Option<&str>) -> Self {
        Self {
            id: IdentityId::new(id),
            role_id,
            organization_code: organization_code.map(str::to_string),
            username: None,
            full_name: None,
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = Some(full_name.into());
        self
    }

    pub fn role(&self) -> Option<Role> {
        Role::from_id(self.role_id)
    }

    /// Hospital code, with empty strings treated as absent
    pub fn organization(&self) -> Option<&str> {
        self.organization_code
            .as_deref()
            .filter(|code| !code.trim().is_empty())
    }

    /// Name for display only; never used for decisions
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .or_else(|| self.username.as_deref().filter(|name| !name.is_empty()))
            .unwrap_or_else(|| self.id.as_str())
    }

    /// Only superadmins may lack a hospital
    pub fn is_consistently_scoped(&self) -> bool {
        match self.role() {
            Some(Role::Superadmin) => true,
            Some(Role::Admin | Role::Staff) => self.organization().is_some(),
            None => false,
        }
    }
}

/// Username/password pair for `POST /auth/login`
#[derive(Debug)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::new(password.into()),
        }
    }
}

/// Body of `POST /auth/change-password`
#[derive(Debug)]
pub struct PasswordChange {
    pub current_password: SecretString,
    pub new_password: SecretString,
}

impl PasswordChange {
    pub fn new(current_password: impl Into<String>, new_password: impl Into<String>) -> Self {
        Self {
            current_password: SecretString::new(current_password.into()),
            new_password: SecretString::new(new_password.into()),
        }
    }
}

/// Standard `{success, data, message}` response envelope
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

/// `data` of login, refresh and verify responses
#[derive(Debug, Deserialize)]
pub struct UserPayload {
    pub user: Identity,
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_identity_from_wire() {
        let json = r#"{"id": 42, "roleId": 3, "organizationCode": "H001", "username": "nurse1"}"#;
        let identity: Identity = serde_json::from_str(json).unwrap();

        assert_eq!(identity.id.as_str(), "42");
        assert_eq!(identity.role(), Some(Role::Staff));
        assert_eq!(identity.organization(), Some("H001"));
        assert_eq!(identity.display_name(), "nurse1");
    }

    #[test]
    fn test_unknown_role_is_preserved() {
        let json = r#"{"id": "u-9", "roleId": 7, "organizationCode": null}"#;
        let identity: Identity = serde_json::from_str(json).unwrap();

        assert_eq!(identity.role_id, 7);
        assert_eq!(identity.role(), None);
        assert!(!identity.is_consistently_scoped());
    }

    #[test]
    fn test_role_ids_round_trip() {
        for role in Role::ALL {
            assert_eq!(Role::from_id(role.id()), Some(role));
        }
        assert_eq!(Role::from_id(0), None);
        assert_eq!(Role::from_id(-1), None);
    }

    #[test]
    fn test_empty_organization_is_absent() {
        let identity = Identity::new("1", 3, Some("  "));
        assert_eq!(identity.organization(), None);
        assert!(!identity.is_consistently_scoped());

        let root = Identity::new("2", 1, None);
        assert!(root.is_consistently_scoped());
    }

    #[test]
    fn test_display_name_fallbacks() {
        let identity = Identity::new("17", 2, Some("H9"));
        assert_eq!(identity.display_name(), "17");

        let identity = identity.with_username("admin").with_full_name("Dr. Amaka Obi");
        assert_eq!(identity.display_name(), "Dr. Amaka Obi");
    }

    #[test]
    fn test_credentials_do_not_leak_in_debug() {
        let credentials = Credentials::new("nurse1", "hunter2");
        assert_eq!(credentials.password.expose_secret(), "hunter2");
        assert!(!format!("{credentials:?}").contains("hunter2"));
    }
}
