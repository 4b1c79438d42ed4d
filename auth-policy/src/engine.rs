use crate::capability::{grants, Capability};
use auth_identity::{Identity, Role};
use tracing::trace;

/// Whether a role holds a capability. Unknown roles hold nothing.
pub fn has_capability(role_id: i64, capability: Capability) -> bool {
    let allowed = Role::from_id(role_id)
        .map(|role| grants(role).contains(&capability))
        .unwrap_or(false);
    trace!(role_id, capability = %capability, allowed, "Capability check");
    allowed
}

/// Same as [`has_capability`] for a capability name arriving as text.
pub fn has_capability_named(role_id: i64, capability: &str) -> bool {
    capability
        .parse::<Capability>()
        .map(|capability| has_capability(role_id, capability))
        .unwrap_or(false)
}

/// Capabilities granted to a role, empty for an unknown role
pub fn granted_capabilities(role_id: i64) -> &'static [Capability] {
    Role::from_id(role_id).map(grants).unwrap_or_default()
}

/// Whether an identity of `acting_role_id` may manage a user of `target_role_id`.
///
/// Superadmins manage every role including their own, admins manage staff,
/// staff manage no one.
pub fn can_manage_user(acting_role_id: i64, target_role_id: i64) -> bool {
    matches!(
        (Role::from_id(acting_role_id), Role::from_id(target_role_id)),
        (Some(Role::Superadmin), Some(_)) | (Some(Role::Admin), Some(Role::Staff))
    )
}

/// Whether an identity may see data of the hospital `organization_code`.
///
/// Staff are confined to their own hospital; an empty code on either side
/// never matches.
pub fn can_access_organization(identity: &Identity, organization_code: &str) -> bool {
    match identity.role() {
        Some(Role::Superadmin | Role::Admin) => true,
        Some(Role::Staff) => {
            !organization_code.is_empty() && identity.organization() == Some(organization_code)
        }
        None => false,
    }
}

/// Rank for "role X or higher" comparisons. Higher rank is more privilege;
/// unknown roles rank 0, below every role.
pub fn rank_of(role_id: i64) -> u8 {
    match Role::from_id(role_id) {
        Some(Role::Superadmin) => 3,
        Some(Role::Admin) => 2,
        Some(Role::Staff) => 1,
        None => 0,
    }
}

/// Whether `role_id` ranks at or above `minimum`
pub fn is_at_least(role_id: i64, minimum: Role) -> bool {
    Role::from_id(role_id).is_some() && rank_of(role_id) >= rank_of(minimum.id())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_table() {
        assert!(has_capability(1, Capability::ManageHospitals));
        assert!(!has_capability(2, Capability::ManageHospitals));
        assert!(!has_capability(3, Capability::ManageHospitals));

        assert!(has_capability(3, Capability::RecordVisits));
        assert!(!has_capability(2, Capability::RecordVisits));
        assert!(has_capability(1, Capability::RecordVisits));

        assert!(has_capability(2, Capability::ExportData));
        assert!(!has_capability(3, Capability::ExportData));
    }

    #[test]
    fn test_capability_by_name() {
        assert!(has_capability_named(2, "manage_users"));
        assert!(!has_capability_named(3, "manage_users"));
        assert!(!has_capability_named(1, "launch_missiles"));
    }

    #[test]
    fn test_manage_user_relation() {
        assert!(can_manage_user(1, 1));
        assert!(can_manage_user(1, 2));
        assert!(can_manage_user(1, 3));
        assert!(can_manage_user(2, 3));
        assert!(!can_manage_user(2, 2));
        assert!(!can_manage_user(2, 1));
        assert!(!can_manage_user(3, 3));
        assert!(!can_manage_user(1, 9));
    }

    #[test]
    fn test_organization_scope() {
        let staff = Identity::new("s", 3, Some("H001"));
        assert!(can_access_organization(&staff, "H001"));
        assert!(!can_access_organization(&staff, "H002"));
        assert!(!can_access_organization(&staff, ""));
        assert!(!can_access_organization(&staff, "H001 "));
        assert!(!can_access_organization(&staff, " H001"));

        let unscoped = Identity::new("s2", 3, None);
        assert!(!can_access_organization(&unscoped, ""));
        assert!(!can_access_organization(&unscoped, "H001"));

        let admin = Identity::new("a", 2, Some("H001"));
        assert!(can_access_organization(&admin, "H777"));

        let root = Identity::new("r", 1, None);
        assert!(can_access_organization(&root, "H001"));
    }

    #[test]
    fn test_rank_order() {
        assert!(rank_of(1) > rank_of(2));
        assert!(rank_of(2) > rank_of(3));
        assert!(rank_of(3) > rank_of(0));
        assert_eq!(rank_of(42), 0);

        assert!(is_at_least(1, Role::Admin));
        assert!(is_at_least(2, Role::Admin));
        assert!(!is_at_least(3, Role::Admin));
        assert!(!is_at_least(99, Role::Staff));
    }

    #[test]
    fn test_unknown_role_has_no_grants() {
        assert!(granted_capabilities(0).is_empty());
        assert_eq!(granted_capabilities(1).len(), Capability::ALL.len());
    }
}
