//! Property tests for the authorization engine
//!
//! These cover the guarantees callers rely on:
//! 1. Unknown roles never hold a capability or manage anyone
//! 2. Superadmins manage every known role; staff manage no one
//! 3. Monotonic capabilities held by a role are held by every higher role
//! 4. Staff organization access is exact string equality

use auth_identity::{Identity, Role};
use auth_policy::*;
use proptest::prelude::*;

fn known_role() -> impl Strategy<Value = i64> {
    prop::sample::select(vec![1_i64, 2, 3])
}

fn unknown_role() -> impl Strategy<Value = i64> {
    any::<i64>().prop_filter("role id outside 1..=3", |id| !(1..=3).contains(id))
}

fn capability() -> impl Strategy<Value = Capability> {
    prop::sample::select(Capability::ALL.to_vec())
}

proptest! {
    #[test]
    fn unknown_role_holds_nothing(role_id in unknown_role(), cap in capability()) {
        prop_assert!(!has_capability(role_id, cap));
        prop_assert_eq!(rank_of(role_id), 0);
        prop_assert!(granted_capabilities(role_id).is_empty());
    }

    #[test]
    fn unknown_roles_never_manage_or_get_managed(unknown in unknown_role(), known in known_role()) {
        prop_assert!(!can_manage_user(unknown, known));
        prop_assert!(!can_manage_user(known, unknown));
    }

    #[test]
    fn superadmin_manages_every_known_role(target in known_role()) {
        prop_assert!(can_manage_user(1, target));
        prop_assert!(!can_manage_user(3, target));
    }

    #[test]
    fn monotonic_capabilities_flow_upwards(lower in known_role(), higher in known_role(), cap in capability()) {
        prop_assume!(rank_of(higher) > rank_of(lower));
        if cap.is_rank_monotonic() && has_capability(lower, cap) {
            prop_assert!(has_capability(higher, cap), "{} held by {} but not {}", cap, lower, higher);
        }
    }

    #[test]
    fn staff_see_only_their_hospital(own in "[A-Z][0-9]{3}", other in "[A-Z][0-9]{3}") {
        let staff = Identity::new("staff", Role::Staff.id(), Some(own.as_str()));
        prop_assert!(can_access_organization(&staff, &own));
        prop_assert_eq!(can_access_organization(&staff, &other), own == other);
    }

    #[test]
    fn unparsable_capability_names_are_denied(role_id in known_role(), name in "[a-z_]{1,24}") {
        let known = Capability::ALL.iter().any(|cap| cap.as_str() == name);
        if !known {
            prop_assert!(!has_capability_named(role_id, &name));
        }
    }
}

#[test]
fn manage_user_matrix() {
    let expected = [
        (1, 1, true),
        (1, 2, true),
        (1, 3, true),
        (2, 1, false),
        (2, 2, false),
        (2, 3, true),
        (3, 1, false),
        (3, 2, false),
        (3, 3, false),
    ];
    for (actor, target, allowed) in expected {
        assert_eq!(can_manage_user(actor, target), allowed, "actor {actor} target {target}");
    }
}
