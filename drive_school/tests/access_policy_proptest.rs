/// Property-based tests for the path-scoped access table using proptest
///
/// These tests check first-match-wins resolution and segment-aware prefix
/// matching across randomly generated request paths.
use drive_school::auth::{AccessPolicy, DenyMode, Requirement, Role};
use proptest::prelude::*;

// Strategy to generate one URL path segment
fn segment_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9_-]{1,12}"
}

// Strategy to generate a tail of zero or more segments, e.g. "/a/b"
fn tail_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(segment_strategy(), 0..4).prop_map(|segments| {
        segments
            .iter()
            .map(|s| format!("/{s}"))
            .collect::<String>()
    })
}

proptest! {
    #[test]
    fn test_admin_namespace_always_requires_admin(tail in tail_strategy()) {
        let policy = AccessPolicy::default();
        let path = format!("/api/users/admin{tail}");
        let rule = policy.resolve(&path).expect("admin paths are gated");

        prop_assert_eq!(&rule.requirement, &Requirement::Role(Role::Admin));
        prop_assert_eq!(rule.deny, DenyMode::Json);
        prop_assert!(rule.permits(&Role::Admin));
        prop_assert!(!rule.permits(&Role::Instruktor));
    }

    #[test]
    fn test_other_api_paths_need_a_session(first in segment_strategy(), tail in tail_strategy()) {
        prop_assume!(first != "auth" && first != "users");
        let policy = AccessPolicy::default();
        let path = format!("/api/{first}{tail}");
        let rule = policy.resolve(&path).expect("api paths are gated");

        prop_assert_eq!(&rule.requirement, &Requirement::Authenticated);
        prop_assert_eq!(rule.deny, DenyMode::Json);
    }

    #[test]
    fn test_auth_endpoints_are_public(tail in tail_strategy()) {
        let policy = AccessPolicy::default();
        let path = format!("/api/auth{tail}");
        let rule = policy.resolve(&path).expect("auth paths have a rule");
        prop_assert_eq!(&rule.requirement, &Requirement::Public);
    }

    #[test]
    fn test_dashboard_redirects(tail in tail_strategy()) {
        let policy = AccessPolicy::default();
        let path = format!("/dashboard{tail}");
        let rule = policy.resolve(&path).expect("dashboard paths are gated");

        prop_assert_eq!(&rule.requirement, &Requirement::Authenticated);
        prop_assert_eq!(rule.deny, DenyMode::Redirect("/"));
    }

    #[test]
    fn test_paths_outside_namespaces_are_ungated(first in segment_strategy(), tail in tail_strategy()) {
        prop_assume!(first != "api" && first != "dashboard");
        let policy = AccessPolicy::default();
        let path = format!("/{first}{tail}");
        prop_assert!(policy.resolve(&path).is_none());
    }
}
