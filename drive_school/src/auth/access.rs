//! Path-scoped access rules.
//!
//! The policy is an ordered list of `(prefix, rule)` pairs; the first prefix
//! that matches the request path decides. Paths matching no entry are not
//! gated. Prefixes match on segment boundaries, so `/api/users/admin` covers
//! `/api/users/admin/x` but not `/api/users/administer`.

use super::models::Role;

/// What a matched path demands from the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    /// No session needed
    Public,
    /// Any valid session
    Authenticated,
    /// Valid session whose user holds this role
    Role(Role),
}

/// How a denied request is answered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyMode {
    /// 401 with a JSON error body
    Json,
    /// Redirect to the given location
    Redirect(&'static str),
}

/// One row of the routing table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRule {
    pub name: &'static str,
    pub prefix: &'static str,
    pub requirement: Requirement,
    pub deny: DenyMode,
}

impl AccessRule {
    pub fn matches(&self, path: &str) -> bool {
        let prefix = self.prefix.trim_end_matches('/');
        match path.strip_prefix(prefix) {
            Some(rest) => rest.is_empty() || rest.starts_with('/') || prefix.is_empty(),
            None => false,
        }
    }

    /// Whether a user with `role` satisfies this rule. Only called once the
    /// session is known to be valid.
    pub fn permits(&self, role: &Role) -> bool {
        match &self.requirement {
            Requirement::Public | Requirement::Authenticated => true,
            Requirement::Role(required) => required == role,
        }
    }
}

/// Ordered routing table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPolicy {
    rules: Vec<AccessRule>,
}

impl AccessPolicy {
    pub fn new(rules: Vec<AccessRule>) -> Self {
        Self { rules }
    }

    /// First rule whose prefix matches `path`
    pub fn resolve(&self, path: &str) -> Option<&AccessRule> {
        self.rules.iter().find(|rule| rule.matches(path))
    }
}

impl Default for AccessPolicy {
    /// The application's table: auth endpoints open, admin namespace needs the
    /// `admin` role, the rest of the API and the dashboard need a session.
    fn default() -> Self {
        Self::new(vec![
            AccessRule {
                name: "auth",
                prefix: "/api/auth",
                requirement: Requirement::Public,
                deny: DenyMode::Json,
            },
            AccessRule {
                name: "admin",
                prefix: "/api/users/admin",
                requirement: Requirement::Role(Role::Admin),
                deny: DenyMode::Json,
            },
            AccessRule {
                name: "api",
                prefix: "/api",
                requirement: Requirement::Authenticated,
                deny: DenyMode::Json,
            },
            AccessRule {
                name: "dashboard",
                prefix: "/dashboard",
                requirement: Requirement::Authenticated,
                deny: DenyMode::Redirect("/"),
            },
        ])
    }
}
