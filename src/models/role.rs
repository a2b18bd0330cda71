use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A role held by a user within one scope.
///
/// Roles are set members, not ranks. Organization scope carries
/// `OrganizationAdmin` or `EnterpriseAdmin`; department scope carries
/// `DepartmentAdmin` or `DepartmentMember`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    DepartmentAdmin,
    OrganizationAdmin,
    EnterpriseAdmin,
    DepartmentMember,
    None,
}

/// Roles that grant full workflow rights. Any one is enough.
pub const ADMIN_ROLES: [Role; 3] = [
    Role::DepartmentAdmin,
    Role::OrganizationAdmin,
    Role::EnterpriseAdmin,
];

/// Which level a role assignment is stored at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleScope {
    Organization,
    Department,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::DepartmentAdmin => "department_admin",
            Role::OrganizationAdmin => "organization_admin",
            Role::EnterpriseAdmin => "enterprise_admin",
            Role::DepartmentMember => "department_member",
            Role::None => "none",
        }
    }

    /// Parse a role name. Accepts the stored form plus hyphenated and
    /// short aliases (`dept-admin`, `member`, ...).
    pub fn from_str(s: &str) -> Option<Self> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        match normalized.as_str() {
            "department_admin" | "dept_admin" => Some(Role::DepartmentAdmin),
            "organization_admin" | "org_admin" => Some(Role::OrganizationAdmin),
            "enterprise_admin" => Some(Role::EnterpriseAdmin),
            "department_member" | "member" => Some(Role::DepartmentMember),
            "none" => Some(Role::None),
            _ => None,
        }
    }

    pub fn is_admin(&self) -> bool {
        ADMIN_ROLES.contains(self)
    }

    /// The scope a role may be granted at. `None` has no scope.
    pub fn scope(&self) -> Option<RoleScope> {
        match self {
            Role::OrganizationAdmin | Role::EnterpriseAdmin => Some(RoleScope::Organization),
            Role::DepartmentAdmin | Role::DepartmentMember => Some(RoleScope::Department),
            Role::None => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The union of a caller's organization-scope and department-scope roles.
///
/// `Role::None` marks the absence of a role and is never stored in the set,
/// so an empty set and a set built from `[Role::None]` are equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RoleSet(BTreeSet<Role>);

// Goes through `insert` so `Role::None` is dropped here too
impl<'de> Deserialize<'de> for RoleSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Vec::<Role>::deserialize(deserializer)?.into_iter().collect())
    }
}

impl RoleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, role: Role) {
        if role != Role::None {
            self.0.insert(role);
        }
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    pub fn contains_any(&self, roles: &[Role]) -> bool {
        roles.iter().any(|r| self.0.contains(r))
    }

    /// The single authorization predicate for admin-only actions.
    pub fn is_admin(&self) -> bool {
        self.contains_any(&ADMIN_ROLES)
    }

    pub fn union(&self, other: &RoleSet) -> RoleSet {
        RoleSet(self.0.union(&other.0).copied().collect())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        let mut set = RoleSet::new();
        for role in iter {
            set.insert(role);
        }
        set
    }
}

impl fmt::Display for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("none");
        }
        let names: Vec<&str> = self.0.iter().map(|r| r.as_str()).collect();
        f.write_str(&names.join(","))
    }
}
