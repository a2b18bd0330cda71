use serde::{Deserialize, Serialize};
use super::Role;

/// User model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Option<i64>,
    pub name: String,
    pub display_name: Option<String>,
    pub created_ts: i64,
}

impl User {
    pub fn new(name: String) -> Self {
        Self {
            id: None,
            name,
            display_name: None,
            created_ts: chrono::Utc::now().timestamp(),
        }
    }

    /// Display name if set, login name otherwise
    pub fn shown_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}

/// A stored role assignment, joined with the scope's display path
/// (`org` for organization scope, `org/dept` for department scope).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub user_id: i64,
    pub scope_path: String,
    pub role: Role,
}
