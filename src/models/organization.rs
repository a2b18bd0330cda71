use serde::{Deserialize, Serialize};

/// Organization model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: Option<i64>,
    pub name: String,
    pub created_ts: i64,
    pub modified_ts: i64,
}

impl Organization {
    pub fn new(name: String) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            id: None,
            name,
            created_ts: now,
            modified_ts: now,
        }
    }
}

/// Department model. Names are unique within an organization and are
/// addressed on the command line as `org/dept`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Department {
    pub id: Option<i64>,
    pub organization_id: i64,
    pub name: String,
    pub created_ts: i64,
    pub modified_ts: i64,
}

impl Department {
    pub fn new(organization_id: i64, name: String) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            id: None,
            organization_id,
            name,
            created_ts: now,
            modified_ts: now,
        }
    }
}
