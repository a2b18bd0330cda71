use serde::{Deserialize, Serialize};

/// Kind of entity a history row belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Task,
    Prize,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Task => "task",
            EntityKind::Prize => "prize",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "task" => Some(EntityKind::Task),
            "prize" => Some(EntityKind::Prize),
            _ => None,
        }
    }
}

/// One persisted status change. Statuses are stored strings so that the
/// row survives any later change to the enums.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChange {
    pub id: Option<i64>,
    pub entity_kind: EntityKind,
    pub entity_id: i64,
    pub from_status: String,
    pub to_status: String,
    pub actor_id: Option<i64>,
    pub change_ts: i64,
}
