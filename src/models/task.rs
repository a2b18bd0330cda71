use serde::{Deserialize, Serialize};

/// Task status (lifecycle state)
///
/// Ordered chain: NotStarted -> InProgress -> Completed -> VerifiedCompleted.
/// VerifiedCompleted is terminal for members; admins may still move it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    NotStarted,
    InProgress,
    Completed,
    VerifiedCompleted,
}

impl TaskStatus {
    /// All statuses in lifecycle order
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::NotStarted,
        TaskStatus::InProgress,
        TaskStatus::Completed,
        TaskStatus::VerifiedCompleted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "not_started",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::VerifiedCompleted => "verified_completed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "not_started" => Some(TaskStatus::NotStarted),
            "in_progress" => Some(TaskStatus::InProgress),
            "completed" => Some(TaskStatus::Completed),
            "verified_completed" => Some(TaskStatus::VerifiedCompleted),
            _ => None,
        }
    }

    /// Parse user input: stored names, display labels, hyphens/spaces, any case
    pub fn parse_user(s: &str) -> Option<Self> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "verified" => Some(TaskStatus::VerifiedCompleted),
            other => Self::from_str(other),
        }
    }

    /// Display label shown to users
    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "Not Started",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Completed => "Completed",
            TaskStatus::VerifiedCompleted => "Verified",
        }
    }

    /// Work is finished, whether or not it has been verified
    pub fn is_done(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::VerifiedCompleted)
    }
}

/// Task model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Option<i64>,
    pub uuid: String,
    pub department_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub assignee_id: Option<i64>,
    pub points: i64,
    pub due_ts: Option<i64>,
    pub created_ts: i64,
    pub modified_ts: i64,
}

impl Task {
    /// Create a new task
    pub fn new(department_id: i64, title: String) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            id: None,
            uuid: uuid::Uuid::new_v4().to_string(),
            department_id,
            title,
            description: None,
            status: TaskStatus::NotStarted,
            assignee_id: None,
            points: 0,
            due_ts: None,
            created_ts: now,
            modified_ts: now,
        }
    }

    pub fn is_assigned_to(&self, user_id: i64) -> bool {
        self.assignee_id == Some(user_id)
    }

    /// Due in the past and not yet completed
    pub fn is_overdue(&self) -> bool {
        match self.due_ts {
            Some(due) => {
                let now = chrono::Utc::now().timestamp();
                due < now && !self.status.is_done()
            }
            None => false,
        }
    }
}
