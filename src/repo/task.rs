use rusqlite::{Connection, OptionalExtension};
use crate::models::{Task, TaskStatus};
use anyhow::{Context, Result};

const TASK_COLUMNS: &str = "id, uuid, department_id, title, description, status, assignee_id,
                            points, due_ts, created_ts, modified_ts";

/// Optional filters for listing tasks
#[derive(Debug, Clone, Default)]
pub struct TaskQuery {
    pub department_id: Option<i64>,
    pub assignee_id: Option<i64>,
    pub status: Option<TaskStatus>,
}

/// Task repository for database operations
pub struct TaskRepo;

impl TaskRepo {
    /// Create a new task with full field support
    pub fn create_full(
        conn: &Connection,
        department_id: i64,
        title: &str,
        description: Option<&str>,
        assignee_id: Option<i64>,
        points: i64,
        due_ts: Option<i64>,
    ) -> Result<Task> {
        let mut task = Task::new(department_id, title.to_string());
        task.description = description.map(|s| s.to_string());
        task.assignee_id = assignee_id;
        task.points = points;
        task.due_ts = due_ts;

        conn.execute(
            "INSERT INTO tasks (uuid, department_id, title, description, status, assignee_id,
                    points, due_ts, created_ts, modified_ts)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            rusqlite::params![
                task.uuid,
                task.department_id,
                task.title,
                task.description,
                task.status.as_str(),
                task.assignee_id,
                task.points,
                task.due_ts,
                task.created_ts,
                task.modified_ts
            ],
        )
        .with_context(|| format!("Failed to create task: {}", title))?;

        Ok(Task {
            id: Some(conn.last_insert_rowid()),
            ..task
        })
    }

    /// Create a new unassigned task with no points or due date
    pub fn create(conn: &Connection, department_id: i64, title: &str) -> Result<Task> {
        Self::create_full(conn, department_id, title, None, None, 0, None)
    }

    /// Get task by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> Result<Option<Task>> {
        let sql = format!("SELECT {} FROM tasks WHERE id = ?1", TASK_COLUMNS);
        let task = conn.query_row(&sql, [id], Self::row_to_task).optional()?;
        Ok(task)
    }

    /// List tasks matching the query, ordered by id
    pub fn list(conn: &Connection, query: &TaskQuery) -> Result<Vec<Task>> {
        let sql = format!(
            "SELECT {} FROM tasks
             WHERE (?1 IS NULL OR department_id = ?1)
               AND (?2 IS NULL OR assignee_id = ?2)
               AND (?3 IS NULL OR status = ?3)
             ORDER BY id",
            TASK_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(
            rusqlite::params![
                query.department_id,
                query.assignee_id,
                query.status.map(|s| s.as_str())
            ],
            Self::row_to_task,
        )?;

        let mut tasks = Vec::new();
        for row in rows {
            tasks.push(row?);
        }
        Ok(tasks)
    }

    pub fn list_all(conn: &Connection) -> Result<Vec<Task>> {
        Self::list(conn, &TaskQuery::default())
    }

    /// Persist a new status
    pub fn set_status(conn: &Connection, id: i64, status: TaskStatus) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        let updated = conn
            .execute(
                "UPDATE tasks SET status = ?1, modified_ts = ?2 WHERE id = ?3",
                rusqlite::params![status.as_str(), now, id],
            )
            .with_context(|| format!("Failed to update status of task {}", id))?;
        if updated == 0 {
            anyhow::bail!("Task {} not found", id);
        }
        Ok(())
    }

    /// Set or clear the assignee
    pub fn set_assignee(conn: &Connection, id: i64, assignee_id: Option<i64>) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        let updated = conn
            .execute(
                "UPDATE tasks SET assignee_id = ?1, modified_ts = ?2 WHERE id = ?3",
                rusqlite::params![assignee_id, now, id],
            )
            .with_context(|| format!("Failed to update assignee of task {}", id))?;
        if updated == 0 {
            anyhow::bail!("Task {} not found", id);
        }
        Ok(())
    }

    /// Delete a task. Returns false if it did not exist.
    pub fn delete(conn: &Connection, id: i64) -> Result<bool> {
        let removed = conn.execute("DELETE FROM tasks WHERE id = ?1", [id])
            .with_context(|| format!("Failed to delete task {}", id))?;
        Ok(removed > 0)
    }

    /// Count tasks per status, in lifecycle order
    pub fn count_by_status(conn: &Connection) -> Result<Vec<(TaskStatus, i64)>> {
        let mut counts = Vec::new();
        for status in TaskStatus::ALL {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM tasks WHERE status = ?1",
                [status.as_str()],
                |row| row.get(0),
            )?;
            counts.push((status, count));
        }
        Ok(counts)
    }

    fn row_to_task(row: &rusqlite::Row) -> rusqlite::Result<Task> {
        let status_str: String = row.get(5)?;
        let status = TaskStatus::from_str(&status_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                5,
                rusqlite::types::Type::Text,
                format!("Unknown task status '{}'", status_str).into(),
            )
        })?;
        Ok(Task {
            id: Some(row.get(0)?),
            uuid: row.get(1)?,
            department_id: row.get(2)?,
            title: row.get(3)?,
            description: row.get(4)?,
            status,
            assignee_id: row.get(6)?,
            points: row.get(7)?,
            due_ts: row.get(8)?,
            created_ts: row.get(9)?,
            modified_ts: row.get(10)?,
        })
    }
}
