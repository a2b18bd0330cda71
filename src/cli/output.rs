// Output formatting utilities

use crate::models::{Prize, PrizeStatus, StatusChange, Task, TaskStatus};
use crate::repo::{DepartmentRepo, UserRepo};
use crate::utils::{format_date, format_datetime};
use crate::workflow::StatusOption;
use anyhow::Result;
use rusqlite::Connection;
use std::collections::HashMap;
use std::io::IsTerminal;

// ANSI escape codes for terminal formatting
const ANSI_BOLD: &str = "\x1b[1m";
const ANSI_RESET: &str = "\x1b[0m";

/// Check if stdout is a terminal (TTY)
pub fn is_tty() -> bool {
    std::io::stdout().is_terminal()
}

/// Get terminal width dynamically
///
/// Uses the `terminal_size` crate for reliable detection, with fallback to
/// COLUMNS environment variable and a sensible default.
pub fn get_terminal_width() -> usize {
    if let Some((terminal_size::Width(w), _)) = terminal_size::terminal_size() {
        if w > 0 {
            return w as usize;
        }
    }

    if let Ok(cols) = std::env::var("COLUMNS") {
        if let Ok(width) = cols.parse::<usize>() {
            if width > 0 && width < 10000 {
                return width;
            }
        }
    }

    120
}

/// Apply bold formatting if in TTY mode
fn bold_if_tty(text: &str, is_tty: bool) -> String {
    if is_tty {
        format!("{}{}{}", ANSI_BOLD, text, ANSI_RESET)
    } else {
        text.to_string()
    }
}

/// Truncate to `max` characters, marking the cut with '…'
fn truncate(text: &str, max: usize) -> String {
    let count = text.chars().count();
    if count <= max || max == 0 {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// A task joined with the names shown beside it
#[derive(Debug, Clone)]
pub struct TaskRow {
    pub task: Task,
    pub department: String,
    pub assignee: Option<String>,
}

/// A prize joined with the names shown beside it
#[derive(Debug, Clone)]
pub struct PrizeRow {
    pub prize: Prize,
    pub department: String,
    pub requested_by: Option<String>,
}

/// Resolve department paths and user names for display, caching lookups
struct NameCache<'a> {
    conn: &'a Connection,
    departments: HashMap<i64, String>,
    users: HashMap<i64, String>,
}

impl<'a> NameCache<'a> {
    fn new(conn: &'a Connection) -> Self {
        Self {
            conn,
            departments: HashMap::new(),
            users: HashMap::new(),
        }
    }

    fn department(&mut self, id: i64) -> Result<String> {
        if let Some(path) = self.departments.get(&id) {
            return Ok(path.clone());
        }
        let path = DepartmentRepo::path(self.conn, id)?;
        self.departments.insert(id, path.clone());
        Ok(path)
    }

    fn user(&mut self, id: Option<i64>) -> Result<Option<String>> {
        let Some(id) = id else {
            return Ok(None);
        };
        if let Some(name) = self.users.get(&id) {
            return Ok(Some(name.clone()));
        }
        let name = UserRepo::get_by_id(self.conn, id)?
            .map(|u| u.name)
            .unwrap_or_else(|| format!("#{}", id));
        self.users.insert(id, name.clone());
        Ok(Some(name))
    }
}

pub fn task_rows(conn: &Connection, tasks: Vec<Task>) -> Result<Vec<TaskRow>> {
    let mut names = NameCache::new(conn);
    let mut rows = Vec::with_capacity(tasks.len());
    for task in tasks {
        let department = names.department(task.department_id)?;
        let assignee = names.user(task.assignee_id)?;
        rows.push(TaskRow { task, department, assignee });
    }
    Ok(rows)
}

pub fn prize_rows(conn: &Connection, prizes: Vec<Prize>) -> Result<Vec<PrizeRow>> {
    let mut names = NameCache::new(conn);
    let mut rows = Vec::with_capacity(prizes.len());
    for prize in prizes {
        let department = names.department(prize.department_id)?;
        let requested_by = names.user(prize.requested_by)?;
        rows.push(PrizeRow { prize, department, requested_by });
    }
    Ok(rows)
}

/// Format tasks as a table. The title column takes the remaining width.
pub fn format_task_list_table(rows: &[TaskRow], is_tty: bool) -> String {
    if rows.is_empty() {
        return "No tasks found.".to_string();
    }

    let dept_width = rows.iter().map(|r| r.department.chars().count()).max().unwrap_or(0).max(10);
    let fixed = 5 + 1 + 12 + 1 + dept_width + 1 + 12 + 1 + 6 + 1 + 10 + 1;
    let title_width = get_terminal_width().saturating_sub(fixed).max(20);

    let mut out = String::new();
    let header = format!(
        "{:<5} {:<12} {:<dw$} {:<12} {:>6} {:<10} {}",
        "ID", "Status", "Department", "Assignee", "Points", "Due", "Title",
        dw = dept_width
    );
    out.push_str(&bold_if_tty(&header, is_tty));
    out.push('\n');

    for row in rows {
        let task = &row.task;
        let line = format!(
            "{:<5} {:<12} {:<dw$} {:<12} {:>6} {:<10} {}",
            task.id.map(|id| id.to_string()).unwrap_or_else(|| "?".to_string()),
            task.status.label(),
            row.department,
            truncate(row.assignee.as_deref().unwrap_or("-"), 12),
            task.points,
            task.due_ts.map(format_date).unwrap_or_else(|| "-".to_string()),
            truncate(&task.title, title_width),
            dw = dept_width
        );
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out.trim_end().to_string()
}

pub fn format_prize_list_table(rows: &[PrizeRow], is_tty: bool) -> String {
    if rows.is_empty() {
        return "No prizes found.".to_string();
    }

    let dept_width = rows.iter().map(|r| r.department.chars().count()).max().unwrap_or(0).max(10);

    let mut out = String::new();
    let header = format!(
        "{:<5} {:<18} {:<dw$} {:>6} {:<12} {}",
        "ID", "Status", "Department", "Cost", "Requested", "Name",
        dw = dept_width
    );
    out.push_str(&bold_if_tty(&header, is_tty));
    out.push('\n');

    for row in rows {
        let prize = &row.prize;
        let line = format!(
            "{:<5} {:<18} {:<dw$} {:>6} {:<12} {}",
            prize.id.map(|id| id.to_string()).unwrap_or_else(|| "?".to_string()),
            prize.status.label(),
            row.department,
            prize.cost,
            truncate(row.requested_by.as_deref().unwrap_or("-"), 12),
            prize.name,
            dw = dept_width
        );
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out.trim_end().to_string()
}

pub fn format_task_summary(row: &TaskRow) -> String {
    let task = &row.task;
    let mut lines = vec![
        format!("Task {}: {}", task.id.unwrap_or(0), task.title),
        format!("  Status:      {}", task.status.label()),
        format!("  Department:  {}", row.department),
        format!("  Assignee:    {}", row.assignee.as_deref().unwrap_or("-")),
        format!("  Points:      {}", task.points),
    ];
    if let Some(due) = task.due_ts {
        let overdue = if task.is_overdue() { " (overdue)" } else { "" };
        lines.push(format!("  Due:         {}{}", format_date(due), overdue));
    }
    if let Some(description) = &task.description {
        lines.push(format!("  Description: {}", description));
    }
    lines.push(format!("  Created:     {}", format_datetime(task.created_ts)));
    lines.push(format!("  Modified:    {}", format_datetime(task.modified_ts)));
    lines.push(format!("  UUID:        {}", task.uuid));
    lines.join("\n")
}

pub fn format_prize_summary(row: &PrizeRow) -> String {
    let prize = &row.prize;
    let mut lines = vec![
        format!("Prize {}: {}", prize.id.unwrap_or(0), prize.name),
        format!("  Status:      {}", prize.status.label()),
        format!("  Department:  {}", row.department),
        format!("  Cost:        {}", prize.cost),
        format!("  Requested:   {}", row.requested_by.as_deref().unwrap_or("-")),
    ];
    if let Some(description) = &prize.description {
        lines.push(format!("  Description: {}", description));
    }
    lines.push(format!("  Created:     {}", format_datetime(prize.created_ts)));
    lines.push(format!("  Modified:    {}", format_datetime(prize.modified_ts)));
    lines.push(format!("  UUID:        {}", prize.uuid));
    lines.join("\n")
}

/// One line per option, current status marked with '*'
pub fn format_status_options(current: TaskStatus, options: &[StatusOption<TaskStatus>]) -> String {
    options
        .iter()
        .map(|o| {
            let marker = if o.status == current { "*" } else { " " };
            format!("{} {:<20} {}", marker, o.status.as_str(), o.label)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn task_json(row: &TaskRow) -> serde_json::Value {
    let task = &row.task;
    serde_json::json!({
        "id": task.id,
        "uuid": task.uuid,
        "title": task.title,
        "description": task.description,
        "status": task.status.as_str(),
        "status_label": task.status.label(),
        "department": row.department,
        "assignee": row.assignee,
        "points": task.points,
        "due_ts": task.due_ts,
        "created_ts": task.created_ts,
        "modified_ts": task.modified_ts,
    })
}

pub fn prize_json(row: &PrizeRow) -> serde_json::Value {
    let prize = &row.prize;
    serde_json::json!({
        "id": prize.id,
        "uuid": prize.uuid,
        "name": prize.name,
        "description": prize.description,
        "status": prize.status.as_str(),
        "status_label": prize.status.label(),
        "department": row.department,
        "cost": prize.cost,
        "requested_by": row.requested_by,
        "created_ts": prize.created_ts,
        "modified_ts": prize.modified_ts,
    })
}

/// Format status history with actor names already resolved
pub fn format_history(changes: &[(StatusChange, Option<String>)]) -> String {
    if changes.is_empty() {
        return "No status changes recorded.".to_string();
    }
    changes
        .iter()
        .map(|(change, actor)| {
            format!(
                "{}  {} -> {}  by {}",
                format_datetime(change.change_ts),
                change.from_status,
                change.to_status,
                actor.as_deref().unwrap_or("-")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Dashboard text for `merit status`
pub fn format_dashboard(
    task_counts: &[(TaskStatus, i64)],
    prize_counts: &[(PrizeStatus, i64)],
    overdue: usize,
    is_tty: bool,
) -> String {
    let mut out = String::new();
    out.push_str(&bold_if_tty("TASKS", is_tty));
    out.push('\n');
    for (status, count) in task_counts {
        out.push_str(&format!("  {:<20} {}\n", status.label(), count));
    }
    out.push_str(&format!("  {:<20} {}\n", "Overdue", overdue));
    out.push('\n');
    out.push_str(&bold_if_tty("PRIZES", is_tty));
    out.push('\n');
    for (status, count) in prize_counts {
        out.push_str(&format!("  {:<20} {}\n", status.label(), count));
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(title: &str, status: TaskStatus) -> TaskRow {
        let mut task = Task::new(1, title.to_string());
        task.id = Some(7);
        task.status = status;
        TaskRow {
            task,
            department: "acme/ops".to_string(),
            assignee: Some("alice".to_string()),
        }
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a longer title", 6), "a lon…");
    }

    #[test]
    fn test_task_table_plain() {
        let table = format_task_list_table(&[row("Restock", TaskStatus::InProgress)], false);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("ID"));
        assert!(lines[1].contains("In Progress"));
        assert!(lines[1].contains("acme/ops"));
        assert!(lines[1].ends_with("Restock"));
        assert!(!table.contains(ANSI_BOLD));
    }

    #[test]
    fn test_empty_tables() {
        assert_eq!(format_task_list_table(&[], false), "No tasks found.");
        assert_eq!(format_prize_list_table(&[], false), "No prizes found.");
    }

    #[test]
    fn test_status_options_marks_current() {
        let options = vec![
            StatusOption::new("Not Started", TaskStatus::NotStarted),
            StatusOption::new("In Progress", TaskStatus::InProgress),
        ];
        let text = format_status_options(TaskStatus::InProgress, &options);
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("  not_started"));
        assert!(lines[1].starts_with("* in_progress"));
    }

    #[test]
    fn test_task_json_fields() {
        let value = task_json(&row("Restock", TaskStatus::Completed));
        assert_eq!(value["status"], "completed");
        assert_eq!(value["status_label"], "Completed");
        assert_eq!(value["assignee"], "alice");
        assert_eq!(value["department"], "acme/ops");
    }

    #[test]
    fn test_dashboard() {
        let text = format_dashboard(
            &[(TaskStatus::NotStarted, 2)],
            &[(PrizeStatus::Available, 1)],
            0,
            false,
        );
        assert!(text.contains("TASKS"));
        assert!(text.contains("Not Started"));
        assert!(text.contains("PRIZES"));
        assert!(text.contains("Overdue"));
    }
}
