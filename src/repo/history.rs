use rusqlite::Connection;
use crate::models::{EntityKind, StatusChange};
use anyhow::{Context, Result};

/// Status change history
pub struct HistoryRepo;

impl HistoryRepo {
    pub fn record(
        conn: &Connection,
        kind: EntityKind,
        entity_id: i64,
        from_status: &str,
        to_status: &str,
        actor_id: Option<i64>,
    ) -> Result<StatusChange> {
        let change_ts = chrono::Utc::now().timestamp();
        conn.execute(
            "INSERT INTO status_history (entity_kind, entity_id, from_status, to_status, actor_id, change_ts)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![kind.as_str(), entity_id, from_status, to_status, actor_id, change_ts],
        )
        .with_context(|| format!("Failed to record history for {} {}", kind.as_str(), entity_id))?;

        Ok(StatusChange {
            id: Some(conn.last_insert_rowid()),
            entity_kind: kind,
            entity_id,
            from_status: from_status.to_string(),
            to_status: to_status.to_string(),
            actor_id,
            change_ts,
        })
    }

    /// History of one entity, oldest first
    pub fn list_for(conn: &Connection, kind: EntityKind, entity_id: i64) -> Result<Vec<StatusChange>> {
        let mut stmt = conn.prepare(
            "SELECT id, entity_kind, entity_id, from_status, to_status, actor_id, change_ts
             FROM status_history WHERE entity_kind = ?1 AND entity_id = ?2
             ORDER BY change_ts, id"
        )?;
        let rows = stmt.query_map(rusqlite::params![kind.as_str(), entity_id], |row| {
            let kind_str: String = row.get(1)?;
            Ok(StatusChange {
                id: Some(row.get(0)?),
                entity_kind: EntityKind::from_str(&kind_str).unwrap_or(kind),
                entity_id: row.get(2)?,
                from_status: row.get(3)?,
                to_status: row.get(4)?,
                actor_id: row.get(5)?,
                change_ts: row.get(6)?,
            })
        })?;

        let mut changes = Vec::new();
        for row in rows {
            changes.push(row?);
        }
        Ok(changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbConnection;

    #[test]
    fn test_record_and_list() {
        let conn = DbConnection::connect_in_memory().unwrap();
        HistoryRepo::record(&conn, EntityKind::Task, 1, "not_started", "in_progress", None).unwrap();
        HistoryRepo::record(&conn, EntityKind::Task, 1, "in_progress", "completed", None).unwrap();
        HistoryRepo::record(&conn, EntityKind::Prize, 1, "available", "pending_redemption", None).unwrap();

        let task_history = HistoryRepo::list_for(&conn, EntityKind::Task, 1).unwrap();
        assert_eq!(task_history.len(), 2);
        assert_eq!(task_history[0].to_status, "in_progress");
        assert_eq!(task_history[1].to_status, "completed");

        let prize_history = HistoryRepo::list_for(&conn, EntityKind::Prize, 1).unwrap();
        assert_eq!(prize_history.len(), 1);
        assert!(HistoryRepo::list_for(&conn, EntityKind::Prize, 2).unwrap().is_empty());
    }
}
