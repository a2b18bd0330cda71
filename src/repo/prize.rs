use rusqlite::{Connection, OptionalExtension};
use crate::models::{Prize, PrizeStatus};
use anyhow::{Context, Result};

const PRIZE_COLUMNS: &str = "id, uuid, department_id, name, description, cost, status,
                             requested_by, created_ts, modified_ts";

/// Prize repository for database operations
pub struct PrizeRepo;

impl PrizeRepo {
    pub fn create(
        conn: &Connection,
        department_id: i64,
        name: &str,
        description: Option<&str>,
        cost: i64,
    ) -> Result<Prize> {
        let mut prize = Prize::new(department_id, name.to_string(), cost);
        prize.description = description.map(|s| s.to_string());

        conn.execute(
            "INSERT INTO prizes (uuid, department_id, name, description, cost, status,
                    requested_by, created_ts, modified_ts)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            rusqlite::params![
                prize.uuid,
                prize.department_id,
                prize.name,
                prize.description,
                prize.cost,
                prize.status.as_str(),
                prize.requested_by,
                prize.created_ts,
                prize.modified_ts
            ],
        )
        .with_context(|| format!("Failed to create prize: {}", name))?;

        Ok(Prize {
            id: Some(conn.last_insert_rowid()),
            ..prize
        })
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> Result<Option<Prize>> {
        let sql = format!("SELECT {} FROM prizes WHERE id = ?1", PRIZE_COLUMNS);
        let prize = conn.query_row(&sql, [id], Self::row_to_prize).optional()?;
        Ok(prize)
    }

    /// The status column exactly as stored
    pub fn get_status_raw(conn: &Connection, id: i64) -> Result<Option<String>> {
        let status = conn
            .query_row("SELECT status FROM prizes WHERE id = ?1", [id], |row| row.get(0))
            .optional()?;
        Ok(status)
    }

    pub fn get_department_id(conn: &Connection, id: i64) -> Result<Option<i64>> {
        let department_id = conn
            .query_row("SELECT department_id FROM prizes WHERE id = ?1", [id], |row| row.get(0))
            .optional()?;
        Ok(department_id)
    }

    /// List prizes, optionally restricted to one department
    pub fn list(conn: &Connection, department_id: Option<i64>) -> Result<Vec<Prize>> {
        let sql = format!(
            "SELECT {} FROM prizes WHERE (?1 IS NULL OR department_id = ?1) ORDER BY id",
            PRIZE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([department_id], Self::row_to_prize)?;

        let mut prizes = Vec::new();
        for row in rows {
            prizes.push(row?);
        }
        Ok(prizes)
    }

    /// Persist a new status and who requested the prize
    pub fn set_status(
        conn: &Connection,
        id: i64,
        status: PrizeStatus,
        requested_by: Option<i64>,
    ) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        let updated = conn
            .execute(
                "UPDATE prizes SET status = ?1, requested_by = ?2, modified_ts = ?3 WHERE id = ?4",
                rusqlite::params![status.as_str(), requested_by, now, id],
            )
            .with_context(|| format!("Failed to update status of prize {}", id))?;
        if updated == 0 {
            anyhow::bail!("Prize {} not found", id);
        }
        Ok(())
    }

    pub fn delete(conn: &Connection, id: i64) -> Result<bool> {
        let removed = conn.execute("DELETE FROM prizes WHERE id = ?1", [id])
            .with_context(|| format!("Failed to delete prize {}", id))?;
        Ok(removed > 0)
    }

    pub fn count_by_status(conn: &Connection) -> Result<Vec<(PrizeStatus, i64)>> {
        let mut counts = Vec::new();
        for status in PrizeStatus::ALL {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM prizes WHERE status = ?1",
                [status.as_str()],
                |row| row.get(0),
            )?;
            counts.push((status, count));
        }
        Ok(counts)
    }

    fn row_to_prize(row: &rusqlite::Row) -> rusqlite::Result<Prize> {
        let status_str: String = row.get(6)?;
        let status = PrizeStatus::from_str(&status_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                6,
                rusqlite::types::Type::Text,
                format!("Unknown prize status '{}'", status_str).into(),
            )
        })?;
        Ok(Prize {
            id: Some(row.get(0)?),
            uuid: row.get(1)?,
            department_id: row.get(2)?,
            name: row.get(3)?,
            description: row.get(4)?,
            cost: row.get(5)?,
            status,
            requested_by: row.get(7)?,
            created_ts: row.get(8)?,
            modified_ts: row.get(9)?,
        })
    }
}
