use rusqlite::{Connection, OptionalExtension};
use crate::models::{Department, Organization};
use anyhow::{Context, Result};

/// Organization repository for database operations
pub struct OrganizationRepo;

impl OrganizationRepo {
    /// Create a new organization
    pub fn create(conn: &Connection, name: &str) -> Result<Organization> {
        let org = Organization::new(name.to_string());
        conn.execute(
            "INSERT INTO organizations (name, created_ts, modified_ts) VALUES (?1, ?2, ?3)",
            rusqlite::params![org.name, org.created_ts, org.modified_ts],
        )
        .with_context(|| format!("Failed to create organization: {}", name))?;

        Ok(Organization {
            id: Some(conn.last_insert_rowid()),
            ..org
        })
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> Result<Option<Organization>> {
        let org = conn
            .query_row(
                "SELECT id, name, created_ts, modified_ts FROM organizations WHERE id = ?1",
                [id],
                Self::row_to_org,
            )
            .optional()?;
        Ok(org)
    }

    pub fn get_by_name(conn: &Connection, name: &str) -> Result<Option<Organization>> {
        let org = conn
            .query_row(
                "SELECT id, name, created_ts, modified_ts FROM organizations WHERE name = ?1",
                [name],
                Self::row_to_org,
            )
            .optional()?;
        Ok(org)
    }

    /// List all organizations ordered by name
    pub fn list(conn: &Connection) -> Result<Vec<Organization>> {
        let mut stmt = conn.prepare(
            "SELECT id, name, created_ts, modified_ts FROM organizations ORDER BY name"
        )?;
        let rows = stmt.query_map([], Self::row_to_org)?;

        let mut orgs = Vec::new();
        for row in rows {
            orgs.push(row?);
        }
        Ok(orgs)
    }

    fn row_to_org(row: &rusqlite::Row) -> rusqlite::Result<Organization> {
        Ok(Organization {
            id: Some(row.get(0)?),
            name: row.get(1)?,
            created_ts: row.get(2)?,
            modified_ts: row.get(3)?,
        })
    }
}

/// Department repository for database operations
pub struct DepartmentRepo;

impl DepartmentRepo {
    /// Create a department inside an organization
    pub fn create(conn: &Connection, organization_id: i64, name: &str) -> Result<Department> {
        let dept = Department::new(organization_id, name.to_string());
        conn.execute(
            "INSERT INTO departments (organization_id, name, created_ts, modified_ts)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![dept.organization_id, dept.name, dept.created_ts, dept.modified_ts],
        )
        .with_context(|| format!("Failed to create department: {}", name))?;

        Ok(Department {
            id: Some(conn.last_insert_rowid()),
            ..dept
        })
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> Result<Option<Department>> {
        let dept = conn
            .query_row(
                "SELECT id, organization_id, name, created_ts, modified_ts
                 FROM departments WHERE id = ?1",
                [id],
                Self::row_to_dept,
            )
            .optional()?;
        Ok(dept)
    }

    pub fn get_by_name(conn: &Connection, organization_id: i64, name: &str) -> Result<Option<Department>> {
        let dept = conn
            .query_row(
                "SELECT id, organization_id, name, created_ts, modified_ts
                 FROM departments WHERE organization_id = ?1 AND name = ?2",
                rusqlite::params![organization_id, name],
                Self::row_to_dept,
            )
            .optional()?;
        Ok(dept)
    }

    /// List departments, optionally restricted to one organization
    pub fn list(conn: &Connection, organization_id: Option<i64>) -> Result<Vec<Department>> {
        let mut stmt = conn.prepare(
            "SELECT d.id, d.organization_id, d.name, d.created_ts, d.modified_ts
             FROM departments d JOIN organizations o ON o.id = d.organization_id
             WHERE (?1 IS NULL OR d.organization_id = ?1)
             ORDER BY o.name, d.name"
        )?;
        let rows = stmt.query_map([organization_id], Self::row_to_dept)?;

        let mut depts = Vec::new();
        for row in rows {
            depts.push(row?);
        }
        Ok(depts)
    }

    /// Full `org/dept` path for a department
    pub fn path(conn: &Connection, department_id: i64) -> Result<String> {
        conn.query_row(
            "SELECT o.name || '/' || d.name
             FROM departments d JOIN organizations o ON o.id = d.organization_id
             WHERE d.id = ?1",
            [department_id],
            |row| row.get(0),
        )
        .with_context(|| format!("Department {} not found", department_id))
    }

    /// List every department as (`org/dept`, id), for suggestions
    pub fn list_paths(conn: &Connection) -> Result<Vec<(String, i64)>> {
        let mut stmt = conn.prepare(
            "SELECT o.name || '/' || d.name, d.id
             FROM departments d JOIN organizations o ON o.id = d.organization_id
             ORDER BY o.name, d.name"
        )?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;

        let mut paths = Vec::new();
        for row in rows {
            paths.push(row?);
        }
        Ok(paths)
    }

    fn row_to_dept(row: &rusqlite::Row) -> rusqlite::Result<Department> {
        Ok(Department {
            id: Some(row.get(0)?),
            organization_id: row.get(1)?,
            name: row.get(2)?,
            created_ts: row.get(3)?,
            modified_ts: row.get(4)?,
        })
    }
}
