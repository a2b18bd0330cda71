use rusqlite::{Connection, Result};
use std::collections::HashMap;

/// Current database schema version
const CURRENT_VERSION: u32 = 2;

type Migration = fn(&rusqlite::Transaction) -> Result<(), rusqlite::Error>;

/// Migration system for managing database schema versions
pub struct MigrationManager;

impl MigrationManager {
    /// Initialize the database with the current schema
    /// This creates the schema_version table and applies all migrations
    pub fn initialize(conn: &Connection) -> Result<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            )",
            [],
        )?;

        let current_version = Self::get_version(conn)?;

        for version in (current_version + 1)..=CURRENT_VERSION {
            Self::apply_migration(conn, version)?;
        }

        Ok(())
    }

    /// Apply a specific migration by version number
    fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
        let migrations = get_migrations();
        if let Some(migration) = migrations.get(&version) {
            let tx = conn.unchecked_transaction()?;
            migration(&tx)?;
            tx.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                [version],
            )?;
            tx.commit()?;
            log::debug!("Applied schema migration v{}", version);
            Ok(())
        } else {
            Err(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_MISUSE),
                Some(format!("No migration found for version {}", version)),
            ))
        }
    }

    /// Get the current schema version
    pub fn get_version(conn: &Connection) -> Result<u32> {
        conn.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        )
    }
}

/// Get all migrations indexed by version
fn get_migrations() -> HashMap<u32, Migration> {
    let mut migrations: HashMap<u32, Migration> = HashMap::new();
    migrations.insert(1, migration_v1);
    migrations.insert(2, migration_v2);
    migrations
}

/// Migration v1: organizations, departments, users, roles, tasks, prizes
fn migration_v1(tx: &rusqlite::Transaction) -> Result<(), rusqlite::Error> {
    tx.execute(
        "CREATE TABLE organizations (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            created_ts INTEGER NOT NULL,
            modified_ts INTEGER NOT NULL
        )",
        [],
    )?;

    tx.execute(
        "CREATE TABLE departments (
            id INTEGER PRIMARY KEY,
            organization_id INTEGER NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            created_ts INTEGER NOT NULL,
            modified_ts INTEGER NOT NULL,
            UNIQUE(organization_id, name)
        )",
        [],
    )?;

    tx.execute(
        "CREATE TABLE users (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            display_name TEXT NULL,
            created_ts INTEGER NOT NULL
        )",
        [],
    )?;

    // One role per (user, scope). Granting again replaces the row.
    tx.execute(
        "CREATE TABLE organization_roles (
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            organization_id INTEGER NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
            role TEXT NOT NULL CHECK(role IN ('organization_admin','enterprise_admin')),
            PRIMARY KEY(user_id, organization_id)
        )",
        [],
    )?;
    tx.execute(
        "CREATE TABLE department_roles (
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            department_id INTEGER NOT NULL REFERENCES departments(id) ON DELETE CASCADE,
            role TEXT NOT NULL CHECK(role IN ('department_admin','department_member')),
            PRIMARY KEY(user_id, department_id)
        )",
        [],
    )?;

    tx.execute(
        "CREATE TABLE tasks (
            id INTEGER PRIMARY KEY,
            uuid TEXT NOT NULL UNIQUE,
            department_id INTEGER NOT NULL REFERENCES departments(id) ON DELETE CASCADE,
            title TEXT NOT NULL,
            description TEXT NULL,
            status TEXT NOT NULL CHECK(status IN ('not_started','in_progress','completed','verified_completed')),
            assignee_id INTEGER NULL REFERENCES users(id) ON DELETE SET NULL,
            points INTEGER NOT NULL DEFAULT 0 CHECK(points >= 0),
            due_ts INTEGER NULL,
            created_ts INTEGER NOT NULL,
            modified_ts INTEGER NOT NULL
        )",
        [],
    )?;
    tx.execute("CREATE INDEX idx_tasks_department_id ON tasks(department_id)", [])?;
    tx.execute("CREATE INDEX idx_tasks_assignee_id ON tasks(assignee_id)", [])?;
    tx.execute("CREATE INDEX idx_tasks_status ON tasks(status)", [])?;

    tx.execute(
        "CREATE TABLE prizes (
            id INTEGER PRIMARY KEY,
            uuid TEXT NOT NULL UNIQUE,
            department_id INTEGER NOT NULL REFERENCES departments(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            description TEXT NULL,
            cost INTEGER NOT NULL DEFAULT 0 CHECK(cost >= 0),
            status TEXT NOT NULL CHECK(status IN ('available','pending_redemption','redeemed')),
            requested_by INTEGER NULL REFERENCES users(id) ON DELETE SET NULL,
            created_ts INTEGER NOT NULL,
            modified_ts INTEGER NOT NULL
        )",
        [],
    )?;
    tx.execute("CREATE INDEX idx_prizes_department_id ON prizes(department_id)", [])?;

    Ok(())
}

/// Migration v2: status change history
fn migration_v2(tx: &rusqlite::Transaction) -> Result<(), rusqlite::Error> {
    tx.execute(
        "CREATE TABLE status_history (
            id INTEGER PRIMARY KEY,
            entity_kind TEXT NOT NULL CHECK(entity_kind IN ('task','prize')),
            entity_id INTEGER NOT NULL,
            from_status TEXT NOT NULL,
            to_status TEXT NOT NULL,
            actor_id INTEGER NULL REFERENCES users(id) ON DELETE SET NULL,
            change_ts INTEGER NOT NULL
        )",
        [],
    )?;
    // Note: entity_id is not a foreign key since it points at either tasks or prizes.
    // History rows outlive their entity.
    tx.execute(
        "CREATE INDEX idx_status_history_entity ON status_history(entity_kind, entity_id, change_ts)",
        [],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        MigrationManager::initialize(&conn).unwrap();
        MigrationManager::initialize(&conn).unwrap();
        assert_eq!(MigrationManager::get_version(&conn).unwrap(), CURRENT_VERSION);
    }

    #[test]
    fn test_status_check_constraint() {
        let conn = Connection::open_in_memory().unwrap();
        MigrationManager::initialize(&conn).unwrap();
        conn.execute(
            "INSERT INTO organizations (name, created_ts, modified_ts) VALUES ('acme', 0, 0)",
            [],
        ).unwrap();
        conn.execute(
            "INSERT INTO departments (organization_id, name, created_ts, modified_ts) VALUES (1, 'ops', 0, 0)",
            [],
        ).unwrap();
        let result = conn.execute(
            "INSERT INTO tasks (uuid, department_id, title, status, created_ts, modified_ts)
             VALUES ('u1', 1, 't', 'done', 0, 0)",
            [],
        );
        assert!(result.is_err());
    }
}
