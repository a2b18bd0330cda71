use rusqlite::{Connection, OptionalExtension};
use crate::models::{Role, RoleAssignment, RoleScope, RoleSet, User};
use anyhow::{Context, Result};

/// User and role-assignment repository
pub struct UserRepo;

impl UserRepo {
    pub fn create(conn: &Connection, name: &str, display_name: Option<&str>) -> Result<User> {
        let mut user = User::new(name.to_string());
        user.display_name = display_name.map(|s| s.to_string());
        conn.execute(
            "INSERT INTO users (name, display_name, created_ts) VALUES (?1, ?2, ?3)",
            rusqlite::params![user.name, user.display_name, user.created_ts],
        )
        .with_context(|| format!("Failed to create user: {}", name))?;

        Ok(User {
            id: Some(conn.last_insert_rowid()),
            ..user
        })
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> Result<Option<User>> {
        let user = conn
            .query_row(
                "SELECT id, name, display_name, created_ts FROM users WHERE id = ?1",
                [id],
                Self::row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    pub fn get_by_name(conn: &Connection, name: &str) -> Result<Option<User>> {
        let user = conn
            .query_row(
                "SELECT id, name, display_name, created_ts FROM users WHERE name = ?1",
                [name],
                Self::row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    pub fn list(conn: &Connection) -> Result<Vec<User>> {
        let mut stmt = conn.prepare(
            "SELECT id, name, display_name, created_ts FROM users ORDER BY name"
        )?;
        let rows = stmt.query_map([], Self::row_to_user)?;

        let mut users = Vec::new();
        for row in rows {
            users.push(row?);
        }
        Ok(users)
    }

    /// Grant an organization-scope role, replacing any existing one
    pub fn grant_organization_role(conn: &Connection, user_id: i64, organization_id: i64, role: Role) -> Result<()> {
        if role.scope() != Some(RoleScope::Organization) {
            anyhow::bail!("Role '{}' cannot be granted at organization scope", role);
        }
        conn.execute(
            "INSERT OR REPLACE INTO organization_roles (user_id, organization_id, role) VALUES (?1, ?2, ?3)",
            rusqlite::params![user_id, organization_id, role.as_str()],
        )
        .with_context(|| format!("Failed to grant {} to user {}", role, user_id))?;
        Ok(())
    }

    /// Grant a department-scope role, replacing any existing one
    pub fn grant_department_role(conn: &Connection, user_id: i64, department_id: i64, role: Role) -> Result<()> {
        if role.scope() != Some(RoleScope::Department) {
            anyhow::bail!("Role '{}' cannot be granted at department scope", role);
        }
        conn.execute(
            "INSERT OR REPLACE INTO department_roles (user_id, department_id, role) VALUES (?1, ?2, ?3)",
            rusqlite::params![user_id, department_id, role.as_str()],
        )
        .with_context(|| format!("Failed to grant {} to user {}", role, user_id))?;
        Ok(())
    }

    /// Remove an organization-scope role. Returns false if none was held.
    pub fn revoke_organization_role(conn: &Connection, user_id: i64, organization_id: i64) -> Result<bool> {
        let removed = conn.execute(
            "DELETE FROM organization_roles WHERE user_id = ?1 AND organization_id = ?2",
            rusqlite::params![user_id, organization_id],
        )?;
        Ok(removed > 0)
    }

    /// Remove a department-scope role. Returns false if none was held.
    pub fn revoke_department_role(conn: &Connection, user_id: i64, department_id: i64) -> Result<bool> {
        let removed = conn.execute(
            "DELETE FROM department_roles WHERE user_id = ?1 AND department_id = ?2",
            rusqlite::params![user_id, department_id],
        )?;
        Ok(removed > 0)
    }

    /// Roles a user holds for a department: the organization-scope role of
    /// the department's organization plus the department-scope role.
    pub fn roles_for_department(conn: &Connection, user_id: i64, department_id: i64) -> Result<RoleSet> {
        let mut stmt = conn.prepare(
            "SELECT r.role FROM organization_roles r
             JOIN departments d ON d.organization_id = r.organization_id
             WHERE r.user_id = ?1 AND d.id = ?2
             UNION ALL
             SELECT role FROM department_roles WHERE user_id = ?1 AND department_id = ?2"
        )?;
        let rows = stmt.query_map(rusqlite::params![user_id, department_id], |row| {
            row.get::<_, String>(0)
        })?;

        let mut roles = RoleSet::new();
        for row in rows {
            let name = row?;
            match Role::from_str(&name) {
                Some(role) => roles.insert(role),
                None => log::warn!("Ignoring unknown stored role '{}' for user {}", name, user_id),
            }
        }
        Ok(roles)
    }

    /// Every role assignment a user holds, organization scope first
    pub fn list_assignments(conn: &Connection, user_id: i64) -> Result<Vec<RoleAssignment>> {
        let mut stmt = conn.prepare(
            "SELECT o.name, r.role, 0 AS scope_order FROM organization_roles r
             JOIN organizations o ON o.id = r.organization_id
             WHERE r.user_id = ?1
             UNION ALL
             SELECT o.name || '/' || d.name, r.role, 1 AS scope_order FROM department_roles r
             JOIN departments d ON d.id = r.department_id
             JOIN organizations o ON o.id = d.organization_id
             WHERE r.user_id = ?1
             ORDER BY scope_order, 1"
        )?;
        let rows = stmt.query_map([user_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut assignments = Vec::new();
        for row in rows {
            let (scope_path, role_name) = row?;
            if let Some(role) = Role::from_str(&role_name) {
                assignments.push(RoleAssignment { user_id, scope_path, role });
            }
        }
        Ok(assignments)
    }

    fn row_to_user(row: &rusqlite::Row) -> rusqlite::Result<User> {
        Ok(User {
            id: Some(row.get(0)?),
            name: row.get(1)?,
            display_name: row.get(2)?,
            created_ts: row.get(3)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbConnection;
    use crate::repo::{DepartmentRepo, OrganizationRepo};

    fn setup(conn: &Connection) -> (i64, i64, i64) {
        let org = OrganizationRepo::create(conn, "acme").unwrap().id.unwrap();
        let dept = DepartmentRepo::create(conn, org, "ops").unwrap().id.unwrap();
        let user = UserRepo::create(conn, "alice", Some("Alice A.")).unwrap().id.unwrap();
        (org, dept, user)
    }

    #[test]
    fn test_create_user() {
        let conn = DbConnection::connect_in_memory().unwrap();
        let user = UserRepo::create(&conn, "bob", None).unwrap();
        assert_eq!(user.shown_name(), "bob");
        assert!(UserRepo::create(&conn, "bob", None).is_err());
        assert_eq!(UserRepo::list(&conn).unwrap().len(), 1);
    }

    #[test]
    fn test_roles_union_across_scopes() {
        let conn = DbConnection::connect_in_memory().unwrap();
        let (org, dept, user) = setup(&conn);

        assert!(UserRepo::roles_for_department(&conn, user, dept).unwrap().is_empty());

        UserRepo::grant_department_role(&conn, user, dept, Role::DepartmentMember).unwrap();
        UserRepo::grant_organization_role(&conn, user, org, Role::EnterpriseAdmin).unwrap();

        let roles = UserRepo::roles_for_department(&conn, user, dept).unwrap();
        assert!(roles.contains(Role::DepartmentMember));
        assert!(roles.contains(Role::EnterpriseAdmin));
        assert!(roles.is_admin());
    }

    #[test]
    fn test_org_role_does_not_leak_to_other_org() {
        let conn = DbConnection::connect_in_memory().unwrap();
        let (org, _dept, user) = setup(&conn);
        let other_org = OrganizationRepo::create(&conn, "globex").unwrap().id.unwrap();
        let other_dept = DepartmentRepo::create(&conn, other_org, "ops").unwrap().id.unwrap();

        UserRepo::grant_organization_role(&conn, user, org, Role::OrganizationAdmin).unwrap();
        assert!(UserRepo::roles_for_department(&conn, user, other_dept).unwrap().is_empty());
    }

    #[test]
    fn test_grant_replaces_and_revoke_removes() {
        let conn = DbConnection::connect_in_memory().unwrap();
        let (_org, dept, user) = setup(&conn);

        UserRepo::grant_department_role(&conn, user, dept, Role::DepartmentAdmin).unwrap();
        UserRepo::grant_department_role(&conn, user, dept, Role::DepartmentMember).unwrap();
        let roles = UserRepo::roles_for_department(&conn, user, dept).unwrap();
        assert!(!roles.contains(Role::DepartmentAdmin));
        assert!(roles.contains(Role::DepartmentMember));

        assert!(UserRepo::revoke_department_role(&conn, user, dept).unwrap());
        assert!(!UserRepo::revoke_department_role(&conn, user, dept).unwrap());
        assert!(UserRepo::roles_for_department(&conn, user, dept).unwrap().is_empty());
    }

    #[test]
    fn test_grant_rejects_wrong_scope() {
        let conn = DbConnection::connect_in_memory().unwrap();
        let (org, dept, user) = setup(&conn);
        assert!(UserRepo::grant_organization_role(&conn, user, org, Role::DepartmentAdmin).is_err());
        assert!(UserRepo::grant_department_role(&conn, user, dept, Role::EnterpriseAdmin).is_err());
        assert!(UserRepo::grant_department_role(&conn, user, dept, Role::None).is_err());
    }

    #[test]
    fn test_list_assignments() {
        let conn = DbConnection::connect_in_memory().unwrap();
        let (org, dept, user) = setup(&conn);
        UserRepo::grant_department_role(&conn, user, dept, Role::DepartmentMember).unwrap();
        UserRepo::grant_organization_role(&conn, user, org, Role::OrganizationAdmin).unwrap();

        let assignments = UserRepo::list_assignments(&conn, user).unwrap();
        assert_eq!(assignments.len(), 2);
        assert_eq!(assignments[0].scope_path, "acme");
        assert_eq!(assignments[0].role, Role::OrganizationAdmin);
        assert_eq!(assignments[1].scope_path, "acme/ops");
        assert_eq!(assignments[1].role, Role::DepartmentMember);
    }
}
