//! Acting-user context and permission enforcement
//!
//! The workflow tables only advise. Every mutating command goes through the
//! checks here so that the admin test and the status checks live in one place.

use rusqlite::Connection;
use thiserror::Error;
use crate::models::{PrizeStatus, RoleSet, Task, TaskStatus, User};
use crate::repo::UserRepo;
use crate::workflow::{can_set_task_status, is_prize_change, next_prize_status_for_raw, RawPrizeAdvice, StatusOption};

/// Permission failures. These are user errors (exit code 1).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccessError {
    #[error("No acting user. Pass --as <user>, set MERIT_USER, or set user.name in ~/.merit/rc")]
    NoActor,

    #[error("Acting user '{0}' not found")]
    UnknownActor(String),

    #[error("{action} requires an admin role in {scope} (you have: {roles})")]
    NotAdmin {
        action: String,
        scope: String,
        roles: String,
    },

    #[error("Cannot set task {task_id} to '{target}'. Allowed: {allowed}")]
    StatusNotPermitted {
        task_id: i64,
        target: String,
        allowed: String,
    },

    #[error("{label} (prize {prize_id})")]
    PrizeChangeDenied { prize_id: i64, label: String },
}

/// The user a command runs as. Built once per invocation and passed to
/// each handler that needs it.
#[derive(Debug, Clone)]
pub struct Actor {
    pub user_id: i64,
    pub user: User,
}

impl Actor {
    /// Look up the acting user by name
    pub fn resolve(conn: &Connection, name: Option<&str>) -> anyhow::Result<Actor> {
        let name = name.ok_or(AccessError::NoActor)?;
        let user = UserRepo::get_by_name(conn, name)?
            .ok_or_else(|| AccessError::UnknownActor(name.to_string()))?;
        let user_id = user
            .id
            .ok_or_else(|| anyhow::anyhow!("User '{}' has no id", name))?;
        log::debug!("Acting as user '{}' (id {})", user.name, user_id);
        Ok(Actor { user_id, user })
    }

    /// Roles held for a department, across organization and department scope
    pub fn roles_in(&self, conn: &Connection, department_id: i64) -> anyhow::Result<RoleSet> {
        UserRepo::roles_for_department(conn, self.user_id, department_id)
    }
}

/// Fail unless `roles` contains an admin role
pub fn require_admin(roles: &RoleSet, action: &str, scope: &str) -> Result<(), AccessError> {
    if roles.is_admin() {
        Ok(())
    } else {
        Err(AccessError::NotAdmin {
            action: action.to_string(),
            scope: scope.to_string(),
            roles: roles.to_string(),
        })
    }
}

/// Fail unless the workflow offers `target` to this caller for `task`
pub fn require_task_status(
    task: &Task,
    task_id: i64,
    target: TaskStatus,
    roles: &RoleSet,
    actor: &Actor,
) -> Result<(), AccessError> {
    let assigned = task.is_assigned_to(actor.user_id);
    if can_set_task_status(task.status, target, roles, assigned) {
        return Ok(());
    }
    let allowed: Vec<&str> = crate::workflow::available_task_statuses(task.status, roles, assigned)
        .iter()
        .map(|o| o.label)
        .collect();
    Err(AccessError::StatusNotPermitted {
        task_id,
        target: target.label().to_string(),
        allowed: allowed.join(", "),
    })
}

/// The current and next prize status for a status as stored, or an error
/// carrying the workflow's denial label. Unknown stored values are never moved.
pub fn require_prize_change(
    prize_id: i64,
    raw_status: &str,
    roles: &RoleSet,
) -> Result<(PrizeStatus, StatusOption<PrizeStatus>), AccessError> {
    let denied = |label: &str| AccessError::PrizeChangeDenied {
        prize_id,
        label: label.to_string(),
    };
    match next_prize_status_for_raw(raw_status, roles) {
        RawPrizeAdvice::Known(advice) => match PrizeStatus::from_str(raw_status) {
            Some(current) if is_prize_change(current, &advice) => Ok((current, advice)),
            _ => Err(denied(advice.label)),
        },
        RawPrizeAdvice::Unknown { label, .. } => Err(denied(label)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbConnection;
    use crate::models::Role;

    fn actor(user_id: i64) -> Actor {
        let mut user = User::new("alice".to_string());
        user.id = Some(user_id);
        Actor { user_id, user }
    }

    #[test]
    fn test_resolve_requires_name() {
        let conn = DbConnection::connect_in_memory().unwrap();
        let err = Actor::resolve(&conn, None).unwrap_err();
        assert_eq!(err.downcast_ref::<AccessError>(), Some(&AccessError::NoActor));

        let err = Actor::resolve(&conn, Some("ghost")).unwrap_err();
        assert_eq!(
            err.downcast_ref::<AccessError>(),
            Some(&AccessError::UnknownActor("ghost".to_string()))
        );

        UserRepo::create(&conn, "alice", None).unwrap();
        let resolved = Actor::resolve(&conn, Some("alice")).unwrap();
        assert_eq!(resolved.user.name, "alice");
    }

    #[test]
    fn test_require_admin() {
        let admin: RoleSet = [Role::DepartmentAdmin].into_iter().collect();
        assert!(require_admin(&admin, "Adding a task", "acme/ops").is_ok());

        let member: RoleSet = [Role::DepartmentMember].into_iter().collect();
        let err = require_admin(&member, "Adding a task", "acme/ops").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Adding a task requires an admin role in acme/ops (you have: department_member)"
        );
    }

    #[test]
    fn test_require_task_status_member() {
        let member: RoleSet = [Role::DepartmentMember].into_iter().collect();
        let mut task = Task::new(1, "t".to_string());
        task.assignee_id = Some(7);

        assert!(require_task_status(&task, 1, TaskStatus::Completed, &member, &actor(7)).is_ok());
        let err = require_task_status(&task, 1, TaskStatus::VerifiedCompleted, &member, &actor(7)).unwrap_err();
        assert!(err.to_string().contains("Allowed: Not Started, In Progress, Completed"));

        // Not assigned: read only
        assert!(require_task_status(&task, 1, TaskStatus::InProgress, &member, &actor(8)).is_err());
    }

    #[test]
    fn test_require_prize_change() {
        let admin: RoleSet = [Role::OrganizationAdmin].into_iter().collect();
        let (current, next) = require_prize_change(3, "available", &admin).unwrap();
        assert_eq!(current, PrizeStatus::Available);
        assert_eq!(next.status, PrizeStatus::PendingRedemption);

        let err = require_prize_change(3, "available", &RoleSet::new()).unwrap_err();
        assert_eq!(
            err,
            AccessError::PrizeChangeDenied {
                prize_id: 3,
                label: "You do not have permission to change the prize status".to_string(),
            }
        );
    }

    #[test]
    fn test_require_prize_change_refuses_unknown_status() {
        let admin: RoleSet = [Role::DepartmentAdmin].into_iter().collect();
        assert_eq!(
            require_prize_change(5, "lost", &admin).unwrap_err(),
            AccessError::PrizeChangeDenied { prize_id: 5, label: "Unknown status".to_string() }
        );

        let member: RoleSet = [Role::DepartmentMember].into_iter().collect();
        assert_eq!(
            require_prize_change(5, "lost", &member).unwrap_err().to_string(),
            "You do not have permission to change the prize status (prize 5)"
        );
    }
}
