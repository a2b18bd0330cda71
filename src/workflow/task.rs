use crate::models::{Role, RoleSet, TaskStatus};
use super::StatusOption;

/// Statuses a department member may move their own task between.
/// Members never verify their own work.
const MEMBER_STATUSES: [TaskStatus; 3] = [
    TaskStatus::NotStarted,
    TaskStatus::InProgress,
    TaskStatus::Completed,
];

/// Returns the statuses the caller may set on a task, in lifecycle order.
///
/// - Any admin role: all four statuses, whatever the current one is.
/// - Department member assigned to the task: the first three.
/// - Anyone else: only the current status.
///
/// The current status is always present in the result so callers have a
/// valid selection for the present state.
pub fn available_task_statuses(
    current: TaskStatus,
    roles: &RoleSet,
    is_assigned_to_caller: bool,
) -> Vec<StatusOption<TaskStatus>> {
    let mut options: Vec<StatusOption<TaskStatus>> = if roles.is_admin() {
        TaskStatus::ALL.iter().map(|s| option_for(*s)).collect()
    } else if roles.contains(Role::DepartmentMember) && is_assigned_to_caller {
        MEMBER_STATUSES.iter().map(|s| option_for(*s)).collect()
    } else {
        vec![option_for(current)]
    };

    if !options.iter().any(|o| o.status == current) {
        options.push(option_for(current));
    }

    log::debug!(
        "task statuses for current={} roles={} assigned={}: {:?}",
        current.as_str(),
        roles,
        is_assigned_to_caller,
        options.iter().map(|o| o.status.as_str()).collect::<Vec<_>>()
    );
    options
}

/// True when `target` is among the statuses offered to the caller
pub fn can_set_task_status(
    current: TaskStatus,
    target: TaskStatus,
    roles: &RoleSet,
    is_assigned_to_caller: bool,
) -> bool {
    available_task_statuses(current, roles, is_assigned_to_caller)
        .iter()
        .any(|o| o.status == target)
}

fn option_for(status: TaskStatus) -> StatusOption<TaskStatus> {
    StatusOption::new(status.label(), status)
}
