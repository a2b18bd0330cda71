use clap::{Parser, Subcommand};
use rusqlite::Connection;
use crate::auth::{require_admin, require_prize_change, require_task_status, Actor};
use crate::config::Config;
use crate::db::DbConnection;
use crate::models::{
    Department, EntityKind, Organization, Prize, PrizeStatus, Role, RoleScope, Task, TaskStatus, User,
};
use crate::repo::{DepartmentRepo, HistoryRepo, OrganizationRepo, PrizeRepo, TaskQuery, TaskRepo, UserRepo};
use crate::cli::error::{parse_department_path, user_error, validate_id, validate_name, validate_non_empty, validate_points};
use crate::cli::output::{
    format_dashboard, format_history, format_prize_list_table, format_prize_summary, format_status_options,
    format_task_list_table, format_task_summary, is_tty, prize_json, prize_rows, task_json, task_rows,
};
use crate::utils::{fuzzy, parse_date_expr};
use crate::workflow::{available_task_statuses, next_prize_status_for_raw};
use anyhow::{Context, Result};

#[derive(Parser)]
#[command(name = "merit")]
#[command(about = "Organization and department task and prize ledger")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Act as this user (overrides MERIT_USER and user.name in ~/.merit/rc)
    #[arg(long = "as", global = true, value_name = "USER")]
    pub as_user: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Organization management commands
    Org {
        #[command(subcommand)]
        subcommand: OrgCommands,
    },
    /// Department management commands
    Dept {
        #[command(subcommand)]
        subcommand: DeptCommands,
    },
    /// User and role management commands
    User {
        #[command(subcommand)]
        subcommand: UserCommands,
    },
    /// Task commands
    Task {
        #[command(subcommand)]
        subcommand: TaskCommands,
    },
    /// Prize commands
    Prize {
        #[command(subcommand)]
        subcommand: PrizeCommands,
    },
    /// Show status change history of a task or prize
    History {
        /// Entity kind: task or prize
        kind: String,
        /// Task or prize ID
        id: String,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Show dashboard with task and prize counts
    Status {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum OrgCommands {
    /// Create a new organization
    Add {
        /// Organization name
        name: String,
    },
    /// List organizations
    List {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum DeptCommands {
    /// Create a department in an organization
    Add {
        /// Organization name
        org: String,
        /// Department name
        name: String,
    },
    /// List departments
    List {
        /// Only departments of this organization
        #[arg(long)]
        org: Option<String>,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Create a user
    Add {
        /// Login name
        name: String,
        /// Name shown in listings
        #[arg(long)]
        display_name: Option<String>,
    },
    /// List users
    List {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Grant a role at organization or department scope
    Grant {
        /// User name
        user: String,
        /// Role: organization_admin, enterprise_admin, department_admin, department_member
        role: String,
        /// Organization scope
        #[arg(long, conflicts_with = "dept", required_unless_present = "dept")]
        org: Option<String>,
        /// Department scope (<organization>/<department>)
        #[arg(long)]
        dept: Option<String>,
    },
    /// Remove a role at organization or department scope
    Revoke {
        /// User name
        user: String,
        /// Organization scope
        #[arg(long, conflicts_with = "dept", required_unless_present = "dept")]
        org: Option<String>,
        /// Department scope (<organization>/<department>)
        #[arg(long)]
        dept: Option<String>,
    },
    /// Show a user's role assignments
    Roles {
        /// User name
        user: String,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum TaskCommands {
    /// Add a task to a department (admin)
    Add {
        /// Department (<organization>/<department>)
        dept: String,
        /// Task title
        #[arg(required = true)]
        title: Vec<String>,
        /// Assign to this user
        #[arg(long)]
        assign: Option<String>,
        /// Points awarded for the task
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        points: i64,
        /// Due date (YYYY-MM-DD, today, tomorrow, +Nd)
        #[arg(long)]
        due: Option<String>,
        /// Longer description
        #[arg(long)]
        description: Option<String>,
    },
    /// List tasks
    List {
        /// Only tasks of this department
        #[arg(long)]
        dept: Option<String>,
        /// Only tasks assigned to the acting user
        #[arg(long)]
        mine: bool,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Show task details
    Show {
        /// Task ID
        id: String,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Show the statuses the acting user may set on a task
    Statuses {
        /// Task ID
        id: String,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Set a task's status
    Set {
        /// Task ID
        id: String,
        /// New status (e.g. in_progress, "In Progress", verified)
        status: String,
    },
    /// Assign a task to a user (admin)
    Assign {
        /// Task ID
        id: String,
        /// User name
        user: String,
    },
    /// Remove a task's assignee (admin)
    Unassign {
        /// Task ID
        id: String,
    },
    /// Delete a task (admin)
    Delete {
        /// Task ID
        id: String,
    },
}

#[derive(Subcommand)]
pub enum PrizeCommands {
    /// Add a prize to a department (admin)
    Add {
        /// Department (<organization>/<department>)
        dept: String,
        /// Prize name
        #[arg(required = true)]
        name: Vec<String>,
        /// Cost in points
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        cost: i64,
        /// Longer description
        #[arg(long)]
        description: Option<String>,
    },
    /// List prizes
    List {
        /// Only prizes of this department
        #[arg(long)]
        dept: Option<String>,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Show prize details
    Show {
        /// Prize ID
        id: String,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Show the next status the acting user may move a prize to
    Next {
        /// Prize ID
        id: String,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Move a prize to its next status (admin)
    Advance {
        /// Prize ID
        id: String,
    },
    /// Delete a prize (admin)
    Delete {
        /// Prize ID
        id: String,
    },
}

/// Per-invocation context: the open database and the acting user's name.
/// Handlers resolve the actor from here when they need one.
pub struct CommandContext {
    pub conn: Connection,
    actor_name: Option<String>,
}

impl CommandContext {
    pub fn open(as_user: Option<&str>) -> Result<Self> {
        let config = Config::load()?;
        let conn = DbConnection::connect_at(&config.database_path()?)
            .context("Failed to connect to database")?;
        let actor_name = config.resolve_user(as_user);
        Ok(Self { conn, actor_name })
    }

    pub fn actor(&self) -> Result<Actor> {
        Actor::resolve(&self.conn, self.actor_name.as_deref())
    }
}

pub fn run() -> Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Help and version go to stdout and succeed
            e.print()?;
            if e.use_stderr() {
                std::process::exit(1);
            }
            return Ok(());
        }
    };

    handle_command(cli)
}

fn handle_command(cli: Cli) -> Result<()> {
    let ctx = CommandContext::open(cli.as_user.as_deref())?;
    match cli.command {
        Commands::Org { subcommand } => handle_org(&ctx, subcommand),
        Commands::Dept { subcommand } => handle_dept(&ctx, subcommand),
        Commands::User { subcommand } => handle_user(&ctx, subcommand),
        Commands::Task { subcommand } => handle_task(&ctx, subcommand),
        Commands::Prize { subcommand } => handle_prize(&ctx, subcommand),
        Commands::History { kind, id, json } => handle_history(&ctx, &kind, &id, json),
        Commands::Status { json } => handle_status(&ctx, json),
    }
}

// Lookups. Each exits with a user error when the name or ID does not resolve.

fn find_org(conn: &Connection, name: &str) -> Result<(Organization, i64)> {
    if let Some(org) = OrganizationRepo::get_by_name(conn, name)? {
        if let Some(id) = org.id {
            return Ok((org, id));
        }
    }
    let names: Vec<String> = OrganizationRepo::list(conn)?.into_iter().map(|o| o.name).collect();
    user_error(&fuzzy::not_found_message("Organization", name, &names));
}

fn find_dept(conn: &Connection, path: &str) -> Result<(Department, i64)> {
    let (org_name, dept_name) = parse_department_path(path).unwrap_or_else(|e| user_error(&e));
    if let Some(org_id) = OrganizationRepo::get_by_name(conn, org_name)?.and_then(|org| org.id) {
        if let Some(dept) = DepartmentRepo::get_by_name(conn, org_id, dept_name)? {
            if let Some(id) = dept.id {
                return Ok((dept, id));
            }
        }
    }
    let paths: Vec<String> = DepartmentRepo::list_paths(conn)?.into_iter().map(|(p, _)| p).collect();
    user_error(&fuzzy::not_found_message("Department", path, &paths));
}

fn find_user(conn: &Connection, name: &str) -> Result<(User, i64)> {
    if let Some(user) = UserRepo::get_by_name(conn, name)? {
        if let Some(id) = user.id {
            return Ok((user, id));
        }
    }
    let names: Vec<String> = UserRepo::list(conn)?.into_iter().map(|u| u.name).collect();
    user_error(&fuzzy::not_found_message("User", name, &names));
}

fn find_task(conn: &Connection, id_str: &str) -> Result<(Task, i64)> {
    let id = validate_id(id_str, "Task").unwrap_or_else(|e| user_error(&e));
    match TaskRepo::get_by_id(conn, id)? {
        Some(task) => Ok((task, id)),
        None => user_error(&format!("Task {} not found", id)),
    }
}

fn find_prize(conn: &Connection, id_str: &str) -> Result<(Prize, i64)> {
    let id = validate_id(id_str, "Prize").unwrap_or_else(|e| user_error(&e));
    match PrizeRepo::get_by_id(conn, id)? {
        Some(prize) => Ok((prize, id)),
        None => user_error(&format!("Prize {} not found", id)),
    }
}

/// Prize id, department id, and the status column as stored
fn find_prize_raw(conn: &Connection, id_str: &str) -> Result<(i64, i64, String)> {
    let id = validate_id(id_str, "Prize").unwrap_or_else(|e| user_error(&e));
    match (PrizeRepo::get_department_id(conn, id)?, PrizeRepo::get_status_raw(conn, id)?) {
        (Some(department_id), Some(raw)) => Ok((id, department_id, raw)),
        _ => user_error(&format!("Prize {} not found", id)),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn handle_org(ctx: &CommandContext, cmd: OrgCommands) -> Result<()> {
    let conn = &ctx.conn;
    match cmd {
        OrgCommands::Add { name } => {
            if let Err(e) = validate_name(&name, "Organization") {
                user_error(&e);
            }
            if OrganizationRepo::get_by_name(conn, &name)?.is_some() {
                user_error(&format!("Organization '{}' already exists", name));
            }
            let org = OrganizationRepo::create(conn, &name)?;
            println!("Created organization '{}' (id: {})", org.name, org.id.unwrap_or(0));
            Ok(())
        }
        OrgCommands::List { json } => {
            let orgs = OrganizationRepo::list(conn).context("Failed to list organizations")?;
            if json {
                return print_json(&orgs);
            }
            if orgs.is_empty() {
                println!("No organizations found.");
            } else {
                println!("{:<6} {}", "ID", "Name");
                println!("{}", "-".repeat(40));
                for org in orgs {
                    println!("{:<6} {}", org.id.unwrap_or(0), org.name);
                }
            }
            Ok(())
        }
    }
}

fn handle_dept(ctx: &CommandContext, cmd: DeptCommands) -> Result<()> {
    let conn = &ctx.conn;
    match cmd {
        DeptCommands::Add { org, name } => {
            if let Err(e) = validate_name(&name, "Department") {
                user_error(&e);
            }
            let (_, org_id) = find_org(conn, &org)?;
            if DepartmentRepo::get_by_name(conn, org_id, &name)?.is_some() {
                user_error(&format!("Department '{}/{}' already exists", org, name));
            }
            let dept = DepartmentRepo::create(conn, org_id, &name)?;
            println!("Created department '{}/{}' (id: {})", org, dept.name, dept.id.unwrap_or(0));
            Ok(())
        }
        DeptCommands::List { org, json } => {
            let org_id = match org {
                Some(name) => Some(find_org(conn, &name)?.1),
                None => None,
            };
            let depts = DepartmentRepo::list(conn, org_id).context("Failed to list departments")?;
            let mut entries = Vec::with_capacity(depts.len());
            for dept in depts {
                let Some(id) = dept.id else { continue };
                entries.push((id, DepartmentRepo::path(conn, id)?));
            }
            if json {
                let values: Vec<serde_json::Value> = entries
                    .iter()
                    .map(|(id, path)| serde_json::json!({ "id": id, "path": path }))
                    .collect();
                return print_json(&values);
            }
            if entries.is_empty() {
                println!("No departments found.");
            } else {
                println!("{:<6} {}", "ID", "Department");
                println!("{}", "-".repeat(40));
                for (id, path) in entries {
                    println!("{:<6} {}", id, path);
                }
            }
            Ok(())
        }
    }
}

fn handle_user(ctx: &CommandContext, cmd: UserCommands) -> Result<()> {
    let conn = &ctx.conn;
    match cmd {
        UserCommands::Add { name, display_name } => {
            if let Err(e) = validate_name(&name, "User") {
                user_error(&e);
            }
            if UserRepo::get_by_name(conn, &name)?.is_some() {
                user_error(&format!("User '{}' already exists", name));
            }
            let user = UserRepo::create(conn, &name, display_name.as_deref())?;
            println!("Created user '{}' (id: {})", user.name, user.id.unwrap_or(0));
            Ok(())
        }
        UserCommands::List { json } => {
            let users = UserRepo::list(conn).context("Failed to list users")?;
            if json {
                return print_json(&users);
            }
            if users.is_empty() {
                println!("No users found.");
            } else {
                println!("{:<6} {:<20} {}", "ID", "Name", "Display name");
                println!("{}", "-".repeat(50));
                for user in users {
                    println!(
                        "{:<6} {:<20} {}",
                        user.id.unwrap_or(0),
                        user.name,
                        user.shown_name()
                    );
                }
            }
            Ok(())
        }
        UserCommands::Grant { user, role, org, dept } => {
            let role = Role::from_str(&role).unwrap_or_else(|| {
                user_error(&format!(
                    "Unknown role '{}'. Use organization_admin, enterprise_admin, department_admin, or department_member.",
                    role
                ))
            });
            let (_, user_id) = find_user(conn, &user)?;
            match (role.scope(), org, dept) {
                (Some(RoleScope::Organization), Some(org), None) => {
                    let (_, org_id) = find_org(conn, &org)?;
                    UserRepo::grant_organization_role(conn, user_id, org_id, role)?;
                    println!("Granted {} to '{}' in {}", role, user, org);
                }
                (Some(RoleScope::Department), None, Some(dept)) => {
                    let (_, dept_id) = find_dept(conn, &dept)?;
                    UserRepo::grant_department_role(conn, user_id, dept_id, role)?;
                    println!("Granted {} to '{}' in {}", role, user, dept);
                }
                (Some(RoleScope::Organization), _, _) => {
                    user_error(&format!("Role '{}' is granted with --org", role));
                }
                (Some(RoleScope::Department), _, _) => {
                    user_error(&format!("Role '{}' is granted with --dept", role));
                }
                (None, _, _) => {
                    user_error("Role 'none' cannot be granted. Use 'user revoke' instead.");
                }
            }
            Ok(())
        }
        UserCommands::Revoke { user, org, dept } => {
            let (_, user_id) = find_user(conn, &user)?;
            let (removed, scope) = match (org, dept) {
                (Some(org), _) => {
                    let (_, org_id) = find_org(conn, &org)?;
                    (UserRepo::revoke_organization_role(conn, user_id, org_id)?, org)
                }
                (None, Some(dept)) => {
                    let (_, dept_id) = find_dept(conn, &dept)?;
                    (UserRepo::revoke_department_role(conn, user_id, dept_id)?, dept)
                }
                (None, None) => user_error("Specify --org or --dept"),
            };
            if removed {
                println!("Revoked role of '{}' in {}", user, scope);
            } else {
                println!("User '{}' has no role in {}", user, scope);
            }
            Ok(())
        }
        UserCommands::Roles { user, json } => {
            let (_, user_id) = find_user(conn, &user)?;
            let assignments = UserRepo::list_assignments(conn, user_id)?;
            if json {
                return print_json(&assignments);
            }
            if assignments.is_empty() {
                println!("User '{}' has no roles.", user);
            } else {
                for assignment in assignments {
                    println!("{:<30} {}", assignment.scope_path, assignment.role);
                }
            }
            Ok(())
        }
    }
}

fn handle_task(ctx: &CommandContext, cmd: TaskCommands) -> Result<()> {
    let conn = &ctx.conn;
    match cmd {
        TaskCommands::Add { dept, title, assign, points, due, description } => {
            let title = title.join(" ");
            if let Err(e) = validate_non_empty(&title, "Task title") {
                user_error(&e);
            }
            let points = validate_points(points, "Points").unwrap_or_else(|e| user_error(&e));

            let actor = ctx.actor()?;
            let (_, dept_id) = find_dept(conn, &dept)?;
            require_admin(&actor.roles_in(conn, dept_id)?, "Adding a task", &dept)?;

            let assignee_id = match assign {
                Some(name) => Some(find_user(conn, &name)?.1),
                None => None,
            };
            let due_ts = match due {
                Some(expr) => Some(parse_date_expr(&expr).unwrap_or_else(|e| user_error(&e.to_string()))),
                None => None,
            };

            let task = TaskRepo::create_full(conn, dept_id, &title, description.as_deref(), assignee_id, points, due_ts)?;
            log::debug!("User '{}' created task {:?} in {}", actor.user.name, task.id, dept);
            println!("Created task {}: {}", task.id.unwrap_or(0), task.title);
            Ok(())
        }
        TaskCommands::List { dept, mine, json } => {
            let mut query = TaskQuery::default();
            if let Some(path) = dept {
                query.department_id = Some(find_dept(conn, &path)?.1);
            }
            if mine {
                query.assignee_id = Some(ctx.actor()?.user_id);
            }
            let tasks = TaskRepo::list(conn, &query).context("Failed to list tasks")?;
            let rows = task_rows(conn, tasks)?;
            if json {
                let values: Vec<serde_json::Value> = rows.iter().map(task_json).collect();
                return print_json(&values);
            }
            println!("{}", format_task_list_table(&rows, is_tty()));
            Ok(())
        }
        TaskCommands::Show { id, json } => {
            let (task, _) = find_task(conn, &id)?;
            let rows = task_rows(conn, vec![task])?;
            if json {
                return print_json(&task_json(&rows[0]));
            }
            println!("{}", format_task_summary(&rows[0]));
            Ok(())
        }
        TaskCommands::Statuses { id, json } => {
            let (task, task_id) = find_task(conn, &id)?;
            let actor = ctx.actor()?;
            let roles = actor.roles_in(conn, task.department_id)?;
            let assigned = task.is_assigned_to(actor.user_id);
            let options = available_task_statuses(task.status, &roles, assigned);

            if json {
                return print_json(&serde_json::json!({
                    "task_id": task_id,
                    "current": task.status.as_str(),
                    "roles": roles,
                    "assigned": assigned,
                    "options": options,
                }));
            }
            println!(
                "Task {} ({}) as '{}' [roles: {}; assigned: {}]",
                task_id,
                task.status.label(),
                actor.user.name,
                roles,
                if assigned { "yes" } else { "no" }
            );
            println!("{}", format_status_options(task.status, &options));
            Ok(())
        }
        TaskCommands::Set { id, status } => {
            let target = TaskStatus::parse_user(&status).unwrap_or_else(|| {
                user_error(&format!(
                    "Unknown task status '{}'. Use not_started, in_progress, completed, or verified.",
                    status
                ))
            });
            let (task, task_id) = find_task(conn, &id)?;
            let actor = ctx.actor()?;
            let roles = actor.roles_in(conn, task.department_id)?;
            require_task_status(&task, task_id, target, &roles, &actor)?;

            if task.status == target {
                println!("Task {} is already {}", task_id, target.label());
                return Ok(());
            }

            let tx = conn.unchecked_transaction()?;
            TaskRepo::set_status(&tx, task_id, target)?;
            HistoryRepo::record(&tx, EntityKind::Task, task_id, task.status.as_str(), target.as_str(), Some(actor.user_id))?;
            tx.commit()?;

            log::debug!("Task {} moved {} -> {} by '{}'", task_id, task.status.as_str(), target.as_str(), actor.user.name);
            println!("Task {}: {} -> {}", task_id, task.status.label(), target.label());
            Ok(())
        }
        TaskCommands::Assign { id, user } => {
            let (task, task_id) = find_task(conn, &id)?;
            let actor = ctx.actor()?;
            let dept = DepartmentRepo::path(conn, task.department_id)?;
            require_admin(&actor.roles_in(conn, task.department_id)?, "Assigning a task", &dept)?;
            let (_, user_id) = find_user(conn, &user)?;
            TaskRepo::set_assignee(conn, task_id, Some(user_id))?;
            println!("Assigned task {} to '{}'", task_id, user);
            Ok(())
        }
        TaskCommands::Unassign { id } => {
            let (task, task_id) = find_task(conn, &id)?;
            let actor = ctx.actor()?;
            let dept = DepartmentRepo::path(conn, task.department_id)?;
            require_admin(&actor.roles_in(conn, task.department_id)?, "Unassigning a task", &dept)?;
            TaskRepo::set_assignee(conn, task_id, None)?;
            println!("Unassigned task {}", task_id);
            Ok(())
        }
        TaskCommands::Delete { id } => {
            let (task, task_id) = find_task(conn, &id)?;
            let actor = ctx.actor()?;
            let dept = DepartmentRepo::path(conn, task.department_id)?;
            require_admin(&actor.roles_in(conn, task.department_id)?, "Deleting a task", &dept)?;
            TaskRepo::delete(conn, task_id)?;
            println!("Deleted task {}", task_id);
            Ok(())
        }
    }
}

fn handle_prize(ctx: &CommandContext, cmd: PrizeCommands) -> Result<()> {
    let conn = &ctx.conn;
    match cmd {
        PrizeCommands::Add { dept, name, cost, description } => {
            let name = name.join(" ");
            if let Err(e) = validate_non_empty(&name, "Prize name") {
                user_error(&e);
            }
            let cost = validate_points(cost, "Cost").unwrap_or_else(|e| user_error(&e));

            let actor = ctx.actor()?;
            let (_, dept_id) = find_dept(conn, &dept)?;
            require_admin(&actor.roles_in(conn, dept_id)?, "Adding a prize", &dept)?;

            let prize = PrizeRepo::create(conn, dept_id, &name, description.as_deref(), cost)?;
            println!("Created prize {}: {}", prize.id.unwrap_or(0), prize.name);
            Ok(())
        }
        PrizeCommands::List { dept, json } => {
            let dept_id = match dept {
                Some(path) => Some(find_dept(conn, &path)?.1),
                None => None,
            };
            let prizes = PrizeRepo::list(conn, dept_id).context("Failed to list prizes")?;
            let rows = prize_rows(conn, prizes)?;
            if json {
                let values: Vec<serde_json::Value> = rows.iter().map(prize_json).collect();
                return print_json(&values);
            }
            println!("{}", format_prize_list_table(&rows, is_tty()));
            Ok(())
        }
        PrizeCommands::Show { id, json } => {
            let (prize, _) = find_prize(conn, &id)?;
            let rows = prize_rows(conn, vec![prize])?;
            if json {
                return print_json(&prize_json(&rows[0]));
            }
            println!("{}", format_prize_summary(&rows[0]));
            Ok(())
        }
        PrizeCommands::Next { id, json } => {
            let (prize_id, department_id, raw) = find_prize_raw(conn, &id)?;
            let actor = ctx.actor()?;
            let roles = actor.roles_in(conn, department_id)?;
            let advice = next_prize_status_for_raw(&raw, &roles);

            if json {
                return print_json(&serde_json::json!({
                    "prize_id": prize_id,
                    "current": raw,
                    "label": advice.label(),
                    "next": advice.status_str(),
                    "roles": roles,
                }));
            }
            if advice.status_str() == raw {
                println!("Prize {}: {}", prize_id, advice.label());
            } else {
                let next_label = PrizeStatus::from_str(advice.status_str())
                    .map(|s| s.label())
                    .unwrap_or("?");
                println!("Prize {}: {} -> {}", prize_id, advice.label(), next_label);
            }
            Ok(())
        }
        PrizeCommands::Advance { id } => {
            let (prize_id, department_id, raw) = find_prize_raw(conn, &id)?;
            let actor = ctx.actor()?;
            let roles = actor.roles_in(conn, department_id)?;
            let (current, next) = require_prize_change(prize_id, &raw, &roles)?;
            let prize = PrizeRepo::get_by_id(conn, prize_id)?
                .with_context(|| format!("Prize {} not found", prize_id))?;

            let requested_by = match next.status {
                PrizeStatus::PendingRedemption => Some(actor.user_id),
                PrizeStatus::Available => None,
                PrizeStatus::Redeemed => prize.requested_by,
            };

            let tx = conn.unchecked_transaction()?;
            PrizeRepo::set_status(&tx, prize_id, next.status, requested_by)?;
            HistoryRepo::record(&tx, EntityKind::Prize, prize_id, current.as_str(), next.status.as_str(), Some(actor.user_id))?;
            tx.commit()?;

            log::debug!("Prize {} moved {} -> {} by '{}'", prize_id, current.as_str(), next.status.as_str(), actor.user.name);
            println!("Prize {}: {} -> {} ({})", prize_id, current.label(), next.status.label(), next.label);
            Ok(())
        }
        PrizeCommands::Delete { id } => {
            let (prize, prize_id) = find_prize(conn, &id)?;
            let actor = ctx.actor()?;
            let dept = DepartmentRepo::path(conn, prize.department_id)?;
            require_admin(&actor.roles_in(conn, prize.department_id)?, "Deleting a prize", &dept)?;
            PrizeRepo::delete(conn, prize_id)?;
            println!("Deleted prize {}", prize_id);
            Ok(())
        }
    }
}

fn handle_history(ctx: &CommandContext, kind: &str, id: &str, json: bool) -> Result<()> {
    let conn = &ctx.conn;
    let kind = EntityKind::from_str(&kind.to_lowercase())
        .unwrap_or_else(|| user_error(&format!("Unknown kind '{}'. Use task or prize.", kind)));
    let entity_id = match kind {
        EntityKind::Task => find_task(conn, id)?.1,
        EntityKind::Prize => find_prize(conn, id)?.1,
    };

    let changes = HistoryRepo::list_for(conn, kind, entity_id)?;
    if json {
        return print_json(&changes);
    }

    let mut named = Vec::with_capacity(changes.len());
    for change in changes {
        let actor = match change.actor_id {
            Some(actor_id) => UserRepo::get_by_id(conn, actor_id)?.map(|u| u.name),
            None => None,
        };
        named.push((change, actor));
    }
    println!("{}", format_history(&named));
    Ok(())
}

fn handle_status(ctx: &CommandContext, json: bool) -> Result<()> {
    let conn = &ctx.conn;
    let task_counts = TaskRepo::count_by_status(conn)?;
    let prize_counts = PrizeRepo::count_by_status(conn)?;
    let overdue = TaskRepo::list_all(conn)?
        .iter()
        .filter(|t| t.is_overdue())
        .count();

    if json {
        let tasks: serde_json::Map<String, serde_json::Value> = task_counts
            .iter()
            .map(|(s, c)| (s.as_str().to_string(), serde_json::json!(c)))
            .collect();
        let prizes: serde_json::Map<String, serde_json::Value> = prize_counts
            .iter()
            .map(|(s, c)| (s.as_str().to_string(), serde_json::json!(c)))
            .collect();
        return print_json(&serde_json::json!({
            "tasks": tasks,
            "overdue_tasks": overdue,
            "prizes": prizes,
        }));
    }

    println!("{}", format_dashboard(&task_counts, &prize_counts, overdue, is_tty()));
    Ok(())
}
