//! Merit - organization and department task and prize ledger
//!
//! This library provides the core functionality for Merit, including:
//! - Role-gated task and prize status workflows
//! - Database operations and migrations
//! - Data models for organizations, departments, users, tasks, and prizes
//! - Repository layer for data access
//! - Acting-user context and permission enforcement
//! - CLI command parsing and execution
//!
//! # Example
//!
//! ```
//! use merit::models::{Role, RoleSet, TaskStatus};
//! use merit::workflow::available_task_statuses;
//!
//! let roles: RoleSet = [Role::DepartmentMember].into_iter().collect();
//! let options = available_task_statuses(TaskStatus::InProgress, &roles, true);
//! assert_eq!(options.len(), 3);
//! ```

pub mod auth;
pub mod cli;
pub mod config;
pub mod db;
pub mod models;
pub mod repo;
pub mod utils;
pub mod workflow;
