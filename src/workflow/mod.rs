//! Role-gated status workflows for tasks and prizes
//!
//! Both tables are pure functions over a status snapshot and the caller's
//! role set. They return advisory options only; persisting a change and
//! refusing a disallowed one is the caller's job (see `crate::auth`).

pub mod task;
pub mod prize;

pub use task::*;
pub use prize::*;

use serde::Serialize;

/// A status the caller may pick, paired with the label to show for it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusOption<S> {
    pub label: &'static str,
    pub status: S,
}

impl<S> StatusOption<S> {
    pub fn new(label: &'static str, status: S) -> Self {
        Self { label, status }
    }
}
