// Core data models for Merit
// These structs represent the domain entities

pub mod role;
pub mod organization;
pub mod user;
pub mod task;
pub mod prize;
pub mod history;

pub use role::*;
pub use organization::*;
pub use user::*;
pub use task::*;
pub use prize::*;
pub use history::*;
