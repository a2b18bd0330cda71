pub mod organization;
pub mod user;
pub mod task;
pub mod prize;
pub mod history;

pub use organization::*;
pub use user::*;
pub use task::*;
pub use prize::*;
pub use history::*;
