pub mod project;
pub mod task;
pub mod user;

pub use project::*;
pub use task::*;
pub use user::*;
