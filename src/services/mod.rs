pub mod auth;
pub mod project;
pub mod task;
pub mod user;

pub use auth::{AuthService, Claims};
pub use project::ProjectService;
pub use task::TaskService;
pub use user::UserService;
