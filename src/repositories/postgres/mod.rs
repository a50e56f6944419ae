//! PostgreSQL repositories built on SeaORM

pub mod project;
pub mod task;
pub mod user;

pub use project::PgProjectRepository;
pub use task::PgTaskRepository;
pub use user::PgUserRepository;
