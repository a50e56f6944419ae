#![allow(dead_code)]

pub mod app;
pub mod factory;

pub use app::{postgres_deps, test_config, unique_email, TestApp};
pub use factory::{clocked_deps, Factory, TestAuth};
