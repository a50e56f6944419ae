//! In-memory repositories used by tests and local runs without PostgreSQL.
//! Each table sits behind a tokio `Mutex`; IDs come from a per-table counter.

pub mod project;
pub mod task;
pub mod user;

pub use project::InMemoryProjectRepository;
pub use task::InMemoryTaskRepository;
pub use user::InMemoryUserRepository;

use std::collections::BTreeMap;

/// Rows keyed by ID plus the next ID to hand out
pub(crate) struct Table<T> {
    rows: BTreeMap<i64, T>,
    next_id: i64,
}

impl<T> Table<T> {
    pub(crate) fn new() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Build a row with a fresh ID and store it
    pub(crate) fn insert_with(&mut self, build: impl FnOnce(i64) -> T) -> &T {
        let id = self.next_id;
        self.next_id += 1;
        self.rows.entry(id).or_insert(build(id))
    }

    pub(crate) fn get(&self, id: i64) -> Option<&T> {
        self.rows.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: i64) -> Option<&mut T> {
        self.rows.get_mut(&id)
    }

    pub(crate) fn values(&self) -> impl Iterator<Item = &T> {
        self.rows.values()
    }

    pub(crate) fn values_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.rows.values_mut()
    }
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self::new()
    }
}
