use std::sync::{Arc, Mutex, PoisonError};

use sea_orm::DatabaseConnection;
use time::{Duration, OffsetDateTime};

use crate::repositories::{
    InMemoryProjectRepository, InMemoryTaskRepository, InMemoryUserRepository,
    PgProjectRepository, PgTaskRepository, PgUserRepository, ProjectRepository, TaskRepository,
    UserRepository,
};

/// Source of the timestamps stamped by use-cases
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

/// Wall clock (UTC)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<OffsetDateTime>,
}

impl ManualClock {
    pub fn new(start: OffsetDateTime) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, at: OffsetDateTime) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = at;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> OffsetDateTime {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Everything a use-case needs, passed explicitly into every call
#[derive(Clone)]
pub struct Deps {
    pub users: Arc<dyn UserRepository>,
    pub projects: Arc<dyn ProjectRepository>,
    pub tasks: Arc<dyn TaskRepository>,
    pub clock: Arc<dyn Clock>,
}

impl Deps {
    /// Repositories backed by a PostgreSQL connection
    pub fn postgres(db: DatabaseConnection) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(db.clone())),
            projects: Arc::new(PgProjectRepository::new(db.clone())),
            tasks: Arc::new(PgTaskRepository::new(db)),
            clock: Arc::new(SystemClock),
        }
    }

    /// Fresh, empty in-memory repositories
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(InMemoryUserRepository::new()),
            projects: Arc::new(InMemoryProjectRepository::new()),
            tasks: Arc::new(InMemoryTaskRepository::new()),
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock (tests pin time with [`ManualClock`])
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn now(&self) -> OffsetDateTime {
        self.clock.now()
    }
}
