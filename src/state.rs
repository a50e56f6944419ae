use sea_orm::{ConnectOptions, Database};
use sqlx::postgres::PgPool;

use crate::config::Config;
use crate::deps::Deps;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Repositories and clock handed to every use-case
    pub deps: Deps,
    pub config: Config,
}

impl AppState {
    /// Connect to PostgreSQL, run migrations and wire the SeaORM repositories
    pub async fn connect(config: Config) -> Result<Self, AppStateError> {
        // Connect to PostgreSQL with SQLx (for migrations)
        let pg_pool = PgPool::connect(&config.database_url)
            .await
            .map_err(|e| AppStateError::Postgres(e.to_string()))?;

        // Run migrations
        sqlx::migrate!("./migrations")
            .run(&pg_pool)
            .await
            .map_err(|e| AppStateError::Migration(e.to_string()))?;
        pg_pool.close().await;

        // Connect to PostgreSQL with SeaORM
        let mut opt = ConnectOptions::new(&config.database_url);
        opt.max_connections(config.db_max_connections)
            .min_connections(1)
            .sqlx_logging(true);

        let db = Database::connect(opt)
            .await
            .map_err(|e| AppStateError::Postgres(e.to_string()))?;

        Ok(Self {
            deps: Deps::postgres(db),
            config,
        })
    }

    /// State over caller-provided repositories (for testing)
    pub fn with_deps(config: Config, deps: Deps) -> Self {
        Self { deps, config }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppStateError {
    #[error("PostgreSQL connection error: {0}")]
    Postgres(String),

    #[error("Migration error: {0}")]
    Migration(String),
}
