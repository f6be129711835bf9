pub mod error;
pub mod ingest_repository;
pub mod models;
pub mod reading_repository;
pub mod yearly_stats_repository;

pub use error::DbError;
pub use ingest_repository::{IngestRepository, WriteCounts};
pub use models::*;
pub use reading_repository::ReadingRepository;
pub use yearly_stats_repository::YearlyStatsRepository;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// Open a connection pool against `database_url`
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, DbError> {
    info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    info!("Database connection established");
    Ok(pool)
}

/// Apply the embedded schema migrations
pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("Database migrations completed");
    Ok(())
}
