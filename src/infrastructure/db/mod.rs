use crate::error::{AppError, AppResult};
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::path::Path;
use std::time::Duration;

pub type DbPool = Pool<Postgres>;

pub const CONNECTION_RETRY_LIMIT: u32 = 20;
pub const CONNECTION_RETRY_DELAY: Duration = Duration::from_secs(3);

static EMBEDDED_MIGRATIONS: Migrator = sqlx::migrate!("./migrations");

pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(3))
        .connect(database_url)
        .await
}

/// Connects with a fixed attempt budget and a fixed delay between attempts.
/// Exhausting the budget is fatal; callers are not expected to retry.
pub async fn connect_with_retry(
    database_url: &str,
    max_attempts: u32,
    delay: Duration,
) -> AppResult<DbPool> {
    let max_attempts = max_attempts.max(1);

    for attempt in 1..=max_attempts {
        match create_pool(database_url).await {
            Ok(pool) => {
                tracing::info!(attempt, "Database connection established");
                return Ok(pool);
            }
            Err(e) => {
                tracing::warn!(
                    attempt,
                    max_attempts,
                    error = %e,
                    "Database connection failed, retrying"
                );
                if attempt < max_attempts {
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    Err(AppError::Connection(format!(
        "failed to connect to database after {} attempts",
        max_attempts
    )))
}

pub async fn check_connection(pool: &DbPool) -> Result<bool, sqlx::Error> {
    sqlx::query("SELECT 1").fetch_one(pool).await.map(|_| true)
}

/// Applies every unapplied migration once, in version order. Running with
/// nothing left to apply succeeds without changes.
pub async fn run_migrations(pool: &DbPool, directory: Option<&Path>) -> AppResult<()> {
    match directory {
        Some(dir) => {
            tracing::info!(directory = %dir.display(), "Running migrations from directory");
            let migrator = Migrator::new(dir).await?;
            migrator.run(pool).await?;
        }
        None => {
            tracing::info!("Running embedded migrations");
            EMBEDDED_MIGRATIONS.run(pool).await?;
        }
    }

    tracing::info!("Database schema is up to date");
    Ok(())
}
