use rss_collector::controllers::{
    category::CategoryController, feed::FeedController, item::ItemController,
};
use rss_collector::domain::category::CategoryService;
use rss_collector::domain::feed::{FeedRepository, FeedService};
use rss_collector::infrastructure::collector::HttpFeedCollector;
use rss_collector::infrastructure::config::{Config, LogFormat};
use rss_collector::infrastructure::db::{connect_with_retry, run_migrations, DbPool};
use rss_collector::infrastructure::http::{start_http_server, AppControllers};
use rss_collector::infrastructure::repositories::{MemoryFeedStore, PostgresFeedStore};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    init_logging(&config);

    tracing::info!(
        "Starting RSS collector on {}:{}",
        config.host,
        config.port
    );

    // === STORAGE BACKEND ===
    // Chosen once; nothing below knows which one is in use.
    let (repository, pool): (Arc<dyn FeedRepository>, Option<Arc<DbPool>>) =
        match config.database_url.as_deref() {
            Some(database_url) => {
                let pool = connect_with_retry(
                    database_url,
                    config.db_connect_attempts,
                    config.db_connect_delay(),
                )
                .await?;
                run_migrations(&pool, config.migrations_dir.as_deref()).await?;

                let pool = Arc::new(pool);
                let store: Arc<dyn FeedRepository> =
                    Arc::new(PostgresFeedStore::new(pool.clone()));
                tracing::info!("Using postgres storage backend");
                (store, Some(pool))
            }
            None => {
                tracing::warn!("DATABASE_URL not set, using in-memory storage backend");
                let store: Arc<dyn FeedRepository> = Arc::new(MemoryFeedStore::new());
                (store, None)
            }
        };

    let config = Arc::new(config);

    // === DEPENDENCY INJECTION SETUP ===
    tracing::info!("Instantiating services...");
    let collector = Arc::new(HttpFeedCollector::new()?);
    let feed_service = Arc::new(FeedService::new(repository.clone(), collector));
    let category_service = Arc::new(CategoryService::new(repository));

    tracing::info!("Instantiating controllers...");
    let controllers = AppControllers {
        feed: Arc::new(FeedController::new(feed_service.clone())),
        item: Arc::new(ItemController::new(feed_service)),
        category: Arc::new(CategoryController::new(category_service)),
        readiness: pool,
    };

    start_http_server(config, controllers).await?;

    Ok(())
}

fn init_logging(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "rss_collector=debug,tower_http=debug".into());

    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}
