pub mod request_id;

use axum::{
    middleware,
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::controllers::{
    category::CategoryController,
    feed::FeedController,
    health::{self, ReadinessState},
    item::ItemController,
};
use crate::infrastructure::config::Config;
pub use request_id::{request_id_middleware, RequestId, X_REQUEST_ID};

/// Everything the router needs, wired once at startup.
pub struct AppControllers {
    pub feed: Arc<FeedController>,
    pub item: Arc<ItemController>,
    pub category: Arc<CategoryController>,
    pub readiness: ReadinessState,
}

/// Assemble all routes with request-id tagging and request tracing.
pub fn build_router(controllers: AppControllers) -> Router {
    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::health_ready))
        .with_state(controllers.readiness);

    let feed_routes = Router::new()
        .route(
            "/feeds",
            get(FeedController::list_feeds).post(FeedController::create_feed),
        )
        .route(
            "/feeds/:feedId",
            get(FeedController::get_feed)
                .put(FeedController::update_feed)
                .delete(FeedController::delete_feed),
        )
        .with_state(controllers.feed);

    let item_routes = Router::new()
        .route("/items", get(ItemController::list_items))
        .route(
            "/items/:itemId",
            get(ItemController::get_item)
                .put(ItemController::update_item)
                .delete(ItemController::delete_item),
        )
        .with_state(controllers.item);

    let category_routes = Router::new()
        .route(
            "/categories",
            get(CategoryController::list_categories).post(CategoryController::create_category),
        )
        .route(
            "/categories/:categoryId",
            get(CategoryController::get_category)
                .put(CategoryController::update_category)
                .delete(CategoryController::delete_category),
        )
        .with_state(controllers.category);

    Router::new()
        .merge(health_routes)
        .merge(feed_routes)
        .merge(item_routes)
        .merge(category_routes)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
}

/// Start the HTTP server with all routes configured
pub async fn start_http_server(
    config: Arc<Config>,
    controllers: AppControllers,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut app = build_router(controllers);
    if config.is_development() {
        app = app.layer(CorsLayer::permissive());
    }

    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", config.host, config.port)).await?;

    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
