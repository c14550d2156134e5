//! Catalog Admin Backend
//!
//! Admin service for the product catalog: category management over a
//! revisioned document store and single-flight collection jobs.

mod api;
mod auth;
mod categories;
mod config;
mod errors;
mod jobs;
mod models;
mod pages;
mod store;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use categories::{CategoryRepository, SystemClock};
use config::Config;
use jobs::{CollectorService, ExcelImporter, JobOrchestrator, LinkParser, ProductUpdater};
use pages::PageRenderer;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub categories: Arc<CategoryRepository>,
    pub jobs: Arc<JobOrchestrator>,
    pub links: Arc<dyn LinkParser>,
    pub importer: Arc<dyn ExcelImporter>,
    pub updater: Arc<dyn ProductUpdater>,
    pub pages: Arc<PageRenderer>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    if config.log_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting Catalog Admin Backend");
    tracing::info!("Document store: {}", config.store.describe());
    tracing::info!("Bind address: {}", config.bind_addr);

    if config.api_psk.is_none() {
        tracing::warn!("No API PSK configured (CATALOG_API_PSK). Authentication is disabled!");
    }
    if config.collector_url.is_none() {
        tracing::warn!("No collector configured (CATALOG_COLLECTOR_URL). Jobs will fail.");
    }

    // Initialize the document store
    let store = store::init_store(&config).await?;
    let categories = Arc::new(CategoryRepository::new(store, Arc::new(SystemClock)));

    // External collaborators
    let collector = Arc::new(CollectorService::new(config.collector_url.clone()));
    let jobs = Arc::new(JobOrchestrator::new(collector.clone(), config.job_timeout));

    let state = AppState {
        categories,
        jobs,
        links: collector.clone(),
        importer: collector.clone(),
        updater: collector,
        pages: Arc::new(PageRenderer::new()?),
        config: Arc::new(config.clone()),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Clone PSK for the auth layer
    let psk = state.config.api_psk.clone();

    // API routes
    let api_routes = Router::new()
        // Categories
        .route(
            "/categories",
            get(api::list_categories).post(api::create_category),
        )
        .route("/categories/next-id", get(api::next_category_id))
        .route(
            "/categories/{id}",
            get(api::get_category)
                .put(api::update_category)
                .delete(api::delete_category),
        )
        // Jobs
        .route("/jobs/collect", post(api::start_collection))
        .route("/jobs/status", get(api::job_status))
        // Collector tools
        .route("/links/parse", get(api::parse_link))
        .route("/excel/import", post(api::import_excel))
        .route("/products/update", post(api::update_products))
        // Apply PSK auth middleware
        .layer(middleware::from_fn(move |req, next| {
            auth::require_api_key(psk.clone(), req, next)
        }));

    // Admin pages
    let page_routes = Router::new()
        .route(
            "/categories",
            get(pages::category_list_page).post(pages::create_category_form),
        )
        .route("/categories/new", get(pages::new_category_page))
        .route(
            "/categories/{id}",
            get(pages::edit_category_page).post(pages::update_category_form),
        )
        .route("/categories/{id}/delete", post(pages::delete_category_form));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(page_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
