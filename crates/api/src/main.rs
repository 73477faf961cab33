//! StoreKeep API service
//!
//! The entry point for all external API requests.
//! Handles:
//! - Authentication and authorization
//! - Store-scoped resource CRUD
//! - PM work order generation and bulk import
//! - Observability (logging, metrics, tracing)

mod handlers;
mod middleware;
mod services;

use axum::extract::{DefaultBodyLimit, FromRef};
use axum::routing::{delete, get, patch, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use storekeep_common::auth::JwtManager;
use storekeep_common::config::AppConfig;
use storekeep_common::db::DbPool;
use storekeep_common::mailer::{create_mailer, Mailer};
use storekeep_common::metrics;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DbPool,
    pub jwt: Arc<JwtManager>,
    pub mailer: Arc<dyn Mailer>,
}

impl FromRef<AppState> for Arc<JwtManager> {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.observability.log_level));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    if config.observability.json_logging {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    info!("Starting StoreKeep API v{}", storekeep_common::VERSION);

    // Initialize metrics
    metrics::register_metrics();
    if config.observability.metrics_port > 0 {
        PrometheusBuilder::new()
            .with_http_listener(([0, 0, 0, 0], config.observability.metrics_port))
            .install()?;
        info!(
            port = config.observability.metrics_port,
            "Prometheus exporter listening"
        );
    }

    let config = Arc::new(config);

    // Initialize database connection
    info!("Connecting to database...");
    let db = DbPool::new(&config.database).await?;

    let jwt_secret = config
        .auth
        .jwt_secret
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("APP__AUTH__JWT_SECRET must be set"))?;
    let jwt = Arc::new(JwtManager::new(
        jwt_secret,
        config.auth.jwt_expiration_secs,
        config.auth.mobile_jwt_expiration_secs,
    ));

    let mailer = create_mailer(&config.mail);

    let state = AppState {
        config: config.clone(),
        db,
        jwt,
        mailer,
    };

    // Build the router
    let app = create_router(state);

    // Start the server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    let rate_limiter = middleware::rate_limit::create_rate_limiter(
        state.config.rate_limit.requests_per_second,
        state.config.rate_limit.burst,
    );
    let rate_limiting_enabled = state.config.rate_limit.enabled;

    let api_routes = Router::new()
        // Health endpoints (no auth)
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        // Authentication
        .route("/auth/login", post(handlers::auth::login))
        .route("/mobile/auth", post(handlers::auth::mobile_auth))
        // Stores
        .route("/stores", get(handlers::stores::list_stores))
        .route("/stores", post(handlers::stores::create_store))
        .route("/stores/{id}", get(handlers::stores::get_store))
        .route("/stores/{id}", patch(handlers::stores::update_store))
        .route("/stores/{id}", delete(handlers::stores::delete_store))
        .route("/stores/{id}/qr", get(handlers::stores::store_qr))
        // Assets
        .route("/assets", get(handlers::assets::list_assets))
        .route("/assets", post(handlers::assets::create_asset))
        .route("/assets/{id}", get(handlers::assets::get_asset))
        .route("/assets/{id}", patch(handlers::assets::update_asset))
        .route("/assets/{id}", delete(handlers::assets::delete_asset))
        .route("/assets/bulk-import", post(handlers::assets::bulk_import))
        // Inventory
        .route("/inventory", get(handlers::inventory::list_items))
        .route("/inventory", post(handlers::inventory::create_item))
        .route("/inventory/{id}", get(handlers::inventory::get_item))
        .route("/inventory/{id}", patch(handlers::inventory::update_item))
        .route("/inventory/{id}", delete(handlers::inventory::delete_item))
        .route(
            "/inventory/bulk-import",
            post(handlers::inventory::bulk_import),
        )
        // Work orders
        .route("/workorders", get(handlers::workorders::list_work_orders))
        .route("/workorders", post(handlers::workorders::create_work_order))
        .route(
            "/workorders/public",
            post(handlers::workorders::create_public_work_order),
        )
        .route(
            "/workorders/shared/{token}",
            get(handlers::workorders::get_shared_work_order),
        )
        .route("/workorders/{id}", get(handlers::workorders::get_work_order))
        .route(
            "/workorders/{id}",
            patch(handlers::workorders::update_work_order),
        )
        .route(
            "/workorders/{id}",
            delete(handlers::workorders::delete_work_order),
        )
        .route(
            "/workorders/{id}/share",
            post(handlers::workorders::create_share_link),
        )
        .route(
            "/workorders/{id}/share",
            get(handlers::workorders::get_share_link),
        )
        .route(
            "/workorders/{id}/share",
            delete(handlers::workorders::revoke_share_link),
        )
        .route("/workorders/{id}/notes", get(handlers::workorders::list_notes))
        .route("/workorders/{id}/notes", post(handlers::workorders::add_note))
        // PM schedules
        .route("/schedules", get(handlers::schedules::list_schedules))
        .route("/schedules", post(handlers::schedules::create_schedule))
        .route("/schedules/generate", post(handlers::schedules::generate))
        .route("/schedules/{id}", get(handlers::schedules::get_schedule))
        .route("/schedules/{id}", patch(handlers::schedules::update_schedule))
        .route("/schedules/{id}", delete(handlers::schedules::delete_schedule))
        // Maintenance requests
        .route("/requests", get(handlers::requests::list_requests))
        .route("/requests", post(handlers::requests::create_request))
        .route("/requests/{id}", get(handlers::requests::get_request))
        .route("/requests/{id}", patch(handlers::requests::update_request))
        // Transfers
        .route("/transfers", get(handlers::transfers::list_transfers))
        .route("/transfers", post(handlers::transfers::create_transfer))
        // Purchase orders
        .route(
            "/purchase-orders",
            get(handlers::purchase_orders::list_purchase_orders),
        )
        .route(
            "/purchase-orders",
            post(handlers::purchase_orders::create_purchase_order),
        )
        .route(
            "/purchase-orders/{id}",
            get(handlers::purchase_orders::get_purchase_order),
        )
        .route(
            "/purchase-orders/{id}",
            patch(handlers::purchase_orders::update_purchase_order),
        )
        // Technicians
        .route("/technicians", get(handlers::technicians::list_technicians))
        .route("/technicians", post(handlers::technicians::create_technician))
        .route(
            "/technicians/{id}",
            delete(handlers::technicians::delete_technician),
        )
        // Vendors
        .route("/vendors", get(handlers::vendors::list_vendors))
        .route("/vendors", post(handlers::vendors::create_vendor))
        .route("/vendors/{id}", delete(handlers::vendors::delete_vendor))
        .route("/vendors/import", post(handlers::vendors::import_vendors))
        // Users
        .route("/users", get(handlers::users::list_users))
        .route("/users", post(handlers::users::create_user))
        // Uploads
        .route("/upload", post(handlers::uploads::upload))
        .route("/upload/public", post(handlers::uploads::upload_public));

    let mut app = api_routes
        .layer(DefaultBodyLimit::max(state.config.storage.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(request_id)
        .layer(propagate_id);

    if rate_limiting_enabled {
        let limit = state.config.rate_limit.requests_per_second;
        app = app.layer(axum::middleware::from_fn(move |request, next| {
            let limiter = rate_limiter.clone();
            async move {
                middleware::rate_limit::rate_limit_middleware(request, next, limiter, limit).await
            }
        }));
    }

    app.with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
