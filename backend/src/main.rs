use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
};
use axum::http::{HeaderValue, Method};
use daymatch::db::{
    DatabaseConfig, PgAttractionStore, PgDateStore, PgLedgerStore, PgUserDirectory, get_db_pool,
};
use daymatch::handlers::{self, AppState};
use daymatch::ports::NotificationPort;
use daymatch::services::{
    AttractionMatcher, DateScheduler, LogOnlyNotifier, PushGatewayNotifier, TokenLedger,
};
use daymatch::{Config, PgPool, utils};
use tower_http::cors::{Any, CorsLayer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    utils::init_logging();

    let config = Config::from_env()?;
    let db_config = DatabaseConfig::from_env()?;
    let pool = get_db_pool(&db_config).await?;

    // Run migrations
    daymatch::db::migrations::run_migrations(&pool).await?;

    let port = config.port;
    let app = create_router(pool, config);

    let listener = tokio::net::TcpListener::bind(&format!("0.0.0.0:{}", port)).await?;
    tracing::info!("Server running on port {}", port);

    axum::serve(listener, app).await?;

    Ok(())
}

fn create_router(pool: PgPool, config: Config) -> Router {
    let cors_layer = create_cors_layer(&config);
    let state = build_state(pool, &config);

    Router::new()
        .route("/health", get(health_check))
        // Users & tokens
        .route("/api/users", post(handlers::create_user))
        .route("/api/users/{user_id}/balance", get(handlers::get_balance))
        .route(
            "/api/users/{user_id}/transactions",
            get(handlers::list_transactions),
        )
        .route(
            "/api/users/{user_id}/purchases",
            post(handlers::purchase_tokens),
        )
        // Attractions
        .route("/api/attractions", put(handlers::upsert_attraction))
        .route(
            "/api/attractions/{user_from}/{user_to}",
            get(handlers::list_attractions),
        )
        .route(
            "/api/attractions/{user_from}/{user_to}/{date}",
            get(handlers::get_attraction),
        )
        // Dates
        .route("/api/dates", post(handlers::propose_date))
        .route(
            "/api/dates/{id}",
            get(handlers::get_date).patch(handlers::update_date),
        )
        // Operator jobs
        .route(
            "/api/admin/replenish-tokens",
            post(handlers::replenish_all_users),
        )
        .layer(cors_layer)
        .with_state(state)
}

fn build_state(pool: PgPool, config: &Config) -> AppState {
    let users = Arc::new(PgUserDirectory::new(pool.clone()));
    let ledger = Arc::new(TokenLedger::new(
        Arc::new(PgLedgerStore::new(pool.clone())),
        users.clone(),
    ));

    let notifier: Arc<dyn NotificationPort> = match &config.push_gateway_url {
        Some(url) => Arc::new(PushGatewayNotifier::new(url.clone())),
        None => Arc::new(LogOnlyNotifier),
    };

    let matcher = Arc::new(AttractionMatcher::new(
        Arc::new(PgAttractionStore::new(pool.clone())),
        ledger.clone(),
        notifier,
    ));
    let scheduler = Arc::new(DateScheduler::new(Arc::new(PgDateStore::new(pool))));

    AppState {
        ledger,
        matcher,
        scheduler,
        users,
    }
}

fn create_cors_layer(_config: &Config) -> CorsLayer {
    let mut cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::OPTIONS])
        .allow_headers(Any)
        .allow_credentials(false);

    // Check if ALLOWED_ORIGINS environment variable is set for multiple domains
    if let Ok(cors_origins) = std::env::var("ALLOWED_ORIGINS") {
        let origins: Vec<HeaderValue> = cors_origins
            .split(',')
            .filter_map(|origin| {
                let trimmed = origin.trim();
                if !trimmed.is_empty() {
                    trimmed.parse().ok()
                } else {
                    None
                }
            })
            .collect();

        if !origins.is_empty() {
            cors = cors.allow_origin(origins);
        } else {
            // Fallback to permissive if parsing fails
            cors = cors.allow_origin(Any);
        }
    } else {
        // Default to permissive for development
        cors = cors.allow_origin(Any);
    }

    cors
}

async fn health_check() -> &'static str {
    "OK"
}
