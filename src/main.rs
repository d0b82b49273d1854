use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use recherche_api::middleware::auth::auth_context;
use recherche_api::middleware::AuthContext;
use recherche_api::{config, database, handlers};

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let cfg = config::config();
    tracing::info!("Starting Recherche API in {:?} mode", cfg.environment);

    let app = app();

    // Allow tests or deployments to override port via env
    let port = std::env::var("API_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("Recherche API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}

fn app() -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(resource_routes())
        .route("/export-data", post(handlers::export::export))
        .route("/stats-dashboard", get(handlers::stats::dashboard))
        // Resolve the bearer token once per request; CORS answers preflight.
        .layer(axum::middleware::from_fn(auth_context))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn resource_routes() -> Router {
    use handlers::{centres, chercheurs, provinces, publications};

    Router::new()
        .route(
            "/chercheurs-api",
            get(chercheurs::list)
                .post(chercheurs::create)
                .put(chercheurs::update)
                .delete(chercheurs::remove),
        )
        .route("/chercheurs-api/:id", get(chercheurs::get_one))
        .route(
            "/publications-api",
            get(publications::list)
                .post(publications::create)
                .put(publications::update)
                .delete(publications::remove),
        )
        .route("/publications-api/:id", get(publications::get_one))
        .route(
            "/centres-api",
            get(centres::list)
                .post(centres::create)
                .put(centres::update)
                .delete(centres::remove),
        )
        .route("/centres-api/:id", get(centres::get_one))
        .route(
            "/provinces-api",
            get(provinces::list)
                .post(provinces::create)
                .put(provinces::update)
                .delete(provinces::remove),
        )
        .route("/provinces-api/:id", get(provinces::get_one))
}

async fn root(Extension(ctx): Extension<AuthContext>) -> Json<Value> {
    Json(json!({
        "name": "recherche-api",
        "version": env!("CARGO_PKG_VERSION"),
        "authenticated": ctx.user().is_some(),
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    match database::health_check().await {
        Ok(()) => (
            axum::http::StatusCode::OK,
            Json(json!({ "status": "ok", "database": "up" })),
        ),
        Err(e) => {
            tracing::warn!("health check failed: {}", e);
            (
                axum::http::StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "degraded", "database": "down" })),
            )
        }
    }
}
