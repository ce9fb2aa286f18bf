pub mod error;
pub mod routes;
pub mod state;

use axum::{
    Router,
    http::HeaderValue,
    routing::{delete, get, post, put},
};
use state::AppState;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

pub fn build_router(state: AppState) -> Router {
    let cors = if state.settings.app.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = state
            .settings
            .app
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // User routes
    let user_routes = Router::new()
        .route("/", get(routes::user::list))
        .route("/", post(routes::user::create))
        .route("/{user_id}", get(routes::user::get))
        .route("/{user_id}", delete(routes::user::delete));

    // Notification routes
    let notification_routes = Router::new()
        .route("/", get(routes::notification::list))
        .route("/", post(routes::notification::create))
        .route(
            "/training-progress",
            post(routes::notification::training_progress),
        )
        .route(
            "/payment-reminder",
            post(routes::notification::payment_reminder),
        )
        .route(
            "/evaluation-due",
            post(routes::notification::evaluation_due),
        )
        .route("/unread-count", get(routes::notification::unread_count))
        .route("/read-all", put(routes::notification::mark_all_read))
        .route("/{notification_id}", get(routes::notification::get))
        .route(
            "/{notification_id}/read",
            put(routes::notification::mark_read),
        );

    // Compose API
    let api = Router::new()
        .nest("/user", user_routes)
        .nest("/notification", notification_routes);

    // Health check
    let health = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api)
        .merge(health)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
