use crate::handlers::{fulfillments, health, intents};
use crate::state::AppState;
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Builds the full Router, per §6's endpoint list plus the ambient
/// `/health/live`, `/health/ready` split (grounded in the teacher's
/// `solver_service::api::create_app`).
pub fn build_router(state: AppState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/api/v1/health", get(health::health))
        .route("/health/live", get(health::live))
        .route("/health/ready", get(health::ready))
        .route("/api/v1/intents", get(intents::list_intents).post(intents::create_intent))
        .route("/api/v1/intents/{id}", get(intents::get_intent))
        .route("/api/v1/intents/sender/{addr}", get(intents::list_intents_by_sender))
        .route("/api/v1/intents/recipient/{addr}", get(intents::list_intents_by_recipient))
        .route("/api/v1/fulfillments", get(fulfillments::list_fulfillments))
        .route("/api/v1/fulfillments/{id}", get(fulfillments::get_fulfillment))
        .with_state(state)
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    if allowed_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<axum::http::HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    CorsLayer::new().allow_origin(origins)
}
