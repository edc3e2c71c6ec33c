pub mod admin;
pub mod booking;
pub mod health;
pub mod subscribe;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route(
            "/api/booking",
            post(booking::create_booking).get(admin::list_bookings),
        )
        .route("/api/booking/:id", get(admin::get_booking))
        .route("/api/subscribe", post(subscribe::subscribe))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
