use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;

use crate::errors::AppError;
use crate::models::Booking;
use crate::services::booking;
use crate::state::AppState;

fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    if expected_token.is_empty() {
        return Ok(());
    }

    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

#[derive(Serialize)]
pub struct BookingsResponse {
    bookings: Vec<Booking>,
    count: usize,
}

// GET /api/booking
pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<BookingsResponse>, AppError> {
    check_auth(&headers, &state.admin_token)?;

    let bookings = booking::list_bookings(&state).await?;
    Ok(Json(BookingsResponse {
        count: bookings.len(),
        bookings,
    }))
}

// GET /api/booking/:id
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Booking>, AppError> {
    check_auth(&headers, &state.admin_token)?;

    Ok(Json(booking::get_booking(&state, &id).await?))
}
