use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::errors::AppError;
use crate::models::BookingRequest;
use crate::services::booking::submit_booking;
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedResponse {
    message: String,
    booking_id: String,
    notified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    whatsapp_url: Option<String>,
}

// POST /api/booking
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    body: Result<Json<BookingRequest>, JsonRejection>,
) -> Result<Json<CreatedResponse>, AppError> {
    let Json(request) = body?;
    let submission = submit_booking(&state, request).await?;

    Ok(Json(CreatedResponse {
        message: "Booking created successfully. Our team will contact you shortly.".to_string(),
        booking_id: submission.booking.id,
        notified: submission.notification.notified(),
        whatsapp_url: submission.notification.chat_link,
    }))
}
