use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::booking::is_valid_email;
use crate::services::notification::NotifyOutcome;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SubscribeRequest {
    pub email: Option<String>,
}

// POST /api/subscribe
pub async fn subscribe(
    State(state): State<Arc<AppState>>,
    body: Result<Json<SubscribeRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, AppError> {
    let Json(payload) = body?;
    let email = payload.email.as_deref().map(str::trim).unwrap_or_default();
    if email.is_empty() {
        return Err(AppError::Validation("Email is required".to_string()));
    }
    if !is_valid_email(email) {
        return Err(AppError::Validation("Invalid email format".to_string()));
    }

    match state.notifier.notify_subscription(email).await {
        NotifyOutcome::Sent => tracing::info!(email = %email, "newsletter subscription"),
        NotifyOutcome::Skipped => {
            tracing::warn!(email = %email, "newsletter subscription received but email channel is off")
        }
        NotifyOutcome::Failed => {
            return Err(AppError::Notification(
                "could not deliver subscription".to_string(),
            ))
        }
    }

    Ok(Json(serde_json::json!({ "message": "Subscription successful" })))
}
