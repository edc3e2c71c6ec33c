use std::future::Future;
use std::time::Duration;

use crate::errors::AppError;
use crate::models::{Booking, BookingRequest};
use crate::services::notification::NotificationReport;
use crate::state::AppState;
use crate::store::StoreError;

/// Outcome of a successful submission. The booking is committed whatever
/// `notification` says.
#[derive(Debug)]
pub struct Submission {
    pub booking: Booking,
    pub notification: NotificationReport,
}

async fn bounded<T>(
    limit: Duration,
    op: impl Future<Output = Result<T, StoreError>>,
) -> Result<T, StoreError> {
    tokio::time::timeout(limit, op)
        .await
        .map_err(|_| StoreError::Other(anyhow::anyhow!("store access timed out after {limit:?}")))?
}

/// Validate, reject occupied slots, persist, then notify.
pub async fn submit_booking(
    state: &AppState,
    request: BookingRequest,
) -> Result<Submission, AppError> {
    let new = request.validate()?;

    if let Some(existing) = bounded(state.store_timeout, state.store.find_by_slot(&new.slot())).await? {
        tracing::info!(
            service = %new.service,
            date = %new.date,
            time = %new.time,
            existing_id = %existing.id,
            "slot already booked"
        );
        return Err(AppError::Conflict);
    }

    let booking = Booking::create(new);

    match bounded(state.store_timeout, state.store.insert(&booking)).await {
        Ok(()) => {}
        // lost the race to a concurrent submission for the same slot
        Err(StoreError::Duplicate) => {
            tracing::info!(booking_id = %booking.id, "slot taken during insert");
            return Err(AppError::Conflict);
        }
        Err(e) => return Err(AppError::Persistence(e.to_string())),
    }

    tracing::info!(
        booking_id = %booking.id,
        service = %booking.service,
        date = %booking.date,
        time = %booking.time,
        "booking created"
    );

    let notification = state.notifier.notify(&booking).await;

    Ok(Submission {
        booking,
        notification,
    })
}

pub async fn list_bookings(state: &AppState) -> Result<Vec<Booking>, AppError> {
    Ok(bounded(state.store_timeout, state.store.list()).await?)
}

pub async fn get_booking(state: &AppState, id: &str) -> Result<Booking, AppError> {
    bounded(state.store_timeout, state.store.get(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("booking {id}")))
}
