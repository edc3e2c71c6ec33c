use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{newest_first, BookingStore, StoreError};
use crate::models::{Booking, Slot};

/// Bookings kept as a JSON array in a single file.
///
/// The slot check and the write happen under one lock, which serializes
/// writers inside this process only. Two processes pointed at the same file
/// can still race; use [`super::SqliteStore`] for that deployment.
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> Result<Vec<Booking>, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(vec![]),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(vec![]),
            Err(e) => Err(e.into()),
        }
    }

    // Write-then-rename so readers never observe a half-written file.
    async fn save(&self, bookings: &[Booking]) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(bookings)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl BookingStore for JsonFileStore {
    async fn insert(&self, booking: &Booking) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut bookings = self.load().await?;
        let slot = booking.slot();
        if bookings.iter().any(|b| slot.matches(b)) {
            return Err(StoreError::Duplicate);
        }
        bookings.push(booking.clone());
        self.save(&bookings).await
    }

    async fn find_by_slot(&self, slot: &Slot<'_>) -> Result<Option<Booking>, StoreError> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.into_iter().find(|b| slot.matches(b)))
    }

    async fn get(&self, id: &str) -> Result<Option<Booking>, StoreError> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.into_iter().find(|b| b.id == id))
    }

    async fn list(&self) -> Result<Vec<Booking>, StoreError> {
        let _guard = self.lock.lock().await;
        Ok(newest_first(&self.load().await?))
    }
}
