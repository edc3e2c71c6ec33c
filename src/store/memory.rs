use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{newest_first, BookingStore, StoreError};
use crate::models::{Booking, Slot};

/// Process-local store. Contents vanish on restart.
#[derive(Default)]
pub struct MemoryStore {
    bookings: RwLock<Vec<Booking>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn insert(&self, booking: &Booking) -> Result<(), StoreError> {
        let mut bookings = self.bookings.write().await;
        let slot = booking.slot();
        if bookings.iter().any(|b| slot.matches(b)) {
            return Err(StoreError::Duplicate);
        }
        bookings.push(booking.clone());
        Ok(())
    }

    async fn find_by_slot(&self, slot: &Slot<'_>) -> Result<Option<Booking>, StoreError> {
        let bookings = self.bookings.read().await;
        Ok(bookings.iter().find(|b| slot.matches(b)).cloned())
    }

    async fn get(&self, id: &str) -> Result<Option<Booking>, StoreError> {
        let bookings = self.bookings.read().await;
        Ok(bookings.iter().find(|b| b.id == id).cloned())
    }

    async fn list(&self) -> Result<Vec<Booking>, StoreError> {
        let bookings = self.bookings.read().await;
        Ok(newest_first(&bookings))
    }
}
