pub mod file;
pub mod memory;
pub mod sqlite;

use async_trait::async_trait;

use crate::models::{Booking, Slot};

pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Another booking already holds the slot.
    #[error("slot already booked")]
    Duplicate,

    #[error("insert was not acknowledged")]
    NotAcknowledged,

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Persistence for booking records. Every implementation rejects an insert
/// whose slot is already taken with [`StoreError::Duplicate`], checked
/// atomically with the write.
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn insert(&self, booking: &Booking) -> Result<(), StoreError>;

    async fn find_by_slot(&self, slot: &Slot<'_>) -> Result<Option<Booking>, StoreError>;

    async fn get(&self, id: &str) -> Result<Option<Booking>, StoreError>;

    /// All bookings, newest `booked_at` first.
    async fn list(&self) -> Result<Vec<Booking>, StoreError>;
}

/// Newest first; equal timestamps keep the most recently inserted first.
/// Expects `bookings` in insertion order.
pub(crate) fn newest_first(bookings: &[Booking]) -> Vec<Booking> {
    let mut out: Vec<Booking> = bookings.iter().rev().cloned().collect();
    out.sort_by(|a, b| b.booked_at.cmp(&a.booked_at));
    out
}
