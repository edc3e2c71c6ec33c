use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use async_trait::async_trait;
use rusqlite::{Connection, ErrorCode};

use super::{BookingStore, StoreError};
use crate::db::queries;
use crate::models::{Booking, Slot};

/// SQLite-backed store. Slot uniqueness is enforced by the table's
/// `UNIQUE (service, date, time)` index, so concurrent inserts for one slot
/// cannot both succeed.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    pub fn open(path: &str) -> anyhow::Result<Self> {
        Ok(Self::new(crate::db::init_db(path)?))
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || -> Result<T, StoreError> {
            let db = conn
                .lock()
                .map_err(|_| anyhow!("database mutex poisoned"))?;
            f(&db)
        })
        .await
        .map_err(|e| anyhow!("database task failed: {e}"))?
    }
}

#[async_trait]
impl BookingStore for SqliteStore {
    async fn insert(&self, booking: &Booking) -> Result<(), StoreError> {
        let booking = booking.clone();
        self.with_conn(move |db| match queries::insert_booking(db, &booking) {
            Ok(0) => Err(StoreError::NotAcknowledged),
            Ok(_) => Ok(()),
            Err(e) if e.sqlite_error_code() == Some(ErrorCode::ConstraintViolation) => {
                Err(StoreError::Duplicate)
            }
            Err(e) => Err(e.into()),
        })
        .await
    }

    async fn find_by_slot(&self, slot: &Slot<'_>) -> Result<Option<Booking>, StoreError> {
        let (service, date, time) = (slot.service, slot.date.to_string(), slot.time.to_string());
        self.with_conn(move |db| {
            let slot = Slot {
                service,
                date: &date,
                time: &time,
            };
            Ok(queries::find_booking_by_slot(db, &slot)?)
        })
        .await
    }

    async fn get(&self, id: &str) -> Result<Option<Booking>, StoreError> {
        let id = id.to_string();
        self.with_conn(move |db| Ok(queries::get_booking_by_id(db, &id)?))
            .await
    }

    async fn list(&self) -> Result<Vec<Booking>, StoreError> {
        self.with_conn(|db| Ok(queries::list_bookings(db)?)).await
    }
}
