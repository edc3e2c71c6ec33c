use std::sync::Arc;
use std::time::Duration;

use crate::services::notification::Notifier;
use crate::store::BookingStore;

pub struct AppState {
    pub store: Arc<dyn BookingStore>,
    pub notifier: Notifier,
    /// Bearer token for the read routes; empty leaves them open.
    pub admin_token: String,
    pub store_timeout: Duration,
}
