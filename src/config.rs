use std::env;
use std::time::Duration;

#[derive(Clone, Debug, PartialEq)]
pub enum StoreBackend {
    Sqlite { path: String },
    File { path: String },
    Memory,
}

/// Credentials for the HTTP mail relay. Present only when every field is set.
#[derive(Clone, Debug)]
pub struct EmailSettings {
    pub sender: String,
    pub secret: String,
    pub staff_address: String,
    pub relay_url: String,
}

#[derive(Clone, Debug)]
pub struct ClinicInfo {
    pub name: String,
    pub phone: String,
    pub whatsapp_number: Option<String>,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub store: StoreBackend,
    pub admin_token: String,
    pub email: Option<EmailSettings>,
    pub clinic: ClinicInfo,
    pub store_timeout: Duration,
    pub notify_timeout: Duration,
}

fn var_or_empty(key: &str) -> String {
    env::var(key)
        .map(|v| v.trim().to_string())
        .unwrap_or_default()
}

/// Default bound on one store call. Kept above [`crate::db::BUSY_TIMEOUT`] so a
/// write waiting on the SQLite lock resolves before the caller gives up on it.
pub const DEFAULT_STORE_TIMEOUT_SECS: u64 = 10;

fn secs(key: &str, default: u64) -> Duration {
    Duration::from_secs(
        env::var(key)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default),
    )
}

impl AppConfig {
    pub fn from_env() -> Self {
        let store = match var_or_empty("STORE_BACKEND").as_str() {
            "file" => StoreBackend::File {
                path: env::var("BOOKINGS_FILE").unwrap_or_else(|_| "bookings.json".to_string()),
            },
            "memory" => StoreBackend::Memory,
            _ => StoreBackend::Sqlite {
                path: env::var("DATABASE_URL").unwrap_or_else(|_| "bookings.db".to_string()),
            },
        };

        let email = EmailSettings::resolve(
            var_or_empty("EMAIL_USER"),
            var_or_empty("EMAIL_PASS"),
            var_or_empty("EMAIL_TO"),
            var_or_empty("MAIL_RELAY_URL"),
        );
        if email.is_none() {
            tracing::warn!("email relay not fully configured, booking emails will be skipped");
        }

        let whatsapp = var_or_empty("CLINIC_WHATSAPP");

        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            store,
            admin_token: var_or_empty("ADMIN_TOKEN"),
            email,
            clinic: ClinicInfo {
                name: env::var("CLINIC_NAME")
                    .unwrap_or_else(|_| "Advika Physiotherapy Clinic".to_string()),
                phone: env::var("CLINIC_PHONE").unwrap_or_else(|_| "+91 80055 86588".to_string()),
                whatsapp_number: (!whatsapp.is_empty()).then_some(whatsapp),
            },
            store_timeout: secs("STORE_TIMEOUT_SECS", DEFAULT_STORE_TIMEOUT_SECS),
            notify_timeout: secs("NOTIFY_TIMEOUT_SECS", 10),
        }
    }
}

impl EmailSettings {
    /// Returns `None` (channel disabled) unless all four values are non-empty.
    pub fn resolve(
        sender: String,
        secret: String,
        staff_address: String,
        relay_url: String,
    ) -> Option<Self> {
        if [&sender, &secret, &staff_address, &relay_url]
            .iter()
            .any(|v| v.is_empty())
        {
            return None;
        }
        Some(Self {
            sender,
            secret,
            staff_address,
            relay_url,
        })
    }
}
