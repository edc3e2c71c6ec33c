use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveTime, SubsecRound, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    pub service: Service,
    pub date: String,
    pub time: String,
    pub name: String,
    pub phone: String,
    pub email: String,
    #[serde(default)]
    pub notes: String,
    pub booked_at: DateTime<Utc>,
}

impl Booking {
    /// Assigns a fresh identifier and the current timestamp, truncated to
    /// microseconds so it survives a round trip through every store.
    pub fn create(new: NewBooking) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            service: new.service,
            date: new.date,
            time: new.time,
            name: new.name,
            phone: new.phone,
            email: new.email,
            notes: new.notes,
            booked_at: Utc::now().trunc_subsecs(6),
        }
    }

    pub fn slot(&self) -> Slot<'_> {
        Slot {
            service: self.service,
            date: &self.date,
            time: &self.time,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Service {
    #[serde(rename = "Post-surgery Recovery")]
    PostSurgeryRecovery,
    #[serde(rename = "Chronic Pain Relief")]
    ChronicPainRelief,
    #[serde(rename = "Sports Injury Rehab")]
    SportsInjuryRehab,
    #[serde(rename = "Physiotherapy Consultation")]
    PhysiotherapyConsultation,
}

impl Service {
    pub const ALL: [Service; 4] = [
        Service::PostSurgeryRecovery,
        Service::ChronicPainRelief,
        Service::SportsInjuryRehab,
        Service::PhysiotherapyConsultation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Service::PostSurgeryRecovery => "Post-surgery Recovery",
            Service::ChronicPainRelief => "Chronic Pain Relief",
            Service::SportsInjuryRehab => "Sports Injury Rehab",
            Service::PhysiotherapyConsultation => "Physiotherapy Consultation",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|svc| svc.as_str() == s)
    }
}

impl std::fmt::Display for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The (service, date, time) triple that must be unique across bookings.
/// Compared by exact string equality, which is why validation only admits
/// the zero-padded date and time forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot<'a> {
    pub service: Service,
    pub date: &'a str,
    pub time: &'a str,
}

impl Slot<'_> {
    pub fn matches(&self, booking: &Booking) -> bool {
        booking.slot() == *self
    }
}

/// Raw intake payload. Every field is optional so that a missing field
/// surfaces as a validation error instead of an extractor rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingRequest {
    pub service: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub notes: Option<String>,
}

/// A request that passed validation; all strings are trimmed.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub service: Service,
    pub date: String,
    pub time: String,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub notes: String,
}

impl NewBooking {
    pub fn slot(&self) -> Slot<'_> {
        Slot {
            service: self.service,
            date: &self.date,
            time: &self.time,
        }
    }
}

fn required(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

// Slots compare by exact string, so only the zero-padded form is accepted:
// the value must survive a parse/format round trip unchanged.
fn is_canonical_date(date: &str) -> bool {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .is_ok_and(|d| d.format("%Y-%m-%d").to_string() == date)
}

fn is_canonical_time(time: &str) -> bool {
    NaiveTime::parse_from_str(time, "%H:%M").is_ok_and(|t| t.format("%H:%M").to_string() == time)
}

impl BookingRequest {
    pub fn validate(&self) -> Result<NewBooking, AppError> {
        let fields = [
            ("service", self.service.as_deref()),
            ("date", self.date.as_deref()),
            ("time", self.time.as_deref()),
            ("name", self.name.as_deref()),
            ("phone", self.phone.as_deref()),
            ("email", self.email.as_deref()),
        ];

        let missing: Vec<&str> = fields
            .iter()
            .filter(|(_, v)| required(*v).is_none())
            .map(|(k, _)| *k)
            .collect();
        if !missing.is_empty() {
            return Err(AppError::Validation(format!(
                "Please fill in all required fields (missing: {})",
                missing.join(", ")
            )));
        }

        let [service, date, time, name, phone, email] =
            fields.map(|(_, v)| required(v).unwrap_or_default());

        let service = Service::parse(&service)
            .ok_or_else(|| AppError::Validation(format!("Unknown service: {service}")))?;

        if !is_canonical_date(&date) {
            return Err(AppError::Validation(format!(
                "Invalid date: {date} (expected YYYY-MM-DD)"
            )));
        }
        if !is_canonical_time(&time) {
            return Err(AppError::Validation(format!(
                "Invalid time: {time} (expected HH:MM)"
            )));
        }
        if !is_valid_email(&email) {
            return Err(AppError::Validation("Invalid email format".to_string()));
        }

        Ok(NewBooking {
            service,
            date,
            time,
            name,
            phone,
            email,
            notes: self
                .notes
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_string(),
        })
    }
}
