use std::time::Duration;

use chrono::Utc;
use serde::Serialize;

use crate::config::{AppConfig, ClinicInfo};
use crate::models::Booking;
use crate::services::messaging::relay::HttpMailRelay;
use crate::services::messaging::{MailMessage, MailTransport};
use crate::services::templates::{self, Rendered};
use crate::services::whatsapp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyOutcome {
    Sent,
    Skipped,
    Failed,
}

/// Per-channel result of notifying about one booking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationReport {
    pub email: NotifyOutcome,
    pub chat_link: Option<String>,
}

impl NotificationReport {
    pub fn notified(&self) -> bool {
        self.email == NotifyOutcome::Sent
    }
}

struct EmailChannel {
    transport: Box<dyn MailTransport>,
    sender: String,
    staff_address: String,
}

pub struct Notifier {
    email: Option<EmailChannel>,
    clinic: ClinicInfo,
    timeout: Duration,
}

impl Notifier {
    pub fn from_config(config: &AppConfig) -> Self {
        let mut notifier = Self::disabled(config.clinic.clone(), config.notify_timeout);
        if let Some(settings) = &config.email {
            tracing::info!(relay = %settings.relay_url, "email notifications enabled");
            notifier.email = Some(EmailChannel {
                transport: Box::new(HttpMailRelay::from_settings(settings)),
                sender: settings.sender.clone(),
                staff_address: settings.staff_address.clone(),
            });
        }
        notifier
    }

    /// A notifier whose email channel is off; `notify` reports `Skipped`.
    pub fn disabled(clinic: ClinicInfo, timeout: Duration) -> Self {
        Self {
            email: None,
            clinic,
            timeout,
        }
    }

    pub fn with_transport(
        transport: Box<dyn MailTransport>,
        sender: String,
        staff_address: String,
        clinic: ClinicInfo,
        timeout: Duration,
    ) -> Self {
        Self {
            email: Some(EmailChannel {
                transport,
                sender,
                staff_address,
            }),
            clinic,
            timeout,
        }
    }

    /// Best-effort: never returns an error. The requester confirmation and the
    /// staff alert are dispatched concurrently; either failing yields `Failed`.
    pub async fn notify(&self, booking: &Booking) -> NotificationReport {
        let chat_link = self
            .clinic
            .whatsapp_number
            .as_deref()
            .and_then(|number| whatsapp::chat_link(number, booking));

        let Some(channel) = &self.email else {
            tracing::debug!(booking_id = %booking.id, "email channel not configured, skipping");
            return NotificationReport {
                email: NotifyOutcome::Skipped,
                chat_link,
            };
        };

        let to_requester = channel.message(
            &booking.email,
            templates::requester_confirmation(booking, &self.clinic),
        );
        let to_staff = channel.message(&channel.staff_address, templates::staff_alert(booking));

        let (requester, staff) = tokio::join!(
            self.dispatch(channel, &to_requester),
            self.dispatch(channel, &to_staff),
        );

        let email = if requester && staff {
            tracing::info!(booking_id = %booking.id, "booking notifications sent");
            NotifyOutcome::Sent
        } else {
            tracing::warn!(
                booking_id = %booking.id,
                requester_sent = requester,
                staff_sent = staff,
                "booking notification failed"
            );
            NotifyOutcome::Failed
        };

        NotificationReport { email, chat_link }
    }

    pub async fn notify_subscription(&self, email: &str) -> NotifyOutcome {
        let Some(channel) = &self.email else {
            return NotifyOutcome::Skipped;
        };

        let message = channel.message(
            &channel.staff_address,
            templates::subscription_alert(email, Utc::now(), &self.clinic),
        );
        if self.dispatch(channel, &message).await {
            NotifyOutcome::Sent
        } else {
            NotifyOutcome::Failed
        }
    }

    async fn dispatch(&self, channel: &EmailChannel, message: &MailMessage) -> bool {
        match tokio::time::timeout(self.timeout, channel.transport.send_mail(message)).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                tracing::warn!(to = %message.to, error = %e, "failed to send email");
                false
            }
            Err(_) => {
                tracing::warn!(to = %message.to, timeout = ?self.timeout, "email dispatch timed out");
                false
            }
        }
    }
}

impl EmailChannel {
    fn message(&self, to: &str, rendered: Rendered) -> MailMessage {
        MailMessage {
            from: self.sender.clone(),
            to: to.to_string(),
            subject: rendered.subject,
            html: rendered.html,
        }
    }
}
