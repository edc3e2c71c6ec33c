use anyhow::Context;
use async_trait::async_trait;

use super::{MailMessage, MailTransport};
use crate::config::EmailSettings;

/// Posts messages as JSON to an HTTP mail relay, authenticating with the
/// sender address and secret.
pub struct HttpMailRelay {
    relay_url: String,
    username: String,
    secret: String,
    client: reqwest::Client,
}

impl HttpMailRelay {
    pub fn new(relay_url: String, username: String, secret: String) -> Self {
        Self {
            relay_url,
            username,
            secret,
            client: reqwest::Client::new(),
        }
    }

    pub fn from_settings(settings: &EmailSettings) -> Self {
        Self::new(
            settings.relay_url.clone(),
            settings.sender.clone(),
            settings.secret.clone(),
        )
    }
}

#[async_trait]
impl MailTransport for HttpMailRelay {
    async fn send_mail(&self, message: &MailMessage) -> anyhow::Result<()> {
        self.client
            .post(&self.relay_url)
            .basic_auth(&self.username, Some(&self.secret))
            .json(message)
            .send()
            .await
            .context("failed to reach mail relay")?
            .error_for_status()
            .context("mail relay returned error")?;

        Ok(())
    }
}
