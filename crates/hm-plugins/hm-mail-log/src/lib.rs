//! # hm-mail-log
//!
//! `Mailer` that writes each message to the structured log instead of an
//! SMTP relay, keeping a copy in memory so callers (and tests) can read
//! back what would have been sent.

use async_trait::async_trait;
use hm_core::models::OutgoingEmail;
use hm_core::traits::Mailer;
use std::sync::Mutex;
use tracing::info;

#[derive(Default)]
pub struct LogMailer {
    outbox: Mutex<Vec<OutgoingEmail>>,
}

impl LogMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything sent so far, oldest first.
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.outbox
            .lock()
            .map(|outbox| outbox.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: OutgoingEmail) -> anyhow::Result<()> {
        info!(
            to = %email.to,
            from = %email.from,
            reply_to = email.reply_to.as_deref().unwrap_or(""),
            subject = %email.subject,
            "outgoing email"
        );
        self.outbox
            .lock()
            .map_err(|_| anyhow::anyhow!("mail outbox lock poisoned"))?
            .push(email);
        Ok(())
    }
}
