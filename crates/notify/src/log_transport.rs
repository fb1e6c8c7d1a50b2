//! Transport that logs rendered reminders instead of sending them.

use crate::traits::{MailTransport, Notification, NotifyError};

#[derive(Debug, Default)]
pub struct LogTransport;

#[async_trait::async_trait]
impl MailTransport for LogTransport {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        tracing::info!(
            transport = "log",
            recipient = %notification.to,
            subject = %notification.subject,
            body_bytes = notification.body.len(),
            "dry run: reminder not sent"
        );
        tracing::debug!(recipient = %notification.to, body = %notification.body, "dry run body");
        Ok(())
    }

    fn transport_name(&self) -> &str {
        "log"
    }
}
