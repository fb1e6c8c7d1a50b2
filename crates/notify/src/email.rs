//! SMTP transport via `lettre` with TLS support.
//!
//! Delivers rendered reminders as HTML emails through an SMTP relay.
//! Supports STARTTLS and implicit TLS connections.

use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use taskping_core::config::SmtpConfig;

use crate::traits::{MailTransport, Notification, NotifyError};

/// Port on which SMTP servers expect TLS from the first byte.
const IMPLICIT_TLS_PORT: u16 = 465;

/// Sends reminders as emails via SMTP.
#[derive(Debug)]
pub struct SmtpMailer {
    /// Async SMTP transport for sending emails.
    transport: AsyncSmtpTransport<Tokio1Executor>,
    /// Sender mailbox.
    from: Mailbox,
}

impl SmtpMailer {
    /// Build an `SmtpMailer` from SMTP configuration.
    ///
    /// Port 465 always uses implicit TLS. Any other port uses STARTTLS when
    /// `tls` is set, and a plaintext connection otherwise (local relays only).
    /// Credentials are attached when both username and password are configured.
    pub fn from_config(config: &SmtpConfig) -> Result<Self, NotifyError> {
        let from = parse_mailbox(&config.sender)?;

        let mut builder = if config.port == IMPLICIT_TLS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|e| NotifyError::Config(e.to_string()))?
                .port(config.port)
        } else if config.tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|e| NotifyError::Config(e.to_string()))?
                .port(config.port)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host).port(config.port)
        };

        if let Some((username, password)) = config.credentials() {
            builder = builder.credentials(Credentials::new(
                username.to_string(),
                password.to_string(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }

    fn build_message(&self, notification: &Notification) -> Result<Message, NotifyError> {
        Message::builder()
            .from(self.from.clone())
            .to(parse_mailbox(&notification.to)?)
            .subject(&notification.subject)
            .header(ContentType::TEXT_HTML)
            .body(notification.body.clone())
            .map_err(|e| NotifyError::Smtp(e.to_string()))
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, NotifyError> {
    address
        .parse()
        .map_err(|e: lettre::address::AddressError| NotifyError::Address {
            address: address.to_string(),
            reason: e.to_string(),
        })
}

#[async_trait::async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let email = self.build_message(notification)?;

        self.transport
            .send(email)
            .await
            .map_err(|e| NotifyError::Smtp(e.to_string()))?;

        tracing::debug!(
            transport = "smtp",
            recipient = %notification.to,
            subject = %notification.subject,
            "email accepted by relay"
        );

        Ok(())
    }

    /// Returns `"smtp"`.
    fn transport_name(&self) -> &str {
        "smtp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(port: u16, tls: bool) -> SmtpConfig {
        SmtpConfig {
            host: "smtp.example.com".to_string(),
            port,
            username: Some("mailer".to_string()),
            password: Some("secret".to_string()),
            tls,
            sender: "Tasks <tasks@example.com>".to_string(),
        }
    }

    fn notification(to: &str) -> Notification {
        Notification {
            to: to.to_string(),
            subject: "🔔 Task Notification: Report – Finance".to_string(),
            body: "<p>hello</p>".to_string(),
        }
    }

    #[test]
    fn parse_email_with_display_name() {
        let mb = parse_mailbox("Alice <alice@example.com>").unwrap();
        assert_eq!(mb.email.to_string(), "alice@example.com");
    }

    #[test]
    fn parse_invalid_email_address() {
        let err = parse_mailbox("not-an-email").unwrap_err();
        assert!(matches!(err, NotifyError::Address { .. }), "got: {err}");
    }

    #[test]
    fn from_config_starttls() {
        assert!(SmtpMailer::from_config(&config(587, true)).is_ok());
    }

    #[test]
    fn from_config_implicit_tls_port() {
        assert!(SmtpMailer::from_config(&config(465, true)).is_ok());
    }

    #[test]
    fn from_config_no_tls() {
        let mut cfg = config(25, false);
        cfg.username = None;
        cfg.password = None;
        assert!(SmtpMailer::from_config(&cfg).is_ok());
    }

    #[test]
    fn from_config_invalid_sender() {
        let mut cfg = config(587, true);
        cfg.sender = "bad-address".to_string();
        let err = SmtpMailer::from_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("bad-address"), "got: {err}");
    }

    #[test]
    fn message_is_html_and_addressed_to_recipient() {
        let mailer = SmtpMailer::from_config(&config(587, true)).unwrap();
        let message = mailer.build_message(&notification("alice@example.com")).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("To: alice@example.com"), "got: {raw}");
        assert!(raw.contains("Content-Type: text/html"), "got: {raw}");
    }

    #[test]
    fn bad_recipient_fails_before_sending() {
        let mailer = SmtpMailer::from_config(&config(587, true)).unwrap();
        assert!(mailer.build_message(&notification("nobody")).is_err());
    }

    #[test]
    fn transport_name_is_smtp() {
        let mailer = SmtpMailer::from_config(&config(587, true)).unwrap();
        assert_eq!(mailer.transport_name(), "smtp");
    }
}
