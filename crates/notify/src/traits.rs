//! Mail transport trait definition and shared error types.

/// Errors that can occur while rendering or delivering a reminder.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("SMTP delivery failed: {0}")]
    Smtp(String),

    #[error("Template rendering failed: {0}")]
    Template(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid address '{address}': {reason}")]
    Address { address: String, reason: String },
}

/// A rendered reminder ready for delivery to one recipient.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Notification {
    pub to: String,
    pub subject: String,
    /// HTML body.
    pub body: String,
}

/// Outbound delivery channel.
///
/// A transport performs exactly one delivery attempt per call; retry policy,
/// if any, belongs to the caller.
#[async_trait::async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;

    /// Human-readable name for this transport (e.g. `"smtp"`).
    fn transport_name(&self) -> &str;
}

/// Result of dispatching one recipient group.
#[derive(Debug, Clone)]
pub struct DeliveryOutcome {
    pub recipient: String,
    pub task_count: usize,
    pub success: bool,
    pub error: Option<String>,
    pub duration_ms: u64,
}

impl DeliveryOutcome {
    pub fn is_success(&self) -> bool {
        self.success
    }
}
