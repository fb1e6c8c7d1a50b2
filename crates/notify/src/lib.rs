//! Reminder email rendering and delivery.
//!
//! This crate provides:
//! - `MailTransport` trait for pluggable outbound delivery
//! - SMTP transport via `lettre`, plus a logging transport for dry runs
//! - Minijinja rendering of the per-recipient reminder message
//! - `Dispatcher`, which sends one message per recipient group and records
//!   each outcome independently

pub mod dispatcher;
pub mod email;
pub mod log_transport;
pub mod templating;
pub mod traits;

pub use dispatcher::Dispatcher;
pub use email::SmtpMailer;
pub use log_transport::LogTransport;
pub use templating::TemplateRenderer;
pub use traits::{DeliveryOutcome, MailTransport, Notification, NotifyError};
