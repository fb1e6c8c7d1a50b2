//! Sends one reminder per recipient group.
//!
//! Each group is rendered and handed to the transport exactly once. Outcomes
//! are recorded per recipient; a failed render or send for one recipient
//! never stops delivery to the others.

use std::sync::Arc;
use std::time::Instant;

use taskping_core::config::WorkspaceConfig;
use taskping_core::{RecipientGroup, ReminderWindow, Task, TaskStatus};

use crate::templating::{ReminderContext, TemplateRenderer};
use crate::traits::{DeliveryOutcome, MailTransport, Notification, NotifyError};

pub struct Dispatcher {
    transport: Arc<dyn MailTransport>,
    renderer: TemplateRenderer,
    workspace: WorkspaceConfig,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn MailTransport>, workspace: WorkspaceConfig) -> Self {
        Self {
            transport,
            renderer: TemplateRenderer::new(),
            workspace,
        }
    }

    pub fn transport_name(&self) -> &str {
        self.transport.transport_name()
    }

    pub fn renderer(&self) -> &TemplateRenderer {
        &self.renderer
    }

    /// Render the message for one group without sending it.
    pub fn render(
        &self,
        group: &RecipientGroup,
        window: ReminderWindow,
    ) -> Result<Notification, NotifyError> {
        let ctx = ReminderContext::build(group, window, &self.workspace);
        let body = self.renderer.render(&ctx)?;
        Ok(Notification {
            to: group.recipient().to_string(),
            subject: ctx.heading,
            body,
        })
    }

    /// Render and send one group. Never retries.
    pub async fn dispatch(
        &self,
        group: &RecipientGroup,
        window: ReminderWindow,
    ) -> DeliveryOutcome {
        let start = Instant::now();
        let result = match self.render(group, window) {
            Ok(notification) => self.transport.send(&notification).await,
            Err(e) => Err(e),
        };
        let duration_ms = start.elapsed().as_millis() as u64;

        let (success, error) = match result {
            Ok(()) => {
                tracing::info!(
                    window = %window,
                    recipient = group.recipient(),
                    task_count = group.len(),
                    transport = self.transport_name(),
                    duration_ms,
                    "Reminder delivered"
                );
                (true, None)
            }
            Err(e) => {
                tracing::warn!(
                    window = %window,
                    recipient = group.recipient(),
                    task_count = group.len(),
                    transport = self.transport_name(),
                    error = %e,
                    duration_ms,
                    "Reminder delivery failed"
                );
                (false, Some(e.to_string()))
            }
        };

        DeliveryOutcome {
            recipient: group.recipient().to_string(),
            task_count: group.len(),
            success,
            error,
            duration_ms,
        }
    }

    /// Dispatch every group in order, collecting one outcome per group.
    pub async fn dispatch_all(
        &self,
        groups: &[RecipientGroup],
        window: ReminderWindow,
    ) -> Vec<DeliveryOutcome> {
        let mut outcomes = Vec::with_capacity(groups.len());
        for group in groups {
            outcomes.push(self.dispatch(group, window).await);
        }
        outcomes
    }

    /// Send a sample reminder to check the transport end to end.
    pub async fn send_test(&self, recipient: &str, window: ReminderWindow) -> DeliveryOutcome {
        let sample = Task {
            id: "test-reminder".to_string(),
            title: "Reminder service is running".to_string(),
            description: "<p>This is a test message from the task reminder service.</p>"
                .to_string(),
            status: TaskStatus::Assigned,
            project_id: "test".to_string(),
            start_date: None,
            end_date: None,
            budget: 0.0,
            project_title: self.workspace.name.clone(),
            assignee_name: String::new(),
            assignee_email: recipient.to_string(),
            assignor_name: "System".to_string(),
        };
        match RecipientGroup::new(recipient, vec![sample]) {
            Some(group) => self.dispatch(&group, window).await,
            None => DeliveryOutcome {
                recipient: recipient.to_string(),
                task_count: 0,
                success: false,
                error: Some("empty sample group".to_string()),
                duration_ms: 0,
            },
        }
    }
}
