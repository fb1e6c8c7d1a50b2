//! Minijinja rendering for reminder messages.
//!
//! The message body comes from the bundled `templates/reminder.html`. Every
//! field is HTML auto-escaped except the task description, which is stored
//! as rich text by the tracker and inserted as-is. That field is trusted
//! input: a description containing markup or scripts reaches the recipient's
//! mail client unchanged.

use chrono::NaiveDateTime;
use serde::Serialize;

use taskping_core::config::WorkspaceConfig;
use taskping_core::{RecipientGroup, ReminderWindow, Task};

use crate::traits::NotifyError;

const REMINDER_TEMPLATE_NAME: &str = "reminder.html";
const REMINDER_TEMPLATE: &str = include_str!("../templates/reminder.html");

/// Shown in place of a due date when the task has none.
pub const DUE_DATE_NOT_SPECIFIED: &str = "Not specified";

const DUE_DATE_FORMAT: &str = "%B %-d, %Y at %H:%M";

/// One task entry as exposed to the template.
#[derive(Debug, Clone, Serialize)]
pub struct TaskEntry {
    pub id: String,
    pub title: String,
    pub project_title: String,
    /// Formatted due date or [`DUE_DATE_NOT_SPECIFIED`].
    pub due: String,
    pub assignor_name: String,
    pub status: String,
    /// Rich text, rendered without escaping.
    pub description: String,
    /// False for an empty or whitespace-only description.
    pub has_description: bool,
    pub url: String,
}

/// Everything the reminder template can reference.
#[derive(Debug, Clone, Serialize)]
pub struct ReminderContext {
    pub heading: String,
    pub intro: String,
    pub recipient_name: String,
    pub workspace_name: String,
    pub tasks: Vec<TaskEntry>,
}

impl ReminderContext {
    pub fn build(
        group: &RecipientGroup,
        window: ReminderWindow,
        workspace: &WorkspaceConfig,
    ) -> Self {
        let lead = group.lead_task();
        let recipient_name = if lead.assignee_name.trim().is_empty() {
            group.recipient().to_string()
        } else {
            lead.assignee_name.clone()
        };

        Self {
            heading: subject_for(lead, window),
            intro: intro_for(group.len(), window, &workspace.name),
            recipient_name,
            workspace_name: workspace.name.clone(),
            tasks: group
                .tasks()
                .iter()
                .map(|task| TaskEntry::build(task, workspace))
                .collect(),
        }
    }
}

impl TaskEntry {
    fn build(task: &Task, workspace: &WorkspaceConfig) -> Self {
        Self {
            id: task.id.clone(),
            title: task.title.clone(),
            project_title: task.project_title.clone(),
            due: format_due(task.end_date),
            assignor_name: task.assignor_name.clone(),
            status: task.status.to_string(),
            description: task.description.clone(),
            has_description: !task.description.trim().is_empty(),
            url: format!("{}/tasks/{}", workspace.url, task.id),
        }
    }
}

/// Format a due date, or the explicit "not specified" marker when absent.
pub fn format_due(end: Option<NaiveDateTime>) -> String {
    match end {
        Some(end) => end.format(DUE_DATE_FORMAT).to_string(),
        None => DUE_DATE_NOT_SPECIFIED.to_string(),
    }
}

/// Subject line, named after the first task in the group.
pub fn subject_for(lead: &Task, window: ReminderWindow) -> String {
    match window {
        ReminderWindow::Overdue => {
            format!("⚠️ Overdue Task: {} – {}", lead.title, lead.project_title)
        }
        ReminderWindow::DueWithin(_) => {
            format!("🔔 Task Notification: {} – {}", lead.title, lead.project_title)
        }
    }
}

fn intro_for(count: usize, window: ReminderWindow, workspace_name: &str) -> String {
    let tasks = if count == 1 {
        "1 task".to_string()
    } else {
        format!("{count} tasks")
    };
    match window {
        ReminderWindow::Overdue => {
            format!("You have {tasks} in {workspace_name} that are past their due date:")
        }
        ReminderWindow::DueWithin(h) if h.days() == 0 => {
            format!("You have {tasks} in {workspace_name} due today:")
        }
        ReminderWindow::DueWithin(h) => format!(
            "You have {tasks} in {workspace_name} due within the next {} day{}:",
            h.days(),
            if h.days() == 1 { "" } else { "s" }
        ),
    }
}

/// Renders reminder bodies using minijinja.
#[derive(Debug, Default)]
pub struct TemplateRenderer {
    _private: (),
}

impl TemplateRenderer {
    pub fn new() -> Self {
        Self { _private: () }
    }

    /// Build a configured environment with the bundled template and custom filters.
    ///
    /// The `.html` template name turns on HTML auto-escaping.
    fn build_env() -> Result<minijinja::Environment<'static>, NotifyError> {
        let mut env = minijinja::Environment::new();
        env.add_filter("lower", lower_filter);
        env.add_template(REMINDER_TEMPLATE_NAME, REMINDER_TEMPLATE)
            .map_err(|e| NotifyError::Template(e.to_string()))?;
        Ok(env)
    }

    /// Render the HTML body for a reminder.
    pub fn render(&self, ctx: &ReminderContext) -> Result<String, NotifyError> {
        let env = Self::build_env()?;
        let template = env
            .get_template(REMINDER_TEMPLATE_NAME)
            .map_err(|e| NotifyError::Template(e.to_string()))?;
        template
            .render(ctx)
            .map_err(|e| NotifyError::Template(e.to_string()))
    }

    /// Check that the bundled template parses. Called once at startup.
    pub fn validate(&self) -> Result<(), NotifyError> {
        Self::build_env().map(|_| ())
    }
}

/// Custom filter: lowercase a string.
fn lower_filter(value: String) -> String {
    value.to_lowercase()
}
