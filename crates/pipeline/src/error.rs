use taskping_core::ReminderWindow;

#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("invalid cron expression '{expression}' for {window} reminders: {reason}")]
    InvalidCron {
        window: ReminderWindow,
        expression: String,
        reason: String,
    },

    #[error("no reminder schedule configured")]
    Empty,
}
