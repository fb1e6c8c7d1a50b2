//! Domain model, configuration and error types shared by every taskping crate.

pub mod clock;
pub mod config;
pub mod error;
pub mod task;
pub mod window;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Config;
pub use error::*;
pub use task::{RecipientGroup, Task, TaskStatus};
pub use window::{qualifies, DueFilter, Horizon, ReminderWindow};
