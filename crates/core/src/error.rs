use thiserror::Error;

/// Startup configuration problems. Any of these terminates the process.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting: {0}")]
    Missing(String),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: String, reason: String },

    #[error("invalid reminder window '{0}': expected 'Nd', 'N' or 'overdue'")]
    InvalidWindow(String),

    #[error(
        "horizon of {0} days is out of range (0..={max})",
        max = crate::window::MAX_HORIZON_DAYS
    )]
    HorizonOutOfRange(u32),
}

impl ConfigError {
    pub fn invalid(key: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

/// A task row whose contents cannot be mapped onto the domain model.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskDecodeError {
    #[error("unknown task status '{0}'")]
    UnknownStatus(String),

    #[error("column '{0}' is NULL")]
    MissingColumn(&'static str),
}
