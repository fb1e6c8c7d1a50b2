use std::collections::HashMap;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::window::ReminderWindow;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

/// Where settings come from. The process environment in production, a map in tests.
pub trait SettingSource {
    fn get(&self, key: &str) -> Option<String>;
}

/// Reads `std::env`.
pub struct ProcessEnv;

impl SettingSource for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        env::var(key).ok()
    }
}

impl SettingSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

/// Profile-aware lookups: tries `{PROFILE}_{KEY}` first, falls back to `{KEY}`.
struct Settings<'a> {
    source: &'a dyn SettingSource,
    profile: String,
}

impl Settings<'_> {
    fn opt(&self, key: &str) -> Option<String> {
        if !self.profile.is_empty() {
            let prefixed = format!("{}_{}", self.profile, key);
            if let Some(v) = self.source.get(&prefixed).filter(|s| !s.is_empty()) {
                return Some(v);
            }
        }
        self.source.get(key).filter(|s| !s.is_empty())
    }

    fn or(&self, key: &str, default: &str) -> String {
        self.opt(key).unwrap_or_else(|| default.to_string())
    }

    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.opt(key).ok_or_else(|| ConfigError::Missing(key.to_string()))
    }

    fn parsed<T: FromStr>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T::Err: std::fmt::Display,
    {
        match self.opt(key) {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::invalid(key, e.to_string())),
            None => Ok(default),
        }
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub postgres: PostgresConfig,
    pub smtp: SmtpConfig,
    pub schedule: ScheduleConfig,
    pub workspace: WorkspaceConfig,
}

impl Config {
    /// Build and validate config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `TASKPING_PROFILE`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(&ProcessEnv)
    }

    pub fn from_source(source: &dyn SettingSource) -> Result<Self, ConfigError> {
        let profile = source
            .get("TASKPING_PROFILE")
            .unwrap_or_default()
            .trim()
            .to_uppercase();
        let s = Settings { source, profile };
        Ok(Self {
            postgres: PostgresConfig::from_settings(&s)?,
            smtp: SmtpConfig::from_settings(&s)?,
            schedule: ScheduleConfig::from_settings(&s)?,
            workspace: WorkspaceConfig::from_settings(&s),
            profile: s.profile,
        })
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() {
            "default"
        } else {
            &self.profile
        }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  postgres:  host={}, port={}, db={}, user={}",
            self.postgres.host, self.postgres.port, self.postgres.database, self.postgres.username
        );
        tracing::info!(
            "  smtp:      host={}, port={}, sender={}, auth={}",
            self.smtp.host, self.smtp.port, self.smtp.sender, self.smtp.credentials().is_some()
        );
        for entry in &self.schedule.entries {
            tracing::info!("  schedule:  {} reminders at '{}'", entry.window, entry.cron);
        }
        tracing::info!("  workspace: {} ({})", self.workspace.name, self.workspace.url);
    }
}

// ── PostgreSQL ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: Option<String>,
    pub ssl_mode: String,
    pub max_connections: u32,
    /// Connection attempts before giving up at startup.
    pub connect_attempts: u32,
    /// Delay step; attempt `n` waits `n * step` before retrying.
    pub connect_backoff_secs: u64,
}

impl PostgresConfig {
    fn from_settings(s: &Settings<'_>) -> Result<Self, ConfigError> {
        let connect_attempts = s.parsed("DB_CONNECT_ATTEMPTS", 5u32)?;
        if connect_attempts == 0 {
            return Err(ConfigError::invalid("DB_CONNECT_ATTEMPTS", "must be at least 1"));
        }
        Ok(Self {
            host: s.or("DB_HOST", "localhost"),
            port: s.parsed("DB_PORT", 5432)?,
            database: s.or("DB_NAME", "tasks"),
            username: s.required("DB_USER")?,
            password: s.opt("DB_PASSWORD"),
            ssl_mode: s.or("DB_SSL_MODE", "prefer"),
            max_connections: s.parsed("DB_MAX_CONNECTIONS", 5)?,
            connect_attempts,
            connect_backoff_secs: s.parsed("DB_CONNECT_BACKOFF_SECS", 2)?,
        })
    }

    pub fn connect_backoff(&self) -> Duration {
        Duration::from_secs(self.connect_backoff_secs)
    }
}

// ── SMTP ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// STARTTLS on anything but 465, which always uses implicit TLS.
    pub tls: bool,
    /// `From` mailbox, e.g. `"Tasks <tasks@example.com>"`.
    pub sender: String,
}

impl SmtpConfig {
    fn from_settings(s: &Settings<'_>) -> Result<Self, ConfigError> {
        let username = s.opt("SMTP_USER");
        let password = s.opt("SMTP_PASS");
        if username.is_some() != password.is_some() {
            return Err(ConfigError::invalid(
                "SMTP_USER/SMTP_PASS",
                "set both or neither",
            ));
        }
        Ok(Self {
            host: s.required("SMTP_HOST")?,
            port: s.parsed("SMTP_PORT", 587)?,
            username,
            password,
            tls: s.parsed("SMTP_TLS", true)?,
            sender: s.required("EMAIL_SENDER")?,
        })
    }

    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.username, &self.password) {
            (Some(u), Some(p)) => Some((u.as_str(), p.as_str())),
            _ => None,
        }
    }
}

// ── Schedule ──────────────────────────────────────────────────

pub const DEFAULT_SCHEDULE: &str = "3d@0 9 * * *;2d@0 14 * * *;1d@0 16 * * *";

/// One `(window, cron)` pair from `REMINDER_SCHEDULE`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSpec {
    pub window: ReminderWindow,
    /// 5- or 6-field cron expression, as written.
    pub cron: String,
}

#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    pub entries: Vec<ScheduleSpec>,
    /// Offset used for cron evaluation and for "today".
    pub utc_offset: FixedOffset,
    pub tick_secs: u64,
    pub startup_test_recipient: Option<String>,
}

impl ScheduleConfig {
    fn from_settings(s: &Settings<'_>) -> Result<Self, ConfigError> {
        let tick_secs = s.parsed("SCHEDULER_TICK_SECS", 30u64)?;
        if tick_secs == 0 {
            return Err(ConfigError::invalid("SCHEDULER_TICK_SECS", "must be at least 1"));
        }
        Ok(Self {
            entries: parse_schedule(&s.or("REMINDER_SCHEDULE", DEFAULT_SCHEDULE))?,
            utc_offset: parse_utc_offset(&s.or("REMINDER_UTC_OFFSET", "+00:00"))?,
            tick_secs,
            startup_test_recipient: s.opt("STARTUP_TEST_RECIPIENT"),
        })
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_secs)
    }
}

/// Parse `window@cron` pairs separated by `;`.
///
/// Cron syntax itself is checked later, when the scheduler compiles each expression.
pub fn parse_schedule(raw: &str) -> Result<Vec<ScheduleSpec>, ConfigError> {
    let mut entries = Vec::new();
    for part in raw.split(';').map(str::trim).filter(|p| !p.is_empty()) {
        let (window, cron) = part.split_once('@').ok_or_else(|| {
            ConfigError::invalid("REMINDER_SCHEDULE", format!("'{part}' is not 'window@cron'"))
        })?;
        let cron = cron.trim();
        if cron.is_empty() {
            return Err(ConfigError::invalid(
                "REMINDER_SCHEDULE",
                format!("'{part}' has an empty cron expression"),
            ));
        }
        entries.push(ScheduleSpec {
            window: window.parse()?,
            cron: cron.to_string(),
        });
    }
    if entries.is_empty() {
        return Err(ConfigError::invalid("REMINDER_SCHEDULE", "no entries"));
    }
    Ok(entries)
}

/// Parse `+HH:MM`, `-HH:MM`, `+HH` or `Z`.
pub fn parse_utc_offset(raw: &str) -> Result<FixedOffset, ConfigError> {
    let invalid = || ConfigError::invalid("REMINDER_UTC_OFFSET", format!("'{raw}' is not +HH:MM"));
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("z") || trimmed.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0).ok_or_else(invalid);
    }

    let (sign, rest) = match trimmed.chars().next() {
        Some('+') => (1, &trimmed[1..]),
        Some('-') => (-1, &trimmed[1..]),
        _ => return Err(invalid()),
    };
    let (hours, minutes) = rest.split_once(':').unwrap_or((rest, "0"));
    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if hours > 14 || minutes >= 60 {
        return Err(invalid());
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

// ── Workspace branding ────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    pub name: String,
    /// Base URL; task links are `{url}/tasks/{id}`.
    pub url: String,
}

impl WorkspaceConfig {
    fn from_settings(s: &Settings<'_>) -> Self {
        Self {
            name: s.or("WORKSPACE_NAME", "Task Workspace"),
            url: s.or("WORKSPACE_URL", "http://localhost:3000").trim_end_matches('/').to_string(),
        }
    }
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            name: "Task Workspace".to_string(),
            url: "http://localhost:3000".to_string(),
        }
    }
}
