//! reminder-worker: scheduled task due-date reminders over SMTP.
//!
//! Connects to the task tracker database, then fires the reminder pipeline
//! for each configured `(window, cron)` pair until SIGINT/SIGTERM.
//!
//! One-shot modes:
//! - `--once <window>`: run a single pass for one window and exit
//! - `--send-test <email>`: send a sample reminder and exit (no database needed)

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::sync::Notify;
use tracing::{error, info, warn};

use taskping_core::config::{load_dotenv, Config};
use taskping_core::{ReminderWindow, SystemClock};
use taskping_notify::{Dispatcher, LogTransport, MailTransport, SmtpMailer};
use taskping_pipeline::{FireOutcome, ReminderPipeline, ScheduleCoordinator};
use taskping_store::PgTaskStore;

// ── CLI ─────────────────────────────────────────────────────────────

/// Task reminder worker: emails each assignee the tasks due in a window.
#[derive(Parser, Debug)]
#[command(name = "reminder-worker", version, about)]
struct Cli {
    /// Run one pass for this window (`1d`, `3d`, `overdue`, ...) and exit.
    #[arg(long, value_name = "WINDOW")]
    once: Option<ReminderWindow>,

    /// Send a sample reminder to this address and exit.
    #[arg(long, value_name = "EMAIL")]
    send_test: Option<String>,

    /// Log rendered reminders instead of sending them.
    #[arg(long)]
    dry_run: bool,
}

// ── main ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    load_dotenv();
    let cli = Cli::parse();

    let config = Config::from_env().context("invalid configuration")?;
    config.log_summary();

    let transport: Arc<dyn MailTransport> = if cli.dry_run {
        info!("dry run: reminders will be logged, not sent");
        Arc::new(LogTransport)
    } else {
        Arc::new(SmtpMailer::from_config(&config.smtp).context("invalid SMTP configuration")?)
    };
    let dispatcher = Dispatcher::new(transport, config.workspace.clone());
    dispatcher
        .renderer()
        .validate()
        .context("reminder template failed to load")?;

    let test_window = ReminderWindow::horizon(1)?;

    if let Some(recipient) = cli.send_test.as_deref() {
        let outcome = dispatcher.send_test(recipient, test_window).await;
        if !outcome.is_success() {
            anyhow::bail!(
                "test reminder to {recipient} failed: {}",
                outcome.error.unwrap_or_default()
            );
        }
        return Ok(());
    }

    let store = PgTaskStore::connect_with_retry(&config.postgres)
        .await
        .context("task database unreachable")?;
    let clock = Arc::new(SystemClock::new(config.schedule.utc_offset));
    let pipeline = Arc::new(ReminderPipeline::new(Arc::new(store), dispatcher, clock));
    let coordinator = ScheduleCoordinator::new(
        pipeline.clone(),
        &config.schedule.entries,
        config.schedule.tick_interval(),
    )?;

    if let Some(window) = cli.once {
        let report = match coordinator.fire(window) {
            FireOutcome::Started(handle) => handle.await.context("reminder run panicked")?,
            FireOutcome::Dropped => anyhow::bail!("{window} run already in progress"),
        };
        if report.query_failed {
            anyhow::bail!("{window} run could not query the task database");
        }
        return Ok(());
    }

    if let Some(recipient) = config.schedule.startup_test_recipient.as_deref() {
        let outcome = pipeline.dispatcher().send_test(recipient, test_window).await;
        if !outcome.is_success() {
            warn!(recipient, "startup test reminder failed, continuing");
        }
    }

    let shutdown = Arc::new(Notify::new());
    let signal = shutdown.clone();
    tokio::spawn(async move {
        match shutdown_signal().await {
            Ok(()) => {
                info!("shutdown signal received");
                signal.notify_one();
            }
            Err(e) => error!(error = %e, "failed to listen for shutdown signals"),
        }
    });

    coordinator.run(shutdown).await;
    info!("reminder-worker exited cleanly");
    Ok(())
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() -> std::io::Result<()> {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
        tokio::select! {
            result = ctrl_c => result,
            _ = sigterm.recv() => Ok(()),
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await
    }
}
