//! [`ScheduleCoordinator`]: fires the reminder pipeline on its cron schedule.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use taskping_core::config::ScheduleSpec;
use taskping_core::ReminderWindow;
use tokio::sync::Notify;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::error::ScheduleError;
use crate::pipeline::{ReminderPipeline, RunReport};

use super::cron::{is_cron_due, parse_cron};
use super::entry::ScheduleEntry;
use super::flags::RunFlags;

/// Result of one fire request.
#[derive(Debug)]
pub enum FireOutcome {
    /// The run was spawned; the handle yields its report.
    Started(JoinHandle<RunReport>),
    /// A run for the same window was still in progress.
    Dropped,
}

pub struct ScheduleCoordinator {
    pipeline: Arc<ReminderPipeline>,
    entries: Vec<ScheduleEntry>,
    flags: RunFlags,
    tick: Duration,
}

impl ScheduleCoordinator {
    /// Compile the schedule. Every cron expression must parse.
    ///
    /// Entries are seeded with the pipeline clock's current time, so the first
    /// fire of each entry is its next tick after startup.
    pub fn new(
        pipeline: Arc<ReminderPipeline>,
        specs: &[ScheduleSpec],
        tick: Duration,
    ) -> Result<Self, ScheduleError> {
        if specs.is_empty() {
            return Err(ScheduleError::Empty);
        }
        let started = pipeline.clock().now();
        let entries = specs
            .iter()
            .map(|spec| {
                let schedule =
                    parse_cron(&spec.cron).map_err(|e| ScheduleError::InvalidCron {
                        window: spec.window,
                        expression: spec.cron.clone(),
                        reason: e.to_string(),
                    })?;
                Ok(ScheduleEntry {
                    window: spec.window,
                    expression: spec.cron.clone(),
                    schedule,
                    last_fired: Some(started),
                })
            })
            .collect::<Result<Vec<_>, ScheduleError>>()?;

        Ok(Self {
            pipeline,
            entries,
            flags: RunFlags::default(),
            tick,
        })
    }

    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.entries
    }

    pub fn is_running(&self, window: ReminderWindow) -> bool {
        self.flags.is_running(window)
    }

    /// Windows whose cron tick has arrived since their last fire.
    ///
    /// Marks each returned entry as fired at `now`.
    pub fn due_windows(&mut self, now: DateTime<FixedOffset>) -> Vec<ReminderWindow> {
        let mut due = Vec::new();
        for entry in &mut self.entries {
            if is_cron_due(&entry.schedule, &now, entry.last_fired.as_ref()) {
                debug!(window = %entry.window, cron = %entry.expression, "schedule entry due");
                entry.last_fired = Some(now);
                due.push(entry.window);
            }
        }
        due
    }

    /// Start a run for `window` unless one is already in progress.
    pub fn fire(&self, window: ReminderWindow) -> FireOutcome {
        let Some(guard) = self.flags.try_acquire(window) else {
            info!(window = %window, "previous run still in progress, dropping fire");
            return FireOutcome::Dropped;
        };

        let pipeline = self.pipeline.clone();
        FireOutcome::Started(tokio::spawn(async move {
            let _guard = guard;
            pipeline.run(window).await
        }))
    }

    /// Tick until `shutdown` is notified, then wait for in-flight runs.
    pub async fn run(mut self, shutdown: Arc<Notify>) {
        let mut ticker = tokio::time::interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut in_flight: Vec<JoinHandle<RunReport>> = Vec::new();

        info!(
            entries = self.entries.len(),
            tick_secs = self.tick.as_secs(),
            "schedule coordinator started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let now = self.pipeline.clock().now();
                    for window in self.due_windows(now) {
                        if let FireOutcome::Started(handle) = self.fire(window) {
                            in_flight.push(handle);
                        }
                    }
                    reap_finished(&mut in_flight).await;
                }
                _ = shutdown.notified() => {
                    info!(in_flight = in_flight.len(), "schedule coordinator shutting down");
                    break;
                }
            }
        }

        for handle in in_flight {
            log_join_result(handle.await);
        }
    }
}

/// Remove finished runs from `in_flight`, logging any that panicked or were
/// cancelled. Returns how many of them failed.
pub(crate) async fn reap_finished(in_flight: &mut Vec<JoinHandle<RunReport>>) -> usize {
    let (finished, running): (Vec<_>, Vec<_>) =
        in_flight.drain(..).partition(|handle| handle.is_finished());
    *in_flight = running;

    let mut failed = 0;
    for handle in finished {
        if !log_join_result(handle.await) {
            failed += 1;
        }
    }
    failed
}

fn log_join_result(result: Result<RunReport, JoinError>) -> bool {
    match result {
        Ok(_) => true,
        Err(e) if e.is_panic() => {
            warn!(error = %e, "reminder run panicked");
            false
        }
        Err(e) => {
            warn!(error = %e, "reminder run task failed");
            false
        }
    }
}
