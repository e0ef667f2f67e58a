use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Local};
use tokio::time::MissedTickBehavior;
use tracker_core::format_megabytes;
use unifi::DeviceUsageSource;

use crate::error::{AppError, Result};
use crate::tracker::{CycleReport, Tracker};

/// Runs tracker cycles on a fixed period, one at a time. A cycle that
/// overruns the period swallows the ticks it missed instead of queueing
/// them.
#[derive(Debug, Clone, Copy)]
pub struct Scheduler {
    period: Duration,
    clock: fn() -> DateTime<FixedOffset>,
}

fn local_now() -> DateTime<FixedOffset> {
    Local::now().fixed_offset()
}

impl Scheduler {
    pub fn new(period: Duration) -> Result<Self> {
        if period.is_zero() {
            return Err(AppError::Config(
                "scheduler period must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            period,
            clock: local_now,
        })
    }

    /// Replaces the wall clock that stamps each cycle.
    pub fn with_clock(mut self, clock: fn() -> DateTime<FixedOffset>) -> Self {
        self.clock = clock;
        self
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Ticks until `shutdown` resolves. The first cycle starts immediately;
    /// a cycle still in flight at shutdown is abandoned.
    pub async fn run<S, F>(&self, tracker: &mut Tracker<S>, shutdown: F)
    where
        S: DeviceUsageSource,
        F: Future<Output = ()>,
    {
        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        tracing::info!(period_secs = self.period.as_secs(), "usage tracker started");

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = interval.tick() => {
                    tokio::select! {
                        biased;
                        _ = &mut shutdown => break,
                        result = tracker.run_cycle((self.clock)()) => {
                            log_cycle(&result);
                        }
                    }
                }
            }
        }

        tracing::info!("usage tracker shutting down");
        tracker.end_session();
        if let Err(err) = tracker.flush() {
            tracing::error!(step = err.step(), error = %err, "usage record lost on shutdown");
        }
    }
}

pub fn log_cycle(result: &Result<CycleReport>) {
    match result {
        Ok(report) => {
            tracing::info!(
                cumulative_bytes = report.record.cumulative_usage_bytes,
                sample = %format_megabytes(report.sample_bytes),
                reset = report.reset,
                saved = report.saved,
                "{}",
                report.usage_line()
            );
            tracing::info!("{}", report.last_reset_line());
        }
        Err(err) => {
            tracing::error!(step = err.step(), error = %err, "usage cycle failed");
        }
    }
}
