use chrono::{DateTime, FixedOffset};
use tracker_core::{BillingCycle, LteCounters, UsageRecord, format_megabytes};
use tracker_store::UsageStore;
use unifi::{DeviceUsageSource, SourceError};

use crate::error::{AppError, Result};

/// What one successful cycle observed and recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub counters: LteCounters,
    pub sample_bytes: u64,
    pub reset: bool,
    pub record: UsageRecord,
    pub saved: bool,
}

impl CycleReport {
    pub fn usage_line(&self) -> String {
        format!(
            "Cumulative LTE data usage: {}",
            format_megabytes(self.record.cumulative_usage_bytes)
        )
    }

    pub fn last_reset_line(&self) -> String {
        match self.record.last_reset_at {
            Some(at) => format!("Last reset: {}", at.to_rfc3339()),
            None => "Last reset: never".to_string(),
        }
    }
}

/// Owns the device session and the usage record of the tracked modem and
/// runs the fetch, accumulate and persist cycle.
pub struct Tracker<S: DeviceUsageSource> {
    source: S,
    store: UsageStore,
    billing: BillingCycle,
    session: Option<S::Session>,
    record: UsageRecord,
    unsaved: bool,
}

impl<S: DeviceUsageSource> Tracker<S> {
    pub fn new(source: S, store: UsageStore, billing: BillingCycle) -> Self {
        Self {
            source,
            store,
            billing,
            session: None,
            record: UsageRecord::default(),
            unsaved: false,
        }
    }

    /// Last known record: the persisted one after a successful cycle, or
    /// the one kept in memory while the state file cannot be written.
    pub fn record(&self) -> &UsageRecord {
        &self.record
    }

    pub fn store(&self) -> &UsageStore {
        &self.store
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved
    }

    /// Seeds the in-memory record from the state file.
    pub fn restore(&mut self) -> Result<()> {
        self.record = self.store.load().map_err(AppError::Load)?;
        Ok(())
    }

    pub async fn run_cycle(&mut self, now: DateTime<FixedOffset>) -> Result<CycleReport> {
        let counters = self.read_counters().await?;
        let prior = self.prior_record()?;
        let outcome = self.billing.apply(&prior, counters.total_bytes(), now);
        if outcome.reset {
            tracing::info!(
                start_day = self.billing.start_day(),
                previous_usage = %format_megabytes(prior.cumulative_usage_bytes),
                "billing cycle reset"
            );
        }
        self.record = outcome.record;

        let saved = match self.store.save(&self.record) {
            Ok(()) => {
                self.unsaved = false;
                true
            }
            Err(err) => {
                tracing::error!(
                    step = "save",
                    error = %err,
                    "could not persist usage record, keeping it in memory"
                );
                self.unsaved = true;
                false
            }
        };

        Ok(CycleReport {
            counters,
            sample_bytes: outcome.sample_bytes,
            reset: outcome.reset,
            record: self.record,
            saved,
        })
    }

    /// Writes a record that an earlier cycle failed to persist.
    pub fn flush(&mut self) -> Result<()> {
        if !self.unsaved {
            return Ok(());
        }
        self.store.save(&self.record).map_err(AppError::Save)?;
        self.unsaved = false;
        Ok(())
    }

    pub fn end_session(&mut self) {
        if self.session.take().is_some() {
            tracing::debug!("dropped controller session");
        }
    }

    fn prior_record(&self) -> Result<UsageRecord> {
        if self.unsaved {
            return Ok(self.record);
        }
        self.store.load().map_err(AppError::Load)
    }

    async fn login(&self) -> Result<S::Session> {
        self.source.authenticate().await.map_err(AppError::Auth)
    }

    async fn read_counters(&mut self) -> Result<LteCounters> {
        let (session, reused) = match self.session.take() {
            Some(session) => (session, true),
            None => (self.login().await?, false),
        };
        match self.source.fetch_counters(&session).await {
            Err(err) if err.is_auth() && reused => {
                tracing::info!(error = %err, "controller session rejected, logging in again");
                drop(session);
                let session = self.login().await?;
                let result = self.source.fetch_counters(&session).await;
                self.finish_fetch(session, result)
            }
            result => self.finish_fetch(session, result),
        }
    }

    fn finish_fetch(
        &mut self,
        session: S::Session,
        result: std::result::Result<LteCounters, SourceError>,
    ) -> Result<LteCounters> {
        match result {
            Ok(counters) => {
                self.session = Some(session);
                Ok(counters)
            }
            Err(err) => {
                if !err.is_auth() {
                    self.session = Some(session);
                }
                Err(AppError::Fetch(err))
            }
        }
    }
}
