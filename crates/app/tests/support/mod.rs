#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, TimeZone};
use tempfile::TempDir;
use tracker_core::{BillingCycle, CounterMode, LteCounters};
use tracker_store::UsageStore;
use unifi::{DeviceUsageSource, SourceError};

/// Scripted controller: each call pops the next queued result and falls
/// back to success when the queue is empty.
#[derive(Default)]
pub struct SourceState {
    pub logins: AtomicUsize,
    pub fetches: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    fetch_delays: Mutex<VecDeque<Duration>>,
    login_results: Mutex<VecDeque<Result<(), SourceError>>>,
    fetch_results: Mutex<VecDeque<Result<LteCounters, SourceError>>>,
}

impl SourceState {
    pub fn queue_login(&self, result: Result<(), SourceError>) {
        self.login_results.lock().expect("lock").push_back(result);
    }

    pub fn queue_fetch(&self, result: Result<LteCounters, SourceError>) {
        self.fetch_results.lock().expect("lock").push_back(result);
    }

    /// Makes the next fetch take `delay` of (tokio) time.
    pub fn queue_fetch_delay(&self, delay: Duration) {
        self.fetch_delays.lock().expect("lock").push_back(delay);
    }

    /// Most fetches ever running at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn logins(&self) -> usize {
        self.logins.load(Ordering::SeqCst)
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

pub struct MockSource {
    pub state: Arc<SourceState>,
}

#[async_trait]
impl DeviceUsageSource for MockSource {
    type Session = usize;

    async fn authenticate(&self) -> unifi::Result<usize> {
        let login = self.state.logins.fetch_add(1, Ordering::SeqCst) + 1;
        match self.state.login_results.lock().expect("lock").pop_front() {
            Some(Err(err)) => Err(err),
            _ => Ok(login),
        }
    }

    async fn fetch_counters(&self, _session: &usize) -> unifi::Result<LteCounters> {
        self.state.fetches.fetch_add(1, Ordering::SeqCst);
        let running = self.state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.max_in_flight.fetch_max(running, Ordering::SeqCst);

        let delay = self.state.fetch_delays.lock().expect("lock").pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.state.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.state
            .fetch_results
            .lock()
            .expect("lock")
            .pop_front()
            .unwrap_or(Ok(LteCounters::default()))
    }
}

pub struct Fixture {
    pub _dir: TempDir,
    pub store: UsageStore,
    pub state: Arc<SourceState>,
    pub source: MockSource,
}

pub fn fixture() -> Fixture {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = UsageStore::new(dir.path().join("lte_usage_data.json"));
    let state = Arc::new(SourceState::default());
    let source = MockSource {
        state: state.clone(),
    };
    Fixture {
        _dir: dir,
        store,
        state,
        source,
    }
}

pub fn billing(start_day: u32) -> BillingCycle {
    BillingCycle::new(start_day, CounterMode::PerPoll).expect("billing cycle")
}

pub fn counters(rx_bytes: u64, tx_bytes: u64) -> LteCounters {
    LteCounters { rx_bytes, tx_bytes }
}

/// Fixed cycle timestamp away from any billing day used in the tests.
pub fn mid_month() -> DateTime<FixedOffset> {
    at(2024, 5, 3, 12)
}

pub fn at(year: i32, month: u32, day: u32, hour: u32) -> DateTime<FixedOffset> {
    FixedOffset::east_opt(3600)
        .expect("offset")
        .with_ymd_and_hms(year, month, day, hour, 0, 0)
        .single()
        .expect("valid date")
}
