use chrono::{DateTime, Datelike, FixedOffset};

use crate::{CounterMode, UsageRecord};

/// Billing cycle day was outside 1-31.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidBillingDay(pub u32);

impl std::fmt::Display for InvalidBillingDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "billing cycle start day must be 1-31, got {}", self.0)
    }
}

impl std::error::Error for InvalidBillingDay {}

/// Result of feeding one sample through the billing cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleOutcome {
    pub record: UsageRecord,
    pub sample_bytes: u64,
    pub reset: bool,
}

/// Decides when a monthly cycle rolls over and folds samples into the
/// running total.
///
/// A cycle starts on `start_day` of each month. The rollover check compares
/// the calendar month (year included) of the observation against the last
/// reset, so it fires at most once per trigger day no matter how often it
/// is polled. Months without `start_day` (the 31st in April) do not roll
/// over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillingCycle {
    start_day: u32,
    counter_mode: CounterMode,
}

impl BillingCycle {
    pub fn new(start_day: u32, counter_mode: CounterMode) -> Result<Self, InvalidBillingDay> {
        if !(1..=31).contains(&start_day) {
            return Err(InvalidBillingDay(start_day));
        }
        Ok(Self {
            start_day,
            counter_mode,
        })
    }

    pub fn start_day(&self) -> u32 {
        self.start_day
    }

    pub fn counter_mode(&self) -> CounterMode {
        self.counter_mode
    }

    pub fn should_reset(&self, prior: &UsageRecord, now: DateTime<FixedOffset>) -> bool {
        let Some(last_reset) = prior.last_reset_at else {
            return true;
        };
        now.day() == self.start_day
            && (now.year(), now.month()) != (last_reset.year(), last_reset.month())
    }

    /// New record after observing `raw_sample_bytes` (rx + tx as reported
    /// by the device) at `now`.
    pub fn update(
        &self,
        prior: &UsageRecord,
        raw_sample_bytes: u64,
        now: DateTime<FixedOffset>,
    ) -> UsageRecord {
        self.apply(prior, raw_sample_bytes, now).record
    }

    pub fn apply(
        &self,
        prior: &UsageRecord,
        raw_sample_bytes: u64,
        now: DateTime<FixedOffset>,
    ) -> CycleOutcome {
        let sample_bytes = self
            .counter_mode
            .sample_bytes(prior.last_counter_bytes, raw_sample_bytes);
        let reset = self.should_reset(prior, now);
        let record = if reset {
            UsageRecord {
                cumulative_usage_bytes: sample_bytes,
                last_reset_at: Some(now),
                last_counter_bytes: Some(raw_sample_bytes),
            }
        } else {
            UsageRecord {
                cumulative_usage_bytes: prior.cumulative_usage_bytes.saturating_add(sample_bytes),
                last_reset_at: prior.last_reset_at,
                last_counter_bytes: Some(raw_sample_bytes),
            }
        };
        CycleOutcome {
            record,
            sample_bytes,
            reset,
        }
    }
}
