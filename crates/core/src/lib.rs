mod billing;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

pub use billing::{BillingCycle, CycleOutcome, InvalidBillingDay};

const BYTES_PER_MEGABYTE: f64 = 1024.0 * 1024.0;

/// Accounting state for the tracked modem, persisted between runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub cumulative_usage_bytes: u64,
    pub last_reset_at: Option<DateTime<FixedOffset>>,
    pub last_counter_bytes: Option<u64>,
}

impl UsageRecord {
    pub fn is_fresh(&self) -> bool {
        self.last_reset_at.is_none()
    }

    pub fn cumulative_megabytes(&self) -> f64 {
        self.cumulative_usage_bytes as f64 / BYTES_PER_MEGABYTE
    }
}

/// Receive/transmit counters read from the LTE radio in one poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LteCounters {
    pub rx_bytes: u64,
    pub tx_bytes: u64,
}

impl LteCounters {
    pub fn total_bytes(&self) -> u64 {
        self.rx_bytes.saturating_add(self.tx_bytes)
    }
}

/// How raw counter reads translate into usage for one poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterMode {
    /// The device clears its counter between polls; every read is new usage.
    #[default]
    PerPoll,
    /// The device counter grows from boot; usage is the difference to the
    /// previous read.
    Cumulative,
}

impl CounterMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PerPoll => "per_poll",
            Self::Cumulative => "cumulative",
        }
    }

    pub fn sample_bytes(&self, previous_raw: Option<u64>, raw: u64) -> u64 {
        match self {
            Self::PerPoll => raw,
            Self::Cumulative => counter_delta(previous_raw, raw),
        }
    }
}

/// Usage since `previous`, treating a counter that went backwards as a
/// device restart that began counting from zero.
pub fn counter_delta(previous: Option<u64>, current: u64) -> u64 {
    match previous {
        Some(previous) if current >= previous => current - previous,
        _ => current,
    }
}

pub fn format_megabytes(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / BYTES_PER_MEGABYTE)
}
