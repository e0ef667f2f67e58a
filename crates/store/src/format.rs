use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, SecondsFormat, TimeZone};
use serde::{Deserialize, Serialize};
use tracker_core::UsageRecord;

/// On-disk layout of the state file.
#[derive(Debug, Serialize, Deserialize)]
struct StateFile {
    #[serde(default)]
    cumulative_usage: u64,
    #[serde(default)]
    last_reset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_counter: Option<u64>,
}

pub(crate) fn decode(contents: &str) -> Result<UsageRecord, String> {
    let file: StateFile = serde_json::from_str(contents).map_err(|err| err.to_string())?;
    let last_reset_at = match file.last_reset.as_deref() {
        Some(raw) => Some(parse_timestamp(raw)?),
        None => None,
    };
    Ok(UsageRecord {
        cumulative_usage_bytes: file.cumulative_usage,
        last_reset_at,
        last_counter_bytes: file.last_counter,
    })
}

pub(crate) fn encode(record: &UsageRecord) -> serde_json::Result<String> {
    let file = StateFile {
        cumulative_usage: record.cumulative_usage_bytes,
        last_reset: record
            .last_reset_at
            .map(|value| value.to_rfc3339_opts(SecondsFormat::AutoSi, false)),
        last_counter: record.last_counter_bytes,
    };
    serde_json::to_string_pretty(&file)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<FixedOffset>, String> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed);
    }
    // Files written before offsets were recorded hold local wall-clock time.
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|value| value.fixed_offset())
                .ok_or_else(|| format!("last_reset {raw} does not exist in local time"));
        }
    }
    Err(format!("invalid last_reset timestamp: {raw}"))
}
