use std::io::Read;

use serde_json::Value;
use tracker_core::LteCounters;

use crate::types::{FetchError, SourceError};

const LOGIN_REQUIRED: &str = "api.err.LoginRequired";

fn counter(stat: Option<&Value>, key: &str) -> Result<u64, String> {
    let Some(value) = stat.and_then(|stat| stat.get(key)) else {
        return Ok(0);
    };
    if value.is_null() {
        return Ok(0);
    }
    if let Some(count) = value.as_u64() {
        return Ok(count);
    }
    // Some firmware reports counters as floats.
    match value.as_f64() {
        Some(count) if count.is_finite() && count >= 0.0 => Ok(count as u64),
        _ => Err(format!("{key} is not a byte count: {value}")),
    }
}

fn meta_message(value: &Value) -> Option<&str> {
    value.get("meta")?.get("msg")?.as_str()
}

pub fn login_required(value: &Value) -> bool {
    meta_message(value) == Some(LOGIN_REQUIRED)
}

/// LTE counters of the first device in a `stat/device` response. Absent
/// counters count as zero.
pub fn counters_from_value(value: &Value) -> Result<LteCounters, String> {
    let device = value
        .get("data")
        .and_then(Value::as_array)
        .and_then(|devices| devices.first())
        .ok_or_else(|| match meta_message(value) {
            Some(msg) => format!("no device in response ({msg})"),
            None => "no device in response".to_string(),
        })?;
    let stat = device.get("stat");
    Ok(LteCounters {
        rx_bytes: counter(stat, "lte_rxbytes")?,
        tx_bytes: counter(stat, "lte_txbytes")?,
    })
}

pub fn counters_from_body(body: &str) -> Result<LteCounters, SourceError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|err| FetchError::Malformed(format!("invalid json: {err}")))?;
    if login_required(&value) {
        return Err(SourceError::Auth("controller requires login".to_string()));
    }
    counters_from_value(&value).map_err(|reason| FetchError::Malformed(reason).into())
}

/// Counters from a saved `stat/device` response, e.g. a capture on disk.
pub fn counters_from_reader<R: Read>(mut reader: R) -> Result<LteCounters, SourceError> {
    let mut body = String::new();
    reader
        .read_to_string(&mut body)
        .map_err(|err| FetchError::Malformed(format!("unreadable response: {err}")))?;
    counters_from_body(&body)
}
