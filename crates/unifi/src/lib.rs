mod client;
mod parser;
mod paths;
mod types;

pub use client::{DeviceUsageSource, UnifiClient};
pub use parser::{counters_from_body, counters_from_reader, counters_from_value, login_required};
pub use paths::{controller_base_url, normalize_mac};
pub use types::{
    ControllerKind, ControllerSettings, DEFAULT_REQUEST_TIMEOUT, DEFAULT_SITE, FetchError, Result,
    SourceError, UnifiSession,
};
