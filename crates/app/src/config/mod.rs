use std::path::{Path, PathBuf};
use std::time::Duration;

use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File};
use serde::Deserialize;
use tracker_core::{BillingCycle, CounterMode};
use unifi::{
    ControllerKind, ControllerSettings, DEFAULT_REQUEST_TIMEOUT, DEFAULT_SITE,
    controller_base_url, normalize_mac,
};

use crate::error::{AppError, Result};

pub const ENV_PREFIX: &str = "LTE_TRACKER";
pub const DEFAULT_CONFIG_NAME: &str = "lte-tracker";
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

/// Settings as read from the config file and environment, before checks.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    controller: Option<String>,
    username: Option<String>,
    password: Option<String>,
    device_mac: Option<String>,
    billing_day: Option<u32>,
    site: Option<String>,
    #[serde(default)]
    controller_kind: ControllerKind,
    interval_secs: Option<u64>,
    request_timeout_secs: Option<u64>,
    accept_invalid_certs: Option<bool>,
    #[serde(default)]
    counter_mode: CounterMode,
    state_file: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    log_level: Option<String>,
    #[serde(default)]
    log_format: LogFormat,
}

/// Validated tracker configuration.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub controller: ControllerSettings,
    pub billing: BillingCycle,
    pub interval: Duration,
    pub state_file: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub logging: LoggingConfig,
}

impl TrackerConfig {
    /// Reads `file` (or `lte-tracker.toml` in the working directory when
    /// present), then `LTE_TRACKER_*` environment variables on top.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let builder = config::Config::builder();
        let builder = match file {
            Some(path) => builder.add_source(File::from(path).required(true)),
            None => builder.add_source(File::with_name(DEFAULT_CONFIG_NAME).required(false)),
        };
        Self::from_builder(builder.add_source(env_source()))
    }

    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        let raw: RawConfig = builder.build()?.try_deserialize()?;
        raw.validate()
    }
}

/// `LTE_TRACKER_*` variables. Values stay strings so credentials and
/// device ids keep leading zeros; typed keys are converted on deserialize.
fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
}

fn required(value: Option<String>, key: &str) -> Result<String> {
    match value.map(|value| value.trim().to_string()) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(AppError::Config(format!(
            "{key} is required (set {ENV_PREFIX}_{})",
            key.to_ascii_uppercase()
        ))),
    }
}

impl RawConfig {
    fn validate(self) -> Result<TrackerConfig> {
        let controller = required(self.controller, "controller")?;
        let username = required(self.username, "username")?;
        let password = self
            .password
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                AppError::Config(format!("password is required (set {ENV_PREFIX}_PASSWORD)"))
            })?;
        let raw_mac = required(self.device_mac, "device_mac")?;
        let device_mac = normalize_mac(&raw_mac)
            .ok_or_else(|| AppError::Config(format!("device_mac {raw_mac} is not a MAC address")))?;
        let billing_day = self.billing_day.ok_or_else(|| {
            AppError::Config(format!(
                "billing_day is required (set {ENV_PREFIX}_BILLING_DAY)"
            ))
        })?;
        let billing = BillingCycle::new(billing_day, self.counter_mode)
            .map_err(|err| AppError::Config(err.to_string()))?;

        let interval = match self.interval_secs {
            Some(0) => {
                return Err(AppError::Config(
                    "interval_secs must be greater than zero".to_string(),
                ));
            }
            Some(secs) => Duration::from_secs(secs),
            None => DEFAULT_INTERVAL,
        };
        let request_timeout = match self.request_timeout_secs {
            Some(0) => {
                return Err(AppError::Config(
                    "request_timeout_secs must be greater than zero".to_string(),
                ));
            }
            Some(secs) => Duration::from_secs(secs),
            None => DEFAULT_REQUEST_TIMEOUT,
        };

        let site = self
            .site
            .map(|site| site.trim().to_string())
            .filter(|site| !site.is_empty())
            .unwrap_or_else(|| DEFAULT_SITE.to_string());

        Ok(TrackerConfig {
            controller: ControllerSettings {
                base_url: controller_base_url(&controller),
                kind: self.controller_kind,
                site,
                device_mac,
                username,
                password,
                request_timeout,
                accept_invalid_certs: self.accept_invalid_certs.unwrap_or(true),
            },
            billing,
            interval,
            state_file: self.state_file,
            data_dir: self.data_dir,
            logging: LoggingConfig {
                level: self.log_level.unwrap_or_else(|| "info".to_string()),
                format: self.log_format,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    const MINIMAL: &str = r#"
controller = "192.168.0.1"
username = "admin"
password = "hunter2"
device_mac = "AC-8B-A9-83-F3-1F"
billing_day = 17
"#;

    fn from_toml(contents: &str) -> Result<TrackerConfig> {
        TrackerConfig::from_builder(
            config::Config::builder().add_source(File::from_str(contents, FileFormat::Toml)),
        )
    }

    fn config_error(contents: &str) -> String {
        match from_toml(contents) {
            Err(AppError::Config(message)) => message,
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let config = from_toml(MINIMAL).expect("config");
        assert_eq!(config.controller.base_url, "https://192.168.0.1:443");
        assert_eq!(config.controller.device_mac, "ac:8b:a9:83:f3:1f");
        assert_eq!(config.controller.kind, ControllerKind::UnifiOs);
        assert_eq!(config.controller.site, "default");
        assert_eq!(config.controller.request_timeout, Duration::from_secs(30));
        assert!(config.controller.accept_invalid_certs);
        assert_eq!(config.billing.start_day(), 17);
        assert_eq!(config.billing.counter_mode(), CounterMode::PerPoll);
        assert_eq!(config.interval, DEFAULT_INTERVAL);
        assert_eq!(config.logging, LoggingConfig::default());
        assert!(config.state_file.is_none());
    }

    #[test]
    fn optional_settings_are_applied() {
        let contents = format!(
            "{MINIMAL}
site = \"branch\"
controller_kind = \"classic\"
interval_secs = 600
request_timeout_secs = 5
accept_invalid_certs = false
counter_mode = \"cumulative\"
state_file = \"/var/lib/lte/usage.json\"
log_level = \"debug\"
log_format = \"json\"
"
        );
        let config = from_toml(&contents).expect("config");
        assert_eq!(config.controller.kind, ControllerKind::Classic);
        assert_eq!(config.controller.site, "branch");
        assert_eq!(config.controller.request_timeout, Duration::from_secs(5));
        assert!(!config.controller.accept_invalid_certs);
        assert_eq!(config.billing.counter_mode(), CounterMode::Cumulative);
        assert_eq!(config.interval, Duration::from_secs(600));
        assert_eq!(
            config.state_file.as_deref(),
            Some(Path::new("/var/lib/lte/usage.json"))
        );
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn missing_controller_is_rejected() {
        let message = config_error(
            r#"
username = "admin"
password = "pw"
device_mac = "ac:8b:a9:83:f3:1f"
billing_day = 1
"#,
        );
        assert!(message.contains("LTE_TRACKER_CONTROLLER"), "{message}");
    }

    #[test]
    fn missing_billing_day_is_rejected() {
        let message = config_error(
            r#"
controller = "unifi.lan"
username = "admin"
password = "pw"
device_mac = "ac:8b:a9:83:f3:1f"
"#,
        );
        assert!(message.contains("billing_day"), "{message}");
    }

    #[test]
    fn billing_day_out_of_range_is_rejected() {
        let contents = MINIMAL.replace("billing_day = 17", "billing_day = 32");
        let message = config_error(&contents);
        assert!(message.contains("1-31"), "{message}");
    }

    #[test]
    fn unparseable_billing_day_is_rejected() {
        let contents = MINIMAL.replace("billing_day = 17", "billing_day = \"soon\"");
        config_error(&contents);
    }

    #[test]
    fn invalid_mac_is_rejected() {
        let contents = MINIMAL.replace("AC-8B-A9-83-F3-1F", "not-a-mac");
        let message = config_error(&contents);
        assert!(message.contains("not-a-mac"), "{message}");
    }

    #[test]
    fn zero_interval_is_rejected() {
        let contents = format!("{MINIMAL}\ninterval_secs = 0\n");
        config_error(&contents);
    }

    #[test]
    fn environment_values_keep_their_text() {
        let vars: config::Map<String, String> = [
            ("LTE_TRACKER_CONTROLLER", "192.168.0.1"),
            ("LTE_TRACKER_USERNAME", "admin"),
            ("LTE_TRACKER_PASSWORD", "007"),
            ("LTE_TRACKER_DEVICE_MAC", "001122334455"),
            ("LTE_TRACKER_BILLING_DAY", "17"),
            ("LTE_TRACKER_INTERVAL_SECS", "900"),
            ("LTE_TRACKER_ACCEPT_INVALID_CERTS", "false"),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
        let builder = config::Config::builder().add_source(env_source().source(Some(vars)));

        let config = TrackerConfig::from_builder(builder).expect("config");
        assert_eq!(config.controller.password, "007");
        assert_eq!(config.controller.device_mac, "00:11:22:33:44:55");
        assert_eq!(config.billing.start_day(), 17);
        assert_eq!(config.interval, Duration::from_secs(900));
        assert!(!config.controller.accept_invalid_certs);
    }

    #[test]
    fn debug_output_hides_password() {
        let config = from_toml(MINIMAL).expect("config");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("hunter2"));
    }
}
