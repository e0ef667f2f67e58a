use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::ACCEPT;
use serde::Serialize;
use tracker_core::LteCounters;

use crate::parser::{counters_from_body, login_required};
use crate::types::{ControllerSettings, FetchError, Result, SourceError, UnifiSession};

const CSRF_HEADER: &str = "x-csrf-token";

/// Something that can report the LTE byte counters of the tracked device.
#[async_trait]
pub trait DeviceUsageSource: Send + Sync {
    type Session: Send + Sync;

    async fn authenticate(&self) -> Result<Self::Session>;

    async fn fetch_counters(&self, session: &Self::Session) -> Result<LteCounters>;
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// Device usage source backed by a UniFi Network controller.
#[derive(Debug, Clone)]
pub struct UnifiClient {
    settings: ControllerSettings,
}

impl UnifiClient {
    pub fn new(settings: ControllerSettings) -> Self {
        if settings.accept_invalid_certs {
            tracing::warn!(
                controller = %settings.base_url,
                "TLS certificate verification disabled for controller"
            );
        }
        Self { settings }
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    pub fn login_url(&self) -> String {
        format!(
            "{}{}",
            self.settings.base_url,
            self.settings.kind.login_path()
        )
    }

    pub fn device_url(&self) -> String {
        format!(
            "{}{}",
            self.settings.base_url,
            self.settings
                .kind
                .device_path(&self.settings.site, &self.settings.device_mac)
        )
    }

    fn http_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .cookie_store(true)
            .timeout(self.settings.request_timeout)
            .danger_accept_invalid_certs(self.settings.accept_invalid_certs)
            .build()
            .map_err(SourceError::Client)
    }
}

#[async_trait]
impl DeviceUsageSource for UnifiClient {
    type Session = UnifiSession;

    async fn authenticate(&self) -> Result<UnifiSession> {
        // Fresh client per login so stale cookies never leak into a new session.
        let client = self.http_client()?;
        let response = client
            .post(self.login_url())
            .header(ACCEPT, "application/json")
            .json(&LoginRequest {
                username: &self.settings.username,
                password: &self.settings.password,
            })
            .send()
            .await
            .map_err(FetchError::Unreachable)?;

        let status = response.status();
        if matches!(
            status,
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            return Err(SourceError::Auth(format!(
                "controller rejected login for {} (HTTP {})",
                self.settings.username,
                status.as_u16()
            )));
        }
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
            }
            .into());
        }

        let csrf_token = response
            .headers()
            .get(CSRF_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        tracing::debug!(
            controller = %self.settings.base_url,
            csrf = csrf_token.is_some(),
            "logged in to controller"
        );
        Ok(UnifiSession { client, csrf_token })
    }

    async fn fetch_counters(&self, session: &UnifiSession) -> Result<LteCounters> {
        let mut request = session
            .client
            .get(self.device_url())
            .header(ACCEPT, "application/json");
        if let Some(token) = session.csrf_token.as_deref() {
            request = request.header(CSRF_HEADER, token);
        }
        let response = request.send().await.map_err(FetchError::Unreachable)?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(SourceError::Auth("controller session expired".to_string()));
        }
        let body = response.text().await.map_err(FetchError::Unreachable)?;
        if !status.is_success() {
            let login_needed = serde_json::from_str::<serde_json::Value>(&body)
                .map(|value| login_required(&value))
                .unwrap_or(false);
            if login_needed {
                return Err(SourceError::Auth("controller requires login".to_string()));
            }
            return Err(FetchError::Http {
                status: status.as_u16(),
            }
            .into());
        }
        let counters = counters_from_body(&body)?;
        tracing::debug!(
            device = %self.settings.device_mac,
            rx_bytes = counters.rx_bytes,
            tx_bytes = counters.tx_bytes,
            "read lte counters"
        );
        Ok(counters)
    }
}
