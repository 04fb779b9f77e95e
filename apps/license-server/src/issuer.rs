// [apps/license-server/src/issuer.rs]
//! The upstream license issuer client. Implements `AdmissionCollaborators`
//! for the admission guard (`resync`, `report_clock_tampering`) and backs
//! the `/api/activate-license` handler's passthrough semantics.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use keyforge_core_vault::LicenseStore;
use keyforge_domain_models::{monotonic_now_ms, LicenseRecord};
use keyforge_infra_middleware::{AdmissionCollaborators, ResyncFailure};
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

const ISSUER_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum IssuerError {
    #[error("no issuer base URL configured")]
    Unconfigured,
    #[error("issuer request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("issuer rejected the request")]
    UpstreamRejected { status: StatusCode, body: Value },
}

#[derive(Serialize)]
struct DeviceInfo<'a> {
    fingerprint: &'a str,
    hostname: &'a str,
    os: &'a str,
}

#[derive(Serialize)]
struct ActivationRequest<'a> {
    license_key: &'a str,
    device_info: DeviceInfo<'a>,
    timestamp: i64,
}

pub struct IssuerClient {
    base_url: Option<String>,
    api_key: Option<String>,
    fingerprint: String,
    hostname: String,
    store: Arc<LicenseStore>,
    http: reqwest::Client,
}

impl IssuerClient {
    pub fn new(
        base_url: Option<String>,
        api_key: Option<String>,
        fingerprint: String,
        hostname: String,
        store: Arc<LicenseStore>,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(ISSUER_TIMEOUT)
            .build()
            .expect("issuer http client failed to build");
        Self {
            base_url,
            api_key,
            fingerprint,
            hostname,
            store,
            http,
        }
    }

    /// Activates (or re-activates) `license_key` against the upstream
    /// issuer and persists the returned record through the vault on
    /// success. The caller forwards `IssuerError::UpstreamRejected`
    /// verbatim as its own response (spec.md §6 "4xx passthrough").
    pub async fn activate(&self, license_key: &str) -> Result<LicenseRecord, IssuerError> {
        let base_url = self.base_url.as_deref().ok_or(IssuerError::Unconfigured)?;
        let request = ActivationRequest {
            license_key,
            device_info: DeviceInfo {
                fingerprint: &self.fingerprint,
                hostname: &self.hostname,
                os: std::env::consts::OS,
            },
            timestamp: chrono::Utc::now().timestamp(),
        };

        let mut builder = self.http.post(format!("{base_url}/activate-license")).json(&request);
        if let Some(api_key) = &self.api_key {
            builder = builder.header("X-API-Key", api_key);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.json::<Value>().await.unwrap_or(Value::Null);
            return Err(IssuerError::UpstreamRejected { status, body });
        }

        let mut record: LicenseRecord = response.json().await?;
        // The issuer has no notion of this host's monotonic epoch; stamp it
        // here so a freshly activated (or resynced) record never reads as
        // stale the instant it lands.
        record.system_up_time = monotonic_now_ms();
        self.store.replace(record.clone())?;
        debug!(license_key, "issuer: activation persisted");
        Ok(record)
    }
}

impl From<keyforge_core_vault::VaultError> for IssuerError {
    fn from(error: keyforge_core_vault::VaultError) -> Self {
        IssuerError::UpstreamRejected {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: Value::String(error.to_string()),
        }
    }
}

#[async_trait]
impl AdmissionCollaborators for IssuerClient {
    async fn resync(&self) -> Result<(), ResyncFailure> {
        let license_key = self
            .store
            .record()
            .map(|record| record.license_key)
            .ok_or_else(|| ResyncFailure("no license key to resync".to_string()))?;

        self.activate(&license_key)
            .await
            .map(|_| ())
            .map_err(|error| ResyncFailure(error.to_string()))
    }

    async fn report_clock_tampering(&self, observed_skew_secs: i64) {
        let Some(base_url) = self.base_url.as_deref() else {
            warn!(observed_skew_secs, "clock tampering observed, no issuer configured to report to");
            return;
        };

        let mut builder = self
            .http
            .post(format!("{base_url}/report-tampering"))
            .json(&serde_json::json!({
                "fingerprint": self.fingerprint,
                "hostname": self.hostname,
                "observedSkewSecs": observed_skew_secs,
            }));
        if let Some(api_key) = &self.api_key {
            builder = builder.header("X-API-Key", api_key);
        }

        if let Err(error) = builder.send().await {
            warn!(%error, "failed to report clock tampering to issuer");
        }
    }
}
