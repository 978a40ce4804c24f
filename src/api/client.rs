use std::time::Duration;

use reqwest::Client;
use thiserror::Error;

use super::models::{ApiConfig, SyncResponse};
use crate::utils::endpoint;

/// Upper bound on a `/sync` round trip so a wedged service cannot stall the
/// controller past the next timer tick.
const SYNC_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Service returned status {0}")]
    Status(u16),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

pub type Result<T> = std::result::Result<T, ApiError>;

/// Client for the download manager's local HTTP endpoint.
#[derive(Clone)]
pub struct XdmClient {
    config: ApiConfig,
    http: Client,
}

impl XdmClient {
    pub fn new(config: ApiConfig) -> Self {
        Self {
            config,
            http: Client::new(),
        }
    }

    pub fn host(&self) -> &str {
        &self.config.xdm_host
    }

    /// Fetch the service's current policy.
    pub async fn sync(&self) -> Result<SyncResponse> {
        let response = self
            .http
            .get(endpoint(self.host(), "/sync"))
            .timeout(SYNC_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }

        response
            .json::<SyncResponse>()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("JSON decode error: {}", e)))
    }

    /// POST a download payload.
    pub async fn download(&self, body: String) -> Result<u16> {
        self.post("/download", body).await
    }

    /// POST a detected media stream payload.
    pub async fn video(&self, body: String) -> Result<u16> {
        self.post("/video", body).await
    }

    /// Tell the service which captured video item the user picked.
    pub async fn item(&self, item_id: &str) -> Result<u16> {
        self.post("/item", item_id.to_string()).await
    }

    /// Ask the service to drop its captured video list.
    pub async fn clear(&self) -> Result<u16> {
        let response = self.http.get(endpoint(self.host(), "/clear")).send().await?;
        Self::check(response.status())
    }

    async fn post(&self, path: &str, body: String) -> Result<u16> {
        let response = self
            .http
            .post(endpoint(self.host(), path))
            .body(body)
            .send()
            .await?;
        Self::check(response.status())
    }

    fn check(status: reqwest::StatusCode) -> Result<u16> {
        if status.is_success() {
            Ok(status.as_u16())
        } else {
            Err(ApiError::Status(status.as_u16()))
        }
    }
}
