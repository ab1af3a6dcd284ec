//! Remote fight-generation service over HTTP.

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::{debug, warn};
use url::Url;

use super::traits::FightGenerator;
use super::types::{FightRequest, FightResponse};
use crate::error::{ConfigError, FightError};

const GENERATE_PATH: &str = "generate-fight";

pub struct HttpFightGenerator {
    client: Client,
    endpoint: Url,
}

impl HttpFightGenerator {
    /// Client for the service rooted at `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ConfigError> {
        let mut base = Url::parse(base_url).map_err(|e| ConfigError::InvalidValue {
            key: "service.base_url".into(),
            message: e.to_string(),
        })?;
        // Without a trailing slash `join` would replace the last segment.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base.join(GENERATE_PATH).map_err(|e| ConfigError::InvalidValue {
            key: "service.base_url".into(),
            message: e.to_string(),
        })?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::InvalidValue {
                key: "service.timeout_secs".into(),
                message: e.to_string(),
            })?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl FightGenerator for HttpFightGenerator {
    fn name(&self) -> &str {
        "http"
    }

    fn generate(
        &self,
        request: &FightRequest,
    ) -> impl Future<Output = Result<FightResponse, FightError>> + Send {
        async move {
            debug!(endpoint = %self.endpoint, category = %request.category, "requesting fight");
            let resp = self
                .client
                .post(self.endpoint.clone())
                .json(request)
                .send()
                .await?;

            let status = resp.status();
            if status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS {
                warn!(%status, "fight service refused: quota exhausted");
                return Err(FightError::NoFightsLeft);
            }
            if !status.is_success() {
                warn!(%status, "fight service error");
                return Err(FightError::Network(format!("fight service returned HTTP {status}")));
            }

            let body = resp.text().await?;
            let response: FightResponse = serde_json::from_str(&body)
                .map_err(|e| FightError::InvalidResponse(e.to_string()))?;
            if response.is_quota_exhausted() {
                return Err(FightError::NoFightsLeft);
            }
            Ok(response)
        }
    }
}
