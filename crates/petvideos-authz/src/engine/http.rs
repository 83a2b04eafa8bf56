//! Remote decision engine over HTTP.

use std::time::Duration;

use reqwest::StatusCode;
use tracing::debug;

use crate::decision::{DecisionEngine, DecisionRequest, DecisionResponse};
use crate::error::DecisionError;

/// Connection settings for a remote decision engine.
#[derive(Debug, Clone)]
pub struct HttpEngineConfig {
    /// URL the request JSON is POSTed to.
    pub endpoint: String,
    /// Optional bearer credential for the engine itself.
    pub bearer_token: Option<String>,
    /// Transport-level timeout (connect + response).
    pub timeout: Duration,
}

impl Default for HttpEngineConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8180/is-authorized-with-token".into(),
            bearer_token: None,
            timeout: Duration::from_secs(5),
        }
    }
}

/// POSTs each decision request as JSON and parses the JSON verdict.
#[derive(Debug, Clone)]
pub struct HttpDecisionEngine {
    client: reqwest::Client,
    config: HttpEngineConfig,
}

impl HttpDecisionEngine {
    pub fn new(config: HttpEngineConfig) -> Result<Self, DecisionError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DecisionError::Unavailable(format!("http client: {e}")))?;
        Ok(Self { client, config })
    }
}

impl DecisionEngine for HttpDecisionEngine {
    async fn is_authorized_with_token(
        &self,
        request: &DecisionRequest,
    ) -> Result<DecisionResponse, DecisionError> {
        let mut builder = self.client.post(&self.config.endpoint).json(request);
        if let Some(token) = &self.config.bearer_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| DecisionError::Unavailable(e.to_string()))?;

        let status = response.status();
        debug!(endpoint = %self.config.endpoint, %status, "Decision engine replied");

        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNPROCESSABLE_ENTITY {
            let body = response.text().await.unwrap_or_default();
            return Err(DecisionError::InvalidRequestShape(body));
        }
        if !status.is_success() {
            return Err(DecisionError::Unavailable(format!("engine returned {status}")));
        }

        response
            .json::<DecisionResponse>()
            .await
            .map_err(|e| DecisionError::InvalidResponse(e.to_string()))
    }
}
