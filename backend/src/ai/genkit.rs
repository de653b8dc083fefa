use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use tokoboost_common::GenerateRequest;

/// Client for the Genkit flow server hosting the generation flows.
pub struct GeneratorClient {
    http_client: Client,
    base_url: String,
    timeout: Duration,
}

/// Envelope the flow server expects: `{"data": <flow input>}`.
#[derive(Debug, Serialize)]
struct FlowRequest<'a> {
    data: FlowInput<'a>,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
struct FlowInput<'a> {
    product_image: &'a str,
    product_description: &'a str,
}

#[derive(Debug, Deserialize)]
struct CaptionsFlowResponse {
    result: CaptionsResult,
}

#[derive(Debug, Deserialize)]
struct CaptionsResult {
    captions: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct FlyerFlowResponse {
    result: FlyerResult,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FlyerResult {
    flyer_image_uri: String,
}

#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Flow error: {0}")]
    FlowError(String),
}

/// Output of one paid generation: captions plus the flyer image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedContent {
    pub captions: Vec<String>,
    pub flyer_image_uri: String,
}

impl GeneratorClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// Run both generation flows concurrently.
    ///
    /// Either flow failing fails the whole generation; the caller's refund
    /// path covers the charge.
    pub async fn generate(
        &self,
        request: &GenerateRequest,
    ) -> Result<GeneratedContent, GeneratorError> {
        let input = FlowInput {
            product_image: &request.product_image,
            product_description: &request.product_description,
        };

        let (captions, flyer) = tokio::try_join!(
            self.post_flow::<CaptionsFlowResponse>("generateMarketingCaptionsFlow", input),
            self.post_flow::<FlyerFlowResponse>("generateProductFlyerFlow", input),
        )?;

        Ok(GeneratedContent {
            captions: captions.result.captions,
            flyer_image_uri: flyer.result.flyer_image_uri,
        })
    }

    async fn post_flow<T: DeserializeOwned>(
        &self,
        flow: &str,
        input: FlowInput<'_>,
    ) -> Result<T, GeneratorError> {
        let url = format!("{}/{}", self.base_url, flow);

        tracing::debug!("Invoking generation flow: {}", url);

        let response = self
            .http_client
            .post(&url)
            .timeout(self.timeout)
            .json(&FlowRequest { data: input })
            .send()
            .await
            .map_err(|e| GeneratorError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GeneratorError::FlowError(format!("{}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| GeneratorError::InvalidResponse(e.to_string()))
    }
}
