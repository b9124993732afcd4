// fal.ai queue client for the Veo reference-to-video model.
//
// The queue API decouples submission from completion: submit returns a
// request id plus status/response URLs, status is polled until the job
// leaves the queue, then the result document is fetched. From the
// caller's point of view this behaves like one synchronous call.

use std::time::{Duration, Instant};

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::error::ProviderError;
use crate::generation::GenerationBackend;
use crate::types::GenerationRequest;

pub const VEO_MODEL_ID: &str = "fal-ai/veo3.1/reference-to-video";

#[derive(Debug, Clone)]
pub struct FalClient {
    client: Client,
    api_key: String,
    queue_base_url: String,
    poll_interval: Duration,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct FalSubmitResponse {
    request_id: String,
    status_url: String,
    response_url: String,
}

#[derive(Debug, Deserialize)]
struct FalStatusResponse {
    status: String,
}

#[derive(Debug, Deserialize)]
struct FalErrorResponse {
    detail: String,
}

impl FalClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            queue_base_url: "https://queue.fal.run".to_string(),
            poll_interval: Duration::from_secs(3),
            timeout: Duration::from_secs(600),
        }
    }

    async fn submit(&self, request: &GenerationRequest) -> Result<FalSubmitResponse, ProviderError> {
        let url = format!("{}/{}", self.queue_base_url, VEO_MODEL_ID);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Key {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api(error_detail(&text)));
        }

        Ok(response.json().await?)
    }

    async fn poll_until_ready(
        &self,
        request_id: &str,
        status_url: &str,
    ) -> Result<(), ProviderError> {
        let start = Instant::now();

        loop {
            if start.elapsed() > self.timeout {
                return Err(ProviderError::Timeout(self.timeout.as_secs()));
            }

            let response = self
                .client
                .get(status_url)
                .header("Authorization", format!("Key {}", self.api_key))
                .send()
                .await?;

            if !response.status().is_success() {
                let text = response.text().await.unwrap_or_default();
                return Err(ProviderError::Api(error_detail(&text)));
            }

            let status: FalStatusResponse = response.json().await?;
            match status.status.as_str() {
                "COMPLETED" => return Ok(()),
                "IN_QUEUE" | "IN_PROGRESS" => {
                    tracing::debug!(
                        request_id,
                        status = %status.status,
                        elapsed_secs = start.elapsed().as_secs(),
                        "waiting for fal.ai job"
                    );
                    tokio::time::sleep(self.poll_interval).await;
                }
                "FAILED" => {
                    return Err(ProviderError::Api(
                        "fal.ai reported the job as failed".to_string(),
                    ))
                }
                other => {
                    return Err(ProviderError::Api(format!(
                        "fal.ai returned unexpected status: {}",
                        other
                    )))
                }
            }
        }
    }

    async fn fetch_result(&self, response_url: &str) -> Result<Value, ProviderError> {
        let response = self
            .client
            .get(response_url)
            .header("Authorization", format!("Key {}", self.api_key))
            .send()
            .await?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api(error_detail(&text)));
        }

        Ok(response.json().await?)
    }
}

/// Pull the human-readable detail out of a fal.ai error body, falling
/// back to the raw text.
fn error_detail(text: &str) -> String {
    match serde_json::from_str::<FalErrorResponse>(text) {
        Ok(parsed) => parsed.detail,
        Err(_) => text.to_string(),
    }
}

#[async_trait::async_trait]
impl GenerationBackend for FalClient {
    async fn reference_to_video(
        &self,
        request: &GenerationRequest,
    ) -> Result<Value, ProviderError> {
        let submitted = self.submit(request).await?;
        tracing::debug!(request_id = %submitted.request_id, model = VEO_MODEL_ID, "submitted fal.ai job");

        self.poll_until_ready(&submitted.request_id, &submitted.status_url)
            .await?;
        tracing::debug!(request_id = %submitted.request_id, "fal.ai job completed");

        self.fetch_result(&submitted.response_url).await
    }
}
