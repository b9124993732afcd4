// Generation Invoker: validates the request, submits one synchronous
// job to the generation provider, and folds the outcome into a
// GenerationResponse envelope.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{ProviderError, ValidationError};
use crate::types::{GenerationRequest, GenerationResponse};

/// Seam between the invoker and the concrete provider client.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Submit a reference-to-video job and block until the provider
    /// reports completion, returning the raw result document.
    async fn reference_to_video(
        &self,
        request: &GenerationRequest,
    ) -> Result<Value, ProviderError>;
}

pub async fn generate_video(
    backend: &dyn GenerationBackend,
    request: GenerationRequest,
) -> GenerationResponse {
    if request.image_urls.is_empty() {
        return GenerationResponse::failed(ValidationError::EmptyImageList.to_string());
    }

    tracing::info!(
        images = request.image_urls.len(),
        duration = %request.duration,
        "submitting video generation job"
    );

    match backend.reference_to_video(&request).await {
        // A completed job without an extractable URL is still reported as
        // success with a null URL; see the test flagging this.
        Ok(result) => GenerationResponse::ok(extract_video_url(&result)),
        Err(e) => GenerationResponse::failed(format!("Video generation failed: {}", e)),
    }
}

fn extract_video_url(result: &Value) -> Option<String> {
    result
        .get("video")?
        .get("url")?
        .as_str()
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Resolution;
    use serde_json::json;

    fn request(image_urls: Vec<&str>) -> GenerationRequest {
        GenerationRequest {
            image_urls: image_urls.into_iter().map(String::from).collect(),
            prompt: "zoom in slowly".to_string(),
            duration: "8s".to_string(),
            resolution: Resolution::Hd720,
            generate_audio: true,
        }
    }

    struct StubBackend {
        result: Result<Value, ProviderError>,
    }

    #[async_trait]
    impl GenerationBackend for StubBackend {
        async fn reference_to_video(
            &self,
            _request: &GenerationRequest,
        ) -> Result<Value, ProviderError> {
            match &self.result {
                Ok(v) => Ok(v.clone()),
                Err(_) => Err(ProviderError::Api("model overloaded".to_string())),
            }
        }
    }

    struct PanickingBackend;

    #[async_trait]
    impl GenerationBackend for PanickingBackend {
        async fn reference_to_video(
            &self,
            _request: &GenerationRequest,
        ) -> Result<Value, ProviderError> {
            panic!("backend must not be contacted");
        }
    }

    #[tokio::test]
    async fn completed_job_yields_video_url() {
        let backend = StubBackend {
            result: Ok(json!({"video": {"url": "https://out/v.mp4"}})),
        };
        let resp = generate_video(&backend, request(vec!["https://x/a.jpg"])).await;

        assert!(resp.success);
        assert_eq!(resp.video_url.as_deref(), Some("https://out/v.mp4"));
        assert!(resp.error.is_none());
    }

    // Likely a latent looseness inherited from the original behavior: a
    // completed job with no video.url field still counts as success.
    #[tokio::test]
    async fn completed_job_without_url_is_still_success() {
        let backend = StubBackend {
            result: Ok(json!({"seed": 42})),
        };
        let resp = generate_video(&backend, request(vec!["https://x/a.jpg"])).await;

        assert!(resp.success);
        assert!(resp.video_url.is_none());
        assert!(resp.error.is_none());
    }

    #[tokio::test]
    async fn empty_image_list_is_rejected_without_provider_contact() {
        let resp = generate_video(&PanickingBackend, request(vec![])).await;

        assert!(!resp.success);
        assert_eq!(
            resp.error.as_deref(),
            Some("image_urls must contain at least one entry")
        );
    }

    #[tokio::test]
    async fn provider_failure_becomes_envelope() {
        let backend = StubBackend {
            result: Err(ProviderError::Api("model overloaded".to_string())),
        };
        let resp = generate_video(&backend, request(vec!["https://x/a.jpg"])).await;

        assert!(!resp.success);
        assert_eq!(
            resp.error.as_deref(),
            Some("Video generation failed: model overloaded")
        );
    }

    #[test]
    fn video_url_extraction_requires_nested_field() {
        assert_eq!(
            extract_video_url(&json!({"video": {"url": "https://out/v.mp4"}})).as_deref(),
            Some("https://out/v.mp4")
        );
        assert!(extract_video_url(&json!({"video": {}})).is_none());
        assert!(extract_video_url(&json!({})).is_none());
        assert!(extract_video_url(&json!({"video": {"url": 7}})).is_none());
    }
}
