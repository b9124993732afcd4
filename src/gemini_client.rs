// Gemini REST client.
//
// Talks to the generativelanguage API directly with reqwest. Small
// payloads ride inside the generateContent request as base64 inline
// data; large ones go through the File API first (resumable upload,
// then polling until the file is ACTIVE). YouTube URLs are passed as
// fileData parts so Gemini fetches the video server-side.

use std::path::Path;

use base64::prelude::*;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::analysis::AnalysisBackend;
use crate::error::ProviderError;
use crate::types::ClipRange;

const VIDEO_MIME_TYPE: &str = "video/mp4";

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
    FileData {
        #[serde(rename = "fileData")]
        file_data: FileData,
        #[serde(rename = "videoMetadata", skip_serializing_if = "Option::is_none")]
        video_metadata: Option<VideoMetadata>,
    },
}

#[derive(Debug, Serialize)]
struct InlineData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    /// Base64-encoded payload.
    data: String,
}

#[derive(Debug, Serialize)]
struct FileData {
    #[serde(rename = "mimeType", skip_serializing_if = "Option::is_none")]
    mime_type: Option<String>,
    #[serde(rename = "fileUri")]
    file_uri: String,
}

#[derive(Debug, Serialize)]
struct VideoMetadata {
    #[serde(rename = "startOffset", skip_serializing_if = "Option::is_none")]
    start_offset: Option<String>,
    #[serde(rename = "endOffset", skip_serializing_if = "Option::is_none")]
    end_offset: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    file: FileResource,
}

#[derive(Debug, Deserialize)]
struct FileResource {
    name: String,
    uri: String,
    state: String,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: "https://generativelanguage.googleapis.com".to_string(),
        }
    }

    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<String, ProviderError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        );

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Gemini API error: {}", error_text);
            return Err(ProviderError::Api(format!(
                "Gemini API error: {}",
                error_text
            )));
        }

        let response_text = response.text().await?;
        let body: GenerateContentResponse = serde_json::from_str(&response_text)?;
        extract_candidate_text(body).ok_or(ProviderError::EmptyResponse)
    }

    /// Upload a video through the File API and wait until it is usable.
    ///
    /// Returns the file URI to cite in a `fileData` part.
    async fn upload_file(&self, path: &Path) -> Result<String, ProviderError> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("video.mp4");
        let content = tokio::fs::read(path).await?;
        let file_size = content.len();

        tracing::debug!(file_name, file_size, "starting resumable upload");

        let init_url = format!("{}/upload/v1beta/files?key={}", self.base_url, self.api_key);
        let init_response = self
            .client
            .post(&init_url)
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", file_size.to_string())
            .header("X-Goog-Upload-Header-Content-Type", VIDEO_MIME_TYPE)
            .header("Content-Type", "application/json")
            .json(&serde_json::json!({ "file": { "display_name": file_name } }))
            .send()
            .await?;

        let upload_url = init_response
            .headers()
            .get("x-goog-upload-url")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
            .ok_or_else(|| ProviderError::Upload("no upload URL in response".to_string()))?;

        let upload_response = self
            .client
            .post(&upload_url)
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .header("Content-Length", file_size.to_string())
            .body(content)
            .send()
            .await?;

        if !upload_response.status().is_success() {
            let error_text = upload_response.text().await.unwrap_or_default();
            return Err(ProviderError::Upload(error_text));
        }

        let uploaded: UploadResponse = upload_response.json().await?;
        self.wait_for_file_active(&uploaded.file).await
    }

    /// Poll the file resource until Gemini finishes processing it.
    async fn wait_for_file_active(&self, file: &FileResource) -> Result<String, ProviderError> {
        if file.state == "ACTIVE" {
            return Ok(file.uri.clone());
        }

        let url = format!("{}/v1beta/{}?key={}", self.base_url, file.name, self.api_key);
        for _ in 0..60 {
            tokio::time::sleep(tokio::time::Duration::from_secs(2)).await;

            let response = self.client.get(&url).send().await?;
            let status: FileResource = response.json().await?;
            match status.state.as_str() {
                "ACTIVE" => return Ok(status.uri),
                "FAILED" => {
                    return Err(ProviderError::Upload("file processing failed".to_string()))
                }
                _ => {}
            }
        }

        Err(ProviderError::Timeout(120))
    }
}

fn extract_candidate_text(response: GenerateContentResponse) -> Option<String> {
    response
        .candidates?
        .into_iter()
        .next()?
        .content?
        .parts
        .into_iter()
        .find_map(|part| part.text)
}

#[async_trait::async_trait]
impl AnalysisBackend for GeminiClient {
    async fn describe_inline(
        &self,
        bytes: &[u8],
        prompt: &str,
        model: &str,
    ) -> Result<String, ProviderError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: VIDEO_MIME_TYPE.to_string(),
                            data: BASE64_STANDARD.encode(bytes),
                        },
                    },
                    Part::Text {
                        text: prompt.to_string(),
                    },
                ],
            }],
        };
        self.generate_content(model, &request).await
    }

    async fn describe_uploaded(
        &self,
        path: &Path,
        prompt: &str,
        model: &str,
    ) -> Result<String, ProviderError> {
        let file_uri = self.upload_file(path).await?;
        tracing::debug!(file_uri, "file uploaded, requesting analysis");

        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::FileData {
                        file_data: FileData {
                            mime_type: Some(VIDEO_MIME_TYPE.to_string()),
                            file_uri,
                        },
                        video_metadata: None,
                    },
                    Part::Text {
                        text: prompt.to_string(),
                    },
                ],
            }],
        };
        self.generate_content(model, &request).await
    }

    async fn describe_remote(
        &self,
        url: &str,
        prompt: &str,
        model: &str,
        clip: Option<&ClipRange>,
    ) -> Result<String, ProviderError> {
        let video_metadata = clip.map(|clip| VideoMetadata {
            start_offset: clip.start_offset.clone(),
            end_offset: clip.end_offset.clone(),
        });

        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::FileData {
                        file_data: FileData {
                            mime_type: None,
                            file_uri: url.to_string(),
                        },
                        video_metadata,
                    },
                    Part::Text {
                        text: prompt.to_string(),
                    },
                ],
            }],
        };
        self.generate_content(model, &request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_part_uses_gemini_field_names() {
        let part = Part::InlineData {
            inline_data: InlineData {
                mime_type: VIDEO_MIME_TYPE.to_string(),
                data: BASE64_STANDARD.encode(b"abc"),
            },
        };
        let json = serde_json::to_value(&part).unwrap();
        assert_eq!(json["inlineData"]["mimeType"], "video/mp4");
        assert_eq!(json["inlineData"]["data"], "YWJj");
    }

    #[test]
    fn youtube_part_with_clip_carries_video_metadata() {
        let part = Part::FileData {
            file_data: FileData {
                mime_type: None,
                file_uri: "https://www.youtube.com/watch?v=abc".to_string(),
            },
            video_metadata: Some(VideoMetadata {
                start_offset: Some("1m30s".to_string()),
                end_offset: Some("2m".to_string()),
            }),
        };
        let json = serde_json::to_value(&part).unwrap();
        assert_eq!(
            json["fileData"]["fileUri"],
            "https://www.youtube.com/watch?v=abc"
        );
        assert!(json["fileData"].get("mimeType").is_none());
        assert_eq!(json["videoMetadata"]["startOffset"], "1m30s");
        assert_eq!(json["videoMetadata"]["endOffset"], "2m");
    }

    #[test]
    fn youtube_part_without_clip_omits_video_metadata() {
        let part = Part::FileData {
            file_data: FileData {
                mime_type: None,
                file_uri: "https://www.youtube.com/watch?v=abc".to_string(),
            },
            video_metadata: None,
        };
        let json = serde_json::to_value(&part).unwrap();
        assert!(json.get("videoMetadata").is_none());
    }

    #[test]
    fn candidate_text_is_extracted() {
        let body: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates": [{"content": {"parts": [{"text": "a slow pan over a beach"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(
            extract_candidate_text(body).as_deref(),
            Some("a slow pan over a beach")
        );
    }

    #[test]
    fn empty_candidates_yield_none() {
        let body: GenerateContentResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        assert!(extract_candidate_text(body).is_none());
    }
}
