// Analysis Invoker: submits video to the analysis provider and folds
// every outcome into an AnalysisResponse envelope.
//
// Payloads under 20 MB ride inline in a single request; anything at or
// above the limit is written to a scoped temporary file and pushed
// through the provider's upload endpoint first, because the provider
// rejects inline payloads near that size.

use std::io::Write;
use std::path::Path;

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::types::{AnalysisResponse, ClipRange};

/// Inline submission limit. Exactly 20.0 MB already routes to the upload
/// path (the comparison is strictly-less-than).
pub const INLINE_SIZE_LIMIT_MB: f64 = 20.0;

/// Prompt used when the caller supplies none: asks for one detailed
/// description usable verbatim as a video-generation prompt.
pub const DEFAULT_PROMPT: &str = "\
Analyze this TikTok video and write a video generation prompt that captures its visual essence. This prompt should be detailed enough that feeding it to a video generation AI would recreate a similar video.

DO NOT include any text overlays or on-screen text in your prompt, as video generation models cannot reliably create text.

Focus on:
- The core visual concept and format
- Visual progression (what happens and when)
- Camera movements and shot types
- Subject actions and transformations
- Pacing and timing
- Mood and emotional tone
- Audio/music cues
- How the story is told through visuals alone

Write the output as a single, detailed video generation prompt that someone could use as-is with a video AI tool.

Format your output as:

VIDEO GENERATION PROMPT:
[Your detailed prompt here - write it as if you're instructing a video generation AI]";

/// Seam between the invoker and the concrete provider client, so policy
/// tests can substitute a recording double.
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    /// Single-request submission with the video as an inline payload.
    async fn describe_inline(
        &self,
        bytes: &[u8],
        prompt: &str,
        model: &str,
    ) -> Result<String, ProviderError>;

    /// Two-step submission: upload the file, then reference its handle.
    async fn describe_uploaded(
        &self,
        path: &Path,
        prompt: &str,
        model: &str,
    ) -> Result<String, ProviderError>;

    /// URL-referenced submission; the provider fetches the video itself.
    async fn describe_remote(
        &self,
        url: &str,
        prompt: &str,
        model: &str,
        clip: Option<&ClipRange>,
    ) -> Result<String, ProviderError>;
}

pub async fn analyze_bytes(
    backend: &dyn AnalysisBackend,
    bytes: Vec<u8>,
    prompt: Option<String>,
    model: String,
) -> AnalysisResponse {
    let size_mb = bytes.len() as f64 / (1024.0 * 1024.0);
    let prompt = prompt.unwrap_or_else(|| DEFAULT_PROMPT.to_string());

    let outcome = if size_mb < INLINE_SIZE_LIMIT_MB {
        tracing::info!(size_mb, "processing video inline");
        backend.describe_inline(&bytes, &prompt, &model).await
    } else {
        tracing::info!(size_mb, "uploading video through the file API");
        match write_upload_file(&bytes) {
            // The temp file lives exactly as long as the provider call;
            // it is removed when `upload` drops, on success and failure.
            Ok(upload) => backend.describe_uploaded(upload.path(), &prompt, &model).await,
            Err(e) => Err(ProviderError::Io(e)),
        }
    };

    match outcome {
        Ok(text) => AnalysisResponse::ok(text, model).with_size(size_mb),
        Err(e) => AnalysisResponse::failed(format!("Analysis failed: {}", e)).with_size(size_mb),
    }
}

pub async fn analyze_youtube(
    backend: &dyn AnalysisBackend,
    url: String,
    prompt: Option<String>,
    model: String,
    clip: Option<ClipRange>,
) -> AnalysisResponse {
    let prompt = prompt.unwrap_or_else(|| DEFAULT_PROMPT.to_string());

    match backend
        .describe_remote(&url, &prompt, &model, clip.as_ref())
        .await
    {
        Ok(text) => AnalysisResponse::ok(text, model).with_youtube_url(url),
        Err(e) => {
            AnalysisResponse::failed(format!("Analysis failed: {}", e)).with_youtube_url(url)
        }
    }
}

fn write_upload_file(bytes: &[u8]) -> std::io::Result<tempfile::NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix("video-upload-")
        .suffix(".mp4")
        .tempfile()?;
    file.write_all(bytes)?;
    file.flush()?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Mutex;

    const MB: usize = 1024 * 1024;

    #[derive(Debug)]
    enum Call {
        Inline { len: usize, prompt: String },
        Uploaded { path: PathBuf, existed: bool },
        Remote { url: String, clip: Option<ClipRange> },
    }

    #[derive(Default)]
    struct RecordingBackend {
        calls: Mutex<Vec<Call>>,
        fail: bool,
    }

    impl RecordingBackend {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        fn outcome(&self) -> Result<String, ProviderError> {
            if self.fail {
                Err(ProviderError::Api("quota exceeded".to_string()))
            } else {
                Ok("a looping macro shot of latte art".to_string())
            }
        }
    }

    #[async_trait]
    impl AnalysisBackend for RecordingBackend {
        async fn describe_inline(
            &self,
            bytes: &[u8],
            prompt: &str,
            _model: &str,
        ) -> Result<String, ProviderError> {
            self.calls.lock().unwrap().push(Call::Inline {
                len: bytes.len(),
                prompt: prompt.to_string(),
            });
            self.outcome()
        }

        async fn describe_uploaded(
            &self,
            path: &Path,
            _prompt: &str,
            _model: &str,
        ) -> Result<String, ProviderError> {
            self.calls.lock().unwrap().push(Call::Uploaded {
                path: path.to_path_buf(),
                existed: path.exists(),
            });
            self.outcome()
        }

        async fn describe_remote(
            &self,
            url: &str,
            _prompt: &str,
            _model: &str,
            clip: Option<&ClipRange>,
        ) -> Result<String, ProviderError> {
            self.calls.lock().unwrap().push(Call::Remote {
                url: url.to_string(),
                clip: clip.cloned(),
            });
            self.outcome()
        }
    }

    #[tokio::test]
    async fn small_payloads_go_inline() {
        let backend = RecordingBackend::default();
        let resp = analyze_bytes(&backend, vec![0u8; MB], None, "gemini-2.5-flash".to_string()).await;

        assert!(resp.success);
        assert_eq!(resp.video_size_mb, Some(1.0));
        let calls = backend.calls.lock().unwrap();
        assert!(matches!(&calls[..], [Call::Inline { len, .. }] if *len == MB));
    }

    #[tokio::test]
    async fn exactly_twenty_mb_goes_through_upload() {
        let backend = RecordingBackend::default();
        let resp = analyze_bytes(
            &backend,
            vec![0u8; 20 * MB],
            None,
            "gemini-2.5-flash".to_string(),
        )
        .await;

        assert!(resp.success);
        assert_eq!(resp.video_size_mb, Some(20.0));
        let calls = backend.calls.lock().unwrap();
        match &calls[..] {
            [Call::Uploaded { path, existed }] => {
                assert!(existed, "temp file must exist while the provider reads it");
                assert!(!path.exists(), "temp file must be removed after the call");
            }
            other => panic!("expected upload path, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn upload_temp_file_is_removed_on_provider_failure() {
        let backend = RecordingBackend::failing();
        let resp = analyze_bytes(
            &backend,
            vec![0u8; 21 * MB],
            None,
            "gemini-2.5-flash".to_string(),
        )
        .await;

        assert!(!resp.success);
        let calls = backend.calls.lock().unwrap();
        match &calls[..] {
            [Call::Uploaded { path, .. }] => assert!(!path.exists()),
            other => panic!("expected upload path, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn provider_failure_becomes_envelope_with_size() {
        let backend = RecordingBackend::failing();
        let resp = analyze_bytes(&backend, vec![0u8; MB], None, "gemini-2.5-flash".to_string()).await;

        assert!(!resp.success);
        let error = resp.error.unwrap();
        assert!(error.starts_with("Analysis failed: "), "got: {}", error);
        assert_eq!(resp.video_size_mb, Some(1.0));
    }

    #[tokio::test]
    async fn missing_prompt_falls_back_to_default() {
        let backend = RecordingBackend::default();
        analyze_bytes(&backend, vec![0u8; 16], None, "gemini-2.5-flash".to_string()).await;

        let calls = backend.calls.lock().unwrap();
        match &calls[..] {
            [Call::Inline { prompt, .. }] => {
                assert!(prompt.contains("VIDEO GENERATION PROMPT:"));
            }
            other => panic!("expected inline path, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn youtube_path_forwards_clip_and_echoes_url() {
        let backend = RecordingBackend::default();
        let clip = ClipRange::from_offsets(Some("10s".to_string()), Some("1m30s".to_string()));
        let resp = analyze_youtube(
            &backend,
            "https://www.youtube.com/watch?v=abc".to_string(),
            Some("describe the pacing".to_string()),
            "gemini-2.5-flash".to_string(),
            clip.clone(),
        )
        .await;

        assert!(resp.success);
        assert_eq!(
            resp.youtube_url.as_deref(),
            Some("https://www.youtube.com/watch?v=abc")
        );
        assert!(resp.video_size_mb.is_none());
        let calls = backend.calls.lock().unwrap();
        assert!(matches!(&calls[..], [Call::Remote { clip: c, .. }] if *c == clip));
    }

    #[tokio::test]
    async fn youtube_failure_still_echoes_url() {
        let backend = RecordingBackend::failing();
        let resp = analyze_youtube(
            &backend,
            "https://www.youtube.com/watch?v=abc".to_string(),
            None,
            "gemini-2.5-flash".to_string(),
            None,
        )
        .await;

        assert!(!resp.success);
        assert!(resp.error.unwrap().starts_with("Analysis failed: "));
        assert_eq!(
            resp.youtube_url.as_deref(),
            Some("https://www.youtube.com/watch?v=abc")
        );
    }
}
