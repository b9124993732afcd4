// Wire types for the /analyze and /generate endpoints.
//
// Both endpoints answer HTTP 200 with a result envelope; `success`
// carries the outcome and `error` the human-readable cause on failure.

use serde::{Deserialize, Serialize};

/// JSON body accepted by `POST /analyze`.
///
/// Exactly one of `video_url` / `video_data` / `youtube_url` is expected;
/// when several are populated the dispatcher resolves them with a fixed
/// precedence (YouTube first, then URL, then raw bytes).
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeRequestBody {
    pub video_url: Option<String>,
    /// Base64-encoded video bytes.
    pub video_data: Option<String>,
    pub youtube_url: Option<String>,
    pub prompt: Option<String>,
    pub model: Option<String>,
    /// Clip start, e.g. "10s" or "1m30s". YouTube sources only.
    pub start_offset: Option<String>,
    /// Clip end, e.g. "2m" or "3m45s". YouTube sources only.
    pub end_offset: Option<String>,
}

/// Analysis request after base64 decoding, ready for dispatch.
#[derive(Debug, Clone, Default)]
pub struct AnalysisRequest {
    pub youtube_url: Option<String>,
    pub video_url: Option<String>,
    pub video_bytes: Option<Vec<u8>>,
    pub prompt: Option<String>,
    pub model: Option<String>,
    pub start_offset: Option<String>,
    pub end_offset: Option<String>,
}

/// Sub-range of a referenced video, passed through to the provider verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipRange {
    pub start_offset: Option<String>,
    pub end_offset: Option<String>,
}

impl ClipRange {
    pub fn from_offsets(start: Option<String>, end: Option<String>) -> Option<Self> {
        if start.is_none() && end.is_none() {
            None
        } else {
            Some(Self {
                start_offset: start,
                end_offset: end,
            })
        }
    }
}

/// Result envelope for `POST /analyze`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_size_mb: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub youtube_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalysisResponse {
    pub fn ok(analysis: String, model: String) -> Self {
        Self {
            success: true,
            analysis: Some(analysis),
            model: Some(model),
            video_size_mb: None,
            youtube_url: None,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            analysis: None,
            model: None,
            video_size_mb: None,
            youtube_url: None,
            error: Some(error.into()),
        }
    }

    pub fn with_size(mut self, size_mb: f64) -> Self {
        self.video_size_mb = Some(size_mb);
        self
    }

    pub fn with_youtube_url(mut self, url: impl Into<String>) -> Self {
        self.youtube_url = Some(url.into());
        self
    }
}

/// JSON body accepted by `POST /generate`.
///
/// Field names and defaults match the fal.ai Veo reference-to-video
/// arguments, so this struct doubles as the submitted job payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Reference image URLs, at least one.
    pub image_urls: Vec<String>,
    pub prompt: String,
    #[serde(default = "default_duration")]
    pub duration: String,
    #[serde(default)]
    pub resolution: Resolution,
    #[serde(default = "default_generate_audio")]
    pub generate_audio: bool,
}

fn default_duration() -> String {
    "8s".to_string()
}

fn default_generate_audio() -> bool {
    true
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    #[default]
    #[serde(rename = "720p")]
    Hd720,
    #[serde(rename = "1080p")]
    Fhd1080,
}

/// Result envelope for `POST /generate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GenerationResponse {
    pub fn ok(video_url: Option<String>) -> Self {
        Self {
            success: true,
            video_url,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            video_url: None,
            error: Some(error.into()),
        }
    }
}
