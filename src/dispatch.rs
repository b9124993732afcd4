// Request Dispatcher: picks exactly one analysis path for an inbound
// request.
//
// Precedence when several source fields are populated is fixed policy:
// youtube_url first, then video_url, then raw bytes. The YouTube path
// never downloads anything locally; the provider fetches the video
// server-side.

use crate::analysis::{self, AnalysisBackend};
use crate::error::ValidationError;
use crate::fetcher::SourceFetcher;
use crate::types::{AnalysisRequest, AnalysisResponse, ClipRange};

/// The one-of-three video source, made explicit so the precedence rule
/// and the "none provided" case are a single exhaustive match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoSource {
    Youtube { url: String, clip: Option<ClipRange> },
    Remote(String),
    Local(Vec<u8>),
}

pub fn resolve_source(
    youtube_url: Option<String>,
    video_url: Option<String>,
    video_bytes: Option<Vec<u8>>,
    start_offset: Option<String>,
    end_offset: Option<String>,
) -> Option<VideoSource> {
    if let Some(url) = youtube_url {
        return Some(VideoSource::Youtube {
            url,
            // Clip offsets only apply to provider-fetched video.
            clip: ClipRange::from_offsets(start_offset, end_offset),
        });
    }
    if let Some(url) = video_url {
        return Some(VideoSource::Remote(url));
    }
    video_bytes.map(VideoSource::Local)
}

pub async fn dispatch_analysis(
    fetcher: &SourceFetcher,
    backend: &dyn AnalysisBackend,
    default_model: &str,
    request: AnalysisRequest,
) -> AnalysisResponse {
    let AnalysisRequest {
        youtube_url,
        video_url,
        video_bytes,
        prompt,
        model,
        start_offset,
        end_offset,
    } = request;
    let model = model.unwrap_or_else(|| default_model.to_string());

    match resolve_source(youtube_url, video_url, video_bytes, start_offset, end_offset) {
        None => AnalysisResponse::failed(ValidationError::NoVideoSource.to_string()),
        Some(VideoSource::Youtube { url, clip }) => {
            analysis::analyze_youtube(backend, url, prompt, model, clip).await
        }
        Some(VideoSource::Remote(url)) => match fetcher.fetch(&url).await {
            Ok(bytes) => analysis::analyze_bytes(backend, bytes, prompt, model).await,
            Err(e) => AnalysisResponse::failed(e.to_string()),
        },
        Some(VideoSource::Local(bytes)) => {
            analysis::analyze_bytes(backend, bytes, prompt, model).await
        }
    }
}
