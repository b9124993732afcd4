// POST /analyze - video analysis endpoint.
//
// Always answers HTTP 200 with an AnalysisResponse envelope; provider
// and input failures are carried in the `success`/`error` fields.

use axum::{extract::Extension, response::Json, routing::post, Router};
use base64::prelude::*;
use std::sync::Arc;

use crate::dispatch;
use crate::types::{AnalysisRequest, AnalysisResponse, AnalyzeRequestBody};
use crate::AppState;

pub fn analyze_routes() -> Router {
    Router::new().route("/analyze", post(analyze_endpoint))
}

async fn analyze_endpoint(
    Extension(state): Extension<Arc<AppState>>,
    Json(body): Json<AnalyzeRequestBody>,
) -> Json<AnalysisResponse> {
    let Some(gemini) = state.gemini_client.as_ref() else {
        return Json(AnalysisResponse::failed(
            "analysis provider is not configured (set GEMINI_API_KEY)",
        ));
    };

    let video_bytes = match body.video_data {
        Some(encoded) => match BASE64_STANDARD.decode(encoded.as_bytes()) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                return Json(AnalysisResponse::failed(format!(
                    "invalid base64 in video_data: {}",
                    e
                )))
            }
        },
        None => None,
    };

    let request = AnalysisRequest {
        youtube_url: body.youtube_url,
        video_url: body.video_url,
        video_bytes,
        prompt: body.prompt,
        model: body.model,
        start_offset: body.start_offset,
        end_offset: body.end_offset,
    };

    Json(
        dispatch::dispatch_analysis(
            &state.fetcher,
            gemini,
            &state.config.default_model,
            request,
        )
        .await,
    )
}
