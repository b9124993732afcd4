// POST /generate - reference-to-video generation endpoint.

use axum::{extract::Extension, response::Json, routing::post, Router};
use std::sync::Arc;

use crate::generation;
use crate::types::{GenerationRequest, GenerationResponse};
use crate::AppState;

pub fn generate_routes() -> Router {
    Router::new().route("/generate", post(generate_endpoint))
}

async fn generate_endpoint(
    Extension(state): Extension<Arc<AppState>>,
    Json(body): Json<GenerationRequest>,
) -> Json<GenerationResponse> {
    let Some(fal) = state.fal_client.as_ref() else {
        return Json(GenerationResponse::failed(
            "generation provider is not configured (set FAL_KEY)",
        ));
    };

    Json(generation::generate_video(fal, body).await)
}
