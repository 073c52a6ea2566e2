use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use tessera_tools::SerperClient;

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct SearchImageRequest {
    pub query: String,
}

/// Resolve an image URL for a search query, consulting the shared cache
/// before calling out to Serper.
pub async fn search_image(
    State(state): State<AppState>,
    Json(req): Json<SearchImageRequest>,
) -> ApiResult<Json<Value>> {
    if req.query.is_empty() {
        return Err(ApiError::BadRequest("query must not be empty".into()));
    }

    if let Some(url) = state.image_cache.lock().await.get(&req.query) {
        tracing::debug!(query = %req.query, "image cache hit");
        return Ok(Json(json!({ "imageUrl": url })));
    }

    let key = &state.config.serper_api_key;
    if key.is_empty() {
        return Err(ApiError::BadRequest(
            "No Serper API key configured. Set SERPER_API_KEY.".into(),
        ));
    }

    let client = SerperClient::new(key)?;
    let url = client
        .search_image(&req.query)
        .await?
        .ok_or_else(|| ApiError::NotFound("No images found".into()))?;

    state
        .image_cache
        .lock()
        .await
        .insert(req.query.as_str(), url.as_str());
    Ok(Json(json!({ "imageUrl": url })))
}
