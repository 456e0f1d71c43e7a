use axum::{extract::State, http::HeaderMap, Extension, Json};

use crate::{
    auth::bearer_token,
    error::AppResult,
    middleware::request_id::RequestId,
    services::recommendations::{self, RecommendationResponse},
    state::AppState,
};

/// Handler for the recommendation request
///
/// Repeated calls against identical stored state may return different
/// movies: the completion oracle is non-deterministic and the confidence
/// value is drawn per call.
pub async fn recommend(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    headers: HeaderMap,
) -> AppResult<Json<RecommendationResponse>> {
    let token = bearer_token(&headers)?;
    let user_id = state.identity.resolve_user(token).await?;

    tracing::info!(
        request_id = %request_id.0,
        %user_id,
        "Processing recommendation request"
    );

    let response = recommendations::recommend_for_user(
        state.store.as_ref(),
        state.completions.as_ref(),
        user_id,
    )
    .await?;

    Ok(Json(response))
}
