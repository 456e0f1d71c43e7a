use axum::{extract::State, http::HeaderMap, Json};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    auth::bearer_token,
    error::{AppError, AppResult},
    events::RatingChanged,
    models::{validate_stars, MovieRating},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct RateMovieRequest {
    pub movie_id: Uuid,
    pub rating: i32,
}

/// Handler for the rating upsert
///
/// One row exists per (caller, movie); a repeat submission overwrites it.
/// Authentication comes first so an unauthenticated caller causes no
/// store mutation at all.
pub async fn rate(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<RateMovieRequest>,
) -> AppResult<Json<MovieRating>> {
    let token = bearer_token(&headers)?;
    let user_id = state.identity.resolve_user(token).await?;

    validate_stars(request.rating).map_err(AppError::InvalidInput)?;

    let row = state
        .store
        .upsert_rating(user_id, request.movie_id, request.rating)
        .await?;

    tracing::info!(
        %user_id,
        movie_id = %row.movie_id,
        rating = row.rating,
        "Rating stored"
    );

    state.rating_events.publish(RatingChanged {
        user_id,
        movie_id: row.movie_id,
        rating: row.rating,
    });

    Ok(Json(row))
}
