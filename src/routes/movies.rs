use axum::{extract::State, Json};

use crate::{error::AppResult, models::Movie, state::AppState};

/// Handler for the catalog listing
pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<Movie>>> {
    let movies = state.store.list_movies().await?;
    Ok(Json(movies))
}
