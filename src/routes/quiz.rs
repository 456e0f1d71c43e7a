use std::collections::HashMap;

use axum::{extract::State, http::HeaderMap, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{auth::bearer_token, error::AppResult, state::AppState};

/// Quiz question whose answers become the profile's favorite genres
const GENRE_QUESTION: &str = "genre";

/// Quiz question whose answer becomes the profile's preferred language
const LANGUAGE_QUESTION: &str = "language";

/// A quiz answer, either a single choice or a multi-select
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum QuizAnswer {
    Single(String),
    Multiple(Vec<String>),
}

impl QuizAnswer {
    /// Flattens the answer to the stored comma-joined form
    fn flatten(&self) -> String {
        match self {
            QuizAnswer::Single(answer) => answer.clone(),
            QuizAnswer::Multiple(answers) => answers.join(", "),
        }
    }

    fn as_list(&self) -> Vec<String> {
        match self {
            QuizAnswer::Single(answer) => vec![answer.clone()],
            QuizAnswer::Multiple(answers) => answers.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct QuizSubmission {
    pub answers: HashMap<String, QuizAnswer>,
}

/// Handler for quiz completion
///
/// Stores one response row per answered question, then refreshes the
/// caller's profile preferences from the genre and language answers.
pub async fn submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(submission): Json<QuizSubmission>,
) -> AppResult<Json<Value>> {
    let token = bearer_token(&headers)?;
    let user_id = state.identity.resolve_user(token).await?;

    let responses: Vec<(String, String)> = submission
        .answers
        .iter()
        .map(|(question_id, answer)| (question_id.clone(), answer.flatten()))
        .collect();

    state
        .store
        .insert_quiz_responses(user_id, &responses)
        .await?;

    let favorite_genres = submission
        .answers
        .get(GENRE_QUESTION)
        .map(QuizAnswer::as_list)
        .unwrap_or_default();
    let preferred_languages = submission
        .answers
        .get(LANGUAGE_QUESTION)
        .map(QuizAnswer::as_list)
        .unwrap_or_default();

    if !favorite_genres.is_empty() || !preferred_languages.is_empty() {
        state
            .store
            .update_profile_preferences(user_id, favorite_genres, preferred_languages)
            .await?;
    }

    tracing::info!(%user_id, saved = responses.len(), "Quiz responses stored");

    Ok(Json(json!({ "saved": responses.len() })))
}
