use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Movie;

/// Derived user preferences, updated after each quiz completion
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    /// Matches the owning user's id
    pub id: Uuid,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
    pub favorite_genres: Option<Vec<String>>,
    pub favorite_actors: Option<Vec<String>>,
    pub favorite_directors: Option<Vec<String>>,
    pub preferred_languages: Option<Vec<String>>,
}

impl Profile {
    /// Creates an empty profile for a user
    pub fn new(user_id: Uuid) -> Self {
        Self {
            id: user_id,
            username: None,
            avatar_url: None,
            favorite_genres: None,
            favorite_actors: None,
            favorite_directors: None,
            preferred_languages: None,
        }
    }
}

/// One answer to one quiz question
///
/// Multi-select answers arrive as a list and are flattened to a
/// comma-joined string before storage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuizResponse {
    pub user_id: Uuid,
    pub question_id: String,
    pub answer: String,
    pub created_at: DateTime<Utc>,
}

/// A watch event joined with its movie
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchedMovie {
    pub movie: Movie,
    pub watched_at: DateTime<Utc>,
}
