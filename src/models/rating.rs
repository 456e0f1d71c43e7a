use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Movie;

/// One user's score for one movie
///
/// A rating is uniquely identified by (user_id, movie_id); re-rating the
/// same movie overwrites the stored value rather than adding a row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieRating {
    pub id: Uuid,
    pub user_id: Uuid,
    pub movie_id: Uuid,
    pub rating: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A rating joined with its movie, the unit the analytics and the
/// recommendation prompt both consume
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RatedMovie {
    pub movie: Movie,
    pub rating: i32,
    pub created_at: DateTime<Utc>,
}

/// Validates a star rating, which must be an integer from 1 to 5
pub fn validate_stars(rating: i32) -> Result<(), String> {
    if (1..=5).contains(&rating) {
        Ok(())
    } else {
        Err(format!("rating must be between 1 and 5, got {}", rating))
    }
}
