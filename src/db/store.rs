use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Movie, MovieRating, Profile, QuizResponse, RatedMovie, WatchedMovie},
};

/// The preference-store surface consumed by the rest of the service
///
/// One implementation talks to Postgres; an in-memory implementation backs
/// the integration tests. The store is the single source of truth: readers
/// re-query it every time, nothing is cached on this side.
#[async_trait::async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Lists the full movie catalog
    async fn list_movies(&self) -> AppResult<Vec<Movie>>;

    /// Resolves catalog movies by exact title match
    ///
    /// Titles with no catalog row are simply absent from the result;
    /// callers decide whether that matters.
    async fn movies_by_titles(&self, titles: &[String]) -> AppResult<Vec<Movie>>;

    /// A user's ratings joined with their movies, highest rating first
    async fn ratings_for_user(&self, user_id: Uuid) -> AppResult<Vec<RatedMovie>>;

    /// All of a user's quiz answers
    async fn quiz_responses_for_user(&self, user_id: Uuid) -> AppResult<Vec<QuizResponse>>;

    /// A user's watch events joined with their movies, most recent first
    async fn watch_history_for_user(&self, user_id: Uuid) -> AppResult<Vec<WatchedMovie>>;

    /// The user's profile, if one exists
    async fn profile_for_user(&self, user_id: Uuid) -> AppResult<Option<Profile>>;

    /// Inserts or overwrites the rating for (user, movie)
    ///
    /// At most one row exists per pair; a re-rating updates the stored
    /// value and its updated_at timestamp in place.
    async fn upsert_rating(
        &self,
        user_id: Uuid,
        movie_id: Uuid,
        rating: i32,
    ) -> AppResult<MovieRating>;

    /// Appends one quiz answer row per (question, answer) pair
    async fn insert_quiz_responses(
        &self,
        user_id: Uuid,
        responses: &[(String, String)],
    ) -> AppResult<()>;

    /// Overwrites the profile preference fields derived from the quiz
    async fn update_profile_preferences(
        &self,
        user_id: Uuid,
        favorite_genres: Vec<String>,
        preferred_languages: Vec<String>,
    ) -> AppResult<()>;
}
