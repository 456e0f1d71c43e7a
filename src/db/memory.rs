use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Movie, MovieRating, Profile, QuizResponse, RatedMovie, WatchedMovie},
};

use super::PreferenceStore;

/// In-memory preference store
///
/// Backs the integration tests and local development without a database.
/// Semantics mirror the Postgres store: one rating row per (user, movie),
/// ordered reads, append-only quiz and watch history.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Default)]
struct Inner {
    movies: Vec<Movie>,
    ratings: Vec<MovieRating>,
    quiz_responses: Vec<QuizResponse>,
    watch_history: Vec<WatchEvent>,
    profiles: HashMap<Uuid, Profile>,
}

struct WatchEvent {
    user_id: Uuid,
    movie_id: Uuid,
    watched_at: DateTime<Utc>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a catalog movie
    pub async fn add_movie(&self, movie: Movie) {
        self.inner.write().await.movies.push(movie);
    }

    /// Seeds a rating row directly, bypassing the upsert path
    pub async fn add_rating(&self, rating: MovieRating) {
        self.inner.write().await.ratings.push(rating);
    }

    /// Seeds a watch event
    pub async fn add_watch_event(&self, user_id: Uuid, movie_id: Uuid, watched_at: DateTime<Utc>) {
        self.inner.write().await.watch_history.push(WatchEvent {
            user_id,
            movie_id,
            watched_at,
        });
    }

    /// Seeds a profile
    pub async fn add_profile(&self, profile: Profile) {
        self.inner.write().await.profiles.insert(profile.id, profile);
    }

    /// Total stored rating rows, across all users
    pub async fn rating_count(&self) -> usize {
        self.inner.read().await.ratings.len()
    }

    /// Total stored quiz response rows, across all users
    pub async fn quiz_response_count(&self) -> usize {
        self.inner.read().await.quiz_responses.len()
    }
}

#[async_trait::async_trait]
impl PreferenceStore for MemoryStore {
    async fn list_movies(&self) -> AppResult<Vec<Movie>> {
        let inner = self.inner.read().await;
        let mut movies = inner.movies.clone();
        movies.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(movies)
    }

    async fn movies_by_titles(&self, titles: &[String]) -> AppResult<Vec<Movie>> {
        let inner = self.inner.read().await;
        Ok(inner
            .movies
            .iter()
            .filter(|m| titles.iter().any(|t| t == &m.title))
            .cloned()
            .collect())
    }

    async fn ratings_for_user(&self, user_id: Uuid) -> AppResult<Vec<RatedMovie>> {
        let inner = self.inner.read().await;
        let mut rated: Vec<RatedMovie> = inner
            .ratings
            .iter()
            .filter(|r| r.user_id == user_id)
            .filter_map(|r| {
                inner
                    .movies
                    .iter()
                    .find(|m| m.id == r.movie_id)
                    .map(|movie| RatedMovie {
                        movie: movie.clone(),
                        rating: r.rating,
                        created_at: r.created_at,
                    })
            })
            .collect();
        rated.sort_by(|a, b| b.rating.cmp(&a.rating));
        Ok(rated)
    }

    async fn quiz_responses_for_user(&self, user_id: Uuid) -> AppResult<Vec<QuizResponse>> {
        let inner = self.inner.read().await;
        Ok(inner
            .quiz_responses
            .iter()
            .filter(|q| q.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn watch_history_for_user(&self, user_id: Uuid) -> AppResult<Vec<WatchedMovie>> {
        let inner = self.inner.read().await;
        let mut history: Vec<WatchedMovie> = inner
            .watch_history
            .iter()
            .filter(|w| w.user_id == user_id)
            .filter_map(|w| {
                inner
                    .movies
                    .iter()
                    .find(|m| m.id == w.movie_id)
                    .map(|movie| WatchedMovie {
                        movie: movie.clone(),
                        watched_at: w.watched_at,
                    })
            })
            .collect();
        history.sort_by(|a, b| b.watched_at.cmp(&a.watched_at));
        Ok(history)
    }

    async fn profile_for_user(&self, user_id: Uuid) -> AppResult<Option<Profile>> {
        let inner = self.inner.read().await;
        Ok(inner.profiles.get(&user_id).cloned())
    }

    async fn upsert_rating(
        &self,
        user_id: Uuid,
        movie_id: Uuid,
        rating: i32,
    ) -> AppResult<MovieRating> {
        let mut inner = self.inner.write().await;
        let now = Utc::now();

        if let Some(existing) = inner
            .ratings
            .iter_mut()
            .find(|r| r.user_id == user_id && r.movie_id == movie_id)
        {
            existing.rating = rating;
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let row = MovieRating {
            id: Uuid::new_v4(),
            user_id,
            movie_id,
            rating,
            created_at: now,
            updated_at: now,
        };
        inner.ratings.push(row.clone());
        Ok(row)
    }

    async fn insert_quiz_responses(
        &self,
        user_id: Uuid,
        responses: &[(String, String)],
    ) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        let now = Utc::now();
        for (question_id, answer) in responses {
            inner.quiz_responses.push(QuizResponse {
                user_id,
                question_id: question_id.clone(),
                answer: answer.clone(),
                created_at: now,
            });
        }
        Ok(())
    }

    async fn update_profile_preferences(
        &self,
        user_id: Uuid,
        favorite_genres: Vec<String>,
        preferred_languages: Vec<String>,
    ) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        let profile = inner
            .profiles
            .entry(user_id)
            .or_insert_with(|| Profile::new(user_id));
        profile.favorite_genres = Some(favorite_genres);
        profile.preferred_languages = Some(preferred_languages);
        Ok(())
    }
}
