use sqlx::{postgres::PgPoolOptions, PgPool, Row};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Movie, MovieRating, Profile, QuizResponse, RatedMovie, WatchedMovie},
};

use super::PreferenceStore;

/// Creates a PostgreSQL connection pool and applies pending migrations
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

/// Postgres-backed preference store
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const MOVIE_COLUMNS: &str =
    "m.id, m.title, m.genre, m.year, m.rating, m.language, m.director, m.actors, m.image, m.description";

fn movie_from_row(row: &sqlx::postgres::PgRow) -> Result<Movie, sqlx::Error> {
    Ok(Movie {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        genre: row.try_get("genre")?,
        year: row.try_get("year")?,
        rating: row.try_get("rating")?,
        language: row.try_get("language")?,
        director: row.try_get("director")?,
        actors: row.try_get("actors")?,
        image: row.try_get("image")?,
        description: row.try_get("description")?,
    })
}

/// Maps constraint violations on writes to the rejection variant; anything
/// else stays a database error.
fn map_write_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(ref db) = e {
        use sqlx::error::ErrorKind;
        match db.kind() {
            ErrorKind::UniqueViolation
            | ErrorKind::ForeignKeyViolation
            | ErrorKind::NotNullViolation
            | ErrorKind::CheckViolation => {
                return AppError::WriteRejected(db.message().to_string());
            }
            _ => {}
        }
    }
    AppError::Database(e)
}

#[async_trait::async_trait]
impl PreferenceStore for PostgresStore {
    async fn list_movies(&self) -> AppResult<Vec<Movie>> {
        let sql = format!("SELECT {} FROM movies m ORDER BY m.title", MOVIE_COLUMNS);
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        let movies = rows
            .iter()
            .map(movie_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(movies)
    }

    async fn movies_by_titles(&self, titles: &[String]) -> AppResult<Vec<Movie>> {
        if titles.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {} FROM movies m WHERE m.title = ANY($1)",
            MOVIE_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(titles)
            .fetch_all(&self.pool)
            .await?;
        let movies = rows
            .iter()
            .map(movie_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(movies)
    }

    async fn ratings_for_user(&self, user_id: Uuid) -> AppResult<Vec<RatedMovie>> {
        let sql = format!(
            "SELECT {}, r.rating AS user_rating, r.created_at AS rated_at \
             FROM movie_ratings r JOIN movies m ON m.id = r.movie_id \
             WHERE r.user_id = $1 ORDER BY r.rating DESC",
            MOVIE_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        let mut ratings = Vec::with_capacity(rows.len());
        for row in &rows {
            ratings.push(RatedMovie {
                movie: movie_from_row(row)?,
                rating: row.try_get("user_rating")?,
                created_at: row.try_get("rated_at")?,
            });
        }
        Ok(ratings)
    }

    async fn quiz_responses_for_user(&self, user_id: Uuid) -> AppResult<Vec<QuizResponse>> {
        let rows = sqlx::query(
            "SELECT user_id, question_id, answer, created_at \
             FROM quiz_responses WHERE user_id = $1 ORDER BY created_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut responses = Vec::with_capacity(rows.len());
        for row in &rows {
            responses.push(QuizResponse {
                user_id: row.try_get("user_id")?,
                question_id: row.try_get("question_id")?,
                answer: row.try_get("answer")?,
                created_at: row.try_get("created_at")?,
            });
        }
        Ok(responses)
    }

    async fn watch_history_for_user(&self, user_id: Uuid) -> AppResult<Vec<WatchedMovie>> {
        let sql = format!(
            "SELECT {}, w.watched_at FROM watch_history w \
             JOIN movies m ON m.id = w.movie_id \
             WHERE w.user_id = $1 ORDER BY w.watched_at DESC",
            MOVIE_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        let mut history = Vec::with_capacity(rows.len());
        for row in &rows {
            history.push(WatchedMovie {
                movie: movie_from_row(row)?,
                watched_at: row.try_get("watched_at")?,
            });
        }
        Ok(history)
    }

    async fn profile_for_user(&self, user_id: Uuid) -> AppResult<Option<Profile>> {
        let row = sqlx::query(
            "SELECT id, username, avatar_url, favorite_genres, favorite_actors, \
             favorite_directors, preferred_languages \
             FROM profiles WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(Profile {
                id: row.try_get("id")?,
                username: row.try_get("username")?,
                avatar_url: row.try_get("avatar_url")?,
                favorite_genres: row.try_get("favorite_genres")?,
                favorite_actors: row.try_get("favorite_actors")?,
                favorite_directors: row.try_get("favorite_directors")?,
                preferred_languages: row.try_get("preferred_languages")?,
            })),
            None => Ok(None),
        }
    }

    async fn upsert_rating(
        &self,
        user_id: Uuid,
        movie_id: Uuid,
        rating: i32,
    ) -> AppResult<MovieRating> {
        let row = sqlx::query(
            "INSERT INTO movie_ratings (user_id, movie_id, rating) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (user_id, movie_id) \
             DO UPDATE SET rating = EXCLUDED.rating, updated_at = now() \
             RETURNING id, user_id, movie_id, rating, created_at, updated_at",
        )
        .bind(user_id)
        .bind(movie_id)
        .bind(rating)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(MovieRating {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            movie_id: row.try_get("movie_id")?,
            rating: row.try_get("rating")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    async fn insert_quiz_responses(
        &self,
        user_id: Uuid,
        responses: &[(String, String)],
    ) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        for (question_id, answer) in responses {
            sqlx::query(
                "INSERT INTO quiz_responses (user_id, question_id, answer) VALUES ($1, $2, $3)",
            )
            .bind(user_id)
            .bind(question_id)
            .bind(answer)
            .execute(&mut *tx)
            .await
            .map_err(map_write_error)?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn update_profile_preferences(
        &self,
        user_id: Uuid,
        favorite_genres: Vec<String>,
        preferred_languages: Vec<String>,
    ) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO profiles (id, favorite_genres, preferred_languages) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (id) \
             DO UPDATE SET favorite_genres = EXCLUDED.favorite_genres, \
                           preferred_languages = EXCLUDED.preferred_languages, \
                           updated_at = now()",
        )
        .bind(user_id)
        .bind(&favorite_genres)
        .bind(&preferred_languages)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;
        Ok(())
    }
}
