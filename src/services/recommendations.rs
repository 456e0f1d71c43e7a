use rand::Rng;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    db::PreferenceStore,
    error::AppResult,
    models::{Movie, Profile, QuizResponse, RatedMovie, WatchedMovie},
    services::completion::{parse_recommended_titles, CompletionProvider},
};

/// Fixed instruction sent with every recommendation request
const SYSTEM_PROMPT: &str = "You are a movie recommendation AI. Based on user preferences, \
    ratings, and watch history, recommend 5 movies from the catalog that match their taste. \
    Return ONLY a JSON array of movie titles, nothing else. \
    Format: [\"Movie 1\", \"Movie 2\", \"Movie 3\", \"Movie 4\", \"Movie 5\"]";

/// How many of the caller's top-rated and recently-watched titles are
/// embedded in the prompt
const PROMPT_SAMPLE_SIZE: usize = 5;

const NO_QUIZ_DATA: &str = "No quiz data";
const NO_RATINGS: &str = "No ratings";
const NO_WATCH_HISTORY: &str = "No watch history";
const NOT_SPECIFIED: &str = "Not specified";

/// Ranked recommendations for one caller
#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub recommendations: Vec<Movie>,
    /// Display-only value in [0.85, 1.0), drawn at random per call. It
    /// carries no signal from the completion model and must not be read
    /// as one.
    pub confidence: f64,
}

/// Produces ranked catalog movies for an authenticated caller.
///
/// Gathers the caller's stored preferences, reduces them to a compact text
/// prompt, asks the external completion service for titles, and resolves
/// those titles against the catalog. A completion reply that fails
/// validation degrades to an empty recommendation set; only transport-level
/// failures fail the request.
pub async fn recommend_for_user(
    store: &dyn PreferenceStore,
    completions: &dyn CompletionProvider,
    user_id: Uuid,
) -> AppResult<RecommendationResponse> {
    let quiz_responses = store.quiz_responses_for_user(user_id).await?;
    let ratings = store.ratings_for_user(user_id).await?;
    let watch_history = store.watch_history_for_user(user_id).await?;
    let profile = store.profile_for_user(user_id).await?;

    let message = build_user_message(&quiz_responses, &ratings, &watch_history, profile.as_ref());

    tracing::info!(
        %user_id,
        quiz_count = quiz_responses.len(),
        rating_count = ratings.len(),
        watch_count = watch_history.len(),
        "Requesting recommendations from completion endpoint"
    );

    let completion = completions.complete(SYSTEM_PROMPT, &message).await?;

    let titles = match parse_recommended_titles(&completion) {
        Some(titles) => titles,
        None => {
            tracing::warn!(
                %user_id,
                completion_len = completion.len(),
                "Completion was not a valid title array; returning no recommendations"
            );
            Vec::new()
        }
    };

    let recommendations = resolve_titles(store, &titles).await?;

    tracing::info!(
        %user_id,
        proposed = titles.len(),
        resolved = recommendations.len(),
        "Recommendation flow completed"
    );

    Ok(RecommendationResponse {
        recommendations,
        confidence: display_confidence(),
    })
}

/// Looks up proposed titles in the catalog, preserving proposal order.
///
/// Titles without an exact catalog match are silently dropped, so the
/// result may hold fewer movies than were proposed, including none.
async fn resolve_titles(store: &dyn PreferenceStore, titles: &[String]) -> AppResult<Vec<Movie>> {
    let matched = store.movies_by_titles(titles).await?;
    Ok(titles
        .iter()
        .filter_map(|title| matched.iter().find(|m| &m.title == title).cloned())
        .collect())
}

fn build_user_message(
    quiz_responses: &[QuizResponse],
    ratings: &[RatedMovie],
    watch_history: &[WatchedMovie],
    profile: Option<&Profile>,
) -> String {
    format!(
        "User Preferences:\n{}\n\nTop Rated Movies: {}\n\nRecently Watched: {}\n\n\
         Favorite Genres: {}\n\nRecommend 5 movies based on this data.",
        quiz_summary(quiz_responses),
        top_rated_summary(ratings),
        recently_watched_summary(watch_history),
        favorite_genres_summary(profile),
    )
}

fn quiz_summary(responses: &[QuizResponse]) -> String {
    if responses.is_empty() {
        return NO_QUIZ_DATA.to_string();
    }
    responses
        .iter()
        .map(|r| format!("{}: {}", r.question_id, r.answer))
        .collect::<Vec<_>>()
        .join("\n")
}

fn top_rated_summary(ratings: &[RatedMovie]) -> String {
    if ratings.is_empty() {
        return NO_RATINGS.to_string();
    }
    ratings
        .iter()
        .take(PROMPT_SAMPLE_SIZE)
        .map(|r| format!("{} ({}/5)", r.movie.title, r.rating))
        .collect::<Vec<_>>()
        .join(", ")
}

fn recently_watched_summary(watch_history: &[WatchedMovie]) -> String {
    if watch_history.is_empty() {
        return NO_WATCH_HISTORY.to_string();
    }
    watch_history
        .iter()
        .take(PROMPT_SAMPLE_SIZE)
        .map(|w| w.movie.title.clone())
        .collect::<Vec<_>>()
        .join(", ")
}

fn favorite_genres_summary(profile: Option<&Profile>) -> String {
    profile
        .and_then(|p| p.favorite_genres.as_ref())
        .filter(|genres| !genres.is_empty())
        .map(|genres| genres.join(", "))
        .unwrap_or_else(|| NOT_SPECIFIED.to_string())
}

fn display_confidence() -> f64 {
    rand::thread_rng().gen_range(0.85..1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::error::AppError;
    use crate::services::completion::{MockCompletionProvider, ScriptedCompletions};
    use chrono::Utc;

    fn rated(title: &str, rating: i32) -> RatedMovie {
        RatedMovie {
            movie: Movie::new(title, "Drama", 2020),
            rating,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_quiz_summary_joins_question_answer_pairs() {
        let responses = vec![
            QuizResponse {
                user_id: Uuid::new_v4(),
                question_id: "mood".to_string(),
                answer: "Thrilling".to_string(),
                created_at: Utc::now(),
            },
            QuizResponse {
                user_id: Uuid::new_v4(),
                question_id: "genre".to_string(),
                answer: "Sci-Fi, Drama".to_string(),
                created_at: Utc::now(),
            },
        ];
        assert_eq!(
            quiz_summary(&responses),
            "mood: Thrilling\ngenre: Sci-Fi, Drama"
        );
    }

    #[test]
    fn test_summaries_fall_back_to_sentinels() {
        assert_eq!(quiz_summary(&[]), "No quiz data");
        assert_eq!(top_rated_summary(&[]), "No ratings");
        assert_eq!(recently_watched_summary(&[]), "No watch history");
        assert_eq!(favorite_genres_summary(None), "Not specified");

        let profile = Profile::new(Uuid::new_v4());
        assert_eq!(favorite_genres_summary(Some(&profile)), "Not specified");
    }

    #[test]
    fn test_top_rated_summary_caps_at_five() {
        let ratings: Vec<RatedMovie> = (1..=8).map(|i| rated(&format!("M{}", i), 5)).collect();
        let summary = top_rated_summary(&ratings);
        assert_eq!(summary.matches("(5/5)").count(), 5);
        assert!(summary.starts_with("M1 (5/5)"));
    }

    #[tokio::test]
    async fn test_flow_resolves_only_catalog_matches() {
        let store = MemoryStore::new();
        store.add_movie(Movie::new("A", "Drama", 2020)).await;
        store.add_movie(Movie::new("C", "Horror", 2021)).await;

        let completions = ScriptedCompletions::replying(r#"["A","B","C","D","E"]"#);
        let response = recommend_for_user(&store, &completions, Uuid::new_v4())
            .await
            .unwrap();

        let titles: Vec<&str> = response
            .recommendations
            .iter()
            .map(|m| m.title.as_str())
            .collect();
        assert_eq!(titles, vec!["A", "C"]);
    }

    #[tokio::test]
    async fn test_flow_degrades_malformed_completion_to_empty_set() {
        let store = MemoryStore::new();
        store.add_movie(Movie::new("A", "Drama", 2020)).await;

        let completions = ScriptedCompletions::replying("I suggest you watch A and C!");
        let response = recommend_for_user(&store, &completions, Uuid::new_v4())
            .await
            .unwrap();

        assert!(response.recommendations.is_empty());
    }

    #[tokio::test]
    async fn test_flow_propagates_configuration_error() {
        let store = MemoryStore::new();
        let completions =
            ScriptedCompletions::failing(AppError::Configuration("no key".to_string()));

        let result = recommend_for_user(&store, &completions, Uuid::new_v4()).await;
        assert!(matches!(result, Err(AppError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_confidence_is_within_display_range() {
        let store = MemoryStore::new();
        let completions = ScriptedCompletions::replying("[]");
        let response = recommend_for_user(&store, &completions, Uuid::new_v4())
            .await
            .unwrap();
        assert!(response.confidence >= 0.85 && response.confidence < 1.0);
    }

    #[tokio::test]
    async fn test_prompt_embeds_stored_preferences() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();

        let movie = Movie::new("Blade Runner", "Sci-Fi", 1982);
        let movie_id = movie.id;
        store.add_movie(movie).await;
        store.upsert_rating(user, movie_id, 5).await.unwrap();
        store
            .insert_quiz_responses(
                user,
                &[("mood".to_string(), "Thought-provoking".to_string())],
            )
            .await
            .unwrap();

        let mut completions = MockCompletionProvider::new();
        completions
            .expect_complete()
            .withf(|system, user_msg| {
                system.contains("JSON array")
                    && user_msg.contains("mood: Thought-provoking")
                    && user_msg.contains("Blade Runner (5/5)")
                    && user_msg.contains("No watch history")
            })
            .returning(|_, _| Ok(r#"["Blade Runner"]"#.to_string()));

        let response = recommend_for_user(&store, &completions, user).await.unwrap();
        assert_eq!(response.recommendations.len(), 1);
    }
}
