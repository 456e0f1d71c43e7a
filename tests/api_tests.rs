use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, Method, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};
use uuid::Uuid;

use cinematch_api::auth::StaticIdentity;
use cinematch_api::db::{MemoryStore, PreferenceStore};
use cinematch_api::error::AppError;
use cinematch_api::models::Movie;
use cinematch_api::routes::create_router;
use cinematch_api::services::completion::{ChatGatewayClient, CompletionProvider, ScriptedCompletions};
use cinematch_api::state::AppState;

const TOKEN: &str = "valid-token";

struct TestApp {
    server: TestServer,
    store: MemoryStore,
    user_id: Uuid,
}

fn auth_header() -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("authorization"),
        HeaderValue::from_str(&format!("Bearer {}", TOKEN)).unwrap(),
    )
}

fn create_test_app(completions: Arc<dyn CompletionProvider>) -> TestApp {
    let store = MemoryStore::new();
    let mut identity = StaticIdentity::new();
    let user_id = identity.register(TOKEN);

    let state = AppState::new(
        Arc::new(store.clone()),
        Arc::new(identity),
        completions,
    );
    let server = TestServer::new(create_router(state)).unwrap();

    TestApp {
        server,
        store,
        user_id,
    }
}

fn default_test_app() -> TestApp {
    create_test_app(Arc::new(ScriptedCompletions::replying("[]")))
}

#[tokio::test]
async fn test_health_check() {
    let app = default_test_app();
    let response = app.server.get("/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_movie_listing() {
    let app = default_test_app();
    app.store.add_movie(Movie::new("Arrival", "Sci-Fi", 2016)).await;
    app.store.add_movie(Movie::new("Heat", "Crime", 1995)).await;

    let response = app.server.get("/api/v1/movies").await;
    response.assert_status_ok();
    let movies: Vec<Value> = response.json();
    assert_eq!(movies.len(), 2);
}

#[tokio::test]
async fn test_rating_upsert_keeps_single_row() {
    let app = default_test_app();
    let movie = Movie::new("Dune", "Sci-Fi", 2021);
    let movie_id = movie.id;
    app.store.add_movie(movie).await;

    let (name, value) = auth_header();
    let response = app
        .server
        .put("/api/v1/ratings")
        .add_header(name.clone(), value.clone())
        .json(&json!({ "movie_id": movie_id, "rating": 3 }))
        .await;
    response.assert_status_ok();

    let response = app
        .server
        .put("/api/v1/ratings")
        .add_header(name, value)
        .json(&json!({ "movie_id": movie_id, "rating": 5 }))
        .await;
    response.assert_status_ok();

    assert_eq!(app.store.rating_count().await, 1);
    let rated = app.store.ratings_for_user(app.user_id).await.unwrap();
    assert_eq!(rated[0].rating, 5);
}

#[tokio::test]
async fn test_unauthenticated_rating_writes_nothing() {
    let app = default_test_app();
    let movie = Movie::new("Dune", "Sci-Fi", 2021);
    let movie_id = movie.id;
    app.store.add_movie(movie).await;

    let response = app
        .server
        .put("/api/v1/ratings")
        .json(&json!({ "movie_id": movie_id, "rating": 4 }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    assert_eq!(app.store.rating_count().await, 0);
}

#[tokio::test]
async fn test_out_of_range_rating_rejected() {
    let app = default_test_app();
    let movie = Movie::new("Dune", "Sci-Fi", 2021);
    let movie_id = movie.id;
    app.store.add_movie(movie).await;

    let (name, value) = auth_header();
    let response = app
        .server
        .put("/api/v1/ratings")
        .add_header(name, value)
        .json(&json!({ "movie_id": movie_id, "rating": 9 }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(app.store.rating_count().await, 0);
}

#[tokio::test]
async fn test_recommendations_return_only_catalog_matches() {
    let app = create_test_app(Arc::new(ScriptedCompletions::replying(
        r#"["A","B","C","D","E"]"#,
    )));
    app.store.add_movie(Movie::new("A", "Drama", 2020)).await;
    app.store.add_movie(Movie::new("C", "Horror", 2021)).await;

    let (name, value) = auth_header();
    let response = app
        .server
        .post("/api/v1/recommendations")
        .add_header(name, value)
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    let titles: Vec<&str> = body["recommendations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["A", "C"]);

    let confidence = body["confidence"].as_f64().unwrap();
    assert!((0.85..1.0).contains(&confidence));
}

#[tokio::test]
async fn test_recommendations_degrade_on_malformed_completion() {
    let app = create_test_app(Arc::new(ScriptedCompletions::replying(
        "You would love A and C, trust me.",
    )));
    app.store.add_movie(Movie::new("A", "Drama", 2020)).await;

    let (name, value) = auth_header();
    let response = app
        .server
        .post("/api/v1/recommendations")
        .add_header(name, value)
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert!(body["recommendations"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_recommendations_require_authentication() {
    let app = default_test_app();
    let response = app.server.post("/api/v1/recommendations").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_missing_completion_key_is_configuration_failure() {
    // A real gateway client with no key configured: the request fails
    // before any network call is attempted.
    let app = create_test_app(Arc::new(ChatGatewayClient::new(
        None,
        "http://localhost:1".to_string(),
        "test-model".to_string(),
    )));

    let (name, value) = auth_header();
    let response = app
        .server
        .post("/api/v1/recommendations")
        .add_header(name, value)
        .await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = response.json();
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("completion API key"));
}

#[tokio::test]
async fn test_completion_transport_failure_fails_request() {
    let app = create_test_app(Arc::new(ScriptedCompletions::failing(
        AppError::CompletionApi("completion endpoint returned status 503".to_string()),
    )));

    let (name, value) = auth_header();
    let response = app
        .server
        .post("/api/v1/recommendations")
        .add_header(name, value)
        .await;
    response.assert_status(StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_quiz_submission_stores_responses_and_profile() {
    let app = default_test_app();

    let (name, value) = auth_header();
    let response = app
        .server
        .post("/api/v1/quiz")
        .add_header(name, value)
        .json(&json!({
            "answers": {
                "mood": "Emotional",
                "genre": ["Drama", "Sci-Fi"],
                "language": "English"
            }
        }))
        .await;
    response.assert_status_ok();

    assert_eq!(app.store.quiz_response_count().await, 3);

    let responses = app
        .store
        .quiz_responses_for_user(app.user_id)
        .await
        .unwrap();
    let genre_answer = responses
        .iter()
        .find(|r| r.question_id == "genre")
        .unwrap();
    assert_eq!(genre_answer.answer, "Drama, Sci-Fi");

    let profile = app
        .store
        .profile_for_user(app.user_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        profile.favorite_genres,
        Some(vec!["Drama".to_string(), "Sci-Fi".to_string()])
    );
    assert_eq!(
        profile.preferred_languages,
        Some(vec!["English".to_string()])
    );
}

#[tokio::test]
async fn test_unauthenticated_quiz_writes_nothing() {
    let app = default_test_app();
    let response = app
        .server
        .post("/api/v1/quiz")
        .json(&json!({ "answers": { "mood": "Emotional" } }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(app.store.quiz_response_count().await, 0);
}

#[tokio::test]
async fn test_analytics_summary_shape() {
    let app = default_test_app();
    let drama = Movie::new("Past Lives", "Drama", 2023);
    let horror = Movie::new("Nosferatu", "Horror", 2024);
    let drama_id = drama.id;
    let horror_id = horror.id;
    app.store.add_movie(drama).await;
    app.store.add_movie(horror).await;

    let (name, value) = auth_header();
    for (movie_id, rating) in [(drama_id, 5), (horror_id, 3)] {
        app.server
            .put("/api/v1/ratings")
            .add_header(name.clone(), value.clone())
            .json(&json!({ "movie_id": movie_id, "rating": rating }))
            .await
            .assert_status_ok();
    }

    let response = app
        .server
        .get("/api/v1/analytics")
        .add_header(name, value)
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    let genres = body["genres"].as_array().unwrap();
    let total: u64 = genres
        .iter()
        .map(|g| g["preference"].as_u64().unwrap())
        .sum();
    assert_eq!(total, 2);

    let buckets = body["ratings"].as_array().unwrap();
    assert_eq!(buckets.len(), 5);
    assert_eq!(buckets[0]["stars"], "1 ★");

    let engagement = body["engagement"].as_array().unwrap();
    assert_eq!(engagement.len(), 1);
    assert_eq!(engagement[0]["ratings"], 2);
}

#[tokio::test]
async fn test_analytics_requires_authentication() {
    let app = default_test_app();
    let response = app.server.get("/api/v1/analytics").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_cors_preflight_allowed() {
    let app = default_test_app();
    let response = app
        .server
        .method(Method::OPTIONS, "/api/v1/recommendations")
        .add_header(
            HeaderName::from_static("origin"),
            HeaderValue::from_static("http://example.com"),
        )
        .add_header(
            HeaderName::from_static("access-control-request-method"),
            HeaderValue::from_static("POST"),
        )
        .await;
    response.assert_status_ok();
    assert!(response
        .headers()
        .contains_key("access-control-allow-origin"));
}
