use std::convert::Infallible;

use axum::{
    extract::State,
    http::HeaderMap,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use chrono::Utc;
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};
use uuid::Uuid;

use crate::{
    analytics::{compute_summary, AnalyticsSummary},
    auth::bearer_token,
    db::PreferenceStore,
    error::AppResult,
    state::AppState,
};

/// Handler for the one-shot analytics summary
pub async fn summary(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Json<AnalyticsSummary>> {
    let token = bearer_token(&headers)?;
    let user_id = state.identity.resolve_user(token).await?;

    let ratings = state.store.ratings_for_user(user_id).await?;
    Ok(Json(compute_summary(&ratings, Utc::now())))
}

/// Handler for the live analytics stream
///
/// Sends the current summary immediately, then a fresh one after every
/// rating mutation anywhere in the system; the recompute re-scopes to this
/// caller each time. The broadcast receiver lives inside the stream, so
/// the subscription is released whenever the client disconnects, however
/// that happens.
pub async fn live(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let token = bearer_token(&headers)?;
    let user_id = state.identity.resolve_user(token).await?;

    let receiver = state.rating_events.subscribe();
    let store = state.store.clone();

    let initial = summary_event(store.as_ref(), user_id).await;
    let updates = BroadcastStream::new(receiver).then(move |_change| {
        let store = store.clone();
        async move { summary_event(store.as_ref(), user_id).await }
    });

    let stream = tokio_stream::once(initial).chain(updates);
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

async fn summary_event(
    store: &dyn PreferenceStore,
    user_id: Uuid,
) -> Result<Event, Infallible> {
    let ratings = match store.ratings_for_user(user_id).await {
        Ok(ratings) => ratings,
        Err(e) => {
            tracing::warn!(%user_id, error = %e, "Analytics recompute failed");
            return Ok(Event::default()
                .event("error")
                .data("analytics recompute failed"));
        }
    };

    let summary = compute_summary(&ratings, Utc::now());
    match Event::default().event("analytics").json_data(&summary) {
        Ok(event) => Ok(event),
        Err(e) => {
            tracing::warn!(%user_id, error = %e, "Analytics summary serialization failed");
            Ok(Event::default()
                .event("error")
                .data("analytics serialization failed"))
        }
    }
}
