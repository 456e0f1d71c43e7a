use std::sync::Arc;

use crate::{
    auth::IdentityProvider, db::PreferenceStore, events::RatingEvents,
    services::completion::CompletionProvider,
};

/// Shared application state
///
/// Every external collaborator sits behind a trait object so tests can
/// swap in in-memory doubles; the rating-change channel is shared by the
/// write path and the live analytics streams.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PreferenceStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub completions: Arc<dyn CompletionProvider>,
    pub rating_events: RatingEvents,
}

impl AppState {
    pub fn new(
        store: Arc<dyn PreferenceStore>,
        identity: Arc<dyn IdentityProvider>,
        completions: Arc<dyn CompletionProvider>,
    ) -> Self {
        Self {
            store,
            identity,
            completions,
            rating_events: RatingEvents::new(),
        }
    }
}
