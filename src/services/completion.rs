use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Most titles a completion may propose; anything longer fails validation
const MAX_RECOMMENDED_TITLES: usize = 5;

/// The external natural-language completion service
///
/// Treated as an opaque text oracle: one system instruction and one user
/// message go in, free-form text comes out. Nothing about the output shape
/// is guaranteed; callers validate before trusting it.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Submits a system instruction and user message, returning the
    /// completion's text content
    async fn complete(&self, system: &str, user: &str) -> AppResult<String>;
}

/// Client for an OpenAI-compatible chat-completions gateway
#[derive(Clone)]
pub struct ChatGatewayClient {
    http_client: HttpClient,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

impl ChatGatewayClient {
    pub fn new(api_key: Option<String>, base_url: String, model: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            base_url,
            model,
        }
    }
}

#[async_trait::async_trait]
impl CompletionProvider for ChatGatewayClient {
    async fn complete(&self, system: &str, user: &str) -> AppResult<String> {
        // Key absence is a configuration failure before any request is made
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            AppError::Configuration("completion API key is not configured".to_string())
        })?;

        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
        };

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::CompletionApi(format!(
                "completion endpoint returned status {}",
                response.status()
            )));
        }

        let body: ChatResponse = response.json().await?;
        let choice = body.choices.into_iter().next().ok_or_else(|| {
            AppError::CompletionApi("completion response contained no choices".to_string())
        })?;

        Ok(choice.message.content)
    }
}

/// Validates completion text as a recommendation title list
///
/// Accepts only a JSON array of at most five strings. Anything else —
/// prose, objects, oversized arrays, mixed types — returns `None` so the
/// caller can degrade to an empty recommendation set instead of failing
/// the request.
pub fn parse_recommended_titles(text: &str) -> Option<Vec<String>> {
    let titles: Vec<String> = serde_json::from_str(text.trim()).ok()?;
    if titles.len() > MAX_RECOMMENDED_TITLES {
        return None;
    }
    Some(titles)
}

/// Canned completion provider for tests
pub struct ScriptedCompletions {
    reply: AppResult<String>,
}

impl ScriptedCompletions {
    /// Always replies with the given text
    pub fn replying(text: impl Into<String>) -> Self {
        Self {
            reply: Ok(text.into()),
        }
    }

    /// Always fails with the given error
    pub fn failing(error: AppError) -> Self {
        Self { reply: Err(error) }
    }
}

#[async_trait::async_trait]
impl CompletionProvider for ScriptedCompletions {
    async fn complete(&self, _system: &str, _user: &str) -> AppResult<String> {
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(AppError::Configuration(msg)) => Err(AppError::Configuration(msg.clone())),
            Err(AppError::CompletionApi(msg)) => Err(AppError::CompletionApi(msg.clone())),
            Err(other) => Err(AppError::Internal(other.to_string())),
        }
    }
}
