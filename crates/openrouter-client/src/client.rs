use std::fmt;
use std::time::Duration;

use crate::types::{ChatRequest, ChatResponse};
use crate::{ClientError, Result};

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_REFERER: &str = "https://github.com/ideaforge/ideaforge";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

// ─── ClientOptions ────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct ClientOptions {
    /// Base URL without the trailing `/chat/completions`.
    pub base_url: String,
    pub api_key: String,
    /// Sent as `HTTP-Referer`; OpenRouter uses it to attribute traffic.
    pub referer: String,
    /// Sent as `X-Title` when set.
    pub title: Option<String>,
    pub timeout: Duration,
}

impl ClientOptions {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            referer: DEFAULT_REFERER.to_string(),
            title: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientOptions")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("referer", &self.referer)
            .field("title", &self.title)
            .field("timeout", &self.timeout)
            .finish()
    }
}

// ─── ChatClient ───────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    opts: ClientOptions,
}

impl ChatClient {
    pub fn new(opts: ClientOptions) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(opts.timeout).build()?;
        Ok(Self { http, opts })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.opts.base_url.trim_end_matches('/')
        )
    }

    /// Send one completion request and return the full parsed body.
    pub async fn send(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let mut builder = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.opts.api_key)
            .header("HTTP-Referer", &self.opts.referer)
            .json(request);
        if let Some(title) = &self.opts.title {
            builder = builder.header("X-Title", title);
        }

        tracing::debug!(model = %request.model, messages = request.messages.len(), "chat request");
        let response = builder.send().await.map_err(|e| self.classify(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.classify(e))?;
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|source| ClientError::Parse { body, source })?;
        if let Some(usage) = &parsed.usage {
            tracing::debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "chat usage"
            );
        }
        Ok(parsed)
    }

    /// Send one completion request and return the first choice's text,
    /// trimmed. An empty or missing completion is an error.
    pub async fn complete(&self, request: &ChatRequest) -> Result<String> {
        let response = self.send(request).await?;
        response
            .first_text()
            .map(str::to_string)
            .ok_or(ClientError::EmptyCompletion)
    }

    fn classify(&self, err: reqwest::Error) -> ClientError {
        if err.is_timeout() {
            ClientError::Timeout(self.opts.timeout.as_secs())
        } else {
            ClientError::Http(err)
        }
    }
}
