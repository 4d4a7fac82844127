use ideaforge_core::config::Config;
use ideaforge_core::transport::{ModelRequest, ModelTransport, PromptRole};
use ideaforge_core::ForgeError;
use openrouter_client::{ChatClient, ChatMessage, ChatRequest, ClientOptions, Role};
use std::time::Duration;

/// Blocking [`ModelTransport`] over the async OpenRouter client.
///
/// Owns a current-thread tokio runtime and drives each request to
/// completion on it, so callers stay synchronous.
pub struct OpenRouterTransport {
    client: ChatClient,
    model: String,
    runtime: tokio::runtime::Runtime,
}

impl OpenRouterTransport {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let mut opts = ClientOptions::new(config.api_key.clone());
        opts.base_url = config.settings.api_base.clone();
        opts.timeout = Duration::from_secs(config.settings.request_timeout_secs);
        opts.title = Some("ideaforge".to_string());
        let client = ChatClient::new(opts)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self {
            client,
            model: config.model.clone(),
            runtime,
        })
    }
}

fn to_chat_request(model: &str, request: &ModelRequest) -> ChatRequest {
    ChatRequest {
        model: model.to_string(),
        messages: request
            .messages
            .iter()
            .map(|m| {
                let role = match m.role {
                    PromptRole::System => Role::System,
                    PromptRole::User => Role::User,
                };
                ChatMessage::new(role, m.content.clone())
            })
            .collect(),
        max_tokens: request.max_tokens,
        temperature: request.temperature,
    }
}

impl ModelTransport for OpenRouterTransport {
    fn complete(&self, request: &ModelRequest) -> ideaforge_core::Result<String> {
        let chat = to_chat_request(&self.model, request);
        self.runtime
            .block_on(self.client.complete(&chat))
            .map_err(|e| ForgeError::Transport(e.to_string()))
    }
}
