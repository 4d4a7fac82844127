//! `openrouter-client` is an async client for OpenAI-compatible chat completions.
//!
//! Defaults target OpenRouter (`https://openrouter.ai/api/v1`), but any
//! endpoint that speaks `POST /chat/completions` works by overriding
//! [`ClientOptions::base_url`].
//!
//! # Architecture
//!
//! ```text
//! ChatRequest
//!     │
//!     ▼
//! ChatClient      ← reqwest, bearer auth, HTTP-Referer, request timeout
//!     │
//!     ▼
//! ChatResponse    ← choices[0].message.content, trimmed
//! ```
//!
//! # Quick start
//!
//! ```rust,ignore
//! use openrouter_client::{ChatClient, ChatMessage, ChatRequest, ClientOptions};
//!
//! let client = ChatClient::new(ClientOptions::new(api_key))?;
//! let text = client
//!     .complete(&ChatRequest {
//!         model: "google/gemma-3-4b-it:free".into(),
//!         messages: vec![ChatMessage::user("Say hello.")],
//!         max_tokens: 64,
//!         temperature: 0.7,
//!     })
//!     .await?;
//! ```

pub mod client;
pub mod error;
pub mod types;


pub use client::{ChatClient, ClientOptions, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use error::ClientError;
pub use types::{ChatMessage, ChatRequest, ChatResponse, Choice, ChoiceMessage, Role, Usage};

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, ClientError>;
