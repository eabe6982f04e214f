//! Docchat Bot - Telegram document summarization and Q&A service.
//!
//! ## Architecture
//!
//! A background task long-polls the Telegram Bot API and forwards parsed
//! messages over a channel to a sequential processor. Uploaded PDF/TXT
//! documents are extracted and stored per user; text messages become
//! questions about the stored document, answered by a streamed Groq
//! completion with a bounded history window for conversational context.
//!
//! ```text
//! Telegram → poll loop → Dispatcher → SessionManager
//!      ↑                     ↓
//!    reply ←── Formatter ← GroqProvider (streamed)
//! ```
//!
//! A small axum server runs alongside purely as a liveness probe.

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod document;
pub mod handler;
pub mod message;
pub mod prompt;
pub mod provider;
pub mod routes;
pub mod session;
pub mod telegram;

// Re-export commonly used types
pub use handler::Dispatcher;
pub use message::{IncomingContent, IncomingMessage};
pub use provider::{ChatRequest, CompletionProvider, GroqProvider, Message, ProviderError};
pub use routes::build_router;
pub use session::{HistoryEntry, Role, SessionManager, MAX_HISTORY};
pub use telegram::TelegramClient;

use docchat_common::config::Config;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tower_http::cors::{Any, CorsLayer};

/// Start the bot: Telegram poll loop, message processor, and HTTP probe.
pub async fn start_server(config: &Config) -> anyhow::Result<()> {
    let telegram = Arc::new(TelegramClient::new(
        config.telegram.bot_token.clone(),
        config.telegram.poll_timeout_secs,
    ));
    telegram.verify_token().await?;

    let sessions = Arc::new(SessionManager::new());
    let provider: Arc<dyn CompletionProvider> = Arc::new(GroqProvider::with_base_url(
        config.completion.api_key.clone(),
        config.completion.base_url.clone(),
    ));

    let dispatcher = Arc::new(Dispatcher::new(
        telegram.clone(),
        sessions,
        provider,
        config.completion.clone(),
    ));

    let (tx, rx) = mpsc::channel(64);
    let processor_handle = Dispatcher::spawn_processor(dispatcher, rx);

    let poll_telegram = telegram.clone();
    let poll_handle = tokio::spawn(async move {
        poll_telegram.listen(tx).await;
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let router = build_router().layer(cors);

    let addr = SocketAddr::from((
        config.server.bind.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));

    tracing::info!("Starting docchat on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    poll_handle.abort();
    processor_handle.abort();

    Ok(())
}
