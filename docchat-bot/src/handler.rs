//! Message dispatch: greetings, document uploads, and questions.
//!
//! Events are handled sequentially in arrival order; a failed event never
//! kills the processor, it surfaces as an error reply and the loop moves on.

use crate::document;
use crate::message::{IncomingContent, IncomingMessage};
use crate::prompt;
use crate::provider::{collect_stream, ChatRequest, CompletionProvider, Message};
use crate::session::{Role, SessionManager};
use crate::telegram::{format::format_for_telegram, TelegramClient};
use docchat_common::config::CompletionConfig;
use docchat_common::{Error, Result};
use std::sync::Arc;
use tokio::sync::mpsc;

const GREETING_REPLY: &str =
    "👋 Hello! Send me a PDF or TXT document, and I can summarize it or answer questions about it.";
const UNSUPPORTED_REPLY: &str = "❌ Please send a .txt or .pdf file.";
const UPLOAD_FIRST_REPLY: &str = "📄 Please upload a document first.";
const SUMMARIZING_REPLY: &str = "📄 Summarizing your document...";
const THINKING_REPLY: &str = "🤔 Thinking...";

/// Handles incoming messages against the session state and the completion
/// provider.
pub struct Dispatcher {
    telegram: Arc<TelegramClient>,
    sessions: Arc<SessionManager>,
    provider: Arc<dyn CompletionProvider>,
    completion: CompletionConfig,
}

impl Dispatcher {
    /// Create a new dispatcher.
    pub fn new(
        telegram: Arc<TelegramClient>,
        sessions: Arc<SessionManager>,
        provider: Arc<dyn CompletionProvider>,
        completion: CompletionConfig,
    ) -> Self {
        Self {
            telegram,
            sessions,
            provider,
            completion,
        }
    }

    /// Start a background processor that handles messages from the poll loop.
    ///
    /// Messages are processed one at a time in arrival order.
    pub fn spawn_processor(
        dispatcher: Arc<Self>,
        mut rx: mpsc::Receiver<IncomingMessage>,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            tracing::info!("Message processor started");

            while let Some(message) = rx.recv().await {
                dispatcher.handle(message).await;
            }

            tracing::info!("Message processor stopped");
        })
    }

    /// Handle one incoming message. Never fatal; errors become replies.
    pub async fn handle(&self, msg: IncomingMessage) {
        let result = match &msg.content {
            IncomingContent::Greeting => self.handle_greeting(&msg).await,
            IncomingContent::Document {
                file_id, file_name, ..
            } => {
                let outcome = self.handle_document(&msg, file_id, file_name).await;
                match outcome {
                    Err(ref e) if e.is_user_input() => {
                        self.telegram
                            .reply(msg.chat_id, msg.message_id, UNSUPPORTED_REPLY, false)
                            .await
                    }
                    Err(e) => {
                        self.telegram
                            .reply(
                                msg.chat_id,
                                msg.message_id,
                                &format!("⚠️ Error: {e}"),
                                false,
                            )
                            .await
                    }
                    Ok(()) => Ok(()),
                }
            }
            IncomingContent::Text { text } => {
                let outcome = self.handle_question(&msg, text).await;
                match outcome {
                    Err(e) => {
                        self.telegram
                            .reply(
                                msg.chat_id,
                                msg.message_id,
                                &format!("⚠️ Failed to answer: {e}"),
                                false,
                            )
                            .await
                    }
                    Ok(()) => Ok(()),
                }
            }
            IncomingContent::Other => Ok(()),
        };

        if let Err(e) = result {
            tracing::error!(
                message_id = %msg.id,
                chat_id = %msg.chat_id,
                error = %e,
                "Failed to send reply"
            );
        }
    }

    async fn handle_greeting(&self, msg: &IncomingMessage) -> Result<()> {
        self.sessions.reset_history(msg.user_id);
        self.telegram
            .reply(msg.chat_id, msg.message_id, GREETING_REPLY, false)
            .await
    }

    async fn handle_document(
        &self,
        msg: &IncomingMessage,
        file_id: &str,
        file_name: &str,
    ) -> Result<()> {
        if !document::is_supported(file_name) {
            return Err(Error::InvalidInput(format!(
                "Unsupported document type: {file_name}"
            )));
        }

        let bytes = self.telegram.download_file(file_id).await?;
        let text = document::save_and_extract(&bytes, file_name).await?;

        tracing::info!(
            user_id = %msg.user_id,
            file_name = %file_name,
            text_chars = text.chars().count(),
            "Document extracted"
        );

        self.sessions.store_document(msg.user_id, text.clone());

        self.telegram
            .reply(msg.chat_id, msg.message_id, SUMMARIZING_REPLY, false)
            .await?;

        let summary = self.complete(prompt::summary_messages(&text)).await?;
        let formatted = format_for_telegram(&summary);

        self.telegram
            .reply(
                msg.chat_id,
                msg.message_id,
                &format!("✅ *Summary:*\n\n{formatted}"),
                true,
            )
            .await
    }

    async fn handle_question(&self, msg: &IncomingMessage, question: &str) -> Result<()> {
        let Some(doc_text) = self.sessions.document(msg.user_id) else {
            return self
                .telegram
                .reply(msg.chat_id, msg.message_id, UPLOAD_FIRST_REPLY, false)
                .await;
        };

        self.telegram
            .reply(msg.chat_id, msg.message_id, THINKING_REPLY, false)
            .await?;

        // The question lands in history before the call; a failed completion
        // leaves it there without a matching assistant entry.
        self.sessions
            .append_history(msg.user_id, Role::User, question);
        let history = self.sessions.history(msg.user_id);

        let answer = self
            .complete(prompt::question_messages(
                Some(prompt::QA_SYSTEM_PROMPT),
                &doc_text,
                &history,
            ))
            .await?;

        self.sessions
            .append_history(msg.user_id, Role::Assistant, answer.clone());

        let formatted = format_for_telegram(&answer);
        self.telegram
            .reply(
                msg.chat_id,
                msg.message_id,
                &format!("💡 *Answer:*\n\n{formatted}"),
                true,
            )
            .await
    }

    /// Run one streamed completion and concatenate the fragments.
    async fn complete(&self, messages: Vec<Message>) -> Result<String> {
        let request = self.chat_request(messages);

        let stream = self
            .provider
            .chat_stream(request)
            .await
            .map_err(|e| Error::External(e.to_string()))?;

        collect_stream(stream)
            .await
            .map_err(|e| Error::External(e.to_string()))
    }

    fn chat_request(&self, messages: Vec<Message>) -> ChatRequest {
        ChatRequest {
            model: self.completion.model.clone(),
            messages,
            max_tokens: Some(self.completion.max_tokens),
            temperature: Some(self.completion.temperature),
            top_p: Some(self.completion.top_p),
        }
    }
}
