//! Telegram channel adapter.
//!
//! Long-polls the Bot API for updates, downloads uploaded documents, and
//! sends replies with Markdown formatting.

pub mod format;

use crate::message::{IncomingContent, IncomingMessage};
use docchat_common::{Error, Result};
use serde_json::Value;
use tokio::sync::mpsc;

/// Telegram message length limit.
const MAX_MESSAGE_LEN: usize = 4096;

/// Telegram Bot API client - long-polls for updates.
pub struct TelegramClient {
    bot_token: String,
    poll_timeout_secs: u64,
    client: reqwest::Client,
}

impl TelegramClient {
    /// Create a new Telegram client.
    pub fn new(bot_token: String, poll_timeout_secs: u64) -> Self {
        Self {
            bot_token,
            poll_timeout_secs,
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!("https://api.telegram.org/bot{}/{method}", self.bot_token)
    }

    fn file_url(&self, file_path: &str) -> String {
        format!(
            "https://api.telegram.org/file/bot{}/{}",
            self.bot_token, file_path
        )
    }

    /// Verify the bot token by calling `getMe`.
    pub async fn verify_token(&self) -> Result<()> {
        let resp = self
            .client
            .get(self.api_url("getMe"))
            .send()
            .await
            .map_err(|e| Error::External(format!("Telegram connection failed: {e}")))?;

        if !resp.status().is_success() {
            let err = resp.text().await.unwrap_or_default();
            return Err(Error::Config(format!("Invalid bot token: {err}")));
        }

        tracing::info!("Telegram bot token verified");
        Ok(())
    }

    /// Download a file from Telegram by its `file_id`.
    pub async fn download_file(&self, file_id: &str) -> Result<Vec<u8>> {
        // Step 1: Get the file path via getFile API
        let url = self.api_url("getFile");
        let body = serde_json::json!({ "file_id": file_id });

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::External(format!("Telegram getFile failed: {e}")))?;

        if !resp.status().is_success() {
            let err = resp.text().await.unwrap_or_default();
            return Err(Error::External(format!("Telegram getFile failed: {err}")));
        }

        let data: Value = resp
            .json()
            .await
            .map_err(|e| Error::External(format!("Telegram getFile parse failed: {e}")))?;

        let file_path = data
            .get("result")
            .and_then(|r| r.get("file_path"))
            .and_then(|p| p.as_str())
            .ok_or_else(|| Error::External("Missing file_path in getFile response".into()))?;

        // Step 2: Download the file
        let download_url = self.file_url(file_path);
        let file_resp = self
            .client
            .get(&download_url)
            .send()
            .await
            .map_err(|e| Error::External(format!("Telegram file download failed: {e}")))?;

        if !file_resp.status().is_success() {
            return Err(Error::External(format!(
                "Failed to download file from Telegram: {}",
                file_resp.status()
            )));
        }

        let bytes = file_resp
            .bytes()
            .await
            .map_err(|e| Error::External(format!("Telegram file read failed: {e}")))?;
        Ok(bytes.to_vec())
    }

    /// Reply to a message, splitting long text to fit Telegram's limit.
    ///
    /// With `markdown` set, chunks are sent with `parse_mode: "Markdown"`;
    /// a 400 "can't parse entities" response retries once without it.
    pub async fn reply(
        &self,
        chat_id: i64,
        reply_to_message_id: i64,
        text: &str,
        markdown: bool,
    ) -> Result<()> {
        for chunk in split_message(text, MAX_MESSAGE_LEN) {
            self.send_single_chunk(chat_id, reply_to_message_id, &chunk, markdown)
                .await?;
        }
        Ok(())
    }

    async fn send_single_chunk(
        &self,
        chat_id: i64,
        reply_to_message_id: i64,
        text: &str,
        markdown: bool,
    ) -> Result<()> {
        let mut body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
            "reply_to_message_id": reply_to_message_id,
        });
        if markdown {
            body["parse_mode"] = Value::String("Markdown".into());
        }

        let resp = self
            .client
            .post(self.api_url("sendMessage"))
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::External(format!("Telegram sendMessage failed: {e}")))?;

        if resp.status().is_success() {
            return Ok(());
        }

        let status = resp.status();
        let error_text = resp.text().await.unwrap_or_default();

        // Telegram returns "Bad Request: can't parse entities" for Markdown errors
        if markdown && status.as_u16() == 400 && error_text.contains("parse entities") {
            tracing::warn!(
                "Telegram Markdown parsing failed, retrying without parse_mode: {}",
                error_text
            );

            let body_plain = serde_json::json!({
                "chat_id": chat_id,
                "text": text,
                "reply_to_message_id": reply_to_message_id,
            });

            let resp_plain = self
                .client
                .post(self.api_url("sendMessage"))
                .json(&body_plain)
                .send()
                .await
                .map_err(|e| Error::External(format!("Telegram sendMessage failed: {e}")))?;

            if resp_plain.status().is_success() {
                return Ok(());
            }

            let plain_error = resp_plain.text().await.unwrap_or_default();
            return Err(Error::External(format!(
                "Telegram sendMessage failed: {plain_error}"
            )));
        }

        Err(Error::External(format!(
            "Telegram sendMessage failed: {error_text}"
        )))
    }

    /// Long-poll `getUpdates` forever, forwarding parsed messages to `tx`.
    ///
    /// Poll and parse errors are logged and retried after a short sleep; the
    /// loop only exits when the receiving side is dropped.
    pub async fn listen(&self, tx: mpsc::Sender<IncomingMessage>) {
        let mut offset: i64 = 0;

        tracing::info!("Telegram poll loop started");

        loop {
            let url = self.api_url("getUpdates");
            let body = serde_json::json!({
                "offset": offset,
                "timeout": self.poll_timeout_secs,
                "allowed_updates": ["message"],
            });

            let resp = match self.client.post(&url).json(&body).send().await {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!("Telegram poll error: {e}");
                    tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                    continue;
                }
            };

            let data: Value = match resp.json().await {
                Ok(d) => d,
                Err(e) => {
                    tracing::warn!("Telegram parse error: {e}");
                    tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                    continue;
                }
            };

            if let Some(results) = data.get("result").and_then(Value::as_array) {
                for update in results {
                    if let Some(uid) = update.get("update_id").and_then(Value::as_i64) {
                        offset = uid + 1;
                    }

                    let Some(msg) = parse_update(update) else {
                        continue;
                    };

                    tracing::info!(
                        message_id = %msg.id,
                        chat_id = %msg.chat_id,
                        user_id = %msg.user_id,
                        message_type = message_type(&msg.content),
                        "Telegram message received"
                    );

                    if tx.send(msg).await.is_err() {
                        tracing::info!("Message receiver dropped, stopping poll loop");
                        return;
                    }
                }
            }
        }
    }
}

fn message_type(content: &IncomingContent) -> &'static str {
    match content {
        IncomingContent::Greeting => "greeting",
        IncomingContent::Text { .. } => "text",
        IncomingContent::Document { .. } => "document",
        IncomingContent::Other => "other",
    }
}

/// Parse one `getUpdates` entry into an incoming message.
pub fn parse_update(update: &Value) -> Option<IncomingMessage> {
    let message = update.get("message")?;

    let chat_id = message.get("chat")?.get("id")?.as_i64()?;
    let message_id = message.get("message_id")?.as_i64()?;
    let user_id = message.get("from")?.get("id")?.as_i64()?;

    let content = if let Some(text) = message.get("text").and_then(|v| v.as_str()) {
        if is_greeting_command(text) {
            IncomingContent::Greeting
        } else {
            IncomingContent::Text {
                text: text.to_string(),
            }
        }
    } else if let Some(doc) = message.get("document") {
        let file_id = doc.get("file_id").and_then(|v| v.as_str())?;
        let file_name = doc
            .get("file_name")
            .and_then(|v| v.as_str())
            .unwrap_or("document");
        let mime_type = doc
            .get("mime_type")
            .and_then(|v| v.as_str())
            .map(String::from);

        IncomingContent::Document {
            file_id: file_id.to_string(),
            file_name: file_name.to_string(),
            mime_type,
        }
    } else {
        IncomingContent::Other
    };

    Some(IncomingMessage {
        id: uuid::Uuid::new_v4().to_string(),
        chat_id,
        message_id,
        user_id,
        content,
    })
}

/// Check for a `/start` or `/hello` command, with optional `@botname` suffix.
fn is_greeting_command(text: &str) -> bool {
    let Some(first) = text.split_whitespace().next() else {
        return false;
    };
    let Some(cmd) = first.strip_prefix('/') else {
        return false;
    };
    matches!(cmd.split('@').next().unwrap_or(""), "start" | "hello")
}

/// Split a message into chunks that fit within Telegram's limit.
fn split_message(message: &str, max_len: usize) -> Vec<String> {
    if message.len() <= max_len {
        return vec![message.to_string()];
    }

    let mut chunks = Vec::new();
    let mut remaining = message;

    while !remaining.is_empty() {
        if remaining.len() <= max_len {
            chunks.push(remaining.to_string());
            break;
        }

        let boundary = (0..=max_len)
            .rev()
            .find(|i| remaining.is_char_boundary(*i))
            .unwrap_or(0);
        let chunk = &remaining[..boundary];
        let split_pos = chunk
            .rfind("\n\n")
            .or_else(|| chunk.rfind('\n'))
            .or_else(|| chunk.rfind(". "))
            .or_else(|| chunk.rfind(' '))
            .unwrap_or(boundary);

        let actual_split = if split_pos == 0 { boundary } else { split_pos };

        chunks.push(remaining[..actual_split].to_string());
        remaining = remaining[actual_split..].trim_start();
    }

    chunks
}
