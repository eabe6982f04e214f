//! Incoming message types produced by the Telegram poll loop.

use serde::{Deserialize, Serialize};

/// A parsed incoming Telegram message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingMessage {
    /// Internal message ID (generated per event)
    pub id: String,
    /// Telegram chat the message arrived in
    pub chat_id: i64,
    /// Telegram message ID, used for `reply_to_message_id`
    pub message_id: i64,
    /// Sender's Telegram user ID; keys all session state
    pub user_id: i64,
    /// Message content
    pub content: IncomingContent,
}

/// Message content variants the bot reacts to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum IncomingContent {
    /// A `/start` or `/hello` command
    Greeting,
    /// A plain text message, treated as a question about the stored document
    Text { text: String },
    /// A document upload
    Document {
        file_id: String,
        file_name: String,
        mime_type: Option<String>,
    },
    /// Anything else (photos, stickers, voice) - ignored
    Other,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_serde_roundtrip() {
        let content = IncomingContent::Document {
            file_id: "abc".into(),
            file_name: "doc.pdf".into(),
            mime_type: Some("application/pdf".into()),
        };

        let json = serde_json::to_string(&content).unwrap();
        assert!(json.contains("\"type\":\"document\""));

        let back: IncomingContent = serde_json::from_str(&json).unwrap();
        assert!(matches!(back, IncomingContent::Document { .. }));
    }
}
