//! Per-user session state: stored document text and conversation history.
//!
//! All state lives in memory for the process lifetime. The two maps are
//! independently keyed; a user may have history without a document or vice
//! versa.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// Maximum number of history entries retained per user.
pub const MAX_HISTORY: usize = 10;

/// Role of a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Get the role as the wire-format string.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A single turn in a user's conversation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
}

/// Owner of all per-user state.
///
/// Holds the document store (one document per user, replaced on upload) and
/// the bounded history window. Handlers receive this by `Arc` rather than
/// reaching for globals; `DashMap` gives per-key locking so concurrent
/// events for different users never contend.
#[derive(Default)]
pub struct SessionManager {
    documents: DashMap<i64, String>,
    histories: DashMap<i64, Vec<HistoryEntry>>,
}

impl SessionManager {
    /// Create an empty session manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a user's document text, replacing any previous document.
    pub fn store_document(&self, user_id: i64, text: String) {
        self.documents.insert(user_id, text);
    }

    /// Get a clone of the user's stored document text.
    pub fn document(&self, user_id: i64) -> Option<String> {
        self.documents.get(&user_id).map(|d| d.value().clone())
    }

    /// Check whether the user has an active document.
    pub fn has_document(&self, user_id: i64) -> bool {
        self.documents.contains_key(&user_id)
    }

    /// Append one entry to the user's history, then truncate from the front
    /// so only the most recent `MAX_HISTORY` entries remain.
    pub fn append_history(&self, user_id: i64, role: Role, content: impl Into<String>) {
        let mut entry = self.histories.entry(user_id).or_default();
        entry.push(HistoryEntry {
            role,
            content: content.into(),
        });

        let len = entry.len();
        if len > MAX_HISTORY {
            entry.drain(..len - MAX_HISTORY);
        }
    }

    /// Get the user's history in chronological order (empty if absent).
    pub fn history(&self, user_id: i64) -> Vec<HistoryEntry> {
        self.histories
            .get(&user_id)
            .map(|h| h.value().clone())
            .unwrap_or_default()
    }

    /// Clear the user's history (on `/start` and `/hello`).
    pub fn reset_history(&self, user_id: i64) {
        self.histories.insert(user_id, Vec::new());
    }
}
