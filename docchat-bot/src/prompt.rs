//! Prompt assembly for document summarization and question answering.
//!
//! Builds the ordered message lists sent to the completion API from the
//! stored document text and the per-user history window.

use crate::provider::Message;
use crate::session::HistoryEntry;

/// System prompt for the question-answering flow.
pub const QA_SYSTEM_PROMPT: &str =
    "You are an assistant helping answer questions about a document.";

/// System prompt for the summarization flow.
pub const SUMMARY_SYSTEM_PROMPT: &str = "Summarize this document clearly and concisely.";

/// Maximum characters of document text included in the question-answering flow.
///
/// Hard cut, no boundary awareness; may split mid-word. Summarization sends
/// the full text instead.
pub const DOC_CONTEXT_LIMIT: usize = 15_000;

/// Build the message list for answering a question about a document.
///
/// Order is fixed: system prompt first (when provided), the truncated
/// document context at index 1, then the history window (which already ends
/// with the user's current question).
pub fn question_messages(
    system_prompt: Option<&str>,
    document: &str,
    history: &[HistoryEntry],
) -> Vec<Message> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    if let Some(system) = system_prompt {
        messages.push(Message::system(system));
    }

    for entry in history {
        messages.push(Message {
            role: entry.role.as_str().to_string(),
            content: entry.content.clone(),
        });
    }

    // Document context goes at index 1, between the system prompt and
    // history (clamped when the list is still shorter than that)
    let doc_index = messages.len().min(1);
    messages.insert(
        doc_index,
        Message::user(format!(
            "Here is the document:\n{}",
            truncate_chars(document, DOC_CONTEXT_LIMIT)
        )),
    );

    messages
}

/// Build the message list for summarizing a document.
///
/// No history; the full untruncated text is sent.
pub fn summary_messages(document: &str) -> Vec<Message> {
    vec![
        Message::system(SUMMARY_SYSTEM_PROMPT),
        Message::user(document),
    ]
}

/// Truncate to at most `limit` characters, respecting char boundaries so the
/// cut is always valid UTF-8.
fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Role;

    fn history(turns: &[(Role, &str)]) -> Vec<HistoryEntry> {
        turns
            .iter()
            .map(|(role, content)| HistoryEntry {
                role: *role,
                content: (*content).to_string(),
            })
            .collect()
    }

    #[test]
    fn question_messages_fixed_order() {
        let turns = history(&[
            (Role::User, "What is this about?"),
            (Role::Assistant, "It is about birds."),
            (Role::User, "Which birds?"),
        ]);

        let messages = question_messages(Some(QA_SYSTEM_PROMPT), "A field guide to birds.", &turns);

        assert_eq!(messages.len(), 5);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[0].content, QA_SYSTEM_PROMPT);
        assert!(messages[1].content.starts_with("Here is the document:\n"));
        assert_eq!(messages[1].role, "user");
        assert_eq!(messages[2].content, "What is this about?");
        assert_eq!(messages[3].role, "assistant");
        assert_eq!(messages[4].content, "Which birds?");
    }

    #[test]
    fn document_context_always_at_index_1() {
        let messages = question_messages(Some(QA_SYSTEM_PROMPT), "doc text", &[]);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].content, "Here is the document:\ndoc text");
    }

    #[test]
    fn system_prompt_absent_when_not_provided() {
        let turns = history(&[(Role::User, "question")]);
        let messages = question_messages(None, "doc text", &turns);

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "user");
        assert!(messages[1].content.starts_with("Here is the document:"));
    }

    #[test]
    fn document_truncated_to_context_limit() {
        let long_doc = "x".repeat(20_000);
        let messages = question_messages(Some(QA_SYSTEM_PROMPT), &long_doc, &[]);

        let prefix = "Here is the document:\n";
        let context = &messages[1].content[prefix.len()..];
        assert_eq!(context.chars().count(), DOC_CONTEXT_LIMIT);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let text = "héllo wörld".repeat(2000);
        let truncated = truncate_chars(&text, DOC_CONTEXT_LIMIT);
        assert_eq!(truncated.chars().count(), DOC_CONTEXT_LIMIT);
        // Slicing at a byte offset inside a multibyte char would have panicked
    }

    #[test]
    fn summary_messages_have_no_history_and_full_text() {
        let long_doc = "y".repeat(20_000);
        let messages = summary_messages(&long_doc);

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[0].content, SUMMARY_SYSTEM_PROMPT);
        assert_eq!(messages[1].content.len(), 20_000);
    }
}
