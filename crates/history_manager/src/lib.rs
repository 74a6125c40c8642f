//! history_manager - Sliding-window conversation history truncation
//!
//! Bounds how much prior conversation is sent upstream per request. The
//! search-answer provider only needs a short follow-up hint, so it gets the
//! last few messages ending on a user turn; LLM providers get a fixed number
//! of recent message pairs. No token accounting, no summarization.

use chat_core::{Message, ProviderKind};

/// Messages kept for the search-answer provider.
pub const SEARCH_HISTORY_LIMIT: usize = 3;

/// Message pairs kept for LLM providers (pairs, so 10 messages).
pub const LLM_HISTORY_PAIRS: usize = 5;

/// Select the bounded subsequence of `messages` to send upstream.
///
/// Identity when the input already fits the provider's bound. Pure and
/// deterministic; the input order is preserved in the output.
pub fn truncate_history(messages: &[Message], provider: ProviderKind) -> Vec<Message> {
    match provider {
        ProviderKind::SearchAnswer => truncate_for_search(messages),
        _ => truncate_for_llm(messages),
    }
}

/// Keep the last `SEARCH_HISTORY_LIMIT` messages, guaranteeing the final
/// element is a user message whenever the input contains one. The naive
/// slice can end on an assistant message (e.g. after a cancelled turn); in
/// that case the final slot is substituted with the most recent user message.
fn truncate_for_search(messages: &[Message]) -> Vec<Message> {
    let start = messages.len().saturating_sub(SEARCH_HISTORY_LIMIT);
    let mut window: Vec<Message> = messages[start..].to_vec();

    let ends_on_user = window.last().map(|m| m.is_user()).unwrap_or(true);
    if !ends_on_user {
        if let Some(last_user) = messages.iter().rev().find(|m| m.is_user()) {
            let last = window.len() - 1;
            window[last] = last_user.clone();
        }
    }
    window
}

/// Keep the last `2 * LLM_HISTORY_PAIRS` messages, dropping older history
/// unconditionally once the count is exceeded.
fn truncate_for_llm(messages: &[Message]) -> Vec<Message> {
    let limit = LLM_HISTORY_PAIRS * 2;
    let start = messages.len().saturating_sub(limit);
    messages[start..].to_vec()
}
