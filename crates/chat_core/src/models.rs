//! Static model-capability table.
//!
//! Routing is a pure lookup over this table; unknown model ids fall back to
//! the default (search-answer) provider.

use serde::{Deserialize, Serialize};

/// Which upstream family serves a given model.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Search-answer provider: short follow-up context, citations in-stream.
    SearchAnswer,
    OpenAi,
    Anthropic,
    Google,
}

impl ProviderKind {
    pub fn is_llm(&self) -> bool {
        !matches!(self, ProviderKind::SearchAnswer)
    }
}

/// One row of the capability table.
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub id: &'static str,
    pub display_name: &'static str,
    pub provider: ProviderKind,
    /// Binary attachments must be sent as multipart instead of inline JSON.
    pub multipart_attachments: bool,
}

pub const DEFAULT_PROVIDER: ProviderKind = ProviderKind::SearchAnswer;

pub const MODELS: &[ModelInfo] = &[
    ModelInfo {
        id: "sonar",
        display_name: "Sonar",
        provider: ProviderKind::SearchAnswer,
        multipart_attachments: false,
    },
    ModelInfo {
        id: "sonar-pro",
        display_name: "Sonar Pro",
        provider: ProviderKind::SearchAnswer,
        multipart_attachments: false,
    },
    ModelInfo {
        id: "gpt-4o-mini",
        display_name: "GPT-4o mini",
        provider: ProviderKind::OpenAi,
        multipart_attachments: false,
    },
    ModelInfo {
        id: "gpt-4o",
        display_name: "GPT-4o",
        provider: ProviderKind::OpenAi,
        multipart_attachments: true,
    },
    ModelInfo {
        id: "claude-3-5-sonnet",
        display_name: "Claude 3.5 Sonnet",
        provider: ProviderKind::Anthropic,
        multipart_attachments: true,
    },
    ModelInfo {
        id: "claude-3-haiku",
        display_name: "Claude 3 Haiku",
        provider: ProviderKind::Anthropic,
        multipart_attachments: false,
    },
    ModelInfo {
        id: "gemini-1.5-flash",
        display_name: "Gemini 1.5 Flash",
        provider: ProviderKind::Google,
        multipart_attachments: true,
    },
];

/// Look up a model by id in the capability table.
pub fn lookup_model(id: &str) -> Option<&'static ModelInfo> {
    MODELS.iter().find(|m| m.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_known_model() {
        let info = lookup_model("gpt-4o").unwrap();
        assert_eq!(info.provider, ProviderKind::OpenAi);
        assert!(info.multipart_attachments);
    }

    #[test]
    fn test_lookup_unknown_model() {
        assert!(lookup_model("not-a-model").is_none());
    }

    #[test]
    fn test_search_provider_is_not_llm() {
        assert!(!ProviderKind::SearchAnswer.is_llm());
        assert!(ProviderKind::Anthropic.is_llm());
    }
}
