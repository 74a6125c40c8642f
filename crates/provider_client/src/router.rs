//! Provider routing.
//!
//! A pure lookup from model id to upstream endpoint. Unknown model ids fall
//! back to the default (search-answer) provider so a stale client model list
//! degrades instead of failing.

use chat_core::{lookup_model, Config, ProviderKind, DEFAULT_PROVIDER};

/// Where a turn should be sent and how attachments must be encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub provider: ProviderKind,
    /// Binary attachments require a multipart body instead of inline JSON.
    pub multipart: bool,
}

/// Resolve the route for a model id against the static capability table.
pub fn route(model_id: &str) -> Route {
    match lookup_model(model_id) {
        Some(info) => Route {
            provider: info.provider,
            multipart: info.multipart_attachments,
        },
        None => Route {
            provider: DEFAULT_PROVIDER,
            multipart: false,
        },
    }
}

impl Route {
    /// Full chat endpoint URL for this route.
    pub fn endpoint_url(&self, config: &Config) -> String {
        let base = config.endpoint(self.provider).api_base.trim_end_matches('/');
        format!("{base}/chat/completions")
    }

    pub fn api_key<'a>(&self, config: &'a Config) -> &'a str {
        &config.endpoint(self.provider).api_key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_llm_model_routes_to_its_provider() {
        let route = route("claude-3-5-sonnet");
        assert_eq!(route.provider, ProviderKind::Anthropic);
        assert!(route.multipart);
    }

    #[test]
    fn test_search_model_routes_to_search() {
        let route = route("sonar");
        assert_eq!(route.provider, ProviderKind::SearchAnswer);
        assert!(!route.multipart);
    }

    #[test]
    fn test_unknown_model_falls_back_to_default() {
        let route = route("some-future-model");
        assert_eq!(route.provider, DEFAULT_PROVIDER);
        assert!(!route.multipart);
    }

    #[test]
    fn test_endpoint_url_strips_trailing_slash() {
        let mut config = Config::default();
        config.openai.api_base = "https://api.openai.com/v1/".to_string();
        let route = route("gpt-4o-mini");
        assert_eq!(
            route.endpoint_url(&config),
            "https://api.openai.com/v1/chat/completions"
        );
    }
}
