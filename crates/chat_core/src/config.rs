//! Runtime configuration.
//!
//! Loaded from `config.toml` when present, then overridden by environment
//! variables so containerized deployments can configure everything via env.

use serde::{Deserialize, Serialize};

use crate::models::ProviderKind;

const CONFIG_FILE_PATH: &str = "config.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyAuth {
    pub username: String,
    pub password: String,
}

/// Base URL and API key for one upstream provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderEndpoint {
    #[serde(default)]
    pub api_base: String,
    #[serde(default)]
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub search: ProviderEndpoint,
    #[serde(default)]
    pub openai: ProviderEndpoint,
    #[serde(default)]
    pub anthropic: ProviderEndpoint,
    #[serde(default)]
    pub google: ProviderEndpoint,

    #[serde(default)]
    pub http_proxy: String,
    #[serde(default)]
    pub https_proxy: String,
    #[serde(default)]
    pub http_proxy_auth: Option<ProxyAuth>,
    #[serde(default)]
    pub https_proxy_auth: Option<ProxyAuth>,

    /// Shared secret used to verify session cookies minted by the hosted
    /// identity provider.
    #[serde(default)]
    pub session_secret: String,

    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

fn default_port() -> u16 {
    8080
}

fn default_data_dir() -> String {
    "data".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            search: ProviderEndpoint {
                api_base: "https://api.perplexity.ai".to_string(),
                api_key: String::new(),
            },
            openai: ProviderEndpoint {
                api_base: "https://api.openai.com/v1".to_string(),
                api_key: String::new(),
            },
            anthropic: ProviderEndpoint {
                api_base: "https://api.anthropic.com/v1".to_string(),
                api_key: String::new(),
            },
            google: ProviderEndpoint {
                api_base: "https://generativelanguage.googleapis.com/v1beta".to_string(),
                api_key: String::new(),
            },
            http_proxy: String::new(),
            https_proxy: String::new(),
            http_proxy_auth: None,
            https_proxy_auth: None,
            session_secret: String::new(),
            port: default_port(),
            data_dir: default_data_dir(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        let mut config = Config::default();

        if std::path::Path::new(CONFIG_FILE_PATH).exists() {
            match std::fs::read_to_string(CONFIG_FILE_PATH) {
                Ok(content) => match toml::from_str::<Config>(&content) {
                    Ok(file_config) => config = file_config,
                    Err(err) => log::warn!("Failed to parse {CONFIG_FILE_PATH}: {err}"),
                },
                Err(err) => log::warn!("Failed to read {CONFIG_FILE_PATH}: {err}"),
            }
        }

        config.apply_env();
        config
    }

    fn apply_env(&mut self) {
        apply_endpoint_env(&mut self.search, "SEARCH");
        apply_endpoint_env(&mut self.openai, "OPENAI");
        apply_endpoint_env(&mut self.anthropic, "ANTHROPIC");
        apply_endpoint_env(&mut self.google, "GOOGLE");

        if let Ok(http_proxy) = std::env::var("HTTP_PROXY") {
            self.http_proxy = http_proxy;
        }
        if let Ok(https_proxy) = std::env::var("HTTPS_PROXY") {
            self.https_proxy = https_proxy;
        }
        if let Ok(secret) = std::env::var("SESSION_SECRET") {
            self.session_secret = secret;
        }
        if let Ok(port) = std::env::var("APP_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.port = port;
            }
        }
        if let Ok(data_dir) = std::env::var("DATA_DIR") {
            self.data_dir = data_dir;
        }
    }

    /// Endpoint settings for the given provider family.
    pub fn endpoint(&self, provider: ProviderKind) -> &ProviderEndpoint {
        match provider {
            ProviderKind::SearchAnswer => &self.search,
            ProviderKind::OpenAi => &self.openai,
            ProviderKind::Anthropic => &self.anthropic,
            ProviderKind::Google => &self.google,
        }
    }
}

fn apply_endpoint_env(endpoint: &mut ProviderEndpoint, prefix: &str) {
    if let Ok(base) = std::env::var(format!("{prefix}_API_BASE")) {
        endpoint.api_base = base;
    }
    if let Ok(key) = std::env::var(format!("{prefix}_API_KEY")) {
        endpoint.api_key = key;
    }
}
