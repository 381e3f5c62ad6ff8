use serde::{Deserialize, Serialize};
use url::Url;

/// Model catalog settings (`/models-info/list`).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    /// Model names served through the Gemini CLI channel.
    /// TOML: `catalog.geminicli_models`.
    #[serde(default = "default_geminicli_models")]
    pub geminicli_models: Vec<String>,

    /// Remote model list for the Antigravity channel (Gemini `models.list` shape).
    /// TOML: `catalog.antigravity_models_url`. Default: unset (empty list).
    #[serde(default)]
    pub antigravity_models_url: Option<Url>,

    /// Optional HTTP proxy for the remote catalog fetch.
    /// TOML: `catalog.proxy`. Example: `http://127.0.0.1:1080`.
    #[serde(default)]
    pub proxy: Option<Url>,

    /// Timeout for the remote catalog fetch, in seconds.
    /// TOML: `catalog.timeout_secs`. Default: `10`.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            geminicli_models: default_geminicli_models(),
            antigravity_models_url: None,
            proxy: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_geminicli_models() -> Vec<String> {
    vec!["gemini-2.5-pro".to_string(), "gemini-2.5-flash".to_string()]
}

fn default_timeout_secs() -> u64 {
    10
}
