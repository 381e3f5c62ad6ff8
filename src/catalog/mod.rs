//! Model catalog shown by the management panel.
//!
//! Pure pass-through: local model names come from config, the Antigravity list is
//! fetched from a remote catalog when one is configured.

use crate::config::Config;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::warn;
use url::Url;

#[derive(Debug, Clone, Serialize)]
pub struct ModelsInfo {
    pub gcli_models: Vec<String>,
    pub antigravity_models: Vec<String>,
    pub api_endpoints: Value,
    pub api_key: String,
}

#[derive(Debug, Deserialize)]
struct RemoteModelList {
    #[serde(default)]
    models: Vec<RemoteModel>,
}

#[derive(Debug, Deserialize)]
struct RemoteModel {
    name: String,
}

#[derive(Debug, Clone)]
pub struct ModelCatalog {
    geminicli_models: Vec<String>,
    antigravity_models_url: Option<Url>,
    api_key: String,
    client: reqwest::Client,
}

impl ModelCatalog {
    pub fn new(cfg: &Config) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(cfg.catalog.timeout_secs));

        if let Some(proxy_url) = cfg.catalog.proxy.as_ref() {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url.as_str())?);
        }

        Ok(Self {
            geminicli_models: cfg.catalog.geminicli_models.clone(),
            antigravity_models_url: cfg.catalog.antigravity_models_url.clone(),
            api_key: cfg.basic.api_key.clone(),
            client: builder.build()?,
        })
    }

    /// Current catalog. A failing remote fetch degrades to an empty Antigravity list.
    pub async fn snapshot(&self) -> ModelsInfo {
        let antigravity_models = match self.antigravity_models_url.as_ref() {
            Some(url) => self.fetch_remote(url).await.unwrap_or_else(|e| {
                warn!(url = %url, error = %e, "Failed to fetch Antigravity model list");
                Vec::new()
            }),
            None => Vec::new(),
        };

        ModelsInfo {
            gcli_models: self.geminicli_models.clone(),
            antigravity_models,
            api_endpoints: api_endpoints(),
            api_key: self.api_key.clone(),
        }
    }

    async fn fetch_remote(&self, url: &Url) -> Result<Vec<String>, reqwest::Error> {
        let list: RemoteModelList = self
            .client
            .get(url.clone())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(list
            .models
            .into_iter()
            .map(|m| {
                m.name
                    .strip_prefix("models/")
                    .map(str::to_string)
                    .unwrap_or(m.name)
            })
            .collect())
    }
}

/// Path templates per channel and client protocol.
pub fn api_endpoints() -> Value {
    json!({
        "gcli": {
            "openai": ["/v1/chat/completions", "/v1/models"],
            "gemini": [
                "/v1beta/models",
                "/{model}:generateContent",
                "/{model}:streamGenerateContent",
            ],
            "anthropic": ["/v1/messages"],
        },
        "antigravity": {
            "openai": ["/antigravity/v1/chat/completions", "/antigravity/v1/models"],
            "gemini": [
                "/antigravity/v1beta/models",
                "/antigravity/{model}:generateContent",
                "/antigravity/{model}:streamGenerateContent",
            ],
            "anthropic": ["/antigravity/v1/messages"],
        },
    })
}
