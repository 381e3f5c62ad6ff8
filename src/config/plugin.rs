use serde::{Deserialize, Serialize};

use super::basic::deserialize_string_lax;

/// External token-updater plugin settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PluginConfig {
    /// Shared secret the token updater must present on every plugin call.
    /// Empty disables the plugin endpoints (they answer 503).
    /// TOML: `plugin.connection_token`. Env: `PLUGIN_CONNECTION_TOKEN`. Default: empty.
    #[serde(default)]
    #[serde(deserialize_with = "deserialize_string_lax")]
    pub connection_token: String,
}
