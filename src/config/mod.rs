mod basic;
mod catalog;
mod plugin;

pub use basic::BasicConfig;
pub use catalog::CatalogConfig;
pub use plugin::PluginConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, sync::LazyLock};

/// Application configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Core server configuration (see `basic` table in config.toml).
    #[serde(default)]
    pub basic: BasicConfig,

    /// Token updater plugin settings (see `plugin` table in config.toml).
    #[serde(default)]
    pub plugin: PluginConfig,

    /// Model catalog settings (see `catalog` table in config.toml).
    #[serde(default)]
    pub catalog: CatalogConfig,
}

const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Environment variables that override single config keys.
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("PLUGIN_CONNECTION_TOKEN", "plugin.connection_token"),
    ("LOGLEVEL", "basic.loglevel"),
];

impl Config {
    /// Builds a Figment that merges defaults, an optional config TOML file, and env overrides.
    pub fn figment() -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));
        if PathBuf::from(DEFAULT_CONFIG_FILE).is_file() {
            figment = figment.merge(Toml::file(DEFAULT_CONFIG_FILE));
        }
        let env_keys: Vec<&str> = ENV_OVERRIDES.iter().map(|(env, _)| *env).collect();
        figment.merge(Env::raw().only(&env_keys).map(|key| {
            ENV_OVERRIDES
                .iter()
                .find(|(env, _)| key.as_str().eq_ignore_ascii_case(env))
                .map(|(_, path)| (*path).into())
                .unwrap_or_else(|| key.as_str().to_owned().into())
        }))
    }

    /// Loads configuration without validating required fields.
    ///
    /// Binaries should call `Config::from_toml()` instead to avoid running with an empty panel key.
    pub fn from_optional_toml() -> Self {
        Self::figment().extract().unwrap_or_else(|err| {
            panic!("failed to extract configuration (defaults + optional config.toml): {err}")
        })
    }

    /// Loads configuration and validates required fields.
    pub fn from_toml() -> Self {
        let cfg: Self = Self::figment().extract().unwrap_or_else(|err| {
            panic!(
                "failed to extract configuration from {}: {err}",
                DEFAULT_CONFIG_FILE
            )
        });
        if cfg.basic.panel_key.trim().is_empty() {
            panic!("basic.panel_key must be set and non-empty");
        }
        cfg
    }
}

/// Global, lazily-initialized configuration instance.
pub static CONFIG: LazyLock<Config> = LazyLock::new(Config::from_toml);
