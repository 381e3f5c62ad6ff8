pub mod catalog;
pub mod config;
pub mod credential;
pub mod db;
pub mod error;
pub mod server;

pub use credential::{CredentialRecord, Mode, RuntimeState, TokenStatusSummary};
pub use error::{PluginError, StoreError};
