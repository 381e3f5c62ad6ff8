mod plugin;
mod store;

pub use plugin::{ApiErrorBody, ApiErrorObject, PluginError};
pub use store::StoreError;
