pub mod handlers;

use crate::server::router::PlugsyncState;
use axum::{
    Router,
    routing::{get, post},
};

use handlers::{check_tokens, plugin_status, update_token};

pub fn router() -> Router<PlugsyncState> {
    Router::new()
        .route("/api/plugin/update-token", post(update_token))
        .route("/api/plugin/check-tokens", post(check_tokens))
        .route("/api/plugin/status", get(plugin_status))
}
