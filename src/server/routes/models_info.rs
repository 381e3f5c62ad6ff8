use crate::catalog::ModelsInfo;
use crate::server::router::PlugsyncState;
use axum::{Json, Router, extract::State, routing::get};

pub fn router() -> Router<PlugsyncState> {
    Router::new().route("/models-info/list", get(models_info_handler))
}

/// GET /models-info/list (panel key required)
pub async fn models_info_handler(State(state): State<PlugsyncState>) -> Json<ModelsInfo> {
    Json(state.catalog.snapshot().await)
}
