use crate::credential::normalize::decode_body;
use crate::credential::{
    IntakeAction, Mode, RefreshReport, TokenStatusSummary, evaluate, normalize, reconcile,
};
use crate::error::PluginError;
use crate::server::guards::auth::authenticate;
use crate::server::router::PlugsyncState;
use axum::{Json, body::Bytes, extract::State, http::HeaderMap};
use chrono::Utc;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct UpdateTokenResponse {
    pub success: bool,
    pub message: &'static str,
    pub filename: String,
    pub action: IntakeAction,
    /// Same as `filename`; kept for updater clients that key on `id`.
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct CheckTokensResponse {
    pub success: bool,
    pub tokens: Vec<TokenStatusSummary>,
    pub needs_refresh_emails: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct PluginStatusResponse {
    pub enabled: bool,
    pub has_token: bool,
}

/// POST /api/plugin/update-token
///
/// Accepts a credential pushed by the token updater, either nested under `credential`
/// or flattened into the body, and stores it (overwriting the record of the same project).
pub async fn update_token(
    State(state): State<PlugsyncState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<UpdateTokenResponse>, PluginError> {
    let body = decode_body(&body)?;
    authenticate(&state.plugin_secret, &headers, &body)?;

    let push = normalize(&body, Mode::Geminicli, Utc::now())?;
    let outcome = reconcile(state.store.as_ref(), push).await?;

    Ok(Json(UpdateTokenResponse {
        success: true,
        message: outcome.action.message(),
        id: outcome.filename.clone(),
        filename: outcome.filename,
        action: outcome.action,
    }))
}

/// POST /api/plugin/check-tokens
///
/// Reports which stored credentials need a refresh. A malformed body reads as `{}`.
pub async fn check_tokens(
    State(state): State<PlugsyncState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<CheckTokensResponse>, PluginError> {
    let body = decode_body(&body).unwrap_or_default();
    authenticate(&state.plugin_secret, &headers, &body)?;

    let mode = Mode::from_field(body.get("mode"), Mode::Geminicli);
    let RefreshReport {
        tokens,
        needs_refresh_emails,
    } = evaluate(state.store.as_ref(), mode, Utc::now()).await?;

    Ok(Json(CheckTokensResponse {
        success: true,
        tokens,
        needs_refresh_emails,
    }))
}

/// GET /api/plugin/status
pub async fn plugin_status(State(state): State<PlugsyncState>) -> Json<PluginStatusResponse> {
    let configured = state.plugin_secret.is_configured();
    Json(PluginStatusResponse {
        enabled: configured,
        has_token: configured,
    })
}
