use crate::error::PluginError;
use crate::server::router::PlugsyncState;
use axum::{
    Json,
    extract::FromRequestParts,
    http::{HeaderMap, StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use serde_json::{Map, Value, json};
use std::{fmt, sync::Arc};
use subtle::ConstantTimeEq;

/// Shared connection secret for the token updater plugin, fixed at startup.
///
/// An empty configured value means the plugin endpoints are disabled.
#[derive(Clone, Default)]
pub struct PluginSecret(Option<Arc<str>>);

impl PluginSecret {
    pub fn new(raw: &str) -> Self {
        if raw.is_empty() {
            Self(None)
        } else {
            Self(Some(Arc::from(raw)))
        }
    }

    pub fn is_configured(&self) -> bool {
        self.0.is_some()
    }

    /// Check a presented secret. Empty and absent are the same thing.
    pub fn verify(&self, presented: Option<&str>) -> Result<(), PluginError> {
        let expected = self.0.as_deref().ok_or(PluginError::ServiceUnavailable)?;
        match presented.filter(|p| !p.is_empty()) {
            Some(p) if bool::from(p.as_bytes().ct_eq(expected.as_bytes())) => Ok(()),
            _ => Err(PluginError::Unauthenticated),
        }
    }
}

impl fmt::Debug for PluginSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shown = if self.is_configured() { "<redacted>" } else { "<unset>" };
        f.debug_tuple("PluginSecret").field(&shown).finish()
    }
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| auth.token().to_string())
}

/// Authenticate a plugin call: bearer header first, then the body's `token` field.
pub fn authenticate(
    secret: &PluginSecret,
    headers: &HeaderMap,
    body: &Map<String, Value>,
) -> Result<(), PluginError> {
    let presented = extract_bearer_token(headers)
        .or_else(|| body.get("token").and_then(Value::as_str).map(str::to_string));
    secret.verify(presented.as_deref())
}

/// Guard for management panel routes (`Authorization: Bearer <panel_key>`).
#[derive(Debug, Clone, Copy)]
pub struct RequirePanelAuth;

impl FromRequestParts<PlugsyncState> for RequirePanelAuth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &PlugsyncState,
    ) -> Result<Self, Self::Rejection> {
        match extract_bearer_token(&parts.headers) {
            Some(key) => {
                let expected = state.panel_key.as_ref();
                if !expected.is_empty() && bool::from(key.as_bytes().ct_eq(expected.as_bytes())) {
                    Ok(RequirePanelAuth)
                } else {
                    Err(AuthError::InvalidKey)
                }
            }
            None => Err(AuthError::MissingKey),
        }
    }
}

pub enum AuthError {
    MissingKey,
    InvalidKey,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, reason) = match self {
            AuthError::MissingKey => (StatusCode::UNAUTHORIZED, "Missing panel key"),
            AuthError::InvalidKey => (StatusCode::UNAUTHORIZED, "Invalid panel key"),
        };
        (
            status,
            Json(json!({ "error": "unauthorized", "reason": reason })),
        )
            .into_response()
    }
}
