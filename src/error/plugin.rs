use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error as ThisError;
use tracing::error;

use super::store::StoreError;

#[derive(Debug, ThisError)]
pub enum PluginError {
    /// No connection token configured; the plugin endpoints are administratively off.
    #[error("Plugin connection token is not configured")]
    ServiceUnavailable,

    #[error("Invalid or missing connection token")]
    Unauthenticated,

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PluginError {
    pub fn invalid_payload(message: impl Into<String>) -> Self {
        PluginError::InvalidPayload(message.into())
    }
}

impl IntoResponse for PluginError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_body) = match self {
            PluginError::ServiceUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                ApiErrorObject {
                    code: "PLUGIN_DISABLED".to_string(),
                    message: "Plugin connection token is not configured.".to_string(),
                },
            ),
            PluginError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                ApiErrorObject {
                    code: "UNAUTHENTICATED".to_string(),
                    message: "Invalid connection token.".to_string(),
                },
            ),
            PluginError::InvalidPayload(message) => (
                StatusCode::BAD_REQUEST,
                ApiErrorObject {
                    code: "INVALID_PAYLOAD".to_string(),
                    message,
                },
            ),
            PluginError::Store(err) => {
                error!(error = %err, "Plugin request failed on credential store");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorObject {
                        code: "INTERNAL_ERROR".to_string(),
                        message: "An internal server error occurred.".to_string(),
                        },
                )
            }
        };
        (status, Json(ApiErrorBody { inner: error_body })).into_response()
    }
}

/// Standardized API error response payload.
#[derive(Serialize)]
pub struct ApiErrorObject {
    pub code: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct ApiErrorBody {
    #[serde(rename = "error")]
    pub inner: ApiErrorObject,
}
