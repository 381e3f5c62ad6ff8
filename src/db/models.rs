use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct DbPluginCredential {
    pub id: i64,
    pub mode: String,
    pub filename: String,
    /// Credential JSON exactly as pushed.
    pub payload: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct DbCredentialState {
    pub id: i64,
    pub mode: String,
    pub filename: String,
    pub user_email: Option<String>,
    pub disabled: bool,
    /// JSON array of strings.
    pub error_codes: String,
    pub updated_at: DateTime<Utc>,
}
