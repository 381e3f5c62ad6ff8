use thiserror::Error as ThisError;

/// Failures raised by the credential store.
#[derive(Debug, ThisError)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Stored payload (or one about to be stored) is not valid credential JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Ractor error: {0}")]
    Actor(String),
}
