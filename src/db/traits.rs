use crate::credential::{CredentialRecord, Mode, RuntimeState};
use crate::error::StoreError;
use async_trait::async_trait;

/// Store operations the intake and refresh-state engine rely on.
///
/// Listing order must be deterministic for a given store state; the engine scans and
/// reports in that order.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn list_credentials(&self, mode: Mode) -> Result<Vec<String>, StoreError>;

    async fn get_credential(
        &self,
        filename: &str,
        mode: Mode,
    ) -> Result<Option<CredentialRecord>, StoreError>;

    async fn get_credential_state(
        &self,
        filename: &str,
        mode: Mode,
    ) -> Result<Option<RuntimeState>, StoreError>;

    /// Write (or overwrite) a Gemini CLI credential.
    async fn add_credential(
        &self,
        filename: &str,
        record: &CredentialRecord,
    ) -> Result<(), StoreError>;

    /// Write (or overwrite) an Antigravity credential.
    async fn add_antigravity_credential(
        &self,
        filename: &str,
        record: &CredentialRecord,
    ) -> Result<(), StoreError>;
}
