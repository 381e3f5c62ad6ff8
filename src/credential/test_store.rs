use super::{CredentialRecord, Mode, RuntimeState};
use crate::db::CredentialStore;
use crate::error::StoreError;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Mutex;

/// Stored entry; `Err` reads back as a corrupt payload.
type Entry = (Mode, String, Result<CredentialRecord, String>);

/// In-memory store keeping insertion order, with injectable read failures.
#[derive(Default)]
pub(crate) struct MemoryStore {
    entries: Mutex<Vec<Entry>>,
    states: Mutex<Vec<(Mode, String, Result<RuntimeState, String>)>>,
    /// (entry point, filename) for every write, in order.
    pub(crate) writes: Mutex<Vec<(&'static str, String)>>,
}

impl MemoryStore {
    pub(crate) fn with_record(self, mode: Mode, filename: &str, record: CredentialRecord) -> Self {
        self.put(mode, filename, Ok(record));
        self
    }

    pub(crate) fn with_corrupt(self, mode: Mode, filename: &str) -> Self {
        self.put(mode, filename, Err("corrupt payload".to_string()));
        self
    }

    pub(crate) fn with_state(self, mode: Mode, filename: &str, state: RuntimeState) -> Self {
        self.states
            .lock()
            .unwrap()
            .push((mode, filename.to_string(), Ok(state)));
        self
    }

    pub(crate) fn with_corrupt_state(self, mode: Mode, filename: &str) -> Self {
        self.states.lock().unwrap().push((
            mode,
            filename.to_string(),
            Err("corrupt state".to_string()),
        ));
        self
    }

    pub(crate) fn record(&self, mode: Mode, filename: &str) -> Option<CredentialRecord> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .find(|(m, f, _)| *m == mode && f == filename)
            .and_then(|(_, _, r)| r.clone().ok())
    }

    pub(crate) fn filenames(&self, mode: Mode) -> Vec<String> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, _, _)| *m == mode)
            .map(|(_, f, _)| f.clone())
            .collect()
    }

    fn put(&self, mode: Mode, filename: &str, value: Result<CredentialRecord, String>) {
        let mut entries = self.entries.lock().unwrap();
        match entries
            .iter_mut()
            .find(|(m, f, _)| *m == mode && f == filename)
        {
            Some(entry) => entry.2 = value,
            None => entries.push((mode, filename.to_string(), value)),
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn list_credentials(&self, mode: Mode) -> Result<Vec<String>, StoreError> {
        Ok(self.filenames(mode))
    }

    async fn get_credential(
        &self,
        filename: &str,
        mode: Mode,
    ) -> Result<Option<CredentialRecord>, StoreError> {
        let entries = self.entries.lock().unwrap();
        match entries.iter().find(|(m, f, _)| *m == mode && f == filename) {
            Some((_, _, Ok(record))) => Ok(Some(record.clone())),
            Some((_, _, Err(reason))) => Err(StoreError::Actor(reason.clone())),
            None => Ok(None),
        }
    }

    async fn get_credential_state(
        &self,
        filename: &str,
        mode: Mode,
    ) -> Result<Option<RuntimeState>, StoreError> {
        let states = self.states.lock().unwrap();
        match states.iter().find(|(m, f, _)| *m == mode && f == filename) {
            Some((_, _, Ok(state))) => Ok(Some(state.clone())),
            Some((_, _, Err(reason))) => Err(StoreError::Actor(reason.clone())),
            None => Ok(None),
        }
    }

    async fn add_credential(
        &self,
        filename: &str,
        record: &CredentialRecord,
    ) -> Result<(), StoreError> {
        self.writes
            .lock()
            .unwrap()
            .push(("add_credential", filename.to_string()));
        self.put(Mode::Geminicli, filename, Ok(record.clone()));
        Ok(())
    }

    async fn add_antigravity_credential(
        &self,
        filename: &str,
        record: &CredentialRecord,
    ) -> Result<(), StoreError> {
        self.writes
            .lock()
            .unwrap()
            .push(("add_antigravity_credential", filename.to_string()));
        self.put(Mode::Antigravity, filename, Ok(record.clone()));
        Ok(())
    }
}

pub(crate) fn record(client_id: &str, project_id: &str) -> CredentialRecord {
    CredentialRecord {
        client_id: Some(json!(client_id)),
        refresh_token: Some(json!(format!("rt-{client_id}"))),
        project_id: (!project_id.is_empty()).then(|| json!(project_id)),
        ..Default::default()
    }
}
