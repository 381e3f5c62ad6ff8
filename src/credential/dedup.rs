use super::normalize::{CREDENTIAL_FILE_SUFFIX, NormalizedPush};
use super::{CredentialRecord, Mode};
use crate::db::CredentialStore;
use crate::error::StoreError;
use serde::Serialize;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IntakeAction {
    Created,
    Updated,
}

impl IntakeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntakeAction::Created => "created",
            IntakeAction::Updated => "updated",
        }
    }

    /// Human-facing line for the intake response.
    pub fn message(&self) -> &'static str {
        match self {
            IntakeAction::Created => "Credential created",
            IntakeAction::Updated => "Credential updated",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub filename: String,
    pub action: IntakeAction,
}

/// Match a normalized push against stored credentials of its mode, then write it.
///
/// A stored record with the same non-empty `project_id` is overwritten in place (first
/// match in listing order). Unreadable records are skipped. The scan and the write are
/// not atomic together: two concurrent pushes for a new project may both create.
pub async fn reconcile<S>(store: &S, push: NormalizedPush) -> Result<ReconcileOutcome, StoreError>
where
    S: CredentialStore + ?Sized,
{
    let NormalizedPush {
        record,
        filename,
        mode,
        filename_derived,
    } = push;

    let existing = store.list_credentials(mode).await?;
    let project_id = record.project_id();

    let matched = if project_id.is_empty() {
        None
    } else {
        find_project_match(store, mode, &project_id, &existing).await
    };

    let outcome = match matched {
        Some(filename) => {
            info!(
                filename = %filename,
                mode = %mode,
                project_id = %project_id,
                "[Plugin] Updating existing credential"
            );
            ReconcileOutcome {
                filename,
                action: IntakeAction::Updated,
            }
        }
        None if filename_derived && existing.contains(&filename) => ReconcileOutcome {
            filename: disambiguate(&filename),
            action: IntakeAction::Created,
        },
        None => ReconcileOutcome {
            filename,
            action: IntakeAction::Created,
        },
    };

    write_credential(store, mode, &outcome.filename, &record).await?;

    info!(
        filename = %outcome.filename,
        mode = %mode,
        action = outcome.action.as_str(),
        "[Plugin] Credential stored"
    );
    Ok(outcome)
}

async fn find_project_match<S>(
    store: &S,
    mode: Mode,
    project_id: &str,
    existing: &[String],
) -> Option<String>
where
    S: CredentialStore + ?Sized,
{
    for filename in existing {
        match store.get_credential(filename, mode).await {
            Ok(Some(stored)) if stored.project_id() == project_id => {
                return Some(filename.clone());
            }
            Ok(_) => {}
            Err(e) => {
                debug!(
                    filename = %filename,
                    mode = %mode,
                    error = %e,
                    "[Plugin] Skipping unreadable credential during dedup scan"
                );
            }
        }
    }
    None
}

/// Route the write through the mode's own credential manager entry point.
async fn write_credential<S>(
    store: &S,
    mode: Mode,
    filename: &str,
    record: &CredentialRecord,
) -> Result<(), StoreError>
where
    S: CredentialStore + ?Sized,
{
    match mode {
        Mode::Antigravity => store.add_antigravity_credential(filename, record).await,
        Mode::Geminicli => store.add_credential(filename, record).await,
    }
}

/// `p-1700000000.json` -> `p-1700000000-1a2b3c4d.json`
fn disambiguate(filename: &str) -> String {
    let stem = filename
        .strip_suffix(CREDENTIAL_FILE_SUFFIX)
        .unwrap_or(filename);
    let tag = uuid::Uuid::new_v4().simple().to_string();
    format!("{stem}-{}{CREDENTIAL_FILE_SUFFIX}", &tag[..8])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::test_store::{MemoryStore, record};
    use serde_json::json;

    fn push(record: CredentialRecord, filename: &str, mode: Mode, derived: bool) -> NormalizedPush {
        NormalizedPush {
            record,
            filename: filename.to_string(),
            mode,
            filename_derived: derived,
        }
    }

    #[tokio::test]
    async fn unseen_project_is_created_under_computed_filename() {
        let store = MemoryStore::default().with_record(Mode::Geminicli, "a.json", record("c0", "p0"));

        let outcome = reconcile(
            &store,
            push(record("c1", "p1"), "p1-100.json", Mode::Geminicli, true),
        )
        .await
        .unwrap();

        assert_eq!(outcome.action, IntakeAction::Created);
        assert_eq!(outcome.filename, "p1-100.json");
        assert_eq!(store.filenames(Mode::Geminicli), vec!["a.json", "p1-100.json"]);
    }

    #[tokio::test]
    async fn known_project_overwrites_first_match() {
        let store = MemoryStore::default()
            .with_record(Mode::Geminicli, "first.json", record("old", "p1"))
            .with_record(Mode::Geminicli, "second.json", record("older", "p1"));

        let mut incoming = record("new", "p1");
        incoming.expiry = Some(json!("2030-01-01T00:00:00Z"));
        let outcome = reconcile(
            &store,
            push(incoming.clone(), "p1-200.json", Mode::Geminicli, true),
        )
        .await
        .unwrap();

        assert_eq!(outcome.action, IntakeAction::Updated);
        assert_eq!(outcome.filename, "first.json");
        assert_eq!(store.record(Mode::Geminicli, "first.json"), Some(incoming));
        assert_eq!(
            store.record(Mode::Geminicli, "second.json")
                .and_then(|r| r.client_id),
            Some(json!("older"))
        );
        assert_eq!(store.filenames(Mode::Geminicli).len(), 2);
    }

    #[tokio::test]
    async fn matching_is_scoped_to_mode() {
        let store =
            MemoryStore::default().with_record(Mode::Geminicli, "g.json", record("c0", "p1"));

        let outcome = reconcile(
            &store,
            push(record("c1", "p1"), "p1-300.json", Mode::Antigravity, true),
        )
        .await
        .unwrap();

        assert_eq!(outcome.action, IntakeAction::Created);
        assert_eq!(
            *store.writes.lock().unwrap(),
            vec![("add_antigravity_credential", "p1-300.json".to_string())]
        );
    }

    #[tokio::test]
    async fn unreadable_records_are_skipped() {
        let store = MemoryStore::default()
            .with_corrupt(Mode::Geminicli, "broken.json")
            .with_record(Mode::Geminicli, "good.json", record("c0", "p1"));

        let outcome = reconcile(
            &store,
            push(record("c1", "p1"), "p1-400.json", Mode::Geminicli, true),
        )
        .await
        .unwrap();

        assert_eq!(outcome.action, IntakeAction::Updated);
        assert_eq!(outcome.filename, "good.json");
    }

    #[tokio::test]
    async fn empty_project_id_never_matches() {
        let store = MemoryStore::default().with_record(Mode::Geminicli, "x.json", record("c0", ""));

        let outcome = reconcile(&store, push(record("c1", ""), "mine.json", Mode::Geminicli, false))
            .await
            .unwrap();

        assert_eq!(outcome.action, IntakeAction::Created);
        assert_eq!(outcome.filename, "mine.json");
        assert_eq!(
            *store.writes.lock().unwrap(),
            vec![("add_credential", "mine.json".to_string())]
        );
    }

    #[tokio::test]
    async fn colliding_derived_filename_gets_a_suffix() {
        let store = MemoryStore::default().with_record(
            Mode::Geminicli,
            "plugin-500.json",
            record("c0", ""),
        );

        let outcome = reconcile(
            &store,
            push(record("c1", ""), "plugin-500.json", Mode::Geminicli, true),
        )
        .await
        .unwrap();

        assert_eq!(outcome.action, IntakeAction::Created);
        assert!(outcome.filename.starts_with("plugin-500-"));
        assert!(outcome.filename.ends_with(".json"));
        assert_eq!(outcome.filename.len(), "plugin-500-12345678.json".len());
        assert_eq!(
            store.record(Mode::Geminicli, "plugin-500.json")
                .and_then(|r| r.client_id),
            Some(json!("c0"))
        );
    }

    #[tokio::test]
    async fn explicit_filename_collision_overwrites() {
        let store =
            MemoryStore::default().with_record(Mode::Geminicli, "acct.json", record("c0", ""));

        let outcome = reconcile(&store, push(record("c1", ""), "acct.json", Mode::Geminicli, false))
            .await
            .unwrap();

        assert_eq!(outcome.action, IntakeAction::Created);
        assert_eq!(outcome.filename, "acct.json");
        assert_eq!(
            store.record(Mode::Geminicli, "acct.json")
                .and_then(|r| r.client_id),
            Some(json!("c1"))
        );
    }

    #[tokio::test]
    async fn numeric_project_id_matches_its_text_form() {
        let mut stored = record("c0", "");
        stored.project_id = Some(json!(123456));
        let store = MemoryStore::default().with_record(Mode::Geminicli, "num.json", stored);

        let outcome = reconcile(
            &store,
            push(record("c1", "123456"), "123456-600.json", Mode::Geminicli, true),
        )
        .await
        .unwrap();

        assert_eq!(outcome.action, IntakeAction::Updated);
        assert_eq!(outcome.filename, "num.json");
        assert_eq!(
            store.record(Mode::Geminicli, "num.json").and_then(|r| r.client_id),
            Some(json!("c1"))
        );
    }
}
