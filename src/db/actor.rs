use crate::credential::{CredentialRecord, Mode, RuntimeState};
use crate::db::models::{DbCredentialState, DbPluginCredential};
use crate::db::schema::SQLITE_INIT;
use crate::db::traits::CredentialStore;
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::Utc;
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::{str::FromStr, time::Duration};
use tracing::info;

#[derive(Debug)]
pub enum DbActorMessage {
    /// List stored filenames of one mode, oldest first.
    ListCredentials(Mode, RpcReplyPort<Result<Vec<String>, StoreError>>),

    /// Read one credential payload by (mode, filename).
    GetCredential(
        Mode,
        String,
        RpcReplyPort<Result<Option<CredentialRecord>, StoreError>>,
    ),

    /// Read the runtime state attached to (mode, filename).
    GetCredentialState(
        Mode,
        String,
        RpcReplyPort<Result<Option<RuntimeState>, StoreError>>,
    ),

    /// Insert or fully replace a credential payload.
    UpsertCredential(
        Mode,
        String,
        CredentialRecord,
        RpcReplyPort<Result<(), StoreError>>,
    ),

    /// Insert or fully replace runtime state.
    UpsertCredentialState(
        Mode,
        String,
        RuntimeState,
        RpcReplyPort<Result<(), StoreError>>,
    ),
}

#[derive(Clone)]
pub struct DbActorHandle {
    actor: ActorRef<DbActorMessage>,
}

impl DbActorHandle {
    pub async fn list(&self, mode: Mode) -> Result<Vec<String>, StoreError> {
        ractor::call!(self.actor, DbActorMessage::ListCredentials, mode).map_err(|e| {
            StoreError::Actor(format!("DbActor ListCredentials RPC failed: {e}"))
        })?
    }

    pub async fn get(
        &self,
        mode: Mode,
        filename: &str,
    ) -> Result<Option<CredentialRecord>, StoreError> {
        ractor::call!(
            self.actor,
            DbActorMessage::GetCredential,
            mode,
            filename.to_string()
        )
        .map_err(|e| StoreError::Actor(format!("DbActor GetCredential RPC failed: {e}")))?
    }

    pub async fn get_state(
        &self,
        mode: Mode,
        filename: &str,
    ) -> Result<Option<RuntimeState>, StoreError> {
        ractor::call!(
            self.actor,
            DbActorMessage::GetCredentialState,
            mode,
            filename.to_string()
        )
        .map_err(|e| StoreError::Actor(format!("DbActor GetCredentialState RPC failed: {e}")))?
    }

    pub async fn upsert(
        &self,
        mode: Mode,
        filename: &str,
        record: CredentialRecord,
    ) -> Result<(), StoreError> {
        ractor::call!(
            self.actor,
            DbActorMessage::UpsertCredential,
            mode,
            filename.to_string(),
            record
        )
        .map_err(|e| StoreError::Actor(format!("DbActor UpsertCredential RPC failed: {e}")))?
    }

    /// Record runtime state for a credential (set by the refresh side, or by operators).
    pub async fn put_credential_state(
        &self,
        filename: &str,
        mode: Mode,
        state: RuntimeState,
    ) -> Result<(), StoreError> {
        ractor::call!(
            self.actor,
            DbActorMessage::UpsertCredentialState,
            mode,
            filename.to_string(),
            state
        )
        .map_err(|e| {
            StoreError::Actor(format!("DbActor UpsertCredentialState RPC failed: {e}"))
        })?
    }
}

#[async_trait]
impl CredentialStore for DbActorHandle {
    async fn list_credentials(&self, mode: Mode) -> Result<Vec<String>, StoreError> {
        self.list(mode).await
    }

    async fn get_credential(
        &self,
        filename: &str,
        mode: Mode,
    ) -> Result<Option<CredentialRecord>, StoreError> {
        self.get(mode, filename).await
    }

    async fn get_credential_state(
        &self,
        filename: &str,
        mode: Mode,
    ) -> Result<Option<RuntimeState>, StoreError> {
        self.get_state(mode, filename).await
    }

    async fn add_credential(
        &self,
        filename: &str,
        record: &CredentialRecord,
    ) -> Result<(), StoreError> {
        self.upsert(Mode::Geminicli, filename, record.clone()).await
    }

    async fn add_antigravity_credential(
        &self,
        filename: &str,
        record: &CredentialRecord,
    ) -> Result<(), StoreError> {
        self.upsert(Mode::Antigravity, filename, record.clone())
            .await
    }
}

struct DbActorState {
    pool: SqlitePool,
}

struct DbActor;

#[ractor::async_trait]
impl Actor for DbActor {
    type Msg = DbActorMessage;
    type State = DbActorState;
    type Arguments = String;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        database_url: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        let connect_opts = SqliteConnectOptions::from_str(database_url.as_str())
            .map_err(|e| ActorProcessingErr::from(format!("invalid database url: {e}")))?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5))
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .connect_with(connect_opts)
            .await
            .map_err(|e| ActorProcessingErr::from(format!("db connect failed: {e}")))?;

        apply_schema(&pool)
            .await
            .map_err(|e| ActorProcessingErr::from(format!("db schema init failed: {e}")))?;

        info!("DbActor initialized");
        Ok(DbActorState { pool })
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            DbActorMessage::ListCredentials(mode, reply) => {
                let res = self.list_credentials(&state.pool, mode).await;
                let _ = reply.send(res);
            }
            DbActorMessage::GetCredential(mode, filename, reply) => {
                let res = self.get_credential(&state.pool, mode, &filename).await;
                let _ = reply.send(res);
            }
            DbActorMessage::GetCredentialState(mode, filename, reply) => {
                let res = self.get_credential_state(&state.pool, mode, &filename).await;
                let _ = reply.send(res);
            }
            DbActorMessage::UpsertCredential(mode, filename, record, reply) => {
                let res = self
                    .upsert_credential(&state.pool, mode, &filename, &record)
                    .await;
                let _ = reply.send(res);
            }
            DbActorMessage::UpsertCredentialState(mode, filename, runtime, reply) => {
                let res = self
                    .upsert_credential_state(&state.pool, mode, &filename, &runtime)
                    .await;
                let _ = reply.send(res);
            }
        }
        Ok(())
    }
}

impl DbActor {
    async fn list_credentials(
        &self,
        pool: &SqlitePool,
        mode: Mode,
    ) -> Result<Vec<String>, StoreError> {
        let rows: Vec<String> = sqlx::query_scalar(
            r#"
        SELECT filename
        FROM plugin_credentials
        WHERE mode = ?
        ORDER BY id
        "#,
        )
        .bind(mode.as_str())
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }

    async fn get_credential(
        &self,
        pool: &SqlitePool,
        mode: Mode,
        filename: &str,
    ) -> Result<Option<CredentialRecord>, StoreError> {
        let row = sqlx::query_as::<_, DbPluginCredential>(
            r#"
        SELECT id, mode, filename, payload, created_at, updated_at
        FROM plugin_credentials
        WHERE mode = ? AND filename = ?
        "#,
        )
        .bind(mode.as_str())
        .bind(filename)
        .fetch_optional(pool)
        .await?;

        match row {
            Some(row) => Ok(Some(serde_json::from_str(&row.payload)?)),
            None => Ok(None),
        }
    }

    async fn get_credential_state(
        &self,
        pool: &SqlitePool,
        mode: Mode,
        filename: &str,
    ) -> Result<Option<RuntimeState>, StoreError> {
        let row = sqlx::query_as::<_, DbCredentialState>(
            r#"
        SELECT id, mode, filename, user_email, disabled, error_codes, updated_at
        FROM plugin_credential_states
        WHERE mode = ? AND filename = ?
        "#,
        )
        .bind(mode.as_str())
        .bind(filename)
        .fetch_optional(pool)
        .await?;

        match row {
            Some(row) => Ok(Some(RuntimeState {
                user_email: row.user_email,
                disabled: row.disabled,
                error_codes: serde_json::from_str(&row.error_codes)?,
            })),
            None => Ok(None),
        }
    }

    async fn upsert_credential(
        &self,
        pool: &SqlitePool,
        mode: Mode,
        filename: &str,
        record: &CredentialRecord,
    ) -> Result<(), StoreError> {
        let now = Utc::now();
        let payload = serde_json::to_string(record)?;

        sqlx::query(
            r#"
        INSERT INTO plugin_credentials (mode, filename, payload, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(mode, filename) DO UPDATE SET
            payload = excluded.payload,
            updated_at = excluded.updated_at
        "#,
        )
        .bind(mode.as_str())
        .bind(filename)
        .bind(payload)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;

        Ok(())
    }

    async fn upsert_credential_state(
        &self,
        pool: &SqlitePool,
        mode: Mode,
        filename: &str,
        runtime: &RuntimeState,
    ) -> Result<(), StoreError> {
        let error_codes = serde_json::to_string(&runtime.error_codes)?;

        sqlx::query(
            r#"
        INSERT INTO plugin_credential_states (mode, filename, user_email, disabled, error_codes, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(mode, filename) DO UPDATE SET
            user_email = excluded.user_email,
            disabled = excluded.disabled,
            error_codes = excluded.error_codes,
            updated_at = excluded.updated_at
        "#,
        )
        .bind(mode.as_str())
        .bind(filename)
        .bind(runtime.user_email.as_deref())
        .bind(runtime.disabled)
        .bind(error_codes)
        .bind(Utc::now())
        .execute(pool)
        .await?;

        Ok(())
    }
}

/// Spawn the database actor and return a cloneable handle.
pub async fn spawn(database_url: &str) -> Result<DbActorHandle, StoreError> {
    let (actor, _jh) = Actor::spawn(None, DbActor, database_url.to_string())
        .await
        .map_err(|e| StoreError::Actor(format!("failed to spawn DbActor: {e}")))?;

    Ok(DbActorHandle { actor })
}

async fn apply_schema(pool: &SqlitePool) -> Result<(), StoreError> {
    for stmt in SQLITE_INIT.split(';') {
        let s = stmt.trim();
        if s.is_empty() {
            continue;
        }
        sqlx::query(s).execute(pool).await?;
    }
    Ok(())
}
