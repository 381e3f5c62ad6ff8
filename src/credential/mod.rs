//! Credential intake and refresh-state engine.
//!
//! Layout:
//! - `normalize.rs`: request body -> canonical [`CredentialRecord`] + filename + mode
//! - `dedup.rs`: project-identity matching against the store, then the write
//! - `refresh_state.rs`: per-credential expiry classification and aggregation

pub mod dedup;
pub mod normalize;
pub mod refresh_state;

#[cfg(test)]
mod test_store;

pub use dedup::{IntakeAction, ReconcileOutcome, reconcile};
pub use normalize::{NormalizedPush, normalize};
pub use refresh_state::{ExpiryCheck, REFRESH_LOOKAHEAD_SECS, RefreshReport, evaluate};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{borrow::Cow, fmt};

/// Credential namespace. Each mode is backed by its own credential manager downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Geminicli,
    Antigravity,
}

impl Mode {
    pub const ALL: [Mode; 2] = [Mode::Geminicli, Mode::Antigravity];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Geminicli => "geminicli",
            Mode::Antigravity => "antigravity",
        }
    }

    pub fn parse(raw: &str) -> Option<Mode> {
        Mode::ALL.into_iter().find(|m| m.as_str() == raw)
    }

    /// Resolve the `mode` field of a request body. Absent, non-string or unknown values
    /// fall back to `default`.
    pub fn from_field(value: Option<&Value>, default: Mode) -> Mode {
        value
            .and_then(Value::as_str)
            .and_then(Mode::parse)
            .unwrap_or(default)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// OAuth-style credential as pushed by the token updater and persisted by the store.
///
/// Values are kept as the JSON the updater sent, whatever their type, and unknown
/// fields of a nested `credential` object are carried in `extra`, so a stored record
/// reads back exactly as it was pushed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CredentialRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<Value>,

    /// Access token under the key Google's client libraries write.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_uri: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<Value>,

    /// Normally an ISO-8601 string; see [`ExpiryCheck`] for how other values are judged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CredentialRecord {
    /// Split a credential object into the known fields and `extra`. Nulls count as absent.
    pub fn from_candidate(mut fields: Map<String, Value>) -> Self {
        let mut take = |key: &str| fields.remove(key).filter(|v| !v.is_null());
        Self {
            client_id: take("client_id"),
            client_secret: take("client_secret"),
            refresh_token: take("refresh_token"),
            token: take("token"),
            access_token: take("access_token"),
            scopes: take("scopes"),
            token_uri: take("token_uri"),
            project_id: take("project_id"),
            expiry: take("expiry"),
            extra: fields,
        }
    }

    /// Project identity used for dedup and derived filenames, in its text form
    /// (`123` and `"123"` are the same project). Empty when absent or null.
    pub fn project_id(&self) -> Cow<'_, str> {
        match &self.project_id {
            None | Some(Value::Null) => Cow::Borrowed(""),
            Some(Value::String(s)) => Cow::Borrowed(s.as_str()),
            Some(other) => Cow::Owned(other.to_string()),
        }
    }

    /// Both `client_id` and `refresh_token` present and truthy.
    pub fn has_identity(&self) -> bool {
        let truthy = |v: &Option<Value>| v.as_ref().is_some_and(is_truthy);
        truthy(&self.client_id) && truthy(&self.refresh_token)
    }
}

/// JSON truthiness: null, false, 0, "", [] and {} are all "not provided".
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Per-credential runtime state owned by the store. Absent state reads as the default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeState {
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub error_codes: Vec<String>,
}

/// One row of the `check-tokens` answer. Recomputed on every query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenStatusSummary {
    pub filename: String,
    pub email: String,
    pub is_active: bool,
    pub needs_refresh: bool,
    pub error_codes: Vec<String>,
}
