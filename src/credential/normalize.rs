use super::{CredentialRecord, Mode, is_truthy};
use crate::error::PluginError;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// Every stored credential key ends with this suffix.
pub const CREDENTIAL_FILE_SUFFIX: &str = ".json";

/// Filename stem used when a pushed credential carries no project id.
const FALLBACK_PROJECT: &str = "plugin";

/// Fields picked out of a flattened push body.
///
/// `token` doubles as the connection secret, so in this shape the secret is stored as
/// the credential's access token.
const FLATTENED_FIELDS: [&str; 9] = [
    "client_id",
    "client_secret",
    "refresh_token",
    "token",
    "access_token",
    "scopes",
    "token_uri",
    "project_id",
    "expiry",
];

/// A push body reduced to what the store needs.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedPush {
    pub record: CredentialRecord,
    pub filename: String,
    pub mode: Mode,
    /// True when `filename` was generated rather than supplied by the caller.
    pub filename_derived: bool,
}

/// Parse a request body into a JSON object.
pub fn decode_body(raw: &[u8]) -> Result<Map<String, Value>, PluginError> {
    match serde_json::from_slice::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(PluginError::invalid_payload("request body must be a JSON object")),
        Err(_) => Err(PluginError::invalid_payload("invalid JSON")),
    }
}

/// Extract the credential, mode and target filename from a push body.
///
/// `now` only feeds derived filenames.
pub fn normalize(
    body: &Map<String, Value>,
    default_mode: Mode,
    now: DateTime<Utc>,
) -> Result<NormalizedPush, PluginError> {
    let candidate = match body.get("credential") {
        Some(Value::Object(nested)) if !nested.is_empty() => nested.clone(),
        Some(other) if is_truthy(other) => {
            return Err(PluginError::invalid_payload(
                "credential must be a JSON object",
            ));
        }
        _ => flattened_candidate(body),
    };

    if candidate.is_empty() {
        return Err(PluginError::invalid_payload("missing credential data"));
    }

    let record = CredentialRecord::from_candidate(candidate);

    if !record.has_identity() {
        return Err(PluginError::invalid_payload(
            "credential must contain client_id and refresh_token",
        ));
    }

    let mode = Mode::from_field(body.get("mode"), default_mode);
    let (filename, filename_derived) = match non_empty_str(body, "filename") {
        Some(explicit) => (with_suffix(explicit.to_string()), false),
        None => (derive_filename(body, &record, now), true),
    };

    Ok(NormalizedPush {
        record,
        filename,
        mode,
        filename_derived,
    })
}

/// `[<name>-]<project_id>-<unix seconds>.json`
fn derive_filename(body: &Map<String, Value>, record: &CredentialRecord, now: DateTime<Utc>) -> String {
    let project_id = record.project_id();
    let project = if project_id.is_empty() {
        FALLBACK_PROJECT
    } else {
        &project_id
    };
    let stem = match non_empty_str(body, "name") {
        Some(name) => format!("{name}-{project}-{}", now.timestamp()),
        None => format!("{project}-{}", now.timestamp()),
    };
    with_suffix(stem)
}

fn with_suffix(mut filename: String) -> String {
    if !filename.ends_with(CREDENTIAL_FILE_SUFFIX) {
        filename.push_str(CREDENTIAL_FILE_SUFFIX);
    }
    filename
}

fn flattened_candidate(body: &Map<String, Value>) -> Map<String, Value> {
    FLATTENED_FIELDS
        .iter()
        .filter_map(|key| {
            body.get(*key)
                .filter(|v| is_truthy(v))
                .map(|v| (key.to_string(), v.clone()))
        })
        .collect()
}

fn non_empty_str<'a>(body: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    body.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}
