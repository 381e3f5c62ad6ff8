use super::{CredentialRecord, Mode, RuntimeState, TokenStatusSummary, is_truthy};
use crate::db::CredentialStore;
use crate::error::StoreError;
use chrono::{DateTime, TimeDelta, Utc};
use serde_json::Value;
use tracing::warn;

/// Credentials expiring within this many seconds are reported as needing refresh.
pub const REFRESH_LOOKAHEAD_SECS: i64 = 300;

/// How a stored credential's `expiry` was judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryCheck {
    /// Listed by the store but the record itself is absent.
    NoRecord,
    /// Record has no `expiry`, or a falsy one (`""`, `0`, `null`).
    Missing,
    /// `expiry` is present but not an offset-qualified ISO-8601 string.
    Unparsable,
    /// Time left until expiry; negative once expired.
    Computed { remaining: TimeDelta },
}

impl ExpiryCheck {
    pub fn classify(record: Option<&CredentialRecord>, now: DateTime<Utc>) -> Self {
        let Some(record) = record else {
            return ExpiryCheck::NoRecord;
        };
        match record.expiry.as_ref() {
            None => ExpiryCheck::Missing,
            Some(value) if !is_truthy(value) => ExpiryCheck::Missing,
            Some(Value::String(raw)) => match parse_expiry(raw) {
                Some(expiry) => ExpiryCheck::Computed {
                    remaining: expiry - now,
                },
                None => ExpiryCheck::Unparsable,
            },
            Some(_) => ExpiryCheck::Unparsable,
        }
    }

    /// Missing and unparsable expiries fail safe toward refreshing.
    pub fn needs_refresh(&self) -> bool {
        match self {
            ExpiryCheck::NoRecord => false,
            ExpiryCheck::Missing | ExpiryCheck::Unparsable => true,
            ExpiryCheck::Computed { remaining } => {
                *remaining < TimeDelta::seconds(REFRESH_LOOKAHEAD_SECS)
            }
        }
    }
}

/// Parse an ISO-8601 timestamp carrying a UTC offset (`Z` or `±hh:mm`).
///
/// Naive timestamps are rejected rather than assumed UTC.
pub fn parse_expiry(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Status of every stored credential of a mode, in store listing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshReport {
    pub tokens: Vec<TokenStatusSummary>,
    /// Emails of active credentials needing refresh; the updater's work list.
    pub needs_refresh_emails: Vec<String>,
}

impl RefreshReport {
    fn from_tokens(tokens: Vec<TokenStatusSummary>) -> Self {
        let needs_refresh_emails = tokens
            .iter()
            .filter(|t| t.needs_refresh && t.is_active && !t.email.is_empty())
            .map(|t| t.email.clone())
            .collect();
        Self {
            tokens,
            needs_refresh_emails,
        }
    }
}

pub fn summarize(
    filename: &str,
    state: Option<RuntimeState>,
    record: Option<&CredentialRecord>,
    now: DateTime<Utc>,
) -> TokenStatusSummary {
    let state = state.unwrap_or_default();
    TokenStatusSummary {
        filename: filename.to_string(),
        email: state.user_email.unwrap_or_default(),
        is_active: !state.disabled,
        needs_refresh: ExpiryCheck::classify(record, now).needs_refresh(),
        error_codes: state.error_codes,
    }
}

/// Evaluate refresh state for all credentials stored under `mode`.
///
/// A credential whose state or record cannot be read is logged and left out; only a
/// failure to list the mode fails the whole evaluation.
pub async fn evaluate<S>(store: &S, mode: Mode, now: DateTime<Utc>) -> Result<RefreshReport, StoreError>
where
    S: CredentialStore + ?Sized,
{
    let filenames = store.list_credentials(mode).await?;
    let mut tokens = Vec::with_capacity(filenames.len());

    for filename in &filenames {
        let state = match store.get_credential_state(filename, mode).await {
            Ok(state) => state,
            Err(e) => {
                warn!(filename = %filename, mode = %mode, error = %e, "[Plugin] Failed to read credential state");
                continue;
            }
        };
        let record = match store.get_credential(filename, mode).await {
            Ok(record) => record,
            Err(e) => {
                warn!(filename = %filename, mode = %mode, error = %e, "[Plugin] Failed to read credential");
                continue;
            }
        };
        tokens.push(summarize(filename, state, record.as_ref(), now));
    }

    Ok(RefreshReport::from_tokens(tokens))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::test_store::{MemoryStore, record};
    use chrono::SecondsFormat;
    use serde_json::json;

    fn with_expiry(expiry: Option<&str>) -> CredentialRecord {
        CredentialRecord {
            expiry: expiry.map(|raw| json!(raw)),
            ..record("c", "p")
        }
    }

    fn iso(dt: DateTime<Utc>) -> String {
        dt.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    fn state(email: &str, disabled: bool) -> RuntimeState {
        RuntimeState {
            user_email: Some(email.to_string()),
            disabled,
            error_codes: Vec::new(),
        }
    }

    #[test]
    fn classify_distinguishes_missing_unparsable_and_computed() {
        let now = Utc::now();
        assert_eq!(ExpiryCheck::classify(None, now), ExpiryCheck::NoRecord);
        assert_eq!(
            ExpiryCheck::classify(Some(&with_expiry(None)), now),
            ExpiryCheck::Missing
        );
        assert_eq!(
            ExpiryCheck::classify(Some(&with_expiry(Some(""))), now),
            ExpiryCheck::Missing
        );
        assert_eq!(
            ExpiryCheck::classify(Some(&with_expiry(Some("tomorrow"))), now),
            ExpiryCheck::Unparsable
        );
        // Epoch numbers are not read as timestamps.
        let epoch = CredentialRecord {
            expiry: Some(json!(1_767_225_600)),
            ..with_expiry(None)
        };
        assert_eq!(
            ExpiryCheck::classify(Some(&epoch), now),
            ExpiryCheck::Unparsable
        );
        let zero = CredentialRecord {
            expiry: Some(json!(0)),
            ..with_expiry(None)
        };
        assert_eq!(ExpiryCheck::classify(Some(&zero), now), ExpiryCheck::Missing);
        // No offset: not assumed to be UTC.
        assert_eq!(
            ExpiryCheck::classify(Some(&with_expiry(Some("2030-01-01T00:00:00"))), now),
            ExpiryCheck::Unparsable
        );

        let expiry = now + TimeDelta::seconds(600);
        match ExpiryCheck::classify(Some(&with_expiry(Some(iso(expiry).as_str()))), now) {
            ExpiryCheck::Computed { remaining } => {
                assert!(remaining <= TimeDelta::seconds(600));
                assert!(remaining > TimeDelta::seconds(598));
            }
            other => panic!("expected Computed, got {other:?}"),
        }
    }

    #[test]
    fn lookahead_window_is_five_minutes() {
        let now = Utc::now();
        let at = |secs: i64| {
            ExpiryCheck::Computed {
                remaining: TimeDelta::seconds(secs),
            }
            .needs_refresh()
        };
        assert!(at(-10));
        assert!(at(200));
        assert!(at(299));
        assert!(!at(300));
        assert!(!at(3600));

        assert!(ExpiryCheck::Missing.needs_refresh());
        assert!(ExpiryCheck::Unparsable.needs_refresh());
        assert!(!ExpiryCheck::NoRecord.needs_refresh());

        let soon = with_expiry(Some(iso(now + TimeDelta::seconds(200)).as_str()));
        let later = with_expiry(Some(iso(now + TimeDelta::hours(1)).as_str()));
        assert!(ExpiryCheck::classify(Some(&soon), now).needs_refresh());
        assert!(!ExpiryCheck::classify(Some(&later), now).needs_refresh());
    }

    #[test]
    fn parse_expiry_accepts_z_offsets_and_fractions() {
        let expected = "2030-01-01T00:00:00Z".parse::<DateTime<Utc>>().unwrap();
        assert_eq!(parse_expiry("2030-01-01T00:00:00Z"), Some(expected));
        assert_eq!(parse_expiry("2030-01-01T08:00:00+08:00"), Some(expected));
        assert_eq!(parse_expiry("2030-01-01T00:00:00.000000Z"), Some(expected));
        assert_eq!(parse_expiry("2030-01-01T00:00:00+0000"), Some(expected));
        assert_eq!(parse_expiry("not a date"), None);
    }

    #[test]
    fn summarize_defaults_absent_state() {
        let now = Utc::now();
        let rec = with_expiry(None);
        let summary = summarize("a.json", None, Some(&rec), now);
        assert_eq!(
            summary,
            TokenStatusSummary {
                filename: "a.json".to_string(),
                email: String::new(),
                is_active: true,
                needs_refresh: true,
                error_codes: Vec::new(),
            }
        );
    }

    #[tokio::test]
    async fn evaluate_skips_unreadable_and_aggregates_emails() {
        let now = Utc::now();
        let fresh = iso(now + TimeDelta::hours(1));
        let stale = iso(now + TimeDelta::seconds(60));
        let store = MemoryStore::default()
            .with_record(Mode::Geminicli, "stale.json", with_expiry(Some(stale.as_str())))
            .with_state(Mode::Geminicli, "stale.json", state("stale@example.com", false))
            .with_record(Mode::Geminicli, "fresh.json", with_expiry(Some(fresh.as_str())))
            .with_state(Mode::Geminicli, "fresh.json", state("fresh@example.com", false))
            .with_record(Mode::Geminicli, "disabled.json", with_expiry(None))
            .with_state(Mode::Geminicli, "disabled.json", state("off@example.com", true))
            .with_record(Mode::Geminicli, "anon.json", with_expiry(None))
            .with_corrupt(Mode::Geminicli, "broken.json")
            .with_record(Mode::Geminicli, "badstate.json", with_expiry(None))
            .with_corrupt_state(Mode::Geminicli, "badstate.json")
            .with_record(Mode::Antigravity, "other.json", with_expiry(None));

        let report = evaluate(&store, Mode::Geminicli, now).await.unwrap();

        let names: Vec<&str> = report.tokens.iter().map(|t| t.filename.as_str()).collect();
        assert_eq!(names, vec!["stale.json", "fresh.json", "disabled.json", "anon.json"]);

        let flags: Vec<(bool, bool)> = report
            .tokens
            .iter()
            .map(|t| (t.is_active, t.needs_refresh))
            .collect();
        assert_eq!(flags, vec![(true, true), (true, false), (false, true), (true, true)]);

        assert_eq!(report.needs_refresh_emails, vec!["stale@example.com"]);
    }
}
