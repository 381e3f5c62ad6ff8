//! SQL DDL for initializing the database schema.
//! SQLite-first design; can be adapted for other RDBMS.

/// SQLite schema includes:
/// - `plugin_credentials` table (one (mode, filename) per row, JSON payload)
/// - `plugin_credential_states` table (runtime state, one (mode, filename) per row)
pub const SQLITE_INIT: &str = r#"
-- ---------------------------------------------------------------------------
-- Pushed credentials
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS plugin_credentials (
    id INTEGER PRIMARY KEY NOT NULL,
    mode TEXT NOT NULL,
    filename TEXT NOT NULL,
    payload TEXT NOT NULL, -- JSON
    created_at TEXT NOT NULL, -- RFC3339
    updated_at TEXT NOT NULL, -- RFC3339
    UNIQUE(mode, filename)
);

CREATE INDEX IF NOT EXISTS idx_plugin_credentials_mode ON plugin_credentials(mode);

-- ---------------------------------------------------------------------------
-- Runtime state (independent lifecycle from the credential row)
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS plugin_credential_states (
    id INTEGER PRIMARY KEY NOT NULL,
    mode TEXT NOT NULL,
    filename TEXT NOT NULL,
    user_email TEXT NULL,
    disabled INTEGER NOT NULL DEFAULT 0,
    error_codes TEXT NOT NULL DEFAULT '[]', -- JSON
    updated_at TEXT NOT NULL, -- RFC3339
    UNIQUE(mode, filename)
);
"#;
