//! SQL schema for the nutrigate SQLite store.
//!
//! Executed once at connection startup. `PRAGMA user_version` records the
//! layout version; migrations are out of scope for this crate.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id      INTEGER PRIMARY KEY AUTOINCREMENT,
    display_name TEXT,
    category     TEXT,                        -- 'usuario' | 'paciente' | 'nutricionista' | ...
    is_admin     INTEGER NOT NULL DEFAULT 0,
    patient_id   INTEGER,                     -- linked patient record, if any
    web_access   INTEGER NOT NULL DEFAULT 1
);

-- Registered-user tokens. Either expires_at is stamped at issuance or only
-- issued_at is stored and the expiry is computed from `parameters`.
CREATE TABLE IF NOT EXISTS sessions (
    token      TEXT PRIMARY KEY,
    user_id    INTEGER NOT NULL REFERENCES users(user_id),
    issued_at  TEXT,                          -- RFC 3339 UTC
    expires_at TEXT,                          -- RFC 3339 UTC
    is_active  INTEGER NOT NULL DEFAULT 1,
    closed_at  TEXT
);

CREATE TABLE IF NOT EXISTS guest_tokens (
    token      TEXT PRIMARY KEY,
    issued_at  TEXT,
    expires_at TEXT,
    source_ip  TEXT,
    is_active  INTEGER NOT NULL DEFAULT 1,
    closed_at  TEXT
);

CREATE TABLE IF NOT EXISTS parameters (
    name  TEXT PRIMARY KEY,
    value TEXT
);

-- Append-only. No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS access_log (
    log_id    INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id   INTEGER,
    date      TEXT NOT NULL,                  -- YYYY-MM-DD
    time      TEXT NOT NULL,                  -- HH:MM:SS
    outcome   TEXT NOT NULL,                  -- 'OK' | 'OK_GUEST' | 'EXPIRED' | 'INVALID_TOKEN'
    client_ip TEXT
);

CREATE INDEX IF NOT EXISTS sessions_user_idx  ON sessions(user_id);
CREATE INDEX IF NOT EXISTS access_log_day_idx ON access_log(date);

PRAGMA user_version = 1;
";
