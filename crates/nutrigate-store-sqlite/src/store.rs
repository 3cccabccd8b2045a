//! [`SqliteStore`], the SQLite implementation of the nutrigate store traits.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension as _, types::Value};

use nutrigate_core::{
  credential::{GuestCredential, RegisteredCredential},
  store::{AuditLog, AuditRecord, CredentialStore, ParamSource, ParameterStore},
};

use crate::{
  encode::{encode_date, encode_dt, encode_time, RawGuest, RawRegistered},
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// Credential, parameter and audit tables backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    tracing::debug!(path = %path.display(), "opened sqlite store");
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Shared `UPDATE` for both credential tables. Only still-active rows are
  /// touched, so repeating the call for the same token changes nothing.
  async fn deactivate(
    &self,
    table:     &'static str,
    token:     &str,
    closed_at: DateTime<Utc>,
  ) -> Result<bool> {
    let token_str = token.to_owned();
    let at_str    = encode_dt(closed_at);

    let changed = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "UPDATE {table} SET is_active = 0, closed_at = ?2
           WHERE token = ?1 AND is_active = 1"
        );
        Ok(conn.execute(&sql, rusqlite::params![token_str, at_str])?)
      })
      .await?;

    Ok(changed > 0)
  }
}

// ─── CredentialStore impl ────────────────────────────────────────────────────

impl CredentialStore for SqliteStore {
  type Error = Error;

  async fn find_registered(
    &self,
    token: &str,
    now:   DateTime<Utc>,
  ) -> Result<Option<RegisteredCredential>> {
    let token_str = token.to_owned();
    let now_str   = encode_dt(now);

    let raw: Option<RawRegistered> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT
                 s.token, u.user_id, u.display_name, u.category, u.is_admin,
                 u.patient_id, s.issued_at, s.expires_at, s.is_active, u.web_access
               FROM sessions s
               JOIN users u ON u.user_id = s.user_id
               WHERE s.token = ?1
                 AND s.is_active = 1
                 AND u.web_access = 1
                 AND (NULLIF(TRIM(s.expires_at), '') IS NULL
                      OR julianday(s.expires_at) > julianday(?2))",
              rusqlite::params![token_str, now_str],
              |row| {
                Ok(RawRegistered {
                  token:        row.get(0)?,
                  user_id:      row.get(1)?,
                  display_name: row.get(2)?,
                  category:     row.get(3)?,
                  is_admin:     row.get(4)?,
                  patient_id:   row.get(5)?,
                  issued_at:    row.get(6)?,
                  expires_at:   row.get(7)?,
                  is_active:    row.get(8)?,
                  web_access:   row.get(9)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawRegistered::into_credential).transpose()
  }

  async fn find_guest(&self, token: &str, now: DateTime<Utc>) -> Result<Option<GuestCredential>> {
    let token_str = token.to_owned();
    let now_str   = encode_dt(now);

    let raw: Option<RawGuest> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT token, issued_at, expires_at, source_ip, is_active
               FROM guest_tokens
               WHERE token = ?1
                 AND is_active = 1
                 AND (NULLIF(TRIM(expires_at), '') IS NULL
                      OR julianday(expires_at) > julianday(?2))",
              rusqlite::params![token_str, now_str],
              |row| {
                Ok(RawGuest {
                  token:      row.get(0)?,
                  issued_at:  row.get(1)?,
                  expires_at: row.get(2)?,
                  source_ip:  row.get(3)?,
                  is_active:  row.get(4)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawGuest::into_credential).transpose()
  }

  async fn deactivate_registered(&self, token: &str, closed_at: DateTime<Utc>) -> Result<bool> {
    self.deactivate("sessions", token, closed_at).await
  }

  async fn deactivate_guest(&self, token: &str, closed_at: DateTime<Utc>) -> Result<bool> {
    self.deactivate("guest_tokens", token, closed_at).await
  }
}

// ─── ParameterStore impl ─────────────────────────────────────────────────────

impl ParameterStore for SqliteStore {
  type Error = Error;

  async fn parameter(&self, source: ParamSource, name: &str) -> Result<Option<String>> {
    let name_str = name.to_owned();

    let value: Option<Value> = self
      .conn
      .call(move |conn| {
        // Identifiers come from compile-time constants, never from input.
        let sql = format!(
          "SELECT {value} FROM {table} WHERE {key} = ?1 LIMIT 1",
          value = source.value_column,
          table = source.table,
          key   = source.key_column,
        );
        Ok(
          conn
            .query_row(&sql, rusqlite::params![name_str], |row| row.get(0))
            .optional()?,
        )
      })
      .await?;

    Ok(match value {
      Some(Value::Text(s)) => Some(s),
      Some(Value::Integer(i)) => Some(i.to_string()),
      Some(Value::Real(f)) => Some(f.to_string()),
      Some(Value::Null) | Some(Value::Blob(_)) | None => None,
    })
  }
}

// ─── AuditLog impl ───────────────────────────────────────────────────────────

impl AuditLog for SqliteStore {
  type Error = Error;

  async fn append(&self, record: AuditRecord) -> Result<()> {
    let date_str    = encode_date(record.date);
    let time_str    = encode_time(record.time);
    let outcome_str = record.outcome.as_str();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO access_log (user_id, date, time, outcome, client_ip)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![record.subject_id, date_str, time_str, outcome_str, record.client_ip],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
