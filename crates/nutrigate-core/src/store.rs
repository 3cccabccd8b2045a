//! Store traits the gate depends on, plus the audit record type.
//!
//! The traits are implemented by storage backends (e.g.
//! `nutrigate-store-sqlite`). The resolver, the expiration policy and the
//! auditor receive their store handles through constructors and never reach
//! for a global connection.
//!
//! All methods return `Send` futures so the traits can be used in
//! multi-threaded async runtimes (e.g. tokio with `axum`).

use std::{fmt, future::Future};

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::credential::{GuestCredential, RegisteredCredential};

// ─── Credentials ─────────────────────────────────────────────────────────────

/// Read access to registered-user and guest tokens, plus the one write the
/// gate performs: deactivating a credential whose expiry it discovered.
pub trait CredentialStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Find an active, web-enabled registered credential for `token`.
  ///
  /// Backends that can filter at query time must exclude rows whose stamped
  /// expiry is not after `now`.
  fn find_registered<'a>(
    &'a self,
    token: &'a str,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<RegisteredCredential>, Self::Error>> + Send + 'a;

  /// Find an active guest credential for `token`, with the same stamped
  /// expiry filtering as [`find_registered`](Self::find_registered).
  fn find_guest<'a>(
    &'a self,
    token: &'a str,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<GuestCredential>, Self::Error>> + Send + 'a;

  /// Mark a registered credential inactive and stamp its close time.
  ///
  /// Returns `true` if a still-active row was changed. Calling it again for
  /// the same token is a no-op returning `false`.
  fn deactivate_registered<'a>(
    &'a self,
    token: &'a str,
    closed_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Guest counterpart of [`deactivate_registered`](Self::deactivate_registered).
  fn deactivate_guest<'a>(
    &'a self,
    token: &'a str,
    closed_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;
}

// ─── Parameters ──────────────────────────────────────────────────────────────

/// Where a configuration parameter may live: a table and its key and value
/// columns. Identifiers are fixed at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSource {
  pub table:        &'static str,
  pub key_column:   &'static str,
  pub value_column: &'static str,
}

/// Read access to the key/value configuration table.
pub trait ParameterStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Fetch the raw value stored under `name` in `source`. `Ok(None)` means
  /// no row (or a NULL value).
  fn parameter<'a>(
    &'a self,
    source: ParamSource,
    name: &'a str,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + 'a;
}

// ─── Audit ───────────────────────────────────────────────────────────────────

/// Result of one authentication attempt, as written to the access log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditOutcome {
  Ok,
  OkGuest,
  Expired,
  InvalidToken,
}

impl AuditOutcome {
  pub fn as_str(self) -> &'static str {
    match self {
      AuditOutcome::Ok => "OK",
      AuditOutcome::OkGuest => "OK_GUEST",
      AuditOutcome::Expired => "EXPIRED",
      AuditOutcome::InvalidToken => "INVALID_TOKEN",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "OK" => Some(AuditOutcome::Ok),
      "OK_GUEST" => Some(AuditOutcome::OkGuest),
      "EXPIRED" => Some(AuditOutcome::Expired),
      "INVALID_TOKEN" => Some(AuditOutcome::InvalidToken),
      _ => None,
    }
  }
}

impl fmt::Display for AuditOutcome {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// One append-only access log row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
  pub subject_id: Option<i64>,
  pub date:       NaiveDate,
  pub time:       NaiveTime,
  pub outcome:    AuditOutcome,
  pub client_ip:  Option<String>,
}

/// Append-only sink for [`AuditRecord`]s.
pub trait AuditLog: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn append(
    &self,
    record: AuditRecord,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
