//! Credential records as read from a [`CredentialStore`](crate::store::CredentialStore).
//!
//! Records are owned by the store. The core never creates them; it only asks
//! the store to deactivate one once its expiry has been discovered.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

// ─── Expiry ──────────────────────────────────────────────────────────────────

/// How a credential's expiration instant is known.
///
/// The variant follows whichever columns the store schema populates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "at", rename_all = "snake_case")]
pub enum Expiry {
  /// The expiration instant was stamped on the record at issuance.
  Stamped(DateTime<Utc>),
  /// Only the issue instant is stored; the expiration instant is computed
  /// from the per-category hours of the expiration policy.
  Issued(DateTime<Utc>),
  /// Neither instant is stored.
  Never,
}

impl Expiry {
  /// Build from nullable `expires_at` / `issued_at` columns. A stamped
  /// expiry takes precedence over an issue instant.
  pub fn from_columns(
    expires_at: Option<DateTime<Utc>>,
    issued_at:  Option<DateTime<Utc>>,
  ) -> Self {
    match (expires_at, issued_at) {
      (Some(at), _) => Expiry::Stamped(at),
      (None, Some(at)) => Expiry::Issued(at),
      (None, None) => Expiry::Never,
    }
  }
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// A registered-user session token joined with its account.
#[derive(Clone, PartialEq, Eq)]
pub struct RegisteredCredential {
  pub token:              String,
  pub subject_id:         i64,
  pub display_name:       Option<String>,
  /// Raw stored account type, e.g. `"paciente"` or `"nutricionista"`.
  pub category:           Option<String>,
  pub is_administrator:   bool,
  pub linked_patient_id:  Option<i64>,
  pub expiry:             Expiry,
  pub is_active:          bool,
  pub web_access_enabled: bool,
}

/// An anonymous guest token.
#[derive(Clone, PartialEq, Eq)]
pub struct GuestCredential {
  pub token:     String,
  pub expiry:    Expiry,
  pub source_ip: Option<String>,
  pub is_active: bool,
}

impl std::fmt::Debug for RegisteredCredential {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("RegisteredCredential")
      .field("token", &fingerprint(&self.token))
      .field("subject_id", &self.subject_id)
      .field("category", &self.category)
      .field("is_administrator", &self.is_administrator)
      .field("linked_patient_id", &self.linked_patient_id)
      .field("expiry", &self.expiry)
      .field("is_active", &self.is_active)
      .field("web_access_enabled", &self.web_access_enabled)
      .finish_non_exhaustive()
  }
}

impl std::fmt::Debug for GuestCredential {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("GuestCredential")
      .field("token", &fingerprint(&self.token))
      .field("expiry", &self.expiry)
      .field("source_ip", &self.source_ip)
      .field("is_active", &self.is_active)
      .finish()
  }
}

/// Short, non-reversible tag for a bearer token, safe to put in logs.
pub fn fingerprint(token: &str) -> String {
  let digest = Sha256::digest(token.as_bytes());
  hex::encode(&digest[..6])
}
