//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are written as fixed-width RFC 3339 strings in UTC
//! (microsecond precision, `Z` suffix). Rows written by other services may
//! carry any RFC 3339 offset, so queries compare instants through
//! `julianday()` rather than as text. Booleans are stored as 0/1 integers.

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};
use nutrigate_core::{
  credential::{Expiry, GuestCredential, RegisteredCredential},
  store::{AuditOutcome, AuditRecord},
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Micros, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

fn decode_opt_dt(s: Option<&str>) -> Result<Option<DateTime<Utc>>> {
  s.filter(|s| !s.trim().is_empty()).map(decode_dt).transpose()
}

// ─── Audit date / time ───────────────────────────────────────────────────────

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";

pub fn encode_date(d: NaiveDate) -> String { d.format(DATE_FORMAT).to_string() }

pub fn encode_time(t: NaiveTime) -> String { t.format(TIME_FORMAT).to_string() }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read from `sessions` joined with `users`.
pub struct RawRegistered {
  pub token:        String,
  pub user_id:      i64,
  pub display_name: Option<String>,
  pub category:     Option<String>,
  pub is_admin:     bool,
  pub patient_id:   Option<i64>,
  pub issued_at:    Option<String>,
  pub expires_at:   Option<String>,
  pub is_active:    bool,
  pub web_access:   bool,
}

impl RawRegistered {
  pub fn into_credential(self) -> Result<RegisteredCredential> {
    let expiry = Expiry::from_columns(
      decode_opt_dt(self.expires_at.as_deref())?,
      decode_opt_dt(self.issued_at.as_deref())?,
    );
    Ok(RegisteredCredential {
      token:              self.token,
      subject_id:         self.user_id,
      display_name:       self.display_name,
      category:           self.category,
      is_administrator:   self.is_admin,
      linked_patient_id:  self.patient_id,
      expiry,
      is_active:          self.is_active,
      web_access_enabled: self.web_access,
    })
  }
}

/// Raw values read from a `guest_tokens` row.
pub struct RawGuest {
  pub token:      String,
  pub issued_at:  Option<String>,
  pub expires_at: Option<String>,
  pub source_ip:  Option<String>,
  pub is_active:  bool,
}

impl RawGuest {
  pub fn into_credential(self) -> Result<GuestCredential> {
    let expiry = Expiry::from_columns(
      decode_opt_dt(self.expires_at.as_deref())?,
      decode_opt_dt(self.issued_at.as_deref())?,
    );
    Ok(GuestCredential {
      token: self.token,
      expiry,
      source_ip: self.source_ip,
      is_active: self.is_active,
    })
  }
}

/// Raw values read from an `access_log` row.
pub struct RawAudit {
  pub user_id:   Option<i64>,
  pub date:      String,
  pub time:      String,
  pub outcome:   String,
  pub client_ip: Option<String>,
}

impl RawAudit {
  pub fn into_record(self) -> Result<AuditRecord> {
    let date = NaiveDate::parse_from_str(&self.date, DATE_FORMAT)
      .map_err(|e| Error::DateParse(format!("{:?}: {e}", self.date)))?;
    let time = NaiveTime::parse_from_str(&self.time, TIME_FORMAT)
      .map_err(|e| Error::DateParse(format!("{:?}: {e}", self.time)))?;
    let outcome = AuditOutcome::parse(&self.outcome)
      .ok_or_else(|| Error::InvalidValue(format!("unknown audit outcome: {:?}", self.outcome)))?;
    Ok(AuditRecord {
      subject_id: self.user_id,
      date,
      time,
      outcome,
      client_ip: self.client_ip,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone as _;

  use super::*;

  #[test]
  fn encoded_timestamps_sort_chronologically() {
    let a = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let b = a + chrono::Duration::milliseconds(5);
    let c = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 1).unwrap();
    assert!(encode_dt(a) < encode_dt(b));
    assert!(encode_dt(b) < encode_dt(c));
    assert_eq!(decode_dt(&encode_dt(b)).unwrap(), b);
  }

  #[test]
  fn blank_timestamp_columns_are_absent() {
    assert_eq!(decode_opt_dt(Some("  ")).unwrap(), None);
    assert!(decode_opt_dt(Some("yesterday")).is_err());
  }
}
