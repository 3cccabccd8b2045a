//! Provisioning and inspection helpers.
//!
//! Token issuance lives in the login service, not here. These helpers exist
//! so operators and tests can seed accounts, tokens and parameters and can
//! inspect what the gate wrote back.

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;

use nutrigate_core::store::AuditRecord;

use crate::{
  encode::{encode_dt, RawAudit},
  Error, Result, SqliteStore,
};

/// A row for the `users` table.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub display_name:       Option<String>,
  pub category:           Option<String>,
  pub is_administrator:   bool,
  pub linked_patient_id:  Option<i64>,
  pub web_access_enabled: bool,
}

impl NewUser {
  pub fn new(category: impl Into<String>) -> Self {
    Self {
      display_name:       None,
      category:           Some(category.into()),
      is_administrator:   false,
      linked_patient_id:  None,
      web_access_enabled: true,
    }
  }
}

/// A registered-user token. Populate `expires_at` for stamped expiry, or only
/// `issued_at` to have the gate compute it from the parameter table.
#[derive(Debug, Clone)]
pub struct NewSession {
  pub token:      String,
  pub user_id:    i64,
  pub issued_at:  Option<DateTime<Utc>>,
  pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewGuestToken {
  pub token:      String,
  pub issued_at:  Option<DateTime<Utc>>,
  pub expires_at: Option<DateTime<Utc>>,
  pub source_ip:  Option<String>,
}

impl SqliteStore {
  /// Insert a user and return its id.
  pub async fn add_user(&self, user: NewUser) -> Result<i64> {
    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (display_name, category, is_admin, patient_id, web_access)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![
            user.display_name,
            user.category,
            user.is_administrator,
            user.linked_patient_id,
            user.web_access_enabled,
          ],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;
    Ok(id)
  }

  pub async fn add_session(&self, session: NewSession) -> Result<()> {
    let user_id        = session.user_id;
    let issued_at_str  = session.issued_at.map(encode_dt);
    let expires_at_str = session.expires_at.map(encode_dt);

    let inserted = self
      .conn
      .call(move |conn| {
        let exists = conn
          .query_row(
            "SELECT 1 FROM users WHERE user_id = ?1",
            rusqlite::params![user_id],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if !exists {
          return Ok(false);
        }
        conn.execute(
          "INSERT INTO sessions (token, user_id, issued_at, expires_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![session.token, user_id, issued_at_str, expires_at_str],
        )?;
        Ok(true)
      })
      .await?;

    if !inserted {
      return Err(Error::UserNotFound(user_id));
    }
    Ok(())
  }

  pub async fn add_guest_token(&self, guest: NewGuestToken) -> Result<()> {
    let issued_at_str  = guest.issued_at.map(encode_dt);
    let expires_at_str = guest.expires_at.map(encode_dt);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO guest_tokens (token, issued_at, expires_at, source_ip)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![guest.token, issued_at_str, expires_at_str, guest.source_ip],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Insert or replace a value in the `parameters` table.
  pub async fn set_parameter(&self, name: &str, value: &str) -> Result<()> {
    let name_str  = name.to_owned();
    let value_str = value.to_owned();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO parameters (name, value) VALUES (?1, ?2)
           ON CONFLICT(name) DO UPDATE SET value = excluded.value",
          rusqlite::params![name_str, value_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// `is_active` of a session regardless of expiry. `None` if no such token.
  pub async fn session_active(&self, token: &str) -> Result<Option<bool>> {
    self.active_flag("sessions", token).await
  }

  pub async fn guest_active(&self, token: &str) -> Result<Option<bool>> {
    self.active_flag("guest_tokens", token).await
  }

  /// When the gate closed a credential, if it did.
  pub async fn session_closed_at(&self, token: &str) -> Result<Option<DateTime<Utc>>> {
    let token_str = token.to_owned();
    let raw: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT closed_at FROM sessions WHERE token = ?1",
              rusqlite::params![token_str],
              |row| row.get::<_, Option<String>>(0),
            )
            .optional()?
            .flatten(),
        )
      })
      .await?;
    raw.as_deref().map(crate::encode::decode_dt).transpose()
  }

  /// Access log rows, oldest first.
  pub async fn audit_entries(&self) -> Result<Vec<AuditRecord>> {
    let raws: Vec<RawAudit> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT user_id, date, time, outcome, client_ip
           FROM access_log ORDER BY log_id",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawAudit {
              user_id:   row.get(0)?,
              date:      row.get(1)?,
              time:      row.get(2)?,
              outcome:   row.get(3)?,
              client_ip: row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAudit::into_record).collect()
  }

  async fn active_flag(&self, table: &'static str, token: &str) -> Result<Option<bool>> {
    let token_str = token.to_owned();
    let flag: Option<bool> = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT is_active FROM {table} WHERE token = ?1");
        Ok(
          conn
            .query_row(&sql, rusqlite::params![token_str], |row| row.get(0))
            .optional()?,
        )
      })
      .await?;
    Ok(flag)
  }
}
