//! In-memory store double used by the unit tests of this crate.

use std::{
  collections::{HashMap, HashSet},
  sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
  },
};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{
  credential::{Expiry, GuestCredential, RegisteredCredential},
  store::{AuditLog, AuditRecord, CredentialStore, ParamSource, ParameterStore},
};

#[derive(Debug, Error)]
#[error("memory store failure: {0}")]
pub struct MemoryError(&'static str);

#[derive(Default)]
struct Inner {
  registered:        HashMap<String, RegisteredCredential>,
  guests:            HashMap<String, GuestCredential>,
  parameters:        HashMap<(&'static str, String), String>,
  failing_sources:   HashSet<&'static str>,
  fail_credentials:  bool,
  fail_audit:        bool,
  skip_expiry:       bool,
  audit:             Vec<AuditRecord>,
}

/// Counts every trait call so tests can assert that no store was touched.
#[derive(Clone, Default)]
pub struct MemoryStore {
  inner:         Arc<Mutex<Inner>>,
  calls:         Arc<AtomicUsize>,
  deactivations: Arc<AtomicUsize>,
}

impl MemoryStore {
  pub fn registered(
    token: &str,
    subject_id: i64,
    category: Option<&str>,
    expiry: Expiry,
  ) -> RegisteredCredential {
    RegisteredCredential {
      token: token.to_owned(),
      subject_id,
      display_name: Some(format!("user {subject_id}")),
      category: category.map(str::to_owned),
      is_administrator: false,
      linked_patient_id: None,
      expiry,
      is_active: true,
      web_access_enabled: true,
    }
  }

  pub fn guest(token: &str, expiry: Expiry) -> GuestCredential {
    GuestCredential {
      token: token.to_owned(),
      expiry,
      source_ip: Some("127.0.0.1".into()),
      is_active: true,
    }
  }

  fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
    self.inner.lock().unwrap()
  }

  pub fn add_registered(&self, credential: RegisteredCredential) {
    self.lock().registered.insert(credential.token.clone(), credential);
  }

  pub fn add_guest(&self, credential: GuestCredential) {
    self.lock().guests.insert(credential.token.clone(), credential);
  }

  pub fn set_parameter(&self, source: ParamSource, name: &str, value: &str) {
    self
      .lock()
      .parameters
      .insert((source.table, name.to_owned()), value.to_owned());
  }

  pub fn fail_source(&self, source: ParamSource) { self.lock().failing_sources.insert(source.table); }

  pub fn fail_credentials(&self) { self.lock().fail_credentials = true; }

  pub fn fail_audit(&self) { self.lock().fail_audit = true; }

  /// Return stamped-expired rows instead of filtering them at lookup.
  pub fn skip_expiry_filter(&self) { self.lock().skip_expiry = true; }

  pub fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }

  pub fn deactivations(&self) -> usize { self.deactivations.load(Ordering::SeqCst) }

  pub fn registered_active(&self, token: &str) -> Option<bool> {
    self.lock().registered.get(token).map(|c| c.is_active)
  }

  pub fn guest_active(&self, token: &str) -> Option<bool> {
    self.lock().guests.get(token).map(|c| c.is_active)
  }

  pub fn audit_entries(&self) -> Vec<AuditRecord> { self.lock().audit.clone() }

  fn touch(&self) { self.calls.fetch_add(1, Ordering::SeqCst); }
}

fn stamped_live(expiry: Expiry, now: DateTime<Utc>, skip: bool) -> bool {
  if skip {
    return true;
  }
  match expiry {
    Expiry::Stamped(at) => at > now,
    Expiry::Issued(_) | Expiry::Never => true,
  }
}

impl CredentialStore for MemoryStore {
  type Error = MemoryError;

  async fn find_registered(
    &self,
    token: &str,
    now: DateTime<Utc>,
  ) -> Result<Option<RegisteredCredential>, MemoryError> {
    self.touch();
    let inner = self.lock();
    if inner.fail_credentials {
      return Err(MemoryError("credentials"));
    }
    Ok(
      inner
        .registered
        .get(token)
        .filter(|c| c.is_active && c.web_access_enabled && stamped_live(c.expiry, now, inner.skip_expiry))
        .cloned(),
    )
  }

  async fn find_guest(
    &self,
    token: &str,
    now: DateTime<Utc>,
  ) -> Result<Option<GuestCredential>, MemoryError> {
    self.touch();
    let inner = self.lock();
    if inner.fail_credentials {
      return Err(MemoryError("credentials"));
    }
    Ok(
      inner
        .guests
        .get(token)
        .filter(|c| c.is_active && stamped_live(c.expiry, now, inner.skip_expiry))
        .cloned(),
    )
  }

  async fn deactivate_registered(
    &self,
    token: &str,
    _closed_at: DateTime<Utc>,
  ) -> Result<bool, MemoryError> {
    self.touch();
    let mut inner = self.lock();
    match inner.registered.get_mut(token) {
      Some(c) if c.is_active => {
        c.is_active = false;
        self.deactivations.fetch_add(1, Ordering::SeqCst);
        Ok(true)
      }
      _ => Ok(false),
    }
  }

  async fn deactivate_guest(
    &self,
    token: &str,
    _closed_at: DateTime<Utc>,
  ) -> Result<bool, MemoryError> {
    self.touch();
    let mut inner = self.lock();
    match inner.guests.get_mut(token) {
      Some(c) if c.is_active => {
        c.is_active = false;
        self.deactivations.fetch_add(1, Ordering::SeqCst);
        Ok(true)
      }
      _ => Ok(false),
    }
  }
}

impl ParameterStore for MemoryStore {
  type Error = MemoryError;

  async fn parameter(
    &self,
    source: ParamSource,
    name: &str,
  ) -> Result<Option<String>, MemoryError> {
    self.touch();
    let inner = self.lock();
    if inner.failing_sources.contains(source.table) {
      return Err(MemoryError("parameters"));
    }
    Ok(inner.parameters.get(&(source.table, name.to_owned())).cloned())
  }
}

impl AuditLog for MemoryStore {
  type Error = MemoryError;

  async fn append(&self, record: AuditRecord) -> Result<(), MemoryError> {
    self.touch();
    let mut inner = self.lock();
    if inner.fail_audit {
      return Err(MemoryError("audit"));
    }
    inner.audit.push(record);
    Ok(())
  }
}
