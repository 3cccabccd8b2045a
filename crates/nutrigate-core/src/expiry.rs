//! Per-category token lifetimes, overridable through the parameter table.

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::{
  identity::normalize,
  store::{ParamSource, ParameterStore},
};

/// Parameter sources tried in order for every lookup: the current table
/// layout first, then the legacy one.
pub const PARAM_SOURCES: [ParamSource; 2] = [
  ParamSource { table: "parameters", key_column: "name", value_column: "value" },
  ParamSource { table: "parametros", key_column: "nombre", value_column: "valor" },
];

/// Token class for expiry purposes, keyed off the stored category string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenClass {
  Guest,
  Patient,
  Nutritionist,
  User,
}

impl TokenClass {
  /// Case- and whitespace-insensitive. Anything unrecognised is a plain user.
  pub fn classify(category: &str) -> Self {
    match normalize(category).as_str() {
      "guest" | "invitado" => TokenClass::Guest,
      "patient" | "paciente" => TokenClass::Patient,
      "nutritionist" | "nutricionista" => TokenClass::Nutritionist,
      _ => TokenClass::User,
    }
  }

  pub fn parameter(self) -> &'static str {
    match self {
      TokenClass::Guest => "token_expiry_hours_guest",
      TokenClass::Patient => "token_expiry_hours_patient",
      TokenClass::Nutritionist => "token_expiry_hours_nutritionist",
      TokenClass::User => "token_expiry_hours_user",
    }
  }

  pub fn default_hours(self) -> u32 {
    match self {
      TokenClass::Guest => 0,
      TokenClass::Patient => 720,
      TokenClass::Nutritionist => 504,
      TokenClass::User => 1440,
    }
  }
}

/// Sentinel expiration instant for tokens that never expire.
pub fn far_future() -> DateTime<Utc> {
  NaiveDate::from_ymd_opt(9999, 12, 31)
    .and_then(|d| d.and_hms_opt(23, 59, 59))
    .map(|dt| dt.and_utc())
    .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Absolute expiration instant `hours` after `from`; 0 hours never expires.
pub fn expiry_instant(from: DateTime<Utc>, hours: u32) -> DateTime<Utc> {
  if hours == 0 {
    return far_future();
  }
  from
    .checked_add_signed(Duration::hours(i64::from(hours)))
    .unwrap_or_else(far_future)
}

/// Coerce a stored parameter value into whole hours.
///
/// Fractions are floored and negatives clamp to 0. Blank or non-numeric text
/// yields `None`.
pub fn parse_hours(raw: &str) -> Option<u32> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return None;
  }
  let value: f64 = trimmed.parse().ok()?;
  if value.is_nan() {
    return None;
  }
  // Float-to-int `as` saturates.
  Some(value.floor().max(0.0) as u32)
}

/// Resolves token lifetimes from a [`ParameterStore`].
#[derive(Debug, Clone)]
pub struct ExpirationPolicy<P> {
  params: P,
}

impl<P: ParameterStore> ExpirationPolicy<P> {
  pub fn new(params: P) -> Self { Self { params } }

  /// Hours a token of `category` stays valid. Never fails: store errors
  /// move on to the next source and finally to the built-in default.
  pub async fn hours_for(&self, category: &str) -> u32 {
    self.hours_for_class(TokenClass::classify(category)).await
  }

  pub async fn hours_for_class(&self, class: TokenClass) -> u32 {
    let name = class.parameter();

    for source in PARAM_SOURCES {
      match self.params.parameter(source, name).await {
        Ok(Some(raw)) => {
          if let Some(hours) = parse_hours(&raw) {
            return hours;
          }
          tracing::debug!(parameter = name, table = source.table, raw = %raw, "ignoring unusable value");
        }
        Ok(None) => {}
        Err(e) => {
          tracing::debug!(parameter = name, table = source.table, error = %e, "parameter source failed");
        }
      }
    }

    class.default_hours()
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone as _;

  use super::*;
  use crate::testing::MemoryStore;

  #[test]
  fn classify_is_case_and_space_insensitive() {
    assert_eq!(TokenClass::classify(" Invitado "), TokenClass::Guest);
    assert_eq!(TokenClass::classify("PACIENTE"), TokenClass::Patient);
    assert_eq!(TokenClass::classify("nutritionist"), TokenClass::Nutritionist);
    assert_eq!(TokenClass::classify("usuario"), TokenClass::User);
    assert_eq!(TokenClass::classify(""), TokenClass::User);
  }

  #[test]
  fn parse_hours_floors_and_clamps() {
    assert_eq!(parse_hours("100"), Some(100));
    assert_eq!(parse_hours(" 12.9 "), Some(12));
    assert_eq!(parse_hours("-5"), Some(0));
    assert_eq!(parse_hours(""), None);
    assert_eq!(parse_hours("abc"), None);
    assert_eq!(parse_hours("NaN"), None);
  }

  #[test]
  fn zero_hours_never_expires() {
    let from = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
    assert_eq!(expiry_instant(from, 0), far_future());
    assert_eq!(expiry_instant(from, 2), Utc.with_ymd_and_hms(2026, 3, 1, 14, 0, 0).unwrap());
    assert!(far_future() > Utc::now());
  }

  #[tokio::test]
  async fn defaults_without_overrides() {
    let policy = ExpirationPolicy::new(MemoryStore::default());
    assert_eq!(policy.hours_for("nutricionista").await, 504);
    assert_eq!(policy.hours_for("paciente").await, 720);
    assert_eq!(policy.hours_for("usuario").await, 1440);
    assert_eq!(policy.hours_for("invitado").await, 0);
  }

  #[tokio::test]
  async fn primary_override_wins() {
    let store = MemoryStore::default();
    store.set_parameter(PARAM_SOURCES[0], "token_expiry_hours_user", "100");
    store.set_parameter(PARAM_SOURCES[1], "token_expiry_hours_user", "7");
    let policy = ExpirationPolicy::new(store);
    assert_eq!(policy.hours_for("usuario").await, 100);
  }

  #[tokio::test]
  async fn failing_source_falls_through_to_legacy() {
    let store = MemoryStore::default();
    store.fail_source(PARAM_SOURCES[0]);
    store.set_parameter(PARAM_SOURCES[1], "token_expiry_hours_patient", "48.5");
    let policy = ExpirationPolicy::new(store);
    assert_eq!(policy.hours_for("paciente").await, 48);
  }

  #[tokio::test]
  async fn blank_value_is_skipped() {
    let store = MemoryStore::default();
    store.set_parameter(PARAM_SOURCES[0], "token_expiry_hours_nutritionist", "  ");
    let policy = ExpirationPolicy::new(store);
    assert_eq!(policy.hours_for("nutricionista").await, 504);
  }

  #[tokio::test]
  async fn all_sources_failing_yields_default() {
    let store = MemoryStore::default();
    store.fail_source(PARAM_SOURCES[0]);
    store.fail_source(PARAM_SOURCES[1]);
    let policy = ExpirationPolicy::new(store);
    assert_eq!(policy.hours_for("guest").await, 0);
  }
}
