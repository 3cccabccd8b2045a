//! The fallback resolution strategy: registered user first, then guest.

use std::net::IpAddr;

use crate::{
  audit::SessionAuditor,
  error::{AuthError, Result},
  identity::Identity,
  permission::{self, Resource},
  resolver::{Resolution, TokenResolver},
  store::{AuditLog, AuditOutcome, CredentialStore, ParameterStore},
};

const BEARER_PREFIX: &str = "Bearer ";

/// Pull the token out of an `Authorization` header value.
///
/// Absent or blank headers are [`AuthError::MissingToken`]; anything not of
/// the form `Bearer <token>` is [`AuthError::MalformedHeader`].
pub fn extract_bearer(header: Option<&str>) -> Result<&str> {
  let value = header
    .map(str::trim)
    .filter(|v| !v.is_empty())
    .ok_or(AuthError::MissingToken)?;

  let token = value
    .strip_prefix(BEARER_PREFIX)
    .map(str::trim)
    .ok_or(AuthError::MalformedHeader)?;

  if token.is_empty() {
    return Err(AuthError::MalformedHeader);
  }
  Ok(token)
}

/// Authenticates requests and answers permission questions.
///
/// Stateless apart from its injected store handles, so one instance can be
/// shared across concurrent requests.
#[derive(Debug, Clone)]
pub struct Authenticator<C, P, A> {
  resolver: TokenResolver<C, P>,
  auditor:  SessionAuditor<A>,
}

impl<C, P, A> Authenticator<C, P, A>
where
  C: CredentialStore,
  P: ParameterStore,
  A: AuditLog,
{
  pub fn new(resolver: TokenResolver<C, P>, auditor: SessionAuditor<A>) -> Self {
    Self { resolver, auditor }
  }

  /// Resolve `header` to an [`Identity`].
  ///
  /// Exactly one of the registered and guest paths succeeds, or the call
  /// fails with [`AuthError::InvalidOrExpiredToken`]. Store errors are
  /// returned as-is.
  pub async fn authenticate(
    &self,
    header:    Option<&str>,
    client_ip: Option<IpAddr>,
  ) -> Result<Identity> {
    let token = extract_bearer(header)?;

    match self.resolver.resolve_registered(token).await? {
      Resolution::Resolved(identity) => {
        self
          .auditor
          .record(Some(identity.subject_id), AuditOutcome::Ok, client_ip)
          .await;
        return Ok(identity);
      }
      Resolution::Expired { subject_id } => {
        self
          .auditor
          .record(Some(subject_id), AuditOutcome::Expired, client_ip)
          .await;
      }
      Resolution::NotFound => {}
    }

    match self.resolver.resolve_guest(token).await? {
      Resolution::Resolved(identity) => {
        self.auditor.record(Some(0), AuditOutcome::OkGuest, client_ip).await;
        Ok(identity)
      }
      Resolution::Expired { .. } | Resolution::NotFound => {
        self.auditor.record(None, AuditOutcome::InvalidToken, client_ip).await;
        Err(AuthError::InvalidOrExpiredToken)
      }
    }
  }

  /// Authenticate, then require access to `resource_name`.
  pub async fn check(
    &self,
    header:        Option<&str>,
    client_ip:     Option<IpAddr>,
    resource_name: &str,
  ) -> Result<(Identity, Resource)> {
    let identity = self.authenticate(header, client_ip).await?;
    let resource = permission::authorize(&identity, resource_name)?;
    Ok((identity, resource))
  }
}

#[cfg(test)]
mod tests {
  use chrono::{Duration, Utc};

  use super::*;
  use crate::{
    credential::Expiry,
    expiry::{ExpirationPolicy, PARAM_SOURCES},
    identity::UserCategory,
    testing::MemoryStore,
  };

  fn authenticator(store: &MemoryStore) -> Authenticator<MemoryStore, MemoryStore, MemoryStore> {
    Authenticator::new(
      TokenResolver::new(store.clone(), ExpirationPolicy::new(store.clone())),
      SessionAuditor::new(store.clone()),
    )
  }

  #[test]
  fn bearer_extraction() {
    assert_eq!(extract_bearer(Some("Bearer abc123")).unwrap(), "abc123");
    assert!(matches!(extract_bearer(None), Err(AuthError::MissingToken)));
    assert!(matches!(extract_bearer(Some("   ")), Err(AuthError::MissingToken)));
    assert!(matches!(extract_bearer(Some("Basic abc")), Err(AuthError::MalformedHeader)));
    assert!(matches!(extract_bearer(Some("Bearer ")), Err(AuthError::MalformedHeader)));
    assert!(matches!(extract_bearer(Some("bearer abc")), Err(AuthError::MalformedHeader)));
    assert!(matches!(extract_bearer(Some("Bearerabc")), Err(AuthError::MalformedHeader)));
  }

  #[tokio::test]
  async fn missing_header_touches_no_store() {
    let store = MemoryStore::default();
    let err = authenticator(&store).authenticate(None, None).await.unwrap_err();
    assert!(matches!(err, AuthError::MissingToken));
    assert_eq!(store.calls(), 0);
  }

  #[tokio::test]
  async fn malformed_header_touches_no_store() {
    let store = MemoryStore::default();
    let err = authenticator(&store)
      .authenticate(Some("Token abc"), None)
      .await
      .unwrap_err();
    assert!(matches!(err, AuthError::MalformedHeader));
    assert_eq!(store.calls(), 0);
  }

  #[tokio::test]
  async fn registered_token_is_audited_ok() {
    let store = MemoryStore::default();
    store.add_registered(MemoryStore::registered("abc", 17, Some("paciente"), Expiry::Never));

    let ip = "192.168.1.20".parse().unwrap();
    let identity = authenticator(&store)
      .authenticate(Some("Bearer abc"), Some(ip))
      .await
      .unwrap();
    assert_eq!(identity.subject_id, 17);
    assert_ne!(identity.user_category, UserCategory::Guest);

    let entries = store.audit_entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].outcome, AuditOutcome::Ok);
    assert_eq!(entries[0].subject_id, Some(17));
    assert_eq!(entries[0].client_ip.as_deref(), Some("192.168.1.20"));
  }

  #[tokio::test]
  async fn guest_fallback_then_allowed_tips() {
    let store = MemoryStore::default();
    let later = Utc::now() + Duration::hours(4);
    store.add_guest(MemoryStore::guest("abc123", Expiry::Stamped(later)));

    let auth = authenticator(&store);
    let identity = auth.authenticate(Some("Bearer abc123"), None).await.unwrap();
    assert_eq!(identity.subject_id, 0);
    assert_eq!(identity.user_category, UserCategory::Guest);
    assert_eq!(permission::is_allowed(&identity, "consejos"), Ok(true));

    let entries = store.audit_entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].outcome, AuditOutcome::OkGuest);
  }

  #[tokio::test]
  async fn unknown_token_is_invalid() {
    let store = MemoryStore::default();
    let err = authenticator(&store)
      .authenticate(Some("Bearer nope"), None)
      .await
      .unwrap_err();
    assert!(matches!(err, AuthError::InvalidOrExpiredToken));
    assert_eq!(err.status(), 401);
    assert_eq!(store.audit_entries()[0].outcome, AuditOutcome::InvalidToken);
  }

  #[tokio::test]
  async fn expired_registered_token_fails_and_is_deactivated() {
    let store  = MemoryStore::default();
    let issued = Utc::now() - Duration::hours(30);
    store.set_parameter(PARAM_SOURCES[0], "token_expiry_hours_user", "24");
    store.add_registered(MemoryStore::registered("old", 8, None, Expiry::Issued(issued)));

    let auth = authenticator(&store);
    for _ in 0..2 {
      let err = auth.authenticate(Some("Bearer old"), None).await.unwrap_err();
      assert!(matches!(err, AuthError::InvalidOrExpiredToken));
    }
    assert_eq!(store.registered_active("old"), Some(false));
    assert_eq!(store.deactivations(), 1);

    let outcomes: Vec<_> = store.audit_entries().into_iter().map(|e| e.outcome).collect();
    assert_eq!(
      outcomes,
      vec![AuditOutcome::Expired, AuditOutcome::InvalidToken, AuditOutcome::InvalidToken],
    );
  }

  #[tokio::test]
  async fn registered_path_wins_when_both_match() {
    let store = MemoryStore::default();
    store.add_registered(MemoryStore::registered("dup", 3, None, Expiry::Never));
    store.add_guest(MemoryStore::guest("dup", Expiry::Never));

    let identity = authenticator(&store)
      .authenticate(Some("Bearer dup"), None)
      .await
      .unwrap();
    assert_eq!(identity.subject_id, 3);
    assert_eq!(store.audit_entries().len(), 1);
  }

  #[tokio::test]
  async fn store_error_is_not_invalid_token() {
    let store = MemoryStore::default();
    store.fail_credentials();
    let err = authenticator(&store)
      .authenticate(Some("Bearer abc"), None)
      .await
      .unwrap_err();
    assert!(matches!(err, AuthError::Store(_)));
    assert_eq!(err.status(), 500);
  }

  #[tokio::test]
  async fn audit_failure_does_not_change_outcome() {
    let store = MemoryStore::default();
    store.fail_audit();
    store.add_registered(MemoryStore::registered("abc", 1, None, Expiry::Never));

    let identity = authenticator(&store)
      .authenticate(Some("Bearer abc"), None)
      .await
      .unwrap();
    assert_eq!(identity.subject_id, 1);
  }

  #[tokio::test]
  async fn check_denies_regular_user_appointments() {
    let store = MemoryStore::default();
    store.add_registered(MemoryStore::registered("abc", 1, Some("usuario"), Expiry::Never));

    let auth = authenticator(&store);
    let err = auth.check(Some("Bearer abc"), None, "citas").await.unwrap_err();
    assert_eq!(err.code(), "PERMISSION_DENIED");

    let (identity, resource) = auth.check(Some("Bearer abc"), None, "recetas").await.unwrap();
    assert_eq!(identity.subject_id, 1);
    assert_eq!(resource, Resource::Recipes);

    let err = auth.check(Some("Bearer abc"), None, "nonexistent_resource").await.unwrap_err();
    assert_eq!(err.code(), "UNKNOWN_RESOURCE");
  }
}
