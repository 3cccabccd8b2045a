//! Token resolution against the two credential tables.
//!
//! Stores filter out inactive and stamped-expired rows themselves. Records
//! that only carry an issue instant come back unfiltered; their expiry is
//! computed here and, once found to be past, the record is deactivated
//! before the lookup reports [`Resolution::Expired`].

use chrono::{DateTime, Utc};

use crate::{
  credential::{fingerprint, Expiry},
  error::{AuthError, Result},
  expiry::{expiry_instant, ExpirationPolicy, TokenClass},
  identity::{Identity, UserCategory},
  store::{CredentialStore, ParameterStore},
};

/// Outcome of one resolution path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
  Resolved(Identity),
  /// The token matched, but its expiry was discovered during this lookup
  /// and the credential has been deactivated. `subject_id` is 0 for guests.
  Expired { subject_id: i64 },
  NotFound,
}

/// Resolves bearer tokens to identities.
#[derive(Debug, Clone)]
pub struct TokenResolver<C, P> {
  credentials: C,
  policy:      ExpirationPolicy<P>,
}

impl<C, P> TokenResolver<C, P>
where
  C: CredentialStore,
  P: ParameterStore,
{
  pub fn new(credentials: C, policy: ExpirationPolicy<P>) -> Self {
    Self { credentials, policy }
  }

  pub async fn resolve_registered(&self, token: &str) -> Result<Resolution> {
    let now = Utc::now();
    let Some(credential) = self
      .credentials
      .find_registered(token, now)
      .await
      .map_err(AuthError::store)?
    else {
      return Ok(Resolution::NotFound);
    };

    if !credential.is_active || !credential.web_access_enabled {
      return Ok(Resolution::NotFound);
    }

    let class = match credential.category.as_deref() {
      Some(label) if !label.trim().is_empty() => TokenClass::classify(label),
      _ => class_for_flags(&credential),
    };

    if self.is_expired(credential.expiry, class, now).await {
      let changed = self
        .credentials
        .deactivate_registered(token, now)
        .await
        .map_err(AuthError::store)?;
      tracing::info!(
        token = %fingerprint(token),
        subject_id = credential.subject_id,
        changed,
        "deactivated expired session"
      );
      return Ok(Resolution::Expired { subject_id: credential.subject_id });
    }

    Ok(Resolution::Resolved(Identity::registered(credential)))
  }

  pub async fn resolve_guest(&self, token: &str) -> Result<Resolution> {
    let now = Utc::now();
    let Some(credential) = self
      .credentials
      .find_guest(token, now)
      .await
      .map_err(AuthError::store)?
    else {
      return Ok(Resolution::NotFound);
    };

    if !credential.is_active {
      return Ok(Resolution::NotFound);
    }

    if self.is_expired(credential.expiry, TokenClass::Guest, now).await {
      let changed = self
        .credentials
        .deactivate_guest(token, now)
        .await
        .map_err(AuthError::store)?;
      tracing::info!(token = %fingerprint(token), changed, "deactivated expired guest token");
      return Ok(Resolution::Expired { subject_id: 0 });
    }

    Ok(Resolution::Resolved(Identity::guest(credential)))
  }

  async fn is_expired(&self, expiry: Expiry, class: TokenClass, now: DateTime<Utc>) -> bool {
    let expires_at = match expiry {
      Expiry::Never => return false,
      Expiry::Stamped(at) => at,
      Expiry::Issued(issued_at) => {
        let hours = self.policy.hours_for_class(class).await;
        expiry_instant(issued_at, hours)
      }
    };
    expires_at <= now
  }
}

/// Expiry class for an account with no stored category label.
fn class_for_flags(credential: &crate::credential::RegisteredCredential) -> TokenClass {
  match UserCategory::for_registered(
    credential.is_administrator,
    None,
    credential.linked_patient_id,
  ) {
    UserCategory::PatientUser => TokenClass::Patient,
    UserCategory::Nutritionist | UserCategory::Administrator => TokenClass::Nutritionist,
    UserCategory::Guest | UserCategory::RegularUser => TokenClass::User,
  }
}
