//! `GET /api/access/{resource}`: may the caller use this resource?

use axum::{Json, extract::Path};
use nutrigate_core::{UserCategory, authorize};
use serde::Serialize;

use crate::{Backend, Error, auth::Authenticated};

#[derive(Debug, Serialize)]
pub struct AccessGranted {
  pub resource: &'static str,
  pub category: UserCategory,
  pub allowed:  bool,
}

/// Denials come back as the failure body via [`Error`].
pub async fn handler<S: Backend>(
  Authenticated(identity): Authenticated,
  Path(resource): Path<String>,
) -> Result<Json<AccessGranted>, Error> {
  let granted = authorize(&identity, &resource)?;
  tracing::debug!(
    subject_id = identity.subject_id,
    resource = granted.name(),
    "access granted"
  );
  Ok(Json(AccessGranted {
    resource: granted.name(),
    category: identity.user_category,
    allowed:  true,
  }))
}
