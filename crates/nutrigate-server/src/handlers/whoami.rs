//! `GET /api/whoami`: who the bearer token belongs to.

use axum::Json;
use nutrigate_core::{Identity, UserCategory, permission};
use serde::Serialize;

use crate::{Backend, auth::Authenticated};

/// Identity summary. The token itself is never echoed back.
#[derive(Debug, Serialize)]
pub struct WhoAmI {
  pub subject_id:        i64,
  pub display_name:      Option<String>,
  pub category:          UserCategory,
  pub category_label:    &'static str,
  pub linked_patient_id: Option<i64>,
  pub is_administrator:  bool,
  pub is_guest:          bool,
  pub allowed_resources: Vec<&'static str>,
}

impl From<Identity> for WhoAmI {
  fn from(identity: Identity) -> Self {
    let category = permission::category_of(&identity);
    Self {
      subject_id:        identity.subject_id,
      category_label:    category.label(),
      is_guest:          identity.is_guest(),
      display_name:      identity.display_name,
      category,
      linked_patient_id: identity.linked_patient_id,
      is_administrator:  identity.is_administrator,
      allowed_resources: permission::allowed_resources(category)
        .into_iter()
        .map(|r| r.name())
        .collect(),
    }
  }
}

pub async fn handler<S: Backend>(Authenticated(identity): Authenticated) -> Json<WhoAmI> {
  Json(identity.into())
}
