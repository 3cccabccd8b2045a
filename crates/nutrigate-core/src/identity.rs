//! The resolved outcome of a successful authentication.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::credential::{GuestCredential, RegisteredCredential};

/// The role category used to look up permissions.
///
/// Variants are ordered from least to most privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserCategory {
  Guest,
  RegularUser,
  PatientUser,
  Nutritionist,
  Administrator,
}

impl UserCategory {
  pub const ALL: [UserCategory; 5] = [
    UserCategory::Guest,
    UserCategory::RegularUser,
    UserCategory::PatientUser,
    UserCategory::Nutritionist,
    UserCategory::Administrator,
  ];

  /// Human-readable role name as shown to platform users.
  pub fn label(self) -> &'static str {
    match self {
      UserCategory::Guest => "Invitado",
      UserCategory::RegularUser => "Usuario",
      UserCategory::PatientUser => "Paciente",
      UserCategory::Nutritionist => "Nutricionista",
      UserCategory::Administrator => "Administrador",
    }
  }

  /// Derive the category of a registered (non-guest) account.
  ///
  /// Administrators whose stored label names the nutritionist role become
  /// [`UserCategory::Nutritionist`]; the remaining precedence is
  /// administrator, linked patient, plain user.
  pub fn for_registered(
    is_administrator:  bool,
    role_label:        Option<&str>,
    linked_patient_id: Option<i64>,
  ) -> Self {
    if is_administrator {
      return match role_label.map(normalize) {
        Some(label) if label == "nutritionist" || label == "nutricionista" => {
          UserCategory::Nutritionist
        }
        _ => UserCategory::Administrator,
      };
    }
    match linked_patient_id {
      Some(id) if id > 0 => UserCategory::PatientUser,
      _ => UserCategory::RegularUser,
    }
  }
}

impl fmt::Display for UserCategory {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.label())
  }
}

/// Lowercase and trim a stored category string.
pub(crate) fn normalize(raw: &str) -> String { raw.trim().to_lowercase() }

/// A resolved caller. Built once per request and never persisted.
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
  pub subject_id:        i64,
  pub display_name:      Option<String>,
  pub user_category:     UserCategory,
  pub linked_patient_id: Option<i64>,
  pub is_administrator:  bool,
  /// Raw category string stored with the account, if any.
  pub role_label:        Option<String>,
  pub raw_token:         String,
}

impl Identity {
  pub fn registered(credential: RegisteredCredential) -> Self {
    let user_category = UserCategory::for_registered(
      credential.is_administrator,
      credential.category.as_deref(),
      credential.linked_patient_id,
    );
    Self {
      subject_id: credential.subject_id,
      display_name: credential.display_name,
      user_category,
      linked_patient_id: credential.linked_patient_id,
      is_administrator: credential.is_administrator,
      role_label: credential.category,
      raw_token: credential.token,
    }
  }

  pub fn guest(credential: GuestCredential) -> Self {
    Self {
      subject_id:        0,
      display_name:      None,
      user_category:     UserCategory::Guest,
      linked_patient_id: None,
      is_administrator:  false,
      role_label:        None,
      raw_token:         credential.token,
    }
  }

  pub fn is_guest(&self) -> bool { self.user_category == UserCategory::Guest }
}

impl fmt::Debug for Identity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Identity")
      .field("subject_id", &self.subject_id)
      .field("display_name", &self.display_name)
      .field("user_category", &self.user_category)
      .field("linked_patient_id", &self.linked_patient_id)
      .field("is_administrator", &self.is_administrator)
      .field("role_label", &self.role_label)
      .field("raw_token", &crate::credential::fingerprint(&self.raw_token))
      .finish()
  }
}
