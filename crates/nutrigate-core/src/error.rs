//! Error types for `nutrigate-core`.

use serde::Serialize;
use thiserror::Error;

use crate::{identity::UserCategory, permission::Resource};

/// A resource name the permission matrix has no row for.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown resource: {0:?}")]
pub struct UnknownResource(pub String);

/// Every way authentication or authorization can fail.
#[derive(Debug, Error)]
pub enum AuthError {
  #[error("authorization token is required")]
  MissingToken,

  #[error("invalid authorization header format (expected 'Bearer <token>')")]
  MalformedHeader,

  #[error("token is invalid or has expired")]
  InvalidOrExpiredToken,

  #[error("{category} may not access {resource}; requires {required}")]
  PermissionDenied {
    category: UserCategory,
    resource: Resource,
    required: String,
  },

  #[error("access to unknown resource {0:?} denied")]
  UnknownResource(String),

  #[error("database error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl AuthError {
  pub fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    AuthError::Store(Box::new(e))
  }

  /// HTTP-style status class.
  pub fn status(&self) -> u16 {
    match self {
      AuthError::MissingToken
      | AuthError::MalformedHeader
      | AuthError::InvalidOrExpiredToken => 401,
      AuthError::PermissionDenied { .. } | AuthError::UnknownResource(_) => 403,
      AuthError::Store(_) => 500,
    }
  }

  /// Machine-readable code.
  pub fn code(&self) -> &'static str {
    match self {
      AuthError::MissingToken => "NO_TOKEN",
      AuthError::MalformedHeader => "MALFORMED_HEADER",
      AuthError::InvalidOrExpiredToken => "INVALID_TOKEN",
      AuthError::PermissionDenied { .. } => "PERMISSION_DENIED",
      AuthError::UnknownResource(_) => "UNKNOWN_RESOURCE",
      AuthError::Store(_) => "DB_ERROR",
    }
  }

  pub fn failure(&self) -> Failure {
    Failure {
      status:  self.status(),
      code:    self.code(),
      message: self.to_string(),
    }
  }
}

impl From<UnknownResource> for AuthError {
  fn from(e: UnknownResource) -> Self { AuthError::UnknownResource(e.0) }
}

/// Structured failure handed to the transport layer for serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
  pub status:  u16,
  pub code:    &'static str,
  pub message: String,
}

pub type Result<T, E = AuthError> = std::result::Result<T, E>;
