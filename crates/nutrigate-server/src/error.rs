//! Error types and axum `IntoResponse` implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use nutrigate_core::AuthError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Auth(#[from] AuthError),
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let Error::Auth(err) = self;

    let mut failure = err.failure();
    if let AuthError::Store(source) = &err {
      tracing::error!(error = %source, "store failure while authorizing request");
      // Keep database detail out of the response body.
      failure.message = "internal database error".to_owned();
    }

    let status =
      StatusCode::from_u16(failure.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut res = (status, Json(failure)).into_response();
    if status == StatusCode::UNAUTHORIZED {
      res
        .headers_mut()
        .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
    }
    res
  }
}
