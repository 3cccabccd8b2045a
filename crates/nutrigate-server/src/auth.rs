//! Bearer-token extractor.

use std::net::{IpAddr, SocketAddr};

use axum::{
  extract::{ConnectInfo, FromRequestParts},
  http::{HeaderMap, header, request::Parts},
};
use nutrigate_core::{AuthError, Identity};

use crate::{AppState, Backend, error::Error};

const FORWARDED_FOR: &str = "x-forwarded-for";

/// A request whose bearer token resolved to an [`Identity`].
pub struct Authenticated(pub Identity);

/// Raw `Authorization` value. A header that is present but not valid
/// visible ASCII can never be a bearer token.
fn authorization(headers: &HeaderMap) -> Result<Option<String>, Error> {
  match headers.get(header::AUTHORIZATION) {
    None => Ok(None),
    Some(v) => v
      .to_str()
      .map(|s| Some(s.to_owned()))
      .map_err(|_| Error::Auth(AuthError::MalformedHeader)),
  }
}

/// Address recorded in the access log for this request.
pub fn client_ip(parts: &Parts, trust_forwarded_for: bool) -> Option<IpAddr> {
  if trust_forwarded_for {
    let forwarded = parts
      .headers
      .get(FORWARDED_FOR)
      .and_then(|v| v.to_str().ok())
      .and_then(|s| s.split(',').next())
      .and_then(|s| s.trim().parse().ok());
    if forwarded.is_some() {
      return forwarded;
    }
  }
  parts
    .extensions
    .get::<ConnectInfo<SocketAddr>>()
    .map(|ConnectInfo(addr)| addr.ip())
}

impl<S: Backend> FromRequestParts<AppState<S>> for Authenticated {
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let header = authorization(&parts.headers)?;
    let ip     = client_ip(parts, state.config.trust_forwarded_for);
    let identity = state.gate.authenticate(header.as_deref(), ip).await?;
    Ok(Authenticated(identity))
  }
}
