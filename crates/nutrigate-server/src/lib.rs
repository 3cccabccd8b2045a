//! HTTP front for the nutrigate authorization gate.
//!
//! Exposes an axum [`Router`] that authenticates bearer tokens and answers
//! per-resource permission checks, backed by any store implementing the
//! `nutrigate-core` store traits.

pub mod auth;
pub mod error;
pub mod handlers;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{Router, routing::get};
use nutrigate_core::{
  Authenticator, ExpirationPolicy, SessionAuditor, TokenResolver,
  store::{AuditLog, CredentialStore, ParameterStore},
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `NUTRIGATE_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:                String,
  pub port:                u16,
  pub store_path:          PathBuf,
  /// Take the client address from the first `X-Forwarded-For` entry.
  /// Only enable behind a proxy that overwrites the header.
  #[serde(default)]
  pub trust_forwarded_for: bool,
}

// ─── Application state ────────────────────────────────────────────────────────

/// A single backend serving credentials, parameters and the access log.
pub trait Backend:
  CredentialStore + ParameterStore + AuditLog + Clone + Send + Sync + 'static
{
}

impl<T> Backend for T where
  T: CredentialStore + ParameterStore + AuditLog + Clone + Send + Sync + 'static
{
}

pub type Gate<S> = Authenticator<S, S, S>;

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: Backend> {
  pub gate:   Arc<Gate<S>>,
  pub config: Arc<ServerConfig>,
}

impl<S: Backend> AppState<S> {
  pub fn new(store: S, config: ServerConfig) -> Self {
    let policy   = ExpirationPolicy::new(store.clone());
    let resolver = TokenResolver::new(store.clone(), policy);
    let auditor  = SessionAuditor::new(store);
    Self {
      gate:   Arc::new(Authenticator::new(resolver, auditor)),
      config: Arc::new(config),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the axum [`Router`] for the gate.
pub fn router<S: Backend>(state: AppState<S>) -> Router {
  Router::new()
    .route("/health",                 get(handlers::health::handler))
    .route("/api/whoami",             get(handlers::whoami::handler::<S>))
    .route("/api/access/{resource}",  get(handlers::access::handler::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
