//! Fire-and-forget access logging.

use std::net::IpAddr;

use chrono::{Timelike as _, Utc};

use crate::store::{AuditLog, AuditOutcome, AuditRecord};

/// Writes one [`AuditRecord`] per authentication attempt. A failed write is
/// logged and otherwise ignored.
#[derive(Debug, Clone)]
pub struct SessionAuditor<A> {
  log: A,
}

impl<A: AuditLog> SessionAuditor<A> {
  pub fn new(log: A) -> Self { Self { log } }

  pub async fn record(
    &self,
    subject_id: Option<i64>,
    outcome:    AuditOutcome,
    client_ip:  Option<IpAddr>,
  ) {
    let now = Utc::now();
    let record = AuditRecord {
      subject_id,
      date: now.date_naive(),
      // The access log keeps whole seconds.
      time: now.time().with_nanosecond(0).unwrap_or(now.time()),
      outcome,
      client_ip: client_ip.map(|ip| ip.to_string()),
    };

    if let Err(e) = self.log.append(record).await {
      tracing::warn!(error = %e, %outcome, ?subject_id, "failed to write audit record");
    }
  }
}
