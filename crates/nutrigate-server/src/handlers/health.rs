/// Liveness probe. Never touches the store.
pub async fn handler() -> &'static str { "ok" }
