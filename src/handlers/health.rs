use axum::{Json, extract::State, http::StatusCode};
use serde_json::{Value, json};
use tracing::warn;

use crate::router::AppState;

/// GET /health - database backend, how it was chosen, and whether it
/// currently answers queries.
///
/// `degraded` is true when a configured database was replaced by the local
/// fallback at startup. Returns 503 only when the store is unreachable.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let reachable = match state.store.ping().await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "health check: database unreachable");
            false
        }
    };

    let status = if reachable {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let body = json!({
        "status": if reachable { "ok" } else { "unavailable" },
        "backend": state.store.backend().as_str(),
        "resolution": state.resolution.as_str(),
        "degraded": state.resolution.is_degraded(),
    });
    (status, Json(body))
}
