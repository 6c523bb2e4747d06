//! Health endpoints. These must answer even when the store never came up;
//! platform liveness probes hit them directly.

use crate::state::AppState;
use axum::{extract::State, Json};
use serde::Serialize;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthBody {
    pub success: bool,
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degraded_reason: Option<String>,
}

pub async fn root() -> Json<HealthBody> {
    Json(HealthBody {
        success: true,
        status: "ok",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        database: None,
        degraded_reason: None,
    })
}

/// Full health: reports degraded mode from the bootstrap plus a live
/// connectivity probe. Always 200 — degradation is in the body, the process
/// itself is alive.
pub async fn health(State(state): State<AppState>) -> Json<HealthBody> {
    let bootstrap_reason = state.degraded_reason();
    let db_ok = sqlx::query("SELECT 1")
        .fetch_optional(&state.pool)
        .await
        .is_ok();

    let degraded = bootstrap_reason.is_some() || !db_ok;
    Json(HealthBody {
        success: true,
        status: if degraded { "degraded" } else { "ok" },
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        database: Some(if db_ok { "ok" } else { "unavailable" }),
        degraded_reason: bootstrap_reason,
    })
}
