//! Unauthenticated tenant directory. Exposes only id, prefix, and name.

use crate::error::AppError;
use crate::models::TenantDirectoryEntry;
use crate::response::{self, SuccessData};
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};

pub async fn tenants(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<SuccessData<Vec<TenantDirectoryEntry>>>), AppError> {
    let rows = sqlx::query_as::<_, (uuid::Uuid, String, String)>(
        "SELECT id, tenant_prefix, name FROM tenants ORDER BY tenant_prefix",
    )
    .fetch_all(&state.pool)
    .await?;
    let entries = rows
        .into_iter()
        .map(|(id, tenant_prefix, name)| TenantDirectoryEntry {
            id,
            tenant_prefix,
            name,
        })
        .collect();
    Ok(response::ok(entries))
}
