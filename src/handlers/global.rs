//! Global admin: cross-tenant administration with its own credential domain.

use crate::auth::{sign_global_token, GlobalAdmin};
use crate::error::AppError;
use crate::handlers::{page_window, parse_uuid, IdPath};
use crate::models::{
    to_json_list, ContributionDto, ContributionRow, ContributionStatus, TenantDto, TenantRow,
    UserDto, UserRow, UserStatus,
};
use crate::response::{self, SuccessData, SuccessMessage};
use crate::sql::QueryBuf;
use crate::state::AppState;
use crate::validation::validate_email;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use uuid::Uuid;

fn slug_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9-]{0,62}$").unwrap())
}

#[derive(Deserialize)]
pub struct GlobalLogin {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct GlobalLoginResponse {
    pub token: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<GlobalLogin>,
) -> Result<(StatusCode, Json<SuccessData<GlobalLoginResponse>>), AppError> {
    if body.email != state.config.global_admin_email
        || body.password != state.config.global_admin_password
    {
        return Err(AppError::Unauthorized("invalid credentials"));
    }
    let token = sign_global_token(&state.config.jwt_secret)?;
    Ok(response::ok(GlobalLoginResponse { token }))
}

pub async fn list_tenants(
    State(state): State<AppState>,
    _admin: GlobalAdmin,
) -> Result<(StatusCode, Json<SuccessData<Vec<TenantDto>>>), AppError> {
    let rows = sqlx::query_as::<_, TenantRow>(
        "SELECT id, tenant_prefix, name, admin_emails, created_at, updated_at FROM tenants ORDER BY tenant_prefix",
    )
    .fetch_all(&state.pool)
    .await?;
    Ok(response::ok(rows.into_iter().map(TenantRow::into_dto).collect()))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTenant {
    pub tenant_prefix: String,
    pub name: String,
    #[serde(default)]
    pub admin_emails: Vec<String>,
}

pub async fn create_tenant(
    State(state): State<AppState>,
    _admin: GlobalAdmin,
    Json(body): Json<CreateTenant>,
) -> Result<(StatusCode, Json<SuccessData<TenantDto>>), AppError> {
    if !slug_re().is_match(&body.tenant_prefix) {
        return Err(AppError::Validation(
            "tenantPrefix must be a lowercase slug (a-z, 0-9, -)".into(),
        ));
    }
    if body.name.trim().is_empty() {
        return Err(AppError::Validation("name is required".into()));
    }
    for email in &body.admin_emails {
        validate_email("adminEmails", email)?;
    }

    let exists: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM tenants WHERE tenant_prefix = $1")
            .bind(&body.tenant_prefix)
            .fetch_optional(&state.pool)
            .await?;
    if exists.is_some() {
        return Err(AppError::Conflict(format!(
            "tenant prefix '{}' already exists",
            body.tenant_prefix
        )));
    }

    let row = sqlx::query_as::<_, TenantRow>(
        r#"
        INSERT INTO tenants (id, tenant_prefix, name, admin_emails)
        VALUES ($1, $2, $3, $4)
        RETURNING id, tenant_prefix, name, admin_emails, created_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&body.tenant_prefix)
    .bind(body.name.trim())
    .bind(to_json_list(&body.admin_emails))
    .fetch_one(&state.pool)
    .await?;
    tracing::info!(prefix = %row.tenant_prefix, "tenant created");
    Ok(response::created(row.into_dto()))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTenant {
    pub name: Option<String>,
    pub admin_emails: Option<Vec<String>>,
}

pub async fn update_tenant(
    State(state): State<AppState>,
    _admin: GlobalAdmin,
    Path(path): Path<IdPath>,
    Json(body): Json<UpdateTenant>,
) -> Result<(StatusCode, Json<SuccessData<TenantDto>>), AppError> {
    if let Some(ref emails) = body.admin_emails {
        for email in emails {
            validate_email("adminEmails", email)?;
        }
    }
    let current = sqlx::query_as::<_, TenantRow>(
        "SELECT id, tenant_prefix, name, admin_emails, created_at, updated_at FROM tenants WHERE id = $1",
    )
    .bind(path.id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("tenant {}", path.id)))?;

    let name = body
        .name
        .map(|n| n.trim().to_string())
        .unwrap_or_else(|| current.name.clone());
    if name.is_empty() {
        return Err(AppError::Validation("name is required".into()));
    }
    let admin_emails = body
        .admin_emails
        .map(|v| to_json_list(&v))
        .unwrap_or_else(|| current.admin_emails.clone());

    let row = sqlx::query_as::<_, TenantRow>(
        r#"
        UPDATE tenants SET name = $1, admin_emails = $2, updated_at = NOW()
        WHERE id = $3
        RETURNING id, tenant_prefix, name, admin_emails, created_at, updated_at
        "#,
    )
    .bind(name)
    .bind(admin_emails)
    .bind(path.id)
    .fetch_one(&state.pool)
    .await?;
    Ok(response::ok(row.into_dto()))
}

/// Tenants with users or contributions cannot be removed.
pub async fn delete_tenant(
    State(state): State<AppState>,
    _admin: GlobalAdmin,
    Path(path): Path<IdPath>,
) -> Result<(StatusCode, Json<SuccessMessage>), AppError> {
    let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM tenants WHERE id = $1")
        .bind(path.id)
        .fetch_optional(&state.pool)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound(format!("tenant {}", path.id)));
    }

    let dependents: Option<(Uuid,)> = sqlx::query_as(
        "SELECT id FROM users WHERE tenant_id = $1 UNION ALL SELECT id FROM contributions WHERE tenant_id = $1 LIMIT 1",
    )
    .bind(path.id)
    .fetch_optional(&state.pool)
    .await?;
    if dependents.is_some() {
        return Err(AppError::Conflict(
            "tenant has users or contributions and cannot be deleted".into(),
        ));
    }

    sqlx::query("DELETE FROM tenants WHERE id = $1")
        .bind(path.id)
        .execute(&state.pool)
        .await?;
    Ok(response::message("tenant deleted"))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossTenantParams {
    pub tenant_id: Option<String>,
    pub status: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

pub async fn list_users(
    State(state): State<AppState>,
    _admin: GlobalAdmin,
    Query(params): Query<CrossTenantParams>,
) -> Result<(StatusCode, Json<SuccessData<Vec<UserDto>>>), AppError> {
    let mut q = QueryBuf::new("SELECT * FROM users WHERE TRUE");
    if let Some(ref tid) = params.tenant_id {
        q.and_eq("tenant_id", parse_uuid("tenantId", tid)?);
    }
    if let Some(ref status) = params.status {
        let status: UserStatus = status.parse()?;
        q.and_eq("status", status.as_str());
    }
    q.push_sql(" ORDER BY created_at DESC");
    let (limit, offset) = page_window(params.limit, params.offset);
    q.limit_offset(limit, offset);
    let rows: Vec<UserRow> = q.fetch_all(&state.pool).await?;
    Ok(response::ok(rows.into_iter().map(UserRow::into_dto).collect()))
}

pub async fn list_contributions(
    State(state): State<AppState>,
    _admin: GlobalAdmin,
    Query(params): Query<CrossTenantParams>,
) -> Result<(StatusCode, Json<SuccessData<Vec<ContributionDto>>>), AppError> {
    let mut q = QueryBuf::new("SELECT * FROM contributions WHERE TRUE");
    if let Some(ref tid) = params.tenant_id {
        q.and_eq("tenant_id", parse_uuid("tenantId", tid)?);
    }
    if let Some(ref status) = params.status {
        let status: ContributionStatus = status.parse()?;
        q.and_eq("status", status.as_str());
    }
    q.push_sql(" ORDER BY created_at DESC");
    let (limit, offset) = page_window(params.limit, params.offset);
    q.limit_offset(limit, offset);
    let rows: Vec<ContributionRow> = q.fetch_all(&state.pool).await?;
    Ok(response::ok(
        rows.into_iter().map(ContributionRow::into_dto).collect(),
    ))
}

#[derive(Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TenantOverview {
    pub tenant_id: Uuid,
    pub tenant_prefix: String,
    pub name: String,
    pub user_count: i64,
    pub contribution_count: i64,
}

pub async fn overview(
    State(state): State<AppState>,
    _admin: GlobalAdmin,
) -> Result<(StatusCode, Json<SuccessData<Vec<TenantOverview>>>), AppError> {
    let rows = sqlx::query_as::<_, TenantOverview>(
        r#"
        SELECT t.id AS tenant_id,
               t.tenant_prefix,
               t.name,
               (SELECT COUNT(*) FROM users u WHERE u.tenant_id = t.id) AS user_count,
               (SELECT COUNT(*) FROM contributions c WHERE c.tenant_id = t.id) AS contribution_count
        FROM tenants t
        ORDER BY t.tenant_prefix
        "#,
    )
    .fetch_all(&state.pool)
    .await?;
    Ok(response::ok(rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_rules() {
        assert!(slug_re().is_match("acme"));
        assert!(slug_re().is_match("acme-east-2"));
        assert!(!slug_re().is_match("Acme"));
        assert!(!slug_re().is_match("-acme"));
        assert!(!slug_re().is_match(""));
        assert!(!slug_re().is_match("a b"));
    }
}
