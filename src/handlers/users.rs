//! Tenant user management.

use crate::auth::{can_view_user, AuthUser};
use crate::error::AppError;
use crate::handlers::auth::user_in_tenant;
use crate::handlers::IdPath;
use crate::models::{to_json_list, Role, UserDto, UserRow, UserStatus};
use crate::response::{self, SuccessData, SuccessMessage};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<(StatusCode, Json<SuccessData<Vec<UserDto>>>), AppError> {
    auth.require_admin()?;
    let rows = sqlx::query_as::<_, UserRow>(
        "SELECT * FROM users WHERE tenant_id = $1 ORDER BY full_name",
    )
    .bind(auth.tenant_id)
    .fetch_all(&state.pool)
    .await?;
    Ok(response::ok(rows.into_iter().map(UserRow::into_dto).collect()))
}

pub async fn get(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(path): Path<IdPath>,
) -> Result<(StatusCode, Json<SuccessData<UserDto>>), AppError> {
    let target = user_in_tenant(&state, auth.tenant_id, path.id).await?;
    if !can_view_user(&auth.user, &target) {
        return Err(AppError::Forbidden("cross-account view denied"));
    }
    Ok(response::ok(target.into_dto()))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    pub full_name: Option<String>,
    pub involved_account_names: Option<Vec<String>>,
    pub involved_sale_names: Option<Vec<String>>,
    pub involved_sale_emails: Option<Vec<String>>,
    // Admin-only fields.
    pub role: Option<Role>,
    pub status: Option<UserStatus>,
    pub can_view_others: Option<bool>,
}

pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(path): Path<IdPath>,
    Json(body): Json<UserUpdate>,
) -> Result<(StatusCode, Json<SuccessData<UserDto>>), AppError> {
    let is_self = auth.user.id == path.id;
    if !is_self && !auth.is_admin() {
        return Err(AppError::Forbidden("insufficient role"));
    }
    let touches_admin_fields =
        body.role.is_some() || body.status.is_some() || body.can_view_others.is_some();
    if touches_admin_fields && !auth.is_admin() {
        return Err(AppError::Forbidden("insufficient role"));
    }

    let current = user_in_tenant(&state, auth.tenant_id, path.id).await?;
    let full_name = body
        .full_name
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| current.full_name.clone());
    let accounts = body
        .involved_account_names
        .map(|v| to_json_list(&v))
        .unwrap_or_else(|| current.involved_account_names.clone());
    let sales = body
        .involved_sale_names
        .map(|v| to_json_list(&v))
        .unwrap_or_else(|| current.involved_sale_names.clone());
    let sale_emails = body
        .involved_sale_emails
        .map(|v| to_json_list(&v))
        .unwrap_or_else(|| current.involved_sale_emails.clone());
    let role = body
        .role
        .map(|r| r.as_str().to_string())
        .unwrap_or_else(|| current.role.clone());
    let status = body
        .status
        .map(|s| s.as_str().to_string())
        .unwrap_or_else(|| current.status.clone());
    let can_view_others = body.can_view_others.unwrap_or(current.can_view_others);

    let row = sqlx::query_as::<_, UserRow>(
        r#"
        UPDATE users
        SET full_name = $1,
            involved_account_names = $2,
            involved_sale_names = $3,
            involved_sale_emails = $4,
            role = $5,
            status = $6,
            can_view_others = $7,
            updated_at = NOW()
        WHERE tenant_id = $8 AND id = $9
        RETURNING *
        "#,
    )
    .bind(full_name)
    .bind(accounts)
    .bind(sales)
    .bind(sale_emails)
    .bind(role)
    .bind(status)
    .bind(can_view_others)
    .bind(auth.tenant_id)
    .bind(path.id)
    .fetch_one(&state.pool)
    .await?;
    Ok(response::ok(row.into_dto()))
}

pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(path): Path<IdPath>,
) -> Result<(StatusCode, Json<SuccessMessage>), AppError> {
    auth.require_admin()?;
    user_in_tenant(&state, auth.tenant_id, path.id).await?;

    let dependents: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM contributions WHERE user_id = $1 LIMIT 1")
            .bind(path.id)
            .fetch_optional(&state.pool)
            .await?;
    if dependents.is_some() {
        return Err(AppError::Conflict(
            "user has contributions; reassign or delete them first".into(),
        ));
    }

    sqlx::query("DELETE FROM users WHERE tenant_id = $1 AND id = $2")
        .bind(auth.tenant_id)
        .bind(path.id)
        .execute(&state.pool)
        .await?;
    Ok(response::message("user deleted"))
}
