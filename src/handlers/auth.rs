//! Tenant auth endpoints: signup, login, profile, password, user approval.

use crate::auth::{hash_password, sign_tenant_token, verify_password, AuthUser};
use crate::error::AppError;
use crate::handlers::IdPath;
use crate::models::{to_json_list, UserDto, UserRow, UserStatus};
use crate::notify;
use crate::response::{self, SuccessData, SuccessMessage};
use crate::state::AppState;
use crate::store::find_tenant_by_id;
use crate::tenant::ResolvedTenant;
use crate::validation::{require_non_empty, validate_email, validate_max_length};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub full_name: String,
    pub staff_id: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub involved_account_names: Vec<String>,
    #[serde(default)]
    pub involved_sale_names: Vec<String>,
    #[serde(default)]
    pub involved_sale_emails: Vec<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub user: UserDto,
}

async fn user_by_email(
    state: &AppState,
    tenant_id: Uuid,
    email: &str,
) -> Result<Option<UserRow>, AppError> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT * FROM users WHERE tenant_id = $1 AND email = $2",
    )
    .bind(tenant_id)
    .bind(email)
    .fetch_optional(&state.pool)
    .await?;
    Ok(row)
}

pub(crate) async fn user_in_tenant(
    state: &AppState,
    tenant_id: Uuid,
    id: Uuid,
) -> Result<UserRow, AppError> {
    sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE tenant_id = $1 AND id = $2")
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {}", id)))
}

/// New accounts land in `pending` and stay invisible to login until an admin
/// approves them.
pub async fn signup(
    State(state): State<AppState>,
    tenant: ResolvedTenant,
    Json(body): Json<SignupRequest>,
) -> Result<(StatusCode, Json<SuccessData<UserDto>>), AppError> {
    require_non_empty("fullName", &body.full_name)?;
    require_non_empty("staffId", &body.staff_id)?;
    validate_email("email", &body.email)?;
    validate_max_length("fullName", &body.full_name, 200)?;
    if body.password.len() < 8 {
        return Err(AppError::Validation(
            "password must be at least 8 characters".into(),
        ));
    }

    let taken: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM users WHERE email = $1 OR staff_id = $2")
            .bind(&body.email)
            .bind(&body.staff_id)
            .fetch_optional(&state.pool)
            .await?;
    if taken.is_some() {
        return Err(AppError::Conflict(
            "email or staff id already registered".into(),
        ));
    }

    let hash = hash_password(&body.password)?;
    let row = sqlx::query_as::<_, UserRow>(
        r#"
        INSERT INTO users (id, tenant_id, full_name, staff_id, email, password_hash,
                           involved_account_names, involved_sale_names, involved_sale_emails,
                           role, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'user', 'pending')
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(tenant.tenant_id)
    .bind(body.full_name.trim())
    .bind(body.staff_id.trim())
    .bind(&body.email)
    .bind(&hash)
    .bind(to_json_list(&body.involved_account_names))
    .bind(to_json_list(&body.involved_sale_names))
    .bind(to_json_list(&body.involved_sale_emails))
    .fetch_one(&state.pool)
    .await?;

    if let Ok(Some(t)) = find_tenant_by_id(&state.pool, tenant.tenant_id).await {
        notify::signup_received(&state.config, &t.into_dto().admin_emails, &row.email);
    }

    Ok(response::created(row.into_dto()))
}

/// Signups stay invisible to login until an admin approves them.
fn ensure_login_allowed(user: &UserRow) -> Result<(), AppError> {
    if user.status() != UserStatus::Approved {
        return Err(AppError::Forbidden("account not approved"));
    }
    Ok(())
}

pub async fn login(
    State(state): State<AppState>,
    tenant: ResolvedTenant,
    Json(body): Json<LoginRequest>,
) -> Result<(StatusCode, Json<SuccessData<LoginResponse>>), AppError> {
    let user = user_by_email(&state, tenant.tenant_id, &body.email)
        .await?
        .ok_or(AppError::Unauthorized("invalid credentials"))?;

    if !verify_password(&body.password, &user.password_hash) {
        return Err(AppError::Unauthorized("invalid credentials"));
    }
    ensure_login_allowed(&user)?;

    let token = sign_tenant_token(
        &state.config.jwt_secret,
        user.id,
        tenant.tenant_id,
        &tenant.tenant_prefix,
    )?;
    Ok(response::ok(LoginResponse {
        token,
        user: user.into_dto(),
    }))
}

pub async fn profile(
    auth: AuthUser,
) -> Result<(StatusCode, Json<SuccessData<UserDto>>), AppError> {
    Ok(response::ok(auth.user.into_dto()))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub involved_account_names: Option<Vec<String>>,
    pub involved_sale_names: Option<Vec<String>>,
    pub involved_sale_emails: Option<Vec<String>>,
}

pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<ProfileUpdate>,
) -> Result<(StatusCode, Json<SuccessData<UserDto>>), AppError> {
    if let Some(ref name) = body.full_name {
        require_non_empty("fullName", name)?;
        validate_max_length("fullName", name, 200)?;
    }
    let current = auth.user;
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

    let row = sqlx::query_as::<_, UserRow>(
        r#"
        UPDATE users
        SET full_name = $1,
            involved_account_names = $2,
            involved_sale_names = $3,
            involved_sale_emails = $4,
            updated_at = NOW()
        WHERE id = $5
        RETURNING *
        "#,
    )
    .bind(full_name)
    .bind(accounts)
    .bind(sales)
    .bind(sale_emails)
    .bind(current.id)
    .fetch_one(&state.pool)
    .await?;
    Ok(response::ok(row.into_dto()))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePassword {
    pub current_password: String,
    pub new_password: String,
}

pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<ChangePassword>,
) -> Result<(StatusCode, Json<SuccessMessage>), AppError> {
    if !verify_password(&body.current_password, &auth.user.password_hash) {
        return Err(AppError::Unauthorized("invalid credentials"));
    }
    if body.new_password.len() < 8 {
        return Err(AppError::Validation(
            "password must be at least 8 characters".into(),
        ));
    }
    let hash = hash_password(&body.new_password)?;
    sqlx::query("UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2")
        .bind(&hash)
        .bind(auth.user.id)
        .execute(&state.pool)
        .await?;
    Ok(response::message("password updated"))
}

pub async fn pending_users(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<(StatusCode, Json<SuccessData<Vec<UserDto>>>), AppError> {
    auth.require_admin()?;
    let rows = sqlx::query_as::<_, UserRow>(
        "SELECT * FROM users WHERE tenant_id = $1 AND status = 'pending' ORDER BY created_at",
    )
    .bind(auth.tenant_id)
    .fetch_all(&state.pool)
    .await?;
    Ok(response::ok(rows.into_iter().map(UserRow::into_dto).collect()))
}

async fn decide_user(
    state: &AppState,
    auth: &AuthUser,
    id: Uuid,
    status: UserStatus,
) -> Result<UserDto, AppError> {
    auth.require_admin()?;
    // Scoped lookup first so a cross-tenant id reads as missing, not forbidden.
    user_in_tenant(state, auth.tenant_id, id).await?;
    let row = sqlx::query_as::<_, UserRow>(
        "UPDATE users SET status = $1, updated_at = NOW() WHERE tenant_id = $2 AND id = $3 RETURNING *",
    )
    .bind(status.as_str())
    .bind(auth.tenant_id)
    .bind(id)
    .fetch_one(&state.pool)
    .await?;
    notify::account_decision(&state.config, &row.email, status == UserStatus::Approved);
    Ok(row.into_dto())
}

pub async fn approve_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(path): Path<IdPath>,
) -> Result<(StatusCode, Json<SuccessData<UserDto>>), AppError> {
    let dto = decide_user(&state, &auth, path.id, UserStatus::Approved).await?;
    Ok(response::ok(dto))
}

pub async fn reject_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(path): Path<IdPath>,
) -> Result<(StatusCode, Json<SuccessData<UserDto>>), AppError> {
    let dto = decide_user(&state, &auth, path.id, UserStatus::Rejected).await?;
    Ok(response::ok(dto))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user_with_status(status: &str) -> UserRow {
        let now = Utc::now();
        UserRow {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            full_name: "Test".into(),
            staff_id: "S1".into(),
            email: "t@example.com".into(),
            password_hash: String::new(),
            involved_account_names: "[]".into(),
            involved_sale_names: "[]".into(),
            involved_sale_emails: "[]".into(),
            role: "user".into(),
            status: status.into(),
            can_view_others: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn only_approved_accounts_log_in() {
        assert!(ensure_login_allowed(&user_with_status("approved")).is_ok());
        for status in ["pending", "rejected"] {
            let err = ensure_login_allowed(&user_with_status(status)).unwrap_err();
            assert!(matches!(err, AppError::Forbidden("account not approved")));
        }
    }
}
