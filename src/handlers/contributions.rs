//! Contribution CRUD plus the submit/approve/reject lifecycle.
//!
//! Non-admin callers only ever see and touch their own rows; admins operate
//! across the whole tenant. Cross-tenant rows are invisible either way.

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::handlers::{page_window, parse_uuid, IdPath};
use crate::models::{
    to_json_list, ContributionDto, ContributionRow, ContributionStatus, ContributionType, Effort,
    Impact, UserRow,
};
use crate::response::{self, SuccessData, SuccessMessage};
use crate::sql::QueryBuf;
use crate::state::AppState;
use crate::validation::{require_non_empty, validate_max_length, validate_month};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub status: Option<String>,
    pub user_id: Option<String>,
    pub contribution_month: Option<String>,
    pub account_name: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// The created contribution must reference an account and sale the caller is
/// actually involved with.
fn ensure_involved(user: &UserRow, account_name: &str, sale_name: &str) -> Result<(), AppError> {
    if !user
        .involved_account_names()
        .iter()
        .any(|a| a == account_name)
    {
        return Err(AppError::Validation(format!(
            "accountName '{}' is not in your involved accounts",
            account_name
        )));
    }
    if !user.involved_sale_names().iter().any(|s| s == sale_name) {
        return Err(AppError::Validation(format!(
            "saleName '{}' is not in your involved sales",
            sale_name
        )));
    }
    Ok(())
}

async fn contribution_in_tenant(
    state: &AppState,
    tenant_id: Uuid,
    id: Uuid,
) -> Result<ContributionRow, AppError> {
    sqlx::query_as::<_, ContributionRow>(
        "SELECT * FROM contributions WHERE tenant_id = $1 AND id = $2",
    )
    .bind(tenant_id)
    .bind(id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("contribution {}", id)))
}

pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<ListParams>,
) -> Result<(StatusCode, Json<SuccessData<Vec<ContributionDto>>>), AppError> {
    let mut q = QueryBuf::new("SELECT * FROM contributions WHERE tenant_id = $1");
    q.push_param(auth.tenant_id);

    if auth.is_admin() {
        if let Some(ref uid) = params.user_id {
            q.and_eq("user_id", parse_uuid("userId", uid)?);
        }
    } else {
        // Non-admins are pinned to their own rows regardless of the filter.
        q.and_eq("user_id", auth.user.id);
    }
    if let Some(ref status) = params.status {
        let status: ContributionStatus = status.parse()?;
        q.and_eq("status", status.as_str());
    }
    if let Some(ref month) = params.contribution_month {
        validate_month("contributionMonth", month)?;
        q.and_eq("contribution_month", month.as_str());
    }
    if let Some(ref account) = params.account_name {
        q.and_eq("account_name", account.as_str());
    }

    q.push_sql(" ORDER BY created_at DESC");
    let (limit, offset) = page_window(params.limit, params.offset);
    q.limit_offset(limit, offset);

    let rows: Vec<ContributionRow> = q.fetch_all(&state.pool).await?;
    Ok(response::ok(
        rows.into_iter().map(ContributionRow::into_dto).collect(),
    ))
}

pub async fn get(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(path): Path<IdPath>,
) -> Result<(StatusCode, Json<SuccessData<ContributionDto>>), AppError> {
    let row = contribution_in_tenant(&state, auth.tenant_id, path.id).await?;
    if !auth.is_admin() && row.user_id != auth.user.id {
        return Err(AppError::Forbidden("not your contribution"));
    }
    Ok(response::ok(row.into_dto()))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateContribution {
    pub account_name: String,
    pub sale_name: String,
    pub sale_email: Option<String>,
    pub contribution_type: ContributionType,
    pub title: String,
    pub description: Option<String>,
    pub impact: Impact,
    pub effort: Effort,
    pub estimated_impact_value: Option<f64>,
    pub contribution_month: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub attachments: Vec<String>,
}

pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CreateContribution>,
) -> Result<(StatusCode, Json<SuccessData<ContributionDto>>), AppError> {
    require_non_empty("title", &body.title)?;
    validate_max_length("title", &body.title, 300)?;
    require_non_empty("accountName", &body.account_name)?;
    require_non_empty("saleName", &body.sale_name)?;
    validate_month("contributionMonth", &body.contribution_month)?;
    ensure_involved(&auth.user, &body.account_name, &body.sale_name)?;

    let row = sqlx::query_as::<_, ContributionRow>(
        r#"
        INSERT INTO contributions (id, tenant_id, user_id, account_name, sale_name, sale_email,
                                   contribution_type, title, description, impact, effort,
                                   estimated_impact_value, contribution_month, status, tags, attachments)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, 'draft', $14, $15)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(auth.tenant_id)
    .bind(auth.user.id)
    .bind(&body.account_name)
    .bind(&body.sale_name)
    .bind(&body.sale_email)
    .bind(body.contribution_type.as_str())
    .bind(body.title.trim())
    .bind(&body.description)
    .bind(body.impact.as_str())
    .bind(body.effort.as_str())
    .bind(body.estimated_impact_value)
    .bind(&body.contribution_month)
    .bind(to_json_list(&body.tags))
    .bind(to_json_list(&body.attachments))
    .fetch_one(&state.pool)
    .await?;

    Ok(response::created(row.into_dto()))
}

/// Partial update: absent fields keep their stored values. Nullable columns
/// (saleEmail, description, estimatedImpactValue) cannot be cleared back to
/// null through this endpoint.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateContribution {
    pub account_name: Option<String>,
    pub sale_name: Option<String>,
    pub sale_email: Option<String>,
    pub contribution_type: Option<ContributionType>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub impact: Option<Impact>,
    pub effort: Option<Effort>,
    pub estimated_impact_value: Option<f64>,
    pub contribution_month: Option<String>,
    pub tags: Option<Vec<String>>,
    pub attachments: Option<Vec<String>>,
}

pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(path): Path<IdPath>,
    Json(body): Json<UpdateContribution>,
) -> Result<(StatusCode, Json<SuccessData<ContributionDto>>), AppError> {
    let current = contribution_in_tenant(&state, auth.tenant_id, path.id).await?;

    let is_owner = current.user_id == auth.user.id;
    if !auth.is_admin() {
        if !is_owner {
            return Err(AppError::Forbidden("not your contribution"));
        }
        if current.status() != ContributionStatus::Draft {
            return Err(AppError::BadRequest(
                "only draft contributions can be edited".into(),
            ));
        }
    }

    if let Some(ref title) = body.title {
        require_non_empty("title", title)?;
        validate_max_length("title", title, 300)?;
    }
    if let Some(ref month) = body.contribution_month {
        validate_month("contributionMonth", month)?;
    }
    let account_name = body.account_name.unwrap_or_else(|| current.account_name.clone());
    let sale_name = body.sale_name.unwrap_or_else(|| current.sale_name.clone());
    if is_owner && !auth.is_admin() {
        ensure_involved(&auth.user, &account_name, &sale_name)?;
    }

    let title = body.title.map(|t| t.trim().to_string()).unwrap_or_else(|| current.title.clone());
    let sale_email = body.sale_email.or_else(|| current.sale_email.clone());
    let contribution_type = body
        .contribution_type
        .map(|t| t.as_str().to_string())
        .unwrap_or_else(|| current.contribution_type.clone());
    let description = body.description.or_else(|| current.description.clone());
    let impact = body
        .impact
        .map(|i| i.as_str().to_string())
        .unwrap_or_else(|| current.impact.clone());
    let effort = body
        .effort
        .map(|e| e.as_str().to_string())
        .unwrap_or_else(|| current.effort.clone());
    let estimated_impact_value = body.estimated_impact_value.or(current.estimated_impact_value);
    let contribution_month = body
        .contribution_month
        .unwrap_or_else(|| current.contribution_month.clone());
    let tags = body
        .tags
        .map(|v| to_json_list(&v))
        .unwrap_or_else(|| current.tags.clone());
    let attachments = body
        .attachments
        .map(|v| to_json_list(&v))
        .unwrap_or_else(|| current.attachments.clone());

    let row = sqlx::query_as::<_, ContributionRow>(
        r#"
        UPDATE contributions
        SET account_name = $1, sale_name = $2, sale_email = $3, contribution_type = $4,
            title = $5, description = $6, impact = $7, effort = $8,
            estimated_impact_value = $9, contribution_month = $10, tags = $11,
            attachments = $12, updated_at = NOW()
        WHERE tenant_id = $13 AND id = $14
        RETURNING *
        "#,
    )
    .bind(account_name)
    .bind(sale_name)
    .bind(sale_email)
    .bind(contribution_type)
    .bind(title)
    .bind(description)
    .bind(impact)
    .bind(effort)
    .bind(estimated_impact_value)
    .bind(contribution_month)
    .bind(tags)
    .bind(attachments)
    .bind(auth.tenant_id)
    .bind(path.id)
    .fetch_one(&state.pool)
    .await?;

    Ok(response::ok(row.into_dto()))
}

/// Admins delete anything; owners only their own drafts.
fn ensure_deletable(auth: &AuthUser, row: &ContributionRow) -> Result<(), AppError> {
    if auth.is_admin() {
        return Ok(());
    }
    if row.user_id != auth.user.id {
        return Err(AppError::Forbidden("not your contribution"));
    }
    if row.status() != ContributionStatus::Draft {
        return Err(AppError::BadRequest(
            "only draft contributions can be deleted".into(),
        ));
    }
    Ok(())
}

pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(path): Path<IdPath>,
) -> Result<(StatusCode, Json<SuccessMessage>), AppError> {
    let current = contribution_in_tenant(&state, auth.tenant_id, path.id).await?;
    ensure_deletable(&auth, &current)?;
    sqlx::query("DELETE FROM contributions WHERE tenant_id = $1 AND id = $2")
        .bind(auth.tenant_id)
        .bind(path.id)
        .execute(&state.pool)
        .await?;
    Ok(response::message("contribution deleted"))
}

/// Owner moves a draft to submitted. Any other starting state is a 400.
pub async fn submit(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(path): Path<IdPath>,
) -> Result<(StatusCode, Json<SuccessData<ContributionDto>>), AppError> {
    let current = contribution_in_tenant(&state, auth.tenant_id, path.id).await?;
    if current.user_id != auth.user.id {
        return Err(AppError::Forbidden("not your contribution"));
    }
    if current.status() != ContributionStatus::Draft {
        return Err(AppError::BadRequest(
            "only draft contributions can be submitted".into(),
        ));
    }
    let row = sqlx::query_as::<_, ContributionRow>(
        "UPDATE contributions SET status = 'submitted', updated_at = NOW() WHERE tenant_id = $1 AND id = $2 RETURNING *",
    )
    .bind(auth.tenant_id)
    .bind(path.id)
    .fetch_one(&state.pool)
    .await?;
    Ok(response::ok(row.into_dto()))
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DecisionBody {
    pub sale_approval_notes: Option<String>,
}

async fn decide(
    state: &AppState,
    auth: &AuthUser,
    id: Uuid,
    status: ContributionStatus,
    notes: Option<String>,
) -> Result<ContributionDto, AppError> {
    auth.require_admin()?;
    contribution_in_tenant(state, auth.tenant_id, id).await?;
    let approved = status == ContributionStatus::Approved;
    let row = sqlx::query_as::<_, ContributionRow>(
        r#"
        UPDATE contributions
        SET status = $1,
            sale_approval = $2,
            sale_approval_date = CASE WHEN $2 THEN NOW() ELSE sale_approval_date END,
            sale_approval_notes = COALESCE($3, sale_approval_notes),
            updated_at = NOW()
        WHERE tenant_id = $4 AND id = $5
        RETURNING *
        "#,
    )
    .bind(status.as_str())
    .bind(approved)
    .bind(notes)
    .bind(auth.tenant_id)
    .bind(id)
    .fetch_one(&state.pool)
    .await?;
    Ok(row.into_dto())
}

pub async fn approve(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(path): Path<IdPath>,
    body: Option<Json<DecisionBody>>,
) -> Result<(StatusCode, Json<SuccessData<ContributionDto>>), AppError> {
    let notes = body.and_then(|Json(b)| b.sale_approval_notes);
    let dto = decide(&state, &auth, path.id, ContributionStatus::Approved, notes).await?;
    Ok(response::ok(dto))
}

pub async fn reject(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(path): Path<IdPath>,
    body: Option<Json<DecisionBody>>,
) -> Result<(StatusCode, Json<SuccessData<ContributionDto>>), AppError> {
    let notes = body.and_then(|Json(b)| b.sale_approval_notes);
    let dto = decide(&state, &auth, path.id, ContributionStatus::Rejected, notes).await?;
    Ok(response::ok(dto))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user_with(accounts: &[&str], sales: &[&str]) -> UserRow {
        let now = Utc::now();
        UserRow {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            full_name: "Test".into(),
            staff_id: "S1".into(),
            email: "t@example.com".into(),
            password_hash: String::new(),
            involved_account_names: serde_json::to_string(accounts).unwrap(),
            involved_sale_names: serde_json::to_string(sales).unwrap(),
            involved_sale_emails: "[]".into(),
            role: "user".into(),
            status: "approved".into(),
            can_view_others: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn contribution_row(user_id: Uuid, status: &str) -> ContributionRow {
        let now = Utc::now();
        ContributionRow {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            user_id,
            account_name: "acme".into(),
            sale_name: "Jordan".into(),
            sale_email: None,
            contribution_type: "technical".into(),
            title: "Title".into(),
            description: None,
            impact: "low".into(),
            effort: "low".into(),
            estimated_impact_value: None,
            contribution_month: "2025-06".into(),
            status: status.into(),
            tags: "[]".into(),
            attachments: "[]".into(),
            sale_approval: false,
            sale_approval_date: None,
            sale_approval_notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn auth_for(user: UserRow) -> AuthUser {
        let tenant_id = user.tenant_id;
        AuthUser {
            user,
            tenant_id,
            tenant_prefix: "default".into(),
        }
    }

    #[test]
    fn involved_lists_gate_creation() {
        let user = user_with(&["acme"], &["Jordan"]);
        assert!(ensure_involved(&user, "acme", "Jordan").is_ok());
        assert!(ensure_involved(&user, "globex", "Jordan").is_err());
        assert!(ensure_involved(&user, "acme", "Riley").is_err());
    }

    #[test]
    fn malformed_involved_lists_reject_everything() {
        let mut user = user_with(&[], &[]);
        user.involved_account_names = "not json".into();
        assert!(ensure_involved(&user, "acme", "Jordan").is_err());
    }

    #[test]
    fn owners_delete_drafts_only() {
        let auth = auth_for(user_with(&[], &[]));
        let draft = contribution_row(auth.user.id, "draft");
        assert!(ensure_deletable(&auth, &draft).is_ok());

        let submitted = contribution_row(auth.user.id, "submitted");
        assert!(matches!(
            ensure_deletable(&auth, &submitted),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn non_owner_delete_is_forbidden() {
        let auth = auth_for(user_with(&[], &[]));
        let someone_elses = contribution_row(Uuid::new_v4(), "draft");
        assert!(matches!(
            ensure_deletable(&auth, &someone_elses),
            Err(AppError::Forbidden("not your contribution"))
        ));
    }

    #[test]
    fn admins_delete_unconditionally() {
        let mut admin = user_with(&[], &[]);
        admin.role = "admin".into();
        let auth = auth_for(admin);
        let approved = contribution_row(Uuid::new_v4(), "approved");
        assert!(ensure_deletable(&auth, &approved).is_ok());
    }
}
