//! Reporting endpoints. All aggregates are computed in-process from the
//! caller-visible row set; there is no separate reporting store.

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::models::{ContributionDto, ContributionRow, ContributionStatus};
use crate::report::{build_print_html, summarize, FieldSelection, ReportContext};
use crate::response::{self, SuccessData};
use crate::sql::QueryBuf;
use crate::state::AppState;
use crate::store::find_tenant_by_id;
use crate::validation::validate_month;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Html,
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportParams {
    pub status: Option<String>,
    pub contribution_month: Option<String>,
}

/// Rows visible to the caller: own rows for users, the whole tenant for
/// admins. Report row sets are not paginated.
async fn visible_rows(
    state: &AppState,
    auth: &AuthUser,
    params: &ReportParams,
) -> Result<Vec<ContributionDto>, AppError> {
    let mut q = QueryBuf::new("SELECT * FROM contributions WHERE tenant_id = $1");
    q.push_param(auth.tenant_id);
    if !auth.is_admin() {
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
    q.push_sql(" ORDER BY contribution_month, created_at");
    let rows: Vec<ContributionRow> = q.fetch_all(&state.pool).await?;
    Ok(rows.into_iter().map(ContributionRow::into_dto).collect())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub total: usize,
    pub by_impact: BTreeMap<String, usize>,
    pub by_status: BTreeMap<String, usize>,
    pub by_type: BTreeMap<String, usize>,
    pub distinct_users: usize,
    pub distinct_accounts: usize,
}

pub async fn dashboard(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<ReportParams>,
) -> Result<(StatusCode, Json<SuccessData<Dashboard>>), AppError> {
    let rows = visible_rows(&state, &auth, &params).await?;
    let summary = summarize(&rows);
    let mut by_type = BTreeMap::new();
    for row in &rows {
        *by_type
            .entry(row.contribution_type.as_str().to_string())
            .or_insert(0) += 1;
    }
    Ok(response::ok(Dashboard {
        total: summary.total,
        by_impact: summary.by_impact,
        by_status: summary.by_status,
        by_type,
        distinct_users: summary.distinct_users,
        distinct_accounts: summary.distinct_accounts,
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    pub month: String,
    pub count: usize,
}

pub async fn timeline(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<ReportParams>,
) -> Result<(StatusCode, Json<SuccessData<Vec<TimelineEntry>>>), AppError> {
    let rows = visible_rows(&state, &auth, &params).await?;
    let mut by_month: BTreeMap<String, usize> = BTreeMap::new();
    for row in &rows {
        *by_month.entry(row.contribution_month.clone()).or_insert(0) += 1;
    }
    let entries = by_month
        .into_iter()
        .map(|(month, count)| TimelineEntry { month, count })
        .collect();
    Ok(response::ok(entries))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comprehensive {
    pub summary: Dashboard,
    pub contributions: Vec<ContributionDto>,
}

pub async fn comprehensive(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<ReportParams>,
) -> Result<(StatusCode, Json<SuccessData<Comprehensive>>), AppError> {
    let rows = visible_rows(&state, &auth, &params).await?;
    let summary = summarize(&rows);
    let mut by_type = BTreeMap::new();
    for row in &rows {
        *by_type
            .entry(row.contribution_type.as_str().to_string())
            .or_insert(0) += 1;
    }
    Ok(response::ok(Comprehensive {
        summary: Dashboard {
            total: summary.total,
            by_impact: summary.by_impact,
            by_status: summary.by_status,
            by_type,
            distinct_users: summary.distinct_users,
            distinct_accounts: summary.distinct_accounts,
        },
        contributions: rows,
    }))
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    #[serde(default)]
    pub fields: FieldSelection,
    pub status: Option<String>,
    pub contribution_month: Option<String>,
}

/// Print-ready HTML for client-side printing.
pub async fn export(
    State(state): State<AppState>,
    auth: AuthUser,
    body: Option<Json<ExportRequest>>,
) -> Result<Html<String>, AppError> {
    let req = body.map(|Json(b)| b).unwrap_or_default();
    let params = ReportParams {
        status: req.status,
        contribution_month: req.contribution_month,
    };
    let rows = visible_rows(&state, &auth, &params).await?;

    let tenant_name = match find_tenant_by_id(&state.pool, auth.tenant_id).await? {
        Some(t) => t.name,
        None => auth.tenant_prefix.clone(),
    };
    let ctx = ReportContext {
        tenant_name,
        generated_for: auth.user.full_name.clone(),
    };
    Ok(Html(build_print_html(&rows, &req.fields, &ctx)))
}
