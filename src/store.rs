//! Schema bootstrap and tenant lookups.
//!
//! No versioned migrations: idempotent CREATE TABLE IF NOT EXISTS plus
//! ADD COLUMN IF NOT EXISTS follow-ups for columns added after first release.
//! Bootstrap failure is non-fatal — the caller marks the process degraded and
//! keeps serving health checks.

use crate::config::Config;
use crate::error::AppError;
use crate::models::{to_json_list, TenantRow};
use sqlx::PgPool;
use uuid::Uuid;

const TENANTS_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS tenants (
    id UUID PRIMARY KEY,
    tenant_prefix TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    admin_emails TEXT NOT NULL DEFAULT '[]',
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

const USERS_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id UUID PRIMARY KEY,
    tenant_id UUID NOT NULL REFERENCES tenants(id),
    full_name TEXT NOT NULL,
    staff_id TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    involved_account_names TEXT NOT NULL DEFAULT '[]',
    involved_sale_names TEXT NOT NULL DEFAULT '[]',
    involved_sale_emails TEXT NOT NULL DEFAULT '[]',
    role TEXT NOT NULL DEFAULT 'user',
    status TEXT NOT NULL DEFAULT 'pending',
    can_view_others BOOLEAN NOT NULL DEFAULT FALSE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

const CONTRIBUTIONS_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS contributions (
    id UUID PRIMARY KEY,
    tenant_id UUID NOT NULL REFERENCES tenants(id),
    user_id UUID NOT NULL REFERENCES users(id),
    account_name TEXT NOT NULL,
    sale_name TEXT NOT NULL,
    sale_email TEXT,
    contribution_type TEXT NOT NULL DEFAULT 'other',
    title TEXT NOT NULL,
    description TEXT,
    impact TEXT NOT NULL DEFAULT 'low',
    effort TEXT NOT NULL DEFAULT 'low',
    estimated_impact_value DOUBLE PRECISION,
    contribution_month TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'draft',
    tags TEXT NOT NULL DEFAULT '[]',
    attachments TEXT NOT NULL DEFAULT '[]',
    sale_approval BOOLEAN NOT NULL DEFAULT FALSE,
    sale_approval_date TIMESTAMPTZ,
    sale_approval_notes TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

/// Columns added after first release. Safe to re-run.
const ALTERS: &[&str] = &[
    "ALTER TABLE users ADD COLUMN IF NOT EXISTS involved_sale_emails TEXT NOT NULL DEFAULT '[]'",
    "ALTER TABLE users ADD COLUMN IF NOT EXISTS can_view_others BOOLEAN NOT NULL DEFAULT FALSE",
    "ALTER TABLE contributions ADD COLUMN IF NOT EXISTS sale_approval BOOLEAN NOT NULL DEFAULT FALSE",
    "ALTER TABLE contributions ADD COLUMN IF NOT EXISTS sale_approval_date TIMESTAMPTZ",
    "ALTER TABLE contributions ADD COLUMN IF NOT EXISTS sale_approval_notes TEXT",
    "ALTER TABLE contributions ADD COLUMN IF NOT EXISTS attachments TEXT NOT NULL DEFAULT '[]'",
];

const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_users_tenant ON users (tenant_id)",
    "CREATE INDEX IF NOT EXISTS idx_contributions_tenant ON contributions (tenant_id)",
    "CREATE INDEX IF NOT EXISTS idx_contributions_user ON contributions (user_id)",
    "CREATE INDEX IF NOT EXISTS idx_contributions_month ON contributions (contribution_month)",
];

/// Create tables and indexes, run column follow-ups, seed the default tenant
/// and bootstrap admin. Re-running leaves the schema unchanged.
pub async fn ensure_schema(pool: &PgPool, config: &Config) -> Result<(), AppError> {
    for ddl in [TENANTS_DDL, USERS_DDL, CONTRIBUTIONS_DDL] {
        sqlx::query(ddl).execute(pool).await?;
    }
    // IF NOT EXISTS makes re-runs a no-op, so any error here is real
    // (permissions, locks). Still non-fatal for the bootstrap as a whole.
    for &alter in ALTERS {
        if let Err(e) = sqlx::query(alter).execute(pool).await {
            tracing::warn!(error = %e, statement = alter, "column follow-up failed");
        }
    }
    for &idx in INDEXES {
        if let Err(e) = sqlx::query(idx).execute(pool).await {
            tracing::warn!(error = %e, statement = idx, "index creation failed");
        }
    }
    seed_defaults(pool, config).await?;
    Ok(())
}

/// Insert the default tenant and the bootstrap admin if absent. Both inserts
/// run in one transaction so a half-seeded install cannot occur.
async fn seed_defaults(pool: &PgPool, config: &Config) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;

    let existing: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM tenants WHERE tenant_prefix = $1")
            .bind(&config.default_tenant_prefix)
            .fetch_optional(&mut *tx)
            .await?;
    let tenant_id = match existing {
        Some((id,)) => id,
        None => {
            let id = Uuid::new_v4();
            sqlx::query(
                "INSERT INTO tenants (id, tenant_prefix, name, admin_emails) VALUES ($1, $2, $3, $4)",
            )
            .bind(id)
            .bind(&config.default_tenant_prefix)
            .bind("Default")
            .bind(to_json_list(&[config.bootstrap_admin_email.clone()]))
            .execute(&mut *tx)
            .await?;
            tracing::info!(prefix = %config.default_tenant_prefix, "created default tenant");
            id
        }
    };

    let admin_exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
        .bind(&config.bootstrap_admin_email)
        .fetch_optional(&mut *tx)
        .await?;
    if admin_exists.is_none() {
        let hash = crate::auth::hash_password(&config.bootstrap_admin_password)?;
        sqlx::query(
            r#"
            INSERT INTO users (id, tenant_id, full_name, staff_id, email, password_hash, role, status, can_view_others)
            VALUES ($1, $2, 'Administrator', 'ADMIN-0001', $3, $4, 'admin', 'approved', TRUE)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(tenant_id)
        .bind(&config.bootstrap_admin_email)
        .bind(&hash)
        .execute(&mut *tx)
        .await?;
        tracing::info!(email = %config.bootstrap_admin_email, "created bootstrap admin");
    }

    tx.commit().await?;
    Ok(())
}

pub async fn find_tenant_by_prefix(
    pool: &PgPool,
    prefix: &str,
) -> Result<Option<TenantRow>, AppError> {
    let row = sqlx::query_as::<_, TenantRow>(
        "SELECT id, tenant_prefix, name, admin_emails, created_at, updated_at FROM tenants WHERE tenant_prefix = $1",
    )
    .bind(prefix)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn find_tenant_by_id(pool: &PgPool, id: Uuid) -> Result<Option<TenantRow>, AppError> {
    let row = sqlx::query_as::<_, TenantRow>(
        "SELECT id, tenant_prefix, name, admin_emails, created_at, updated_at FROM tenants WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}
