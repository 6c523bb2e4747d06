//! Two credential domains: per-tenant user tokens and a separate global-admin
//! token audience. Both are HS256 over the shared secret; they never satisfy
//! each other's verifier because of the audience claim.

use crate::error::AppError;
use crate::models::{Role, UserRow};
use crate::state::AppState;
use crate::tenant::ResolvedTenant;
use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const TENANT_AUDIENCE: &str = "tenant";
pub const GLOBAL_ADMIN_AUDIENCE: &str = "global-admin";

const TENANT_TOKEN_TTL_SECS: i64 = 24 * 3600;
const GLOBAL_TOKEN_TTL_SECS: i64 = 12 * 3600;

#[derive(Debug, Serialize, Deserialize)]
pub struct TenantClaims {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub tenant_prefix: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GlobalClaims {
    pub global: bool,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

pub fn sign_tenant_token(
    secret: &str,
    user_id: Uuid,
    tenant_id: Uuid,
    tenant_prefix: &str,
) -> Result<String, AppError> {
    let now = Utc::now().timestamp();
    let claims = TenantClaims {
        user_id,
        tenant_id,
        tenant_prefix: tenant_prefix.to_string(),
        aud: TENANT_AUDIENCE.to_string(),
        iat: now,
        exp: now + TENANT_TOKEN_TTL_SECS,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("token signing: {}", e)))
}

pub fn sign_global_token(secret: &str) -> Result<String, AppError> {
    let now = Utc::now().timestamp();
    let claims = GlobalClaims {
        global: true,
        aud: GLOBAL_ADMIN_AUDIENCE.to_string(),
        iat: now,
        exp: now + GLOBAL_TOKEN_TTL_SECS,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("token signing: {}", e)))
}

fn decode_error(e: jsonwebtoken::errors::Error) -> AppError {
    match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
            AppError::Unauthorized("token expired")
        }
        _ => AppError::Unauthorized("invalid token"),
    }
}

pub fn verify_tenant_token(secret: &str, token: &str) -> Result<TenantClaims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[TENANT_AUDIENCE]);
    decode::<TenantClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|d| d.claims)
    .map_err(decode_error)
}

pub fn verify_global_token(secret: &str, token: &str) -> Result<GlobalClaims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[GLOBAL_ADMIN_AUDIENCE]);
    decode::<GlobalClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|d| d.claims)
    .map_err(decode_error)
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("bcrypt: {}", e)))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

/// Bearer token from the Authorization header.
fn bearer_token(parts: &Parts) -> Result<String, AppError> {
    let header = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::Unauthorized("access token required"))?;
    let token = header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .ok_or(AppError::Unauthorized("access token required"))?;
    Ok(token.trim().to_string())
}

/// Authenticated tenant user: verified token plus the freshly loaded user
/// row. A valid token whose user row is gone is rejected — deleting a user
/// revokes their tokens.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user: UserRow,
    pub tenant_id: Uuid,
    pub tenant_prefix: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.user.is_admin()
    }

    pub fn require_role(&self, roles: &[Role]) -> Result<(), AppError> {
        if roles.contains(&self.user.role()) {
            Ok(())
        } else {
            Err(AppError::Forbidden("insufficient role"))
        }
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        self.require_role(&[Role::Admin])
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let resolved = ResolvedTenant::from_request_parts(parts, state).await?;
        let token = bearer_token(parts)?;
        let claims = verify_tenant_token(&state.config.jwt_secret, &token)?;

        let user = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
            .bind(claims.user_id)
            .fetch_optional(&state.pool)
            .await?
            .ok_or(AppError::Unauthorized("user not found"))?;

        ensure_tenant_match(claims.tenant_id, resolved.tenant_id)?;

        Ok(AuthUser {
            user,
            tenant_id: claims.tenant_id,
            tenant_prefix: claims.tenant_prefix,
        })
    }
}

/// Authenticated global admin. No tenant scoping; authority spans tenants.
#[derive(Clone, Debug)]
pub struct GlobalAdmin;

#[async_trait]
impl FromRequestParts<AppState> for GlobalAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        verify_global_token(&state.config.jwt_secret, &token)?;
        Ok(GlobalAdmin)
    }
}

/// The token's tenant must be the tenant the request resolved to.
pub fn ensure_tenant_match(token_tenant: Uuid, resolved_tenant: Uuid) -> Result<(), AppError> {
    if token_tenant != resolved_tenant {
        return Err(AppError::Forbidden("tenant mismatch"));
    }
    Ok(())
}

/// Whether `caller` may view `target`'s profile: admin, self, or explicitly
/// granted cross-view with at least one shared account.
pub fn can_view_user(caller: &UserRow, target: &UserRow) -> bool {
    if caller.is_admin() || caller.id == target.id {
        return true;
    }
    if !caller.can_view_others {
        return false;
    }
    let theirs = target.involved_account_names();
    caller
        .involved_account_names()
        .iter()
        .any(|a| theirs.contains(a))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    const SECRET: &str = "test-secret";

    fn user(
        id: Uuid,
        role: &str,
        can_view_others: bool,
        accounts: &[&str],
    ) -> UserRow {
        let now: DateTime<Utc> = Utc::now();
        UserRow {
            id,
            tenant_id: Uuid::new_v4(),
            full_name: "Test".into(),
            staff_id: id.to_string(),
            email: format!("{}@example.com", id),
            password_hash: String::new(),
            involved_account_names: serde_json::to_string(accounts).unwrap(),
            involved_sale_names: "[]".into(),
            involved_sale_emails: "[]".into(),
            role: role.into(),
            status: "approved".into(),
            can_view_others,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn tenant_token_round_trip() {
        let user_id = Uuid::new_v4();
        let tenant_id = Uuid::new_v4();
        let token = sign_tenant_token(SECRET, user_id, tenant_id, "acme").unwrap();
        let claims = verify_tenant_token(SECRET, &token).unwrap();
        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.tenant_id, tenant_id);
        assert_eq!(claims.tenant_prefix, "acme");
        assert_eq!(claims.aud, TENANT_AUDIENCE);
    }

    #[test]
    fn global_token_round_trip() {
        let token = sign_global_token(SECRET).unwrap();
        let claims = verify_global_token(SECRET, &token).unwrap();
        assert!(claims.global);
    }

    #[test]
    fn audiences_do_not_cross() {
        let tenant_token =
            sign_tenant_token(SECRET, Uuid::new_v4(), Uuid::new_v4(), "acme").unwrap();
        assert!(verify_global_token(SECRET, &tenant_token).is_err());
        let global_token = sign_global_token(SECRET).unwrap();
        assert!(verify_tenant_token(SECRET, &global_token).is_err());
    }

    #[test]
    fn wrong_secret_rejected() {
        let token = sign_tenant_token(SECRET, Uuid::new_v4(), Uuid::new_v4(), "acme").unwrap();
        let err = verify_tenant_token("other-secret", &token).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized("invalid token")));
    }

    #[test]
    fn expired_token_rejected_with_reason() {
        let now = Utc::now().timestamp();
        let claims = TenantClaims {
            user_id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            tenant_prefix: "acme".into(),
            aud: TENANT_AUDIENCE.into(),
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        let err = verify_tenant_token(SECRET, &token).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized("token expired")));
    }

    #[test]
    fn cross_tenant_token_is_forbidden() {
        let tenant = Uuid::new_v4();
        assert!(ensure_tenant_match(tenant, tenant).is_ok());
        let err = ensure_tenant_match(tenant, Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, AppError::Forbidden("tenant mismatch")));
    }

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("s3cret").unwrap();
        assert!(verify_password("s3cret", &hash));
        assert!(!verify_password("wrong", &hash));
    }

    #[test]
    fn view_rules() {
        let a = user(Uuid::new_v4(), "user", false, &["acme"]);
        let b = user(Uuid::new_v4(), "user", false, &["acme"]);
        let admin = user(Uuid::new_v4(), "admin", false, &[]);
        let viewer = user(Uuid::new_v4(), "user", true, &["acme", "globex"]);
        let outsider = user(Uuid::new_v4(), "user", true, &["initech"]);

        assert!(can_view_user(&a, &a), "self");
        assert!(can_view_user(&admin, &b), "admin");
        assert!(!can_view_user(&a, &b), "no grant");
        assert!(can_view_user(&viewer, &b), "grant plus shared account");
        assert!(!can_view_user(&outsider, &b), "grant but no shared account");
    }
}
