//! Tenant resolution: header, path prefix, or configured default.
//!
//! Resolution fails open: an unknown slug or a lookup error falls back to the
//! default tenant rather than blocking the request. Health endpoints must
//! stay reachable even when the store is down.

use crate::error::AppError;
use crate::state::AppState;
use crate::store::find_tenant_by_prefix;
use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::request::Parts,
};
use uuid::Uuid;

/// Header carrying the tenant slug. Takes priority over the path prefix.
pub const TENANT_PREFIX_HEADER: &str = "x-tenant-prefix";

/// Tenant identity attached to a request.
#[derive(Clone, Debug)]
pub struct ResolvedTenant {
    pub tenant_id: Uuid,
    pub tenant_prefix: String,
}

/// Extract the slug from a `/t/:prefix/...` path, if present.
pub fn prefix_from_path(path: &str) -> Option<&str> {
    let rest = path.strip_prefix("/t/")?;
    let prefix = rest.split('/').next().unwrap_or("");
    if prefix.is_empty() {
        None
    } else {
        Some(prefix)
    }
}

fn requested_prefix(parts: &Parts, default: &str) -> String {
    if let Some(v) = parts
        .headers
        .get(TENANT_PREFIX_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        return v.to_string();
    }
    // Nested routers strip the matched prefix from `parts.uri`; the original
    // path lives in the OriginalUri extension.
    let path = parts
        .extensions
        .get::<OriginalUri>()
        .map(|u| u.path().to_string())
        .unwrap_or_else(|| parts.uri.path().to_string());
    if let Some(p) = prefix_from_path(&path) {
        return p.to_string();
    }
    default.to_string()
}

/// Resolve a slug to a tenant id. Unknown slugs and lookup errors fall back
/// to the default tenant; if even that lookup fails the nil id stands in so
/// the request still proceeds (queries against it simply match nothing).
pub async fn resolve_tenant(state: &AppState, requested: &str) -> ResolvedTenant {
    let default_prefix = state.config.default_tenant_prefix.clone();

    match find_tenant_by_prefix(&state.pool, requested).await {
        Ok(Some(t)) => {
            return ResolvedTenant {
                tenant_id: t.id,
                tenant_prefix: t.tenant_prefix,
            }
        }
        Ok(None) => {
            tracing::warn!(prefix = %requested, "unknown tenant prefix, using default");
        }
        Err(e) => {
            tracing::warn!(prefix = %requested, error = %e, "tenant lookup failed, using default");
        }
    }

    match find_tenant_by_prefix(&state.pool, &default_prefix).await {
        Ok(Some(t)) => ResolvedTenant {
            tenant_id: t.id,
            tenant_prefix: t.tenant_prefix,
        },
        _ => {
            tracing::warn!(prefix = %default_prefix, "default tenant unavailable");
            ResolvedTenant {
                tenant_id: Uuid::nil(),
                tenant_prefix: default_prefix,
            }
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for ResolvedTenant {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(existing) = parts.extensions.get::<ResolvedTenant>() {
            return Ok(existing.clone());
        }
        let requested = if state.config.multi_tenancy_enabled {
            requested_prefix(parts, &state.config.default_tenant_prefix)
        } else {
            state.config.default_tenant_prefix.clone()
        };
        let resolved = resolve_tenant(state, &requested).await;
        parts.extensions.insert(resolved.clone());
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_from_tenant_path() {
        assert_eq!(prefix_from_path("/t/acme/api/auth/login"), Some("acme"));
        assert_eq!(prefix_from_path("/t/acme"), Some("acme"));
        assert_eq!(prefix_from_path("/api/auth/login"), None);
        assert_eq!(prefix_from_path("/t/"), None);
        assert_eq!(prefix_from_path("/"), None);
    }
}
