//! Environment-driven configuration, loaded once at startup.

use crate::error::AppError;

/// Optional SMTP settings. Accepted for completeness; notification delivery
/// falls back to log lines when absent (or always, in this build).
#[derive(Clone, Debug, Default)]
pub struct SmtpConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: Option<String>,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Shared secret for tenant user tokens and the global-admin signer.
    pub jwt_secret: String,
    /// Fixed global-admin credential pair; not stored in the users table.
    pub global_admin_email: String,
    pub global_admin_password: String,
    /// When false, tenant resolution short-circuits to the default tenant.
    pub multi_tenancy_enabled: bool,
    pub default_tenant_prefix: String,
    pub bootstrap_admin_email: String,
    pub bootstrap_admin_password: String,
    pub smtp: SmtpConfig,
}

fn var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

impl Config {
    /// Read from environment. DATABASE_URL and JWT_SECRET are required;
    /// everything else has a development default.
    pub fn from_env() -> Result<Self, AppError> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| AppError::Internal("DATABASE_URL is not set".into()))?;
        let jwt_secret = std::env::var("JWT_SECRET")
            .map_err(|_| AppError::Internal("JWT_SECRET is not set".into()))?;
        let port = var_or("PORT", "3001")
            .parse()
            .map_err(|_| AppError::Internal("PORT must be a number".into()))?;
        let multi_tenancy_enabled = var_or("MULTI_TENANCY_ENABLED", "true")
            .eq_ignore_ascii_case("true");

        Ok(Config {
            database_url,
            port,
            jwt_secret,
            global_admin_email: var_or("GLOBAL_ADMIN_EMAIL", "global-admin@example.com"),
            global_admin_password: var_or("GLOBAL_ADMIN_PASSWORD", "change-me"),
            multi_tenancy_enabled,
            default_tenant_prefix: var_or("DEFAULT_TENANT_PREFIX", "default"),
            bootstrap_admin_email: var_or("BOOTSTRAP_ADMIN_EMAIL", "admin@example.com"),
            bootstrap_admin_password: var_or("BOOTSTRAP_ADMIN_PASSWORD", "admin123"),
            smtp: SmtpConfig {
                host: std::env::var("SMTP_HOST").ok(),
                port: std::env::var("SMTP_PORT").ok().and_then(|p| p.parse().ok()),
                username: std::env::var("SMTP_USER").ok(),
                password: std::env::var("SMTP_PASSWORD").ok(),
                from: std::env::var("SMTP_FROM").ok(),
            },
        })
    }
}
