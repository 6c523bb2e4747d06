//! Shared application state for all routes.

use crate::config::Config;
use sqlx::PgPool;
use std::sync::{Arc, RwLock};

/// Observable degraded-mode marker. The server deliberately keeps serving
/// health checks when the schema bootstrap fails; this records that fact
/// instead of failing silently.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DegradedMode {
    Ok,
    /// Schema bootstrap failed; the store may be unusable.
    StoreUnavailable(String),
}

impl DegradedMode {
    pub fn is_degraded(&self) -> bool {
        !matches!(self, DegradedMode::Ok)
    }
}

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    /// Set once at startup after bootstrap; read by health handlers.
    pub degraded: Arc<RwLock<DegradedMode>>,
}

impl AppState {
    pub fn new(pool: PgPool, config: Config) -> Self {
        AppState {
            pool,
            config: Arc::new(config),
            degraded: Arc::new(RwLock::new(DegradedMode::Ok)),
        }
    }

    pub fn mark_degraded(&self, reason: String) {
        if let Ok(mut mode) = self.degraded.write() {
            *mode = DegradedMode::StoreUnavailable(reason);
        }
    }

    pub fn degraded_reason(&self) -> Option<String> {
        match self.degraded.read() {
            Ok(mode) => match &*mode {
                DegradedMode::Ok => None,
                DegradedMode::StoreUnavailable(r) => Some(r.clone()),
            },
            Err(_) => None,
        }
    }
}
