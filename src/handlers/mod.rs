pub mod auth;
pub mod common;
pub mod contributions;
pub mod global;
pub mod public_dir;
pub mod reports;
pub mod users;

use crate::error::AppError;
use serde::Deserialize;
use uuid::Uuid;

/// Path captures for `/:id` routes. A struct (not a bare `Path<Uuid>`) so the
/// `/t/:tenant_prefix/...` mount's extra capture is ignored.
#[derive(Deserialize)]
pub struct IdPath {
    pub id: Uuid,
}

/// Clamp list pagination: default 100, max 1000.
pub fn page_window(limit: Option<u32>, offset: Option<u32>) -> (u32, u32) {
    const DEFAULT_LIMIT: u32 = 100;
    (limit.unwrap_or(DEFAULT_LIMIT).min(1000), offset.unwrap_or(0))
}

pub fn parse_uuid(field: &str, value: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(value).map_err(|_| AppError::BadRequest(format!("invalid {}", field)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_window_clamps() {
        assert_eq!(page_window(None, None), (100, 0));
        assert_eq!(page_window(Some(5000), Some(10)), (1000, 10));
        assert_eq!(page_window(Some(20), None), (20, 0));
    }
}
