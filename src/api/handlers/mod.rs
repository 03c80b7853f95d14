use std::sync::{Mutex, MutexGuard};

use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use log::error;

use crate::config::settings::AppConfig;
use crate::database::{DbConn, DbPool};

pub mod admin;
pub mod games;
pub mod groups;

pub struct AppState {
    pub pool: DbPool,
    pub config: AppConfig,
    // ratings are read-modify-write; one writer at a time
    write_lock: Mutex<()>,
}

impl AppState {
    pub fn new(pool: DbPool, config: AppConfig) -> Self {
        Self {
            pool,
            config,
            write_lock: Mutex::new(()),
        }
    }

    /// Serializes result submissions and recalculations.
    pub fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn connection(&self) -> Result<DbConn, Response> {
        self.pool
            .get()
            .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, "DB Connection Error").into_response())
    }
}

pub(crate) fn internal_error(e: anyhow::Error) -> Response {
    error!("Request failed: {:#}", e);
    (StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {:#}", e)).into_response()
}

pub(crate) fn is_authorized(headers: &HeaderMap, token: &str) -> bool {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        == Some(token)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token_must_match_exactly() {
        let mut headers = HeaderMap::new();
        assert!(!is_authorized(&headers, "secret"));

        headers.insert("Authorization", "Bearer secret".parse().unwrap());
        assert!(is_authorized(&headers, "secret"));
        assert!(!is_authorized(&headers, "other"));

        headers.insert("Authorization", "secret".parse().unwrap());
        assert!(!is_authorized(&headers, "secret"));
    }
}
