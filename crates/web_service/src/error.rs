use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use provider_client::UpstreamError;
use serde::Serialize;
use thiserror::Error;
use thread_store::ThreadStoreError;

pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Authentication required")]
    AuthRequired,

    #[error("Rate limited by upstream provider")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("A turn is already in flight for this thread")]
    TurnInFlight,

    #[error("Thread not found")]
    NotFound,

    #[error("Upstream provider error: {0}")]
    Upstream(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<ThreadStoreError> for AppError {
    fn from(err: ThreadStoreError) -> Self {
        match err {
            ThreadStoreError::NotFound => AppError::NotFound,
            other => AppError::Storage(other.to_string()),
        }
    }
}

impl From<UpstreamError> for AppError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::AuthenticationRequired => AppError::AuthRequired,
            UpstreamError::RateLimited { retry_after_secs } => {
                AppError::RateLimited { retry_after_secs }
            }
            other => AppError::Upstream(other.to_string()),
        }
    }
}

/// JSON envelope shared with the browser client.
#[derive(Serialize)]
struct ErrorEnvelope {
    success: bool,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none", rename = "authRequired")]
    auth_required: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "retryAfter")]
    retry_after: Option<u64>,
}

impl AppError {
    pub(crate) fn envelope(&self) -> serde_json::Value {
        let envelope = ErrorEnvelope {
            success: false,
            error: self.to_string(),
            auth_required: matches!(self, AppError::AuthRequired).then_some(true),
            retry_after: match self {
                AppError::RateLimited { retry_after_secs } => *retry_after_secs,
                _ => None,
            },
        };
        serde_json::to_value(envelope).unwrap_or_else(|_| {
            serde_json::json!({ "success": false, "error": "internal error" })
        })
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::AuthRequired => StatusCode::UNAUTHORIZED,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::TurnInFlight => StatusCode::CONFLICT,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) | AppError::Storage(_) | AppError::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self.envelope())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_required_sets_flag_and_401() {
        let err = AppError::AuthRequired;
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        let envelope = err.envelope();
        assert_eq!(envelope["authRequired"], true);
        assert_eq!(envelope["success"], false);
    }

    #[test]
    fn test_rate_limited_carries_retry_hint() {
        let err = AppError::RateLimited {
            retry_after_secs: Some(2),
        };
        assert_eq!(err.status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(err.envelope()["retryAfter"], 2);
    }

    #[test]
    fn test_store_not_found_maps_to_404() {
        let err: AppError = ThreadStoreError::NotFound.into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }
}
