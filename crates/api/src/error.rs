use std::time::Duration;

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use pagesplit_core::SplitError;
use pagesplit_document::DocumentError;
use thiserror::Error;

const INTERNAL_ERROR_MESSAGE: &str = "An unexpected error occurred while processing the PDF";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    BadRequest { code: &'static str, message: String },

    #[error("upload exceeds the {limit} byte limit")]
    PayloadTooLarge { limit: usize },

    #[error("rate limit exceeded")]
    RateLimited { retry_after: Duration },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }

    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Internal(_))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::BadRequest { code, .. } => *code,
            Self::PayloadTooLarge { .. } => "payload_too_large",
            Self::RateLimited { .. } => "rate_limited",
            Self::Internal(_) => "internal_error",
        }
    }
}

impl From<SplitError> for ApiError {
    fn from(error: SplitError) -> Self {
        let code = match error {
            SplitError::Infeasible { .. } => "invalid_split",
            SplitError::InvalidPagesPerSplit { .. } | SplitError::InvalidTotalPages { .. } => {
                "invalid_pages_per_split"
            }
        };
        Self::bad_request(code, error.to_string())
    }
}

impl From<DocumentError> for ApiError {
    fn from(error: DocumentError) -> Self {
        if error.is_client_error() {
            Self::bad_request("unparseable_document", error.to_string())
        } else {
            Self::Internal(anyhow::Error::new(error))
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Internal(error) => {
                tracing::error!(error = ?error, "request failed");
                INTERNAL_ERROR_MESSAGE.to_string()
            }
            other => {
                tracing::info!(code = other.code(), message = %other, "request rejected");
                other.to_string()
            }
        };

        let mut response = (
            status,
            Json(serde_json::json!({
                "error": self.code(),
                "message": message,
            })),
        )
            .into_response();

        if let Self::RateLimited { retry_after } = &self {
            let seconds = retry_after.as_secs().max(1).to_string();
            if let Ok(value) = HeaderValue::from_str(&seconds) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }

        response
    }
}
