use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Failures surfaced at the HTTP boundary.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("validation failed: {}", .details.join("; "))]
    Validation {
        details: Vec<String>,
        warnings: Vec<String>,
    },
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

#[derive(Debug, Serialize)]
struct ValidationBody<'a> {
    error: &'a str,
    details: &'a [String],
    warnings: &'a [String],
}

#[derive(Debug, Serialize)]
struct InternalBody<'a> {
    error: &'a str,
    message: &'a str,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut response = match &self {
            ApiError::BadRequest(msg) => (status, Json(ErrorBody { error: msg })).into_response(),
            ApiError::Validation { details, warnings } => (
                status,
                Json(ValidationBody {
                    error: "Validation failed",
                    details,
                    warnings,
                }),
            )
                .into_response(),
            // The cause is logged by the handler; clients only see a generic fault.
            ApiError::Internal(_) => (
                status,
                Json(InternalBody {
                    error: "Internal server error",
                    message: "Failed to process calculation",
                }),
            )
                .into_response(),
        };
        response.headers_mut().insert(
            header::CACHE_CONTROL,
            "no-store".parse().expect("valid header"),
        );
        response
    }
}
