use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use mockbq_core::domain::validation::ValidationErrors;
use mockbq_core::error::StoreError;
use serde_json::json;

#[derive(Debug)]
pub enum ApiError {
    /// The server started without a usable database.
    Unavailable,
    NotFound(String),
    Validation(ValidationErrors),
    Conflict { code: &'static str, detail: String },
    /// SQL sent to the query endpoint that the engine refused.
    InvalidQuery(String),
    Internal(anyhow::Error),
}

impl ApiError {
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("{entity} not found: {id}"))
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => Self::NotFound(err.to_string()),
            StoreError::ForeignKeyViolation(detail) => Self::Conflict {
                code: "foreign_key_violation",
                detail,
            },
            StoreError::UniqueViolation(detail) => Self::Conflict {
                code: "unique_violation",
                detail,
            },
            StoreError::CheckViolation(detail) => Self::Conflict {
                code: "check_violation",
                detail,
            },
            StoreError::TableExists(table) => Self::Conflict {
                code: "table_exists",
                detail: format!("table {table} already exists"),
            },
            StoreError::Invalid(errors) => Self::Validation(errors),
            StoreError::InvalidQuery(detail) => Self::InvalidQuery(detail),
            other => Self::Internal(anyhow::Error::new(other)),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(ValidationErrors::single("body", rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(ValidationErrors::single("query", rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::Validation(ValidationErrors::single("path", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Unavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({ "error": "database_unavailable" }),
            ),
            ApiError::NotFound(detail) => (
                StatusCode::NOT_FOUND,
                json!({ "error": "not_found", "detail": detail }),
            ),
            ApiError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "error": "validation_failed", "detail": errors }),
            ),
            ApiError::Conflict { code, detail } => {
                tracing::info!(code, %detail, "request rejected by database constraint");
                (StatusCode::CONFLICT, json!({ "error": code, "detail": detail }))
            }
            ApiError::InvalidQuery(detail) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "invalid_query", "detail": detail }),
            ),
            ApiError::Internal(err) => {
                sentry_anyhow::capture_anyhow(&err);
                tracing::error!(error = %format!("{err:#}"), "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "internal" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
