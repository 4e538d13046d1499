//! Error handling for the inventory backend
//!
//! Every failure is rendered as `{ "status": "error", "code", "message", ... }`.
//! Storage errors are translated here so raw database messages never reach
//! clients; underlying details are only attached outside production (see
//! [`expose_error_detail`]).

use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::LedgerError;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Missing access token")]
    MissingToken,

    #[error("Malformed access token")]
    MalformedToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Missing refresh token")]
    MissingRefreshToken,

    #[error("Refresh token expired")]
    RefreshTokenExpired,

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("Authentication required")]
    AuthenticationRequired,

    #[error("Authenticated actor no longer exists")]
    ActorNotFound,

    #[error("User not found")]
    UserNotFound,

    #[error("Insufficient permissions")]
    Forbidden,

    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Validation failed")]
    ValidationErrors(Vec<FieldError>),

    #[error("Validation error: {0}")]
    ValidationError(String),

    // Resource errors
    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    #[error("Record was modified concurrently")]
    ConcurrentModification,

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Business logic errors
    #[error("Insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { available: i64, requested: i64 },

    #[error("Could not generate a unique location code after {attempts} attempts")]
    LocationCodeExhausted { attempts: u32 },

    // Storage errors
    #[error("Database error: {0}")]
    DatabaseError(sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// A per-field validation message
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Error response structure
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub status: &'static str,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ErrorResponse {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            status: "error",
            code: code.to_string(),
            message: message.into(),
            errors: None,
            available: None,
            detail: None,
        }
    }
}

/// The same error body with the underlying detail filled in, carried as a
/// response extension for [`expose_error_detail`]
#[derive(Debug, Clone)]
struct DetailedError(ErrorResponse);

impl AppError {
    /// HTTP status and client-facing body
    pub fn to_response_parts(&self) -> (StatusCode, ErrorResponse) {
        match self {
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse::new("INVALID_CREDENTIALS", "Invalid username or password"),
            ),
            AppError::MissingToken => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse::new("MISSING_TOKEN", "No token provided, authorization denied"),
            ),
            AppError::MalformedToken => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse::new("MALFORMED_TOKEN", "Malformed token"),
            ),
            AppError::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse::new("TOKEN_EXPIRED", "Token has expired"),
            ),
            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse::new("INVALID_TOKEN", "Invalid token"),
            ),
            AppError::MissingRefreshToken => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse::new("MISSING_REFRESH_TOKEN", "Refresh token is required"),
            ),
            AppError::RefreshTokenExpired => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse::new("REFRESH_TOKEN_EXPIRED", "Refresh token has expired"),
            ),
            AppError::InvalidRefreshToken => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse::new("INVALID_REFRESH_TOKEN", "Invalid refresh token"),
            ),
            AppError::AuthenticationRequired => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse::new("UNAUTHENTICATED", "Authentication required"),
            ),
            AppError::ActorNotFound => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse::new("ACTOR_NOT_FOUND", "Authenticated user no longer exists"),
            ),
            AppError::UserNotFound => (
                StatusCode::NOT_FOUND,
                ErrorResponse::new("USER_NOT_FOUND", "User not found"),
            ),
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                ErrorResponse::new(
                    "FORBIDDEN",
                    "You do not have permission to access this resource",
                ),
            ),
            AppError::Validation { field, message } => {
                let mut body = ErrorResponse::new("VALIDATION_ERROR", message.clone());
                body.errors = Some(vec![FieldError {
                    field: field.clone(),
                    message: message.clone(),
                }]);
                (StatusCode::BAD_REQUEST, body)
            }
            AppError::ValidationErrors(errors) => {
                let mut body = ErrorResponse::new("VALIDATION_ERROR", "Validation error");
                body.errors = Some(errors.clone());
                (StatusCode::BAD_REQUEST, body)
            }
            AppError::ValidationError(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new("VALIDATION_ERROR", msg.clone()),
            ),
            AppError::DuplicateEntry(field) => (
                StatusCode::CONFLICT,
                ErrorResponse::new(
                    "DUPLICATE_ENTRY",
                    format!("A record with this {} already exists", field),
                ),
            ),
            AppError::ConcurrentModification => (
                StatusCode::CONFLICT,
                ErrorResponse::new(
                    "CONCURRENT_MODIFICATION",
                    "The record was modified by another request, please retry",
                ),
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorResponse::new("NOT_FOUND", format!("{} not found", resource)),
            ),
            AppError::InsufficientStock {
                available,
                requested,
            } => {
                let mut body = ErrorResponse::new(
                    "INSUFFICIENT_STOCK",
                    format!(
                        "Insufficient stock: requested {}, available {}",
                        requested, available
                    ),
                );
                body.available = Some(*available);
                (StatusCode::BAD_REQUEST, body)
            }
            AppError::LocationCodeExhausted { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::new(
                    "LOCATION_CODE_EXHAUSTED",
                    "Could not generate a unique location code",
                ),
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::new("DATABASE_ERROR", "A database error occurred"),
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::new("INTERNAL_ERROR", "Internal server error"),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.to_response_parts();

        if status.is_server_error() {
            tracing::error!("Error: {:?}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }

        let mut detailed = body.clone();
        detailed.detail = Some(self.to_string());

        let mut response = (status, Json(body)).into_response();
        response.extensions_mut().insert(DetailedError(detailed));
        response
    }
}

/// Re-render error bodies with their underlying detail.
/// Installed only outside production.
pub async fn expose_error_detail(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    match response.extensions().get::<DetailedError>().cloned() {
        Some(DetailedError(body)) => (response.status(), Json(body)).into_response(),
        None => response,
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => AppError::NotFound("Record".to_string()),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                let field = match db_err.constraint() {
                    Some(c) if c.contains("location_code") => "location code",
                    Some(c) if c.contains("username") => "username",
                    _ => "value",
                };
                AppError::DuplicateEntry(field.to_string())
            }
            _ => AppError::DatabaseError(err),
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Invalid { field, message } => AppError::Validation {
                field: field.to_string(),
                message: message.to_string(),
            },
            LedgerError::InsufficientStock {
                available,
                requested,
            } => AppError::InsufficientStock {
                available,
                requested,
            },
        }
    }
}

/// Request DTOs are camelCase on the wire, validator reports Rust field names
fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<FieldError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| FieldError {
                    field: camel_case(field),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value for {}", field)),
                })
            })
            .collect();
        fields.sort_by(|a, b| a.field.cmp(&b.field));
        AppError::ValidationErrors(fields)
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
