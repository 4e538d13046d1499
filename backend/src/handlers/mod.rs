//! HTTP request handlers

pub mod auth;
pub mod health;
pub mod inventory;

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use serde::{de::DeserializeOwned, Serialize};
use shared::types::{PaginatedResponse, PaginationMeta};
use validator::Validate;

use crate::error::AppError;

pub use auth::{login, logout, profile, refresh_token, register};
pub use health::health_check;
pub use inventory::{
    add_entry, add_exit, create_item, delete_item, get_audit_trail, get_item, list_items,
    update_item,
};

/// Success envelope: `{ "status": "success", "data" | "message" }`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn data(data: T) -> Json<Self> {
        Json(Self {
            status: "success",
            data: Some(data),
            message: None,
        })
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            status: "success",
            data: None,
            message: Some(message.into()),
        })
    }
}

/// Success envelope for a page of results
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub status: &'static str,
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T> From<PaginatedResponse<T>> for ListResponse<T> {
    fn from(page: PaginatedResponse<T>) -> Self {
        Self {
            status: "success",
            data: page.data,
            pagination: page.pagination,
        }
    }
}

/// JSON body that has passed its `validator` rules.
/// Malformed bodies are reported in the regular error envelope.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::ValidationError(rejection.body_text()))?;
        value.validate()?;
        Ok(ValidatedJson(value))
    }
}
