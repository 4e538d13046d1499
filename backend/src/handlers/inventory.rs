//! HTTP handlers for inventory endpoints

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::types::{Pagination, SortOrder};
use shared::{ItemPatch, NewEntry, NewExit, NewItem};
use uuid::Uuid;
use validator::Validate;

use super::{ApiResponse, ListResponse, ValidatedJson};
use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::models::{
    AuditEvent, InventoryItem, Location, MaterialType, RequestingArea, UnitOfMeasure, ADMIN_ONLY,
};
use crate::services::authorize;
use crate::services::inventory::CreateItemInput;
use crate::store::{ItemQuery, SortField};
use crate::AppState;

/// Query string of the list endpoint
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub search: Option<String>,
    pub low_stock: Option<bool>,
    pub sort_by: Option<SortField>,
    pub order: Option<SortOrder>,
}

impl From<ListParams> for ItemQuery {
    fn from(params: ListParams) -> Self {
        ItemQuery {
            search: params.search,
            low_stock: params.low_stock.unwrap_or(false),
            sort_by: params.sort_by.unwrap_or_default(),
            order: params.order.unwrap_or_default(),
            pagination: Pagination::new(params.page, params.page_size),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemRequest {
    pub material_type: MaterialType,
    #[validate(length(min = 1, max = 200, message = "Name must be 1 to 200 characters"))]
    pub name: String,
    #[validate(length(max = 1000, message = "Description is too long"))]
    pub description: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    pub quantity: i64,
    pub unit: UnitOfMeasure,
    #[serde(default)]
    pub unit_price: Decimal,
    #[serde(default)]
    #[validate(range(min = 0, message = "Minimum stock cannot be negative"))]
    pub minimum_stock: i64,
    pub location: Location,
    pub location_code: Option<String>,
}

impl From<CreateItemRequest> for CreateItemInput {
    fn from(req: CreateItemRequest) -> Self {
        CreateItemInput {
            item: NewItem {
                material_type: req.material_type,
                name: req.name,
                description: req.description,
                quantity: req.quantity,
                unit: req.unit,
                unit_price: req.unit_price,
                minimum_stock: req.minimum_stock,
                location: req.location,
            },
            location_code: req.location_code,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemRequest {
    pub material_type: Option<MaterialType>,
    #[validate(length(min = 1, max = 200, message = "Name must be 1 to 200 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 1000, message = "Description is too long"))]
    pub description: Option<String>,
    pub unit: Option<UnitOfMeasure>,
    pub unit_price: Option<Decimal>,
    #[validate(range(min = 0, message = "Minimum stock cannot be negative"))]
    pub minimum_stock: Option<i64>,
    pub location: Option<Location>,
}

impl From<UpdateItemRequest> for ItemPatch {
    fn from(req: UpdateItemRequest) -> Self {
        ItemPatch {
            material_type: req.material_type,
            name: req.name,
            description: req.description,
            unit: req.unit,
            unit_price: req.unit_price,
            minimum_stock: req.minimum_stock,
            location: req.location,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EntryRequest {
    #[validate(range(min = 1, message = "Quantity must be a positive integer"))]
    pub quantity: i64,
    #[validate(length(max = 200, message = "Supplier is too long"))]
    pub supplier: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ExitRequest {
    #[validate(range(min = 1, message = "Quantity must be a positive integer"))]
    pub quantity: i64,
    #[validate(length(min = 1, max = 500, message = "Reason is required"))]
    pub reason: String,
    pub area: RequestingArea,
    #[validate(length(min = 1, max = 200, message = "Requester is required"))]
    pub requester: String,
    #[serde(alias = "releaser")]
    #[validate(length(min = 1, max = 200, message = "Released-by is required"))]
    pub released_by: String,
    /// `HH:MM`, defaults to the current time
    pub time: Option<String>,
}

/// List items with search, low-stock filter, sorting and pagination
pub async fn list_items(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    params: Result<Query<ListParams>, QueryRejection>,
) -> AppResult<Json<ListResponse<InventoryItem>>> {
    let Query(params) = params.map_err(|e| AppError::ValidationError(e.body_text()))?;
    let page = state.inventory.list(params.into()).await?;
    Ok(Json(page.into()))
}

/// Create an item
pub async fn create_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    ValidatedJson(body): ValidatedJson<CreateItemRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<InventoryItem>>)> {
    let item = state
        .inventory
        .create(Some(&current_user.0), body.into())
        .await?;
    Ok((StatusCode::CREATED, ApiResponse::data(item)))
}

/// Get an item with its ledger
pub async fn get_item(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<InventoryItem>>> {
    let item = state.inventory.get(id).await?;
    Ok(ApiResponse::data(item))
}

/// Update descriptive fields or location
pub async fn update_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<UpdateItemRequest>,
) -> AppResult<Json<ApiResponse<InventoryItem>>> {
    let item = state
        .inventory
        .update(Some(&current_user.0), id, body.into())
        .await?;
    Ok(ApiResponse::data(item))
}

/// Delete an item (admin only)
pub async fn delete_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<()>>> {
    authorize(ADMIN_ONLY, Some(&current_user.0))?;
    state.inventory.delete(id).await?;
    Ok(ApiResponse::message("Inventory item deleted"))
}

/// Record a restock (admin only)
pub async fn add_entry(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<EntryRequest>,
) -> AppResult<Json<ApiResponse<InventoryItem>>> {
    authorize(ADMIN_ONLY, Some(&current_user.0))?;
    let item = state
        .inventory
        .add_entry(
            Some(&current_user.0),
            id,
            NewEntry {
                date: body.date,
                quantity: body.quantity,
                supplier: body.supplier,
            },
        )
        .await?;
    Ok(ApiResponse::data(item))
}

/// Record a withdrawal
pub async fn add_exit(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<ExitRequest>,
) -> AppResult<Json<ApiResponse<InventoryItem>>> {
    let item = state
        .inventory
        .add_exit(
            Some(&current_user.0),
            id,
            NewExit {
                time: body.time,
                quantity: body.quantity,
                reason: body.reason,
                area: body.area,
                requester: body.requester,
                released_by: body.released_by,
            },
        )
        .await?;
    Ok(ApiResponse::data(item))
}

/// Audit trail of an item, newest first
pub async fn get_audit_trail(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Vec<AuditEvent>>>> {
    let events = state.inventory.audit_trail(id).await?;
    Ok(ApiResponse::data(events))
}
