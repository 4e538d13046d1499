//! Persistence interfaces for inventory items and users
//!
//! Implementations:
//! - `PgInventoryStore` / `PgUserStore`: PostgreSQL, items kept as JSONB documents
//! - `MemoryInventoryStore` / `MemoryUserStore`: process memory

use async_trait::async_trait;
use serde::Deserialize;
use shared::types::{Pagination, SortOrder};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{InventoryItem, UserRecord};

mod memory;
mod postgres;

pub use memory::{MemoryInventoryStore, MemoryUserStore};
pub use postgres::{PgInventoryStore, PgUserStore};

/// Fields an item list can be sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    Name,
    Quantity,
    #[default]
    CreatedAt,
    UpdatedAt,
}

/// Filter, sort and page for listing items
#[derive(Debug, Clone, Default)]
pub struct ItemQuery {
    /// Case-insensitive substring over name, material type and location code
    pub search: Option<String>,
    /// Only items at or below their minimum stock
    pub low_stock: bool,
    pub sort_by: SortField,
    pub order: SortOrder,
    pub pagination: Pagination,
}

/// Storage for inventory items.
///
/// Writes are compare-and-swap on `InventoryItem::version`: `update` fails
/// with `ConcurrentModification` when the stored version differs from the one
/// the caller read, and returns the item with its version bumped.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Persist a new item. Fails with `DuplicateEntry` if its location code is taken.
    async fn insert(&self, item: &InventoryItem) -> AppResult<InventoryItem>;

    async fn get(&self, id: Uuid) -> AppResult<Option<InventoryItem>>;

    /// One page of matching items plus the total number of matches
    async fn list(&self, query: &ItemQuery) -> AppResult<(Vec<InventoryItem>, u64)>;

    async fn update(&self, item: &InventoryItem) -> AppResult<InventoryItem>;

    /// Returns false if there was nothing to delete
    async fn delete(&self, id: Uuid) -> AppResult<bool>;

    async fn location_code_exists(&self, code: &str) -> AppResult<bool>;

    /// Whether the backing storage is reachable
    async fn ping(&self) -> bool;
}

/// Storage for user accounts
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Persist a new user. Fails with `DuplicateEntry` if the username is taken.
    async fn insert(&self, user: &UserRecord) -> AppResult<()>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<UserRecord>>;

    async fn find_by_username(&self, username: &str) -> AppResult<Option<UserRecord>>;
}
