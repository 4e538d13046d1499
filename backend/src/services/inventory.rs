//! Inventory service: item records and their entry/exit ledger
//!
//! Every mutation takes exactly one audit stamp, applies the pure ledger logic
//! from the shared crate, and writes the item back with a version check.

use std::sync::Arc;

use uuid::Uuid;

use super::audit::AuditStampBuilder;
use super::location_code::LocationCodeGenerator;
use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::{audit_trail, AuditEvent, InventoryItem};
use crate::store::{InventoryStore, ItemQuery};
use shared::types::PaginatedResponse;
use shared::{ItemPatch, NewEntry, NewExit, NewItem};

/// Inventory service for managing items and stock movements
#[derive(Clone)]
pub struct InventoryService {
    items: Arc<dyn InventoryStore>,
    stamps: AuditStampBuilder,
    codes: LocationCodeGenerator,
}

/// Input for creating an item
#[derive(Debug, Clone)]
pub struct CreateItemInput {
    pub item: NewItem,
    /// Kept when free, otherwise a new code is generated
    pub location_code: Option<String>,
}

fn not_found() -> AppError {
    AppError::NotFound("Inventory item".to_string())
}

impl InventoryService {
    pub fn new(items: Arc<dyn InventoryStore>, stamps: AuditStampBuilder) -> Self {
        Self {
            items,
            stamps,
            codes: LocationCodeGenerator::new(),
        }
    }

    /// Create an item, recording its starting quantity as an opening entry
    pub async fn create(
        &self,
        identity: Option<&AuthUser>,
        input: CreateItemInput,
    ) -> AppResult<InventoryItem> {
        let stamp = self.stamps.stamp(identity).await?;

        // Validate before spending lookups on a code
        let mut item = InventoryItem::create(input.item, String::new(), &stamp)?;
        item.location_code = self
            .codes
            .keep_or_generate(&*self.items, input.location_code.as_deref(), &item.location)
            .await?;

        let item = self.items.insert(&item).await?;
        tracing::info!(
            "Created inventory item {} ({}) at {}",
            item.id,
            item.name,
            item.location_code
        );
        Ok(item)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<InventoryItem> {
        self.items.get(id).await?.ok_or_else(not_found)
    }

    pub async fn list(&self, query: ItemQuery) -> AppResult<PaginatedResponse<InventoryItem>> {
        let (items, total) = self.items.list(&query).await?;
        Ok(PaginatedResponse::new(items, query.pagination, total))
    }

    /// Change descriptive fields; moving to another slot issues a new location code
    pub async fn update(
        &self,
        identity: Option<&AuthUser>,
        id: Uuid,
        patch: ItemPatch,
    ) -> AppResult<InventoryItem> {
        let stamp = self.stamps.stamp(identity).await?;
        let mut item = self.get(id).await?;

        if let Some(new_location) = item.apply_patch(patch, &stamp)? {
            let code = self.codes.generate(&*self.items, &new_location).await?;
            tracing::debug!(
                "Item {} moved from {} to {}",
                item.id,
                item.location_code,
                code
            );
            item.relocate(new_location, code, &stamp);
        }

        let item = self.items.update(&item).await?;
        tracing::debug!("Updated inventory item {} (version {})", item.id, item.version);
        Ok(item)
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        if !self.items.delete(id).await? {
            return Err(not_found());
        }
        tracing::info!("Deleted inventory item {}", id);
        Ok(())
    }

    /// Record a restock
    pub async fn add_entry(
        &self,
        identity: Option<&AuthUser>,
        id: Uuid,
        entry: NewEntry,
    ) -> AppResult<InventoryItem> {
        let stamp = self.stamps.stamp(identity).await?;
        let mut item = self.get(id).await?;
        item.apply_entry(entry, &stamp)?;

        let item = self.items.update(&item).await?;
        tracing::debug!("Entry recorded on item {}: quantity now {}", item.id, item.quantity);
        Ok(item)
    }

    /// Record a withdrawal; rejected withdrawals leave the item untouched
    pub async fn add_exit(
        &self,
        identity: Option<&AuthUser>,
        id: Uuid,
        exit: NewExit,
    ) -> AppResult<InventoryItem> {
        let stamp = self.stamps.stamp(identity).await?;
        let mut item = self.get(id).await?;
        item.apply_exit(exit, &stamp)?;

        let item = self.items.update(&item).await?;
        tracing::debug!("Exit recorded on item {}: quantity now {}", item.id, item.quantity);
        Ok(item)
    }

    /// Creation, modification, entries and exits, newest first
    pub async fn audit_trail(&self, id: Uuid) -> AppResult<Vec<AuditEvent>> {
        let item = self.get(id).await?;
        Ok(audit_trail(&item))
    }

    /// Whether the item store is reachable
    pub async fn ping(&self) -> bool {
        self.items.ping().await
    }
}
