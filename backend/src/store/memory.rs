//! In-memory stores, used for local development and tests

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use shared::types::SortOrder;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{InventoryStore, ItemQuery, SortField, UserStore};
use crate::error::{AppError, AppResult};
use crate::models::{InventoryItem, UserRecord};

/// Inventory items kept in a map keyed by id
#[derive(Default)]
pub struct MemoryInventoryStore {
    items: RwLock<HashMap<Uuid, InventoryItem>>,
}

impl MemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn compare(a: &InventoryItem, b: &InventoryItem, field: SortField) -> Ordering {
    match field {
        SortField::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        SortField::Quantity => a.quantity.cmp(&b.quantity),
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
    }
}

#[async_trait]
impl InventoryStore for MemoryInventoryStore {
    async fn insert(&self, item: &InventoryItem) -> AppResult<InventoryItem> {
        let mut items = self.items.write().await;
        if items.values().any(|i| i.location_code == item.location_code) {
            return Err(AppError::DuplicateEntry("location code".to_string()));
        }
        items.insert(item.id, item.clone());
        Ok(item.clone())
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<InventoryItem>> {
        Ok(self.items.read().await.get(&id).cloned())
    }

    async fn list(&self, query: &ItemQuery) -> AppResult<(Vec<InventoryItem>, u64)> {
        let items = self.items.read().await;
        let search = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty());

        let mut matching: Vec<&InventoryItem> = items
            .values()
            .filter(|i| search.map_or(true, |s| i.matches_search(s)))
            .filter(|i| !query.low_stock || i.is_below_minimum())
            .collect();

        matching.sort_by(|a, b| {
            let ord = compare(a, b, query.sort_by).then_with(|| a.id.cmp(&b.id));
            match query.order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });

        let total = matching.len() as u64;
        let page = matching
            .into_iter()
            .skip(query.pagination.offset() as usize)
            .take(query.pagination.page_size as usize)
            .cloned()
            .collect();
        Ok((page, total))
    }

    async fn update(&self, item: &InventoryItem) -> AppResult<InventoryItem> {
        let mut items = self.items.write().await;
        let stored_version = items
            .get(&item.id)
            .map(|i| i.version)
            .ok_or_else(|| AppError::NotFound("Inventory item".to_string()))?;
        if stored_version != item.version {
            return Err(AppError::ConcurrentModification);
        }
        if items
            .values()
            .any(|i| i.id != item.id && i.location_code == item.location_code)
        {
            return Err(AppError::DuplicateEntry("location code".to_string()));
        }

        let mut next = item.clone();
        next.version += 1;
        items.insert(next.id, next.clone());
        Ok(next)
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.items.write().await.remove(&id).is_some())
    }

    async fn location_code_exists(&self, code: &str) -> AppResult<bool> {
        Ok(self
            .items
            .read()
            .await
            .values()
            .any(|i| i.location_code == code))
    }

    async fn ping(&self) -> bool {
        true
    }
}

/// User accounts kept in a map keyed by id
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, UserRecord>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, user: &UserRecord) -> AppResult<()> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.username == user.username) {
            return Err(AppError::DuplicateEntry("username".to_string()));
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<UserRecord>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<UserRecord>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.username == username)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AuditStamp, Building, Location, MaterialType, UnitOfMeasure};
    use chrono::{Duration, Utc};
    use rust_decimal::Decimal;
    use shared::types::Pagination;
    use shared::NewItem;

    fn item(name: &str, code: &str, quantity: i64, minutes_ago: i64) -> InventoryItem {
        let stamp = AuditStamp::new(
            Uuid::new_v4(),
            "admin",
            Utc::now() - Duration::minutes(minutes_ago),
        );
        InventoryItem::create(
            NewItem {
                material_type: MaterialType::Office,
                name: name.to_string(),
                description: None,
                quantity,
                unit: UnitOfMeasure::Piece,
                unit_price: Decimal::ZERO,
                minimum_stock: 3,
                location: Location::new(Building::Adm, "A", 1),
            },
            code.to_string(),
            &stamp,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_location_code() {
        let store = MemoryInventoryStore::new();
        store.insert(&item("Lápiz", "ADM-AA-N1-0001AAAA", 0, 0)).await.unwrap();
        let err = store
            .insert(&item("Pluma", "ADM-AA-N1-0001AAAA", 0, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateEntry(_)));
    }

    #[tokio::test]
    async fn test_update_is_compare_and_swap() {
        let store = MemoryInventoryStore::new();
        let original = store.insert(&item("Lápiz", "C1", 0, 0)).await.unwrap();

        let mut first = original.clone();
        first.name = "Lápiz HB".to_string();
        let saved = store.update(&first).await.unwrap();
        assert_eq!(saved.version, original.version + 1);

        // A second writer still holding the old version loses
        let mut stale = original.clone();
        stale.name = "Lápiz 2B".to_string();
        let err = store.update(&stale).await.unwrap_err();
        assert!(matches!(err, AppError::ConcurrentModification));
    }

    #[tokio::test]
    async fn test_list_search_sort_and_page() {
        let store = MemoryInventoryStore::new();
        store.insert(&item("Papel bond", "ADM-AA-N1-1", 10, 3)).await.unwrap();
        store.insert(&item("Cloro", "ADM-AA-N1-2", 1, 2)).await.unwrap();
        store.insert(&item("Papel kraft", "TI-AB-N2-3", 2, 1)).await.unwrap();

        let (page, total) = store
            .list(&ItemQuery {
                search: Some("PAPEL".to_string()),
                sort_by: SortField::Name,
                order: SortOrder::Asc,
                pagination: Pagination::new(Some(1), Some(1)),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(total, 2);
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].name, "Papel bond");

        let (page, total) = store
            .list(&ItemQuery {
                search: Some("ti-ab".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(page[0].name, "Papel kraft");

        let (low, _) = store
            .list(&ItemQuery {
                low_stock: true,
                ..Default::default()
            })
            .await
            .unwrap();
        // Newest first by default
        let names: Vec<&str> = low.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Papel kraft", "Cloro"]);
    }

    #[tokio::test]
    async fn test_user_store_unique_username() {
        let store = MemoryUserStore::new();
        let now = Utc::now();
        let user = UserRecord {
            id: Uuid::new_v4(),
            username: "admin".to_string(),
            password_hash: "x".to_string(),
            role: crate::models::Role::Admin,
            created_at: now,
            updated_at: now,
        };
        store.insert(&user).await.unwrap();
        let mut other = user.clone();
        other.id = Uuid::new_v4();
        assert!(matches!(
            store.insert(&other).await,
            Err(AppError::DuplicateEntry(_))
        ));
        assert!(store.find_by_username("admin").await.unwrap().is_some());
        assert!(store.find_by_id(other.id).await.unwrap().is_none());
    }
}
