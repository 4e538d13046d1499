//! PostgreSQL stores
//!
//! An item and its ledger live in one JSONB `document` column so a movement
//! is a single-row write. Columns used for filtering, sorting and uniqueness
//! are mirrored next to it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::types::SortOrder;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use super::{InventoryStore, ItemQuery, SortField, UserStore};
use crate::error::{AppError, AppResult};
use crate::models::{InventoryItem, Role, UserRecord};

pub struct PgInventoryStore {
    db: PgPool,
}

impl PgInventoryStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// `%needle%` with LIKE wildcards in the needle escaped
fn like_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn order_clause(field: SortField, order: SortOrder) -> String {
    let column = match field {
        SortField::Name => "lower(name)",
        SortField::Quantity => "quantity",
        SortField::CreatedAt => "created_at",
        SortField::UpdatedAt => "updated_at",
    };
    let direction = match order {
        SortOrder::Asc => "ASC",
        SortOrder::Desc => "DESC",
    };
    format!("ORDER BY {column} {direction}, id {direction}")
}

const FILTER: &str = r#"
    WHERE ($1::text IS NULL
           OR name ILIKE $1 ESCAPE '\'
           OR material_type ILIKE $1 ESCAPE '\'
           OR location_code ILIKE $1 ESCAPE '\')
      AND (NOT $2 OR quantity <= minimum_stock)
"#;

#[async_trait]
impl InventoryStore for PgInventoryStore {
    async fn insert(&self, item: &InventoryItem) -> AppResult<InventoryItem> {
        sqlx::query(
            r#"
            INSERT INTO inventory_items
                (id, name, material_type, location_code, quantity, minimum_stock,
                 document, version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(item.id)
        .bind(&item.name)
        .bind(item.material_type.as_str())
        .bind(&item.location_code)
        .bind(item.quantity)
        .bind(item.minimum_stock)
        .bind(Json(item))
        .bind(item.version)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.db)
        .await?;

        Ok(item.clone())
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<InventoryItem>> {
        let document = sqlx::query_scalar::<_, Json<InventoryItem>>(
            "SELECT document FROM inventory_items WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(document.map(|Json(item)| item))
    }

    async fn list(&self, query: &ItemQuery) -> AppResult<(Vec<InventoryItem>, u64)> {
        let pattern = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(like_pattern);

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM inventory_items {FILTER}"
        ))
        .bind(&pattern)
        .bind(query.low_stock)
        .fetch_one(&self.db)
        .await?;

        let documents = sqlx::query_scalar::<_, Json<InventoryItem>>(&format!(
            "SELECT document FROM inventory_items {FILTER} {} LIMIT $3 OFFSET $4",
            order_clause(query.sort_by, query.order)
        ))
        .bind(&pattern)
        .bind(query.low_stock)
        .bind(query.pagination.page_size as i64)
        .bind(query.pagination.offset() as i64)
        .fetch_all(&self.db)
        .await?;

        Ok((
            documents.into_iter().map(|Json(item)| item).collect(),
            total.max(0) as u64,
        ))
    }

    async fn update(&self, item: &InventoryItem) -> AppResult<InventoryItem> {
        let mut next = item.clone();
        next.version = item.version + 1;

        let updated = sqlx::query(
            r#"
            UPDATE inventory_items
            SET name = $3, material_type = $4, location_code = $5, quantity = $6,
                minimum_stock = $7, document = $8, version = $9, updated_at = $10
            WHERE id = $1 AND version = $2
            "#,
        )
        .bind(item.id)
        .bind(item.version)
        .bind(&next.name)
        .bind(next.material_type.as_str())
        .bind(&next.location_code)
        .bind(next.quantity)
        .bind(next.minimum_stock)
        .bind(Json(&next))
        .bind(next.version)
        .bind(next.updated_at)
        .execute(&self.db)
        .await?
        .rows_affected();

        if updated == 0 {
            let exists = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM inventory_items WHERE id = $1)",
            )
            .bind(item.id)
            .fetch_one(&self.db)
            .await?;

            return Err(if exists {
                AppError::ConcurrentModification
            } else {
                AppError::NotFound("Inventory item".to_string())
            });
        }

        Ok(next)
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let deleted = sqlx::query("DELETE FROM inventory_items WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?
            .rows_affected();

        Ok(deleted > 0)
    }

    async fn location_code_exists(&self, code: &str) -> AppResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM inventory_items WHERE location_code = $1)",
        )
        .bind(code)
        .fetch_one(&self.db)
        .await?;

        Ok(exists)
    }

    async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.db).await.is_ok()
    }
}

pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// User row from database
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    password_hash: String,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for UserRecord {
    type Error = AppError;

    fn try_from(row: UserRow) -> AppResult<Self> {
        let role: Role = row
            .role
            .parse()
            .map_err(|e| AppError::Internal(format!("Stored user {}: {}", row.id, e)))?;

        Ok(UserRecord {
            id: row.id,
            username: row.username,
            password_hash: row.password_hash,
            role,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn insert(&self, user: &UserRecord) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, password_hash, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<UserRecord>> {
        sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, password_hash, role, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .map(UserRecord::try_from)
        .transpose()
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<UserRecord>> {
        sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, password_hash, role, created_at, updated_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await?
        .map(UserRecord::try_from)
        .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("papel"), "%papel%");
        assert_eq!(like_pattern("50%_a\\b"), "%50\\%\\_a\\\\b%");
    }

    #[test]
    fn test_order_clause_is_whitelisted() {
        assert_eq!(
            order_clause(SortField::Name, SortOrder::Asc),
            "ORDER BY lower(name) ASC, id ASC"
        );
        assert_eq!(
            order_clause(SortField::CreatedAt, SortOrder::Desc),
            "ORDER BY created_at DESC, id DESC"
        );
    }
}
