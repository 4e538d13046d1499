//! Database models for the inventory backend
//!
//! Re-exports models from the shared crate and adds backend-specific models

use chrono::{DateTime, Utc};
use uuid::Uuid;

pub use shared::models::*;

/// A stored user account, including the password hash
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    /// Public view without the hash
    pub fn to_user(&self) -> User {
        User {
            id: self.id,
            username: self.username.clone(),
            role: self.role,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
