//! Audit stamps for mutating operations

use std::sync::Arc;

use chrono::Utc;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::AuditStamp;
use crate::store::UserStore;

/// Resolves the caller into an [`AuditStamp`]
#[derive(Clone)]
pub struct AuditStampBuilder {
    users: Arc<dyn UserStore>,
}

impl AuditStampBuilder {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    /// Stamp for one mutation. The actor must still exist.
    pub async fn stamp(&self, identity: Option<&AuthUser>) -> AppResult<AuditStamp> {
        let identity = identity.ok_or(AppError::AuthenticationRequired)?;
        let user = self
            .users
            .find_by_id(identity.user_id)
            .await?
            .ok_or(AppError::ActorNotFound)?;

        Ok(AuditStamp::new(user.id, user.username, Utc::now()))
    }
}
