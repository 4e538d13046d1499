//! Unique location code generation with bounded retry

use async_trait::async_trait;
use chrono::Utc;
use shared::location_code::{self, MAX_ATTEMPTS};

use crate::error::{AppError, AppResult};
use crate::models::Location;
use crate::store::InventoryStore;

/// Answers whether a location code is already in use
#[async_trait]
pub trait LocationCodeRegistry: Send + Sync {
    async fn is_taken(&self, code: &str) -> AppResult<bool>;
}

#[async_trait]
impl<T: InventoryStore + ?Sized> LocationCodeRegistry for T {
    async fn is_taken(&self, code: &str) -> AppResult<bool> {
        self.location_code_exists(code).await
    }
}

/// Produces location codes that do not collide with any stored item
#[derive(Clone)]
pub struct LocationCodeGenerator {
    max_attempts: u32,
}

impl Default for LocationCodeGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl LocationCodeGenerator {
    pub fn new() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
        }
    }

    /// Try fresh candidates until one is free, up to the attempt limit
    pub async fn generate<R>(&self, registry: &R, location: &Location) -> AppResult<String>
    where
        R: LocationCodeRegistry + ?Sized,
    {
        for attempt in 1..=self.max_attempts {
            let code = location_code::candidate(location, Utc::now());
            if !registry.is_taken(&code).await? {
                return Ok(code);
            }
            tracing::warn!("Location code collision on attempt {}: {}", attempt, code);
        }

        Err(AppError::LocationCodeExhausted {
            attempts: self.max_attempts,
        })
    }

    /// Keep a client-supplied code when it is free, otherwise generate one
    pub async fn keep_or_generate<R>(
        &self,
        registry: &R,
        requested: Option<&str>,
        location: &Location,
    ) -> AppResult<String>
    where
        R: LocationCodeRegistry + ?Sized,
    {
        if let Some(code) = requested.map(str::trim).filter(|c| !c.is_empty()) {
            let code = code.to_uppercase();
            if !registry.is_taken(&code).await? {
                return Ok(code);
            }
            tracing::warn!("Requested location code {} is taken, generating a new one", code);
        }
        self.generate(registry, location).await
    }
}
