//! Business logic services for the supplies inventory

pub mod audit;
pub mod auth;
pub mod inventory;
pub mod location_code;

pub use audit::AuditStampBuilder;
pub use auth::{authorize, AuthService};
pub use inventory::InventoryService;
pub use location_code::LocationCodeGenerator;
