//! Shared types and domain logic for the supplies inventory
//!
//! Holds the item model with its entry/exit ledger, the pure ledger
//! mutations, location code formatting and validation. Nothing here does IO.

pub mod ledger;
pub mod location_code;
pub mod models;
pub mod types;
pub mod validation;

pub use ledger::*;
pub use models::*;
pub use types::*;
pub use validation::*;
