//! Domain models for the supplies inventory

mod audit;
mod inventory;
mod location;
mod user;

pub use audit::*;
pub use inventory::*;
pub use location::*;
pub use user::*;
