//! Identifiers shared by the duskfall crates.

mod types;

pub use types::EntityId;
