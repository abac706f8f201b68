//! Domain model for the eight tracked entity collections.
//!
//! # Responsibility
//! - Define the typed record shapes stored per collection.
//! - Bind every entity kind to one stable collection name.
//! - Define the current-user roles consulted by the access gate.
//!
//! # Invariants
//! - Every record carries a caller-assigned `id`; the store never invents one.
//! - Collection names and API path segments are distinct across kinds.

pub mod entity;
pub mod records;
pub mod user;

/// Plain JSON object used as the stored document body.
pub type Document = serde_json::Map<String, serde_json::Value>;
