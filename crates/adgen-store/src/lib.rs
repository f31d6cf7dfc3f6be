//! Project store collaborator for the AdGen backend.
//!
//! This crate provides:
//! - The `ProjectStore` contract consumed by the pipeline orchestrator
//! - A Firestore REST implementation with bearer-token auth

pub mod error;
pub mod firestore;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use firestore::{FirestoreConfig, FirestoreProjectStore};
pub use store::ProjectStore;
