//! Durable artifact storage for the AdGen backend.
//!
//! This crate provides:
//! - An R2 (S3-compatible) client for uploads and public URLs
//! - The artifact relay: copies ephemeral external URLs into durable
//!   storage before they expire, with per-item fallback

pub mod client;
pub mod error;
pub mod relay;

pub use client::{R2Client, R2Config};
pub use error::{StorageError, StorageResult};
pub use relay::{ArtifactRelay, ArtifactSink};
