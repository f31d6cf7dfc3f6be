//! Shared data models for the AdGen backend.
//!
//! This crate provides Serde-serializable types for:
//! - Projects and their lifecycle states
//! - Ad project configuration (brand, scenes, style spec)
//! - Fixed-point money and the per-stage cost ledger

pub mod config;
pub mod cost;
pub mod money;
pub mod project;

// Re-export common types
pub use config::{
    AdProjectConfig, AspectRatio, AspectRatioParseError, Brand, ConfigError, Overlay,
    OverlayPosition, ProductAsset, Scene, SceneRole, StyleSpec,
};
pub use cost::{CostBreakdown, CostLedger, PipelineStage};
pub use money::Money;
pub use project::{ArtifactMap, Project, ProjectId, ProjectStatus};
