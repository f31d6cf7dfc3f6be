//! The ad generation pipeline orchestrator.
//!
//! Sequences the stage executors over one project run: optional product
//! extraction, LLM scene planning, concurrent per-scene video
//! generation, optional compositing, text overlays, background music
//! and the final multi-aspect render. Owns the progress curves, the
//! cost ledger and failure finalization.

pub mod config;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod progress;

pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult};
pub use logging::RunLogger;
pub use orchestrator::{Pipeline, RunOutcome, StageExecutors};
pub use progress::{ProgressCurve, ProgressSpan};
