//! External collaborator contracts and adapters.
//!
//! Each pipeline stage wraps exactly one collaborator defined here:
//! - Gemini for scene planning
//! - Replicate for text-to-video, music and background removal
//! - The internal media service for compositing, overlays and rendering
//!
//! The adapters are deliberately thin: validated input, one HTTP
//! interaction (or a bounded poll loop), typed output. Prompt content and
//! model choice live here; everything else is the orchestrator's concern.

pub mod error;
pub mod gemini;
pub mod media;
pub mod replicate;
pub mod traits;

pub use error::{ServiceError, ServiceResult};
pub use gemini::GeminiPlanner;
pub use media::{MediaServiceClient, MediaServiceConfig};
pub use replicate::{
    ReplicateAudioGenerator, ReplicateClient, ReplicateConfig, ReplicateProductExtractor,
    ReplicateVideoGenerator,
};
pub use traits::{
    AudioGenerator, Compositor, FinalRenderer, OverlayRenderer, Placement, PlanRequest,
    ProductExtractor, ScenePlan, ScenePlanner, SceneVideoGenerator,
};
