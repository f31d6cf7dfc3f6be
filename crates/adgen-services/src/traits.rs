//! Collaborator contracts consumed by the pipeline orchestrator.
//!
//! The orchestrator only ever sees these traits; concrete adapters live
//! in the sibling modules and fakes stand in for them in tests.

use async_trait::async_trait;

use adgen_models::{ArtifactMap, AspectRatio, Overlay, Scene, StyleSpec};

use crate::error::ServiceResult;

/// Input to the planning stage.
#[derive(Debug, Clone)]
pub struct PlanRequest {
    pub brief: String,
    pub brand_name: String,
    pub brand_colors: Vec<String>,
    /// Target total duration in seconds
    pub duration: u32,
    pub target_audience: String,
    /// Whether a product cut-out will be composited into flagged scenes.
    /// The planner marks those scenes via `Scene::uses_product`.
    pub has_product_asset: bool,
}

/// Output of the planning stage: ordered scenes plus a global style spec.
/// The planner either returns a complete plan or fails; there is no
/// partial output.
#[derive(Debug, Clone)]
pub struct ScenePlan {
    pub scenes: Vec<Scene>,
    pub style_spec: StyleSpec,
}

/// Product placement parameters for compositing.
#[derive(Debug, Clone)]
pub struct Placement {
    /// Position keyword ("center", "bottom_right", ...)
    pub position: String,
    /// Product size as a fraction of the frame (0.1 to 1.0)
    pub scale: f32,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            position: "center".to_string(),
            scale: 0.3,
        }
    }
}

/// LLM scene planner.
#[async_trait]
pub trait ScenePlanner: Send + Sync {
    async fn plan(&self, request: &PlanRequest) -> ServiceResult<ScenePlan>;
}

/// Product image background removal. Required only when the project
/// carries a product asset. Returns a durable cut-out image URL.
#[async_trait]
pub trait ProductExtractor: Send + Sync {
    async fn extract(&self, image_url: &str) -> ServiceResult<String>;
}

/// Text-to-video backend for scene backgrounds. One call per scene,
/// issued concurrently by the orchestrator. The returned URL is
/// ephemeral and must be relayed to durable storage before use.
#[async_trait]
pub trait SceneVideoGenerator: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        style_spec: Option<&StyleSpec>,
        duration: u32,
    ) -> ServiceResult<String>;
}

/// Composites the extracted product onto a scene video. Invoked
/// sequentially, one scene at a time.
#[async_trait]
pub trait Compositor: Send + Sync {
    async fn composite(
        &self,
        video_url: &str,
        product_url: &str,
        placement: &Placement,
        scene_index: usize,
    ) -> ServiceResult<String>;
}

/// Renders a scene's text overlay. Scenes without overlay text are
/// passed through by the orchestrator without calling this.
#[async_trait]
pub trait OverlayRenderer: Send + Sync {
    async fn overlay(
        &self,
        video_url: &str,
        overlay: &Overlay,
        scene: &Scene,
        brand_color: &str,
        scene_index: usize,
    ) -> ServiceResult<String>;
}

/// Background music generation. Single flat-cost call per run.
#[async_trait]
pub trait AudioGenerator: Send + Sync {
    async fn generate_music(&self, mood: &str, duration: u32) -> ServiceResult<String>;
}

/// Final multi-aspect renderer: concatenates the ordered scene videos,
/// mixes the audio track and produces one durable output per requested
/// aspect ratio.
#[async_trait]
pub trait FinalRenderer: Send + Sync {
    async fn render(
        &self,
        scene_urls: &[String],
        audio_url: &str,
        aspect_ratios: &[AspectRatio],
    ) -> ServiceResult<ArtifactMap>;
}
