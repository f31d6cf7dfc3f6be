//! The pipeline orchestrator.
//!
//! Drives one project run through the stage sequence, persisting status,
//! progress and cost along the way. Stages execute sequentially except
//! scene generation, which fans out one concurrent call per scene and
//! joins before the pipeline proceeds. Persistence is best-effort: a
//! store outage is logged and the run continues on in-memory state.
//!
//! There is no partial resume. A retry re-invokes `run` for the same
//! project and re-executes every stage from the first applicable one,
//! including stages that previously succeeded and were already paid for.

use std::sync::Arc;

use futures::future::try_join_all;
use tracing::warn;

use adgen_models::{
    AdProjectConfig, ArtifactMap, CostBreakdown, CostLedger, Money, PipelineStage, ProjectId,
    ProjectStatus,
};
use adgen_services::{
    AudioGenerator, Compositor, FinalRenderer, OverlayRenderer, Placement, PlanRequest,
    ProductExtractor, ScenePlanner, SceneVideoGenerator,
};
use adgen_storage::ArtifactRelay;
use adgen_store::ProjectStore;

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::logging::RunLogger;
use crate::progress::ProgressCurve;

/// The stage executor collaborators, injected at construction.
#[derive(Clone)]
pub struct StageExecutors {
    pub planner: Arc<dyn ScenePlanner>,
    pub extractor: Arc<dyn ProductExtractor>,
    pub video_generator: Arc<dyn SceneVideoGenerator>,
    pub compositor: Arc<dyn Compositor>,
    pub overlay_renderer: Arc<dyn OverlayRenderer>,
    pub audio_generator: Arc<dyn AudioGenerator>,
    pub final_renderer: Arc<dyn FinalRenderer>,
}

/// Result of one pipeline run. A failed stage still produces an outcome;
/// `run` only errors when the project cannot be loaded or started.
#[derive(Debug)]
pub struct RunOutcome {
    pub status: ProjectStatus,
    /// Final artifact map; present only on success
    pub artifacts: Option<ArtifactMap>,
    pub total_cost: Money,
    pub breakdown: CostBreakdown,
}

/// Per-run mutable state threaded through the stages.
struct RunState {
    id: ProjectId,
    logger: RunLogger,
    ledger: CostLedger,
    progress: u8,
    folder: String,
}

pub struct Pipeline {
    store: Arc<dyn ProjectStore>,
    executors: StageExecutors,
    relay: ArtifactRelay,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(
        store: Arc<dyn ProjectStore>,
        executors: StageExecutors,
        relay: ArtifactRelay,
        config: PipelineConfig,
    ) -> Self {
        Self {
            store,
            executors,
            relay,
            config,
        }
    }

    /// Execute one full run for the given project.
    ///
    /// The project must exist and be in a startable state (PENDING,
    /// QUEUED or FAILED). Any stage failure finalizes the project as
    /// FAILED with a truncated error message and the cost accumulated
    /// from stages that completed before the failure, and is reported
    /// through the returned `RunOutcome` rather than as an error.
    pub async fn run(&self, id: &ProjectId) -> PipelineResult<RunOutcome> {
        let project = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| PipelineError::ProjectNotFound(id.clone()))?;

        if !project.status.can_start() {
            return Err(PipelineError::NotStartable {
                id: id.clone(),
                status: project.status,
            });
        }

        let mut state = RunState {
            id: id.clone(),
            logger: RunLogger::new(id),
            ledger: CostLedger::new(),
            progress: 0,
            folder: format!("projects/{}/", id),
        };
        state.logger.log_start(&project.title);

        let mut config = project.config.clone();
        if let Err(e) = config.validate() {
            return Ok(self.finalize_failure(&state, &e.to_string()).await);
        }

        if let Err(e) = self.store.set_durable_folder(id, &state.folder).await {
            state
                .logger
                .log_warning(&format!("Failed to persist durable folder: {}", e));
        }

        match self.execute_stages(&mut state, &mut config).await {
            Ok(artifacts) => {
                let breakdown = state.ledger.snapshot();
                let total_cost = state.ledger.total();
                if let Err(e) = self
                    .store
                    .set_output(id, &artifacts, total_cost, &breakdown)
                    .await
                {
                    state
                        .logger
                        .log_warning(&format!("Failed to persist final output: {}", e));
                }
                state
                    .logger
                    .log_completion(&format!("{} artifacts, cost {}", artifacts.len(), total_cost));
                Ok(RunOutcome {
                    status: ProjectStatus::Completed,
                    artifacts: Some(artifacts),
                    total_cost,
                    breakdown,
                })
            }
            Err(e) => Ok(self.finalize_failure(&state, &e.to_string()).await),
        }
    }

    /// Run the stage sequence. Returns the final artifact map, or the
    /// first stage error (later stages are never started).
    async fn execute_stages(
        &self,
        state: &mut RunState,
        config: &mut AdProjectConfig,
    ) -> PipelineResult<ArtifactMap> {
        let has_product = config.has_product_asset();
        let curve = ProgressCurve::new(has_product);

        // Product extraction (optional)
        let product_url = match (&config.product_asset, curve.extraction()) {
            (Some(asset), Some(start)) => {
                self.enter_stage(state, ProjectStatus::ExtractingProduct, start)
                    .await;
                let extracted = self.executors.extractor.extract(&asset.original_url).await?;
                let key = format!("{}product.png", state.folder);
                let durable = match self.relay.persist(&extracted, &key, "image/png").await {
                    Ok(url) => url,
                    Err(e) => {
                        state.logger.log_warning(&format!(
                            "Keeping ephemeral product cut-out URL: {}",
                            e
                        ));
                        extracted
                    }
                };
                self.record_stage_cost(state, PipelineStage::Extraction, 0).await;
                Some(durable)
            }
            _ => None,
        };

        // Scene planning
        self.enter_stage(state, ProjectStatus::Planning, curve.planning())
            .await;
        let plan = self
            .executors
            .planner
            .plan(&PlanRequest {
                brief: config.brief.clone(),
                brand_name: config.brand.name.clone(),
                brand_colors: config.brand.palette(),
                duration: config.duration,
                target_audience: self.config.target_audience.clone(),
                has_product_asset: has_product,
            })
            .await?;
        config.scenes = plan.scenes;
        config.style_spec = Some(plan.style_spec);
        if let Err(e) = self.store.set_config(&state.id, config).await {
            state
                .logger
                .log_warning(&format!("Failed to persist planned config: {}", e));
        }
        let scene_count = config.scenes.len();
        self.record_stage_cost(state, PipelineStage::ScenePlanning, scene_count as u32)
            .await;

        // Scene generation: one concurrent call per scene, joined before
        // anything downstream runs. Output order matches scene order
        // regardless of completion order; the first error aborts the run.
        self.enter_stage(state, ProjectStatus::GeneratingScenes, curve.generation())
            .await;
        let style_spec = config.style_spec.clone();
        let generations = config.scenes.iter().map(|scene| {
            let generator = Arc::clone(&self.executors.video_generator);
            let style_spec = style_spec.clone();
            async move {
                generator
                    .generate(&scene.background_prompt, style_spec.as_ref(), scene.duration)
                    .await
            }
        });
        let ephemeral_urls = try_join_all(generations).await?;
        self.record_stage_cost(state, PipelineStage::VideoGeneration, scene_count as u32)
            .await;

        // Generated URLs expire within minutes; relay them before any
        // dependent stage.
        let folder = state.folder.clone();
        let mut scene_urls = self
            .relay
            .persist_batch(&ephemeral_urls, "video/mp4", |i| {
                format!("{}scenes/scene_{:02}.mp4", folder, i)
            })
            .await;

        // Compositing (optional, sequential per scene). A plan that flags
        // no scene gets the product composited into every scene.
        if let (Some(product_url), Some(span)) = (&product_url, curve.compositing()) {
            self.enter_stage(state, ProjectStatus::Compositing, span.start)
                .await;
            let any_flagged = config.scenes.iter().any(|s| s.uses_product);
            for (index, scene) in config.scenes.iter().enumerate() {
                if scene.uses_product || !any_flagged {
                    scene_urls[index] = self
                        .executors
                        .compositor
                        .composite(&scene_urls[index], product_url, &Placement::default(), index)
                        .await?;
                }
                self.advance_progress(
                    state,
                    ProjectStatus::Compositing,
                    span.at(index + 1, scene_count),
                )
                .await;
            }
            self.record_stage_cost(state, PipelineStage::Compositing, 0).await;
        }

        // Text overlays (sequential per scene; pass-through without text)
        let span = curve.overlays();
        self.enter_stage(state, ProjectStatus::AddingOverlays, span.start)
            .await;
        for (index, scene) in config.scenes.iter().enumerate() {
            if let Some(overlay) = &scene.overlay {
                if !overlay.text.is_empty() {
                    scene_urls[index] = self
                        .executors
                        .overlay_renderer
                        .overlay(
                            &scene_urls[index],
                            overlay,
                            scene,
                            &config.brand.primary_color,
                            index,
                        )
                        .await?;
                }
            }
            self.advance_progress(
                state,
                ProjectStatus::AddingOverlays,
                span.at(index + 1, scene_count),
            )
            .await;
        }
        self.record_stage_cost(state, PipelineStage::TextOverlay, 0).await;

        // Background music
        self.enter_stage(state, ProjectStatus::GeneratingAudio, curve.audio())
            .await;
        let audio_ephemeral = self
            .executors
            .audio_generator
            .generate_music(&config.mood, config.duration)
            .await?;
        self.record_stage_cost(state, PipelineStage::Audio, 0).await;
        let audio_key = format!("{}audio/music.mp3", state.folder);
        let audio_url = match self.relay.persist(&audio_ephemeral, &audio_key, "audio/mpeg").await {
            Ok(url) => url,
            Err(e) => {
                state
                    .logger
                    .log_warning(&format!("Keeping ephemeral audio URL: {}", e));
                audio_ephemeral
            }
        };

        // Final multi-aspect render
        self.enter_stage(state, ProjectStatus::Rendering, curve.rendering())
            .await;
        let artifacts = self
            .executors
            .final_renderer
            .render(&scene_urls, &audio_url, &config.aspect_ratios)
            .await?;
        self.record_stage_cost(state, PipelineStage::Rendering, 0).await;

        Ok(artifacts)
    }

    /// Mark stage entry: advance in-memory progress, log, persist
    /// status best-effort.
    async fn enter_stage(&self, state: &mut RunState, status: ProjectStatus, progress: u8) {
        state.progress = progress;
        state.logger.log_stage(status, progress);
        if let Err(e) = self.store.set_status(&state.id, status, progress, None).await {
            warn!(
                project_id = %state.id,
                "Failed to persist status {}: {}", status.as_str(), e
            );
        }
    }

    /// Persist an intra-stage progress update best-effort.
    async fn advance_progress(&self, state: &mut RunState, status: ProjectStatus, progress: u8) {
        state.progress = progress;
        if let Err(e) = self.store.set_status(&state.id, status, progress, None).await {
            warn!(project_id = %state.id, "Failed to persist progress: {}", e);
        }
    }

    /// Record a completed stage in the ledger and persist the running
    /// total best-effort. Called strictly after the stage's external
    /// call succeeded.
    async fn record_stage_cost(&self, state: &mut RunState, stage: PipelineStage, scene_count: u32) {
        state.ledger.record(stage, stage.cost(scene_count));
        if let Err(e) = self.store.set_cost(&state.id, state.ledger.total()).await {
            warn!(project_id = %state.id, "Failed to persist cost: {}", e);
        }
    }

    /// Finalize a failed run: persist FAILED with a truncated message at
    /// the last reached progress, plus the partial cost.
    async fn finalize_failure(&self, state: &RunState, message: &str) -> RunOutcome {
        let truncated = truncate_error(message, self.config.error_message_limit);
        state.logger.log_error(&truncated);

        if let Err(e) = self
            .store
            .set_status(&state.id, ProjectStatus::Failed, state.progress, Some(&truncated))
            .await
        {
            warn!(project_id = %state.id, "Failed to persist FAILED status: {}", e);
        }
        if let Err(e) = self.store.set_cost(&state.id, state.ledger.total()).await {
            warn!(project_id = %state.id, "Failed to persist partial cost: {}", e);
        }

        RunOutcome {
            status: ProjectStatus::Failed,
            artifacts: None,
            total_cost: state.ledger.total(),
            breakdown: state.ledger.snapshot(),
        }
    }
}

/// Truncate to a bounded number of characters, never splitting a code
/// point.
fn truncate_error(message: &str, limit: usize) -> String {
    if message.chars().count() <= limit {
        message.to_string()
    } else {
        message.chars().take(limit).collect()
    }
}
