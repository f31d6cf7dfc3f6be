//! The project store contract consumed by the pipeline orchestrator.

use async_trait::async_trait;

use adgen_models::{
    AdProjectConfig, ArtifactMap, CostBreakdown, Money, Project, ProjectId, ProjectStatus,
};

use crate::error::StoreResult;

/// Persistence operations the orchestrator performs during a run.
///
/// The orchestrator treats every write as best-effort: a store outage is
/// logged and swallowed, and the run continues on in-memory state. Only
/// the initial `get` is load-bearing.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Load a project, or `None` if it does not exist.
    async fn get(&self, id: &ProjectId) -> StoreResult<Option<Project>>;

    /// Persist status and progress (clamped to 0-100), with an optional
    /// error message for failure states.
    async fn set_status(
        &self,
        id: &ProjectId,
        status: ProjectStatus,
        progress: u8,
        error_message: Option<&str>,
    ) -> StoreResult<()>;

    /// Persist the running cost total.
    async fn set_cost(&self, id: &ProjectId, cost: Money) -> StoreResult<()>;

    /// Persist the configuration after the planning stage writes scenes
    /// and the style spec back.
    async fn set_config(&self, id: &ProjectId, config: &AdProjectConfig) -> StoreResult<()>;

    /// Record the durable storage prefix allocated for this project.
    async fn set_durable_folder(&self, id: &ProjectId, folder: &str) -> StoreResult<()>;

    /// Terminal success write: final artifact map, total cost and the
    /// per-stage breakdown. Sets COMPLETED and progress 100.
    async fn set_output(
        &self,
        id: &ProjectId,
        artifacts: &ArtifactMap,
        total_cost: Money,
        breakdown: &CostBreakdown,
    ) -> StoreResult<()>;
}
