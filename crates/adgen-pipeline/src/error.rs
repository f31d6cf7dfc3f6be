//! Pipeline error types.

use thiserror::Error;

use adgen_models::{ConfigError, ProjectId, ProjectStatus};

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Project not found: {0}")]
    ProjectNotFound(ProjectId),

    #[error("Project {id} cannot be started from status {status}")]
    NotStartable { id: ProjectId, status: ProjectStatus },

    #[error("Invalid configuration: {0}")]
    Validation(#[from] ConfigError),

    #[error("Stage failed: {0}")]
    Service(#[from] adgen_services::ServiceError),

    #[error("Store error: {0}")]
    Store(#[from] adgen_store::StoreError),
}
