//! Structured run logging.
//!
//! Provides consistent, structured logging for pipeline runs with
//! contextual information (project ID, current stage).

use tracing::{error, info, warn};

use adgen_models::{ProjectId, ProjectStatus};

/// Run logger for structured logging with consistent formatting.
#[derive(Debug, Clone)]
pub struct RunLogger {
    project_id: String,
}

impl RunLogger {
    pub fn new(project_id: &ProjectId) -> Self {
        Self {
            project_id: project_id.to_string(),
        }
    }

    /// Log the start of a run.
    pub fn log_start(&self, message: &str) {
        info!(
            project_id = %self.project_id,
            "Run started: {}", message
        );
    }

    /// Log entry into a pipeline stage.
    pub fn log_stage(&self, status: ProjectStatus, progress: u8) {
        info!(
            project_id = %self.project_id,
            stage = status.as_str(),
            progress = progress,
            "Entering stage"
        );
    }

    /// Log a non-fatal degradation during a run.
    pub fn log_warning(&self, message: &str) {
        warn!(
            project_id = %self.project_id,
            "Run warning: {}", message
        );
    }

    /// Log a run failure.
    pub fn log_error(&self, message: &str) {
        error!(
            project_id = %self.project_id,
            "Run failed: {}", message
        );
    }

    /// Log successful completion of a run.
    pub fn log_completion(&self, message: &str) {
        info!(
            project_id = %self.project_id,
            "Run completed: {}", message
        );
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_logger_creation() {
        let project_id = ProjectId::new();
        let logger = RunLogger::new(&project_id);

        assert_eq!(logger.project_id(), project_id.to_string());
    }
}
