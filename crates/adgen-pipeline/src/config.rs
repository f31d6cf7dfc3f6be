//! Pipeline configuration.

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Maximum persisted error message length in characters
    pub error_message_limit: usize,
    /// Audience description passed to the scene planner
    pub target_audience: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            error_message_limit: 500,
            target_audience: "general consumers".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            error_message_limit: std::env::var("PIPELINE_ERROR_LIMIT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(500),
            target_audience: std::env::var("PIPELINE_TARGET_AUDIENCE")
                .unwrap_or_else(|_| "general consumers".to_string()),
        }
    }
}
