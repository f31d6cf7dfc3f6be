//! Project records and lifecycle states.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{AdProjectConfig, AspectRatio};
use crate::money::Money;

/// Unique identifier for a project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ProjectId(pub String);

impl ProjectId {
    /// Generate a new random project ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ProjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Mapping from output aspect ratio to the durable final video URL.
/// Written only on full pipeline success.
pub type ArtifactMap = BTreeMap<AspectRatio, String>;

/// Pipeline state of a project, as persisted for polling clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
    /// Created, not yet picked up
    #[default]
    Pending,
    /// Enqueued for a worker
    Queued,
    /// Removing the product image background (optional stage)
    ExtractingProduct,
    /// LLM scene planning
    Planning,
    /// Concurrent per-scene background generation
    GeneratingScenes,
    /// Product compositing onto scenes (optional stage)
    Compositing,
    /// Text overlay rendering
    AddingOverlays,
    /// Background music generation
    GeneratingAudio,
    /// Multi-aspect final rendering
    Rendering,
    /// Terminal: all stages succeeded
    Completed,
    /// Terminal: a stage failed (retry allowed)
    Failed,
    /// Terminal: cancelled externally; in-flight work is not interrupted
    Cancelled,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Pending => "PENDING",
            ProjectStatus::Queued => "QUEUED",
            ProjectStatus::ExtractingProduct => "EXTRACTING_PRODUCT",
            ProjectStatus::Planning => "PLANNING",
            ProjectStatus::GeneratingScenes => "GENERATING_SCENES",
            ProjectStatus::Compositing => "COMPOSITING",
            ProjectStatus::AddingOverlays => "ADDING_OVERLAYS",
            ProjectStatus::GeneratingAudio => "GENERATING_AUDIO",
            ProjectStatus::Rendering => "RENDERING",
            ProjectStatus::Completed => "COMPLETED",
            ProjectStatus::Failed => "FAILED",
            ProjectStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProjectStatus::Completed | ProjectStatus::Failed | ProjectStatus::Cancelled
        )
    }

    /// Whether a pipeline run may be (re)started from this state.
    /// FAILED is restartable; a retry re-executes every stage.
    pub fn can_start(&self) -> bool {
        matches!(
            self,
            ProjectStatus::Pending | ProjectStatus::Queued | ProjectStatus::Failed
        )
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An ad generation project. Created externally in PENDING; mutated
/// exclusively by the pipeline orchestrator during a run.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Project {
    pub id: ProjectId,

    pub user_id: String,

    pub title: String,

    /// Full ad specification (extended by the planning stage)
    pub config: AdProjectConfig,

    #[serde(default)]
    pub status: ProjectStatus,

    /// Progress percentage (0-100), monotonic within a run
    #[serde(default)]
    pub progress: u8,

    /// Running monetary total across completed stages
    #[serde(default)]
    pub cost: Money,

    /// Truncated failure message, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Base storage prefix for this project's durable artifacts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub durable_folder: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Create a new project in PENDING state.
    pub fn new(user_id: impl Into<String>, title: impl Into<String>, config: AdProjectConfig) -> Self {
        let now = Utc::now();
        Self {
            id: ProjectId::new(),
            user_id: user_id.into(),
            title: title.into(),
            config,
            status: ProjectStatus::Pending,
            progress: 0,
            cost: Money::ZERO,
            error_message: None,
            durable_folder: None,
            created_at: now,
            updated_at: now,
        }
    }
}
