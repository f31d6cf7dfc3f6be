//! Per-stage cost constants and the append-only cost ledger.
//!
//! Planning and the generative stages are paid API calls; extraction,
//! compositing, overlays and rendering run on our own media service and
//! cost nothing. Zero-cost stages still get ledger entries so the
//! persisted breakdown names every stage that ran.

use std::collections::BTreeMap;
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::money::Money;

/// One discrete pipeline stage, keyed as it appears in cost breakdowns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Extraction,
    ScenePlanning,
    VideoGeneration,
    Compositing,
    TextOverlay,
    Audio,
    Rendering,
}

impl PipelineStage {
    /// Ledger key for this stage.
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Extraction => "extraction",
            PipelineStage::ScenePlanning => "scene_planning",
            PipelineStage::VideoGeneration => "video_generation",
            PipelineStage::Compositing => "compositing",
            PipelineStage::TextOverlay => "text_overlay",
            PipelineStage::Audio => "audio",
            PipelineStage::Rendering => "rendering",
        }
    }

    /// Cost of one successful invocation of this stage.
    ///
    /// Video generation issues one external call per scene and scales
    /// accordingly; every other stage is a flat per-invocation cost.
    pub fn cost(&self, scene_count: u32) -> Money {
        match self {
            PipelineStage::Extraction => Money::ZERO,
            PipelineStage::ScenePlanning => Money::from_cents(1),
            PipelineStage::VideoGeneration => Money::from_cents(8) * scene_count,
            PipelineStage::Compositing => Money::ZERO,
            PipelineStage::TextOverlay => Money::ZERO,
            PipelineStage::Audio => Money::from_cents(10),
            PipelineStage::Rendering => Money::ZERO,
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Persisted per-stage cost mapping. Invariant: `total()` equals the
/// project's running cost at every checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct CostBreakdown(BTreeMap<String, Money>);

impl CostBreakdown {
    /// Sum of all entries.
    pub fn total(&self) -> Money {
        self.0.values().copied().sum()
    }

    pub fn get(&self, stage: PipelineStage) -> Option<Money> {
        self.0.get(stage.as_str()).copied()
    }

    pub fn contains(&self, stage: PipelineStage) -> bool {
        self.0.contains_key(stage.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Money)> {
        self.0.iter()
    }
}

/// Append-only ledger accumulating stage costs during a run.
///
/// Entries are recorded strictly after the corresponding external call
/// returns success, so a snapshot taken on the failure path contains
/// exactly the stages that completed before the failing one.
#[derive(Debug, Clone, Default)]
pub struct CostLedger {
    entries: BTreeMap<String, Money>,
}

impl CostLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed stage's cost. Recording the same stage twice
    /// accumulates (a run never does this, but the ledger stays exact
    /// either way).
    pub fn record(&mut self, stage: PipelineStage, amount: Money) {
        *self.entries.entry(stage.as_str().to_string()).or_insert(Money::ZERO) += amount;
    }

    /// Running total of all recorded entries.
    pub fn total(&self) -> Money {
        self.entries.values().copied().sum()
    }

    /// Snapshot for persistence, on both success and failure paths.
    pub fn snapshot(&self) -> CostBreakdown {
        CostBreakdown(self.entries.clone())
    }
}
