//! Ad project configuration: brand, scenes, style spec, output formats.
//!
//! The configuration is validated once at pipeline entry. The planning
//! stage is the only stage allowed to extend it (scenes + style spec);
//! every other stage treats it as read-only for the duration of a run.

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Output aspect ratios supported by the final renderer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
pub enum AspectRatio {
    /// 9:16 vertical (Reels/Shorts/TikTok)
    #[serde(rename = "9:16")]
    Vertical,
    /// 1:1 square (feed placements)
    #[serde(rename = "1:1")]
    Square,
    /// 16:9 widescreen
    #[serde(rename = "16:9")]
    Wide,
}

impl AspectRatio {
    /// All supported output ratios, in delivery order.
    pub const ALL: &'static [AspectRatio] =
        &[AspectRatio::Vertical, AspectRatio::Square, AspectRatio::Wide];

    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Vertical => "9:16",
            AspectRatio::Square => "1:1",
            AspectRatio::Wide => "16:9",
        }
    }

    /// Ratio name as used in artifact filenames (`final_9_16.mp4`).
    pub fn as_filename_part(&self) -> &'static str {
        match self {
            AspectRatio::Vertical => "9_16",
            AspectRatio::Square => "1_1",
            AspectRatio::Wide => "16_9",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = AspectRatioParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "9:16" => Ok(AspectRatio::Vertical),
            "1:1" => Ok(AspectRatio::Square),
            "16:9" => Ok(AspectRatio::Wide),
            _ => Err(AspectRatioParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown aspect ratio: {0}")]
pub struct AspectRatioParseError(String);

/// Narrative role of a scene within the ad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SceneRole {
    /// Attention grab in the first seconds
    Hook,
    /// Product front and center
    Showcase,
    /// Testimonial / credibility beat
    SocialProof,
    /// Call to action
    Cta,
}

impl SceneRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            SceneRole::Hook => "hook",
            SceneRole::Showcase => "showcase",
            SceneRole::SocialProof => "social_proof",
            SceneRole::Cta => "cta",
        }
    }
}

impl fmt::Display for SceneRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// On-screen position for a text overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum OverlayPosition {
    Top,
    #[default]
    Center,
    Bottom,
    LowerThird,
}

impl OverlayPosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverlayPosition::Top => "top",
            OverlayPosition::Center => "center",
            OverlayPosition::Bottom => "bottom",
            OverlayPosition::LowerThird => "lower_third",
        }
    }
}

/// Text overlay spec for a single scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Overlay {
    /// Text to render; empty text means the overlay stage passes through.
    pub text: String,

    #[serde(default)]
    pub position: OverlayPosition,

    /// Font size in points (renderer default applies when absent)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<u32>,

    /// Seconds the overlay stays visible (defaults to the scene duration)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
}

/// One planned scene. Ordinal order is significant and preserved through
/// generation, compositing, overlay and final rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Scene {
    /// Ordinal scene id (0-based position in the timeline)
    pub id: u32,

    /// Narrative role
    pub role: SceneRole,

    /// Scene duration in seconds
    pub duration: u32,

    /// Prompt for the background video generator
    pub background_prompt: String,

    /// Optional text overlay
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlay: Option<Overlay>,

    /// Whether the product asset is composited into this scene
    #[serde(default)]
    pub uses_product: bool,
}

/// Brand identity used across planning, overlays and styling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Brand {
    pub name: String,

    /// Primary color as a hex string (`#RRGGBB`)
    pub primary_color: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_color: Option<String>,
}

impl Brand {
    /// Brand colors, primary first.
    pub fn palette(&self) -> Vec<String> {
        let mut colors = vec![self.primary_color.clone()];
        if let Some(secondary) = &self.secondary_color {
            colors.push(secondary.clone());
        }
        colors
    }
}

/// Uploaded product imagery reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProductAsset {
    /// Durable URL of the uploaded product image
    pub original_url: String,
}

/// Global visual style produced by the planning stage and applied to every
/// scene generation prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StyleSpec {
    pub lighting: String,
    pub camera_style: String,
    pub mood: String,
    #[serde(default)]
    pub color_palette: Vec<String>,
    pub texture: String,
    pub grade: String,
}

/// Full ad project specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AdProjectConfig {
    /// Product brief text
    pub brief: String,

    /// Target total duration in seconds
    pub duration: u32,

    /// Music / atmosphere mood (e.g. "uplifting", "energetic")
    pub mood: String,

    pub brand: Brand,

    /// Optional uploaded product image; gates the extraction and
    /// compositing stages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_asset: Option<ProductAsset>,

    /// Scenes; empty until the planning stage writes them back.
    #[serde(default)]
    pub scenes: Vec<Scene>,

    /// Style spec; written by the planning stage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style_spec: Option<StyleSpec>,

    /// Output formats for the final render
    #[serde(default = "default_aspect_ratios")]
    pub aspect_ratios: Vec<AspectRatio>,
}

fn default_aspect_ratios() -> Vec<AspectRatio> {
    AspectRatio::ALL.to_vec()
}

/// Configuration validation failures. Raised once at pipeline entry,
/// before any paid external call.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("brief must not be empty")]
    EmptyBrief,
    #[error("duration must be between 1 and 300 seconds, got {0}")]
    InvalidDuration(u32),
    #[error("at least one output aspect ratio is required")]
    NoAspectRatios,
    #[error("product asset is present but its URL is empty")]
    EmptyProductUrl,
    #[error("scene {0} has zero duration")]
    ZeroSceneDuration(u32),
}

impl AdProjectConfig {
    /// Whether the optional product stages (extraction, compositing) apply.
    pub fn has_product_asset(&self) -> bool {
        self.product_asset
            .as_ref()
            .map(|asset| !asset.original_url.is_empty())
            .unwrap_or(false)
    }

    /// Validate the configuration at pipeline entry.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.brief.trim().is_empty() {
            return Err(ConfigError::EmptyBrief);
        }
        if self.duration == 0 || self.duration > 300 {
            return Err(ConfigError::InvalidDuration(self.duration));
        }
        if self.aspect_ratios.is_empty() {
            return Err(ConfigError::NoAspectRatios);
        }
        if let Some(asset) = &self.product_asset {
            if asset.original_url.is_empty() {
                return Err(ConfigError::EmptyProductUrl);
            }
        }
        // Scenes are usually planned during the run, but pre-seeded scenes
        // must still be renderable.
        for scene in &self.scenes {
            if scene.duration == 0 {
                return Err(ConfigError::ZeroSceneDuration(scene.id));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> AdProjectConfig {
        AdProjectConfig {
            brief: "Premium skincare serum".to_string(),
            duration: 30,
            mood: "uplifting".to_string(),
            brand: Brand {
                name: "Lumea".to_string(),
                primary_color: "#E8C4B8".to_string(),
                secondary_color: Some("#2F2F2F".to_string()),
            },
            product_asset: None,
            scenes: Vec::new(),
            style_spec: None,
            aspect_ratios: AspectRatio::ALL.to_vec(),
        }
    }

    #[test]
    fn test_validate_ok() {
        assert!(sample_config().validate().is_ok());
    }

    #[test]
    fn test_validate_empty_brief() {
        let mut config = sample_config();
        config.brief = "  ".to_string();
        assert_eq!(config.validate(), Err(ConfigError::EmptyBrief));
    }

    #[test]
    fn test_validate_duration_bounds() {
        let mut config = sample_config();
        config.duration = 0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidDuration(0)));
        config.duration = 301;
        assert_eq!(config.validate(), Err(ConfigError::InvalidDuration(301)));
    }

    #[test]
    fn test_validate_empty_product_url() {
        let mut config = sample_config();
        config.product_asset = Some(ProductAsset {
            original_url: String::new(),
        });
        assert_eq!(config.validate(), Err(ConfigError::EmptyProductUrl));
        assert!(!config.has_product_asset());
    }

    #[test]
    fn test_has_product_asset() {
        let mut config = sample_config();
        assert!(!config.has_product_asset());
        config.product_asset = Some(ProductAsset {
            original_url: "https://cdn.example.com/serum.png".to_string(),
        });
        assert!(config.has_product_asset());
    }

    #[test]
    fn test_aspect_ratio_roundtrip() {
        for ratio in AspectRatio::ALL {
            let parsed: AspectRatio = ratio.as_str().parse().unwrap();
            assert_eq!(parsed, *ratio);
        }
        assert!("4:3".parse::<AspectRatio>().is_err());
    }

    #[test]
    fn test_aspect_ratio_as_map_key() {
        use std::collections::BTreeMap;

        let mut map = BTreeMap::new();
        map.insert(AspectRatio::Vertical, "https://cdn/final_9_16.mp4");
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"9:16":"https://cdn/final_9_16.mp4"}"#);
    }

    #[test]
    fn test_brand_palette() {
        let config = sample_config();
        assert_eq!(config.brand.palette(), vec!["#E8C4B8", "#2F2F2F"]);
    }

    #[test]
    fn test_default_aspect_ratios_on_deserialize() {
        let json = r##"{
            "brief": "x",
            "duration": 15,
            "mood": "calm",
            "brand": {"name": "B", "primary_color": "#FFFFFF"}
        }"##;
        let config: AdProjectConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.aspect_ratios, AspectRatio::ALL.to_vec());
        assert!(config.scenes.is_empty());
    }
}
