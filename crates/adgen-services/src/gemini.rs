//! Gemini client for LLM scene planning.
//!
//! Turns a product brief into an ordered scene list plus a global style
//! spec, using JSON response mode with a fallback model list.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use adgen_models::{Overlay, OverlayPosition, Scene, SceneRole, StyleSpec};

use crate::error::{ServiceError, ServiceResult};
use crate::traits::{PlanRequest, ScenePlan, ScenePlanner};

const SERVICE: &str = "gemini";

/// Gemini API client implementing the scene planner contract.
pub struct GeminiPlanner {
    api_key: String,
    client: Client,
    base_url: String,
}

/// Gemini API request.
#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
}

/// Gemini API response.
#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: String,
}

/// Plan payload returned by the model.
#[derive(Debug, Deserialize)]
struct PlanPayload {
    scenes: Vec<ScenePayload>,
    style_spec: StylePayload,
}

#[derive(Debug, Deserialize)]
struct ScenePayload {
    role: SceneRole,
    duration: u32,
    background_prompt: String,
    #[serde(default)]
    overlay: Option<OverlayPayload>,
    #[serde(default)]
    uses_product: bool,
}

#[derive(Debug, Deserialize)]
struct OverlayPayload {
    text: String,
    #[serde(default)]
    position: OverlayPosition,
    #[serde(default)]
    font_size: Option<u32>,
    #[serde(default)]
    duration: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct StylePayload {
    lighting: String,
    camera_style: String,
    mood: String,
    #[serde(default)]
    color_palette: Vec<String>,
    texture: String,
    grade: String,
}

impl GeminiPlanner {
    /// Create a new planner from the `GEMINI_API_KEY` environment variable.
    pub fn from_env() -> ServiceResult<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| ServiceError::config_error("GEMINI_API_KEY not set"))?;
        Ok(Self::new(api_key))
    }

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            client: Client::new(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        }
    }

    /// Override the API base URL (tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Build the planning prompt.
    fn build_prompt(&self, request: &PlanRequest) -> String {
        let num_scenes = 4;
        let scene_duration = request.duration / num_scenes;
        let product_instructions = if request.has_product_asset {
            "- A cut-out image of the product will be composited into every scene \
             you mark with \"uses_product\": true. Mark at least the showcase and \
             cta scenes."
        } else {
            "- There is no product image. Set \"uses_product\": false on every scene."
        };
        format!(
            r##"You are an expert video producer creating a short advertising video.

Product brief: {brief}
Brand: {brand}
Brand colors: {colors}
Total duration: {duration} seconds
Target audience: {audience}

Create a {num_scenes}-scene structure (roles: hook, showcase, social_proof, cta),
roughly {scene_duration} seconds each, plus one global style spec applied to
every scene.

IMPORTANT: You must strictly follow this output format.
Return ONLY a single JSON object with this schema:
{{
  "scenes": [
    {{
      "role": "hook",
      "duration": {scene_duration},
      "background_prompt": "luxurious lifestyle setting, modern minimalist aesthetic, warm lighting",
      "overlay": {{"text": "Short punchy line", "position": "center", "font_size": 48, "duration": {scene_duration}}},
      "uses_product": false
    }}
  ],
  "style_spec": {{
    "lighting": "soft golden hour",
    "camera_style": "slow dolly",
    "mood": "aspirational",
    "color_palette": ["#E8C4B8", "#2F2F2F"],
    "texture": "silk and glass",
    "grade": "warm filmic"
  }}
}}

Additional instructions:
- Return ONLY a single JSON object and nothing else.
- Scene durations must sum to the total duration.
- Overlay text must be at most 8 words.
{product_instructions}
"##,
            brief = request.brief,
            brand = request.brand_name,
            colors = request.brand_colors.join(", "),
            duration = request.duration,
            audience = request.target_audience,
            num_scenes = num_scenes,
            scene_duration = scene_duration.max(1),
            product_instructions = product_instructions,
        )
    }

    /// Call the Gemini API with one model.
    async fn call_api(&self, model: &str, prompt: &str) -> ServiceResult<PlanPayload> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        );

        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
            },
        };

        let response = self.client.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ServiceError::api(SERVICE, status.as_u16(), error_text));
        }

        let gemini_response: GeminiResponse = response.json().await?;

        let text = gemini_response
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.as_str())
            .ok_or_else(|| ServiceError::malformed(SERVICE, "no content in response"))?;

        serde_json::from_str(strip_markdown_fences(text))
            .map_err(|e| ServiceError::malformed(SERVICE, format!("plan JSON: {}", e)))
    }
}

/// Models that occasionally ignore JSON mode wrap output in a code block.
fn strip_markdown_fences(text: &str) -> &str {
    let text = text.trim();
    let text = text.strip_prefix("```json").unwrap_or(text);
    let text = text.strip_suffix("```").unwrap_or(text);
    text.trim()
}

#[async_trait::async_trait]
impl ScenePlanner for GeminiPlanner {
    async fn plan(&self, request: &PlanRequest) -> ServiceResult<ScenePlan> {
        let prompt = self.build_prompt(request);

        let models = ["gemini-2.5-flash", "gemini-2.5-flash-lite", "gemini-2.5-pro"];
        let mut last_error = None;

        for model in &models {
            info!("Planning scenes with model: {}", model);
            match self.call_api(model, &prompt).await {
                Ok(payload) => {
                    let plan = payload_to_plan(payload)?;
                    info!("Planned {} scenes", plan.scenes.len());
                    return Ok(plan);
                }
                Err(e) => {
                    warn!("Planning failed with model {}: {}", model, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| ServiceError::malformed(SERVICE, "all planner models failed")))
    }
}

/// Convert the wire payload into ordered domain scenes.
fn payload_to_plan(payload: PlanPayload) -> ServiceResult<ScenePlan> {
    if payload.scenes.is_empty() {
        return Err(ServiceError::malformed(SERVICE, "plan contains no scenes"));
    }

    let scenes = payload
        .scenes
        .into_iter()
        .enumerate()
        .map(|(index, scene)| Scene {
            id: index as u32,
            role: scene.role,
            duration: scene.duration.max(1),
            background_prompt: scene.background_prompt,
            overlay: scene.overlay.map(|o| Overlay {
                text: o.text,
                position: o.position,
                font_size: o.font_size,
                duration: o.duration,
            }),
            uses_product: scene.uses_product,
        })
        .collect();

    Ok(ScenePlan {
        scenes,
        style_spec: StyleSpec {
            lighting: payload.style_spec.lighting,
            camera_style: payload.style_spec.camera_style,
            mood: payload.style_spec.mood,
            color_palette: payload.style_spec.color_palette,
            texture: payload.style_spec.texture,
            grade: payload.style_spec.grade,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;
    use wiremock::matchers::{method, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn plan_json() -> String {
        json!({
            "scenes": [
                {"role": "hook", "duration": 7, "background_prompt": "sunrise over water",
                 "overlay": {"text": "Wake up glowing", "position": "center"}},
                {"role": "cta", "duration": 8, "background_prompt": "product on marble",
                 "uses_product": true}
            ],
            "style_spec": {
                "lighting": "soft", "camera_style": "static", "mood": "calm",
                "color_palette": ["#FFFFFF"], "texture": "marble", "grade": "neutral"
            }
        })
        .to_string()
    }

    fn gemini_body(text: String) -> serde_json::Value {
        json!({"candidates": [{"content": {"parts": [{"text": text}]}}]})
    }

    fn sample_request() -> PlanRequest {
        PlanRequest {
            brief: "Premium skincare serum".to_string(),
            brand_name: "Lumea".to_string(),
            brand_colors: vec!["#E8C4B8".to_string()],
            duration: 15,
            target_audience: "general consumers".to_string(),
            has_product_asset: false,
        }
    }

    #[test]
    fn test_strip_markdown_fences() {
        assert_eq!(strip_markdown_fences("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_markdown_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
    }

    #[tokio::test]
    async fn test_plan_assigns_ordinal_scene_ids() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_regex(r"/models/.*:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(gemini_body(plan_json())))
            .mount(&server)
            .await;

        let planner = GeminiPlanner::new("key").with_base_url(server.uri());
        let plan = planner.plan(&sample_request()).await.unwrap();

        assert_eq!(plan.scenes.len(), 2);
        assert_eq!(plan.scenes[0].id, 0);
        assert_eq!(plan.scenes[1].id, 1);
        assert_eq!(plan.scenes[0].role, SceneRole::Hook);
        assert!(!plan.scenes[0].uses_product);
        assert!(plan.scenes[1].uses_product);
        assert_eq!(plan.style_spec.mood, "calm");
    }

    #[test]
    fn test_prompt_mentions_product_only_when_asset_present() {
        let planner = GeminiPlanner::new("key");

        let without = planner.build_prompt(&sample_request());
        assert!(without.contains("There is no product image"));

        let mut request = sample_request();
        request.has_product_asset = true;
        let with = planner.build_prompt(&request);
        assert!(with.contains("cut-out image of the product"));
        assert!(with.contains("showcase"));
    }

    #[tokio::test]
    async fn test_plan_handles_fenced_output() {
        let server = MockServer::start().await;
        let fenced = format!("```json\n{}\n```", plan_json());
        Mock::given(method("POST"))
            .and(path_regex(r"/models/.*:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(gemini_body(fenced)))
            .mount(&server)
            .await;

        let planner = GeminiPlanner::new("key").with_base_url(server.uri());
        assert!(planner.plan(&sample_request()).await.is_ok());
    }

    #[tokio::test]
    async fn test_plan_fails_after_all_models() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_regex(r"/models/.*:generateContent"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let planner = GeminiPlanner::new("key").with_base_url(server.uri());
        assert!(planner.plan(&sample_request()).await.is_err());
    }
}
