//! Replicate predictions API adapters.
//!
//! Three stage collaborators ride on the same submit-and-poll flow:
//! text-to-video scene generation, MusicGen background music and
//! product background removal. Video and audio outputs are delivery
//! URLs with a short expiry; the artifact relay copies them to durable
//! storage before anything depends on them.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use adgen_models::StyleSpec;

use crate::error::{ServiceError, ServiceResult};
use crate::traits::{AudioGenerator, ProductExtractor, SceneVideoGenerator};

const SERVICE: &str = "replicate";

/// Replicate client configuration.
#[derive(Debug, Clone)]
pub struct ReplicateConfig {
    pub api_token: String,
    pub base_url: String,
    /// Delay between poll requests
    pub poll_interval: Duration,
    /// Overall per-prediction deadline
    pub poll_timeout: Duration,
}

impl ReplicateConfig {
    /// Create config from the `REPLICATE_API_TOKEN` environment variable.
    pub fn from_env() -> ServiceResult<Self> {
        let api_token = std::env::var("REPLICATE_API_TOKEN")
            .map_err(|_| ServiceError::config_error("REPLICATE_API_TOKEN not set"))?;
        Ok(Self {
            api_token,
            base_url: "https://api.replicate.com/v1".to_string(),
            poll_interval: Duration::from_secs(3),
            poll_timeout: Duration::from_secs(600),
        })
    }
}

/// Prediction creation request.
#[derive(Debug, Serialize)]
struct PredictionRequest<'a> {
    version: &'a str,
    input: Value,
}

/// Prediction state returned by the API.
#[derive(Debug, Deserialize)]
struct Prediction {
    id: String,
    status: String,
    #[serde(default)]
    output: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

impl Prediction {
    fn is_terminal(&self) -> bool {
        matches!(self.status.as_str(), "succeeded" | "failed" | "canceled")
    }
}

/// Shared Replicate predictions client.
#[derive(Clone)]
pub struct ReplicateClient {
    http: Client,
    config: ReplicateConfig,
}

impl ReplicateClient {
    pub fn new(config: ReplicateConfig) -> Self {
        Self {
            http: Client::new(),
            config,
        }
    }

    pub fn from_env() -> ServiceResult<Self> {
        Ok(Self::new(ReplicateConfig::from_env()?))
    }

    /// Submit a prediction and poll it to a terminal state. Returns the
    /// first output URL.
    pub async fn predict(&self, version: &str, input: Value) -> ServiceResult<String> {
        let prediction = self.create_prediction(version, input).await?;
        debug!("Created prediction {}", prediction.id);

        let prediction = self.poll_prediction(prediction).await?;

        match prediction.status.as_str() {
            "succeeded" => extract_output_url(prediction.output.as_ref()),
            _ => Err(ServiceError::malformed(
                SERVICE,
                format!(
                    "prediction {} ended {}: {}",
                    prediction.id,
                    prediction.status,
                    prediction
                        .error
                        .map(|e| e.to_string())
                        .unwrap_or_else(|| "no error detail".to_string())
                ),
            )),
        }
    }

    async fn create_prediction(&self, version: &str, input: Value) -> ServiceResult<Prediction> {
        let url = format!("{}/predictions", self.config.base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_token)
            .json(&PredictionRequest { version, input })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::api(SERVICE, status.as_u16(), body));
        }

        Ok(response.json().await?)
    }

    async fn poll_prediction(&self, mut prediction: Prediction) -> ServiceResult<Prediction> {
        let url = format!("{}/predictions/{}", self.config.base_url, prediction.id);
        let deadline = tokio::time::Instant::now() + self.config.poll_timeout;

        while !prediction.is_terminal() {
            if tokio::time::Instant::now() >= deadline {
                return Err(ServiceError::Timeout {
                    service: SERVICE,
                    timeout_secs: self.config.poll_timeout.as_secs(),
                });
            }
            tokio::time::sleep(self.config.poll_interval).await;

            let response = self
                .http
                .get(&url)
                .bearer_auth(&self.config.api_token)
                .send()
                .await?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(ServiceError::api(SERVICE, status.as_u16(), body));
            }

            prediction = response.json().await?;
        }

        Ok(prediction)
    }
}

/// Output is either a bare URL string or a list of URLs.
fn extract_output_url(output: Option<&Value>) -> ServiceResult<String> {
    match output {
        Some(Value::String(url)) => Ok(url.clone()),
        Some(Value::Array(items)) => items
            .first()
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ServiceError::malformed(SERVICE, "empty output list")),
        _ => Err(ServiceError::malformed(SERVICE, "missing output")),
    }
}

// =============================================================================
// Scene video generation
// =============================================================================

/// Text-to-video adapter (ByteDance SeedAnce lite).
pub struct ReplicateVideoGenerator {
    client: ReplicateClient,
    version: String,
}

impl ReplicateVideoGenerator {
    pub fn new(client: ReplicateClient) -> Self {
        Self {
            client,
            version: std::env::var("VIDEO_MODEL_VERSION")
                .unwrap_or_else(|_| "bytedance/seedance-1-lite".to_string()),
        }
    }

    /// Append the global style spec to a scene prompt so all scenes share
    /// one visual language.
    fn enhance_prompt(prompt: &str, style_spec: Option<&StyleSpec>) -> String {
        let Some(spec) = style_spec else {
            return prompt.to_string();
        };
        format!(
            "{}. Lighting: {}. Camera: {}. Mood: {}. Grade: {}",
            prompt, spec.lighting, spec.camera_style, spec.mood, spec.grade
        )
    }
}

#[async_trait::async_trait]
impl SceneVideoGenerator for ReplicateVideoGenerator {
    async fn generate(
        &self,
        prompt: &str,
        style_spec: Option<&StyleSpec>,
        duration: u32,
    ) -> ServiceResult<String> {
        let enhanced = Self::enhance_prompt(prompt, style_spec);
        info!("Generating scene background: {:.60}...", enhanced);

        let input = json!({
            "prompt": enhanced,
            "duration": duration,
            "aspect_ratio": "16:9",
        });

        self.client.predict(&self.version, input).await
    }
}

// =============================================================================
// Background music
// =============================================================================

/// MusicGen adapter.
pub struct ReplicateAudioGenerator {
    client: ReplicateClient,
    version: String,
}

impl ReplicateAudioGenerator {
    pub fn new(client: ReplicateClient) -> Self {
        Self {
            client,
            version: std::env::var("MUSIC_MODEL_VERSION")
                .unwrap_or_else(|_| "meta/musicgen".to_string()),
        }
    }

    /// Expand a mood keyword into a prompt MusicGen responds well to.
    fn music_prompt(mood: &str, duration: u32) -> String {
        let mood_lower = mood.to_lowercase();
        let mood_text = match mood_lower.as_str() {
            "uplifting" => "bright, optimistic, feel-good melody with building energy",
            "energetic" => "driving, high-tempo rhythm with punchy percussion",
            "calm" => "gentle, ambient, slowly evolving pads",
            "modern" => "minimal electronic groove with clean synths",
            "luxury" => "elegant, understated strings and piano",
            other => other,
        };
        format!(
            "Instrumental background music for a {}s product advertisement. \
             Mood: {}. No vocals, loopable, broadcast quality.",
            duration, mood_text
        )
    }
}

#[async_trait::async_trait]
impl AudioGenerator for ReplicateAudioGenerator {
    async fn generate_music(&self, mood: &str, duration: u32) -> ServiceResult<String> {
        info!("Generating {} background music ({}s)", mood, duration);

        let input = json!({
            "prompt": Self::music_prompt(mood, duration),
            "duration": duration,
            "output_format": "mp3",
        });

        self.client.predict(&self.version, input).await
    }
}

// =============================================================================
// Product extraction
// =============================================================================

/// Background removal adapter for the uploaded product image.
pub struct ReplicateProductExtractor {
    client: ReplicateClient,
    version: String,
}

impl ReplicateProductExtractor {
    pub fn new(client: ReplicateClient) -> Self {
        Self {
            client,
            version: std::env::var("REMBG_MODEL_VERSION")
                .unwrap_or_else(|_| "851-labs/background-remover".to_string()),
        }
    }
}

#[async_trait::async_trait]
impl ProductExtractor for ReplicateProductExtractor {
    async fn extract(&self, image_url: &str) -> ServiceResult<String> {
        info!("Extracting product from {}", image_url);
        let input = json!({ "image": image_url });
        self.client.predict(&self.version, input).await
    }
}
