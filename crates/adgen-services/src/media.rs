//! Client for the internal media processing service.
//!
//! Compositing, text overlays and the final multi-aspect render are
//! ffmpeg-heavy jobs that run in a dedicated service. The endpoints are
//! synchronous: one POST per job, the response carries the durable
//! output URL(s).

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

use adgen_models::{ArtifactMap, AspectRatio, Overlay, Scene};

use crate::error::{ServiceError, ServiceResult};
use crate::traits::{Compositor, FinalRenderer, OverlayRenderer, Placement};

const SERVICE: &str = "media";

/// Media service configuration.
#[derive(Debug, Clone)]
pub struct MediaServiceConfig {
    pub base_url: String,
    pub api_key: String,
    /// Per-request deadline. Renders are the slowest jobs.
    pub request_timeout: Duration,
}

impl MediaServiceConfig {
    /// Create config from `MEDIA_SERVICE_URL` and `MEDIA_SERVICE_API_KEY`.
    pub fn from_env() -> ServiceResult<Self> {
        let base_url = std::env::var("MEDIA_SERVICE_URL")
            .map_err(|_| ServiceError::config_error("MEDIA_SERVICE_URL not set"))?;
        let api_key = std::env::var("MEDIA_SERVICE_API_KEY")
            .map_err(|_| ServiceError::config_error("MEDIA_SERVICE_API_KEY not set"))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            request_timeout: Duration::from_secs(900),
        })
    }
}

/// HTTP client for the media service. Implements the compositing,
/// overlay and final render contracts.
#[derive(Clone)]
pub struct MediaServiceClient {
    http: Client,
    config: MediaServiceConfig,
}

#[derive(Debug, Serialize)]
struct CompositeRequest<'a> {
    video_url: &'a str,
    product_url: &'a str,
    position: &'a str,
    scale: f32,
    scene_index: usize,
}

#[derive(Debug, Serialize)]
struct OverlayRequest<'a> {
    video_url: &'a str,
    text: &'a str,
    position: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    font_size: Option<u32>,
    /// Overlay hold time in seconds. Defaults to the scene duration.
    duration: u32,
    brand_color: &'a str,
    scene_index: usize,
}

#[derive(Debug, Serialize)]
struct RenderRequest<'a> {
    scene_urls: &'a [String],
    audio_url: &'a str,
    aspect_ratios: &'a [AspectRatio],
}

#[derive(Debug, Deserialize)]
struct JobResponse {
    output_url: String,
}

#[derive(Debug, Deserialize)]
struct RenderResponse {
    outputs: ArtifactMap,
}

impl MediaServiceClient {
    pub fn new(config: MediaServiceConfig) -> ServiceResult<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { http, config })
    }

    pub fn from_env() -> ServiceResult<Self> {
        Self::new(MediaServiceConfig::from_env()?)
    }

    async fn post_job<Req, Resp>(&self, endpoint: &str, body: &Req) -> ServiceResult<Resp>
    where
        Req: Serialize,
        Resp: for<'de> Deserialize<'de>,
    {
        let url = format!("{}/{}", self.config.base_url, endpoint);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response.text().await.unwrap_or_default();
            return Err(ServiceError::api(SERVICE, status.as_u16(), message));
        }

        Ok(response.json().await?)
    }
}

#[async_trait::async_trait]
impl Compositor for MediaServiceClient {
    async fn composite(
        &self,
        video_url: &str,
        product_url: &str,
        placement: &Placement,
        scene_index: usize,
    ) -> ServiceResult<String> {
        info!("Compositing product into scene {}", scene_index);
        let response: JobResponse = self
            .post_job(
                "v1/composite",
                &CompositeRequest {
                    video_url,
                    product_url,
                    position: &placement.position,
                    scale: placement.scale,
                    scene_index,
                },
            )
            .await?;
        Ok(response.output_url)
    }
}

#[async_trait::async_trait]
impl OverlayRenderer for MediaServiceClient {
    async fn overlay(
        &self,
        video_url: &str,
        overlay: &Overlay,
        scene: &Scene,
        brand_color: &str,
        scene_index: usize,
    ) -> ServiceResult<String> {
        info!("Rendering overlay for scene {}", scene_index);
        let response: JobResponse = self
            .post_job(
                "v1/overlay",
                &OverlayRequest {
                    video_url,
                    text: &overlay.text,
                    position: overlay.position.as_str(),
                    font_size: overlay.font_size,
                    duration: overlay.duration.unwrap_or(scene.duration),
                    brand_color,
                    scene_index,
                },
            )
            .await?;
        Ok(response.output_url)
    }
}

#[async_trait::async_trait]
impl FinalRenderer for MediaServiceClient {
    async fn render(
        &self,
        scene_urls: &[String],
        audio_url: &str,
        aspect_ratios: &[AspectRatio],
    ) -> ServiceResult<ArtifactMap> {
        info!(
            "Rendering final cut: {} scenes, {} aspect ratios",
            scene_urls.len(),
            aspect_ratios.len()
        );
        let response: RenderResponse = self
            .post_job(
                "v1/render",
                &RenderRequest {
                    scene_urls,
                    audio_url,
                    aspect_ratios,
                },
            )
            .await?;

        for ratio in aspect_ratios {
            if !response.outputs.contains_key(ratio) {
                return Err(ServiceError::malformed(
                    SERVICE,
                    format!("render output missing aspect ratio {}", ratio),
                ));
            }
        }

        Ok(response.outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use adgen_models::OverlayPosition;

    fn test_client(base_url: String) -> MediaServiceClient {
        MediaServiceClient::new(MediaServiceConfig {
            base_url,
            api_key: "key".to_string(),
            request_timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_composite_posts_placement() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/composite"))
            .and(header("authorization", "Bearer key"))
            .and(body_partial_json(json!({
                "position": "bottom_right", "scale": 0.25, "scene_index": 2
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "output_url": "https://cdn.example.com/composited-2.mp4"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let placement = Placement {
            position: "bottom_right".to_string(),
            scale: 0.25,
        };
        let url = client
            .composite("https://cdn/scene-2.mp4", "https://cdn/product.png", &placement, 2)
            .await
            .unwrap();
        assert_eq!(url, "https://cdn.example.com/composited-2.mp4");
    }

    #[tokio::test]
    async fn test_overlay_defaults_duration_to_scene() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/overlay"))
            .and(body_partial_json(json!({"text": "Shop now", "duration": 6})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "output_url": "https://cdn.example.com/overlaid-0.mp4"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let scene = Scene {
            id: 0,
            role: adgen_models::SceneRole::Cta,
            duration: 6,
            background_prompt: "product on marble".to_string(),
            overlay: None,
            uses_product: false,
        };
        let overlay = Overlay {
            text: "Shop now".to_string(),
            position: OverlayPosition::Center,
            font_size: None,
            duration: None,
        };

        let client = test_client(server.uri());
        let url = client
            .overlay("https://cdn/scene-0.mp4", &overlay, &scene, "#FF0000", 0)
            .await
            .unwrap();
        assert_eq!(url, "https://cdn.example.com/overlaid-0.mp4");
    }

    #[tokio::test]
    async fn test_render_returns_all_requested_ratios() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/render"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "outputs": {
                    "9:16": "https://cdn.example.com/final-9x16.mp4",
                    "1:1": "https://cdn.example.com/final-1x1.mp4"
                }
            })))
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let scenes = vec!["https://cdn/a.mp4".to_string(), "https://cdn/b.mp4".to_string()];
        let ratios = [AspectRatio::Vertical, AspectRatio::Square];
        let outputs = client
            .render(&scenes, "https://cdn/music.mp3", &ratios)
            .await
            .unwrap();

        assert_eq!(outputs.len(), 2);
        assert_eq!(
            outputs.get(&AspectRatio::Vertical).unwrap(),
            "https://cdn.example.com/final-9x16.mp4"
        );
    }

    #[tokio::test]
    async fn test_render_rejects_incomplete_output() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/render"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "outputs": {"9:16": "https://cdn.example.com/final-9x16.mp4"}
            })))
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let scenes = vec!["https://cdn/a.mp4".to_string()];
        let ratios = [AspectRatio::Vertical, AspectRatio::Wide];
        let err = client
            .render(&scenes, "https://cdn/music.mp3", &ratios)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("16:9"));
    }
}
