//! Firestore REST implementation of the project store.
//!
//! Projects live as documents under `projects/{id}`. The configuration
//! blob is stored as a single JSON string field so the planning stage's
//! write-back stays one atomic field update.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use gcp_auth::{CustomServiceAccount, TokenProvider};
use metrics::counter;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tracing::{debug, info};

use adgen_models::{
    AdProjectConfig, ArtifactMap, CostBreakdown, Money, Project, ProjectId, ProjectStatus,
};

use crate::error::{StoreError, StoreResult};
use crate::store::ProjectStore;

const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";
const COLLECTION: &str = "projects";

/// Firestore store configuration.
#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    /// GCP project ID
    pub project_id: String,
    /// Database ID (usually "(default)")
    pub database_id: String,
    /// Request timeout
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
}

impl FirestoreConfig {
    /// Create config from environment variables.
    pub fn from_env() -> StoreResult<Self> {
        let project_id = std::env::var("GCP_PROJECT_ID")
            .map_err(|_| StoreError::auth_error("GCP_PROJECT_ID must be set to access Firestore"))?;

        Ok(Self {
            project_id,
            database_id: std::env::var("FIRESTORE_DATABASE_ID")
                .unwrap_or_else(|_| "(default)".to_string()),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(5),
        })
    }
}

enum AuthMode {
    ServiceAccount(Arc<dyn TokenProvider>),
    /// Fixed token, for tests against a local mock server.
    Static(String),
}

/// Firestore-backed project store.
pub struct FirestoreProjectStore {
    http: Client,
    base_url: String,
    auth: AuthMode,
}

impl FirestoreProjectStore {
    /// Create a new store from configuration.
    pub async fn new(config: FirestoreConfig) -> StoreResult<Self> {
        let service_account = CustomServiceAccount::from_env()
            .map_err(|e| StoreError::auth_error(format!("Failed to load service account: {}", e)))?
            .ok_or_else(|| {
                StoreError::auth_error(
                    "GOOGLE_APPLICATION_CREDENTIALS not set. \
                     Set it to the path of your service account JSON file.",
                )
            })?;

        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .user_agent(concat!("adgen-store/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let base_url = format!(
            "https://firestore.googleapis.com/v1/projects/{}/databases/{}/documents",
            config.project_id, config.database_id
        );

        Ok(Self {
            http,
            base_url,
            auth: AuthMode::ServiceAccount(Arc::new(service_account)),
        })
    }

    /// Create from environment variables.
    pub async fn from_env() -> StoreResult<Self> {
        Self::new(FirestoreConfig::from_env()?).await
    }

    /// Create a store pointed at an arbitrary base URL with a fixed
    /// bearer token. Used by tests against a mock server.
    pub fn with_base_url(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
            auth: AuthMode::Static(token.into()),
        }
    }

    async fn token(&self) -> StoreResult<String> {
        match &self.auth {
            AuthMode::ServiceAccount(provider) => {
                let token = provider
                    .token(&[DATASTORE_SCOPE])
                    .await
                    .map_err(|e| StoreError::auth_error(format!("Token request failed: {}", e)))?;
                Ok(token.as_str().to_string())
            }
            AuthMode::Static(token) => Ok(token.clone()),
        }
    }

    fn document_url(&self, id: &ProjectId) -> String {
        format!("{}/{}/{}", self.base_url, COLLECTION, id)
    }

    /// Patch a subset of fields on the project document.
    async fn patch_fields(
        &self,
        op: &'static str,
        id: &ProjectId,
        mut fields: serde_json::Map<String, Value>,
    ) -> StoreResult<()> {
        fields.insert("updated_at".to_string(), timestamp_value(Utc::now()));

        let mask: Vec<(&str, String)> = fields
            .keys()
            .map(|k| ("updateMask.fieldPaths", k.clone()))
            .collect();

        let token = self.token().await?;
        let response = self
            .http
            .patch(self.document_url(id))
            .query(&mask)
            .bearer_auth(&token)
            .json(&json!({ "fields": Value::Object(fields) }))
            .send()
            .await?;

        let status = response.status();
        counter!("store_requests_total", "op" => op).increment(1);

        match status {
            StatusCode::OK => {
                debug!(project_id = %id, op, "Patched project document");
                Ok(())
            }
            StatusCode::NOT_FOUND => Err(StoreError::NotFound(id.to_string())),
            _ => {
                counter!("store_request_errors_total", "op" => op).increment(1);
                let body = response.text().await.unwrap_or_default();
                Err(StoreError::from_http_status(status.as_u16(), body))
            }
        }
    }
}

#[async_trait]
impl ProjectStore for FirestoreProjectStore {
    async fn get(&self, id: &ProjectId) -> StoreResult<Option<Project>> {
        let token = self.token().await?;
        let response = self
            .http
            .get(self.document_url(id))
            .bearer_auth(&token)
            .send()
            .await?;

        counter!("store_requests_total", "op" => "get").increment(1);

        match response.status() {
            StatusCode::OK => {
                let doc: Value = response.json().await?;
                let project = document_to_project(id, &doc)?;
                Ok(Some(project))
            }
            StatusCode::NOT_FOUND => Ok(None),
            status => {
                counter!("store_request_errors_total", "op" => "get").increment(1);
                let body = response.text().await.unwrap_or_default();
                Err(StoreError::from_http_status(status.as_u16(), body))
            }
        }
    }

    async fn set_status(
        &self,
        id: &ProjectId,
        status: ProjectStatus,
        progress: u8,
        error_message: Option<&str>,
    ) -> StoreResult<()> {
        let mut fields = serde_json::Map::new();
        fields.insert("status".to_string(), string_value(status.as_str()));
        fields.insert("progress".to_string(), integer_value(progress.min(100) as i64));
        if let Some(message) = error_message {
            fields.insert("error_message".to_string(), string_value(message));
        }

        self.patch_fields("set_status", id, fields).await?;
        info!(project_id = %id, status = %status, progress, "Updated project status");
        Ok(())
    }

    async fn set_cost(&self, id: &ProjectId, cost: Money) -> StoreResult<()> {
        let mut fields = serde_json::Map::new();
        fields.insert("cost_cents".to_string(), integer_value(cost.cents()));
        self.patch_fields("set_cost", id, fields).await
    }

    async fn set_config(&self, id: &ProjectId, config: &AdProjectConfig) -> StoreResult<()> {
        let mut fields = serde_json::Map::new();
        fields.insert(
            "config_json".to_string(),
            string_value(&serde_json::to_string(config)?),
        );
        self.patch_fields("set_config", id, fields).await
    }

    async fn set_durable_folder(&self, id: &ProjectId, folder: &str) -> StoreResult<()> {
        let mut fields = serde_json::Map::new();
        fields.insert("durable_folder".to_string(), string_value(folder));
        self.patch_fields("set_durable_folder", id, fields).await
    }

    async fn set_output(
        &self,
        id: &ProjectId,
        artifacts: &ArtifactMap,
        total_cost: Money,
        breakdown: &CostBreakdown,
    ) -> StoreResult<()> {
        let mut fields = serde_json::Map::new();
        fields.insert("status".to_string(), string_value(ProjectStatus::Completed.as_str()));
        fields.insert("progress".to_string(), integer_value(100));
        fields.insert("cost_cents".to_string(), integer_value(total_cost.cents()));
        fields.insert(
            "artifacts_json".to_string(),
            string_value(&serde_json::to_string(artifacts)?),
        );
        fields.insert(
            "cost_breakdown_json".to_string(),
            string_value(&serde_json::to_string(breakdown)?),
        );
        fields.insert("completed_at".to_string(), timestamp_value(Utc::now()));

        self.patch_fields("set_output", id, fields).await?;
        info!(project_id = %id, total_cost = %total_cost, "Persisted final project output");
        Ok(())
    }
}

// =============================================================================
// Document mapping
// =============================================================================

fn string_value(s: &str) -> Value {
    json!({ "stringValue": s })
}

fn integer_value(i: i64) -> Value {
    // Firestore encodes 64-bit integers as strings
    json!({ "integerValue": i.to_string() })
}

fn timestamp_value(ts: chrono::DateTime<Utc>) -> Value {
    json!({ "timestampValue": ts.to_rfc3339() })
}

fn get_string(fields: &Value, name: &str) -> Option<String> {
    fields
        .get(name)
        .and_then(|v| v.get("stringValue"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn get_integer(fields: &Value, name: &str) -> Option<i64> {
    fields
        .get(name)
        .and_then(|v| v.get("integerValue"))
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
}

fn get_timestamp(fields: &Value, name: &str) -> Option<chrono::DateTime<Utc>> {
    fields
        .get(name)
        .and_then(|v| v.get("timestampValue"))
        .and_then(Value::as_str)
        .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Build a `Project` from a Firestore document body.
fn document_to_project(id: &ProjectId, doc: &Value) -> StoreResult<Project> {
    let fields = doc
        .get("fields")
        .ok_or_else(|| StoreError::invalid_document("missing fields"))?;

    let config_json = get_string(fields, "config_json")
        .ok_or_else(|| StoreError::invalid_document("missing config_json"))?;
    let config: AdProjectConfig = serde_json::from_str(&config_json)?;

    let status_str = get_string(fields, "status")
        .ok_or_else(|| StoreError::invalid_document("missing status"))?;
    let status: ProjectStatus = serde_json::from_value(Value::String(status_str.clone()))
        .map_err(|_| StoreError::invalid_document(format!("unknown status: {}", status_str)))?;

    let now = Utc::now();
    Ok(Project {
        id: id.clone(),
        user_id: get_string(fields, "user_id").unwrap_or_default(),
        title: get_string(fields, "title").unwrap_or_default(),
        config,
        status,
        progress: get_integer(fields, "progress").unwrap_or(0).clamp(0, 100) as u8,
        cost: Money::from_cents(get_integer(fields, "cost_cents").unwrap_or(0)),
        error_message: get_string(fields, "error_message"),
        durable_folder: get_string(fields, "durable_folder"),
        created_at: get_timestamp(fields, "created_at").unwrap_or(now),
        updated_at: get_timestamp(fields, "updated_at").unwrap_or(now),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use wiremock::matchers::{bearer_token, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sample_document() -> Value {
        let config = json!({
            "brief": "Premium skincare serum",
            "duration": 30,
            "mood": "uplifting",
            "brand": {"name": "Lumea", "primary_color": "#E8C4B8"}
        });
        json!({
            "name": "projects/p/databases/(default)/documents/projects/abc",
            "fields": {
                "user_id": {"stringValue": "user-1"},
                "title": {"stringValue": "Serum ad"},
                "config_json": {"stringValue": config.to_string()},
                "status": {"stringValue": "PENDING"},
                "progress": {"integerValue": "0"},
                "cost_cents": {"integerValue": "0"},
                "created_at": {"timestampValue": "2025-06-01T12:00:00Z"},
                "updated_at": {"timestampValue": "2025-06-01T12:00:00Z"}
            }
        })
    }

    #[test]
    fn test_document_to_project() {
        let id = ProjectId::from_string("abc");
        let project = document_to_project(&id, &sample_document()).unwrap();

        assert_eq!(project.id.as_str(), "abc");
        assert_eq!(project.status, ProjectStatus::Pending);
        assert_eq!(project.progress, 0);
        assert_eq!(project.cost, Money::ZERO);
        assert_eq!(project.config.brief, "Premium skincare serum");
        assert!(project.config.scenes.is_empty());
    }

    #[test]
    fn test_document_missing_config_is_invalid() {
        let id = ProjectId::from_string("abc");
        let doc = json!({"fields": {"status": {"stringValue": "PENDING"}}});
        assert!(matches!(
            document_to_project(&id, &doc),
            Err(StoreError::InvalidDocument(_))
        ));
    }

    #[tokio::test]
    async fn test_get_returns_none_on_404() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/projects/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let store = FirestoreProjectStore::with_base_url(server.uri(), "test-token");
        let result = store.get(&ProjectId::from_string("missing")).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_get_parses_document() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/projects/abc"))
            .and(bearer_token("test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_document()))
            .mount(&server)
            .await;

        let store = FirestoreProjectStore::with_base_url(server.uri(), "test-token");
        let project = store.get(&ProjectId::from_string("abc")).await.unwrap().unwrap();
        assert_eq!(project.title, "Serum ad");
    }

    #[tokio::test]
    async fn test_set_status_patches_masked_fields() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/projects/abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "x"})))
            .expect(1)
            .mount(&server)
            .await;

        let store = FirestoreProjectStore::with_base_url(server.uri(), "test-token");
        store
            .set_status(
                &ProjectId::from_string("abc"),
                ProjectStatus::Planning,
                15,
                None,
            )
            .await
            .unwrap();
    }
}
