/// Common test utilities for HTTP tests
///
/// The router runs over the in-memory store, a filesystem blob store in a
/// temporary directory, and a recording notifier. No database or mail relay
/// is needed.

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use taskhub_api::app::{build_router, AppState};
use taskhub_api::config::Config;
use taskhub_shared::notify::NotificationDispatcher;
use taskhub_shared::storage::LocalBlobStore;
use taskhub_shared::store::MemoryStore;
use taskhub_shared::testing::RecordingNotifier;
use tempfile::TempDir;
use tower::Service as _;

pub const TEST_PASSWORD: &str = "password123";
pub const PUBLIC_URL: &str = "http://taskhub.test";

const BOUNDARY: &str = "taskhub-test-boundary";

/// Test context containing all necessary resources
pub struct TestContext {
    pub app: axum::Router,
    pub state: AppState,
    pub notifier: Arc<RecordingNotifier>,
    pub dispatcher: NotificationDispatcher,

    /// Holds the blob directory alive for the duration of the test
    pub storage_dir: TempDir,
}

impl TestContext {
    pub async fn new() -> Self {
        let storage_dir = tempfile::tempdir().unwrap();

        let vars: HashMap<String, String> = [
            ("DATABASE_URL", "postgresql://unused/taskhub"),
            ("JWT_SECRET", "http-test-secret-of-at-least-32-characters"),
            ("STORAGE_PUBLIC_URL", PUBLIC_URL),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .chain([(
            "STORAGE_DIR".to_string(),
            storage_dir.path().display().to_string(),
        )])
        .collect();

        let config = Config::from_map(&vars).unwrap();
        Self::with_config(config, storage_dir).await
    }

    /// A server without attachment storage
    pub async fn without_storage() -> Self {
        let storage_dir = tempfile::tempdir().unwrap();
        let mut config = Self::new().await.state.config.as_ref().clone();
        config.storage = None;
        Self::with_config(config, storage_dir).await
    }

    async fn with_config(config: Config, storage_dir: TempDir) -> Self {
        let files = match &config.storage {
            Some(storage) => {
                let files = LocalBlobStore::new(
                    storage.dir.clone(),
                    storage.public_url.clone(),
                    storage.signing_key.clone().into_bytes(),
                );
                files.initialize().await.unwrap();
                Some(Arc::new(files))
            }
            None => None,
        };

        let notifier = Arc::new(RecordingNotifier::new());
        let dispatcher = NotificationDispatcher::new(notifier.clone());
        let state = AppState::new(config, Arc::new(MemoryStore::new()), files, dispatcher.clone());

        Self {
            app: build_router(state.clone()),
            state,
            notifier,
            dispatcher,
            storage_dir,
        }
    }

    pub async fn call(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().call(request).await.unwrap()
    }

    /// Sends a JSON request and returns the status with the decoded body
    ///
    /// Empty bodies decode to `Value::Null`.
    pub async fn send(&self, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.call(request).await;
        let status = response.status();
        (status, json_body(response).await)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send("GET", uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send("POST", uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send("PUT", uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send("DELETE", uri, Some(token), None).await
    }

    /// Registers `<name>@example.com` and returns `(token, user_id)`
    pub async fn register(&self, name: &str) -> (String, String) {
        let (status, body) = self
            .send(
                "POST",
                "/v1/auth/register",
                None,
                Some(serde_json::json!({
                    "name": name,
                    "email": format!("{}@example.com", name.to_lowercase()),
                    "password": TEST_PASSWORD,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

        (
            body["token"].as_str().unwrap().to_string(),
            body["user"]["id"].as_str().unwrap().to_string(),
        )
    }

    /// Seeds an admin account and logs in through the API
    pub async fn admin(&self) -> String {
        self.state
            .services
            .users
            .seed_admin("admin@example.com", TEST_PASSWORD, "Admin")
            .await
            .unwrap();

        let (status, body) = self
            .send(
                "POST",
                "/v1/auth/login",
                None,
                Some(serde_json::json!({
                    "email": "admin@example.com",
                    "password": TEST_PASSWORD,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "admin login failed: {}", body);
        body["token"].as_str().unwrap().to_string()
    }

    pub async fn create_project(&self, token: &str, name: &str) -> String {
        let (status, body) = self
            .post("/v1/projects", token, serde_json::json!({ "name": name }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create project failed: {}", body);
        body["id"].as_str().unwrap().to_string()
    }

    pub async fn add_member(&self, token: &str, project_id: &str, user_id: &str) {
        let (status, body) = self
            .post(
                &format!("/v1/projects/{}/members", project_id),
                token,
                serde_json::json!({ "user_id": user_id }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "add member failed: {}", body);
    }

    pub async fn create_task(&self, token: &str, project_id: &str, title: &str) -> String {
        let (status, body) = self
            .post(
                &format!("/v1/projects/{}/tasks", project_id),
                token,
                serde_json::json!({ "title": title }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create task failed: {}", body);
        body["id"].as_str().unwrap().to_string()
    }

    /// Posts a single multipart field
    pub async fn upload(
        &self,
        token: &str,
        task_id: &str,
        field: &str,
        filename: &str,
        content_type: &str,
        data: &[u8],
    ) -> Response<Body> {
        let request = Request::builder()
            .method("POST")
            .uri(format!("/v1/tasks/{}/attachments", task_id))
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart_body(field, filename, content_type, data)))
            .unwrap();

        self.call(request).await
    }
}

pub fn multipart_body(field: &str, filename: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
            BOUNDARY, field, filename, content_type
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = body_bytes(response).await;
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}
