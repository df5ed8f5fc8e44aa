//! Main HTTP gateway server.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::Method,
    middleware,
    routing::{get, post},
};
use diagramlens_session::SessionStore;
use diagramlens_understanding::DiagramTutor;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, instrument};

use crate::rate_limit::{self, RateLimiter};
use crate::reaper;
use crate::routes::{chat, quiz, sessions};
use crate::{control_ui, health_api};

/// Slack on top of the image cap for multipart framing and other fields.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Tunables the gateway needs from configuration.
#[derive(Debug, Clone)]
pub struct GatewayOptions {
    pub max_upload_bytes: usize,
    pub question_count: u32,
    pub session_ttl: Duration,
    pub rate_limit_per_minute: u32,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        Self {
            max_upload_bytes: media::DEFAULT_MAX_UPLOAD_BYTES,
            question_count: 5,
            session_ttl: Duration::from_secs(3600),
            rate_limit_per_minute: 30,
        }
    }
}

/// Application state shared across routes.
#[derive(Clone)]
pub struct GatewayState {
    pub tutor: Arc<DiagramTutor>,
    pub sessions: SessionStore,
    pub limiter: RateLimiter,
    pub options: Arc<GatewayOptions>,
    pub started_at: Instant,
}

impl GatewayState {
    pub fn new(tutor: DiagramTutor, sessions: SessionStore, options: GatewayOptions) -> Self {
        Self {
            tutor: Arc::new(tutor),
            sessions,
            limiter: RateLimiter::per_minute(options.rate_limit_per_minute),
            options: Arc::new(options),
            started_at: Instant::now(),
        }
    }
}

/// Build the router. Routes that call the model sit behind the rate limiter.
pub fn build_router(state: GatewayState) -> Router {
    let model_routes = Router::new()
        .route("/api/sessions", post(sessions::create_session))
        .route("/api/sessions/:id/quiz/regenerate", post(quiz::regenerate))
        .route("/api/sessions/:id/chat", post(chat::ask))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::enforce,
        ));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/", get(control_ui::index))
        .route("/api/health", get(health_api::get_health))
        .route(
            "/api/sessions/:id",
            get(sessions::get_session).delete(sessions::delete_session),
        )
        .route("/api/sessions/:id/quiz/answer", post(quiz::answer))
        .route("/api/sessions/:id/quiz/next", post(quiz::next))
        .route("/api/sessions/:id/quiz/restart", post(quiz::restart))
        .merge(model_routes)
        .layer(DefaultBodyLimit::max(
            state.options.max_upload_bytes + MULTIPART_OVERHEAD_BYTES,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Serve until `shutdown` resolves, reaping idle sessions in the background.
#[instrument(skip(state, shutdown))]
pub async fn start_server(
    addr: SocketAddr,
    state: GatewayState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let reaper = reaper::spawn_reaper(state.clone());
    let app = build_router(state);

    let listener = TcpListener::bind(&addr).await?;
    info!(addr = %listener.local_addr()?, "Gateway HTTP server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await?;

    reaper.abort();
    info!("Gateway shut down");
    Ok(())
}

/// Resolves on Ctrl-C.
pub async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use async_trait::async_trait;
    use diagramlens_core::{
        LensError, LensResult, ModelProvider, ModelRequest, ModelResponse, Part,
    };
    use diagramlens_providers::{MockProvider, MockReply};
    use diagramlens_understanding::GenerationSettings;
    use serde_json::{Value, json};
    use tokio::sync::Notify;
    use tower::ServiceExt;

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13];
    const BOUNDARY: &str = "diagramlens-test-boundary";
    const EXPLANATION: &str = r#"{"title":"Cache","summary":"A **read-through** cache."}"#;
    const ONE_QUESTION: &str = r#"{"questions":[{"question":"What is cached?","options":["Reads","Writes"],"correct_index":0,"explanation":"Reads hit the cache first."}]}"#;

    fn app_with(provider: Arc<dyn ModelProvider>, options: GatewayOptions) -> Router {
        let tutor = DiagramTutor::new(provider, GenerationSettings::default());
        build_router(GatewayState::new(tutor, SessionStore::new(8), options))
    }

    fn demo_app() -> Router {
        app_with(Arc::new(MockProvider::demo()), GatewayOptions::default())
    }

    fn cache_mock() -> MockProvider {
        MockProvider::new("mock")
            .with_schema_reply("diagram_explanation", EXPLANATION)
            .with_schema_reply("diagram_quiz", ONE_QUESTION)
    }

    fn upload(field: &str, filename: &str, content_type: &str, data: &[u8]) -> Request<Body> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/api/sessions")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn png_upload() -> Request<Body> {
        upload("image", "diagram.png", "image/png", PNG)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn empty(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }

    async fn create(app: &Router) -> String {
        let (status, json) = send(app, png_upload()).await;
        assert_eq!(status, StatusCode::CREATED, "{json}");
        json["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn health_reports_provider() {
        let (status, json) = send(&demo_app(), empty("GET", "/api/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert_eq!(json["provider"], "mock");
        assert_eq!(json["sessions"], 0);
    }

    #[tokio::test]
    async fn index_serves_ui() {
        let response = demo_app().oneshot(empty("GET", "/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(String::from_utf8_lossy(&body).contains("/api/sessions"));
    }

    #[tokio::test]
    async fn upload_creates_session_with_explanation_and_quiz() {
        let app = demo_app();
        let (status, json) = send(&app, png_upload()).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["explanation"]["title"], "Client-server request flow");
        assert_eq!(json["explanation_blocks"][0]["kind"], "heading");
        assert_eq!(json["quiz"]["status"], "in_progress");
        assert_eq!(json["quiz"]["total"], 2);
        assert!(json["quiz_error"].is_null());
        assert!(json["image_data_url"].as_str().unwrap().starts_with("data:image/png;base64,"));

        let id = json["id"].as_str().unwrap();
        let (status, json) = send(&app, empty("GET", &format!("/api/sessions/{id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert!(json.get("image_data_url").is_none());
    }

    #[tokio::test]
    async fn quiz_flow_over_http() {
        let app = app_with(Arc::new(cache_mock()), GatewayOptions::default());
        let id = create(&app).await;
        let base = format!("/api/sessions/{id}/quiz");

        let (status, _) = send(&app, empty("POST", &format!("{base}/next"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, json) = send(&app, post_json(&format!("{base}/answer"), json!({"option": 1}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["feedback"]["correct"], false);
        assert_eq!(json["feedback"]["correct_index"], 0);
        assert_eq!(json["quiz"]["selected"], 1);

        let (status, json) = send(&app, post_json(&format!("{base}/answer"), json!({"option": 0}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("already answered"));

        let (status, json) = send(&app, empty("POST", &format!("{base}/next"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["quiz"]["status"], "finished");
        assert_eq!(json["quiz"]["score"]["correct"], 0);
        assert_eq!(json["quiz"]["score"]["total"], 1);

        let (_, json) = send(&app, empty("POST", &format!("{base}/restart"))).await;
        assert_eq!(json["quiz"]["status"], "in_progress");
        assert_eq!(json["quiz"]["position"], 1);
        assert!(json["quiz"]["selected"].is_null());
    }

    #[tokio::test]
    async fn failed_quiz_still_creates_session_and_can_be_regenerated() {
        let mock = cache_mock().with_replies([
            MockReply::Text(EXPLANATION.into()),
            MockReply::Fail("quota exceeded".into()),
        ]);
        let app = app_with(Arc::new(mock), GatewayOptions::default());

        let (status, json) = send(&app, png_upload()).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["quiz"]["status"], "empty");
        assert!(json["quiz_error"].as_str().unwrap().contains("quota exceeded"));

        let id = json["id"].as_str().unwrap();
        let (status, json) = send(&app, empty("POST", &format!("/api/sessions/{id}/quiz/regenerate"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["quiz"]["status"], "in_progress");
        assert!(json["quiz_error"].is_null());
    }

    #[tokio::test]
    async fn chat_appends_to_transcript() {
        let app = demo_app();
        let id = create(&app).await;

        let (status, json) = send(
            &app,
            post_json(&format!("/api/sessions/{id}/chat"), json!({"question": "What if a server dies?"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["answer"].as_str().unwrap().contains("load balancer"));
        assert_eq!(json["blocks"][0]["kind"], "paragraph");
        assert_eq!(json["turns"], 2);

        let (_, json) = send(&app, empty("GET", &format!("/api/sessions/{id}"))).await;
        assert_eq!(json["chat"][0]["role"], "user");
        assert_eq!(json["chat"][1]["role"], "model");
    }

    #[tokio::test]
    async fn failed_chat_rolls_back_question() {
        let mock = Arc::new(cache_mock());
        let app = app_with(mock.clone(), GatewayOptions::default());
        let id = create(&app).await;

        mock.push_reply(MockReply::Fail("overloaded".into()));
        let (status, json) = send(
            &app,
            post_json(&format!("/api/sessions/{id}/chat"), json!({"question": "Why?"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(json["error"].as_str().unwrap().contains("overloaded"));

        let (_, json) = send(&app, empty("GET", &format!("/api/sessions/{id}"))).await;
        assert_eq!(json["chat"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn blank_chat_question_is_rejected() {
        let app = demo_app();
        let id = create(&app).await;
        let (status, _) = send(
            &app,
            post_json(&format!("/api/sessions/{id}/chat"), json!({"question": "   "})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn rejects_bad_uploads() {
        let app = demo_app();

        let (status, _) = send(&app, upload("image", "notes.txt", "text/plain", b"hello")).await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);

        let (status, json) = send(&app, upload("document", "d.png", "image/png", PNG)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("image"));

        let (status, _) = send(&app, upload("image", "empty.png", "image/png", b"")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn rejects_oversized_upload() {
        let options = GatewayOptions {
            max_upload_bytes: 8,
            ..Default::default()
        };
        let app = app_with(Arc::new(MockProvider::demo()), options);
        let (status, _) = send(&app, png_upload()).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn unknown_and_deleted_sessions_are_not_found() {
        let app = demo_app();
        let (status, _) = send(&app, empty("GET", "/api/sessions/not-a-uuid")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let id = create(&app).await;
        let uri = format!("/api/sessions/{id}");
        let (status, json) = send(&app, empty("DELETE", &uri)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["deleted"], true);

        let (status, _) = send(&app, empty("GET", &uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, empty("DELETE", &uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn model_routes_are_rate_limited() {
        let options = GatewayOptions {
            rate_limit_per_minute: 1,
            ..Default::default()
        };
        let app = app_with(Arc::new(MockProvider::demo()), options);
        let id = create(&app).await;

        let (status, _) = send(&app, png_upload()).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

        // Quiz actions do not call the model and are not limited.
        let (status, _) = send(
            &app,
            post_json(&format!("/api/sessions/{id}/quiz/answer"), json!({"option": 0})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn malformed_json_bodies_get_json_errors() {
        let app = app_with(Arc::new(cache_mock()), GatewayOptions::default());
        let id = create(&app).await;

        let (status, json) = send(
            &app,
            post_json(&format!("/api/sessions/{id}/quiz/answer"), json!({"option": -1})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("option"));

        let request = Request::builder()
            .method("POST")
            .uri(format!("/api/sessions/{id}/chat"))
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Body::from("Why?"))
            .unwrap();
        let (status, json) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].is_string());

        let request = Request::builder()
            .method("POST")
            .uri("/api/sessions")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let (status, json) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].is_string());
    }

    /// Holds chat questions mentioning "slow" until released, then fails them.
    struct SlowChat {
        inner: MockProvider,
        started: Arc<Notify>,
        release: Arc<Notify>,
    }

    #[async_trait]
    impl ModelProvider for SlowChat {
        fn name(&self) -> &str {
            "mock"
        }

        fn default_model(&self) -> &str {
            "mock"
        }

        async fn generate(&self, request: &ModelRequest) -> LensResult<ModelResponse> {
            let slow = request.response_schema.is_none()
                && request.contents.last().is_some_and(|c| {
                    c.parts
                        .iter()
                        .any(|p| matches!(p, Part::Text(t) if t.contains("slow")))
                });
            if slow {
                self.started.notify_one();
                self.release.notified().await;
                return Err(LensError::provider("mock", "timed out"));
            }
            self.inner.generate(request).await
        }
    }

    #[tokio::test]
    async fn concurrent_chat_on_one_session_is_refused() {
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let provider = SlowChat {
            inner: cache_mock().with_response("fast answer"),
            started: started.clone(),
            release: release.clone(),
        };
        let app = app_with(Arc::new(provider), GatewayOptions::default());
        let id = create(&app).await;
        let uri = format!("/api/sessions/{id}/chat");

        let slow = tokio::spawn({
            let app = app.clone();
            let uri = uri.clone();
            async move { send(&app, post_json(&uri, json!({"question": "slow"}))).await }
        });
        started.notified().await;

        let (status, json) = send(&app, post_json(&uri, json!({"question": "fast"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("still being answered"));

        release.notify_one();
        let (status, _) = slow.await.unwrap();
        assert_eq!(status, StatusCode::BAD_GATEWAY);

        let (_, json) = send(&app, empty("GET", &format!("/api/sessions/{id}"))).await;
        assert_eq!(json["chat"].as_array().unwrap().len(), 0);

        let (status, json) = send(&app, post_json(&uri, json!({"question": "fast"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["turns"], 2);
        let (_, json) = send(&app, empty("GET", &format!("/api/sessions/{id}"))).await;
        assert_eq!(json["chat"][0]["text"], "fast");
        assert_eq!(json["chat"][1]["text"], "fast answer");
    }
}
