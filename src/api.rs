//! REST API Server for the FINNY agent service
//!
//! Exposes the task workflow, metrics, voice and CFO agents over HTTP.

use axum::{
    async_trait,
    extract::{
        rejection::{JsonRejection, QueryRejection},
        FromRequest, FromRequestParts, Path, Query, Request, State,
    },
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::activity::{ActivityLog, DEFAULT_ACTIVITY_LIMIT};
use crate::agent::{MeetingAgent, Orchestrator};
use crate::cfo::CfoAgent;
use crate::classifier::IntentClassifier;
use crate::config::Config;
use crate::email::{EmailSender, HttpMailer, LogMailer};
use crate::error::FinnyError;
use crate::llm::{ChatModel, LavaChatClient, OfflineChatModel};
use crate::metrics;
use crate::models::{
    AggregatorTransaction, CashSnapshot, MeetingNotes, Task, TransactionQuery, VoiceRequest,
};
use crate::state::{self, InMemoryLedgerStore, LedgerStore};
use crate::voice::{
    self, DemoSynthesizer, LavaSynthesizer, VoiceAgent, VoiceSynthesizer, CHUNK_MAX_CHARS,
    DEFAULT_VOICE,
};

const DEFAULT_WORKSPACE: &str = "default";

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CreateTaskRequest {
    #[serde(default)]
    pub workspace_id: Option<String>,
    pub title: String,
    pub description: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct WorkspaceRequest {
    pub workspace_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    pub workspace_id: String,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct CompleteQuery {
    pub workspace_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TtsRequest {
    pub text: String,
    pub voice: Option<String>,
    pub speed: Option<f32>,
}

#[derive(Debug, Deserialize)]
pub struct IntentRequest {
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub workspace_id: String,
    pub transactions: Vec<AggregatorTransaction>,
    #[serde(default)]
    pub cash: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct InsightRequest {
    pub workspace_id: String,
    pub question: Option<String>,
}

/// =============================
/// Response Wrapper
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

type ApiResult = (StatusCode, Json<ApiResponse>);

fn ok<T: Serialize>(data: T) -> ApiResult {
    (StatusCode::OK, Json(ApiResponse::success(data)))
}

fn failure(context: &str, e: FinnyError) -> ApiResult {
    let status = match &e {
        FinnyError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        FinnyError::NotFound(_) => StatusCode::NOT_FOUND,
        e if e.is_collaborator_failure() => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    warn!(%status, error = %e, "{} failed", context);
    (status, Json(ApiResponse::error(format!("{} failed: {}", context, e))))
}

/// JSON body whose rejection is reported in the response envelope
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiResult;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(rejected(rejection.status(), rejection.body_text())),
        }
    }
}

/// Query string whose rejection is reported in the response envelope
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    Query<T>: FromRequestParts<S, Rejection = QueryRejection>,
    S: Send + Sync,
{
    type Rejection = ApiResult;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(Self(value)),
            Err(rejection) => Err(rejected(rejection.status(), rejection.body_text())),
        }
    }
}

fn rejected(status: StatusCode, reason: String) -> ApiResult {
    warn!(%status, %reason, "Request rejected");
    (status, Json(ApiResponse::error(reason)))
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub orchestrator: Arc<Orchestrator>,
    pub cfo: Arc<CfoAgent>,
    pub ledger: Arc<dyn LedgerStore>,
    pub activity: Arc<ActivityLog>,
    pub synthesizer: Arc<dyn VoiceSynthesizer>,
    pub default_cash: f64,
}

impl ApiState {
    /// Wire collaborators: live ones when configured, demo ones otherwise
    pub fn from_config(config: &Config, ledger: Arc<dyn LedgerStore>) -> crate::Result<Self> {
        let synthesizer: Arc<dyn VoiceSynthesizer> = match &config.lava {
            Some(lava) => Arc::new(LavaSynthesizer::new(lava.clone())?),
            None => Arc::new(DemoSynthesizer),
        };

        let mailer: Arc<dyn EmailSender> = match &config.mail {
            Some(mail) => Arc::new(HttpMailer::new(mail.clone())?),
            None => Arc::new(LogMailer),
        };

        let llm: Arc<dyn ChatModel> = match &config.lava {
            Some(lava) if lava.chat_url.is_some() => Arc::new(LavaChatClient::new(lava.clone())?),
            _ => Arc::new(OfflineChatModel),
        };

        info!(
            synthesizer = synthesizer.name(),
            mailer = mailer.name(),
            "Collaborators selected"
        );

        Ok(Self::new(synthesizer, mailer, llm, ledger, config.default_cash))
    }

    pub fn new(
        synthesizer: Arc<dyn VoiceSynthesizer>,
        mailer: Arc<dyn EmailSender>,
        llm: Arc<dyn ChatModel>,
        ledger: Arc<dyn LedgerStore>,
        default_cash: f64,
    ) -> Self {
        let activity = Arc::new(ActivityLog::new());
        let meeting = MeetingAgent::new(VoiceAgent::new(synthesizer.clone()));
        let orchestrator = Arc::new(Orchestrator::new(meeting, mailer, activity.clone()));
        let cfo = Arc::new(CfoAgent::new(llm, ledger.clone(), activity.clone(), default_cash));

        Self {
            orchestrator,
            cfo,
            ledger,
            activity,
            synthesizer,
            default_cash,
        }
    }

    /// Demo collaborators over an empty in-memory ledger
    pub fn demo() -> Self {
        Self::new(
            Arc::new(DemoSynthesizer),
            Arc::new(LogMailer),
            Arc::new(OfflineChatModel),
            Arc::new(InMemoryLedgerStore::new()),
            crate::config::DEFAULT_CASH,
        )
    }
}

/// =============================
/// Service Endpoints
/// =============================

async fn root() -> ApiResult {
    ok(serde_json::json!({
        "service": "FINNY Agent API",
        "status": "running",
    }))
}

async fn health() -> ApiResult {
    ok(serde_json::json!({ "status": "healthy" }))
}

/// =============================
/// Task Workflow
/// =============================

async fn create_task(
    State(state): State<ApiState>,
    ApiJson(req): ApiJson<CreateTaskRequest>,
) -> ApiResult {
    info!("Received task: {}", req.title);

    let workspace_id = req
        .workspace_id
        .unwrap_or_else(|| DEFAULT_WORKSPACE.to_string());
    let task = Task {
        title: req.title,
        description: req.description,
        email: req.email,
    };

    match state.orchestrator.create_task(&workspace_id, task).await {
        Ok(result) => ok(result),
        Err(e) => failure("Task creation", e),
    }
}

async fn complete_meeting(
    State(state): State<ApiState>,
    Path(meeting_id): Path<String>,
    ApiQuery(query): ApiQuery<CompleteQuery>,
    notes: Option<Json<MeetingNotes>>,
) -> ApiResult {
    let workspace_id = query
        .workspace_id
        .unwrap_or_else(|| DEFAULT_WORKSPACE.to_string());
    let notes = notes.map(|Json(n)| n).unwrap_or_default();

    match state
        .orchestrator
        .complete_meeting(&workspace_id, &meeting_id, notes)
        .await
    {
        Ok(summary) => ok(summary),
        Err(e) => failure("Meeting completion", e),
    }
}

/// =============================
/// Voice
/// =============================

fn voice_request(req: TtsRequest) -> crate::Result<VoiceRequest> {
    let request = VoiceRequest {
        text: req.text,
        voice: req.voice.unwrap_or_else(|| DEFAULT_VOICE.to_string()),
        speed: req.speed.unwrap_or(1.0),
    };
    voice::validate_request(&request)?;
    Ok(request)
}

async fn text_to_speech(
    State(state): State<ApiState>,
    ApiJson(req): ApiJson<TtsRequest>,
) -> ApiResult {
    let request = match voice_request(req) {
        Ok(r) => r,
        Err(e) => return failure("TTS", e),
    };

    match state.synthesizer.synthesize(&request).await {
        Ok(clip) => ok(serde_json::json!({
            "audio_url": clip.audio_url,
            "duration": clip.duration,
            "script": clip.script,
            "voice": request.voice,
            "speed": request.speed,
        })),
        Err(e) => failure("TTS", e),
    }
}

async fn text_to_speech_stream(
    State(state): State<ApiState>,
    ApiJson(req): ApiJson<TtsRequest>,
) -> Response {
    let request = match voice_request(req) {
        Ok(r) => r,
        Err(e) => return failure("TTS stream", e).into_response(),
    };

    match state.synthesizer.synthesize_audio(&request).await {
        Ok(audio) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "audio/mpeg"),
                (header::CONTENT_DISPOSITION, "attachment; filename=speech.mp3"),
            ],
            audio,
        )
            .into_response(),
        Err(e) => failure("TTS stream", e).into_response(),
    }
}

async fn text_to_speech_chunks(
    State(state): State<ApiState>,
    ApiJson(req): ApiJson<TtsRequest>,
) -> ApiResult {
    let request = match voice_request(req) {
        Ok(r) => r,
        Err(e) => return failure("Chunked TTS", e),
    };

    match voice::synthesize_chunks(
        state.synthesizer.as_ref(),
        &request.text,
        &request.voice,
        request.speed,
        CHUNK_MAX_CHARS,
    )
    .await
    {
        Ok(audio) => ok(audio),
        Err(e) => failure("Chunked TTS", e),
    }
}

/// =============================
/// Email
/// =============================

async fn email_intent(ApiJson(req): ApiJson<IntentRequest>) -> ApiResult {
    ok(IntentClassifier::classify(&req.body))
}

/// =============================
/// Metrics & Ledger
/// =============================

async fn metrics_summary(
    State(state): State<ApiState>,
    ApiJson(req): ApiJson<WorkspaceRequest>,
) -> ApiResult {
    let today = Utc::now().date_naive();
    match metrics::load_summary(state.ledger.as_ref(), &req.workspace_id, today).await {
        Ok(summary) => ok(summary),
        Err(e) => failure("Metrics summary", e),
    }
}

async fn metrics_burn_runway(
    State(state): State<ApiState>,
    ApiJson(req): ApiJson<WorkspaceRequest>,
) -> ApiResult {
    match metrics::load_burn_runway(state.ledger.as_ref(), &req.workspace_id, state.default_cash)
        .await
    {
        Ok(burn) => ok(burn),
        Err(e) => failure("Burn/runway", e),
    }
}

async fn metrics_dashboard(
    State(state): State<ApiState>,
    ApiQuery(req): ApiQuery<WorkspaceRequest>,
) -> ApiResult {
    let today = Utc::now().date_naive();
    match metrics::load_dashboard(
        state.ledger.as_ref(),
        &req.workspace_id,
        today,
        state.default_cash,
    )
    .await
    {
        Ok(dashboard) => ok(dashboard),
        Err(e) => failure("Dashboard", e),
    }
}

async fn list_transactions(
    State(state): State<ApiState>,
    ApiQuery(query): ApiQuery<TransactionQuery>,
) -> ApiResult {
    let today = Utc::now().date_naive();
    match state::list_transactions(state.ledger.as_ref(), &query, today).await {
        Ok(page) => ok(page),
        Err(e) => failure("Transaction listing", e),
    }
}

async fn import_transactions(
    State(state): State<ApiState>,
    ApiJson(req): ApiJson<ImportRequest>,
) -> ApiResult {
    let rows = state::from_aggregator(&req.workspace_id, "Aggregator import", req.transactions);

    let inserted = match state.ledger.upsert_transactions(rows).await {
        Ok(n) => n,
        Err(e) => return failure("Transaction import", e),
    };

    if let Some(cash) = req.cash {
        let snapshot = CashSnapshot {
            workspace_id: req.workspace_id.clone(),
            as_of: Utc::now().date_naive(),
            cash,
        };
        if let Err(e) = state.ledger.record_cash(snapshot).await {
            return failure("Cash snapshot", e);
        }
    }

    info!(workspace_id = %req.workspace_id, inserted, "Transactions imported");
    ok(serde_json::json!({
        "inserted": inserted,
        "workspace_id": req.workspace_id,
    }))
}

/// =============================
/// Agents
/// =============================

async fn cfo_insights(
    State(state): State<ApiState>,
    ApiJson(req): ApiJson<InsightRequest>,
) -> ApiResult {
    let today = Utc::now().date_naive();
    match state
        .cfo
        .insights(&req.workspace_id, req.question.as_deref(), today)
        .await
    {
        Ok(answer) => ok(answer),
        Err(e) => failure("CFO insights", e),
    }
}

async fn agent_activity(
    State(state): State<ApiState>,
    ApiQuery(query): ApiQuery<ActivityQuery>,
) -> ApiResult {
    let limit = query.limit.unwrap_or(DEFAULT_ACTIVITY_LIMIT);
    match state.activity.recent(&query.workspace_id, limit).await {
        Ok(activity) => ok(serde_json::json!({
            "count": activity.len(),
            "activity": activity,
        })),
        Err(e) => failure("Activity listing", e),
    }
}

/// =============================
/// Router
/// =============================

pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/tasks/create", post(create_task))
        .route("/tasks/complete/:meeting_id", post(complete_meeting))
        .route("/voice/tts", post(text_to_speech))
        .route("/voice/tts-stream", post(text_to_speech_stream))
        .route("/voice/tts-chunks", post(text_to_speech_chunks))
        .route("/email/intent", post(email_intent))
        .route("/metrics/summary", post(metrics_summary))
        .route("/metrics/burn_runway", post(metrics_burn_runway))
        .route("/metrics/dashboard", get(metrics_dashboard))
        .route("/transactions/list", get(list_transactions))
        .route("/transactions/import", post(import_transactions))
        .route("/agent/insights", post(cfo_insights))
        .route("/agent/activity", get(agent_activity))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    state: ApiState,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request};
    use chrono::Duration;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn call(
        state: ApiState,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(v) => {
                builder = builder.header("content-type", "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };

        let response = create_router(state)
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = call(ApiState::demo(), Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["status"], "healthy");
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_create_task_and_activity() {
        let state = ApiState::demo();

        let (status, body) = call(
            state.clone(),
            Method::POST,
            "/tasks/create",
            Some(json!({
                "workspace_id": "ws",
                "title": "Cut SaaS Subscriptions",
                "description": "Review and cancel unused subscriptions",
                "email": "founder@startup.io"
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        let id = body["data"]["meeting_id"].as_str().unwrap();
        assert_eq!(body["data"]["meeting_url"], format!("/meet/{}", id));
        assert!(body["data"]["script"].as_array().unwrap().len() > 3);

        let (_, activity) = call(state, Method::GET, "/agent/activity?workspace_id=ws", None).await;
        assert_eq!(activity["data"]["count"], 1);
        assert_eq!(activity["data"]["activity"][0]["agent_name"], "meeting_create_task");
    }

    #[tokio::test]
    async fn test_complete_meeting_with_and_without_body() {
        let (status, body) = call(
            ApiState::demo(),
            Method::POST,
            "/tasks/complete/abc123xyz",
            Some(json!({"key_points": ["a", "b", "c", "d"]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["meeting_id"], "abc123xyz");
        assert_eq!(body["data"]["key_insights"], json!(["a", "b", "c"]));

        let (status, body) =
            call(ApiState::demo(), Method::POST, "/tasks/complete/m2", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["key_insights"].as_array().unwrap().len(), 3);
        assert_eq!(body["data"]["next_steps"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_tts_validation() {
        let (status, body) = call(
            ApiState::demo(),
            Method::POST,
            "/voice/tts",
            Some(json!({"text": "Hello there.", "speed": 9.0})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);

        let (status, body) = call(
            ApiState::demo(),
            Method::POST,
            "/voice/tts-chunks",
            Some(json!({"text": "One. Two. Three."})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["total_chunks"], 1);
        assert_eq!(body["data"]["chunks"][0]["text"], "One Two Three");
    }

    #[tokio::test]
    async fn test_email_intent() {
        let (_, body) = call(
            ApiState::demo(),
            Method::POST,
            "/email/intent",
            Some(json!({"body": "Can we discuss the budget?"})),
        )
        .await;
        assert_eq!(body["data"]["intent"], "meeting");
    }

    #[tokio::test]
    async fn test_import_then_metrics() {
        let state = ApiState::demo();
        let recent = Utc::now().date_naive() - Duration::days(3);

        let (status, body) = call(
            state.clone(),
            Method::POST,
            "/transactions/import",
            Some(json!({
                "workspace_id": "ws",
                "cash": 9000.0,
                "transactions": [
                    {
                        "transaction_id": "t1",
                        "date": recent,
                        "amount": 3000.0,
                        "category": ["Payroll"]
                    },
                    {"transaction_id": "t2", "date": recent, "amount": -1000.0}
                ]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["inserted"], 2);

        let (_, burn) = call(
            state.clone(),
            Method::POST,
            "/metrics/burn_runway",
            Some(json!({"workspace_id": "ws"})),
        )
        .await;
        assert_eq!(burn["data"]["burn_avg_3m"], 2000.0);
        assert_eq!(burn["data"]["cash"], 9000.0);
        assert_eq!(burn["data"]["runway_months"], 4.5);

        let (_, dash) = call(
            state.clone(),
            Method::GET,
            "/metrics/dashboard?workspace_id=ws",
            None,
        )
        .await;
        assert_eq!(dash["data"]["summary"]["top_categories"][0]["category"], "Payroll");
        assert_eq!(dash["data"]["burn"]["runway_months"], 4.5);

        let (_, page) = call(
            state,
            Method::GET,
            "/transactions/list?workspace_id=ws&category=Payroll",
            None,
        )
        .await;
        assert_eq!(page["data"]["count"], 1);
        assert_eq!(page["data"]["categories"], json!(["Other", "Payroll"]));
    }

    #[tokio::test]
    async fn test_list_limit_too_large() {
        let (status, _) = call(
            ApiState::demo(),
            Method::GET,
            "/transactions/list?workspace_id=ws&limit=900",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_empty_workspace_runway_is_unbounded() {
        let (_, body) = call(
            ApiState::demo(),
            Method::POST,
            "/metrics/burn_runway",
            Some(json!({"workspace_id": "nobody"})),
        )
        .await;
        assert_eq!(body["data"]["runway_months"], "∞");
        assert_eq!(body["data"]["cash"], 25000.0);
    }

    #[tokio::test]
    async fn test_insights_offline_model() {
        let state = ApiState::demo();
        let (status, body) = call(
            state.clone(),
            Method::POST,
            "/agent/insights",
            Some(json!({"workspace_id": "ws"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["data"]["answer"].as_str().unwrap().starts_with("- "));

        let (_, activity) =
            call(state, Method::GET, "/agent/activity?workspace_id=ws&limit=5", None).await;
        assert_eq!(activity["data"]["activity"][0]["agent_name"], "cfo_insights");
    }

    #[tokio::test]
    async fn test_list_days_out_of_range() {
        for days in ["1000000000", "9000000000000000"] {
            let uri = format!("/transactions/list?workspace_id=ws&days={}", days);
            let (status, body) = call(ApiState::demo(), Method::GET, &uri, None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "days={}", days);
            assert_eq!(body["success"], false);
        }
    }

    #[tokio::test]
    async fn test_malformed_requests_use_envelope() {
        let response = create_router(ApiState::demo())
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/email/intent")
                    .header("content-type", "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert!(body["error"].is_string());

        let (status, body) = call(ApiState::demo(), Method::GET, "/metrics/dashboard", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    /// Returns a clip carrying its audio inline, like the Lava synthesizer
    struct InlineSynthesizer;

    #[async_trait::async_trait]
    impl VoiceSynthesizer for InlineSynthesizer {
        fn name(&self) -> &'static str {
            "inline"
        }

        async fn synthesize(&self, request: &VoiceRequest) -> crate::Result<crate::VoiceClip> {
            use base64::{engine::general_purpose::STANDARD, Engine as _};
            Ok(crate::VoiceClip {
                audio_url: format!("{}{}", voice::MP3_DATA_URL_PREFIX, STANDARD.encode(b"ID3mp3")),
                duration: 1.0,
                script: voice::split_sentences(&request.text),
            })
        }
    }

    #[tokio::test]
    async fn test_tts_stream_returns_mp3_attachment() {
        let state = ApiState::new(
            Arc::new(InlineSynthesizer),
            Arc::new(LogMailer),
            Arc::new(OfflineChatModel),
            Arc::new(InMemoryLedgerStore::new()),
            crate::config::DEFAULT_CASH,
        );

        let response = create_router(state)
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/voice/tts-stream")
                    .header("content-type", "application/json")
                    .body(Body::from(json!({"text": "Hello there."}).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "audio/mpeg");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=speech.mp3"
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"ID3mp3");
    }

    #[tokio::test]
    async fn test_tts_stream_without_inline_audio_is_bad_gateway() {
        let (status, body) = call(
            ApiState::demo(),
            Method::POST,
            "/voice/tts-stream",
            Some(json!({"text": "Hello there."})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["success"], false);
    }
}
