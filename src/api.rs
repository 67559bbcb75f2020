// 🚀 Studio Pass - HTTP intent API
//
// Every route takes the controller lock, applies one intent, and answers with
// the resulting SessionView (or a result payload for edits).

use crate::auth::{PasswordChange, RegistrationForm};
use crate::controller::SessionView;
use crate::editing::{EditOutcome, EditRequest, ImageData, ImageGenerator};
use crate::entities::PerformOutcome;
use crate::error::GenerationError;
use crate::identity::Identity;
use crate::plan::PlanKind;
use crate::runtime::{request_edit, SharedController};
use crate::session::Page;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub controller: SharedController,
    pub generator: Arc<dyn ImageGenerator>,
}

/// API Response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    fn err(message: impl ToString) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.to_string()),
        }
    }
}

fn ok<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(ApiResponse::ok(data))).into_response()
}

fn fail(status: StatusCode, message: impl ToString) -> Response {
    (status, Json(ApiResponse::err(message))).into_response()
}

// ============================================================================
// Request / response bodies
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SignInBody {
    pub identity: String,
    pub secret: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
    pub identity: String,
    pub secret: String,
    pub confirm: String,
}

#[derive(Debug, Deserialize)]
pub struct NavigateBody {
    pub page: Page,
}

#[derive(Debug, Deserialize)]
pub struct RatingBody {
    pub rating: u8,
}

#[derive(Debug, Deserialize)]
pub struct GenerateBody {
    pub plan: PlanKind,
}

#[derive(Debug, Deserialize)]
pub struct PasswordBody {
    pub current: String,
    pub new: String,
    pub confirm: String,
}

/// Base64 image as carried over JSON
#[derive(Debug, Serialize, Deserialize)]
pub struct ImagePayload {
    pub data: String,
    pub mime_type: String,
}

#[derive(Debug, Deserialize)]
pub struct EditBody {
    pub image: Option<ImagePayload>,
    #[serde(default)]
    pub prompt: String,
}

#[derive(Debug, Deserialize)]
pub struct MergeBody {
    pub first: Option<ImagePayload>,
    pub second: Option<ImagePayload>,
    #[serde(default)]
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct EditResult {
    pub image: ImagePayload,
    pub credits: u32,
}

#[derive(Debug, Serialize)]
pub struct TaskResult {
    pub outcome: &'static str,
    pub session: SessionView,
}

impl ImagePayload {
    fn decode(payload: Option<ImagePayload>) -> Result<Option<ImageData>, GenerationError> {
        payload
            .map(|payload| ImageData::from_base64(&payload.data, payload.mime_type))
            .transpose()
    }
}

impl From<ImageData> for ImagePayload {
    fn from(image: ImageData) -> Self {
        ImagePayload {
            data: image.to_base64(),
            mime_type: image.mime_type,
        }
    }
}

// ============================================================================
// Session & identity handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/session - Current session projection
async fn get_session(State(state): State<AppState>) -> Response {
    ok(state.controller.lock().await.view())
}

/// POST /api/login - Check credentials and start a session
async fn sign_in(State(state): State<AppState>, Json(body): Json<SignInBody>) -> Response {
    let mut controller = state.controller.lock().await;
    match controller.sign_in(&body.identity, &body.secret) {
        Ok(()) => ok(controller.view()),
        Err(e) => fail(StatusCode::UNAUTHORIZED, e),
    }
}

/// POST /api/register - Validate, then sign in as the new identity
async fn register(State(state): State<AppState>, Json(body): Json<RegisterBody>) -> Response {
    let form = RegistrationForm {
        identity: body.identity,
        secret: body.secret,
        confirm: body.confirm,
    };
    let mut controller = state.controller.lock().await;
    match controller.register(&form) {
        Ok(()) => ok(controller.view()),
        Err(e) => fail(StatusCode::UNPROCESSABLE_ENTITY, e),
    }
}

/// POST /api/logout
async fn logout(State(state): State<AppState>) -> Response {
    let mut controller = state.controller.lock().await;
    controller.logout();
    ok(controller.view())
}

/// POST /api/session/delete - Account self-deletion
async fn delete_session(State(state): State<AppState>) -> Response {
    let mut controller = state.controller.lock().await;
    controller.delete_session();
    ok(controller.view())
}

/// POST /api/navigate
async fn navigate(State(state): State<AppState>, Json(body): Json<NavigateBody>) -> Response {
    let mut controller = state.controller.lock().await;
    controller.navigate(body.page);
    ok(controller.view())
}

/// POST /api/password - Simulated password change
async fn change_password(State(state): State<AppState>, Json(body): Json<PasswordBody>) -> Response {
    let change = PasswordChange {
        current: body.current,
        new: body.new,
        confirm: body.confirm,
    };
    match state.controller.lock().await.change_password(&change) {
        Ok(message) => ok(message),
        Err(e) => fail(StatusCode::UNPROCESSABLE_ENTITY, e),
    }
}

// ============================================================================
// Task handlers
// ============================================================================

fn outcome_name(outcome: PerformOutcome) -> &'static str {
    match outcome {
        PerformOutcome::Completed => "completed",
        PerformOutcome::RatingRequested => "rating_requested",
        PerformOutcome::Ignored => "ignored",
    }
}

/// POST /api/tasks/:id/perform
async fn perform_task(State(state): State<AppState>, Path(task_id): Path<String>) -> Response {
    let mut controller = state.controller.lock().await;
    let outcome = controller.perform_task(&task_id);
    ok(TaskResult {
        outcome: outcome_name(outcome),
        session: controller.view(),
    })
}

/// POST /api/tasks/rating - Answer the open rating prompt
async fn submit_rating(State(state): State<AppState>, Json(body): Json<RatingBody>) -> Response {
    let mut controller = state.controller.lock().await;
    match controller.submit_rating(body.rating) {
        Ok(outcome) => ok(TaskResult {
            outcome: outcome_name(outcome),
            session: controller.view(),
        }),
        Err(e) => fail(StatusCode::UNPROCESSABLE_ENTITY, e),
    }
}

/// POST /api/tasks/rating/cancel
async fn cancel_rating(State(state): State<AppState>) -> Response {
    let mut controller = state.controller.lock().await;
    controller.cancel_rating();
    ok(controller.view())
}

/// POST /api/tasks/:id/claim
async fn claim_task(State(state): State<AppState>, Path(task_id): Path<String>) -> Response {
    let mut controller = state.controller.lock().await;
    let outcome = match controller.claim_task(&task_id) {
        Some(_) => "claimed",
        None => "ignored",
    };
    ok(TaskResult {
        outcome,
        session: controller.view(),
    })
}

// ============================================================================
// Generated account handlers
// ============================================================================

/// POST /api/accounts - Generate an account (canonical identity only)
async fn generate_account(State(state): State<AppState>, Json(body): Json<GenerateBody>) -> Response {
    let mut controller = state.controller.lock().await;
    controller.generate_account(body.plan);
    ok(controller.view())
}

/// DELETE /api/accounts/:identity
async fn delete_account(State(state): State<AppState>, Path(identity): Path<String>) -> Response {
    let mut controller = state.controller.lock().await;
    controller.delete_account(&Identity::new(identity));
    ok(controller.view())
}

// ============================================================================
// Editing handlers
// ============================================================================

async fn run_edit(state: &AppState, request: EditRequest) -> Response {
    match request_edit(&state.controller, state.generator.as_ref(), request).await {
        Ok(EditOutcome::Delivered(image)) => {
            let credits = state.controller.lock().await.balance();
            ok(EditResult {
                image: image.into(),
                credits,
            })
        }
        Ok(EditOutcome::Failed { message }) => fail(StatusCode::BAD_GATEWAY, message),
        // The session that asked is gone; nothing to report
        Ok(EditOutcome::Discarded) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => fail(StatusCode::UNPROCESSABLE_ENTITY, e),
    }
}

/// POST /api/edit
async fn edit_image(State(state): State<AppState>, Json(body): Json<EditBody>) -> Response {
    let image = match ImagePayload::decode(body.image) {
        Ok(image) => image,
        Err(e) => return fail(StatusCode::BAD_REQUEST, e),
    };
    run_edit(&state, EditRequest::Edit { image, prompt: body.prompt }).await
}

/// POST /api/merge
async fn merge_images(State(state): State<AppState>, Json(body): Json<MergeBody>) -> Response {
    let decoded = ImagePayload::decode(body.first).and_then(|first| Ok((first, ImagePayload::decode(body.second)?)));
    let (first, second) = match decoded {
        Ok(images) => images,
        Err(e) => return fail(StatusCode::BAD_REQUEST, e),
    };
    run_edit(
        &state,
        EditRequest::Merge {
            first,
            second,
            prompt: body.prompt,
        },
    )
    .await
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/session", get(get_session))
        .route("/session/delete", post(delete_session))
        .route("/login", post(sign_in))
        .route("/register", post(register))
        .route("/logout", post(logout))
        .route("/navigate", post(navigate))
        .route("/password", post(change_password))
        .route("/tasks/rating", post(submit_rating))
        .route("/tasks/rating/cancel", post(cancel_rating))
        .route("/tasks/:id/perform", post(perform_task))
        .route("/tasks/:id/claim", post(claim_task))
        .route("/accounts", post(generate_account))
        .route("/accounts/:identity", delete(delete_account))
        .route("/edit", post(edit_image))
        .route("/merge", post(merge_images))
        .with_state(state);

    Router::new().nest("/api", api_routes).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    )
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::config::Config;
    use crate::controller::SessionController;
    use crate::runtime::shared;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use crate::editing::EditOperation;
    use serde_json::{json, Value};
    use tokio::sync::Notify;
    use tower::ServiceExt;

    struct FailingGenerator;

    #[async_trait]
    impl ImageGenerator for FailingGenerator {
        async fn edit(&self, _: &ImageData, _: &str) -> Result<ImageData, GenerationError> {
            Err(GenerationError::Api { status: 503, message: "overloaded".to_string() })
        }

        async fn merge(&self, _: &ImageData, _: &ImageData, _: &str) -> Result<ImageData, GenerationError> {
            Err(GenerationError::NoImage)
        }
    }

    /// Blocks until released, then echoes the image
    struct GatedGenerator {
        gate: Notify,
    }

    #[async_trait]
    impl ImageGenerator for GatedGenerator {
        async fn edit(&self, image: &ImageData, _: &str) -> Result<ImageData, GenerationError> {
            self.gate.notified().await;
            Ok(image.clone())
        }

        async fn merge(&self, first: &ImageData, _: &ImageData, _: &str) -> Result<ImageData, GenerationError> {
            self.gate.notified().await;
            Ok(first.clone())
        }
    }

    fn app() -> (Router, SharedController) {
        app_with(Arc::new(FailingGenerator))
    }

    fn app_with(generator: Arc<dyn ImageGenerator>) -> (Router, SharedController) {
        let controller = shared(SessionController::new(&Config::default(), Arc::new(SystemClock)));
        let state = AppState {
            controller: controller.clone(),
            generator,
        };
        (router(state), controller)
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    #[tokio::test]
    async fn test_login_and_session_view() {
        let (app, _) = app();

        let (status, body) = send(&app, "POST", "/api/login", json!({"identity": "user@example.com", "secret": "bad"})).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Incorrect email or password.");

        let (status, body) = send(&app, "POST", "/api/login", json!({"identity": "User@Example.com", "secret": "password123"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["identity"], "user@example.com");
        assert_eq!(body["data"]["page"], "editor");
        assert_eq!(body["data"]["credits"], 10);
        assert_eq!(body["data"]["plan_label"], "Basic");
    }

    #[tokio::test]
    async fn test_generator_route_for_canonical_identity() {
        let (app, _) = app();
        send(&app, "POST", "/api/login", json!({"identity": "lifetime@user.com", "secret": "password123"})).await;

        let (_, body) = send(&app, "POST", "/api/accounts", json!({"plan": "weekly"})).await;
        let accounts = body["data"]["accounts"].as_array().unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0]["identity"], "weekly-1@generated.studio");

        let (_, body) = send(&app, "DELETE", "/api/accounts/weekly-1@generated.studio", Value::Null).await;
        assert!(body["data"]["accounts"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_task_flow_over_http() {
        let (app, _) = app();
        send(&app, "POST", "/api/login", json!({"identity": "user@example.com", "secret": "password123"})).await;

        let (_, body) = send(&app, "POST", "/api/tasks/3/perform", Value::Null).await;
        assert_eq!(body["data"]["outcome"], "rating_requested");

        let (status, _) = send(&app, "POST", "/api/tasks/rating", json!({"rating": 9})).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        send(&app, "POST", "/api/tasks/rating", json!({"rating": 5})).await;
        let (_, body) = send(&app, "POST", "/api/tasks/3/claim", Value::Null).await;
        assert_eq!(body["data"]["outcome"], "claimed");
        assert_eq!(body["data"]["session"]["credits"], 20);
    }

    #[tokio::test]
    async fn test_edit_validation_and_remote_failure() {
        let (app, controller) = app();
        send(&app, "POST", "/api/login", json!({"identity": "user@example.com", "secret": "password123"})).await;

        let image = json!({"data": "AQID", "mime_type": "image/png"});
        let (status, body) = send(&app, "POST", "/api/edit", json!({"image": image, "prompt": ""})).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "Upload an image and describe the edit.");

        let (status, body) = send(&app, "POST", "/api/edit", json!({"image": image, "prompt": "hat"})).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "Edit failed: image service returned 503: overloaded");
        assert_eq!(controller.lock().await.balance(), 10);
    }

    #[tokio::test]
    async fn test_edit_for_replaced_session_returns_no_content() {
        let generator = Arc::new(GatedGenerator { gate: Notify::new() });
        let (app, controller) = app_with(generator.clone());
        send(&app, "POST", "/api/login", json!({"identity": "user@example.com", "secret": "password123"})).await;

        let in_flight = {
            let app = app.clone();
            let image = json!({"data": "AQID", "mime_type": "image/png"});
            tokio::spawn(async move { send(&app, "POST", "/api/edit", json!({"image": image, "prompt": "hat"})).await })
        };
        while !controller.lock().await.is_pending(EditOperation::Edit) {
            tokio::task::yield_now().await;
        }

        {
            let mut ctl = controller.lock().await;
            ctl.logout();
            ctl.login(Identity::new("user@example.com"));
        }
        generator.gate.notify_one();

        let (status, body) = in_flight.await.unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(body, Value::Null);
        assert_eq!(controller.lock().await.balance(), 10);
    }
}
