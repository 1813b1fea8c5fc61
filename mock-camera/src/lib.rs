use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

/// Incoming command object. Mirrors the client's wire shape independently,
/// so drift between the two surfaces in integration tests.
#[derive(Debug, Clone, Deserialize)]
pub struct Command {
    pub cmd: String,
    #[serde(default)]
    pub action: i32,
    #[serde(default)]
    pub param: Option<Value>,
    #[serde(default)]
    pub token: Option<String>,
}

/// Outgoing response object.
#[derive(Debug, Clone, Serialize)]
pub struct CommandResponse {
    pub cmd: String,
    pub code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<Value>,
}

/// Behavior knobs for the emulated camera.
#[derive(Debug, Clone)]
pub struct MockCamera {
    pub username: String,
    pub password: String,
    /// Lease granted with each issued token, in seconds.
    pub lease_time: u32,
    /// Delay applied before answering, for deadline tests.
    pub response_delay: Duration,
    /// Answer every batch with an empty array, for short-envelope tests.
    pub drop_responses: bool,
}

impl Default for MockCamera {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password: "camera123".to_string(),
            lease_time: 3600,
            response_delay: Duration::ZERO,
            drop_responses: false,
        }
    }
}

/// Mutable camera state, shared between the router and inspecting tests.
#[derive(Debug)]
pub struct CameraState {
    pub config: MockCamera,
    /// Currently valid session token, if any login happened.
    pub token: Option<String>,
    /// Number of batches the endpoint has served.
    pub requests_served: u64,
}

pub type SharedState = Arc<RwLock<CameraState>>;

pub fn state_with(config: MockCamera) -> SharedState {
    Arc::new(RwLock::new(CameraState {
        config,
        token: None,
        requests_served: 0,
    }))
}

pub fn app() -> Router {
    app_with_state(state_with(MockCamera::default()))
}

pub fn app_with(config: MockCamera) -> Router {
    app_with_state(state_with(config))
}

pub fn app_with_state(state: SharedState) -> Router {
    Router::new()
        .route("/cgi-bin/api.cgi", post(handle_batch))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with_state(listener: TcpListener, state: SharedState) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_state(state)).await
}

async fn handle_batch(
    State(state): State<SharedState>,
    Json(commands): Json<Vec<Command>>,
) -> Json<Vec<CommandResponse>> {
    let delay = {
        let mut camera = state.write().await;
        camera.requests_served += 1;
        camera.config.response_delay
    };
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let mut camera = state.write().await;
    if camera.config.drop_responses {
        return Json(Vec::new());
    }
    let responses = commands
        .iter()
        .map(|command| answer(&mut camera, command))
        .collect();
    Json(responses)
}

fn answer(camera: &mut CameraState, command: &Command) -> CommandResponse {
    match command.cmd.as_str() {
        "Login" => login(camera, command),
        "Logout" => logout(camera, command),
        "GetDevInfo" => device_info(camera, command),
        "GetTime" => time(camera, command),
        other => failure(other, 1, -9, "not supported"),
    }
}

fn login(camera: &mut CameraState, command: &Command) -> CommandResponse {
    let user = command.param.as_ref().and_then(|param| param.get("User"));
    let name = user.and_then(|user| user.get("userName")).and_then(Value::as_str);
    let password = user.and_then(|user| user.get("password")).and_then(Value::as_str);

    if name != Some(camera.config.username.as_str())
        || password != Some(camera.config.password.as_str())
    {
        return failure("Login", 1, -7, "login failed");
    }

    let token = Uuid::new_v4().simple().to_string();
    camera.token = Some(token.clone());
    success(
        "Login",
        json!({"Token": {"name": token, "leaseTime": camera.config.lease_time}}),
    )
}

fn logout(camera: &mut CameraState, command: &Command) -> CommandResponse {
    if !token_valid(camera, command) {
        return failure("Logout", 1, -6, "please login first");
    }
    camera.token = None;
    success("Logout", json!({"rspCode": 200}))
}

fn device_info(camera: &CameraState, command: &Command) -> CommandResponse {
    if !token_valid(camera, command) {
        return failure("GetDevInfo", 1, -6, "please login first");
    }
    let mut response = success(
        "GetDevInfo",
        json!({"DevInfo": {
            "model": "IPC-500",
            "name": "mock camera",
            "firmVer": "3.0.0.0",
            "channelNum": 1,
            "serial": "00000000000000"
        }}),
    );
    if command.action == 1 {
        response.initial = Some(json!({"DevInfo": {"name": "Camera1"}}));
        response.range = Some(json!({"DevInfo": {"name": {"maxLen": 31}}}));
    }
    response
}

fn time(camera: &CameraState, command: &Command) -> CommandResponse {
    if !token_valid(camera, command) {
        return failure("GetTime", 1, -6, "please login first");
    }
    success(
        "GetTime",
        json!({"Time": {"year": 2025, "mon": 1, "day": 1, "hour": 0, "min": 0, "sec": 0}}),
    )
}

fn token_valid(camera: &CameraState, command: &Command) -> bool {
    match (&camera.token, &command.token) {
        (Some(valid), Some(sent)) => valid == sent,
        _ => false,
    }
}

fn success(cmd: &str, value: Value) -> CommandResponse {
    CommandResponse {
        cmd: cmd.to_string(),
        code: 0,
        value: Some(value),
        error: None,
        initial: None,
        range: None,
    }
}

fn failure(cmd: &str, code: i32, rsp_code: i32, detail: &str) -> CommandResponse {
    CommandResponse {
        cmd: cmd.to_string(),
        code,
        value: None,
        error: Some(json!({"rspCode": rsp_code, "detail": detail})),
        initial: None,
        range: None,
    }
}
