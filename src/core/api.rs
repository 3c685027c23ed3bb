//! HTTP + WebSocket session host
//!
//! Endpoints:
//! - GET /health - Health check
//! - POST /session/{user} - Create session (idempotent)
//! - POST /session/{user}/sample - Map an emotion sample, returns params + prompt
//! - POST /session/{user}/feedback - Apply a reward signal to the profile
//! - GET /session/{user} - Session status
//! - GET /session/{user}/profile - Learned profile
//! - WS /ws/{user} - Live parameter stream

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, RwLock};

use crate::config::{Config, LearnerConfig};
use crate::core::{render_prompt, DecisionEngine, ProfileLearner, SmoothedState};
use crate::types::{EmotionSample, ParameterSet, RewardSignal, UserProfile};

/// Buffered updates per WebSocket subscriber
const UPDATE_CHANNEL_CAPACITY: usize = 100;

/// Everything the host keeps for one user
#[derive(Debug)]
pub struct UserSession {
    pub user_id: String,
    pub state: SmoothedState,
    pub profile: UserProfile,
    pub learner: ProfileLearner,
    pub last_prompt: Option<String>,
    pub created_at: DateTime<Utc>,
    pub update_tx: broadcast::Sender<LoopUpdate>,
}

impl UserSession {
    fn new(user_id: &str, engine: &DecisionEngine, learner: LearnerConfig) -> Self {
        let (update_tx, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        Self {
            user_id: user_id.to_string(),
            state: engine.new_state(user_id),
            profile: UserProfile::new(),
            learner: ProfileLearner::with_config(learner),
            last_prompt: None,
            created_at: Utc::now(),
            update_tx,
        }
    }
}

/// One user's session; requests for the same user serialize on it
pub type SharedSession = Arc<Mutex<UserSession>>;

/// User id → session. The outer write lock is taken only to insert.
pub type SessionRegistry = RwLock<HashMap<String, SharedSession>>;

/// App state
pub struct AppState {
    pub sessions: SessionRegistry,
    pub engine: DecisionEngine,
    pub learner_config: LearnerConfig,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            engine: DecisionEngine::with_config(config.engine),
            learner_config: config.learner,
        }
    }
}

/// Result of one mapping cycle; also the WebSocket payload
#[derive(Debug, Clone, Serialize)]
pub struct LoopUpdate {
    pub user_id: String,
    pub cycle_index: u64,
    pub params: ParameterSet,
    pub prompt: String,
    pub explore: bool,
}

/// Feedback response
#[derive(Debug, Serialize)]
pub struct FeedbackResponse {
    pub reward: f64,
    pub epsilon: f64,
    pub avoid: Vec<String>,
}

/// Session status response
#[derive(Debug, Serialize)]
pub struct SessionStatusResponse {
    pub user_id: String,
    pub cycle_index: u64,
    pub last_params: Option<ParameterSet>,
    pub last_prompt: Option<String>,
    pub window: usize,
    pub epsilon: f64,
    pub created_at: DateTime<Utc>,
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub sessions_active: usize,
}

/// Create the API router
pub fn create_router(config: Config) -> Router {
    let state = Arc::new(AppState::new(config));

    Router::new()
        .route("/health", get(health))
        .route("/session/:user", get(get_session).post(create_session))
        .route("/session/:user/sample", post(post_sample))
        .route("/session/:user/feedback", post(post_feedback))
        .route("/session/:user/profile", get(get_profile))
        .route("/ws/:user", get(websocket_handler))
        .with_state(state)
}

/// Health check endpoint
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let sessions = state.sessions.read().await;
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
        sessions_active: sessions.len(),
    })
}

/// Existing session for `user`, if any
async fn find_session(state: &AppState, user: &str) -> Option<SharedSession> {
    state.sessions.read().await.get(user).cloned()
}

/// Existing session for `user`, created on first contact
async fn session_entry(state: &AppState, user: &str) -> SharedSession {
    if let Some(session) = find_session(state, user).await {
        return session;
    }
    let mut sessions = state.sessions.write().await;
    sessions
        .entry(user.to_string())
        .or_insert_with(|| {
            tracing::info!(user = %user, "new session");
            let session = UserSession::new(user, &state.engine, state.learner_config.clone());
            Arc::new(Mutex::new(session))
        })
        .clone()
}

/// Create a session without mapping anything
async fn create_session(
    State(state): State<Arc<AppState>>,
    Path(user): Path<String>,
) -> Json<SessionStatusResponse> {
    let session = session_entry(&state, &user).await;
    let session = session.lock().await;
    Json(status_of(&session))
}

/// Map one sample; the session is created on first contact
async fn post_sample(
    State(state): State<Arc<AppState>>,
    Path(user): Path<String>,
    Json(sample): Json<EmotionSample>,
) -> Json<LoopUpdate> {
    let session = session_entry(&state, &user).await;
    let mut guard = session.lock().await;
    let session = &mut *guard;

    let params = state
        .engine
        .map(&sample, &mut session.state, Some(&session.profile));
    let prompt = render_prompt(&params, Some(&session.profile));
    let explore = session.learner.should_explore();
    session.last_prompt = Some(prompt.clone());

    let update = LoopUpdate {
        user_id: user,
        cycle_index: session.state.cycle_index(),
        params,
        prompt,
        explore,
    };
    let _ = session.update_tx.send(update.clone());

    Json(update)
}

/// Apply feedback for the most recent parameter set
async fn post_feedback(
    State(state): State<Arc<AppState>>,
    Path(user): Path<String>,
    Json(signal): Json<RewardSignal>,
) -> Result<Json<FeedbackResponse>, StatusCode> {
    let session = find_session(&state, &user)
        .await
        .ok_or(StatusCode::NOT_FOUND)?;
    let mut guard = session.lock().await;
    let session = &mut *guard;
    let params = session
        .state
        .last_params()
        .cloned()
        .ok_or(StatusCode::CONFLICT)?;

    let reward = session
        .learner
        .apply_feedback(&mut session.profile, &params, &signal);

    Ok(Json(FeedbackResponse {
        reward,
        epsilon: session.learner.epsilon(),
        avoid: session.profile.avoid.iter().cloned().collect(),
    }))
}

/// Get session status
async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(user): Path<String>,
) -> Result<Json<SessionStatusResponse>, StatusCode> {
    let session = find_session(&state, &user)
        .await
        .ok_or(StatusCode::NOT_FOUND)?;
    let session = session.lock().await;
    Ok(Json(status_of(&session)))
}

fn status_of(session: &UserSession) -> SessionStatusResponse {
    SessionStatusResponse {
        user_id: session.user_id.clone(),
        cycle_index: session.state.cycle_index(),
        last_params: session.state.last_params().cloned(),
        last_prompt: session.last_prompt.clone(),
        window: session.state.window(),
        epsilon: session.learner.epsilon(),
        created_at: session.created_at,
    }
}

/// Get the learned profile
async fn get_profile(
    State(state): State<Arc<AppState>>,
    Path(user): Path<String>,
) -> Result<Json<UserProfile>, StatusCode> {
    let session = find_session(&state, &user)
        .await
        .ok_or(StatusCode::NOT_FOUND)?;
    let profile = session.lock().await.profile.clone();
    Ok(Json(profile))
}

/// WebSocket handler for live updates
async fn websocket_handler(
    State(state): State<Arc<AppState>>,
    Path(user): Path<String>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, StatusCode> {
    let session = find_session(&state, &user)
        .await
        .ok_or(StatusCode::NOT_FOUND)?;
    let rx = session.lock().await.update_tx.subscribe();

    Ok(ws.on_upgrade(move |socket| handle_websocket(socket, rx)))
}

/// Forward updates until either side goes away
async fn handle_websocket(socket: WebSocket, mut rx: broadcast::Receiver<LoopUpdate>) {
    let (mut sender, mut receiver) = socket.split();

    let mut send_task = tokio::spawn(async move {
        loop {
            let update = match rx.recv().await {
                Ok(update) => update,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "websocket subscriber lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };
            let json = match serde_json::to_string(&update) {
                Ok(json) => json,
                Err(_) => continue,
            };
            if sender.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if matches!(msg, Message::Close(_)) {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
}

/// Run the API server
pub async fn run_server(addr: &str, config: Config) -> crate::Result<()> {
    let router = create_router(config);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, version = crate::VERSION, "moodloop host listening");
    tracing::info!("  POST /session/:user          - Create session");
    tracing::info!("  POST /session/:user/sample   - Map emotion sample");
    tracing::info!("  POST /session/:user/feedback - Apply reward");
    tracing::info!("  GET  /session/:user          - Session status");
    tracing::info!("  GET  /session/:user/profile  - Learned profile");
    tracing::info!("  WS   /ws/:user               - Live updates");
    tracing::info!("  GET  /health                 - Health check");
    axum::serve(listener, router).await?;
    Ok(())
}
