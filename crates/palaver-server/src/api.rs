use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{HeaderValue, Method, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use palaver_shared::constants::WS_PATH;
use palaver_shared::types::{ConversationId, UserId};
use palaver_store::User;

use crate::config::ServerConfig;
use crate::error::ApiError;
use crate::session::SessionCoordinator;
use crate::store::SqliteStore;
use crate::ws::ws_handler;

#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<SessionCoordinator>,
    /// Direct store access for the user directory endpoints.
    pub store: Arc<SqliteStore>,
    pub config: Arc<ServerConfig>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(allowed_origin(&state.config.cors_origin))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/info", get(server_info))
        .route("/api/users/register", post(register_user))
        .route("/api/users/all", get(list_users))
        .route("/api/conversation/getGroups", get(user_groups))
        .route(WS_PATH, get(ws_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn allowed_origin(origin: &str) -> AllowOrigin {
    if origin == "*" {
        return AllowOrigin::from(Any);
    }
    match HeaderValue::from_str(origin) {
        Ok(value) => AllowOrigin::exact(value),
        Err(_) => {
            warn!(origin, "Invalid CORS_ORIGIN, allowing any origin");
            AllowOrigin::from(Any)
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    connections: usize,
    online_users: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ServerInfoResponse {
    name: String,
    version: &'static str,
    history_cache_ttl_secs: u64,
}

#[derive(Debug, Deserialize)]
struct RegisterRequest {
    username: String,
}

#[derive(Debug, Serialize)]
struct RegisterResponse {
    id: UserId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroupsQuery {
    user_id: Option<String>,
}

/// A group as listed for one of its members.
#[derive(Debug, Serialize)]
struct GroupSummary {
    id: ConversationId,
    name: Option<String>,
    members: Vec<UserId>,
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let coordinator = &state.coordinator;
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        connections: coordinator.open_connections().await,
        online_users: coordinator.registry().active_users().await.len(),
    })
}

async fn server_info(State(state): State<AppState>) -> Json<ServerInfoResponse> {
    Json(ServerInfoResponse {
        name: state.config.instance_name.clone(),
        version: env!("CARGO_PKG_VERSION"),
        history_cache_ttl_secs: state.config.history_ttl.as_secs(),
    })
}

async fn register_user(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let username = request.username.trim();
    if username.is_empty() {
        return Err(ApiError::BadRequest("Username is required".into()));
    }

    let user = state.store.database().await.create_user(username)?;
    info!(user = %user.id, username = %user.username, "User registered");

    Ok((StatusCode::CREATED, Json(RegisterResponse { id: user.id })))
}

async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, ApiError> {
    let users = state.store.database().await.get_all_users()?;
    Ok(Json(users))
}

/// Groups the user participates in, most recently updated first.
async fn user_groups(
    State(state): State<AppState>,
    Query(query): Query<GroupsQuery>,
) -> Result<Json<Vec<GroupSummary>>, ApiError> {
    let raw = query
        .user_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::BadRequest("User ID is required".into()))?;
    let user: UserId = raw
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid user ID: {raw}")))?;

    let mut groups = state
        .store
        .database()
        .await
        .list_group_conversations_for_user(user)?;
    groups.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

    let summaries = groups
        .into_iter()
        .map(|group| GroupSummary {
            id: group.id,
            name: group.group_name,
            members: group.participants,
        })
        .collect();
    Ok(Json(summaries))
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}
