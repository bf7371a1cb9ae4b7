//! Route handlers for the queue server.
//!
//! This module contains the HTTP handlers and their request/response types.
//! Edit endpoints always answer 200 with a `success` flag; clients react to
//! `code: "REJECT"` by fetching the queue again and resubmitting.

use std::sync::{Arc, LazyLock};

use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::queue::{Edit, Fingerprint, Item, Target};
use crate::resolve::{self, LinkResolver};
use crate::session::{Coordinator, EditError, EditOutcome};

static ROOM_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]{1,20}$").expect("valid room id pattern"));

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<Coordinator>,
    pub resolver: Option<Arc<dyn LinkResolver>>,
}

impl AppState {
    pub fn new(coordinator: Arc<Coordinator>, resolver: Option<Arc<dyn LinkResolver>>) -> Self {
        AppState {
            coordinator,
            resolver,
        }
    }
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RoomQuery {
    pub room_id: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ListInfoQuery {
    pub room_id: String,
    #[serde(alias = "clientFingerprint")]
    pub last_hash: Option<String>,
}

#[derive(Serialize, Debug, PartialEq, Eq)]
pub struct ListInfoResponse {
    pub changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list: Option<Vec<Item>>,
    pub fingerprint: Fingerprint,
}

/// Edit submission body
#[derive(Deserialize, Debug)]
pub struct SongOperationBody {
    #[serde(rename = "idArrayHash", alias = "baseFingerprint")]
    pub base_fingerprint: Fingerprint,
    #[serde(alias = "item")]
    pub song: Item,
    #[serde(rename = "toIndex", alias = "targetIndex")]
    pub target: Target,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseCode {
    Reject,
    NothingQueued,
}

#[derive(Serialize, Debug, Default, PartialEq, Eq)]
pub struct OperationResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<Fingerprint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<Item>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<ResponseCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
}

impl OperationResponse {
    fn accepted(outcome: EditOutcome) -> Self {
        OperationResponse {
            success: true,
            fingerprint: Some(outcome.fingerprint),
            item: Some(outcome.item),
            ..Default::default()
        }
    }

    fn shuffled(fingerprint: Fingerprint) -> Self {
        OperationResponse {
            success: true,
            fingerprint: Some(fingerprint),
            ..Default::default()
        }
    }

    fn failed(err: &EditError) -> Self {
        let code = match err {
            EditError::Conflict(_) | EditError::Replay(_) => ResponseCode::Reject,
            EditError::NothingQueued => ResponseCode::NothingQueued,
        };
        OperationResponse {
            success: false,
            code: Some(code),
            ..Default::default()
        }
    }

    fn invalid(msg: &str) -> Self {
        OperationResponse {
            success: false,
            msg: Some(msg.to_string()),
            ..Default::default()
        }
    }
}

pub fn is_valid_room_id(room: &str) -> bool {
    ROOM_ID_PATTERN.is_match(room)
}

/// Basic health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        message: "Server is running!".to_string(),
    })
}

/// Returns the room's queue, or only its fingerprint if the client is current.
pub async fn song_list_info(
    State(state): State<AppState>,
    Query(query): Query<ListInfoQuery>,
) -> Result<Json<ListInfoResponse>, StatusCode> {
    if !is_valid_room_id(&query.room_id) {
        return Err(StatusCode::BAD_REQUEST);
    }
    debug!(room = %query.room_id, last_hash = ?query.last_hash, "list requested");

    let client = query.last_hash.map(Fingerprint::from);
    let snapshot = state.coordinator.read(&query.room_id, client.as_ref()).await;

    Ok(Json(ListInfoResponse {
        changed: snapshot.changed,
        list: snapshot.list,
        fingerprint: snapshot.fingerprint,
    }))
}

/// Move, insert or delete a song.
pub async fn song_operation(
    State(state): State<AppState>,
    Query(query): Query<RoomQuery>,
    Json(body): Json<SongOperationBody>,
) -> Json<OperationResponse> {
    if !is_valid_room_id(&query.room_id) {
        return Json(OperationResponse::invalid("Invalid Room ID"));
    }
    debug!(
        room = %query.room_id,
        base = %body.base_fingerprint,
        song = %body.song.title,
        target = ?body.target,
        "operation requested"
    );

    let mut song = body.song;
    if let Some(resolver) = &state.resolver {
        song = resolve::enrich(song, resolver.as_ref()).await;
    }
    if song.id.is_empty() {
        return Json(OperationResponse::invalid("Missing song id"));
    }

    let edit = Edit::new(song, body.target);
    match state
        .coordinator
        .submit(&query.room_id, &body.base_fingerprint, edit)
        .await
    {
        Ok(outcome) => Json(OperationResponse::accepted(outcome)),
        Err(err @ EditError::Conflict(_)) => {
            info!(room = %query.room_id, "rejecting edit: {}", err);
            Json(OperationResponse::failed(&err))
        }
        Err(err) => {
            error!(room = %query.room_id, "operation re-run failed: {}", err);
            Json(OperationResponse::failed(&err))
        }
    }
}

/// Marks the next queued song as sung and moves it to the end.
pub async fn advance(
    State(state): State<AppState>,
    Query(query): Query<RoomQuery>,
) -> Json<OperationResponse> {
    if !is_valid_room_id(&query.room_id) {
        return Json(OperationResponse::invalid("Invalid Room ID"));
    }

    match state.coordinator.advance(&query.room_id).await {
        Ok(outcome) => Json(OperationResponse::accepted(outcome)),
        Err(err) => {
            warn!(room = %query.room_id, "advance failed: {}", err);
            Json(OperationResponse::failed(&err))
        }
    }
}

/// Shuffles the songs still waiting to be sung.
pub async fn shuffle(
    State(state): State<AppState>,
    Query(query): Query<RoomQuery>,
) -> Json<OperationResponse> {
    if !is_valid_room_id(&query.room_id) {
        return Json(OperationResponse::invalid("Invalid Room ID"));
    }

    let mut rng = StdRng::from_entropy();
    let fingerprint = state.coordinator.shuffle(&query.room_id, &mut rng).await;
    Json(OperationResponse::shuffled(fingerprint))
}

/// Creates and configures the main application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/songListInfo", get(song_list_info))
        .route("/api/songOperation", post(song_operation))
        .route("/api/advance", post(advance))
        .route("/api/shuffle", post(shuffle))
        .with_state(state)
}
