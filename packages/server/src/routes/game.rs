use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{
    error::GameError,
    models::game::NightActionType,
    services::{game_service, vote_service},
    state::AppState,
    utils::websocket,
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGameRequest {
    pub game_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SyncRosterRequest {
    pub players: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStatusRequest {
    pub player_name: String,
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct PhaseRequest {
    pub phase: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NightActionRequest {
    pub action_type: String,
    pub target_player_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartVoteRequest {
    pub player_names_on_trial: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVoteRequest {
    pub player_name: String,
    pub change: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessEliminationRequest {
    pub eliminated_player_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VotesResponse {
    pub votes: HashMap<String, u32>,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        // curl http://localhost:8080/api/games
        // curl -X POST -H 'Content-Type: application/json' -d '{"gameName":"Friday"}' http://localhost:8080/api/games
        .route("/", get(list_games).post(create_game))
        .nest(
            "/:game_id",
            Router::new()
                .route("/", get(get_game_state))
                // roster and roles
                .route("/players", post(sync_roster))
                .route("/assign-roles", post(assign_roles))
                .route("/player-status", post(set_player_status))
                // phase and night actions
                .route("/phase", post(set_phase))
                .route("/action", post(night_action))
                // trial votes
                .route("/start-vote", post(start_vote))
                .route("/update-vote", post(update_vote))
                .route("/clear-votes", post(clear_votes))
                .route("/process-elimination", post(process_elimination))
                // websocat ws://localhost:8080/api/games/{gameId}/ws
                .route("/ws", get(websocket::handler)),
        )
        .with_state(state)
}

async fn list_games(State(state): State<AppState>) -> Result<impl IntoResponse, GameError> {
    let games = game_service::list_games(&state).await?;
    Ok(Json(games))
}

async fn create_game(
    State(state): State<AppState>,
    payload: Option<Json<CreateGameRequest>>,
) -> Result<impl IntoResponse, GameError> {
    let Json(request) = payload.unwrap_or_default();
    let game = game_service::create_game(&state, request.game_name).await?;
    Ok((StatusCode::CREATED, Json(game)))
}

async fn get_game_state(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
) -> Result<impl IntoResponse, GameError> {
    let game = game_service::get_game_state(&state, &game_id).await?;
    Ok(Json(game))
}

async fn sync_roster(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    Json(request): Json<SyncRosterRequest>,
) -> Result<impl IntoResponse, GameError> {
    let game = game_service::sync_roster(&state, &game_id, &request.players).await?;
    Ok(Json(game))
}

async fn assign_roles(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
) -> Result<impl IntoResponse, GameError> {
    let game = game_service::assign_roles(&state, &game_id).await?;
    Ok(Json(game))
}

async fn set_player_status(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    Json(request): Json<PlayerStatusRequest>,
) -> Result<impl IntoResponse, GameError> {
    let game =
        game_service::set_player_status(&state, &game_id, &request.player_name, &request.status)
            .await?;
    Ok(Json(game))
}

async fn set_phase(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    Json(request): Json<PhaseRequest>,
) -> Result<impl IntoResponse, GameError> {
    let game = game_service::set_phase(&state, &game_id, &request.phase).await?;
    Ok(Json(game))
}

async fn night_action(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    Json(request): Json<NightActionRequest>,
) -> Result<impl IntoResponse, GameError> {
    let action: NightActionType = request.action_type.parse()?;
    let outcome =
        game_service::night_action(&state, &game_id, action, &request.target_player_name).await?;
    Ok(Json(outcome))
}

async fn start_vote(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    Json(request): Json<StartVoteRequest>,
) -> Result<impl IntoResponse, GameError> {
    let game = vote_service::start_vote(&state, &game_id, &request.player_names_on_trial).await?;
    Ok(Json(game))
}

async fn update_vote(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    Json(request): Json<UpdateVoteRequest>,
) -> Result<impl IntoResponse, GameError> {
    let votes =
        vote_service::update_vote(&state, &game_id, &request.player_name, request.change).await?;
    Ok(Json(VotesResponse { votes }))
}

async fn clear_votes(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
) -> Result<impl IntoResponse, GameError> {
    let game = vote_service::clear_votes(&state, &game_id).await?;
    Ok(Json(game))
}

async fn process_elimination(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    payload: Option<Json<ProcessEliminationRequest>>,
) -> Result<impl IntoResponse, GameError> {
    let Json(request) = payload.unwrap_or_default();
    let processed = vote_service::process_elimination(
        &state,
        &game_id,
        request.eliminated_player_name.as_deref(),
    )
    .await?;
    Ok(Json(processed))
}
