use crate::{models::role, state::AppState};
use axum::{routing::get, Json, Router};
use serde_json::json;

mod game;
mod player;

pub use game::{
    CreateGameRequest, NightActionRequest, PhaseRequest, PlayerStatusRequest,
    ProcessEliminationRequest, StartVoteRequest, SyncRosterRequest, UpdateVoteRequest,
    VotesResponse,
};

pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/version", get(|| async { Json(json!({ "version": SERVER_VERSION })) }))
        .route("/api/roles", get(|| async { Json(role::catalog()) }))
        .nest("/api/master-players", player::routes(state.clone()))
        .nest("/api/games", game::routes(state))
}
