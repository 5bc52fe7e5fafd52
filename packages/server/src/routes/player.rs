use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::Deserialize;

use crate::{error::GameError, services::player_directory, state::AppState};

#[derive(Debug, Deserialize)]
pub struct RegisterPlayerRequest {
    pub name: String,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        // curl http://localhost:8080/api/master-players
        // curl -X POST -H 'Content-Type: application/json' -d '{"name":"Alice"}' http://localhost:8080/api/master-players
        .route("/", get(list_players).post(register_player))
        .with_state(state)
}

async fn list_players(State(state): State<AppState>) -> Result<impl IntoResponse, GameError> {
    let players = player_directory::list_master_players(&state).await?;
    Ok(Json(players))
}

async fn register_player(
    State(state): State<AppState>,
    Json(request): Json<RegisterPlayerRequest>,
) -> Result<impl IntoResponse, GameError> {
    let player = player_directory::register_master_player(&state, &request.name).await?;
    Ok((StatusCode::CREATED, Json(player)))
}
