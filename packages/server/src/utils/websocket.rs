use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::{error::GameError, services::game_service, state::AppState};

pub async fn handler(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, GameError> {
    // Subscribing to an unknown game would leave the client waiting forever.
    game_service::get_game_state(&state, &game_id).await?;
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, game_id)))
}

/// Forwards the game's events to one display client until either side hangs up.
pub async fn handle_socket(ws: WebSocket, state: AppState, game_id: String) {
    info!("display client connected to game {}", game_id);

    let mut rx = state.channels.subscribe(&game_id);
    let (mut sender, mut receiver) = ws.split();

    let game_id_for_send = game_id.clone();
    let mut send_task = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(msg) => {
                    if let Err(e) = sender.send(msg).await {
                        debug!("send to display client failed in game {}: {}", game_id_for_send, e);
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("display client in game {} skipped {} events", game_id_for_send, skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let game_id_for_receive = game_id.clone();
    let mut receive_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Close(_) => break,
                // Displays are read-only.
                Message::Text(text) => {
                    debug!("ignoring client message in game {}: {}", game_id_for_receive, text)
                }
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => receive_task.abort(),
        _ = &mut receive_task => {
            send_task.abort();
            // The receiver must be dropped before the channel can be released.
            let _ = send_task.await;
        }
    }

    state.channels.release(&game_id);
    info!("display client left game {}", game_id);
}
