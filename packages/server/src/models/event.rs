use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::game::{EliminationResult, GamePhase, WinningTeam};

/// Client-visible state change pushed to a game's subscribers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    #[serde(rename_all = "camelCase")]
    GameOver {
        team: WinningTeam,
        reason: String,
        game_id: String,
    },
    #[serde(rename_all = "camelCase")]
    PhaseChange {
        phase: GamePhase,
        elimination_result: EliminationResult,
    },
    #[serde(rename_all = "camelCase")]
    VoteUpdate {
        trial_roster: Vec<String>,
        vote_tally: HashMap<String, u32>,
    },
}

impl GameEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            GameEvent::GameOver { .. } => "game_over",
            GameEvent::PhaseChange { .. } => "phase_change",
            GameEvent::VoteUpdate { .. } => "vote_update",
        }
    }
}

/// Wire envelope sent over the WebSocket feed.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEnvelope {
    pub game_id: String,
    pub timestamp: String,
    pub event: GameEvent,
}
