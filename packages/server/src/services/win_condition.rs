//! Win-condition evaluation.
//!
//! `evaluate` is a pure read over a game snapshot; `settle` is the single
//! place that records a winner and ends the game.

use crate::models::{
    event::GameEvent,
    game::{Game, GamePhase, Winner, WinningTeam},
};

pub fn evaluate(game: &Game) -> Option<Winner> {
    if game.is_finished() || !game.roles_assigned() {
        return None;
    }

    let alive = game.alive_with_role();
    if alive.is_empty() {
        if matches!(game.phase, GamePhase::Setup | GamePhase::RolesAssigned) {
            return None;
        }
        return Some(Winner {
            team: WinningTeam::NoOne,
            reason: "All players eliminated.".to_string(),
        });
    }

    let (werewolves, others): (Vec<_>, Vec<_>) = alive
        .into_iter()
        .partition(|p| p.assigned_role.is_some_and(|r| r.is_werewolf()));

    if werewolves.is_empty() && !others.is_empty() {
        return Some(Winner {
            team: WinningTeam::Village,
            reason: "All werewolves have been eliminated.".to_string(),
        });
    }
    // Parity ends the game: the village gets no final turn.
    if !werewolves.is_empty() && werewolves.len() >= others.len() {
        return Some(Winner {
            team: WinningTeam::Werewolves,
            reason: "Werewolves have overwhelmed the village.".to_string(),
        });
    }
    None
}

/// Applies `evaluate` to the game. Returns the `game_over` event to publish
/// when this call decided the game, `None` otherwise (including when the game
/// was already decided).
pub fn settle(game: &mut Game) -> Option<GameEvent> {
    let winner = evaluate(game)?;
    tracing::info!(
        "game {} ended: {} win ({})",
        game.id,
        winner.team,
        winner.reason
    );
    game.record(format!("Game over: {} ({})", winner.team, winner.reason));
    let event = GameEvent::GameOver {
        team: winner.team,
        reason: winner.reason.clone(),
        game_id: game.id.clone(),
    };
    game.declare_winner(winner);
    Some(event)
}
