//! Trial votes during the Voting phase.
//!
//! Tallies are moderator-entered counts. Ties among the leaders are resolved
//! by the moderator before `process_elimination` is called.

use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::{
    error::GameError,
    models::{
        event::GameEvent,
        game::{EliminationResult, Game, GamePhase},
        player::PlayerStatus,
    },
    services::{game_service::mutate_game, win_condition::settle},
    state::AppState,
};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedElimination {
    #[serde(flatten)]
    pub game: Game,
    pub elimination_outcome: String,
}

fn vote_update(game: &Game) -> GameEvent {
    GameEvent::VoteUpdate {
        trial_roster: game.trial_roster.clone(),
        vote_tally: game.vote_tally.clone(),
    }
}

/// Adds `delta` to a tally, saturating at zero and at `u32::MAX`.
fn apply_delta(current: u32, delta: i64) -> u32 {
    let next = i64::from(current).saturating_add(delta);
    next.clamp(0, i64::from(u32::MAX)) as u32
}

pub async fn start_vote(
    state: &AppState,
    game_id: &str,
    candidates: &[String],
) -> Result<Game, GameError> {
    mutate_game(state, game_id, |game, events| {
        game.ensure_not_finished()?;
        game.ensure_phase(GamePhase::Day, "Starting a vote")?;

        if candidates.is_empty() {
            return Err(GameError::invalid_argument("No players put on trial."));
        }
        let mut seen = HashSet::new();
        for name in candidates {
            if !seen.insert(name.as_str()) {
                return Err(GameError::invalid_argument(format!(
                    "{} is on trial more than once.",
                    name
                )));
            }
            if !game.require_player(name)?.is_alive() {
                return Err(GameError::invalid_argument(format!(
                    "{} is not alive and cannot be put on trial.",
                    name
                )));
            }
        }

        game.trial_roster = candidates.to_vec();
        game.vote_tally = candidates.iter().map(|name| (name.clone(), 0)).collect();
        game.phase = GamePhase::Voting;
        events.push(vote_update(game));

        tracing::info!("voting started for {:?} in game {}", candidates, game.id);
        Ok(game.clone())
    })
    .await
}

pub async fn update_vote(
    state: &AppState,
    game_id: &str,
    player_name: &str,
    delta: i64,
) -> Result<HashMap<String, u32>, GameError> {
    mutate_game(state, game_id, |game, events| {
        game.ensure_not_finished()?;
        game.ensure_phase(GamePhase::Voting, "Updating votes")?;

        let count = game.vote_tally.get_mut(player_name).ok_or_else(|| {
            GameError::invalid_argument(format!("{} is not on trial.", player_name))
        })?;
        *count = apply_delta(*count, delta);
        let count = *count;
        events.push(vote_update(game));

        tracing::debug!("vote for {} in game {} now {}", player_name, game.id, count);
        Ok(game.vote_tally.clone())
    })
    .await
}

pub async fn clear_votes(state: &AppState, game_id: &str) -> Result<Game, GameError> {
    mutate_game(state, game_id, |game, events| {
        game.ensure_not_finished()?;
        game.ensure_phase(GamePhase::Voting, "Clearing votes")?;

        for count in game.vote_tally.values_mut() {
            *count = 0;
        }
        events.push(vote_update(game));

        tracing::info!("votes cleared for trial in game {}", game.id);
        Ok(game.clone())
    })
    .await
}

/// Closes the vote. `chosen` is the moderator's pick, `None` for nobody.
pub async fn process_elimination(
    state: &AppState,
    game_id: &str,
    chosen: Option<&str>,
) -> Result<ProcessedElimination, GameError> {
    mutate_game(state, game_id, |game, events| {
        game.ensure_not_finished()?;
        game.ensure_phase(GamePhase::Voting, "Processing an elimination")?;

        let mut result = EliminationResult::default();
        let mut eliminated = false;
        let outcome = match chosen {
            Some(name) => match game.player_mut(name).filter(|p| p.is_alive()) {
                Some(player) => {
                    player.status = PlayerStatus::Eliminated;
                    eliminated = true;
                    result.eliminated_player_name = Some(name.to_string());
                    format!("{} was eliminated by vote.", name)
                }
                None => {
                    let info = format!("{} could not be eliminated.", name);
                    result.special_info = Some(info.clone());
                    info
                }
            },
            None => {
                let info = "No one was eliminated by vote.".to_string();
                result.special_info = Some(info.clone());
                info
            }
        };
        game.record(outcome.clone());

        game.clear_trial();
        game.phase = GamePhase::Day;
        game.elimination_result = result.clone();
        if eliminated {
            events.extend(settle(game));
        }
        if !game.is_finished() {
            events.push(GameEvent::PhaseChange {
                phase: game.phase.clone(),
                elimination_result: result,
            });
        }

        tracing::info!("elimination processed for {}: {}", game.id, outcome);
        Ok(ProcessedElimination {
            game: game.clone(),
            elimination_outcome: outcome,
        })
    })
    .await
}
