//! Phase and action engine.
//!
//! Every state-changing operation runs as one unit under the game's lock:
//! load, mutate a private copy, settle the win condition, save, publish.
//! A failed precondition returns before the save, so nothing is applied.

use std::collections::{HashMap, HashSet};

use crate::{
    error::GameError,
    models::{
        event::GameEvent,
        game::{
            EliminationResult, Game, GamePhase, GameSummary, NightActionOutcome, NightActionType,
        },
        player::{PlayerInGame, PlayerStatus},
        role::{Alignment, Role},
    },
    services::{
        publisher::PublishError,
        role_assignment::build_role_pool,
        store::with_timeout,
        win_condition::settle,
    },
    state::AppState,
};

pub(crate) async fn load_game(state: &AppState, game_id: &str) -> Result<Game, GameError> {
    with_timeout(state.config.store_timeout, "load", state.store.load(game_id)).await
}

async fn save_game(state: &AppState, game: Game) -> Result<(), GameError> {
    with_timeout(state.config.store_timeout, "save", state.store.save(game)).await
}

pub(crate) fn publish_all(state: &AppState, game_id: &str, events: Vec<GameEvent>) {
    for event in events {
        match state.publisher.publish(game_id, &event) {
            Ok(()) => {}
            Err(PublishError::NoSubscribers(_)) => {
                tracing::debug!("no display clients for game {}", game_id);
            }
            Err(e) => {
                tracing::warn!("failed to publish {} for game {}: {}", event.event_type(), game_id, e);
            }
        }
    }
}

/// Runs `op` against the stored game under its lock and persists the result.
/// Events collected by `op` go out only after the save succeeded.
pub(crate) async fn mutate_game<T, F>(state: &AppState, game_id: &str, op: F) -> Result<T, GameError>
where
    F: FnOnce(&mut Game, &mut Vec<GameEvent>) -> Result<T, GameError>,
{
    let _guard = state.locks.acquire(game_id).await;
    let mut game = load_game(state, game_id).await?;
    let mut events = Vec::new();
    let value = op(&mut game, &mut events)?;
    save_game(state, game).await?;
    publish_all(state, game_id, events);
    Ok(value)
}

pub async fn create_game(state: &AppState, name: Option<String>) -> Result<Game, GameError> {
    // Default names count existing games, so creations must not interleave.
    let _registry = state.locks.acquire_registry().await;
    let name = match name.map(|n| n.trim().to_string()) {
        Some(n) if !n.is_empty() => n,
        _ => {
            let existing = with_timeout(state.config.store_timeout, "list", state.store.list()).await?;
            format!("Werewolf Game {}", existing.len() + 1)
        }
    };

    let game = Game::new_with_generated_id(name);
    save_game(state, game.clone()).await?;
    tracing::info!("new game created: {} (ID: {})", game.display_name, game.id);
    Ok(game)
}

pub async fn get_game_state(state: &AppState, game_id: &str) -> Result<Game, GameError> {
    load_game(state, game_id).await
}

/// Newest games first.
pub async fn list_games(state: &AppState) -> Result<Vec<GameSummary>, GameError> {
    let mut games = with_timeout(state.config.store_timeout, "list", state.store.list()).await?;
    games.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(games.iter().map(Game::summary).collect())
}

/// Replaces the roster with `display_names` resolved against the player
/// directory. Unknown names are dropped; nobody keeps role or status.
pub async fn sync_roster(
    state: &AppState,
    game_id: &str,
    display_names: &[String],
) -> Result<Game, GameError> {
    let mut resolved = Vec::new();
    let mut seen = HashSet::new();
    for name in display_names {
        match state.directory.resolve_by_name(name).await? {
            Some(master) => {
                if seen.insert(master.id.clone()) {
                    resolved.push(master);
                } else {
                    tracing::warn!("duplicate roster entry {:?} ignored for game {}", name, game_id);
                }
            }
            None => {
                tracing::warn!("player {:?} is not in the master list, skipped for game {}", name, game_id);
            }
        }
    }

    mutate_game(state, game_id, move |game, events| {
        game.ensure_not_finished()?;

        game.roster = resolved.iter().map(|m| m.name.clone()).collect();
        game.players = resolved
            .iter()
            .map(|m| (m.name.clone(), PlayerInGame::new(m)))
            .collect::<HashMap<_, _>>();

        // Roles were reset, so no seer remains and play restarts from setup.
        game.seer_name = None;
        if game.phase != GamePhase::Setup {
            game.phase = GamePhase::Setup;
            game.elimination_result = EliminationResult::default();
            events.push(GameEvent::PhaseChange {
                phase: GamePhase::Setup,
                elimination_result: EliminationResult::default(),
            });
        }
        let target_left = game
            .night_target
            .as_ref()
            .is_some_and(|target| !game.players.contains_key(target));
        if target_left {
            game.night_target = None;
        }
        let players = &game.players;
        game.trial_roster.retain(|name| players.contains_key(name));
        game.vote_tally.retain(|name, _| players.contains_key(name));

        tracing::info!("players updated for game {}: {:?}", game.id, game.roster);
        Ok(game.clone())
    })
    .await
}

pub async fn assign_roles(state: &AppState, game_id: &str) -> Result<Game, GameError> {
    let shuffler = state.shuffler.clone();
    mutate_game(state, game_id, move |game, events| {
        if game.is_finished() {
            return Err(GameError::invalid_state("Game already finished."));
        }
        if game.roster.is_empty() {
            return Err(GameError::invalid_state("No players."));
        }
        if game.roles_assigned() {
            return Err(GameError::invalid_state("Roles have already been assigned."));
        }

        let mut pool = build_role_pool(game.roster.len());
        shuffler.shuffle(&mut pool);

        game.seer_name = None;
        for (name, role) in game.roster.iter().zip(pool) {
            let player = game.players.get_mut(name).ok_or_else(|| {
                GameError::Storage(format!("roster entry {} has no player record", name))
            })?;
            player.assigned_role = Some(role);
            player.status = PlayerStatus::Alive;
            if role == Role::Seer {
                game.seer_name = Some(name.clone());
            }
        }

        game.night_target = None;
        game.clear_trial();
        game.phase = GamePhase::RolesAssigned;
        game.elimination_result = EliminationResult::default();
        game.record("Roles have been assigned.");
        events.push(GameEvent::PhaseChange {
            phase: game.phase.clone(),
            elimination_result: EliminationResult::default(),
        });

        tracing::info!("roles assigned for game {}", game.id);
        Ok(game.clone())
    })
    .await
}

pub async fn set_phase(state: &AppState, game_id: &str, target: &str) -> Result<Game, GameError> {
    let target: GamePhase = target.parse()?;
    if target == GamePhase::Finished {
        return Err(GameError::invalid_argument(
            "A game only finishes when a win condition is met.",
        ));
    }

    mutate_game(state, game_id, move |game, events| {
        game.ensure_not_finished()?;
        if target != GamePhase::Setup && !game.roles_assigned() {
            return Err(GameError::invalid_state(
                "Cannot start phase. Roles not assigned yet.",
            ));
        }

        let previous = std::mem::replace(&mut game.phase, target.clone());
        let mut result = EliminationResult::default();

        match target {
            GamePhase::Night => {
                game.night_target = None;
                game.clear_trial();
            }
            GamePhase::Day => {
                let night_target = game.night_target.take();
                game.clear_trial();
                if previous == GamePhase::Night {
                    result = resolve_night_target(game, night_target, events);
                }
                // Covers manual eliminations made during the previous day.
                events.extend(settle(game));
            }
            _ => {}
        }

        game.elimination_result = result.clone();
        if !game.is_finished() {
            events.push(GameEvent::PhaseChange {
                phase: game.phase.clone(),
                elimination_result: result,
            });
        }

        tracing::info!("phase for {} to {}", game.id, game.phase);
        Ok(game.clone())
    })
    .await
}

fn resolve_night_target(
    game: &mut Game,
    night_target: Option<String>,
    events: &mut Vec<GameEvent>,
) -> EliminationResult {
    let mut result = EliminationResult::default();
    let Some(name) = night_target else {
        let info = "No one was eliminated by werewolves.".to_string();
        game.record(info.clone());
        result.special_info = Some(info);
        return result;
    };

    let Some(player) = game.player_mut(&name).filter(|p| p.is_alive()) else {
        let info = format!("{} was already eliminated.", name);
        game.record(info.clone());
        result.special_info = Some(info);
        return result;
    };
    player.status = PlayerStatus::Eliminated;

    game.record(format!("{} was eliminated by werewolves.", name));
    result.eliminated_player_name = Some(name);
    events.extend(settle(game));
    result
}

pub async fn night_action(
    state: &AppState,
    game_id: &str,
    action: NightActionType,
    target: &str,
) -> Result<NightActionOutcome, GameError> {
    match action {
        NightActionType::SeerCheck => {
            // Pure read; the caller is trusted to be the Seer's moderator.
            let _guard = state.locks.acquire(game_id).await;
            let game = load_game(state, game_id).await?;
            check_night_action(&game)?;

            let player = game.require_player(target)?;
            let role = player.role_details().ok_or_else(|| {
                GameError::invalid_argument(format!("{} has no role assigned.", target))
            })?;
            let is_werewolf = role.alignment == Alignment::Werewolf;
            let alignment_message = if is_werewolf {
                "Is a Werewolf"
            } else {
                "Not a Werewolf"
            };
            Ok(NightActionOutcome::SeerReveal {
                target_player_name: target.to_string(),
                is_werewolf,
                alignment_message: alignment_message.to_string(),
            })
        }
        NightActionType::WerewolfTarget => {
            mutate_game(state, game_id, |game, _events| {
                check_night_action(game)?;

                let player = game.require_player(target)?;
                if player.assigned_role.is_some_and(|r| r.is_werewolf()) {
                    return Err(GameError::invalid_argument("Werewolves can't target werewolves."));
                }
                if !player.is_alive() {
                    return Err(GameError::invalid_argument(format!(
                        "{} is not alive.",
                        target
                    )));
                }

                game.night_target = Some(target.to_string());
                tracing::info!("werewolves targeted {} in game {}", target, game.id);
                Ok(NightActionOutcome::TargetRecorded {
                    target_player_name: target.to_string(),
                    message: format!("Werewolf target recorded: {}", target),
                })
            })
            .await
        }
    }
}

fn check_night_action(game: &Game) -> Result<(), GameError> {
    game.ensure_not_finished()?;
    game.ensure_phase(GamePhase::Night, "Night actions")
}

/// Moderator override of a single player's status.
pub async fn set_player_status(
    state: &AppState,
    game_id: &str,
    player_name: &str,
    status: &str,
) -> Result<Game, GameError> {
    mutate_game(state, game_id, |game, events| {
        game.ensure_not_finished()?;
        game.require_player(player_name)?;
        let status: PlayerStatus = status.parse()?;

        if let Some(player) = game.player_mut(player_name) {
            player.status = status;
        }
        let label = match status {
            PlayerStatus::Alive => "alive",
            PlayerStatus::Eliminated => "eliminated",
        };
        game.record(format!("{} was marked {} by the moderator.", player_name, label));
        events.extend(settle(game));

        tracing::info!("status for {} in {} to {}", player_name, game.id, label);
        Ok(game.clone())
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::game::WinningTeam;
    use crate::services::player_directory::{InMemoryPlayerDirectory, PlayerDirectory};
    use crate::services::publisher::EventPublisher;
    use crate::services::role_assignment::RoleShuffler;
    use crate::services::store::GameStore;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::time::Duration;

    struct IdentityShuffler;

    impl RoleShuffler for IdentityShuffler {
        fn shuffle(&self, _pool: &mut [Role]) {}
    }

    async fn game_with_players(state: &AppState, names: &[&str]) -> String {
        for name in names {
            state.directory.register(name).await.unwrap();
        }
        let game = create_game(state, Some("Test".to_string())).await.unwrap();
        let names: Vec<String> = names.iter().map(|n| n.to_string()).collect();
        sync_roster(state, &game.id, &names).await.unwrap();
        game.id
    }

    #[tokio::test]
    async fn test_identity_shuffle_zips_by_roster_order() {
        let state = AppState::new().with_shuffler(Arc::new(IdentityShuffler));
        let game_id = game_with_players(&state, &["A", "B", "C", "D"]).await;

        let game = assign_roles(&state, &game_id).await.unwrap();
        let role_of = |n: &str| game.player(n).unwrap().assigned_role;
        assert_eq!(role_of("A"), Some(Role::Werewolf));
        assert_eq!(role_of("B"), Some(Role::Seer));
        assert_eq!(role_of("C"), Some(Role::Villager));
        assert_eq!(role_of("D"), Some(Role::Villager));
        assert_eq!(game.seer_name.as_deref(), Some("B"));
        assert_eq!(game.phase, GamePhase::RolesAssigned);
    }

    #[tokio::test]
    async fn test_assign_roles_twice_is_invalid_state() {
        let state = AppState::new();
        let game_id = game_with_players(&state, &["A", "B", "C"]).await;
        assign_roles(&state, &game_id).await.unwrap();

        let again = assign_roles(&state, &game_id).await;
        assert!(matches!(again, Err(GameError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_assign_roles_needs_players() {
        let state = AppState::new();
        let game = create_game(&state, None).await.unwrap();
        assert_eq!(game.display_name, "Werewolf Game 1");

        let result = assign_roles(&state, &game.id).await;
        assert!(matches!(result, Err(GameError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_two_player_game_has_no_seer() {
        let state = AppState::new();
        let game_id = game_with_players(&state, &["A", "B"]).await;
        let game = assign_roles(&state, &game_id).await.unwrap();
        assert!(game.seer_name.is_none());
        assert!(game
            .players
            .values()
            .all(|p| p.assigned_role != Some(Role::Seer)));
    }

    #[tokio::test]
    async fn test_sync_roster_drops_unknown_names_and_resets_state() {
        let state = AppState::new().with_shuffler(Arc::new(IdentityShuffler));
        let game_id = game_with_players(&state, &["A", "B", "C"]).await;
        assign_roles(&state, &game_id).await.unwrap();

        let names = vec!["b".to_string(), "Ghost".to_string(), "C".to_string(), " c ".to_string()];
        let game = sync_roster(&state, &game_id, &names).await.unwrap();

        assert_eq!(game.roster, vec!["B", "C"]);
        assert_eq!(game.players.len(), 2);
        assert!(game.players.values().all(|p| p.assigned_role.is_none()));
        assert!(game.seer_name.is_none());
    }

    #[tokio::test]
    async fn test_night_kill_is_resolved_at_day() {
        let state = AppState::new().with_shuffler(Arc::new(IdentityShuffler));
        let game_id = game_with_players(&state, &["A", "B", "C", "D"]).await;
        assign_roles(&state, &game_id).await.unwrap();
        set_phase(&state, &game_id, "night").await.unwrap();

        night_action(&state, &game_id, NightActionType::WerewolfTarget, "C")
            .await
            .unwrap();
        let game = set_phase(&state, &game_id, "day").await.unwrap();

        assert_eq!(game.player("C").unwrap().status, PlayerStatus::Eliminated);
        assert_eq!(
            game.elimination_result.eliminated_player_name.as_deref(),
            Some("C")
        );
        assert!(game.night_target.is_none());
        assert!(game.event_log.contains(&"C was eliminated by werewolves.".to_string()));
        // 1 werewolf against 2 others keeps the game going.
        assert_eq!(game.phase, GamePhase::Day);
        assert!(game.winner().is_none());
    }

    #[tokio::test]
    async fn test_day_without_target_records_no_elimination() {
        let state = AppState::new();
        let game_id = game_with_players(&state, &["A", "B", "C"]).await;
        assign_roles(&state, &game_id).await.unwrap();
        set_phase(&state, &game_id, "night").await.unwrap();

        let game = set_phase(&state, &game_id, "day").await.unwrap();
        assert_eq!(
            game.elimination_result.special_info.as_deref(),
            Some("No one was eliminated by werewolves.")
        );
        assert!(game.players.values().all(|p| p.is_alive()));
    }

    #[tokio::test]
    async fn test_phase_requires_roles() {
        let state = AppState::new();
        let game_id = game_with_players(&state, &["A", "B", "C"]).await;

        let result = set_phase(&state, &game_id, "night").await;
        assert!(matches!(result, Err(GameError::InvalidState(_))));
        assert!(set_phase(&state, &game_id, "setup").await.is_ok());
    }

    #[tokio::test]
    async fn test_finished_cannot_be_set_directly() {
        let state = AppState::new();
        let game_id = game_with_players(&state, &["A", "B", "C"]).await;
        assign_roles(&state, &game_id).await.unwrap();

        let result = set_phase(&state, &game_id, "finished").await;
        assert!(matches!(result, Err(GameError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_custom_phase_is_stored_verbatim() {
        let state = AppState::new();
        let game_id = game_with_players(&state, &["A", "B", "C"]).await;
        assign_roles(&state, &game_id).await.unwrap();

        let game = set_phase(&state, &game_id, "dusk").await.unwrap();
        assert_eq!(game.phase, GamePhase::Other("dusk".to_string()));
    }

    #[tokio::test]
    async fn test_werewolf_cannot_target_werewolf_even_when_eliminated() {
        let state = AppState::new().with_shuffler(Arc::new(IdentityShuffler));
        let game_id = game_with_players(&state, &["A", "B", "C", "D"]).await;
        assign_roles(&state, &game_id).await.unwrap();
        set_phase(&state, &game_id, "night").await.unwrap();

        let alive = night_action(&state, &game_id, NightActionType::WerewolfTarget, "A").await;
        assert!(matches!(alive, Err(GameError::InvalidArgument(_))));

        // Eliminating the only werewolf through the engine would end the
        // game, so write the snapshot straight to the store.
        let mut game = state.store.load(&game_id).await.unwrap();
        game.player_mut("A").unwrap().status = PlayerStatus::Eliminated;
        state.store.save(game).await.unwrap();

        let dead = night_action(&state, &game_id, NightActionType::WerewolfTarget, "A").await;
        assert!(matches!(dead, Err(GameError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_werewolf_target_rejects_dead_and_unknown_players() {
        let state = AppState::new().with_shuffler(Arc::new(IdentityShuffler));
        let game_id = game_with_players(&state, &["A", "B", "C", "D", "E"]).await;
        assign_roles(&state, &game_id).await.unwrap();
        set_player_status(&state, &game_id, "E", "eliminated").await.unwrap();
        set_phase(&state, &game_id, "night").await.unwrap();

        let dead = night_action(&state, &game_id, NightActionType::WerewolfTarget, "E").await;
        assert!(matches!(dead, Err(GameError::InvalidArgument(_))));
        let unknown = night_action(&state, &game_id, NightActionType::WerewolfTarget, "Z").await;
        assert!(matches!(unknown, Err(GameError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_retargeting_overwrites() {
        let state = AppState::new().with_shuffler(Arc::new(IdentityShuffler));
        let game_id = game_with_players(&state, &["A", "B", "C", "D"]).await;
        assign_roles(&state, &game_id).await.unwrap();
        set_phase(&state, &game_id, "night").await.unwrap();

        night_action(&state, &game_id, NightActionType::WerewolfTarget, "B")
            .await
            .unwrap();
        night_action(&state, &game_id, NightActionType::WerewolfTarget, "D")
            .await
            .unwrap();
        let game = get_game_state(&state, &game_id).await.unwrap();
        assert_eq!(game.night_target.as_deref(), Some("D"));
    }

    #[tokio::test]
    async fn test_seer_check_reveals_alignment_without_mutation() {
        let state = AppState::new().with_shuffler(Arc::new(IdentityShuffler));
        let game_id = game_with_players(&state, &["A", "B", "C"]).await;
        assign_roles(&state, &game_id).await.unwrap();
        set_phase(&state, &game_id, "night").await.unwrap();
        let before = get_game_state(&state, &game_id).await.unwrap();

        let wolf = night_action(&state, &game_id, NightActionType::SeerCheck, "A")
            .await
            .unwrap();
        assert!(matches!(
            wolf,
            NightActionOutcome::SeerReveal { is_werewolf: true, .. }
        ));
        let villager = night_action(&state, &game_id, NightActionType::SeerCheck, "C")
            .await
            .unwrap();
        assert!(matches!(
            villager,
            NightActionOutcome::SeerReveal { is_werewolf: false, .. }
        ));

        let after = get_game_state(&state, &game_id).await.unwrap();
        assert_eq!(before.event_log, after.event_log);
        assert_eq!(before.night_target, after.night_target);
    }

    #[tokio::test]
    async fn test_night_actions_only_at_night() {
        let state = AppState::new();
        let game_id = game_with_players(&state, &["A", "B", "C"]).await;
        assign_roles(&state, &game_id).await.unwrap();

        let result = night_action(&state, &game_id, NightActionType::SeerCheck, "A").await;
        assert!(matches!(result, Err(GameError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_manual_elimination_can_end_the_game() {
        let state = AppState::new().with_shuffler(Arc::new(IdentityShuffler));
        let game_id = game_with_players(&state, &["A", "B", "C"]).await;
        assign_roles(&state, &game_id).await.unwrap();
        set_phase(&state, &game_id, "day").await.unwrap();

        let game = set_player_status(&state, &game_id, "A", "eliminated")
            .await
            .unwrap();
        assert_eq!(game.winner().unwrap().team, WinningTeam::Village);
        assert_eq!(game.phase, GamePhase::Finished);

        let after = set_player_status(&state, &game_id, "A", "alive").await;
        assert!(matches!(after, Err(GameError::Conflict(_))));
        let roster = sync_roster(&state, &game_id, &["B".to_string()]).await;
        assert!(matches!(roster, Err(GameError::Conflict(_))));
        let assign = assign_roles(&state, &game_id).await;
        assert!(matches!(assign, Err(GameError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_invalid_status_is_rejected_without_change() {
        let state = AppState::new();
        let game_id = game_with_players(&state, &["A", "B", "C"]).await;
        assign_roles(&state, &game_id).await.unwrap();

        let result = set_player_status(&state, &game_id, "A", "zombie").await;
        assert!(matches!(result, Err(GameError::InvalidArgument(_))));
        let game = get_game_state(&state, &game_id).await.unwrap();
        assert!(game.player("A").unwrap().is_alive());
    }

    #[tokio::test]
    async fn test_game_over_is_published_once() {
        let state = AppState::new().with_shuffler(Arc::new(IdentityShuffler));
        let game_id = game_with_players(&state, &["A", "B"]).await;
        assign_roles(&state, &game_id).await.unwrap();
        set_phase(&state, &game_id, "night").await.unwrap();
        let mut rx = state.channels.subscribe(&game_id);

        night_action(&state, &game_id, NightActionType::WerewolfTarget, "B")
            .await
            .unwrap();
        let game = set_phase(&state, &game_id, "day").await.unwrap();
        assert_eq!(game.winner().unwrap().team, WinningTeam::Werewolves);

        let mut types = Vec::new();
        while let Ok(axum::extract::ws::Message::Text(text)) = rx.try_recv() {
            let value: serde_json::Value = serde_json::from_str(&text).unwrap();
            types.push(value["event"]["type"].as_str().unwrap().to_string());
        }
        assert_eq!(types, vec!["game_over"]);
    }

    #[tokio::test]
    async fn test_unknown_game_ids_leave_no_locks_or_channels() {
        let state = AppState::new();
        for i in 0..1000 {
            let result = set_phase(&state, &format!("bogus_{}", i), "night").await;
            assert!(matches!(result, Err(GameError::NotFound(_))));
        }
        assert_eq!(state.locks.active_count(), 0);
        assert_eq!(state.channels.channel_count(), 0);

        // Events for a game nobody watches do not open a channel either.
        let game_id = game_with_players(&state, &["A", "B", "C"]).await;
        assign_roles(&state, &game_id).await.unwrap();
        assert_eq!(state.locks.active_count(), 0);
        assert_eq!(state.channels.channel_count(), 0);
    }

    #[tokio::test]
    async fn test_sync_roster_mid_game_returns_to_setup() {
        let state = AppState::new().with_shuffler(Arc::new(IdentityShuffler));
        let game_id = game_with_players(&state, &["A", "B", "C", "D"]).await;
        assign_roles(&state, &game_id).await.unwrap();
        set_phase(&state, &game_id, "night").await.unwrap();
        let mut rx = state.channels.subscribe(&game_id);

        let names: Vec<String> = ["A", "B", "C"].iter().map(|n| n.to_string()).collect();
        let game = sync_roster(&state, &game_id, &names).await.unwrap();
        assert_eq!(game.phase, GamePhase::Setup);
        assert!(!game.roles_assigned());

        let Ok(axum::extract::ws::Message::Text(text)) = rx.try_recv() else {
            panic!("expected a phase change");
        };
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["event"]["type"], "phase_change");
        assert_eq!(value["event"]["phase"], "setup");

        let target = night_action(&state, &game_id, NightActionType::WerewolfTarget, "B").await;
        assert!(matches!(target, Err(GameError::InvalidState(_))));
        let night = set_phase(&state, &game_id, "night").await;
        assert!(matches!(night, Err(GameError::InvalidState(_))));
        assert!(assign_roles(&state, &game_id).await.is_ok());
    }

    #[tokio::test]
    async fn test_concurrent_creations_get_distinct_default_names() {
        let state = AppState::new();
        let mut handles = Vec::new();
        for _ in 0..20 {
            let state = state.clone();
            handles.push(tokio::spawn(async move { create_game(&state, None).await }));
        }

        let mut names = HashSet::new();
        for handle in handles {
            let game = handle.await.unwrap().unwrap();
            names.insert(game.display_name);
        }
        assert_eq!(names.len(), 20);
        assert!(names.contains("Werewolf Game 20"));
    }

    #[derive(Default)]
    struct RecordingPublisher {
        events: std::sync::Mutex<Vec<GameEvent>>,
    }

    impl EventPublisher for RecordingPublisher {
        fn publish(&self, _game_id: &str, event: &GameEvent) -> Result<(), PublishError> {
            self.events.lock().unwrap().push(event.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_game_over_is_recorded_once_across_later_calls() {
        let directory = Arc::new(InMemoryPlayerDirectory::new());
        for name in ["A", "B", "C"] {
            directory.register(name).await.unwrap();
        }
        let publisher = Arc::new(RecordingPublisher::default());
        let state = AppState::new()
            .with_directory(directory)
            .with_publisher(publisher.clone())
            .with_shuffler(Arc::new(IdentityShuffler));

        let game = create_game(&state, None).await.unwrap();
        let names: Vec<String> = ["a", "b", "c"].iter().map(|n| n.to_string()).collect();
        let synced = sync_roster(&state, &game.id, &names).await.unwrap();
        assert_eq!(synced.roster, vec!["A", "B", "C"]);
        assign_roles(&state, &game.id).await.unwrap();
        set_phase(&state, &game.id, "day").await.unwrap();

        set_player_status(&state, &game.id, "A", "eliminated")
            .await
            .unwrap();
        assert!(set_phase(&state, &game.id, "night").await.is_err());
        assert!(set_player_status(&state, &game.id, "B", "eliminated").await.is_err());

        let events = publisher.events.lock().unwrap();
        let game_overs: Vec<_> = events
            .iter()
            .filter(|e| e.event_type() == "game_over")
            .collect();
        assert_eq!(game_overs.len(), 1);
        assert!(matches!(
            game_overs[0],
            GameEvent::GameOver { team: WinningTeam::Village, .. }
        ));
        assert_eq!(events.last().map(|e| e.event_type()), Some("game_over"));
    }

    struct SlowStore;

    #[async_trait]
    impl GameStore for SlowStore {
        async fn load(&self, _game_id: &str) -> Result<Game, GameError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Err(GameError::not_found("never"))
        }

        async fn save(&self, _game: Game) -> Result<(), GameError> {
            Ok(())
        }

        async fn list(&self) -> Result<Vec<Game>, GameError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_slow_store_fails_with_timeout() {
        let config = crate::models::config::ServerConfig {
            store_timeout: Duration::from_millis(20),
            ..Default::default()
        };
        let state = AppState::with_config(config).with_store(Arc::new(SlowStore));

        let result = assign_roles(&state, "game_x").await;
        assert!(matches!(result, Err(GameError::Timeout(_))));
    }
}
