use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use super::player::{PlayerInGame, PlayerStatus};
use crate::error::GameError;

/// Phase of the moderator's state machine.
///
/// Unknown phase names are kept verbatim in `Other` so moderator tooling can
/// introduce extra phases without engine changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum GamePhase {
    Setup,
    RolesAssigned,
    Night,
    Day,
    Voting,
    Finished,
    Other(String),
}

impl GamePhase {
    pub fn as_str(&self) -> &str {
        match self {
            GamePhase::Setup => "setup",
            GamePhase::RolesAssigned => "roles_assigned",
            GamePhase::Night => "night",
            GamePhase::Day => "day",
            GamePhase::Voting => "voting",
            GamePhase::Finished => "finished",
            GamePhase::Other(name) => name,
        }
    }
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GamePhase {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let phase = match s {
            "setup" => GamePhase::Setup,
            "roles_assigned" => GamePhase::RolesAssigned,
            "night" => GamePhase::Night,
            "day" => GamePhase::Day,
            "voting" => GamePhase::Voting,
            "finished" => GamePhase::Finished,
            other
                if !other.is_empty()
                    && other.chars().all(|c| c.is_ascii_lowercase() || c == '_') =>
            {
                GamePhase::Other(other.to_string())
            }
            other => {
                return Err(GameError::invalid_argument(format!(
                    "Invalid phase name: {:?}",
                    other
                )))
            }
        };
        Ok(phase)
    }
}

impl From<GamePhase> for String {
    fn from(phase: GamePhase) -> Self {
        phase.as_str().to_string()
    }
}

impl TryFrom<String> for GamePhase {
    type Error = GameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WinningTeam {
    Village,
    Werewolves,
    #[serde(rename = "No One")]
    NoOne,
}

impl fmt::Display for WinningTeam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WinningTeam::Village => write!(f, "Village"),
            WinningTeam::Werewolves => write!(f, "Werewolves"),
            WinningTeam::NoOne => write!(f, "No One"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Winner {
    pub team: WinningTeam,
    pub reason: String,
}

/// Outcome of the most recent phase change, rendered by display clients.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EliminationResult {
    pub eliminated_player_name: Option<String>,
    pub special_info: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NightActionType {
    SeerCheck,
    WerewolfTarget,
}

impl FromStr for NightActionType {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "seerCheck" => Ok(NightActionType::SeerCheck),
            "werewolfTarget" => Ok(NightActionType::WerewolfTarget),
            other => Err(GameError::invalid_argument(format!(
                "Unknown action: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NightActionOutcome {
    #[serde(rename_all = "camelCase")]
    SeerReveal {
        target_player_name: String,
        is_werewolf: bool,
        alignment_message: String,
    },
    #[serde(rename_all = "camelCase")]
    TargetRecorded {
        target_player_name: String,
        message: String,
    },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: String,
    pub display_name: String,
    pub roster: Vec<String>,
    pub players: HashMap<String, PlayerInGame>,
    pub phase: GamePhase,
    pub seer_name: Option<String>,
    pub night_target: Option<String>,
    pub trial_roster: Vec<String>,
    pub vote_tally: HashMap<String, u32>,
    winner: Option<Winner>,
    pub elimination_result: EliminationResult,
    pub event_log: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Lightweight row for game listings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSummary {
    pub game_id: String,
    pub game_name: String,
    pub player_count: usize,
    pub current_phase: GamePhase,
    pub game_winner: Option<Winner>,
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Game {{ id: {}, name: {}, roster: {:?}, phase: {}, winner: {:?} }}",
            self.id, self.display_name, self.roster, self.phase, self.winner
        )
    }
}

impl Game {
    pub fn new(id: String, display_name: String) -> Self {
        Game {
            id,
            display_name,
            roster: Vec::new(),
            players: HashMap::new(),
            phase: GamePhase::Setup,
            seer_name: None,
            night_target: None,
            trial_roster: Vec::new(),
            vote_tally: HashMap::new(),
            winner: None,
            elimination_result: EliminationResult::default(),
            event_log: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn new_with_generated_id(display_name: String) -> Self {
        Self::new(
            format!("game_{}", uuid::Uuid::new_v4().simple()),
            display_name,
        )
    }

    pub fn winner(&self) -> Option<&Winner> {
        self.winner.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.winner.is_some()
    }

    /// Only the win-condition evaluator finishes a game.
    pub(crate) fn declare_winner(&mut self, winner: Winner) {
        self.winner = Some(winner);
        self.phase = GamePhase::Finished;
    }

    pub fn player(&self, name: &str) -> Option<&PlayerInGame> {
        self.players.get(name)
    }

    pub fn player_mut(&mut self, name: &str) -> Option<&mut PlayerInGame> {
        self.players.get_mut(name)
    }

    pub fn require_player(&self, name: &str) -> Result<&PlayerInGame, GameError> {
        self.player(name)
            .ok_or_else(|| GameError::not_found(format!("Player {} is not in this game.", name)))
    }

    /// True once any roster member holds a role.
    pub fn roles_assigned(&self) -> bool {
        self.roster
            .iter()
            .any(|name| matches!(self.players.get(name), Some(p) if p.assigned_role.is_some()))
    }

    /// Roster members, in roster order, who are alive and hold a role.
    pub fn alive_with_role(&self) -> Vec<&PlayerInGame> {
        self.roster
            .iter()
            .filter_map(|name| self.players.get(name))
            .filter(|p| p.status == PlayerStatus::Alive && p.assigned_role.is_some())
            .collect()
    }

    pub fn clear_trial(&mut self) {
        self.trial_roster.clear();
        self.vote_tally.clear();
    }

    pub fn record(&mut self, narrative: impl Into<String>) {
        self.event_log.push(narrative.into());
    }

    pub fn summary(&self) -> GameSummary {
        GameSummary {
            game_id: self.id.clone(),
            game_name: self.display_name.clone(),
            player_count: self.roster.len(),
            current_phase: self.phase.clone(),
            game_winner: self.winner.clone(),
        }
    }

    pub(crate) fn ensure_not_finished(&self) -> Result<(), GameError> {
        if self.is_finished() {
            return Err(GameError::conflict("Game is already finished."));
        }
        Ok(())
    }

    pub(crate) fn ensure_phase(&self, expected: GamePhase, action: &str) -> Result<(), GameError> {
        if self.phase != expected {
            return Err(GameError::invalid_state(format!(
                "{} is only allowed during the {} phase (current: {}).",
                action, expected, self.phase
            )));
        }
        Ok(())
    }
}
