use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::role::{Role, RoleDefinition};
use crate::error::GameError;

/// Global player identity owned by the player directory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterPlayer {
    pub id: String,
    pub name: String,
}

impl MasterPlayer {
    pub fn new(name: String) -> Self {
        Self {
            id: format!("player_{}", uuid::Uuid::new_v4().simple()),
            name,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerStatus {
    Alive,
    Eliminated,
}

impl FromStr for PlayerStatus {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "alive" => Ok(PlayerStatus::Alive),
            "eliminated" => Ok(PlayerStatus::Eliminated),
            other => Err(GameError::invalid_argument(format!(
                "Invalid status: {}",
                other
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerInGame {
    pub master_player_id: String,
    pub display_name: String,
    pub assigned_role: Option<Role>,
    pub status: PlayerStatus,
}

impl PlayerInGame {
    pub fn new(master: &MasterPlayer) -> Self {
        Self {
            master_player_id: master.id.clone(),
            display_name: master.name.clone(),
            assigned_role: None,
            status: PlayerStatus::Alive,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.status == PlayerStatus::Alive
    }

    pub fn role_details(&self) -> Option<&'static RoleDefinition> {
        self.assigned_role.as_ref().map(Role::definition)
    }
}
