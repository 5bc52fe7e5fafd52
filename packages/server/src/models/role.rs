use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt, str::FromStr};

use crate::error::GameError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Villager,
    Werewolf,
    Seer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Team {
    Good,
    Evil,
}

/// Concealment category used for Seer reveals and win-condition grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alignment {
    Village,
    Werewolf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleDefinition {
    pub name: &'static str,
    pub team: Team,
    pub alignment: Alignment,
    pub description: &'static str,
}

static ROLE_CATALOG: Lazy<HashMap<Role, RoleDefinition>> = Lazy::new(|| {
    HashMap::from([
        (
            Role::Villager,
            RoleDefinition {
                name: "Villager",
                team: Team::Good,
                alignment: Alignment::Village,
                description: "Find and eliminate the werewolves.",
            },
        ),
        (
            Role::Werewolf,
            RoleDefinition {
                name: "Werewolf",
                team: Team::Evil,
                alignment: Alignment::Werewolf,
                description: "Eliminate the villagers to win.",
            },
        ),
        (
            Role::Seer,
            RoleDefinition {
                name: "Seer",
                team: Team::Good,
                alignment: Alignment::Village,
                description: "Each night, you may learn the alignment of one player.",
            },
        ),
    ])
});

impl Role {
    pub const ALL: [Role; 3] = [Role::Villager, Role::Werewolf, Role::Seer];

    pub fn definition(&self) -> &'static RoleDefinition {
        // The catalog is built from Role::ALL, every variant is present.
        &ROLE_CATALOG[self]
    }

    pub fn name(&self) -> &'static str {
        self.definition().name
    }

    pub fn team(&self) -> Team {
        self.definition().team
    }

    pub fn alignment(&self) -> Alignment {
        self.definition().alignment
    }

    pub fn is_werewolf(&self) -> bool {
        self.alignment() == Alignment::Werewolf
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Role {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| GameError::not_found(format!("Unknown role: {}", s)))
    }
}

/// Every role definition, in catalog order.
pub fn catalog() -> Vec<&'static RoleDefinition> {
    Role::ALL.iter().map(|role| role.definition()).collect()
}
