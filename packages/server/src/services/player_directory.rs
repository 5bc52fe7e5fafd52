use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::{error::GameError, models::player::MasterPlayer, state::AppState};

/// Global player identities that game rosters are resolved against.
#[async_trait]
pub trait PlayerDirectory: Send + Sync {
    /// Case-insensitive, whitespace-trimmed lookup.
    async fn resolve_by_name(&self, name: &str) -> Result<Option<MasterPlayer>, GameError>;
    async fn list(&self) -> Result<Vec<MasterPlayer>, GameError>;
    async fn register(&self, name: &str) -> Result<MasterPlayer, GameError>;
}

#[derive(Clone, Default)]
pub struct InMemoryPlayerDirectory {
    players: Arc<Mutex<Vec<MasterPlayer>>>,
}

impl InMemoryPlayerDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

fn same_name(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

#[async_trait]
impl PlayerDirectory for InMemoryPlayerDirectory {
    async fn resolve_by_name(&self, name: &str) -> Result<Option<MasterPlayer>, GameError> {
        let players = self.players.lock().await;
        Ok(players.iter().find(|p| same_name(&p.name, name)).cloned())
    }

    async fn list(&self) -> Result<Vec<MasterPlayer>, GameError> {
        let mut players = self.players.lock().await.clone();
        players.sort_by_key(|p| p.name.to_lowercase());
        Ok(players)
    }

    async fn register(&self, name: &str) -> Result<MasterPlayer, GameError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(GameError::invalid_argument("Player name is required."));
        }

        let mut players = self.players.lock().await;
        if players.iter().any(|p| same_name(&p.name, trimmed)) {
            return Err(GameError::conflict("Player already exists in master list."));
        }

        let player = MasterPlayer::new(trimmed.to_string());
        players.push(player.clone());
        Ok(player)
    }
}

pub async fn list_master_players(state: &AppState) -> Result<Vec<MasterPlayer>, GameError> {
    state.directory.list().await
}

pub async fn register_master_player(
    state: &AppState,
    name: &str,
) -> Result<MasterPlayer, GameError> {
    let player = state.directory.register(name).await?;
    tracing::info!("added {} ({}) to the master player list", player.name, player.id);
    Ok(player)
}
