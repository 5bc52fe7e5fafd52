use async_trait::async_trait;
use std::{collections::HashMap, future::Future, sync::Arc, time::Duration};
use tokio::sync::Mutex;

use crate::{error::GameError, models::game::Game};

/// Durable, addressable storage of game aggregates.
#[async_trait]
pub trait GameStore: Send + Sync {
    async fn load(&self, game_id: &str) -> Result<Game, GameError>;
    /// Inserts or replaces the record keyed by `game.id`.
    async fn save(&self, game: Game) -> Result<(), GameError>;
    async fn list(&self) -> Result<Vec<Game>, GameError>;
}

#[derive(Clone, Default)]
pub struct InMemoryGameStore {
    games: Arc<Mutex<HashMap<String, Game>>>,
}

impl InMemoryGameStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GameStore for InMemoryGameStore {
    async fn load(&self, game_id: &str) -> Result<Game, GameError> {
        let games = self.games.lock().await;
        games
            .get(game_id)
            .cloned()
            .ok_or_else(|| GameError::not_found(format!("Game {} not found.", game_id)))
    }

    async fn save(&self, game: Game) -> Result<(), GameError> {
        let mut games = self.games.lock().await;
        games.insert(game.id.clone(), game);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Game>, GameError> {
        Ok(self.games.lock().await.values().cloned().collect())
    }
}

/// Runs a store call, failing the operation once `limit` elapses.
pub async fn with_timeout<T, F>(limit: Duration, what: &str, call: F) -> Result<T, GameError>
where
    F: Future<Output = Result<T, GameError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => {
            tracing::error!("store call '{}' exceeded {:?}", what, limit);
            Err(GameError::Timeout(format!("{} exceeded {:?}", what, limit)))
        }
    }
}
