use std::sync::Arc;

use crate::models::config::ServerConfig;
use crate::services::{
    game_locks::GameLocks,
    player_directory::{InMemoryPlayerDirectory, PlayerDirectory},
    publisher::{EventPublisher, GameChannels},
    role_assignment::{RoleShuffler, ThreadRngShuffler},
    store::{GameStore, InMemoryGameStore},
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn GameStore>,
    pub directory: Arc<dyn PlayerDirectory>,
    pub publisher: Arc<dyn EventPublisher>,
    pub channels: Arc<GameChannels>,
    pub shuffler: Arc<dyn RoleShuffler>,
    pub locks: Arc<GameLocks>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new() -> Self {
        Self::with_config(ServerConfig::default())
    }

    /// In-memory collaborators; the channel hub doubles as the publisher.
    pub fn with_config(config: ServerConfig) -> Self {
        let channels = Arc::new(GameChannels::new(config.channel_capacity));
        AppState {
            store: Arc::new(InMemoryGameStore::new()),
            directory: Arc::new(InMemoryPlayerDirectory::new()),
            publisher: channels.clone(),
            channels,
            shuffler: Arc::new(ThreadRngShuffler),
            locks: Arc::new(GameLocks::new()),
            config: Arc::new(config),
        }
    }

    pub fn with_store(mut self, store: Arc<dyn GameStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_directory(mut self, directory: Arc<dyn PlayerDirectory>) -> Self {
        self.directory = directory;
        self
    }

    pub fn with_publisher(mut self, publisher: Arc<dyn EventPublisher>) -> Self {
        self.publisher = publisher;
        self
    }

    pub fn with_shuffler(mut self, shuffler: Arc<dyn RoleShuffler>) -> Self {
        self.shuffler = shuffler;
        self
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
