use axum::extract::ws::Message;
use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::models::event::{EventEnvelope, GameEvent};

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("no subscribers for game {0}")]
    NoSubscribers(String),
    #[error("failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Fan-out of client-visible game events, keyed by game id.
///
/// Delivery is fire-and-forget: callers log a failure and carry on.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, game_id: &str, event: &GameEvent) -> Result<(), PublishError>;
}

/// One broadcast channel per game; WebSocket sessions subscribe to the
/// channel of the game they display.
pub struct GameChannels {
    channels: DashMap<String, broadcast::Sender<Message>>,
    capacity: usize,
}

impl GameChannels {
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn get_or_create_channel(&self, game_id: &str) -> broadcast::Sender<Message> {
        self.channels
            .entry(game_id.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }

    pub fn subscribe(&self, game_id: &str) -> broadcast::Receiver<Message> {
        self.get_or_create_channel(game_id).subscribe()
    }

    pub fn subscriber_count(&self, game_id: &str) -> usize {
        self.channels
            .get(game_id)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }

    /// Drops the game's channel once its last subscriber is gone.
    pub fn release(&self, game_id: &str) {
        self.channels
            .remove_if(game_id, |_, tx| tx.receiver_count() == 0);
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}

impl EventPublisher for GameChannels {
    fn publish(&self, game_id: &str, event: &GameEvent) -> Result<(), PublishError> {
        let envelope = EventEnvelope {
            game_id: game_id.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            event: event.clone(),
        };
        let text = serde_json::to_string(&envelope)?;

        let Some(tx) = self.channels.get(game_id).map(|entry| entry.value().clone()) else {
            return Err(PublishError::NoSubscribers(game_id.to_string()));
        };
        tx.send(Message::Text(text))
            .map(|receivers| {
                tracing::debug!(
                    "published {} for game {} to {} subscriber(s)",
                    event.event_type(),
                    game_id,
                    receivers
                );
            })
            .map_err(|_| PublishError::NoSubscribers(game_id.to_string()))
    }
}
