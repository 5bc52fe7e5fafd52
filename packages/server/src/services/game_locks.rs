use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard, OwnedMutexGuard};

/// Per-game critical sections. Operations on different games never contend.
///
/// An entry lives only while someone holds or waits for it, so ids that
/// never name a stored game leave nothing behind.
#[derive(Default)]
pub struct GameLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
    registry: Mutex<()>,
}

/// Held for the duration of one game operation.
pub struct GameLockGuard<'a> {
    locks: &'a GameLocks,
    game_id: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for GameLockGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Only the map's own handle left: nobody holds or waits.
        self.locks
            .locks
            .remove_if(&self.game_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

impl GameLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, game_id: &str) -> GameLockGuard<'_> {
        let lock = self
            .locks
            .entry(game_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        // Built before waiting so a cancelled wait still cleans up.
        let mut held = GameLockGuard {
            locks: self,
            game_id: game_id.to_string(),
            guard: None,
        };
        held.guard = Some(lock.lock_owned().await);
        held
    }

    /// Serializes operations that span games, such as creating one.
    pub async fn acquire_registry(&self) -> MutexGuard<'_, ()> {
        self.registry.lock().await
    }

    /// Number of games with a held or awaited lock.
    pub fn active_count(&self) -> usize {
        self.locks.len()
    }
}
