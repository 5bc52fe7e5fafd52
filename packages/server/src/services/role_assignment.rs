use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use std::sync::Mutex;

use crate::models::role::Role;

/// Permutes the role pool before it is zipped onto the roster.
pub trait RoleShuffler: Send + Sync {
    fn shuffle(&self, pool: &mut [Role]);
}

/// Uniform Fisher-Yates over the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRngShuffler;

impl RoleShuffler for ThreadRngShuffler {
    fn shuffle(&self, pool: &mut [Role]) {
        pool.shuffle(&mut rand::thread_rng());
    }
}

/// Reproducible shuffles for tests and replays.
pub struct SeededShuffler {
    rng: Mutex<StdRng>,
}

impl SeededShuffler {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RoleShuffler for SeededShuffler {
    fn shuffle(&self, pool: &mut [Role]) {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        pool.shuffle(&mut *rng);
    }
}

/// One Werewolf always, one Seer from three players up, Villagers for the rest.
pub fn build_role_pool(player_count: usize) -> Vec<Role> {
    let mut pool = Vec::with_capacity(player_count);
    if player_count >= 1 {
        pool.push(Role::Werewolf);
    }
    if player_count >= 3 {
        pool.push(Role::Seer);
    }
    while pool.len() < player_count {
        pool.push(Role::Villager);
    }
    pool
}
