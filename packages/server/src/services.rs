pub mod game_locks;
pub mod game_service;
pub mod player_directory;
pub mod publisher;
pub mod role_assignment;
pub mod store;
pub mod vote_service;
pub mod win_condition;
