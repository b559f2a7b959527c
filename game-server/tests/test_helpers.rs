#![allow(dead_code)]

use game_core::{GameContext, User};
use game_server::{build_context, config::Config};
use game_types::{HostConfig, LobbyCode, UserId, UserType};
use uuid::Uuid;

/// Config with timers short enough to run inside a test
pub fn create_test_config() -> Config {
    Config {
        pick_word_seconds: 0,
        pre_game_seconds: 0,
        timer_resolution_millis: 5,
        tick_interval_seconds: 3600,
        ..Config::default()
    }
}

pub fn create_test_context(config: &Config) -> GameContext {
    build_context(config).unwrap()
}

/// Creates a lobby, seats the named players and starts a game
pub fn start_test_game(ctx: &GameContext, names: &[&str]) -> (LobbyCode, Vec<UserId>) {
    let mut registry = ctx.registry().unwrap();
    let lobby = registry.create().unwrap();

    let ids: Vec<UserId> = names
        .iter()
        .map(|name| {
            let id = Uuid::new_v4();
            lobby.add(User::new(id, *name, UserType::Player)).unwrap();
            id
        })
        .collect();

    lobby.start_game(HostConfig::default()).unwrap();
    (lobby.code().to_string(), ids)
}
