use game_core::{Event, EventBus, GameEvent, LobbyEvent, Subscription};
use tracing::{debug, info, warn};

/// Logs lobby and game milestones as they cross the bus.
pub fn attach(bus: &EventBus) -> Subscription {
    bus.subscribe(
        |event| event.is_lobby_event() || event.is_game_event(),
        |event| {
            log_event(event);
            Ok(())
        },
    )
}

fn log_event(event: &Event) {
    match event {
        Event::Lobby(LobbyEvent::LobbyDestroyed { code, player_wins }) => {
            match serde_json::to_string(player_wins) {
                Ok(stats) => info!(lobby = %code, %stats, "lobby stats"),
                Err(e) => warn!(lobby = %code, "could not serialize lobby stats: {}", e),
            }
        }
        Event::Lobby(LobbyEvent::LobbyStateChanged { code, state }) => {
            debug!(lobby = %code, ?state, "lobby state changed");
        }
        Event::Game(GameEvent::GameStateChanged {
            lobby_code, state, ..
        }) => {
            debug!(lobby = %lobby_code, ?state, "game state changed");
        }
        Event::Game(GameEvent::GameStarted {
            lobby_code,
            started_on,
            ..
        }) => {
            info!(lobby = %lobby_code, %started_on, "game starting");
        }
        _ => {}
    }
}
