use chrono::{DateTime, Duration, Utc};
use game_types::LobbyCode;

use crate::Lobby;

/// Decides which lobbies have been idle long enough to be reclaimed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LobbyCleanup {
    pub idle_threshold: Duration, // 60 minutes without activity
}

impl Default for LobbyCleanup {
    fn default() -> Self {
        Self {
            idle_threshold: Duration::minutes(60),
        }
    }
}

impl LobbyCleanup {
    pub fn new(idle_threshold: Duration) -> Self {
        Self { idle_threshold }
    }

    pub fn is_idle(&self, lobby: &Lobby, now: DateTime<Utc>) -> bool {
        now - lobby.last_activity_on() > self.idle_threshold
    }

    /// Codes of every lobby past the idle threshold.
    pub fn idle_lobbies<'a>(
        &self,
        lobbies: impl IntoIterator<Item = &'a Lobby>,
        now: DateTime<Utc>,
    ) -> Vec<LobbyCode> {
        lobbies
            .into_iter()
            .filter(|lobby| self.is_idle(lobby, now))
            .map(|lobby| lobby.code().to_string())
            .collect()
    }
}
