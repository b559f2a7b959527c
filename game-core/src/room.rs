use game_types::{GameError, UserId};

use crate::Player;

/// Waiting area where players gather between matches.
#[derive(Debug, Clone)]
pub struct Room {
    players: Vec<Player>,
    capacity: Option<usize>,
    open: bool,
}

impl Room {
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            players: Vec::new(),
            capacity,
            open: true,
        }
    }

    pub fn add(&mut self, player: Player) -> Result<(), GameError> {
        if !self.open {
            return Err(GameError::RoomClosed);
        }
        if self.is_full() {
            return Err(GameError::RoomFull);
        }
        if self.includes(player.user_id()) {
            return Err(GameError::AlreadyInLobby {
                user_id: player.user_id(),
            });
        }

        self.players.push(player);
        Ok(())
    }

    /// Closes the room and hands its players over to a match.
    pub fn close(&mut self) -> Vec<Player> {
        self.open = false;
        std::mem::take(&mut self.players)
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn leave(&mut self, user_id: UserId) -> Option<Player> {
        let index = self.players.iter().position(|p| p.user_id() == user_id)?;
        Some(self.players.remove(index))
    }

    pub fn find(&self, user_id: UserId) -> Option<&Player> {
        self.players.iter().find(|p| p.user_id() == user_id)
    }

    pub fn find_mut(&mut self, user_id: UserId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.user_id() == user_id)
    }

    pub fn includes(&self, user_id: UserId) -> bool {
        self.find(user_id).is_some()
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn is_full(&self) -> bool {
        self.capacity
            .is_some_and(|capacity| self.players.len() >= capacity)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

impl Default for Room {
    fn default() -> Self {
        Self::new(None)
    }
}
