use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::UserId;

/// Coarse classification used by the transport to pick a client response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidState,
    NotFound,
    ResourceExhausted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, thiserror::Error)]
#[ts(export)]
pub enum GameError {
    #[error("invalid game state: {message}")]
    InvalidState { message: String },

    #[error("invalid word '{word}': {reason}")]
    InvalidWord { word: String, reason: String },

    #[error("room is no longer open")]
    RoomClosed,

    #[error("room is already full")]
    RoomFull,

    #[error("user {user_id} is already in the lobby")]
    AlreadyInLobby { user_id: UserId },

    #[error("user {user_id} not found")]
    UserNotFound { user_id: UserId },

    #[error("lobby {code} not found")]
    LobbyNotFound { code: String },

    #[error("no words available for assignment")]
    NoWordsAvailable,

    #[error("could not create unique lobby code after {attempts} attempts")]
    CodeSpaceExhausted { attempts: u32 },
}

impl GameError {
    pub fn invalid_state(message: impl Into<String>) -> Self {
        GameError::InvalidState {
            message: message.into(),
        }
    }

    pub fn invalid_word(word: impl Into<String>, reason: impl Into<String>) -> Self {
        GameError::InvalidWord {
            word: word.into(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            GameError::InvalidState { .. }
            | GameError::InvalidWord { .. }
            | GameError::RoomClosed
            | GameError::RoomFull
            | GameError::AlreadyInLobby { .. } => ErrorKind::InvalidState,
            GameError::UserNotFound { .. } | GameError::LobbyNotFound { .. } => ErrorKind::NotFound,
            GameError::NoWordsAvailable | GameError::CodeSpaceExhausted { .. } => {
                ErrorKind::ResourceExhausted
            }
        }
    }
}
