use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{Minutes, Seconds, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum GameState {
    PickingWords,
    Playing,
    GameOver,
    Destroyed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum GameOverReason {
    AllWon,
    TimeUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum LobbyState {
    InRoom,
    InGame,
}

/// Options chosen by the host when starting a match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct HostConfig {
    /// Match length; `None` leaves the match untimed.
    pub game_length: Option<Minutes>,
}

/// One entry of a player's guess history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Guess {
    pub word: String,
    pub timestamp: DateTime<Utc>,
    /// Letters shared with the opponent's word; 5 only for an exact match.
    pub common: u8,
    pub won: bool,
}

/// A guess annotated with who made it and whose word it targeted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct History {
    #[serde(flatten)]
    pub guess: Guess,
    pub from: UserId,
    pub to: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OpponentPair {
    pub id: UserId,
    pub opponent_id: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GameConfig {
    pub pick_word_length: Seconds,
    pub pre_game_length: Seconds,
    pub game_length: Option<Minutes>,
    pub opponents: Vec<OpponentPair>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PlayerSummary {
    pub user_id: UserId,
    pub username: String,
    pub place: u32,
    pub word: String,
    pub num_guesses: u32,
    pub won_at: Option<DateTime<Utc>>,
    pub best_guess: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GameSummary {
    /// Seconds between the start of play and the end of the match.
    pub game_length: i64,
    pub game_over_reason: GameOverReason,
    pub player_summaries: Vec<PlayerSummary>,
}
