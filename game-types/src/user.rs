use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum UserType {
    Player,
    Observer,
}

/// Where a user is within their lobby, as shown to clients.
///
/// Variants are declared in the order a match walks through them, so
/// `state >= UserState::Playing` reads as "has reached active play".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum UserState {
    InRoom,
    PickingWord,
    PickedWord,
    Playing,
    GameOver,
}

/// Public view of a lobby member, safe to send to any client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UserSnapshot {
    pub user_id: UserId,
    pub username: String,
    pub user_type: UserType,
    pub state: UserState,
    pub connected: bool,
    pub did_leave: bool,
}

/// Cumulative result of one participant, reported when a lobby is torn down.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PlayerWins {
    pub user_id: UserId,
    pub username: String,
    pub total_wins: u32,
}
