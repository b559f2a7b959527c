use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{GameConfig, GameSummary, History, UserId, UserSnapshot, UserState};

/// A guess as submitted by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GuessSubmission {
    /// Client-side id used to correlate the scored result.
    pub id: String,
    pub word: String,
}

/// Everything a (re)connecting client needs to rebuild its view.
///
/// Fields fill in cumulatively with `state`: later states carry every
/// field of the earlier ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UserRestore {
    pub user_id: UserId,
    pub state: UserState,
    pub users: Vec<UserSnapshot>,
    pub config: Option<GameConfig>,
    pub picking_word_on: Option<DateTime<Utc>>,
    pub pick_word_deadline: Option<DateTime<Utc>>,
    pub word: Option<String>,
    pub history: Option<Vec<History>>,
    pub started_on: Option<DateTime<Utc>>,
    pub game_summary: Option<GameSummary>,
}
