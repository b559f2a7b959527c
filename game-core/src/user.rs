use chrono::{DateTime, Utc};
use game_types::{
    GameError, Guess, GuessSubmission, PlayerWins, UserId, UserSnapshot, UserState, UserType,
};

use crate::{ScoringEngine, Word};

/// Identity and connection state shared by players and observers.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub user_id: UserId,
    pub username: String,
    pub connected: bool,
    state: UserState,
    did_leave: bool,
}

impl Identity {
    pub fn new(user_id: UserId, username: impl Into<String>) -> Self {
        Self {
            user_id,
            username: username.into(),
            connected: true,
            state: UserState::InRoom,
            did_leave: false,
        }
    }

    pub fn state(&self) -> UserState {
        self.state
    }

    pub fn update_state(&mut self, state: UserState) {
        self.state = state;
    }

    pub fn did_leave(&self) -> bool {
        self.did_leave
    }

    pub fn leave_lobby(&mut self) {
        self.did_leave = true;
        self.connected = false;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub identity: Identity,
    word: Option<Word>,
    guesses: Vec<Guess>,
    opponent: Option<UserId>,
    won_at: Option<DateTime<Utc>>,
    total_wins: u32,
    zombie: bool,
}

impl Player {
    pub fn new(user_id: UserId, username: impl Into<String>) -> Self {
        Self {
            identity: Identity::new(user_id, username),
            word: None,
            guesses: Vec::new(),
            opponent: None,
            won_at: None,
            total_wins: 0,
            zombie: false,
        }
    }

    pub fn user_id(&self) -> UserId {
        self.identity.user_id
    }

    pub fn username(&self) -> &str {
        &self.identity.username
    }

    pub fn has_word(&self) -> bool {
        self.word.is_some()
    }

    pub fn word(&self) -> Result<&Word, GameError> {
        self.word.as_ref().ok_or_else(|| {
            GameError::invalid_state(format!("player {} does not have a word set", self.user_id()))
        })
    }

    /// Sets the secret word for this match. A word can only be set once
    /// until the player is `reset`.
    pub fn set_word(&mut self, word: Word) -> Result<(), GameError> {
        if self.word.is_some() {
            return Err(GameError::invalid_state(format!(
                "player {} already has a word",
                self.user_id()
            )));
        }

        self.word = Some(word);
        Ok(())
    }

    pub fn opponent(&self) -> Result<UserId, GameError> {
        self.opponent.ok_or_else(|| {
            GameError::invalid_state(format!("player {} does not have an opponent", self.user_id()))
        })
    }

    pub fn set_opponent(&mut self, opponent: UserId) -> Result<(), GameError> {
        if opponent == self.user_id() {
            return Err(GameError::invalid_state("a player cannot be their own opponent"));
        }
        if self.opponent.is_some() {
            return Err(GameError::invalid_state(format!(
                "player {} already has an opponent",
                self.user_id()
            )));
        }

        self.opponent = Some(opponent);
        Ok(())
    }

    pub fn guesses(&self) -> &[Guess] {
        &self.guesses
    }

    /// Scores a guess against the opponent's word and appends it to the history.
    pub fn add_guess(
        &mut self,
        submission: &GuessSubmission,
        target: &Word,
        timestamp: DateTime<Utc>,
    ) -> Result<Guess, GameError> {
        if self.won() {
            return Err(GameError::invalid_state(format!(
                "player {} already guessed their opponent's word",
                self.user_id()
            )));
        }

        let word = Word::guess(&submission.word)?;
        let (common, won) = ScoringEngine::score_guess(&word, target);

        let guess = Guess {
            word: word.to_string(),
            timestamp,
            common,
            won,
        };

        if won {
            self.won_at = Some(timestamp);
            self.total_wins += 1;
        }

        self.guesses.push(guess.clone());
        Ok(guess)
    }

    pub fn won(&self) -> bool {
        self.won_at.is_some()
    }

    pub fn won_at(&self) -> Option<DateTime<Utc>> {
        self.won_at
    }

    pub fn best_guess(&self) -> u8 {
        self.guesses.iter().map(|g| g.common).max().unwrap_or(0)
    }

    pub fn total_wins(&self) -> u32 {
        self.total_wins
    }

    pub fn is_zombie(&self) -> bool {
        self.zombie
    }

    /// Frozen copy left in a match after the player departs, so whoever was
    /// guessing against them still has a word to guess.
    pub fn to_zombie(&self) -> Player {
        let mut zombie = self.clone();
        zombie.zombie = true;
        zombie.identity.connected = false;
        zombie
    }

    /// Clears everything tied to a single match. Cumulative wins are kept.
    pub fn reset(&mut self) {
        self.word = None;
        self.guesses.clear();
        self.opponent = None;
        self.won_at = None;
        self.zombie = false;
        self.identity.update_state(UserState::InRoom);
    }

    pub fn wins(&self) -> PlayerWins {
        PlayerWins {
            user_id: self.user_id(),
            username: self.identity.username.clone(),
            total_wins: self.total_wins,
        }
    }

    pub fn snapshot(&self) -> UserSnapshot {
        snapshot(&self.identity, UserType::Player)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Observer {
    pub identity: Identity,
}

impl Observer {
    pub fn new(user_id: UserId, username: impl Into<String>) -> Self {
        Self {
            identity: Identity::new(user_id, username),
        }
    }

    pub fn user_id(&self) -> UserId {
        self.identity.user_id
    }

    pub fn snapshot(&self) -> UserSnapshot {
        snapshot(&self.identity, UserType::Observer)
    }
}

/// A lobby member, tagged by role.
#[derive(Debug, Clone, PartialEq)]
pub enum User {
    Player(Player),
    Observer(Observer),
}

impl User {
    pub fn new(user_id: UserId, username: impl Into<String>, user_type: UserType) -> Self {
        match user_type {
            UserType::Player => User::Player(Player::new(user_id, username)),
            UserType::Observer => User::Observer(Observer::new(user_id, username)),
        }
    }

    pub fn identity(&self) -> &Identity {
        match self {
            User::Player(player) => &player.identity,
            User::Observer(observer) => &observer.identity,
        }
    }

    pub fn user_id(&self) -> UserId {
        self.identity().user_id
    }

    pub fn user_type(&self) -> UserType {
        match self {
            User::Player(_) => UserType::Player,
            User::Observer(_) => UserType::Observer,
        }
    }
}

fn snapshot(identity: &Identity, user_type: UserType) -> UserSnapshot {
    UserSnapshot {
        user_id: identity.user_id,
        username: identity.username.clone(),
        user_type,
        state: identity.state(),
        connected: identity.connected,
        did_leave: identity.did_leave(),
    }
}
