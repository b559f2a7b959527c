use chrono::{DateTime, Duration, Utc};
use game_types::{
    GameConfig, GameError, GameId, GameOverReason, GameState, GameSummary, GuessSubmission,
    History, HostConfig, LobbyCode, OpponentPair, PlayerSummary, Seconds, UserId, UserState,
};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    Event, EventBus, GameEvent, Player, PlayerEvent, ScoringEngine, Timer, Word, WordValidator,
    pair_players,
};

/// Process-wide match timings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSettings {
    pub pick_word_length: Seconds,
    pub pre_game_length: Seconds,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            pick_word_length: 60,
            pre_game_length: 3,
        }
    }
}

/// The state a game moved into during an operation, if it moved at all.
pub type Transition = Option<GameState>;

/// A single match: a ring of players, each guessing their opponent's word.
pub struct Game {
    id: GameId,
    lobby_code: LobbyCode,
    players: Vec<Player>,
    state: GameState,
    settings: GameSettings,
    host_config: HostConfig,
    picking_word_on: DateTime<Utc>,
    started_on: Option<DateTime<Utc>>,
    ended_on: Option<DateTime<Utc>>,
    reason: Option<GameOverReason>,
    summary: Option<GameSummary>,
    pick_word_timer: Timer,
    game_over_timer: Timer,
    words: Arc<WordValidator>,
    bus: EventBus,
    disposed: bool,
}

impl Game {
    pub fn new(
        lobby_code: impl Into<LobbyCode>,
        host_config: HostConfig,
        mut players: Vec<Player>,
        settings: GameSettings,
        words: Arc<WordValidator>,
        bus: EventBus,
        now: DateTime<Utc>,
    ) -> Result<Self, GameError> {
        pair_players(&mut players)?;

        let mut pick_word_timer = Timer::new();
        pick_word_timer.arm(now + Duration::seconds(settings.pick_word_length.into()));

        let game = Self {
            id: Uuid::new_v4(),
            lobby_code: lobby_code.into(),
            players,
            state: GameState::PickingWords,
            settings,
            host_config,
            picking_word_on: now,
            started_on: None,
            ended_on: None,
            reason: None,
            summary: None,
            pick_word_timer,
            game_over_timer: Timer::new(),
            words,
            bus,
            disposed: false,
        };

        game.bus.publish(Event::Game(GameEvent::GameCreated {
            lobby_code: game.lobby_code.clone(),
            game_id: game.id,
            config: game.config(),
        }))?;

        Ok(game)
    }

    pub fn id(&self) -> GameId {
        self.id
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn find(&self, user_id: UserId) -> Option<&Player> {
        self.players.iter().find(|p| p.user_id() == user_id)
    }

    pub fn player(&self, user_id: UserId) -> Result<&Player, GameError> {
        self.find(user_id)
            .ok_or(GameError::UserNotFound { user_id })
    }

    pub fn includes(&self, user_id: UserId) -> bool {
        self.find(user_id).is_some()
    }

    /// In the roster and not replaced by a zombie.
    pub fn has_active_player(&self, user_id: UserId) -> bool {
        self.find(user_id).is_some_and(|p| !p.is_zombie())
    }

    pub fn picking_word_on(&self) -> DateTime<Utc> {
        self.picking_word_on
    }

    pub fn pick_word_deadline(&self) -> DateTime<Utc> {
        self.picking_word_on + Duration::seconds(self.settings.pick_word_length.into())
    }

    pub fn started_on(&self) -> Option<DateTime<Utc>> {
        self.started_on
    }

    pub fn ended_on(&self) -> Option<DateTime<Utc>> {
        self.ended_on
    }

    pub fn game_over_reason(&self) -> Option<GameOverReason> {
        self.reason
    }

    pub fn config(&self) -> GameConfig {
        GameConfig {
            pick_word_length: self.settings.pick_word_length,
            pre_game_length: self.settings.pre_game_length,
            game_length: self.host_config.game_length,
            opponents: self
                .players
                .iter()
                .filter_map(|p| {
                    p.opponent().ok().map(|opponent_id| OpponentPair {
                        id: p.user_id(),
                        opponent_id,
                    })
                })
                .collect(),
        }
    }

    /// Every guess of the match, oldest first.
    pub fn guesses(&self) -> Vec<History> {
        let mut history: Vec<History> = self
            .players
            .iter()
            .filter_map(|p| p.opponent().ok().map(|to| (p, to)))
            .flat_map(|(player, to)| {
                player.guesses().iter().map(move |guess| History {
                    guess: guess.clone(),
                    from: player.user_id(),
                    to,
                })
            })
            .collect();

        history.sort_by_key(|h| h.guess.timestamp);
        history
    }

    /// The ranked result, available once the match is over.
    pub fn summary(&self) -> Result<&GameSummary, GameError> {
        self.summary
            .as_ref()
            .ok_or_else(|| GameError::invalid_state("game summary is not available before game over"))
    }

    pub fn set_word(&mut self, user_id: UserId, word: &str) -> Result<Transition, GameError> {
        if self.state != GameState::PickingWords {
            return Err(GameError::invalid_state(format!(
                "cannot set word in {:?} state",
                self.state
            )));
        }

        let word = Word::secret(word)?;
        let now = Utc::now();

        let player = self.active_player_mut(user_id)?;
        player.set_word(word.clone())?;
        player.identity.update_state(UserState::PickedWord);

        self.bus.publish(Event::Player(PlayerEvent::SetWord {
            lobby_code: self.lobby_code.clone(),
            user_id,
            word: word.to_string(),
            assigned: false,
            timestamp: now,
        }))?;

        if self.players.iter().all(Player::has_word) {
            self.pick_word_timer.cancel();
            return self.start_playing(now);
        }

        Ok(None)
    }

    pub fn submit_guess(
        &mut self,
        user_id: UserId,
        submission: &GuessSubmission,
    ) -> Result<(History, Transition), GameError> {
        if self.state != GameState::Playing {
            return Err(GameError::invalid_state(format!(
                "cannot guess in {:?} state",
                self.state
            )));
        }

        let now = Utc::now();
        let to = self.active_player_mut(user_id)?.opponent()?;
        let target = self.player(to)?.word()?.clone();
        let guess = self
            .active_player_mut(user_id)?
            .add_guess(submission, &target, now)?;

        let history = History {
            guess,
            from: user_id,
            to,
        };

        self.bus.publish(Event::Player(PlayerEvent::SubmittedGuess {
            lobby_code: self.lobby_code.clone(),
            submission_id: submission.id.clone(),
            history: history.clone(),
            timestamp: now,
        }))?;

        let transition = if self.all_remaining_won() {
            self.game_over(GameOverReason::AllWon, now)?
        } else {
            None
        };

        Ok((history, transition))
    }

    /// Swaps the player for a frozen zombie copy and hands the player back.
    pub fn leave(&mut self, user_id: UserId, now: DateTime<Utc>) -> Result<(Player, Transition), GameError> {
        let index = self
            .players
            .iter()
            .position(|p| p.user_id() == user_id && !p.is_zombie())
            .ok_or(GameError::UserNotFound { user_id })?;

        let zombie = self.players[index].to_zombie();
        let player = std::mem::replace(&mut self.players[index], zombie);
        debug!("player {} left game {}", player.username(), self.id);

        let transition = if self.players.iter().all(Player::is_zombie) {
            self.update_state(GameState::Destroyed)?;
            Some(GameState::Destroyed)
        } else if self.state == GameState::Playing && self.all_remaining_won() {
            self.game_over(GameOverReason::AllWon, now)?
        } else {
            None
        };

        Ok((player, transition))
    }

    /// Fires whichever owned deadline has passed.
    pub fn run_timers(&mut self, now: DateTime<Utc>) -> Result<Transition, GameError> {
        match self.state {
            GameState::PickingWords => {
                if self.pick_word_timer.fire(now) {
                    return self.on_pick_word_time_up(now);
                }
            }
            GameState::Playing => {
                if self.game_over_timer.fire(now) {
                    return self.game_over(GameOverReason::TimeUp, now);
                }
            }
            GameState::GameOver | GameState::Destroyed => {}
        }

        Ok(None)
    }

    pub fn has_armed_timers(&self) -> bool {
        self.pick_word_timer.is_armed() || self.game_over_timer.is_armed()
    }

    pub fn dispose(&mut self) {
        self.pick_word_timer.cancel();
        self.game_over_timer.cancel();

        if !self.disposed {
            self.disposed = true;
            debug!("game {} disposed", self.id);
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub(crate) fn update_player_states(&mut self, state: UserState) {
        self.players
            .iter_mut()
            .filter(|p| !p.is_zombie())
            .for_each(|p| p.identity.update_state(state));
    }

    pub(crate) fn find_mut(&mut self, user_id: UserId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.user_id() == user_id)
    }

    fn active_player_mut(&mut self, user_id: UserId) -> Result<&mut Player, GameError> {
        let player = self
            .find_mut(user_id)
            .ok_or(GameError::UserNotFound { user_id })?;

        if player.is_zombie() {
            return Err(GameError::invalid_state(format!(
                "player {} has left the game",
                user_id
            )));
        }

        Ok(player)
    }

    fn all_remaining_won(&self) -> bool {
        let mut remaining = self.players.iter().filter(|p| !p.is_zombie()).peekable();
        remaining.peek().is_some() && remaining.all(Player::won)
    }

    fn on_pick_word_time_up(&mut self, now: DateTime<Utc>) -> Result<Transition, GameError> {
        let mut assigned = Vec::new();

        for player in self.players.iter_mut().filter(|p| !p.has_word()) {
            let word = self.words.random_word()?;
            player.set_word(word.clone())?;
            if !player.is_zombie() {
                player.identity.update_state(UserState::PickedWord);
            }

            info!("word assigned to {}: {}", player.username(), word);
            assigned.push((player.user_id(), word));
        }

        for (user_id, word) in assigned {
            self.bus.publish(Event::Player(PlayerEvent::SetWord {
                lobby_code: self.lobby_code.clone(),
                user_id,
                word: word.to_string(),
                assigned: true,
                timestamp: now,
            }))?;
        }

        self.start_playing(now)
    }

    fn start_playing(&mut self, now: DateTime<Utc>) -> Result<Transition, GameError> {
        let started_on = now + Duration::seconds(self.settings.pre_game_length.into());
        self.started_on = Some(started_on);

        if let Some(game_length) = self.host_config.game_length {
            self.game_over_timer
                .arm(started_on + Duration::minutes(game_length.into()));
        }

        for player in &self.players {
            if let Ok(opponent) = player.opponent() {
                info!("game {}: {} against {}", self.id, player.user_id(), opponent);
            }
        }

        self.update_state(GameState::Playing)?;
        self.bus.publish(Event::Game(GameEvent::GameStarted {
            lobby_code: self.lobby_code.clone(),
            game_id: self.id,
            started_on,
        }))?;

        Ok(Some(GameState::Playing))
    }

    fn game_over(&mut self, reason: GameOverReason, now: DateTime<Utc>) -> Result<Transition, GameError> {
        // A second trigger (timer after everyone won, or the reverse) is a no-op.
        if self.state != GameState::Playing {
            debug!(
                "game {} ignoring {:?} game over in {:?} state",
                self.id, reason, self.state
            );
            return Ok(None);
        }

        let started_on = self
            .started_on
            .ok_or_else(|| GameError::invalid_state("game does not have a start time"))?;

        self.game_over_timer.cancel();

        let ended_on = match reason {
            GameOverReason::AllWon => now.max(started_on),
            GameOverReason::TimeUp => {
                let game_length = self
                    .host_config
                    .game_length
                    .ok_or_else(|| GameError::invalid_state("game does not have a length"))?;
                started_on + Duration::minutes(game_length.into())
            }
        };

        self.ended_on = Some(ended_on);
        self.reason = Some(reason);
        self.summary = Some(self.compute_summary()?);

        info!(
            "game {} over ({:?}) after {}s",
            self.id,
            reason,
            (ended_on - started_on).num_seconds()
        );

        self.update_state(GameState::GameOver)?;
        Ok(Some(GameState::GameOver))
    }

    fn compute_summary(&self) -> Result<GameSummary, GameError> {
        let (Some(started_on), Some(ended_on), Some(reason)) =
            (self.started_on, self.ended_on, self.reason)
        else {
            return Err(GameError::invalid_state(
                "game summary requires start and end times",
            ));
        };

        let player_summaries = ScoringEngine::rank(&self.players)
            .into_iter()
            .enumerate()
            .map(|(i, player)| -> Result<PlayerSummary, GameError> {
                Ok(PlayerSummary {
                    user_id: player.user_id(),
                    username: player.username().to_string(),
                    place: (i + 1) as u32,
                    word: player.word()?.to_string(),
                    num_guesses: player.guesses().len() as u32,
                    won_at: player.won_at(),
                    best_guess: player.best_guess(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(GameSummary {
            game_length: (ended_on - started_on).num_seconds(),
            game_over_reason: reason,
            player_summaries,
        })
    }

    fn update_state(&mut self, state: GameState) -> Result<(), GameError> {
        if self.state == state {
            return Ok(());
        }

        self.state = state;
        self.bus.publish(Event::Game(GameEvent::GameStateChanged {
            lobby_code: self.lobby_code.clone(),
            game_id: self.id,
            state,
        }))
    }
}
