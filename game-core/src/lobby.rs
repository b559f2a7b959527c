use chrono::{DateTime, Utc};
use game_types::{
    GameError, GameState, GuessSubmission, History, HostConfig, LobbyCode, LobbyState, Minutes,
    PlayerWins, UserId, UserRestore, UserSnapshot, UserState, UserType,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::{
    Event, EventBus, Game, GameSettings, Identity, LobbyEvent, MIN_PLAYERS, Observer, Room,
    Transition, User, WordValidator,
};

/// Settings every lobby in a registry is created with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LobbySettings {
    pub game: GameSettings,
    /// Match length for hosts that do not pick one.
    pub default_game_length: Option<Minutes>,
    pub room_capacity: Option<usize>,
}

/// A room of players plus at most one match, keyed by a short code.
pub struct Lobby {
    code: LobbyCode,
    state: LobbyState,
    room: Room,
    observers: Vec<Observer>,
    game: Option<Game>,
    settings: LobbySettings,
    words: Arc<WordValidator>,
    bus: EventBus,
    last_activity_on: DateTime<Utc>,
    departed: Vec<PlayerWins>,
    disposed: bool,
}

impl Lobby {
    pub fn new(
        code: impl Into<LobbyCode>,
        settings: LobbySettings,
        words: Arc<WordValidator>,
        bus: EventBus,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            code: code.into(),
            state: LobbyState::InRoom,
            room: Room::new(settings.room_capacity),
            observers: Vec::new(),
            game: None,
            settings,
            words,
            bus,
            last_activity_on: now,
            departed: Vec::new(),
            disposed: false,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn state(&self) -> LobbyState {
        self.state
    }

    pub fn room(&self) -> &Room {
        &self.room
    }

    pub fn observers(&self) -> &[Observer] {
        &self.observers
    }

    pub fn game(&self) -> Option<&Game> {
        self.game.as_ref()
    }

    pub fn last_activity_on(&self) -> DateTime<Utc> {
        self.last_activity_on
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn add(&mut self, user: User) -> Result<(), GameError> {
        let user_id = user.user_id();
        if self.member(user_id).is_some() {
            return Err(GameError::AlreadyInLobby { user_id });
        }

        match user {
            User::Player(player) => {
                debug!("player {} joining lobby {}", player.username(), self.code);
                self.room.add(player)?;
            }
            User::Observer(mut observer) => {
                debug!("observer {} joining lobby {}", observer.identity.username, self.code);
                // a returning observer replaces the record left behind
                self.observers.retain(|o| o.user_id() != user_id);
                observer.identity.update_state(self.observer_state());
                self.observers.push(observer);
            }
        }

        self.last_activity_on = Utc::now();
        Ok(())
    }

    pub fn start_game(&mut self, host_config: HostConfig) -> Result<(), GameError> {
        if self.state != LobbyState::InRoom {
            return Err(GameError::invalid_state(format!(
                "lobby {} cannot start a game while {:?}",
                self.code, self.state
            )));
        }

        // players who never went back to the room still belong to the lobby
        let mut roster = self.room.players().to_vec();
        if let Some(previous) = &self.game {
            roster.extend(
                previous
                    .players()
                    .iter()
                    .filter(|p| !p.is_zombie() && !self.room.includes(p.user_id()))
                    .cloned()
                    .map(|mut p| {
                        p.reset();
                        p
                    }),
            );
        }

        if roster.len() < MIN_PLAYERS {
            return Err(GameError::invalid_state(format!(
                "at least {} players are needed to start, lobby {} has {}",
                MIN_PLAYERS,
                self.code,
                roster.len()
            )));
        }

        let host_config = HostConfig {
            game_length: host_config.game_length.or(self.settings.default_game_length),
        };
        let now = Utc::now();

        // the room keeps its players until the new match exists
        let mut game = Game::new(
            self.code.clone(),
            host_config,
            roster,
            self.settings.game.clone(),
            self.words.clone(),
            self.bus.clone(),
            now,
        )?;
        if let Some(mut previous) = self.game.take() {
            previous.dispose();
        }
        self.room.close();
        game.update_player_states(UserState::PickingWord);
        info!(
            "lobby {} started game {} with {} players",
            self.code,
            game.id(),
            game.players().len()
        );

        self.game = Some(game);
        self.propagate_observer_state(UserState::PickedWord);
        self.update_state(LobbyState::InGame, now)
    }

    pub fn set_word(&mut self, user_id: UserId, word: &str) -> Result<(), GameError> {
        let transition = self.current_game()?.set_word(user_id, word)?;
        let now = Utc::now();
        self.last_activity_on = now;
        self.on_game_state_change(transition, now)
    }

    pub fn submit_guess(
        &mut self,
        user_id: UserId,
        submission: &GuessSubmission,
    ) -> Result<History, GameError> {
        let (history, transition) = self.current_game()?.submit_guess(user_id, submission)?;
        let now = Utc::now();
        self.last_activity_on = now;
        self.on_game_state_change(transition, now)?;
        Ok(history)
    }

    /// Moves a player from a finished match back into the room.
    pub fn go_back_to_room(&mut self, user_id: UserId) -> Result<(), GameError> {
        if self.room.includes(user_id) {
            warn!("user {} is already in the room of lobby {}", user_id, self.code);
            return Ok(());
        }

        let game = self
            .game
            .as_mut()
            .filter(|g| g.has_active_player(user_id))
            .ok_or(GameError::UserNotFound { user_id })?;

        if game.state() != GameState::GameOver {
            return Err(GameError::invalid_state(format!(
                "cannot go back to the room while the game is {:?}",
                game.state()
            )));
        }
        if self.room.is_full() {
            return Err(GameError::RoomFull);
        }

        let now = Utc::now();
        let (mut player, transition) = game.leave(user_id, now)?;
        player.reset();
        self.room.add(player)?;

        self.on_game_state_change(transition, now)
    }

    /// The state a client needs to resume after (re)connecting.
    pub fn user_restore(&self, user_id: UserId) -> Result<UserRestore, GameError> {
        let (user_type, identity) = self
            .restorable(user_id)
            .ok_or(GameError::UserNotFound { user_id })?;

        let mut state = identity.state();
        if !self.includes(user_id) {
            // a zombie's state froze when it left; follow the match instead
            state = state.max(self.observer_state());
        }
        if user_type == UserType::Observer && state == UserState::GameOver && self.game.is_none() {
            state = UserState::InRoom;
        }

        let mut restore = UserRestore {
            user_id,
            state,
            users: self.users_for(user_id)?,
            config: None,
            picking_word_on: None,
            pick_word_deadline: None,
            word: None,
            history: None,
            started_on: None,
            game_summary: None,
        };

        let game = match (&self.game, state) {
            (None, UserState::InRoom) => return Ok(restore),
            (None, _) => {
                return Err(GameError::invalid_state(format!(
                    "user {} is {:?} but lobby {} has no game",
                    user_id, state, self.code
                )));
            }
            (Some(game), _) => game,
        };

        restore.config = Some(game.config());
        restore.picking_word_on = Some(game.picking_word_on());
        restore.pick_word_deadline = Some(game.pick_word_deadline());

        if state >= UserState::PickedWord && user_type == UserType::Player {
            restore.word = game
                .find(user_id)
                .and_then(|p| p.word().ok())
                .map(|w| w.to_string());
        }

        if state >= UserState::Playing {
            restore.history = Some(game.guesses());
            restore.started_on = game.started_on();
        }

        if state == UserState::GameOver {
            restore.game_summary = Some(game.summary()?.clone());
        }

        Ok(restore)
    }

    /// Users visible to `user_id`: the room while they wait in it, otherwise
    /// the match roster. Observers are always included.
    pub fn users_for(&self, user_id: UserId) -> Result<Vec<UserSnapshot>, GameError> {
        let (_, identity) = self
            .restorable(user_id)
            .ok_or(GameError::UserNotFound { user_id })?;

        let mut users: Vec<UserSnapshot> = match (&self.game, identity.state()) {
            (Some(game), state) if state != UserState::InRoom => {
                game.players().iter().map(|p| p.snapshot()).collect()
            }
            _ => self.room.players().iter().map(|p| p.snapshot()).collect(),
        };

        users.extend(
            self.observers
                .iter()
                .filter(|o| !o.identity.did_leave())
                .map(Observer::snapshot),
        );

        Ok(users)
    }

    pub fn find_user(&self, user_id: UserId) -> Option<UserSnapshot> {
        self.member(user_id).map(|(user_type, identity)| UserSnapshot {
            user_id,
            username: identity.username.clone(),
            user_type,
            state: identity.state(),
            connected: identity.connected,
            did_leave: identity.did_leave(),
        })
    }

    /// Whether the user is a current member of this lobby.
    pub fn includes(&self, user_id: UserId) -> bool {
        self.member(user_id).is_some()
    }

    pub fn on_user_connected(&mut self, user_id: UserId, is_reconnect: bool) {
        if let Some(identity) = self.identity_mut(user_id) {
            identity.connected = true;
            debug!("user {} connected (reconnect: {})", user_id, is_reconnect);
        }
    }

    /// Returns `true` once everyone has left the lobby on purpose.
    pub fn on_user_disconnected(
        &mut self,
        user_id: UserId,
        was_intended: bool,
    ) -> Result<bool, GameError> {
        let Some(identity) = self.identity_mut(user_id) else {
            return Ok(false);
        };
        identity.connected = false;

        if !was_intended {
            return Ok(false);
        }

        self.leave(user_id)?;

        if self.is_empty() {
            info!("lobby {} is empty", self.code);
            self.bus.publish(Event::Lobby(LobbyEvent::LobbyEmpty {
                code: self.code.clone(),
            }))?;
            return Ok(true);
        }

        Ok(false)
    }

    /// Every member, player or observer, has left on purpose.
    pub fn is_empty(&self) -> bool {
        self.room.is_empty()
            && self
                .game
                .as_ref()
                .is_none_or(|g| g.players().iter().all(|p| p.is_zombie()))
            && self.observers.iter().all(|o| o.identity.did_leave())
    }

    pub fn run_timers(&mut self, now: DateTime<Utc>) -> Result<(), GameError> {
        let Some(game) = self.game.as_mut() else {
            return Ok(());
        };

        let transition = game.run_timers(now)?;
        self.on_game_state_change(transition, now)
    }

    /// Cumulative wins of everyone who played here, including those who left.
    pub fn player_wins(&self) -> Vec<PlayerWins> {
        let current = self
            .room
            .players()
            .iter()
            .chain(
                self.game
                    .iter()
                    .flat_map(|g| g.players().iter().filter(|p| !p.is_zombie())),
            )
            .map(|p| p.wins());

        self.departed.iter().cloned().chain(current).collect()
    }

    pub fn dispose(&mut self) {
        if let Some(mut game) = self.game.take() {
            game.dispose();
        }

        if !self.disposed {
            self.disposed = true;
            debug!("lobby {} disposed", self.code);
        }
    }

    fn leave(&mut self, user_id: UserId) -> Result<(), GameError> {
        if let Some(player) = self.room.leave(user_id) {
            info!("player {} left lobby {}", player.username(), self.code);
            self.departed.push(player.wins());
            return Ok(());
        }

        if self.game.as_ref().is_some_and(|g| g.has_active_player(user_id)) {
            let game = self.current_game()?;
            let now = Utc::now();
            let (player, transition) = game.leave(user_id, now)?;
            info!("player {} left game in lobby {}", player.username(), self.code);
            self.departed.push(player.wins());
            return self.on_game_state_change(transition, now);
        }

        if let Some(observer) = self
            .observers
            .iter_mut()
            .find(|o| o.user_id() == user_id && !o.identity.did_leave())
        {
            observer.identity.leave_lobby();
            return Ok(());
        }

        Err(GameError::UserNotFound { user_id })
    }

    fn on_game_state_change(&mut self, transition: Transition, now: DateTime<Utc>) -> Result<(), GameError> {
        let Some(state) = transition else {
            return Ok(());
        };

        match state {
            GameState::PickingWords => Ok(()),
            GameState::Playing => {
                self.propagate_state(UserState::Playing);
                Ok(())
            }
            GameState::GameOver => {
                self.propagate_state(UserState::GameOver);
                self.room.open();
                self.update_state(LobbyState::InRoom, now)
            }
            GameState::Destroyed => {
                if let Some(mut game) = self.game.take() {
                    game.dispose();
                }
                self.propagate_observer_state(UserState::InRoom);
                self.room.open();
                self.update_state(LobbyState::InRoom, now)
            }
        }
    }

    fn update_state(&mut self, state: LobbyState, now: DateTime<Utc>) -> Result<(), GameError> {
        self.last_activity_on = now;
        if self.state == state {
            return Ok(());
        }

        self.state = state;
        self.bus.publish(Event::Lobby(LobbyEvent::LobbyStateChanged {
            code: self.code.clone(),
            state,
        }))
    }

    fn propagate_state(&mut self, state: UserState) {
        if let Some(game) = self.game.as_mut() {
            game.update_player_states(state);
        }
        self.propagate_observer_state(state);
    }

    fn propagate_observer_state(&mut self, state: UserState) {
        self.observers
            .iter_mut()
            .filter(|o| !o.identity.did_leave())
            .for_each(|o| o.identity.update_state(state));
    }

    /// The display state an observer joining right now should have.
    fn observer_state(&self) -> UserState {
        match self.game.as_ref().map(Game::state) {
            Some(GameState::PickingWords) => UserState::PickedWord,
            Some(GameState::Playing) => UserState::Playing,
            Some(GameState::GameOver) => UserState::GameOver,
            Some(GameState::Destroyed) | None => UserState::InRoom,
        }
    }

    fn current_game(&mut self) -> Result<&mut Game, GameError> {
        let code = &self.code;
        self.game
            .as_mut()
            .ok_or_else(|| GameError::invalid_state(format!("lobby {} has no game", code)))
    }

    fn member(&self, user_id: UserId) -> Option<(UserType, &Identity)> {
        if let Some(player) = self.room.find(user_id) {
            return Some((UserType::Player, &player.identity));
        }

        if let Some(player) = self
            .game
            .as_ref()
            .and_then(|g| g.find(user_id))
            .filter(|p| !p.is_zombie())
        {
            return Some((UserType::Player, &player.identity));
        }

        self.observers
            .iter()
            .find(|o| o.user_id() == user_id && !o.identity.did_leave())
            .map(|o| (UserType::Observer, &o.identity))
    }

    /// A member, or a player who left the running match and lives on as a zombie.
    fn restorable(&self, user_id: UserId) -> Option<(UserType, &Identity)> {
        self.member(user_id).or_else(|| {
            self.game
                .as_ref()
                .and_then(|g| g.find(user_id))
                .map(|p| (UserType::Player, &p.identity))
        })
    }

    fn identity_mut(&mut self, user_id: UserId) -> Option<&mut Identity> {
        if self.room.includes(user_id) {
            return self.room.find_mut(user_id).map(|p| &mut p.identity);
        }

        if self.game.as_ref().is_some_and(|g| g.has_active_player(user_id)) {
            return self
                .game
                .as_mut()
                .and_then(|g| g.find_mut(user_id))
                .map(|p| &mut p.identity);
        }

        self.observers
            .iter_mut()
            .find(|o| o.user_id() == user_id && !o.identity.did_leave())
            .map(|o| &mut o.identity)
    }
}
