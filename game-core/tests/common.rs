#![allow(dead_code)]

use chrono::Utc;
use game_core::{
    Event, EventBus, GameContext, GameSettings, Lobby, LobbyCleanup, LobbySettings, Subscription,
    User, WordValidator,
};
use game_types::{GuessSubmission, UserId, UserType};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use uuid::Uuid;

/// Secret words handed to test players, in join order.
pub const TEST_WORDS: [&str; 4] = ["crane", "blimp", "dwarf", "shout"];

/// Creates a test WordValidator with a known set of words
pub fn create_test_validator() -> Arc<WordValidator> {
    Arc::new(WordValidator::from_word_list(
        "crane\nblimp\ndwarf\nshout\nfight\njumpy",
    ))
}

pub fn create_test_settings(game_length: Option<u32>) -> LobbySettings {
    LobbySettings {
        game: GameSettings {
            pick_word_length: 60,
            pre_game_length: 3,
        },
        default_game_length: game_length,
        room_capacity: None,
    }
}

/// Creates a lobby on its own bus, outside any registry
pub fn create_test_lobby(bus: &EventBus, game_length: Option<u32>) -> Lobby {
    Lobby::new(
        "0001",
        create_test_settings(game_length),
        create_test_validator(),
        bus.clone(),
        Utc::now(),
    )
}

pub fn create_test_context() -> GameContext {
    GameContext::new(
        create_test_settings(None),
        create_test_validator(),
        LobbyCleanup::default(),
    )
}

/// Adds one player per name and returns their ids in the same order
pub fn add_players(lobby: &mut Lobby, names: &[&str]) -> Vec<UserId> {
    names
        .iter()
        .map(|name| {
            let id = Uuid::new_v4();
            lobby.add(User::new(id, *name, UserType::Player)).unwrap();
            id
        })
        .collect()
}

pub fn add_observer(lobby: &mut Lobby, name: &str) -> UserId {
    let id = Uuid::new_v4();
    lobby.add(User::new(id, name, UserType::Observer)).unwrap();
    id
}

/// Starts a game and has every player pick a word from `TEST_WORDS`
pub fn start_playing(lobby: &mut Lobby, ids: &[UserId]) {
    lobby.start_game(Default::default()).unwrap();
    for (id, word) in ids.iter().zip(TEST_WORDS) {
        lobby.set_word(*id, word).unwrap();
    }
}

/// The secret word the given player has to find
pub fn opponent_word(lobby: &Lobby, user_id: UserId) -> String {
    let game = lobby.game().unwrap();
    let opponent = game.player(user_id).unwrap().opponent().unwrap();
    game.player(opponent).unwrap().word().unwrap().to_string()
}

pub fn submission(word: &str) -> GuessSubmission {
    GuessSubmission {
        id: Uuid::new_v4().to_string(),
        word: word.to_string(),
    }
}

/// Every remaining player guesses their opponent's word
pub fn win_game(lobby: &mut Lobby, ids: &[UserId]) {
    for id in ids {
        let word = opponent_word(lobby, *id);
        lobby.submit_guess(*id, &submission(&word)).unwrap();
    }
}

/// Event collector for testing event emissions
pub struct EventCollector {
    events: Rc<RefCell<Vec<Event>>>,
    _subscription: Subscription,
}

impl EventCollector {
    pub fn attach(bus: &EventBus) -> Self {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        let subscription = bus.subscribe_all(move |event| {
            sink.borrow_mut().push(event.clone());
            Ok(())
        });

        Self {
            events,
            _subscription: subscription,
        }
    }

    pub fn get_events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    pub fn last_event(&self) -> Option<Event> {
        self.events.borrow().last().cloned()
    }

    pub fn event_count(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn has_event_type(&self, check_fn: impl Fn(&Event) -> bool) -> bool {
        self.events.borrow().iter().any(check_fn)
    }

    pub fn count_matching(&self, check_fn: impl Fn(&Event) -> bool) -> usize {
        self.events.borrow().iter().filter(|e| check_fn(e)).count()
    }
}
