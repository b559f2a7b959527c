use chrono::{DateTime, Utc};
use game_types::{
    GameConfig, GameError, GameId, GameState, History, LobbyCode, LobbyState, PlayerWins, UserId,
};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    GameCreated {
        lobby_code: LobbyCode,
        game_id: GameId,
        config: GameConfig,
    },
    GameStarted {
        lobby_code: LobbyCode,
        game_id: GameId,
        started_on: DateTime<Utc>,
    },
    GameStateChanged {
        lobby_code: LobbyCode,
        game_id: GameId,
        state: GameState,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    SetWord {
        lobby_code: LobbyCode,
        user_id: UserId,
        word: String,
        /// The word was handed out by the server when the pick-word time ran out.
        assigned: bool,
        timestamp: DateTime<Utc>,
    },
    SubmittedGuess {
        lobby_code: LobbyCode,
        submission_id: String,
        history: History,
        timestamp: DateTime<Utc>,
    },
}

impl PlayerEvent {
    pub fn lobby_code(&self) -> &str {
        match self {
            PlayerEvent::SetWord { lobby_code, .. } => lobby_code,
            PlayerEvent::SubmittedGuess { lobby_code, .. } => lobby_code,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            PlayerEvent::SetWord { timestamp, .. } => *timestamp,
            PlayerEvent::SubmittedGuess { timestamp, .. } => *timestamp,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LobbyEvent {
    LobbyCreated {
        code: LobbyCode,
    },
    LobbyDestroyed {
        code: LobbyCode,
        player_wins: Vec<PlayerWins>,
    },
    LobbyEmpty {
        code: LobbyCode,
    },
    LobbyStateChanged {
        code: LobbyCode,
        state: LobbyState,
    },
}

impl LobbyEvent {
    pub fn code(&self) -> &str {
        match self {
            LobbyEvent::LobbyCreated { code } => code,
            LobbyEvent::LobbyDestroyed { code, .. } => code,
            LobbyEvent::LobbyEmpty { code } => code,
            LobbyEvent::LobbyStateChanged { code, .. } => code,
        }
    }
}

/// Connection notifications raised by the transport layer.
#[derive(Debug, Clone, PartialEq)]
pub enum UserEvent {
    UserConnected { user_id: UserId, is_reconnect: bool },
    UserDisconnected { user_id: UserId, was_intended: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Game(GameEvent),
    Player(PlayerEvent),
    Lobby(LobbyEvent),
    User(UserEvent),
    Tick { timestamp: DateTime<Utc> },
}

impl Event {
    pub fn tick(timestamp: DateTime<Utc>) -> Self {
        Event::Tick { timestamp }
    }

    pub fn user_connected(user_id: UserId, is_reconnect: bool) -> Self {
        Event::User(UserEvent::UserConnected {
            user_id,
            is_reconnect,
        })
    }

    pub fn user_disconnected(user_id: UserId, was_intended: bool) -> Self {
        Event::User(UserEvent::UserDisconnected {
            user_id,
            was_intended,
        })
    }

    pub fn is_tick(&self) -> bool {
        matches!(self, Event::Tick { .. })
    }

    pub fn is_user_event(&self) -> bool {
        matches!(self, Event::User(_))
    }

    pub fn is_game_event(&self) -> bool {
        matches!(self, Event::Game(_))
    }

    pub fn is_lobby_event(&self) -> bool {
        matches!(self, Event::Lobby(_))
    }

    /// The lobby an event concerns, if it is scoped to one.
    pub fn lobby_code(&self) -> Option<&str> {
        match self {
            Event::Game(GameEvent::GameCreated { lobby_code, .. })
            | Event::Game(GameEvent::GameStarted { lobby_code, .. })
            | Event::Game(GameEvent::GameStateChanged { lobby_code, .. }) => Some(lobby_code),
            Event::Player(event) => Some(event.lobby_code()),
            Event::Lobby(event) => Some(event.code()),
            Event::User(_) | Event::Tick { .. } => None,
        }
    }
}

type EventFilter = Box<dyn Fn(&Event) -> bool>;
type EventHandler = Box<dyn FnMut(&Event) -> Result<(), GameError>>;

struct Subscriber {
    id: u64,
    active: Cell<bool>,
    filter: EventFilter,
    handler: RefCell<EventHandler>,
}

#[derive(Default)]
struct BusInner {
    next_id: Cell<u64>,
    subscribers: RefCell<Vec<Rc<Subscriber>>>,
}

impl BusInner {
    fn remove(&self, id: u64) {
        let mut subscribers = self.subscribers.borrow_mut();
        if let Some(index) = subscribers.iter().position(|s| s.id == id) {
            subscribers.remove(index).active.set(false);
        }
    }
}

/// Synchronous, in-process event bus.
///
/// Events are delivered in subscription order before `publish` returns.
/// The first handler error stops delivery and is handed back to the
/// publisher. Cloning the bus yields another handle to the same subscribers.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Rc<BusInner>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F, H>(&self, filter: F, handler: H) -> Subscription
    where
        F: Fn(&Event) -> bool + 'static,
        H: FnMut(&Event) -> Result<(), GameError> + 'static,
    {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);

        self.inner.subscribers.borrow_mut().push(Rc::new(Subscriber {
            id,
            active: Cell::new(true),
            filter: Box::new(filter),
            handler: RefCell::new(Box::new(handler)),
        }));

        Subscription {
            id,
            bus: Rc::downgrade(&self.inner),
        }
    }

    pub fn subscribe_all<H>(&self, handler: H) -> Subscription
    where
        H: FnMut(&Event) -> Result<(), GameError> + 'static,
    {
        self.subscribe(|_| true, handler)
    }

    pub fn publish(&self, event: Event) -> Result<(), GameError> {
        // Snapshot so handlers may subscribe or unsubscribe while we deliver.
        let subscribers: Vec<Rc<Subscriber>> = self.inner.subscribers.borrow().clone();

        for subscriber in subscribers {
            if !subscriber.active.get() || !(subscriber.filter)(&event) {
                continue;
            }

            let mut handler = subscriber.handler.try_borrow_mut().map_err(|_| {
                GameError::invalid_state("event handler re-entered while still running")
            })?;
            (*handler)(&event)?;
        }

        Ok(())
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.borrow().len()
    }
}

/// Handle to a bus subscription. Dropping it unsubscribes.
#[must_use = "dropping a Subscription immediately unsubscribes it"]
pub struct Subscription {
    id: u64,
    bus: Weak<BusInner>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.remove(self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
