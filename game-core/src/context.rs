use chrono::{DateTime, Utc};
use game_types::{GameError, UserId};
use std::cell::{RefCell, RefMut};
use std::rc::Rc;
use std::sync::Arc;

use crate::{Event, EventBus, LobbyCleanup, LobbyRegistry, LobbySettings, WordValidator};

/// Everything the engine shares, wired together once at startup.
#[derive(Clone)]
pub struct GameContext {
    bus: EventBus,
    registry: Rc<RefCell<LobbyRegistry>>,
}

impl GameContext {
    pub fn new(settings: LobbySettings, words: Arc<WordValidator>, cleanup: LobbyCleanup) -> Self {
        let bus = EventBus::new();
        let registry = Rc::new(RefCell::new(LobbyRegistry::new(
            bus.clone(),
            settings,
            words,
            cleanup,
        )));
        LobbyRegistry::attach(&registry);

        Self { bus, registry }
    }

    /// Replaces the registry's code generator before any lobby exists.
    pub fn with_code_source(self, code_source: impl FnMut() -> u16 + 'static) -> Self {
        self.registry.borrow_mut().set_code_source(code_source);
        self
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Mutable access to the registry. Fails instead of panicking if the
    /// registry is already borrowed, e.g. from inside a bus handler.
    pub fn registry(&self) -> Result<RefMut<'_, LobbyRegistry>, GameError> {
        self.registry
            .try_borrow_mut()
            .map_err(|_| GameError::invalid_state("lobby registry is already in use"))
    }

    pub fn tick(&self, now: DateTime<Utc>) -> Result<(), GameError> {
        self.bus.publish(Event::tick(now))
    }

    pub fn user_connected(&self, user_id: UserId, is_reconnect: bool) -> Result<(), GameError> {
        self.bus.publish(Event::user_connected(user_id, is_reconnect))
    }

    pub fn user_disconnected(&self, user_id: UserId, was_intended: bool) -> Result<(), GameError> {
        self.bus
            .publish(Event::user_disconnected(user_id, was_intended))
    }

    pub fn run_timers(&self, now: DateTime<Utc>) -> Result<(), GameError> {
        self.registry()?.run_timers(now)
    }

    pub fn shutdown(&self) -> Result<(), GameError> {
        self.registry()?.shutdown()
    }
}
