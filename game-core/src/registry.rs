use chrono::{DateTime, Utc};
use game_types::{GameError, LobbyCode, UserId};
use rand::Rng;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::{
    Event, EventBus, Lobby, LobbyCleanup, LobbyEvent, LobbySettings, Subscription, UserEvent,
    WordValidator,
};

/// Random draws allowed before lobby creation gives up.
pub const CODE_ATTEMPTS: u32 = 100;

/// Produces candidate lobby codes in `0..10_000`.
pub type CodeSource = Box<dyn FnMut() -> u16>;

/// Directory of live lobbies, keyed by their four digit code.
pub struct LobbyRegistry {
    lobbies: HashMap<LobbyCode, Lobby>,
    settings: LobbySettings,
    words: Arc<WordValidator>,
    bus: EventBus,
    cleanup: LobbyCleanup,
    code_source: CodeSource,
    subscriptions: Vec<Subscription>,
}

impl LobbyRegistry {
    pub fn new(
        bus: EventBus,
        settings: LobbySettings,
        words: Arc<WordValidator>,
        cleanup: LobbyCleanup,
    ) -> Self {
        Self {
            lobbies: HashMap::new(),
            settings,
            words,
            bus,
            cleanup,
            code_source: Box::new(|| rand::rng().random_range(0..10_000)),
            subscriptions: Vec::new(),
        }
    }

    pub fn with_code_source(mut self, code_source: impl FnMut() -> u16 + 'static) -> Self {
        self.set_code_source(code_source);
        self
    }

    pub fn set_code_source(&mut self, code_source: impl FnMut() -> u16 + 'static) {
        self.code_source = Box::new(code_source);
    }

    /// Subscribes the registry to ticks and connection events.
    ///
    /// The handler holds only a weak reference; dropping the registry (or
    /// calling [`LobbyRegistry::shutdown`]) ends the subscription.
    pub fn attach(registry: &Rc<RefCell<Self>>) {
        let weak: Weak<RefCell<Self>> = Rc::downgrade(registry);
        let bus = registry.borrow().bus.clone();

        let subscription = bus.subscribe(
            |event| event.is_tick() || event.is_user_event(),
            move |event| {
                let Some(registry) = weak.upgrade() else {
                    return Ok(());
                };
                let mut registry = registry
                    .try_borrow_mut()
                    .map_err(|_| GameError::invalid_state("lobby registry is already in use"))?;
                registry.handle_event(event)
            },
        );

        registry.borrow_mut().subscriptions.push(subscription);
    }

    pub fn create(&mut self) -> Result<&mut Lobby, GameError> {
        let code = self.generate_code()?;
        let lobby = Lobby::new(
            code.clone(),
            self.settings.clone(),
            self.words.clone(),
            self.bus.clone(),
            Utc::now(),
        );

        self.lobbies.insert(code.clone(), lobby);
        info!("lobby {} created ({} live)", code, self.lobbies.len());

        self.bus.publish(Event::Lobby(LobbyEvent::LobbyCreated {
            code: code.clone(),
        }))?;

        self.lobbies
            .get_mut(&code)
            .ok_or(GameError::LobbyNotFound { code })
    }

    pub fn find(&self, code: &str) -> Option<&Lobby> {
        self.lobbies.get(code)
    }

    pub fn find_mut(&mut self, code: &str) -> Option<&mut Lobby> {
        self.lobbies.get_mut(code)
    }

    pub fn get_mut(&mut self, code: &str) -> Result<&mut Lobby, GameError> {
        self.lobbies
            .get_mut(code)
            .ok_or_else(|| GameError::LobbyNotFound {
                code: code.to_string(),
            })
    }

    pub fn find_by_user_mut(&mut self, user_id: UserId) -> Option<&mut Lobby> {
        self.lobbies.values_mut().find(|lobby| lobby.includes(user_id))
    }

    pub fn all(&self) -> impl Iterator<Item = &Lobby> {
        self.lobbies.values()
    }

    pub fn len(&self) -> usize {
        self.lobbies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lobbies.is_empty()
    }

    pub fn destroy_lobby(&mut self, code: &str) -> Result<(), GameError> {
        let mut lobby = self
            .lobbies
            .remove(code)
            .ok_or_else(|| GameError::LobbyNotFound {
                code: code.to_string(),
            })?;

        lobby.dispose();
        info!("lobby {} destroyed ({} live)", code, self.lobbies.len());

        self.bus.publish(Event::Lobby(LobbyEvent::LobbyDestroyed {
            code: code.to_string(),
            player_wins: lobby.player_wins(),
        }))
    }

    /// Destroys every lobby idle past the cleanup threshold. A failing
    /// destroy does not stop the sweep; the first failure is returned after
    /// every idle lobby is gone.
    pub fn sweep(&mut self, now: DateTime<Utc>) -> Result<Vec<LobbyCode>, GameError> {
        let idle = self.cleanup.idle_lobbies(self.lobbies.values(), now);
        let mut first_error = None;

        for code in &idle {
            if let Err(e) = self.destroy_lobby(code) {
                warn!("destroying idle lobby {} failed: {}", code, e);
                first_error.get_or_insert(e);
            }
        }

        if !idle.is_empty() {
            info!("swept {} idle lobbies", idle.len());
        }

        first_error.map_or(Ok(idle), Err)
    }

    /// Fires due timers in every lobby. Every lobby gets its turn; the
    /// first failure is returned afterwards.
    pub fn run_timers(&mut self, now: DateTime<Utc>) -> Result<(), GameError> {
        let mut first_error = None;

        for lobby in self.lobbies.values_mut() {
            if let Err(e) = lobby.run_timers(now) {
                warn!("timer failed in lobby {}: {}", lobby.code(), e);
                first_error.get_or_insert(e);
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    /// Detaches from the bus and destroys every lobby.
    pub fn shutdown(&mut self) -> Result<(), GameError> {
        self.subscriptions.clear();

        let codes: Vec<LobbyCode> = self.lobbies.keys().cloned().collect();
        for code in codes {
            self.destroy_lobby(&code)?;
        }

        Ok(())
    }

    fn handle_event(&mut self, event: &Event) -> Result<(), GameError> {
        match event {
            Event::Tick { timestamp } => self.sweep(*timestamp).map(|_| ()),
            Event::User(UserEvent::UserConnected {
                user_id,
                is_reconnect,
            }) => {
                if let Some(lobby) = self.find_by_user_mut(*user_id) {
                    lobby.on_user_connected(*user_id, *is_reconnect);
                }
                Ok(())
            }
            Event::User(UserEvent::UserDisconnected {
                user_id,
                was_intended,
            }) => {
                let Some(lobby) = self.find_by_user_mut(*user_id) else {
                    debug!("disconnected user {} is not in a lobby", user_id);
                    return Ok(());
                };

                if lobby.on_user_disconnected(*user_id, *was_intended)? {
                    let code = lobby.code().to_string();
                    self.destroy_lobby(&code)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn generate_code(&mut self) -> Result<LobbyCode, GameError> {
        for _ in 0..CODE_ATTEMPTS {
            let code = format!("{:04}", (self.code_source)() % 10_000);
            if !self.lobbies.contains_key(&code) {
                return Ok(code);
            }
        }

        warn!("no free lobby code after {} attempts", CODE_ATTEMPTS);
        Err(GameError::CodeSpaceExhausted {
            attempts: CODE_ATTEMPTS,
        })
    }
}
