use anyhow::{Context, Result};
use game_core::{GameSettings, LobbyCleanup, LobbySettings, WordValidator};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub pick_word_seconds: u32,
    pub pre_game_seconds: u32,
    pub game_length_minutes: Option<u32>,
    pub lobby_idle_minutes: u32,
    pub tick_interval_seconds: u64,
    pub timer_resolution_millis: u64,
    pub room_capacity: Option<usize>,
    pub words_file: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key/value source, e.g. a map in tests.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Self {
            pick_word_seconds: parse_or(&lookup, "PICK_WORD_SECONDS", 60)?,
            pre_game_seconds: parse_or(&lookup, "PRE_GAME_SECONDS", 3)?,
            game_length_minutes: parse_optional(&lookup, "GAME_LENGTH_MINUTES")?,
            lobby_idle_minutes: parse_or(&lookup, "LOBBY_IDLE_MINUTES", 60)?,
            tick_interval_seconds: parse_or(&lookup, "TICK_INTERVAL_SECONDS", 600)?,
            timer_resolution_millis: parse_or(&lookup, "TIMER_RESOLUTION_MILLIS", 250)?,
            room_capacity: parse_optional(&lookup, "ROOM_CAPACITY")?,
            words_file: lookup("WORDS_FILE").map(PathBuf::from),
        })
    }

    pub fn lobby_settings(&self) -> LobbySettings {
        LobbySettings {
            game: GameSettings {
                pick_word_length: self.pick_word_seconds,
                pre_game_length: self.pre_game_seconds,
            },
            default_game_length: self.game_length_minutes,
            room_capacity: self.room_capacity,
        }
    }

    pub fn cleanup(&self) -> LobbyCleanup {
        LobbyCleanup::new(chrono::Duration::minutes(self.lobby_idle_minutes.into()))
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_seconds)
    }

    pub fn timer_resolution(&self) -> Duration {
        Duration::from_millis(self.timer_resolution_millis)
    }

    /// The configured word list, or the built-in one.
    pub fn load_words(&self) -> Result<WordValidator> {
        let Some(path) = &self.words_file else {
            return Ok(WordValidator::default());
        };

        let words = WordValidator::from_file(path)
            .with_context(|| format!("failed to read word list {}", path.display()))?;
        if words.word_count() == 0 {
            anyhow::bail!("word list {} has no usable words", path.display());
        }

        Ok(words)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pick_word_seconds: 60,
            pre_game_seconds: 3,
            game_length_minutes: None,
            lobby_idle_minutes: 60,
            tick_interval_seconds: 600,
            timer_resolution_millis: 250,
            room_capacity: None,
            words_file: None,
        }
    }
}

fn parse_optional<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .with_context(|| format!("Invalid {}: {:?}", key, value))
        })
        .transpose()
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    Ok(parse_optional(lookup, key)?.unwrap_or(default))
}
