use anyhow::Result;
use game_core::GameContext;
use std::sync::Arc;
use tracing::info;

pub mod config;
pub mod event_log;
pub mod timer_service;

use crate::config::Config;

/// Wires the engine together from configuration.
pub fn build_context(config: &Config) -> Result<GameContext> {
    let words = config.load_words()?;
    info!("Loaded {} assignable words", words.word_count());

    Ok(GameContext::new(
        config.lobby_settings(),
        Arc::new(words),
        config.cleanup(),
    ))
}
