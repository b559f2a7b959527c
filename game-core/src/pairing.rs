use game_types::{GameError, UserId};
use rand::seq::SliceRandom;
use std::collections::HashSet;

use crate::Player;

pub const MIN_PLAYERS: usize = 2;

/// Shuffles the players and links them into a single guessing ring: every
/// player's opponent is the next player, and the last wraps to the first.
pub fn pair_players(players: &mut [Player]) -> Result<(), GameError> {
    validate_roster(players)?;
    players.shuffle(&mut rand::rng());
    assign_ring(players)
}

/// Links players in their current order.
pub fn assign_ring(players: &mut [Player]) -> Result<(), GameError> {
    validate_roster(players)?;

    let ids: Vec<UserId> = players.iter().map(Player::user_id).collect();
    for (i, player) in players.iter_mut().enumerate() {
        player.set_opponent(ids[(i + 1) % ids.len()])?;
    }

    Ok(())
}

fn validate_roster(players: &[Player]) -> Result<(), GameError> {
    if players.len() < MIN_PLAYERS {
        return Err(GameError::invalid_state(format!(
            "game must have at least {} players, got {}",
            MIN_PLAYERS,
            players.len()
        )));
    }

    let mut seen = HashSet::new();
    if !players.iter().all(|p| seen.insert(p.user_id())) {
        return Err(GameError::invalid_state("a player cannot join a game twice"));
    }

    Ok(())
}
