use chrono::{DateTime, Utc};
use std::cmp::Ordering;

use crate::{Player, WORD_LENGTH, Word};

/// The numbers a player is ranked on at the end of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Performance {
    pub won_at: Option<DateTime<Utc>>,
    pub num_guesses: usize,
    pub best_guess: u8,
}

impl From<&Player> for Performance {
    fn from(player: &Player) -> Self {
        Self {
            won_at: player.won_at(),
            num_guesses: player.guesses().len(),
            best_guess: player.best_guess(),
        }
    }
}

pub struct ScoringEngine;

impl ScoringEngine {
    /// Returns the overlap count and whether the guess is an exact match.
    ///
    /// An exact match always scores the full word length. Otherwise each
    /// distinct letter found in both words counts once.
    pub fn score_guess(guess: &Word, target: &Word) -> (u8, bool) {
        if guess == target {
            return (WORD_LENGTH as u8, true);
        }

        (Self::common_letters(guess, target), false)
    }

    pub fn common_letters(guess: &Word, target: &Word) -> u8 {
        let guess_letters = guess.letters();
        target
            .letters()
            .intersection(&guess_letters)
            .count() as u8
    }

    /// Winners first (fewest guesses, then earliest win), then everyone else
    /// (best guess descending, then fewest guesses).
    pub fn compare_performance(a: &Performance, b: &Performance) -> Ordering {
        match (a.won_at, b.won_at) {
            (Some(a_won), Some(b_won)) => a
                .num_guesses
                .cmp(&b.num_guesses)
                .then_with(|| a_won.cmp(&b_won)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => b
                .best_guess
                .cmp(&a.best_guess)
                .then_with(|| a.num_guesses.cmp(&b.num_guesses)),
        }
    }

    /// Orders players for placement. The sort is stable, so fully tied
    /// players keep their ring order.
    pub fn rank<'a>(players: impl IntoIterator<Item = &'a Player>) -> Vec<&'a Player> {
        let mut ranked: Vec<&Player> = players.into_iter().collect();
        ranked.sort_by(|a, b| {
            Self::compare_performance(&Performance::from(*a), &Performance::from(*b))
        });
        ranked
    }
}
