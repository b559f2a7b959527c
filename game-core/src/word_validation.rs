use game_types::GameError;
use rand::seq::IndexedRandom;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

pub const WORD_LENGTH: usize = 5;

const DEFAULT_WORDS: &str = include_str!("../words/five_letter_words.txt");

/// A normalized (lowercase ASCII) five letter word.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Word(String);

impl Word {
    /// A secret word: five letters, none repeated.
    pub fn secret(word: &str) -> Result<Self, GameError> {
        let word = Self::guess(word)?;

        if !has_distinct_letters(word.as_str()) {
            return Err(GameError::invalid_word(
                word.as_str(),
                "letters must not repeat",
            ));
        }

        Ok(word)
    }

    /// A guess: five letters, repeats allowed.
    pub fn guess(word: &str) -> Result<Self, GameError> {
        let normalized = word.trim().to_lowercase();

        if !normalized.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(GameError::invalid_word(word, "only letters are allowed"));
        }

        if normalized.len() != WORD_LENGTH {
            return Err(GameError::invalid_word(
                word,
                format!("must be {} letters long", WORD_LENGTH),
            ));
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Distinct letters of the word.
    pub fn letters(&self) -> HashSet<char> {
        self.0.chars().collect()
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn has_distinct_letters(word: &str) -> bool {
    let mut seen = HashSet::new();
    word.chars().all(|c| seen.insert(c))
}

/// Pool of words that may be handed out to players who ran out of time.
pub struct WordValidator {
    assignable: Vec<Word>,
}

impl WordValidator {
    /// Create a new word validator from a word list
    pub fn from_word_list(word_list: &str) -> Self {
        let mut seen = HashSet::new();
        let mut assignable = Vec::new();

        for line in word_list.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Ok(word) = Word::secret(line) {
                if seen.insert(word.clone()) {
                    assignable.push(word);
                }
            }
        }

        Self { assignable }
    }

    pub fn from_file(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(Self::from_word_list(&contents))
    }

    pub fn word_count(&self) -> usize {
        self.assignable.len()
    }

    pub fn random_word(&self) -> Result<Word, GameError> {
        self.assignable
            .choose(&mut rand::rng())
            .cloned()
            .ok_or(GameError::NoWordsAvailable)
    }
}

impl Default for WordValidator {
    fn default() -> Self {
        Self::from_word_list(DEFAULT_WORDS)
    }
}
