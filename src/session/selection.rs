use std::cmp::Reverse;

use crate::error::ReviewError;
use crate::store::schema::WrongWordEntry;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReviewMode {
    /// Every non-mastered word, in book order.
    Full,
    /// The `size` non-mastered words missed most often.
    QuickTest { size: usize },
    /// One named word, mastered or not.
    Single(String),
}

impl ReviewMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewMode::Full => "full",
            ReviewMode::QuickTest { .. } => "quick",
            ReviewMode::Single(_) => "single",
        }
    }
}

/// Pick the words for a session. An empty result is left for the caller to
/// report; only an unknown single word is an error here. Entries without a
/// first meaning cannot be quizzed and are skipped.
pub fn select_words(
    entries: &[WrongWordEntry],
    mode: &ReviewMode,
) -> Result<Vec<WrongWordEntry>, ReviewError> {
    let quizzable = |e: &&WrongWordEntry| e.primary_meaning().is_some();
    match mode {
        ReviewMode::Full => Ok(entries
            .iter()
            .filter(|e| !e.mastered)
            .filter(quizzable)
            .cloned()
            .collect()),
        ReviewMode::QuickTest { size } => {
            let mut words: Vec<WrongWordEntry> = entries
                .iter()
                .filter(|e| !e.mastered)
                .filter(quizzable)
                .cloned()
                .collect();
            // Stable sort keeps book order among equal counts
            words.sort_by_key(|e| Reverse(e.wrong_count));
            words.truncate(*size);
            Ok(words)
        }
        ReviewMode::Single(word) => {
            let entry = entries
                .iter()
                .find(|e| &e.word == word)
                .ok_or_else(|| ReviewError::WordNotFound(word.clone()))?;
            if !quizzable(&entry) {
                log::warn!("{word:?} has no meaning to quiz on");
                return Ok(Vec::new());
            }
            Ok(vec![entry.clone()])
        }
    }
}
