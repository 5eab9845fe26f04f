use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};

use crate::engine::mastery::{self, MasteryOutcome};
use crate::engine::notebook;
use crate::store::schema::{ReviewStatsData, WordContent, WrongWordEntry};

/// Persistence seam for the wrong-word book and review counters.
///
/// Implementors provide whole-record load/save; the provided methods are the
/// read-modify-write operations callers should use. Each one loads, mutates
/// and saves before returning, so a completed answer survives a crash even
/// if the session around it does not.
pub trait ReviewRepository {
    fn load_wrong_words(&self) -> Result<Vec<WrongWordEntry>>;
    fn save_wrong_words(&mut self, entries: &[WrongWordEntry]) -> Result<()>;
    fn load_review_stats(&self) -> Result<ReviewStatsData>;
    fn save_review_stats(&mut self, data: &ReviewStatsData) -> Result<()>;

    /// Apply a review answer to `word` and the global counters.
    ///
    /// Returns `None` if the word is no longer in the book; the counters
    /// are still updated in that case. If the counters cannot be saved the
    /// entry is put back as it was, so a failed call can be retried without
    /// counting the answer twice.
    fn record_answer(
        &mut self,
        word: &str,
        correct: bool,
        today: NaiveDate,
    ) -> Result<Option<MasteryOutcome>> {
        let original = self.load_wrong_words()?;
        let mut stats = self.load_review_stats()?;

        let mut entries = original.clone();
        let outcome = entries
            .iter_mut()
            .find(|e| e.word == word)
            .map(|entry| mastery::apply_answer(entry, correct));
        if outcome.is_none() {
            log::warn!("answered word {word:?} is not in the wrong-word book");
        }
        stats.record_answer(
            correct,
            outcome.is_some_and(|o| o.newly_mastered),
            today,
        );

        if outcome.is_some() {
            self.save_wrong_words(&entries)?;
        }
        if let Err(e) = self.save_review_stats(&stats) {
            if outcome.is_some()
                && let Err(restore) = self.save_wrong_words(&original)
            {
                log::error!("could not restore {word:?} after a failed stats save: {restore:#}");
            }
            return Err(e);
        }

        if outcome.is_some_and(|o| o.newly_mastered) {
            log::info!("{word:?} mastered");
        }
        Ok(outcome)
    }

    /// Add a reciting-flow miss. Records without a usable first meaning
    /// are rejected.
    fn record_miss(&mut self, content: WordContent, now: DateTime<Utc>) -> Result<()> {
        content.validate()?;
        let mut entries = self.load_wrong_words()?;
        notebook::record_miss(&mut entries, content, now);
        self.save_wrong_words(&entries)
    }

    fn remove_word(&mut self, word: &str) -> Result<bool> {
        let mut entries = self.load_wrong_words()?;
        let removed = notebook::remove(&mut entries, word);
        if removed {
            self.save_wrong_words(&entries)?;
        }
        Ok(removed)
    }

    /// Empty the book. Returns how many entries were dropped.
    fn clear_all(&mut self) -> Result<usize> {
        let entries = self.load_wrong_words()?;
        if entries.is_empty() {
            return Ok(0);
        }
        self.save_wrong_words(&[])?;
        Ok(entries.len())
    }

    /// Review counters as of `today`, persisting the rollover if one happened.
    fn review_stats_for(&mut self, today: NaiveDate) -> Result<ReviewStatsData> {
        let mut stats = self.load_review_stats()?;
        if stats.refresh_day(today) {
            self.save_review_stats(&stats)?;
        }
        Ok(stats)
    }
}

/// Repository kept entirely in memory. Nothing outlives the process.
#[derive(Clone, Debug, Default)]
pub struct MemoryRepository {
    pub wrong_words: Vec<WrongWordEntry>,
    pub review_stats: ReviewStatsData,
}

impl MemoryRepository {
    pub fn with_words(wrong_words: Vec<WrongWordEntry>) -> Self {
        Self {
            wrong_words,
            review_stats: ReviewStatsData::default(),
        }
    }
}

impl ReviewRepository for MemoryRepository {
    fn load_wrong_words(&self) -> Result<Vec<WrongWordEntry>> {
        Ok(self.wrong_words.clone())
    }

    fn save_wrong_words(&mut self, entries: &[WrongWordEntry]) -> Result<()> {
        self.wrong_words = entries.to_vec();
        Ok(())
    }

    fn load_review_stats(&self) -> Result<ReviewStatsData> {
        Ok(self.review_stats.clone())
    }

    fn save_review_stats(&mut self, data: &ReviewStatsData) -> Result<()> {
        self.review_stats = data.clone();
        Ok(())
    }
}
