use chrono::{DateTime, Duration, Local, Utc};
use clap::ValueEnum;

use crate::engine::stats::accuracy_percent;
use crate::store::schema::{ReviewStats, WordContent, WrongWordEntry};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum WordFilter {
    #[default]
    All,
    Today,
    Week,
    Difficult,
    Mastered,
}

impl WordFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            WordFilter::All => "all",
            WordFilter::Today => "today",
            WordFilter::Week => "week",
            WordFilter::Difficult => "difficult",
            WordFilter::Mastered => "mastered",
        }
    }
}

/// Record a miss from the reciting flow.
///
/// A repeat miss bumps the counter, resets the streak and revokes mastery.
/// The global mastered counter is left alone.
pub fn record_miss(entries: &mut Vec<WrongWordEntry>, content: WordContent, now: DateTime<Utc>) {
    if let Some(existing) = entries.iter_mut().find(|e| e.word == content.word) {
        existing.wrong_count += 1;
        existing.last_wrong_time = now;
        existing.consecutive_correct = 0;
        existing.mastered = false;
        log::debug!(
            "miss on known word {:?}, wrong_count={}",
            existing.word,
            existing.wrong_count
        );
    } else {
        log::debug!("new wrong word {:?}", content.word);
        entries.push(WrongWordEntry::from_miss(content, now));
    }
}

/// Remove a single word. Returns whether it was present.
pub fn remove(entries: &mut Vec<WrongWordEntry>, word: &str) -> bool {
    let before = entries.len();
    entries.retain(|e| e.word != word);
    entries.len() != before
}

pub fn filter_entries<'a>(
    entries: &'a [WrongWordEntry],
    filter: WordFilter,
    difficult_threshold: u32,
    now: DateTime<Local>,
) -> Vec<&'a WrongWordEntry> {
    let today = now.date_naive();
    let week_ago = now - Duration::days(7);
    entries
        .iter()
        .filter(|e| match filter {
            WordFilter::All => true,
            WordFilter::Today => e.last_wrong_time.with_timezone(&Local).date_naive() == today,
            WordFilter::Week => e.last_wrong_time.with_timezone(&Local) >= week_ago,
            WordFilter::Difficult => e.wrong_count >= difficult_threshold,
            WordFilter::Mastered => e.mastered,
        })
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NotebookOverview {
    pub total_words: usize,
    pub mastered_words: usize,
    pub today_reviewed: u32,
    pub accuracy: u32,
}

/// `stats` must already be rolled over to the current day.
pub fn overview(entries: &[WrongWordEntry], stats: &ReviewStats) -> NotebookOverview {
    NotebookOverview {
        total_words: entries.len(),
        mastered_words: entries.iter().filter(|e| e.mastered).count(),
        today_reviewed: stats.today_reviewed,
        accuracy: accuracy_percent(stats.total_correct, stats.total_attempts),
    }
}
