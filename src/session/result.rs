use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::stats::accuracy_percent;

/// Final tallies of a completed review session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewSummary {
    pub mode: String,
    pub total_words: usize,
    pub correct_answers: u32,
    pub wrong_answers: u32,
    pub accuracy: u32,
    pub newly_mastered: Vec<String>,
    pub finished_at: DateTime<Utc>,
}

impl ReviewSummary {
    pub fn new(
        mode: &str,
        total_words: usize,
        correct_answers: u32,
        wrong_answers: u32,
        newly_mastered: Vec<String>,
    ) -> Self {
        Self {
            mode: mode.to_string(),
            total_words,
            correct_answers,
            wrong_answers,
            accuracy: accuracy_percent(correct_answers, correct_answers + wrong_answers),
            newly_mastered,
            finished_at: Utc::now(),
        }
    }
}
