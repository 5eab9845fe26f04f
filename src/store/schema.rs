use anyhow::{Result, bail};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Config;

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meaning {
    pub part_of_speech: String,
    pub meaning: String,
    #[serde(default)]
    pub examples: Vec<String>,
}

/// Word content as produced by the reciting flow when a word is missed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordContent {
    pub word: String,
    #[serde(default)]
    pub phonetic: String,
    pub meanings: Vec<Meaning>,
    #[serde(default)]
    pub difficulty: Difficulty,
}

impl WordContent {
    /// A word can only be quizzed if it has a name and a first meaning to
    /// check answers against.
    pub fn validate(&self) -> Result<()> {
        if self.word.trim().is_empty() {
            bail!("word record has an empty word");
        }
        match self.meanings.first() {
            None => bail!("word record {:?} has no meanings", self.word),
            Some(m) if m.meaning.trim().is_empty() => {
                bail!("word record {:?} has an empty first meaning", self.word)
            }
            Some(_) => Ok(()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WrongWordEntry {
    pub word: String,
    #[serde(default)]
    pub phonetic: String,
    pub meanings: Vec<Meaning>,
    #[serde(default)]
    pub difficulty: Difficulty,
    pub wrong_count: u32,
    pub last_wrong_time: DateTime<Utc>,
    #[serde(default)]
    pub review_count: u32,
    #[serde(default)]
    pub consecutive_correct: u32,
    #[serde(default)]
    pub mastered: bool,
}

impl WrongWordEntry {
    /// Fresh entry for a word missed for the first time.
    pub fn from_miss(content: WordContent, now: DateTime<Utc>) -> Self {
        Self {
            word: content.word,
            phonetic: content.phonetic,
            meanings: content.meanings,
            difficulty: content.difficulty,
            wrong_count: 1,
            last_wrong_time: now,
            review_count: 0,
            consecutive_correct: 0,
            mastered: false,
        }
    }

    /// The meaning a review answer is checked against. `None` for entries
    /// that cannot be quizzed.
    pub fn primary_meaning(&self) -> Option<&str> {
        self.meanings
            .first()
            .map(|m| m.meaning.as_str())
            .filter(|m| !m.trim().is_empty())
    }

    pub fn primary_example(&self) -> Option<&str> {
        self.meanings
            .first()
            .and_then(|m| m.examples.first())
            .map(|s| s.as_str())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    pub total_reviewed: u32,
    pub today_reviewed: u32,
    pub mastered_count: u32,
    pub total_correct: u32,
    pub total_attempts: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WrongWordsData {
    pub schema_version: u32,
    pub wrong_words: Vec<WrongWordEntry>,
}

impl Default for WrongWordsData {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            wrong_words: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStatsData {
    pub schema_version: u32,
    pub review_stats: ReviewStats,
    #[serde(default)]
    pub last_review_date: Option<NaiveDate>,
}

impl Default for ReviewStatsData {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            review_stats: ReviewStats::default(),
            last_review_date: None,
        }
    }
}

pub trait Versioned {
    fn schema_version(&self) -> u32;

    /// Check if loaded data has a stale schema version and needs reset.
    fn needs_reset(&self) -> bool {
        self.schema_version() != SCHEMA_VERSION
    }
}

impl Versioned for WrongWordsData {
    fn schema_version(&self) -> u32 {
        self.schema_version
    }
}

impl Versioned for ReviewStatsData {
    fn schema_version(&self) -> u32 {
        self.schema_version
    }
}

pub const EXPORT_VERSION: u32 = 1;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportData {
    pub wordup_export_version: u32,
    pub exported_at: DateTime<Utc>,
    pub config: Config,
    pub wrong_words: WrongWordsData,
    pub review_stats: ReviewStatsData,
}
