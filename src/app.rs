use std::fs;
use std::io::{BufRead, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Local, Utc};
use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::config::{self, Config};
use crate::engine::notebook::{self, WordFilter};
use crate::error::ReviewError;
use crate::generator::reference_pool::ReferencePool;
use crate::session::result::ReviewSummary;
use crate::session::review::{ReviewController, SessionState};
use crate::session::selection::ReviewMode;
use crate::store::json_store::JsonStore;
use crate::store::repository::ReviewRepository;
use crate::store::schema::{ExportData, WordContent};

pub struct App {
    pub config: Config,
    pub pool: ReferencePool,
    store: Option<JsonStore>,
}

impl App {
    pub fn new(mut config: Config) -> Result<Self> {
        config.validate(&ReferencePool::available_names(&config.pool_path()));
        let pool =
            ReferencePool::load(&config.reference_pool, &config.pool_path()).unwrap_or_default();
        if pool.is_empty() {
            log::warn!("reference pool {:?} is empty", config.reference_pool);
        }
        let store = JsonStore::new(config.data_path())?;
        if store.check_interrupted_import() {
            log::warn!("cleaned up backups from an interrupted import");
        }
        Ok(Self {
            config,
            pool,
            store: Some(store),
        })
    }

    fn store(&mut self) -> Result<&mut JsonStore> {
        self.store.as_mut().context("store is in use by a review session")
    }

    /// Run one interactive review session.
    ///
    /// Options are picked by number; `q` (or end of input) abandons the
    /// session. Returns the summary if the session ran to completion.
    /// Quick-test sizes are clamped like the configured size.
    pub fn review(
        &mut self,
        mode: &ReviewMode,
        input: &mut impl BufRead,
        out: &mut impl Write,
    ) -> Result<Option<ReviewSummary>> {
        let mode = match mode {
            ReviewMode::QuickTest { size } => ReviewMode::QuickTest {
                size: config::clamp_quick_test_size(*size),
            },
            other => other.clone(),
        };
        let store = self.store.take().context("store is in use by a review session")?;
        let mut controller =
            ReviewController::new(store, self.pool.clone(), SmallRng::from_entropy());

        let result = match controller.start_mode(&mode) {
            Ok(()) => run_session(&mut controller, input, out),
            Err(ReviewError::NothingToReview) => {
                writeln!(out, "Nothing to review.")?;
                Ok(None)
            }
            Err(e) => Err(e.into()),
        };

        self.store = Some(controller.into_store());
        result
    }

    pub fn list(&mut self, filter: WordFilter, out: &mut impl Write) -> Result<()> {
        let threshold = self.config.difficult_threshold;
        let entries = self.store()?.load_wrong_words()?;
        let shown = notebook::filter_entries(&entries, filter, threshold, Local::now());

        writeln!(out, "{} word(s) ({})", shown.len(), filter.as_str())?;
        for e in shown {
            let meanings: Vec<String> = e
                .meanings
                .iter()
                .map(|m| format!("{} {}", m.part_of_speech, m.meaning))
                .collect();
            writeln!(
                out,
                "{:<16} {:<16} {:<6} missed {:>2}x  reviewed {:>2}x{}  {}",
                e.word,
                e.phonetic,
                e.difficulty.as_str(),
                e.wrong_count,
                e.review_count,
                if e.mastered { "  [mastered]" } else { "" },
                meanings.join("; "),
            )?;
        }
        Ok(())
    }

    pub fn stats(&mut self, out: &mut impl Write) -> Result<()> {
        let store = self.store()?;
        let entries = store.load_wrong_words()?;
        let stats = store.review_stats_for(Local::now().date_naive())?;
        let overview = notebook::overview(&entries, &stats.review_stats);

        writeln!(out, "Wrong words:     {}", overview.total_words)?;
        writeln!(out, "Mastered:        {}", overview.mastered_words)?;
        writeln!(out, "Reviewed today:  {}", overview.today_reviewed)?;
        writeln!(out, "Accuracy:        {}%", overview.accuracy)?;
        writeln!(out, "Total reviewed:  {}", stats.review_stats.total_reviewed)?;
        writeln!(out, "Ever mastered:   {}", stats.review_stats.mastered_count)?;
        Ok(())
    }

    /// Record a reciting-flow miss from a JSON word record.
    pub fn record_miss_file(&mut self, path: &Path) -> Result<String> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let word: WordContent = serde_json::from_str(&content)
            .with_context(|| format!("parsing word record {}", path.display()))?;
        let name = word.word.clone();
        self.store()?.record_miss(word, Utc::now())?;
        Ok(name)
    }

    pub fn remove(&mut self, word: &str) -> Result<bool> {
        self.store()?.remove_word(word)
    }

    pub fn clear(&mut self) -> Result<usize> {
        self.store()?.clear_all()
    }

    pub fn export(&mut self, path: &Path) -> Result<()> {
        let config = self.config.clone();
        let data = self.store()?.export_all(&config)?;
        let json = serde_json::to_string_pretty(&data)?;
        fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    pub fn import(&mut self, path: &Path) -> Result<()> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let data: ExportData = serde_json::from_str(&content)?;
        self.store()?.import_all(&data)
    }
}

fn run_session<S: ReviewRepository>(
    controller: &mut ReviewController<S, SmallRng>,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<Option<ReviewSummary>> {
    let mut line = String::new();
    loop {
        match controller.state() {
            SessionState::Presenting(question) => {
                writeln!(
                    out,
                    "\n[{}/{}] {}  {}",
                    question.position, question.total, question.entry.word, question.entry.phonetic
                )?;
                for (i, option) in question.options.iter().enumerate() {
                    writeln!(out, "  {}. {}", i + 1, option)?;
                }
                write!(out, "> ")?;
                out.flush()?;

                let Some(answer) = read_answer(input, &mut line)? else {
                    controller.abandon();
                    writeln!(out, "Review abandoned.")?;
                    return Ok(None);
                };
                let choice = answer
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|i| question.options.get(i))
                    .cloned();
                match choice {
                    Some(selected) => {
                        controller.submit_answer(&selected)?;
                    }
                    None => writeln!(out, "Pick 1-{} or q.", question.options.len())?,
                }
            }
            SessionState::Feedback { feedback, .. } => {
                if feedback.correct {
                    writeln!(out, "Correct!")?;
                } else {
                    writeln!(out, "Wrong. Answer: {}", feedback.correct_meaning)?;
                }
                if let Some(example) = &feedback.example {
                    writeln!(out, "  e.g. {example}")?;
                }
                if feedback.mastery.is_some_and(|m| m.newly_mastered) {
                    writeln!(out, "  {} mastered!", feedback.word)?;
                }
                if let Some((correct, wrong, accuracy)) = controller.running_score() {
                    writeln!(out, "  session: {correct} right, {wrong} wrong ({accuracy}%)")?;
                }
                write!(out, "[enter] next, q quit ")?;
                out.flush()?;

                if read_answer(input, &mut line)?.is_none() {
                    controller.abandon();
                    writeln!(out, "Review abandoned.")?;
                    return Ok(None);
                }
                controller.advance()?;
            }
            SessionState::Completed(summary) => {
                writeln!(
                    out,
                    "\nDone: {} right, {} wrong, accuracy {}%",
                    summary.correct_answers, summary.wrong_answers, summary.accuracy
                )?;
                for word in &summary.newly_mastered {
                    writeln!(out, "  mastered: {word}")?;
                }
                return Ok(Some(summary.clone()));
            }
            SessionState::NotStarted => return Ok(None),
        }
    }
}

/// Next trimmed input line, or `None` on end of input or `q`.
fn read_answer<'a>(input: &mut impl BufRead, line: &'a mut String) -> Result<Option<&'a str>> {
    line.clear();
    if input.read_line(line)? == 0 {
        return Ok(None);
    }
    let trimmed = line.trim();
    if trimmed.eq_ignore_ascii_case("q") {
        return Ok(None);
    }
    Ok(Some(trimmed))
}
