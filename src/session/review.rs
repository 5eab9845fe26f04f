use chrono::{Local, NaiveDate};
use rand::Rng;

use crate::engine::distractor;
use crate::engine::mastery::MasteryOutcome;
use crate::engine::stats::accuracy_percent;
use crate::error::ReviewError;
use crate::generator::reference_pool::ReferencePool;
use crate::session::result::ReviewSummary;
use crate::session::selection::{self, ReviewMode};
use crate::store::repository::ReviewRepository;
use crate::store::schema::WrongWordEntry;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Question {
    pub entry: WrongWordEntry,
    pub options: Vec<String>,
    /// 1-based position within the session.
    pub position: usize,
    pub total: usize,
}

impl Question {
    pub fn correct_meaning(&self) -> &str {
        self.entry.primary_meaning().unwrap_or_default()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnswerFeedback {
    pub word: String,
    pub selected: String,
    pub correct: bool,
    pub correct_meaning: String,
    pub phonetic: String,
    pub example: Option<String>,
    /// `None` if the word left the book while the session was running.
    pub mastery: Option<MasteryOutcome>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionState {
    NotStarted,
    Presenting(Question),
    Feedback {
        question: Question,
        feedback: AnswerFeedback,
    },
    Completed(ReviewSummary),
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::NotStarted => "not started",
            SessionState::Presenting(_) => "presenting",
            SessionState::Feedback { .. } => "showing feedback",
            SessionState::Completed(_) => "completed",
        }
    }
}

/// Ephemeral bookkeeping for the running session. Never persisted.
struct ActiveSession {
    mode: &'static str,
    words: Vec<WrongWordEntry>,
    current_index: usize,
    correct_answers: u32,
    wrong_answers: u32,
    selected_option: Option<String>,
    newly_mastered: Vec<String>,
}

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

/// Drives one review session at a time over an injected repository.
///
/// Answers are written through to the repository as they are submitted; the
/// cursor and running tallies live only here and are lost on `abandon`.
pub struct ReviewController<S: ReviewRepository, R: Rng> {
    store: S,
    pool: ReferencePool,
    rng: R,
    today: fn() -> NaiveDate,
    session: Option<ActiveSession>,
    state: SessionState,
}

impl<S: ReviewRepository, R: Rng> ReviewController<S, R> {
    pub fn new(store: S, pool: ReferencePool, rng: R) -> Self {
        Self {
            store,
            pool,
            rng,
            today: local_today,
            session: None,
            state: SessionState::NotStarted,
        }
    }

    /// Override the calendar used for the daily review counter.
    pub fn with_clock(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Load the book, pick words for `mode` and start on them.
    pub fn start_mode(&mut self, mode: &ReviewMode) -> Result<(), ReviewError> {
        let entries = self.store.load_wrong_words()?;
        let words = selection::select_words(&entries, mode)?;
        self.begin(mode.as_str(), words)
    }

    /// Start a session over `words` in the given order.
    ///
    /// An empty list fails with `NothingToReview` and leaves the current state
    /// alone. Starting over an existing session replaces it.
    pub fn start(&mut self, words: Vec<WrongWordEntry>) -> Result<(), ReviewError> {
        self.begin("custom", words)
    }

    fn begin(
        &mut self,
        mode: &'static str,
        mut words: Vec<WrongWordEntry>,
    ) -> Result<(), ReviewError> {
        let before = words.len();
        words.retain(|e| e.primary_meaning().is_some());
        if words.len() < before {
            log::warn!("skipping {} word(s) with no meaning", before - words.len());
        }
        if words.is_empty() {
            return Err(ReviewError::NothingToReview);
        }
        log::debug!("starting {mode} review of {} words", words.len());

        let question = make_question(&words, 0, &self.pool, &mut self.rng);
        self.session = Some(ActiveSession {
            mode,
            words,
            current_index: 0,
            correct_answers: 0,
            wrong_answers: 0,
            selected_option: None,
            newly_mastered: Vec::new(),
        });
        self.state = SessionState::Presenting(question);
        Ok(())
    }

    /// The word under the cursor and its options. Stable until `advance`.
    pub fn present_current(&self) -> Option<&Question> {
        match &self.state {
            SessionState::Presenting(question) | SessionState::Feedback { question, .. } => {
                Some(question)
            }
            _ => None,
        }
    }

    /// Answer the current word.
    ///
    /// A second answer for the same word returns `Ok(None)` and changes
    /// nothing. If the repository write fails the session stays on the
    /// current word with no answer recorded.
    pub fn submit_answer(&mut self, selected: &str) -> Result<Option<AnswerFeedback>, ReviewError> {
        let question = match &self.state {
            SessionState::Presenting(question) => question,
            SessionState::Feedback { .. } => return Ok(None),
            other => {
                return Err(ReviewError::InvalidTransition {
                    from: other.name(),
                    action: "submit an answer",
                });
            }
        };
        let Some(session) = self.session.as_mut() else {
            return Err(ReviewError::InvalidTransition {
                from: "not started",
                action: "submit an answer",
            });
        };
        if session.selected_option.is_some() {
            return Ok(None);
        }

        let correct_meaning = question.correct_meaning().to_string();
        let correct = selected == correct_meaning;
        let word = question.entry.word.clone();

        let mastery = self.store.record_answer(&word, correct, (self.today)())?;

        session.selected_option = Some(selected.to_string());
        if correct {
            session.correct_answers += 1;
        } else {
            session.wrong_answers += 1;
        }
        if mastery.is_some_and(|m| m.newly_mastered) {
            session.newly_mastered.push(word.clone());
        }
        log::debug!("answered {word:?}: correct={correct}");

        let feedback = AnswerFeedback {
            word,
            selected: selected.to_string(),
            correct,
            correct_meaning,
            phonetic: question.entry.phonetic.clone(),
            example: question.entry.primary_example().map(|s| s.to_string()),
            mastery,
        };

        let state = std::mem::replace(&mut self.state, SessionState::NotStarted);
        if let SessionState::Presenting(question) = state {
            self.state = SessionState::Feedback {
                question,
                feedback: feedback.clone(),
            };
        }
        Ok(Some(feedback))
    }

    /// Move past the answered word. Only valid while showing feedback.
    pub fn advance(&mut self) -> Result<&SessionState, ReviewError> {
        let (SessionState::Feedback { .. }, Some(session)) = (&self.state, self.session.as_mut())
        else {
            return Err(ReviewError::InvalidTransition {
                from: self.state.name(),
                action: "advance",
            });
        };

        session.current_index += 1;
        session.selected_option = None;

        if session.current_index >= session.words.len() {
            let summary = ReviewSummary::new(
                session.mode,
                session.words.len(),
                session.correct_answers,
                session.wrong_answers,
                std::mem::take(&mut session.newly_mastered),
            );
            log::debug!(
                "review complete: {} correct, {} wrong",
                summary.correct_answers,
                summary.wrong_answers
            );
            self.session = None;
            self.state = SessionState::Completed(summary);
        } else {
            let question =
                make_question(&session.words, session.current_index, &self.pool, &mut self.rng);
            self.state = SessionState::Presenting(question);
        }
        Ok(&self.state)
    }

    /// Drop the running session without a summary. Answers already
    /// submitted stay persisted. Returns true if a session was running.
    pub fn abandon(&mut self) -> bool {
        let was_running = self.session.take().is_some();
        if was_running {
            log::debug!("review abandoned");
        }
        self.state = SessionState::NotStarted;
        was_running
    }

    /// (1-based position, total words) of the running session.
    pub fn progress(&self) -> Option<(usize, usize)> {
        self.session
            .as_ref()
            .map(|s| ((s.current_index + 1).min(s.words.len()), s.words.len()))
    }

    /// Running (correct, wrong, accuracy %) of the current session.
    pub fn running_score(&self) -> Option<(u32, u32, u32)> {
        self.session.as_ref().map(|s| {
            (
                s.correct_answers,
                s.wrong_answers,
                accuracy_percent(s.correct_answers, s.correct_answers + s.wrong_answers),
            )
        })
    }
}

fn make_question<R: Rng + ?Sized>(
    words: &[WrongWordEntry],
    index: usize,
    pool: &ReferencePool,
    rng: &mut R,
) -> Question {
    let entry = words[index].clone();
    let options = distractor::generate_options(&entry, pool, rng);
    Question {
        entry,
        options,
        position: index + 1,
        total: words.len(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;
    use crate::store::repository::MemoryRepository;
    use crate::store::repository::testing::FailingRepository;
    use crate::store::schema::{Meaning, WordContent};

    fn entry(word: &str, meaning: &str) -> WrongWordEntry {
        WrongWordEntry::from_miss(
            WordContent {
                word: word.to_string(),
                phonetic: format!("/{word}/"),
                meanings: vec![Meaning {
                    part_of_speech: "n.".to_string(),
                    meaning: meaning.to_string(),
                    examples: vec![format!("{word} example")],
                }],
                difficulty: Default::default(),
            },
            Utc::now(),
        )
    }

    fn fixed_today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn controller(words: Vec<WrongWordEntry>) -> ReviewController<MemoryRepository, SmallRng> {
        let pool = ReferencePool::bundled("cet4").unwrap();
        ReviewController::new(
            MemoryRepository::with_words(words),
            pool,
            SmallRng::seed_from_u64(11),
        )
        .with_clock(fixed_today)
    }

    fn answer_current(ctl: &mut ReviewController<MemoryRepository, SmallRng>, right: bool) {
        let question = ctl.present_current().unwrap().clone();
        let choice = if right {
            question.correct_meaning().to_string()
        } else {
            question
                .options
                .iter()
                .find(|o| o.as_str() != question.correct_meaning())
                .cloned()
                .unwrap()
        };
        ctl.submit_answer(&choice).unwrap().unwrap();
    }

    #[test]
    fn empty_start_stays_not_started() {
        let mut ctl = controller(Vec::new());
        let err = ctl.start(Vec::new()).unwrap_err();
        assert!(matches!(err, ReviewError::NothingToReview));
        assert_eq!(ctl.state(), &SessionState::NotStarted);
        assert!(ctl.progress().is_none());
    }

    #[test]
    fn words_without_meanings_are_never_presented() {
        let mut bare = entry("hollow", "空的");
        bare.meanings.clear();
        let mut ctl = controller(vec![bare.clone()]);
        assert!(matches!(
            ctl.start(vec![bare.clone()]),
            Err(ReviewError::NothingToReview)
        ));

        ctl.start(vec![bare, entry("ability", "能力，才能")]).unwrap();
        let question = ctl.present_current().unwrap();
        assert_eq!(question.entry.word, "ability");
        assert_eq!((question.position, question.total), (1, 1));
        assert_eq!(question.options.len(), 4);
    }

    #[test]
    fn start_mode_with_everything_mastered_reports_nothing() {
        let mut e = entry("ability", "能力，才能");
        e.mastered = true;
        let mut ctl = controller(vec![e]);
        assert!(matches!(
            ctl.start_mode(&ReviewMode::Full),
            Err(ReviewError::NothingToReview)
        ));
        assert_eq!(ctl.state(), &SessionState::NotStarted);
    }

    #[test]
    fn present_is_idempotent() {
        let words = vec![entry("ability", "能力，才能")];
        let mut ctl = controller(words.clone());
        ctl.start(words).unwrap();
        let first = ctl.present_current().unwrap().clone();
        let second = ctl.present_current().unwrap().clone();
        assert_eq!(first, second);
        assert_eq!(first.options.len(), 4);
        assert_eq!((first.position, first.total), (1, 1));
    }

    #[test]
    fn one_right_one_wrong_is_fifty_percent() {
        let words = vec![entry("ability", "能力，才能"), entry("abroad", "在国外，到国外")];
        let mut ctl = controller(words.clone());
        ctl.start(words).unwrap();

        answer_current(&mut ctl, true);
        assert!(matches!(ctl.advance().unwrap(), SessionState::Presenting(_)));
        assert_eq!(ctl.progress(), Some((2, 2)));
        answer_current(&mut ctl, false);

        match ctl.advance().unwrap() {
            SessionState::Completed(summary) => {
                assert_eq!(summary.correct_answers, 1);
                assert_eq!(summary.wrong_answers, 1);
                assert_eq!(summary.accuracy, 50);
                assert_eq!(summary.total_words, 2);
            }
            other => panic!("expected completion, got {other:?}"),
        }
        assert!(ctl.progress().is_none());
        assert!(ctl.present_current().is_none());
    }

    #[test]
    fn double_submit_is_ignored() {
        let words = vec![entry("ability", "能力，才能")];
        let mut ctl = controller(words.clone());
        ctl.start(words).unwrap();

        answer_current(&mut ctl, false);
        let again = ctl.submit_answer("能力，才能").unwrap();
        assert!(again.is_none());

        let repo = ctl.store();
        assert_eq!(repo.review_stats.review_stats.total_attempts, 1);
        assert_eq!(repo.wrong_words[0].review_count, 1);
        assert_eq!(ctl.running_score(), Some((0, 1, 0)));
    }

    #[test]
    fn failed_store_write_keeps_question_and_retry_counts_once() {
        let words = vec![entry("ability", "能力，才能")];
        let mut repo = FailingRepository::new(MemoryRepository::with_words(words.clone()));
        repo.fail_stats_saves = 1;
        let pool = ReferencePool::bundled("cet4").unwrap();
        let mut ctl =
            ReviewController::new(repo, pool, SmallRng::seed_from_u64(11)).with_clock(fixed_today);
        ctl.start(words).unwrap();
        let question = ctl.present_current().unwrap().clone();

        let err = ctl.submit_answer("能力，才能").unwrap_err();
        assert!(matches!(err, ReviewError::Store(_)));
        assert_eq!(ctl.state(), &SessionState::Presenting(question));
        assert_eq!(ctl.running_score(), Some((0, 0, 0)));
        assert_eq!(ctl.store().inner.wrong_words[0].review_count, 0);
        assert_eq!(ctl.store().inner.review_stats.review_stats.total_attempts, 0);

        let feedback = ctl.submit_answer("能力，才能").unwrap().unwrap();
        assert!(feedback.correct);
        assert_eq!(feedback.mastery.unwrap().consecutive_correct, 1);
        let repo = &ctl.store().inner;
        assert_eq!(repo.wrong_words[0].review_count, 1);
        assert_eq!(repo.wrong_words[0].consecutive_correct, 1);
        assert_eq!(repo.review_stats.review_stats.total_attempts, 1);
        assert_eq!(ctl.running_score(), Some((1, 0, 100)));
    }

    #[test]
    fn advance_before_answer_is_rejected() {
        let words = vec![entry("ability", "能力，才能")];
        let mut ctl = controller(words.clone());
        ctl.start(words).unwrap();
        let err = ctl.advance().unwrap_err();
        assert!(matches!(err, ReviewError::InvalidTransition { action: "advance", .. }));
        assert!(matches!(ctl.state(), SessionState::Presenting(_)));
    }

    #[test]
    fn submit_without_session_is_rejected() {
        let mut ctl = controller(Vec::new());
        assert!(ctl.submit_answer("x").is_err());
    }

    #[test]
    fn feedback_carries_word_details() {
        let words = vec![entry("ability", "能力，才能")];
        let mut ctl = controller(words.clone());
        ctl.start(words).unwrap();
        let feedback = ctl.submit_answer("wrong").unwrap().unwrap();
        assert!(!feedback.correct);
        assert_eq!(feedback.correct_meaning, "能力，才能");
        assert_eq!(feedback.phonetic, "/ability/");
        assert_eq!(feedback.example.as_deref(), Some("ability example"));
        assert_eq!(feedback.mastery.unwrap().consecutive_correct, 0);
    }

    #[test]
    fn three_single_drills_master_word_once() {
        let words = vec![entry("ability", "能力，才能")];
        let mut ctl = controller(words);

        for round in 0..4 {
            ctl.start_mode(&ReviewMode::Single("ability".into())).unwrap();
            answer_current(&mut ctl, true);
            if let SessionState::Completed(summary) = ctl.advance().unwrap() {
                let expect: Vec<String> = if round == 2 {
                    vec!["ability".to_string()]
                } else {
                    Vec::new()
                };
                assert_eq!(summary.newly_mastered, expect);
            }
        }

        let repo = ctl.store();
        assert!(repo.wrong_words[0].mastered);
        assert_eq!(repo.wrong_words[0].consecutive_correct, 4);
        assert_eq!(repo.review_stats.review_stats.mastered_count, 1);
    }

    #[test]
    fn abandon_keeps_submitted_answers() {
        let words = vec![entry("ability", "能力，才能"), entry("abroad", "在国外，到国外")];
        let mut ctl = controller(words);
        ctl.start_mode(&ReviewMode::Full).unwrap();
        answer_current(&mut ctl, true);

        assert!(ctl.abandon());
        assert_eq!(ctl.state(), &SessionState::NotStarted);
        assert!(!ctl.abandon());

        let repo = ctl.into_store();
        assert_eq!(repo.wrong_words[0].consecutive_correct, 1);
        assert_eq!(repo.review_stats.review_stats.total_attempts, 1);
        assert_eq!(repo.review_stats.last_review_date, Some(fixed_today()));
    }

    #[test]
    fn wrong_answer_keeps_mastery() {
        let mut mastered = entry("ability", "能力，才能");
        mastered.mastered = true;
        mastered.consecutive_correct = 3;
        let mut ctl = controller(vec![mastered]);
        ctl.start_mode(&ReviewMode::Single("ability".into())).unwrap();
        answer_current(&mut ctl, false);

        let repo = ctl.store();
        assert!(repo.wrong_words[0].mastered);
        assert_eq!(repo.wrong_words[0].consecutive_correct, 0);
    }
}
