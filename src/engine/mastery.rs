use crate::store::schema::WrongWordEntry;

/// Consecutive correct review answers needed to master a word.
pub const MASTERY_THRESHOLD: u32 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MasteryOutcome {
    pub consecutive_correct: u32,
    pub mastered: bool,
    /// True only on the answer that flipped the word from not-mastered to mastered.
    pub newly_mastered: bool,
}

/// Apply one review answer to an entry.
///
/// A wrong answer resets the streak but never revokes mastery; only a miss in
/// the reciting flow does that (see `notebook::record_miss`).
pub fn apply_answer(entry: &mut WrongWordEntry, correct: bool) -> MasteryOutcome {
    entry.review_count += 1;

    let mut newly_mastered = false;
    if correct {
        entry.consecutive_correct += 1;
        if entry.consecutive_correct >= MASTERY_THRESHOLD && !entry.mastered {
            entry.mastered = true;
            newly_mastered = true;
        }
    } else {
        entry.consecutive_correct = 0;
    }

    MasteryOutcome {
        consecutive_correct: entry.consecutive_correct,
        mastered: entry.mastered,
        newly_mastered,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::store::schema::{Meaning, WordContent};

    fn entry(word: &str) -> WrongWordEntry {
        WrongWordEntry::from_miss(
            WordContent {
                word: word.to_string(),
                phonetic: String::new(),
                meanings: vec![Meaning {
                    part_of_speech: "v.".to_string(),
                    meaning: "放弃".to_string(),
                    examples: Vec::new(),
                }],
                difficulty: Default::default(),
            },
            Utc::now(),
        )
    }

    #[test]
    fn three_correct_in_a_row_masters_once() {
        let mut e = entry("abandon");
        assert!(!apply_answer(&mut e, true).newly_mastered);
        assert!(!apply_answer(&mut e, true).newly_mastered);
        let third = apply_answer(&mut e, true);
        assert!(third.newly_mastered);
        assert!(e.mastered);

        // Further correct answers keep counting but never re-promote
        let fourth = apply_answer(&mut e, true);
        assert!(!fourth.newly_mastered);
        assert_eq!(fourth.consecutive_correct, 4);
        assert_eq!(e.review_count, 4);
    }

    #[test]
    fn wrong_answer_resets_streak_but_keeps_mastery() {
        let mut e = entry("abandon");
        for _ in 0..3 {
            apply_answer(&mut e, true);
        }
        let outcome = apply_answer(&mut e, false);
        assert_eq!(outcome.consecutive_correct, 0);
        assert!(outcome.mastered);
        assert!(e.mastered);
        assert_eq!(e.review_count, 4);
    }

    #[test]
    fn interrupted_streak_does_not_master() {
        let mut e = entry("abandon");
        apply_answer(&mut e, true);
        apply_answer(&mut e, true);
        apply_answer(&mut e, false);
        apply_answer(&mut e, true);
        apply_answer(&mut e, true);
        assert!(!e.mastered);
        assert_eq!(e.consecutive_correct, 2);
        assert!(apply_answer(&mut e, true).newly_mastered);
    }
}
