use std::collections::HashSet;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::generator::reference_pool::ReferencePool;
use crate::store::schema::WrongWordEntry;

pub const DISTRACTOR_COUNT: usize = 3;

/// Multiple-choice meanings for `target`: the correct meaning plus up to three
/// distractors from `pool`, in random order.
///
/// Candidates share neither the target's word nor its correct meaning. A pool
/// with fewer than three candidates yields fewer options.
pub fn generate_options<R: Rng + ?Sized>(
    target: &WrongWordEntry,
    pool: &ReferencePool,
    rng: &mut R,
) -> Vec<String> {
    let Some(correct) = target.primary_meaning() else {
        return Vec::new();
    };

    // Vec keeps pool order so a seeded rng picks the same options
    let mut seen: HashSet<&str> = HashSet::from([correct]);
    let mut candidates: Vec<&str> = Vec::new();
    for entry in pool.entries() {
        let meaning = entry.meaning.as_str();
        if entry.word != target.word && seen.insert(meaning) {
            candidates.push(meaning);
        }
    }

    let mut options: Vec<String> = Vec::with_capacity(DISTRACTOR_COUNT + 1);
    options.push(correct.to_string());
    options.extend(
        candidates
            .choose_multiple(rng, DISTRACTOR_COUNT)
            .map(|m| m.to_string()),
    );
    options.shuffle(rng);
    options
}
