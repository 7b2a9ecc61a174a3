//! Phrase mining: n-gram counting with estimated substitution savings.

use crate::pool::SAFE_ALPHABET;
use ahash::AHashMap as HashMap;
use std::cmp::Ordering;
use tracing::debug;

/// Separator used to build phrase keys; never produced by the tokenizer.
const KEY_SEPARATOR: char = '\u{1f}';

/// A mined phrase with its corpus frequency and estimated savings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub phrase: Vec<String>,
    pub frequency: u32,
    /// Length of the phrase joined by single spaces.
    pub byte_size: usize,
    pub gain: i64,
}

impl Candidate {
    /// The phrase joined by single spaces.
    pub fn text(&self) -> String {
        self.phrase.join(" ")
    }
}

/// Estimated glyph length for the candidate accepted at `rank`.
///
/// Mirrors drawing marker-prefixed glyphs from the pool shortest first: one
/// alphabet character while they last, then two, then three. This is an
/// approximation, since the rank is taken before the final ordering is known.
pub fn glyph_length_for_rank(rank: usize) -> usize {
    let alphabet = SAFE_ALPHABET.len();
    if rank < alphabet {
        2
    } else if rank < alphabet + alphabet * alphabet {
        3
    } else {
        4
    }
}

/// Savings of replacing a phrase of `chars` characters by a glyph of
/// `glyph_length` characters at every one of `frequency` occurrences.
pub fn phrase_gain(chars: usize, glyph_length: usize, frequency: u32) -> i64 {
    (chars as i64 - glyph_length as i64) * frequency as i64
}

/// Mines every n-gram with `n_min <= n <= n_max` and ranks those with a
/// positive gain.
///
/// Rank estimation walks distinct phrases in first-occurrence order, shorter
/// windows first. The result is sorted by gain descending, then longer
/// phrases first, then the space-joined phrase ascending.
pub fn mine(tokens: &[String], n_min: usize, n_max: usize) -> Vec<Candidate> {
    let n_min = n_min.max(1);
    if tokens.len() < n_min || n_min > n_max {
        return Vec::new();
    }

    let mut index: HashMap<String, usize> = HashMap::default();
    let mut counted: Vec<(&[String], u32)> = Vec::new();

    for n in n_min..=n_max.min(tokens.len()) {
        for window in tokens.windows(n) {
            let key = phrase_key(window);
            match index.get(&key) {
                Some(&slot) => counted[slot].1 += 1,
                None => {
                    index.insert(key, counted.len());
                    counted.push((window, 1));
                }
            }
        }
    }

    let mut accepted: Vec<Candidate> = Vec::new();
    for (phrase, frequency) in counted {
        let byte_size = joined_len(phrase);
        let gain = phrase_gain(byte_size, glyph_length_for_rank(accepted.len()), frequency);
        if gain > 0 {
            accepted.push(Candidate {
                phrase: phrase.to_vec(),
                frequency,
                byte_size,
                gain,
            });
        }
    }

    accepted.sort_by(compare_candidates);

    debug!(
        tokens = tokens.len(),
        n_min,
        n_max,
        distinct = index.len(),
        candidates = accepted.len(),
        "mined phrases"
    );

    accepted
}

/// Total order used to rank candidates.
fn compare_candidates(a: &Candidate, b: &Candidate) -> Ordering {
    b.gain
        .cmp(&a.gain)
        .then_with(|| b.phrase.len().cmp(&a.phrase.len()))
        .then_with(|| a.text().cmp(&b.text()))
}

fn phrase_key(phrase: &[String]) -> String {
    let mut key = String::new();
    for (i, token) in phrase.iter().enumerate() {
        if i > 0 {
            key.push(KEY_SEPARATOR);
        }
        key.push_str(token);
    }
    key
}

/// Character length of `phrase` joined by single spaces.
pub(crate) fn joined_len(phrase: &[String]) -> usize {
    let chars: usize = phrase.iter().map(|t| t.chars().count()).sum();
    chars + phrase.len().saturating_sub(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize;

    fn toks(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_glyph_length_tiers() {
        assert_eq!(glyph_length_for_rank(0), 2);
        assert_eq!(glyph_length_for_rank(81), 2);
        assert_eq!(glyph_length_for_rank(82), 3);
        assert_eq!(glyph_length_for_rank(82 + 82 * 82 - 1), 3);
        assert_eq!(glyph_length_for_rank(82 + 82 * 82), 4);
    }

    #[test]
    fn test_short_input_yields_nothing() {
        assert!(mine(&toks(&["a"]), 2, 3).is_empty());
        assert!(mine(&[], 1, 1).is_empty());
    }

    #[test]
    fn test_scenario_top_candidate() {
        let tokens = tokenize("the cat sat. the cat ran.");
        let candidates = mine(&tokens, 2, 2);

        let top = &candidates[0];
        assert_eq!(top.phrase, toks(&["the", "cat"]));
        assert_eq!(top.frequency, 2);
        assert_eq!(top.byte_size, 7);
        assert_eq!(top.gain, 10);
        assert!(candidates[1..].iter().all(|c| c.gain < top.gain));
    }

    #[test]
    fn test_repeated_bigram() {
        let tokens: Vec<String> = (0..50).flat_map(|_| toks(&["x", "y"])).collect();
        let candidates = mine(&tokens, 2, 2);

        let xy = &candidates[0];
        assert_eq!(xy.phrase, toks(&["x", "y"]));
        assert_eq!(xy.frequency, 50);
        assert_eq!(xy.gain, (3 - 2) * 50);

        // The interleaved "y x" bigram is the only other phrase.
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[1].frequency, 49);
    }

    #[test]
    fn test_non_positive_gain_discarded() {
        // A single one-character token never beats a two-character glyph.
        assert!(mine(&toks(&["a"]), 1, 1).is_empty());
        assert_eq!(phrase_gain(3, 3, 1), 0);
        assert!(phrase_gain(3, 4, 7) < 0);
    }

    #[test]
    fn test_ties_prefer_longer_then_lexicographic() {
        // "ab cd" (5 chars) twice and "a b c" (5 chars, 3 tokens) twice tie on gain.
        let tokens = toks(&["ab", "cd", "q", "ab", "cd", "r", "a", "b", "c", "s", "a", "b", "c"]);
        let candidates = mine(&tokens, 2, 3);
        let top_gain = candidates[0].gain;
        let tied: Vec<String> = candidates
            .iter()
            .filter(|c| c.gain == top_gain)
            .map(Candidate::text)
            .collect();
        assert_eq!(tied.first().map(String::as_str), Some("a b c"));
    }

    #[test]
    fn test_deterministic() {
        let tokens = tokenize("one two three one two three four one two");
        assert_eq!(mine(&tokens, 2, 4), mine(&tokens, 2, 4));
    }

    #[test]
    fn test_key_avoids_boundary_collisions() {
        // "a b" + "c" must not collide with "a" + "b c" when joined naively.
        let tokens = toks(&["a b", "c", "a", "b c"]);
        let candidates = mine(&tokens, 2, 2);
        assert!(candidates.iter().all(|c| c.frequency == 1));
    }
}
