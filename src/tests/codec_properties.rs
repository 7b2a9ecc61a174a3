use crate::dictionary::GlyphEntry;
use crate::miner::mine;
use crate::pool::seeded_pool;
use crate::session::{GlyphSession, TrainOptions};
use crate::tokenizer::tokenize;
use crate::trie::{decode, encode, GlyphTrie};
use proptest::prelude::*;

const VOCABULARY: [&str; 6] = ["the", "cat", "sat", "on", "mat", "a"];

fn words() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(prop::sample::select(VOCABULARY.to_vec()), 0..80)
        .prop_map(|ws| ws.into_iter().map(String::from).collect())
}

/// Maps fuzz bytes onto a small vocabulary so phrases repeat.
fn bytes_to_words(input: &[u8]) -> Vec<String> {
    input
        .iter()
        .map(|b| VOCABULARY[*b as usize % VOCABULARY.len()].to_string())
        .collect()
}

proptest! {
    /// Property 1: Roundtrip fidelity
    /// Decoding an encoded stream restores the tokens when glyphs and
    /// literals are disjoint.
    #[test]
    fn prop_trie_roundtrip(tokens in words(), phrases in prop::collection::vec(words(), 0..8)) {
        let entries: Vec<GlyphEntry> = phrases
            .into_iter()
            .filter(|p| !p.is_empty())
            .enumerate()
            .map(|(i, p)| GlyphEntry::new(1, p, format!("~{i}")))
            .collect();
        let trie = GlyphTrie::build(&entries);

        let encoded = encode(&tokens, &trie);
        prop_assert!(encoded.len() <= tokens.len());
        prop_assert_eq!(decode(&encoded, &entries), tokens);
    }

    /// Property 2: Session roundtrip
    /// Whatever a session learns, it decodes its own output.
    #[test]
    fn prop_session_roundtrip(tokens in words(), depth in 1u32..4) {
        let text = tokens.join(" ");
        let mut session = GlyphSession::new(TrainOptions { top: 16, ..TrainOptions::default() });
        session.train_layered(&text, depth).unwrap();

        let encoded = session.encode_text(&text);
        prop_assert_eq!(session.decode(&encoded), tokens);
    }

    /// Property 3: Mining is deterministic and ranked
    #[test]
    fn prop_mining_sorted(tokens in words()) {
        let first = mine(&tokens, 2, 4);
        prop_assert_eq!(&first, &mine(&tokens, 2, 4));

        for pair in first.windows(2) {
            prop_assert!(pair[0].gain >= pair[1].gain);
            prop_assert!(pair[1].gain > 0);
        }
    }

    /// Property 4: Frequencies are exact window counts
    #[test]
    fn prop_mining_counts(tokens in words()) {
        for candidate in mine(&tokens, 2, 3) {
            let n = candidate.phrase.len();
            let count = tokens.windows(n).filter(|w| *w == candidate.phrase.as_slice()).count();
            prop_assert_eq!(candidate.frequency as usize, count);
        }
    }

    /// Property 5: Tokenizer output is stable under re-tokenization
    #[test]
    fn prop_tokenize_idempotent(text in ".{0,200}") {
        let once = tokenize(&text);
        prop_assert_eq!(tokenize(&once.join(" ")), once.clone());
        for token in &once {
            prop_assert!(!token.is_empty());
            prop_assert!(token.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '\''));
        }
    }

    /// Property 6: Pools depend only on their seed
    #[test]
    fn prop_pool_reproducible(seed in "[a-z]{0,8}") {
        prop_assert_eq!(seeded_pool("~", 1, &seed), seeded_pool("~", 1, &seed));
    }
}

/// Bolero fuzz test: No panics and exact roundtrip on arbitrary input
#[cfg(test)]
#[test]
fn fuzz_session_roundtrip() {
    bolero::check!().with_type::<Vec<u8>>().for_each(|input| {
        let tokens = bytes_to_words(input);
        let text = tokens.join(" ");

        let mut session = GlyphSession::new(TrainOptions {
            top: 8,
            ..TrainOptions::default()
        });
        session.train_layered(&text, 2).unwrap();

        let encoded = session.encode_text(&text);
        assert!(encoded.len() <= tokens.len());
        assert_eq!(session.decode(&encoded), tokens);
    });
}

/// Bolero fuzz test: Arbitrary text never panics the tokenizer or miner
#[cfg(test)]
#[test]
fn fuzz_tokenize_and_mine() {
    bolero::check!().with_type::<String>().for_each(|text| {
        let tokens = tokenize(text);
        let _ = mine(&tokens, 1, 5);
    });
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_longest_match_scenario() {
        let entries = vec![
            GlyphEntry::new(1, vec!["a".into(), "b".into()], "X"),
            GlyphEntry::new(1, vec!["a".into(), "b".into(), "c".into()], "Y"),
        ];
        let trie = GlyphTrie::build(&entries);
        let tokens: Vec<String> = vec!["a".into(), "b".into(), "c".into()];
        assert_eq!(encode(&tokens, &trie), vec!["Y".to_string()]);
    }

    #[test]
    fn test_packed_session_output() {
        let text = "we the people of the united states, we the people";
        let mut session = GlyphSession::default();
        session.train(text).unwrap();

        let bytes = session.pack_text(text).unwrap();
        let (dictionary, stream) = crate::pack::unpack(&bytes).unwrap();
        assert_eq!(&dictionary, session.dictionary());
        assert_eq!(session.decode(&stream), tokenize(text));
    }
}
