//! # Fractal Glyph - Phrase Compression on a Sierpinski Address Space
//!
//! Compresses text by replacing recurring word phrases with short glyphs and
//! gives every emitted symbol an address in a self-similar triangle.
//!
//! The pipeline:
//! 1. **Tokenize** text into lowercase words.
//! 2. **Mine** n-grams and rank them by estimated character savings.
//! 3. **Assign** glyphs from a seeded, reproducible pool.
//! 4. **Encode** with a greedy longest-match trie, optionally in layers.
//! 5. **Induce** grammar rules from frequent adjacent pairs (RePair, then
//!    Sequitur), accepting a rule only if its MDL gain is positive.
//! 6. **Address** every output symbol with a base-3 code that maps exactly
//!    to a point of the Sierpinski subdivision.
//!
//! ## Example
//!
//! ```
//! use fractal_glyph::{tokenize, GlyphSession, TrainOptions};
//!
//! let text = "the cat sat on the mat. the cat sat on the hat.";
//! let mut session = GlyphSession::new(TrainOptions::default());
//! session.train(text).unwrap();
//!
//! let encoded = session.encode_text(text);
//! assert!(encoded.len() < tokenize(text).len());
//! assert_eq!(session.decode(&encoded), tokenize(text));
//! ```
//!
//! Addresses invert exactly:
//!
//! ```
//! use fractal_glyph::{address_to_point, point_to_address};
//!
//! let point = address_to_point("0212").unwrap();
//! assert_eq!(point_to_address(point, 4).unwrap(), "0212");
//! ```

mod address;
mod dictionary;
mod error;
mod grammar;
mod induction;
mod ingest;
mod iter;
mod mdl;
mod miner;
mod pack;
mod pool;
mod session;
mod symbol;
mod tokenizer;
mod trie;

#[cfg(test)]
mod tests;

pub use address::{
    address_to_point, address_triangle, from_base3, min_depth_for_slots, point_to_address, pow3,
    prefix_range, to_base3, Point, Triangle, MAX_ADDRESS_DEPTH,
};
pub use dictionary::{GlyphDictionary, GlyphEntry};
pub use error::{GlyphError, Result};
pub use grammar::{Child, Grammar, GrammarReport, Rule};
pub use induction::{
    induce, induce_tokens, InductionConfig, InductionOutcome, PairInducer, Phase, StopReason,
    Strategy, ESTIMATED_SYMBOL_LEN,
};
pub use ingest::{AddressedToken, DocumentBounds, Ingestor, MemorySink, TokenSink};
pub use iter::Expand;
pub use mdl::{
    accepts, find_best_rule, mdl_gain, rule_cost, rule_savings, RuleShape, DEFINITION_OVERHEAD,
};
pub use miner::{glyph_length_for_rank, mine, phrase_gain, Candidate};
pub use pack::{pack, unpack, MAGIC};
pub use pool::{
    ascii_glyph_pool, fnv1a32, pool_for, seeded_pool, shuffle_with_seed, unicode_glyph_pool,
    GlyphAlphabet, Mulberry32, SAFE_ALPHABET,
};
pub use session::{train, train_layered, CodecStats, GlyphSession, TrainOptions};
pub use tokenizer::tokenize;
pub use trie::{decode, encode, GlyphTrie, ReverseMap};
