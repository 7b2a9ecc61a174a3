//! Deterministic glyph pools.
//!
//! A pool is every marker-prefixed string of length `1..=levels` over
//! [`SAFE_ALPHABET`], shuffled by a seeded Fisher-Yates pass. The hash, PRNG
//! and shuffle are fixed so that any decoder regenerating a pool from the
//! same seed gets the same order as the trainer did.

use serde::{Deserialize, Serialize};

/// Characters glyph bodies are drawn from.
///
/// Letters, digits and punctuation that survives JSON, HTML and shell
/// contexts: no quotes, backslash, angle brackets or ampersand, and none of
/// the separators `,` `|` `{` `}` `~`.
pub const SAFE_ALPHABET: &str =
    "!#$%()*+-./:;=?@[]^_ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// First code point of the block used by [`GlyphAlphabet::Unicode`].
const UNICODE_BLOCK_START: u32 = 0x4E00;
/// Number of code points in that block.
const UNICODE_BLOCK_LEN: u32 = 0x9FFF - 0x4E00 + 1;

/// Which symbol family a session draws glyphs from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GlyphAlphabet {
    /// Marker-prefixed ASCII strings from [`ascii_glyph_pool`].
    #[default]
    Ascii,
    /// Single CJK ideographs, no marker.
    Unicode,
}

/// Enumerates the unshuffled ASCII pool: all level-1 strings, then level 2,
/// and so on, each prefixed with `prefix`.
pub fn ascii_glyph_pool(prefix: &str, levels: usize) -> Vec<String> {
    let alphabet: Vec<char> = SAFE_ALPHABET.chars().collect();
    let mut pool = Vec::new();
    let mut previous: Vec<String> = vec![String::new()];

    for _ in 0..levels {
        let mut current = Vec::with_capacity(previous.len() * alphabet.len());
        for stem in &previous {
            for &c in &alphabet {
                let mut body = stem.clone();
                body.push(c);
                current.push(body);
            }
        }
        pool.extend(current.iter().map(|body| format!("{prefix}{body}")));
        previous = current;
    }

    pool
}

/// Enumerates the unshuffled Unicode pool, capped at `limit` glyphs.
pub fn unicode_glyph_pool(limit: usize) -> Vec<String> {
    (UNICODE_BLOCK_START..UNICODE_BLOCK_START + UNICODE_BLOCK_LEN)
        .filter_map(char::from_u32)
        .take(limit)
        .map(String::from)
        .collect()
}

/// 32-bit FNV-1a over the UTF-8 bytes of `seed`.
pub fn fnv1a32(seed: &str) -> u32 {
    let mut hash: u32 = 0x811c_9dc5;
    for byte in seed.bytes() {
        hash ^= byte as u32;
        hash = hash.wrapping_mul(0x0100_0193);
    }
    hash
}

/// Mulberry32, a small 32-bit generator with a fully specified output.
#[derive(Debug, Clone)]
pub struct Mulberry32 {
    state: u32,
}

impl Mulberry32 {
    /// Creates a generator from a 32-bit seed.
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Advances the state and returns the next output.
    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(0x6D2B_79F5);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        t ^ (t >> 14)
    }

    /// Uniform index in `0..bound`, computed as `floor(next / 2^32 * bound)`
    /// in exact integer arithmetic.
    pub fn next_index(&mut self, bound: usize) -> usize {
        ((self.next_u32() as u64 * bound as u64) >> 32) as usize
    }
}

/// Fisher-Yates shuffle driven by `Mulberry32(fnv1a32(seed))`.
pub fn shuffle_with_seed<T>(items: &mut [T], seed: &str) {
    let mut rng = Mulberry32::new(fnv1a32(seed));
    for i in (1..items.len()).rev() {
        let j = rng.next_index(i + 1);
        items.swap(i, j);
    }
}

/// The shuffled ASCII pool for `prefix`, `levels` and `seed`.
pub fn seeded_pool(prefix: &str, levels: usize, seed: &str) -> Vec<String> {
    let mut pool = ascii_glyph_pool(prefix, levels);
    shuffle_with_seed(&mut pool, seed);
    pool
}

/// The shuffled pool for any alphabet. `levels` only applies to ASCII.
pub fn pool_for(alphabet: GlyphAlphabet, prefix: &str, levels: usize, seed: &str) -> Vec<String> {
    match alphabet {
        GlyphAlphabet::Ascii => seeded_pool(prefix, levels, seed),
        GlyphAlphabet::Unicode => {
            let mut pool = unicode_glyph_pool(UNICODE_BLOCK_LEN as usize);
            shuffle_with_seed(&mut pool, seed);
            pool
        }
    }
}
