//! Caller-owned training and coding context.
//!
//! A [`GlyphSession`] holds everything the codec needs between calls: the
//! options, the glyph dictionary and one trie per trained layer. Nothing is
//! kept in process-wide state.

use crate::dictionary::{GlyphDictionary, GlyphEntry};
use crate::error::{GlyphError, Result};
use crate::grammar::{Child, Grammar};
use crate::induction::{induce_tokens, InductionConfig, InductionOutcome};
use crate::miner::mine;
use crate::pack::pack;
use crate::pool::{pool_for, GlyphAlphabet};
use crate::tokenizer::tokenize;
use crate::trie::{GlyphTrie, ReverseMap};
use ahash::AHashSet as HashSet;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Training options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainOptions {
    /// Candidates kept per layer. Default: 256.
    pub top: usize,
    /// Shortest mined phrase, in tokens. Default: 2.
    pub n_min: usize,
    /// Longest mined phrase, in tokens. Default: 5.
    pub n_max: usize,
    /// Marker prepended to ASCII glyphs. Must be non-empty and free of
    /// whitespace. Default: "~".
    pub prefix: String,
    /// Longest ASCII glyph body, `1..=MAX_LEVELS`. Default: 2.
    pub levels: usize,
    /// Pool shuffle seed. Default: "glyph".
    pub seed: String,
    pub alphabet: GlyphAlphabet,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            top: 256,
            n_min: 2,
            n_max: 5,
            prefix: "~".to_owned(),
            levels: 2,
            seed: "glyph".to_owned(),
            alphabet: GlyphAlphabet::Ascii,
        }
    }
}

impl TrainOptions {
    /// Longest ASCII glyph body a pool is built for.
    pub const MAX_LEVELS: usize = 3;

    /// Parses options from JSON, filling in defaults, and validates them.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Rejects options that would yield glyphs the dictionary cannot
    /// persist, or a pool too large to build.
    pub fn validate(&self) -> Result<()> {
        if self.prefix.is_empty() || self.prefix.chars().any(char::is_whitespace) {
            return Err(GlyphError::InvalidOptions(format!(
                "glyph prefix {:?} must be non-empty without whitespace",
                self.prefix
            )));
        }
        if self.levels == 0 || self.levels > Self::MAX_LEVELS {
            return Err(GlyphError::InvalidOptions(format!(
                "levels must be in 1..={}, got {}",
                Self::MAX_LEVELS,
                self.levels
            )));
        }
        if self.n_min == 0 || self.n_min > self.n_max {
            return Err(GlyphError::InvalidOptions(format!(
                "phrase lengths {}..={} are empty",
                self.n_min, self.n_max
            )));
        }
        Ok(())
    }
}

/// Size of a text before and after encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecStats {
    pub input_tokens: usize,
    pub encoded_tokens: usize,
    /// Bytes of the space-joined token stream.
    pub input_bytes: usize,
    pub encoded_bytes: usize,
    pub dictionary_entries: usize,
}

impl CodecStats {
    /// Encoded bytes as a percentage of input bytes. Lower is better.
    pub fn compression_ratio(&self) -> f64 {
        if self.input_bytes == 0 {
            0.0
        } else {
            (self.encoded_bytes as f64 / self.input_bytes as f64) * 100.0
        }
    }
}

/// Hands out pool glyphs shortest first, never the same one twice.
struct GlyphAllocator {
    pool: Vec<String>,
    cursor: usize,
}

impl GlyphAllocator {
    fn new(options: &TrainOptions) -> Self {
        let mut pool = pool_for(options.alphabet, &options.prefix, options.levels, &options.seed);
        pool.sort_by_key(|glyph| glyph.chars().count());
        Self { pool, cursor: 0 }
    }

    fn next(&mut self, taken: impl Fn(&str) -> bool) -> Option<String> {
        while let Some(glyph) = self.pool.get(self.cursor) {
            self.cursor += 1;
            if !taken(glyph) {
                return Some(glyph.clone());
            }
        }
        None
    }
}

struct LayerCodec {
    trie: GlyphTrie,
    reverse: ReverseMap,
}

impl LayerCodec {
    fn new(entries: &[GlyphEntry]) -> Self {
        Self {
            trie: GlyphTrie::build(entries),
            reverse: ReverseMap::build(entries),
        }
    }
}

/// Training and coding context owned by the caller.
pub struct GlyphSession {
    options: TrainOptions,
    dictionary: GlyphDictionary,
    /// `layers[k]` codes layer `k + 1`.
    layers: Vec<LayerCodec>,
}

impl GlyphSession {
    /// Creates an untrained session.
    pub fn new(options: TrainOptions) -> Self {
        Self {
            options,
            dictionary: GlyphDictionary::new(),
            layers: Vec::new(),
        }
    }

    /// A session coding with an existing dictionary.
    pub fn with_dictionary(options: TrainOptions, dictionary: GlyphDictionary) -> Self {
        let mut session = Self::new(options);
        session.set_dictionary(dictionary);
        session
    }

    /// Replaces the dictionary and rebuilds the per-layer tries.
    pub fn set_dictionary(&mut self, dictionary: GlyphDictionary) {
        self.layers = (1..=dictionary.max_layer())
            .map(|layer| LayerCodec::new(&dictionary.layer(layer)))
            .collect();
        self.dictionary = dictionary;
    }

    /// Options this session trains with.
    pub fn options(&self) -> &TrainOptions {
        &self.options
    }

    /// The current dictionary, in training order.
    pub fn dictionary(&self) -> &GlyphDictionary {
        &self.dictionary
    }

    /// Number of trained layers.
    pub fn layer_depth(&self) -> usize {
        self.layers.len()
    }

    /// Single-layer training. Discards any previous dictionary.
    pub fn train(&mut self, text: &str) -> Result<Vec<GlyphEntry>> {
        Ok(self.train_layered(text, 1)?.entries().to_vec())
    }

    /// Trains up to `depth` layers: layer 1 over the raw tokens, layer `k`
    /// over the stream already encoded by layers `1..k`. Stops early when a
    /// layer finds nothing worth replacing. Discards any previous dictionary.
    ///
    /// Fails with [`GlyphError::InvalidOptions`] before touching the
    /// dictionary if the session options do not validate.
    pub fn train_layered(&mut self, text: &str, depth: u32) -> Result<&GlyphDictionary> {
        self.options.validate()?;
        self.dictionary.clear();
        self.layers.clear();

        let mut allocator = GlyphAllocator::new(&self.options);
        let mut stream = tokenize(text);
        let input_tokens = stream.len();

        for layer in 1..=depth {
            let candidates = mine(&stream, self.options.n_min, self.options.n_max);
            if candidates.is_empty() {
                if layer > 1 {
                    warn!(layer, "no candidates, layered training stops early");
                }
                break;
            }

            let entries = {
                let vocabulary: HashSet<&str> = stream.iter().map(String::as_str).collect();
                let mut entries = Vec::with_capacity(self.options.top.min(candidates.len()));
                for candidate in candidates.into_iter().take(self.options.top) {
                    let Some(glyph) = allocator.next(|g| vocabulary.contains(g)) else {
                        warn!(layer, assigned = entries.len(), "glyph pool exhausted");
                        break;
                    };
                    entries.push(GlyphEntry {
                        layer,
                        phrase: candidate.phrase,
                        glyph,
                        gain: Some(candidate.gain),
                    });
                }
                entries
            };

            let codec = LayerCodec::new(&entries);
            stream = codec.trie.encode(&stream);
            debug!(layer, entries = entries.len(), stream = stream.len(), "trained layer");

            self.dictionary.extend(entries);
            self.layers.push(codec);
        }

        info!(
            input_tokens,
            encoded_tokens = stream.len(),
            layers = self.layers.len(),
            entries = self.dictionary.len(),
            "training finished"
        );

        Ok(&self.dictionary)
    }

    /// Applies every layer in order.
    pub fn encode_tokens(&self, tokens: &[String]) -> Vec<String> {
        self.encode_up_to(tokens, self.layers.len())
    }

    /// Applies layers `1..=layer` only.
    pub fn encode_up_to(&self, tokens: &[String], layer: usize) -> Vec<String> {
        self.layers
            .iter()
            .take(layer)
            .fold(tokens.to_vec(), |stream, codec| codec.trie.encode(&stream))
    }

    /// Tokenizes `text` and encodes it with every layer.
    pub fn encode_text(&self, text: &str) -> Vec<String> {
        self.encode_tokens(&tokenize(text))
    }

    /// Inverts [`GlyphSession::encode_tokens`], highest layer first.
    /// Unknown tokens pass through unchanged.
    pub fn decode(&self, tokens: &[String]) -> Vec<String> {
        self.layers
            .iter()
            .rev()
            .fold(tokens.to_vec(), |stream, codec| codec.reverse.decode(&stream))
    }

    /// Encodes `text` and runs pair induction over the glyph stream.
    pub fn induce(
        &self,
        text: &str,
        grammar: &mut Grammar,
        config: &InductionConfig,
    ) -> Result<InductionOutcome> {
        induce_tokens(grammar, &self.encode_text(text), config)
    }

    /// Expands grammar symbols and then decodes glyphs.
    pub fn decode_children(&self, grammar: &Grammar, stream: &[Child]) -> Result<Vec<String>> {
        Ok(self.decode(&grammar.expand_children(stream)?))
    }

    /// Token and byte counts of `text` before and after encoding.
    pub fn stats(&self, text: &str) -> CodecStats {
        let tokens = tokenize(text);
        let encoded = self.encode_tokens(&tokens);
        CodecStats {
            input_tokens: tokens.len(),
            encoded_tokens: encoded.len(),
            input_bytes: tokens.join(" ").len(),
            encoded_bytes: encoded.join(" ").len(),
            dictionary_entries: self.dictionary.len(),
        }
    }

    /// Encodes `text` into a packed container carrying this dictionary.
    pub fn pack_text(&self, text: &str) -> Result<Vec<u8>> {
        pack(&self.dictionary, &self.encode_text(text))
    }
}

impl Default for GlyphSession {
    fn default() -> Self {
        Self::new(TrainOptions::default())
    }
}

/// Single-layer training with a throwaway session.
pub fn train(text: &str, options: &TrainOptions) -> Result<Vec<GlyphEntry>> {
    GlyphSession::new(options.clone()).train(text)
}

/// Layered training with a throwaway session.
pub fn train_layered(text: &str, depth: u32, options: &TrainOptions) -> Result<GlyphDictionary> {
    let mut session = GlyphSession::new(options.clone());
    session.train_layered(text, depth)?;
    Ok(session.dictionary)
}
