//! Longest-match phrase trie and the glyph codec built on it.

use crate::dictionary::GlyphEntry;
use ahash::AHashMap as HashMap;
use tracing::warn;

#[derive(Debug, Clone, Default)]
struct TrieNode {
    children: HashMap<String, usize>,
    glyph: Option<String>,
}

/// A prefix tree over token sequences. Nodes live in an arena; index 0 is
/// the root.
#[derive(Debug, Clone)]
pub struct GlyphTrie {
    nodes: Vec<TrieNode>,
    terminals: usize,
}

impl GlyphTrie {
    /// Creates an empty trie.
    pub fn new() -> Self {
        Self {
            nodes: vec![TrieNode::default()],
            terminals: 0,
        }
    }

    /// Builds a trie from a dictionary snapshot. A repeated phrase keeps the
    /// glyph of its last entry.
    pub fn build<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = &'a GlyphEntry>,
    {
        let mut trie = Self::new();
        for entry in entries {
            trie.insert(&entry.phrase, &entry.glyph);
        }
        trie
    }

    /// Inserts one phrase, overwriting any glyph already at its terminal.
    pub fn insert(&mut self, phrase: &[String], glyph: &str) {
        let mut node = 0;
        for token in phrase {
            node = match self.nodes[node].children.get(token) {
                Some(&child) => child,
                None => {
                    let child = self.nodes.len();
                    self.nodes.push(TrieNode::default());
                    self.nodes[node].children.insert(token.clone(), child);
                    child
                }
            };
        }

        match self.nodes[node].glyph.replace(glyph.to_owned()) {
            Some(previous) if previous != glyph => {
                warn!(phrase = %phrase.join(" "), %previous, glyph, "glyph overwritten");
            }
            Some(_) => {}
            None => self.terminals += 1,
        }
    }

    /// Number of glyph-bearing nodes.
    pub fn len(&self) -> usize {
        self.terminals
    }

    /// Returns true if the trie holds no phrases.
    pub fn is_empty(&self) -> bool {
        self.terminals == 0
    }

    /// Glyph of the exact phrase, if one is registered.
    pub fn get(&self, phrase: &[String]) -> Option<&str> {
        let mut node = 0;
        for token in phrase {
            node = *self.nodes[node].children.get(token)?;
        }
        self.nodes[node].glyph.as_deref()
    }

    /// Longest glyph-bearing prefix of `tokens`: its glyph and token length.
    pub fn longest_match(&self, tokens: &[String]) -> Option<(&str, usize)> {
        let mut node = 0;
        let mut best = None;
        for (depth, token) in tokens.iter().enumerate() {
            let Some(&child) = self.nodes[node].children.get(token) else {
                break;
            };
            node = child;
            if let Some(glyph) = &self.nodes[node].glyph {
                best = Some((glyph.as_str(), depth + 1));
            }
        }
        best
    }

    /// Greedy single-pass longest-match substitution.
    pub fn encode(&self, tokens: &[String]) -> Vec<String> {
        let mut out = Vec::with_capacity(tokens.len());
        let mut pos = 0;
        while pos < tokens.len() {
            match self.longest_match(&tokens[pos..]) {
                Some((glyph, len)) => {
                    out.push(glyph.to_owned());
                    pos += len;
                }
                None => {
                    out.push(tokens[pos].clone());
                    pos += 1;
                }
            }
        }
        out
    }
}

impl Default for GlyphTrie {
    fn default() -> Self {
        Self::new()
    }
}

/// Glyph to phrase lookup used for decoding.
#[derive(Debug, Clone, Default)]
pub struct ReverseMap {
    phrases: HashMap<String, Vec<String>>,
}

impl ReverseMap {
    /// Builds the glyph to phrase map. Later entries win on a duplicate glyph.
    pub fn build<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = &'a GlyphEntry>,
    {
        let phrases = entries
            .into_iter()
            .map(|e| (e.glyph.clone(), e.phrase.clone()))
            .collect();
        Self { phrases }
    }

    /// The phrase a glyph stands for, one level deep.
    pub fn phrase(&self, glyph: &str) -> Option<&[String]> {
        self.phrases.get(glyph).map(Vec::as_slice)
    }

    /// Expands every known glyph; unknown tokens pass through as literals.
    pub fn decode(&self, tokens: &[String]) -> Vec<String> {
        let mut out = Vec::with_capacity(tokens.len());
        for token in tokens {
            match self.phrases.get(token) {
                Some(phrase) => out.extend(phrase.iter().cloned()),
                None => out.push(token.clone()),
            }
        }
        out
    }
}

/// Encodes `tokens` with a prebuilt trie.
pub fn encode(tokens: &[String], trie: &GlyphTrie) -> Vec<String> {
    trie.encode(tokens)
}

/// Decodes `tokens` against `entries`.
pub fn decode(tokens: &[String], entries: &[GlyphEntry]) -> Vec<String> {
    ReverseMap::build(entries).decode(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn entry(phrase: &[&str], glyph: &str) -> GlyphEntry {
        GlyphEntry::new(1, toks(phrase), glyph)
    }

    #[test]
    fn test_longest_match_wins() {
        let entries = vec![entry(&["a", "b"], "X"), entry(&["a", "b", "c"], "Y")];
        let trie = GlyphTrie::build(&entries);
        assert_eq!(encode(&toks(&["a", "b", "c"]), &trie), toks(&["Y"]));
        assert_eq!(encode(&toks(&["a", "b", "d"]), &trie), toks(&["X", "d"]));
    }

    #[test]
    fn test_longest_terminal_not_deepest_node() {
        // The walk reaches "a b c" but only "a" carries a glyph on that path.
        let entries = vec![entry(&["a"], "X"), entry(&["a", "b", "c", "d"], "Y")];
        let trie = GlyphTrie::build(&entries);
        assert_eq!(encode(&toks(&["a", "b", "c", "e"]), &trie), toks(&["X", "b", "c", "e"]));
    }

    #[test]
    fn test_greedy_is_not_optimal() {
        let entries = vec![entry(&["a", "b"], "X"), entry(&["b", "c", "d"], "Y")];
        let trie = GlyphTrie::build(&entries);
        assert_eq!(encode(&toks(&["a", "b", "c", "d"]), &trie), toks(&["X", "c", "d"]));
    }

    #[test]
    fn test_last_write_wins() {
        let entries = vec![entry(&["a", "b"], "X"), entry(&["a", "b"], "Z")];
        let trie = GlyphTrie::build(&entries);
        assert_eq!(trie.get(&toks(&["a", "b"])), Some("Z"));
        assert_eq!(trie.len(), 1);
    }

    #[test]
    fn test_scenario_encoding() {
        let entries = vec![entry(&["the", "cat"], "~g")];
        let trie = GlyphTrie::build(&entries);
        let tokens = toks(&["the", "cat", "sat", "the", "cat", "ran"]);
        let encoded = encode(&tokens, &trie);
        assert_eq!(encoded, toks(&["~g", "sat", "~g", "ran"]));
        assert_eq!(decode(&encoded, &entries), tokens);
    }

    #[test]
    fn test_unknown_tokens_pass_through() {
        let entries = vec![entry(&["a", "b"], "X")];
        assert_eq!(decode(&toks(&["Q", "X"]), &entries), toks(&["Q", "a", "b"]));
    }

    #[test]
    fn test_empty_trie() {
        let trie = GlyphTrie::new();
        assert!(trie.is_empty());
        let tokens = toks(&["a", "b"]);
        assert_eq!(encode(&tokens, &trie), tokens);
        assert!(encode(&[], &trie).is_empty());
    }
}
