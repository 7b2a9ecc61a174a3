//! Glyph entries and the ordered dictionary that holds them.

use crate::error::{GlyphError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// A committed phrase to glyph mapping, tagged with its mining layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlyphEntry {
    pub layer: u32,
    pub phrase: Vec<String>,
    pub glyph: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gain: Option<i64>,
}

impl GlyphEntry {
    /// Creates an entry without a recorded gain.
    pub fn new(layer: u32, phrase: Vec<String>, glyph: impl Into<String>) -> Self {
        Self {
            layer,
            phrase,
            glyph: glyph.into(),
            gain: None,
        }
    }

    /// Checks the invariants every persisted entry must satisfy.
    pub fn validate(&self) -> Result<()> {
        if self.layer == 0 {
            return Err(malformed(format!("glyph {:?} has layer 0", self.glyph)));
        }
        if self.glyph.is_empty() || self.glyph.chars().any(char::is_whitespace) {
            return Err(malformed(format!("invalid glyph {:?}", self.glyph)));
        }
        if self.phrase.is_empty() {
            return Err(malformed(format!("glyph {:?} has an empty phrase", self.glyph)));
        }
        if let Some(token) = self
            .phrase
            .iter()
            .find(|t| t.is_empty() || t.chars().any(char::is_whitespace))
        {
            return Err(malformed(format!(
                "glyph {:?} has invalid token {:?}",
                self.glyph, token
            )));
        }
        Ok(())
    }
}

fn malformed(message: String) -> GlyphError {
    GlyphError::MalformedDictionary(message)
}

/// Ordered glyph entries for one corpus.
///
/// Order only matters for tie-breaking; lookups go through the trie.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GlyphDictionary {
    entries: Vec<GlyphEntry>,
}

impl GlyphDictionary {
    /// Creates an empty dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps entries in their existing order.
    pub fn from_entries(entries: Vec<GlyphEntry>) -> Self {
        Self { entries }
    }

    /// Appends one entry.
    pub fn push(&mut self, entry: GlyphEntry) {
        self.entries.push(entry);
    }

    /// Appends entries in iteration order.
    pub fn extend<I: IntoIterator<Item = GlyphEntry>>(&mut self, iter: I) {
        self.entries.extend(iter);
    }

    /// All entries in insertion order.
    pub fn entries(&self) -> &[GlyphEntry] {
        &self.entries
    }

    /// Consumes the dictionary, returning its entries.
    pub fn into_entries(self) -> Vec<GlyphEntry> {
        self.entries
    }

    /// Number of entries across all layers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the dictionary holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Highest layer present, or 0 for an empty dictionary.
    pub fn max_layer(&self) -> u32 {
        self.entries.iter().map(|e| e.layer).max().unwrap_or(0)
    }

    /// Entries of exactly `layer`, in dictionary order.
    pub fn layer(&self, layer: u32) -> Vec<GlyphEntry> {
        self.entries
            .iter()
            .filter(|e| e.layer == layer)
            .cloned()
            .collect()
    }

    /// Entries of layers `1..=layer`, in dictionary order.
    pub fn up_to_layer(&self, layer: u32) -> Vec<GlyphEntry> {
        self.entries
            .iter()
            .filter(|e| e.layer <= layer)
            .cloned()
            .collect()
    }

    /// Whether `token` is one of this dictionary's glyphs.
    pub fn contains_glyph(&self, token: &str) -> bool {
        self.entries.iter().any(|e| e.glyph == token)
    }

    /// Validates every entry, stopping at the first failure.
    pub fn validate(&self) -> Result<()> {
        self.entries.iter().try_for_each(GlyphEntry::validate)
    }

    /// Serializes the entry list as compact JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses and validates a JSON entry list.
    pub fn from_json(json: &str) -> Result<Self> {
        let dictionary: Self = serde_json::from_str(json)
            .map_err(|e| malformed(format!("unparseable dictionary: {e}")))?;
        dictionary.validate()?;
        Ok(dictionary)
    }

    /// Writes the dictionary as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    /// Reads and validates a dictionary written by [`save`](Self::save).
    pub fn load(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let dictionary: Self = serde_json::from_reader(reader)
            .map_err(|e| malformed(format!("unparseable dictionary: {e}")))?;
        dictionary.validate()?;
        Ok(dictionary)
    }
}

impl FromIterator<GlyphEntry> for GlyphDictionary {
    fn from_iter<I: IntoIterator<Item = GlyphEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(layer: u32, phrase: &[&str], glyph: &str) -> GlyphEntry {
        GlyphEntry::new(layer, phrase.iter().map(|s| s.to_string()).collect(), glyph)
    }

    #[test]
    fn test_layers() {
        let dict: GlyphDictionary = vec![
            entry(1, &["the", "cat"], "~a"),
            entry(2, &["~a", "sat"], "~b"),
            entry(1, &["on", "the"], "~c"),
        ]
        .into_iter()
        .collect();

        assert_eq!(dict.max_layer(), 2);
        assert_eq!(dict.layer(1).len(), 2);
        assert_eq!(dict.up_to_layer(1).len(), 2);
        assert_eq!(dict.up_to_layer(2).len(), 3);
        assert!(dict.contains_glyph("~b"));
        assert!(!dict.contains_glyph("sat"));
    }

    #[test]
    fn test_json_format() {
        let mut e = entry(1, &["the", "cat"], "~a");
        e.gain = Some(10);
        let dict = GlyphDictionary::from_entries(vec![e, entry(1, &["a", "b"], "~b")]);

        let json = dict.to_json().unwrap();
        assert_eq!(
            json,
            r#"[{"layer":1,"phrase":["the","cat"],"glyph":"~a","gain":10},{"layer":1,"phrase":["a","b"],"glyph":"~b"}]"#
        );
        assert_eq!(GlyphDictionary::from_json(&json).unwrap(), dict);
    }

    #[test]
    fn test_rejects_invalid_entries() {
        for bad in [
            r#"[{"layer":0,"phrase":["a"],"glyph":"~a"}]"#,
            r#"[{"layer":1,"phrase":[],"glyph":"~a"}]"#,
            r#"[{"layer":1,"phrase":["a b"],"glyph":"~a"}]"#,
            r#"[{"layer":1,"phrase":["a"],"glyph":""}]"#,
            r#"[{"layer":1,"phrase":["a"]}]"#,
            r#"{"layer":1}"#,
        ] {
            let err = GlyphDictionary::from_json(bad).unwrap_err();
            assert!(matches!(err, GlyphError::MalformedDictionary(_)), "{bad}");
        }
    }

    #[test]
    fn test_save_and_load() {
        let dict = GlyphDictionary::from_entries(vec![entry(1, &["x", "y"], "~q")]);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("glyphs.json");
        dict.save(&path).unwrap();
        assert_eq!(GlyphDictionary::load(&path).unwrap(), dict);
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, r#"[{"layer":1,"phrase":["a"],"glyph":" x"}]"#).unwrap();
        assert!(matches!(
            GlyphDictionary::load(&path),
            Err(GlyphError::MalformedDictionary(_))
        ));
        assert!(matches!(
            GlyphDictionary::load(&dir.path().join("missing.json")),
            Err(GlyphError::Io(_))
        ));
    }
}
