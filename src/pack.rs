//! Packed stream container.
//!
//! Layout: 4-byte magic, little-endian `u32` entry count, the dictionary as
//! a JSON array, a newline, then the space-joined encoded stream.

use crate::dictionary::GlyphDictionary;
use crate::error::{GlyphError, Result};

pub const MAGIC: &[u8; 4] = b"GLYF";

const HEADER_LEN: usize = 8;

/// Serializes a dictionary and an encoded stream into one container.
pub fn pack(dictionary: &GlyphDictionary, stream: &[String]) -> Result<Vec<u8>> {
    let count = u32::try_from(dictionary.len()).map_err(|_| {
        GlyphError::MalformedDictionary(format!("{} entries do not fit a u32", dictionary.len()))
    })?;
    let json = serde_json::to_vec(dictionary)?;
    let body = stream.join(" ");

    let mut out = Vec::with_capacity(HEADER_LEN + json.len() + 1 + body.len());
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&count.to_le_bytes());
    out.extend_from_slice(&json);
    out.push(b'\n');
    out.extend_from_slice(body.as_bytes());
    Ok(out)
}

/// Parses a container produced by [`pack`].
pub fn unpack(bytes: &[u8]) -> Result<(GlyphDictionary, Vec<String>)> {
    if bytes.len() < HEADER_LEN {
        return Err(malformed("container shorter than its header"));
    }
    if &bytes[..4] != MAGIC {
        return Err(malformed("bad magic"));
    }
    let count = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;

    let rest = &bytes[HEADER_LEN..];
    let mut entries = serde_json::Deserializer::from_slice(rest).into_iter::<GlyphDictionary>();
    let dictionary = match entries.next() {
        Some(Ok(dictionary)) => dictionary,
        Some(Err(e)) => return Err(malformed(&format!("unparseable dictionary: {e}"))),
        None => return Err(malformed("missing dictionary")),
    };
    let offset = entries.byte_offset();

    if dictionary.len() != count {
        return Err(malformed(&format!(
            "header declares {count} entries, found {}",
            dictionary.len()
        )));
    }
    dictionary.validate()?;

    let Some((&b'\n', body)) = rest[offset..].split_first() else {
        return Err(malformed("missing stream separator"));
    };
    let body = std::str::from_utf8(body).map_err(|_| malformed("stream is not UTF-8"))?;
    let stream = body.split(' ').filter(|t| !t.is_empty()).map(str::to_owned).collect();

    Ok((dictionary, stream))
}

fn malformed(message: &str) -> GlyphError {
    GlyphError::MalformedDictionary(message.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::GlyphEntry;

    fn sample() -> (GlyphDictionary, Vec<String>) {
        let dictionary = GlyphDictionary::from_entries(vec![
            GlyphEntry::new(1, vec!["the".into(), "cat".into()], "~a"),
            GlyphEntry::new(2, vec!["~a".into(), "sat".into()], "~b"),
        ]);
        let stream = vec!["~b".into(), "on".into(), "~a".into()];
        (dictionary, stream)
    }

    #[test]
    fn test_layout() {
        let (dictionary, stream) = sample();
        let bytes = pack(&dictionary, &stream).unwrap();
        assert_eq!(&bytes[..4], b"GLYF");
        assert_eq!(&bytes[4..8], &2u32.to_le_bytes());
        assert!(bytes.ends_with(b"\n~b on ~a"));

        let (d, s) = unpack(&bytes).unwrap();
        assert_eq!(d, dictionary);
        assert_eq!(s, stream);
    }

    #[test]
    fn test_empty_stream() {
        let (dictionary, _) = sample();
        let bytes = pack(&dictionary, &[]).unwrap();
        let (_, stream) = unpack(&bytes).unwrap();
        assert!(stream.is_empty());
    }

    #[test]
    fn test_rejects_bad_magic() {
        let (dictionary, stream) = sample();
        let mut bytes = pack(&dictionary, &stream).unwrap();
        bytes[0] = b'X';
        assert!(matches!(unpack(&bytes), Err(GlyphError::MalformedDictionary(_))));
    }

    #[test]
    fn test_rejects_truncation_and_count_mismatch() {
        let (dictionary, stream) = sample();
        let bytes = pack(&dictionary, &stream).unwrap();

        assert!(unpack(&bytes[..6]).is_err());
        assert!(unpack(&bytes[..20]).is_err());

        let mut wrong_count = bytes.clone();
        wrong_count[4] = 7;
        assert!(matches!(unpack(&wrong_count), Err(GlyphError::MalformedDictionary(_))));
    }

    #[test]
    fn test_rejects_missing_separator() {
        let (dictionary, _) = sample();
        let mut bytes = MAGIC.to_vec();
        bytes.extend_from_slice(&2u32.to_le_bytes());
        bytes.extend_from_slice(&serde_json::to_vec(&dictionary).unwrap());
        bytes.extend_from_slice(b"X~a");
        assert!(matches!(unpack(&bytes), Err(GlyphError::MalformedDictionary(_))));
    }
}
