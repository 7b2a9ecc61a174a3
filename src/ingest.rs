//! Sequential address assignment for encoded documents.
//!
//! Every emitted token takes the next address of a fixed-width address
//! space, so one ingestion pass yields a contiguous, monotonically
//! increasing address stream. Storage is left to a [`TokenSink`].

use crate::address::{pow3, to_base3};
use crate::error::{GlyphError, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

/// A token placed at an address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressedToken {
    pub address: u64,
    /// Base-3 form of `address`, zero-padded to the ingestor's depth.
    pub code: String,
    pub token: String,
}

/// First and last address (inclusive) of one ingested document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentBounds {
    pub doc_id: u64,
    pub start: u64,
    pub end: u64,
}

/// Receiver of ingestion output, in emission order.
pub trait TokenSink {
    fn put_token(&mut self, address: u64, token: &str) -> Result<()>;
    fn put_posting(&mut self, token: &str, address: u64) -> Result<()>;
    fn put_bounds(&mut self, bounds: &DocumentBounds) -> Result<()>;
}

/// In-memory sink that keeps everything it is given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemorySink {
    pub tokens: Vec<(u64, String)>,
    pub postings: Vec<(String, u64)>,
    pub bounds: Vec<DocumentBounds>,
}

impl TokenSink for MemorySink {
    fn put_token(&mut self, address: u64, token: &str) -> Result<()> {
        self.tokens.push((address, token.to_owned()));
        Ok(())
    }

    fn put_posting(&mut self, token: &str, address: u64) -> Result<()> {
        self.postings.push((token.to_owned(), address));
        Ok(())
    }

    fn put_bounds(&mut self, bounds: &DocumentBounds) -> Result<()> {
        self.bounds.push(*bounds);
        Ok(())
    }
}

/// Hands out addresses of width `depth`, never reusing one.
#[derive(Debug, Clone)]
pub struct Ingestor {
    depth: usize,
    capacity: u64,
    next: u64,
}

impl Ingestor {
    /// Creates an ingestor starting at address 0.
    pub fn new(depth: usize) -> Result<Self> {
        Self::resume(depth, 0)
    }

    /// Continues an address stream that already used `0..next`.
    pub fn resume(depth: usize, next: u64) -> Result<Self> {
        let capacity = pow3(depth)
            .ok_or_else(|| GlyphError::InvalidAddress(format!("depth {depth} overflows u64")))?;
        if next > capacity {
            return Err(GlyphError::AddressExhausted { depth });
        }
        Ok(Self {
            depth,
            capacity,
            next,
        })
    }

    /// Width of every emitted address.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Next address to be assigned.
    pub fn next_address(&self) -> u64 {
        self.next
    }

    /// Addresses still available.
    pub fn remaining(&self) -> u64 {
        self.capacity - self.next
    }

    /// Assigns addresses to `tokens`. Fails without assigning anything if
    /// they do not all fit.
    pub fn assign(&mut self, tokens: &[String]) -> Result<Vec<AddressedToken>> {
        if tokens.len() as u64 > self.remaining() {
            return Err(GlyphError::AddressExhausted { depth: self.depth });
        }

        let mut placed = Vec::with_capacity(tokens.len());
        for token in tokens {
            placed.push(AddressedToken {
                address: self.next,
                code: to_base3(self.next, self.depth)?,
                token: token.clone(),
            });
            self.next += 1;
        }
        Ok(placed)
    }

    /// Assigns addresses to one document and forwards tokens, postings and
    /// bounds to `sink`. Empty documents produce no bounds.
    pub fn ingest<S: TokenSink>(
        &mut self,
        doc_id: u64,
        tokens: &[String],
        sink: &mut S,
    ) -> Result<Option<DocumentBounds>> {
        let placed = self.assign(tokens)?;
        let (Some(first), Some(last)) = (placed.first(), placed.last()) else {
            return Ok(None);
        };
        let bounds = DocumentBounds {
            doc_id,
            start: first.address,
            end: last.address,
        };

        for item in &placed {
            sink.put_token(item.address, &item.token)?;
        }
        for item in &placed {
            sink.put_posting(&item.token, item.address)?;
        }
        sink.put_bounds(&bounds)?;

        info!(
            doc_id,
            tokens = placed.len(),
            start = bounds.start,
            end = bounds.end,
            "ingested document"
        );

        Ok(Some(bounds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::{address_to_point, point_to_address};

    fn toks(text: &str) -> Vec<String> {
        text.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn test_addresses_are_contiguous_across_documents() {
        let mut ingestor = Ingestor::new(4).unwrap();
        let mut sink = MemorySink::default();

        let first = ingestor.ingest(1, &toks("a b c"), &mut sink).unwrap().unwrap();
        let second = ingestor.ingest(2, &toks("d e"), &mut sink).unwrap().unwrap();

        assert_eq!(first, DocumentBounds { doc_id: 1, start: 0, end: 2 });
        assert_eq!(second, DocumentBounds { doc_id: 2, start: 3, end: 4 });

        let addresses: Vec<u64> = sink.tokens.iter().map(|(a, _)| *a).collect();
        assert_eq!(addresses, vec![0, 1, 2, 3, 4]);
        assert_eq!(sink.postings[3], ("d".to_string(), 3));
        assert_eq!(sink.bounds.len(), 2);
    }

    #[test]
    fn test_codes_decode_to_points() {
        let mut ingestor = Ingestor::new(3).unwrap();
        let placed = ingestor.assign(&toks("x y z")).unwrap();
        assert_eq!(placed[2].code, "002");
        for item in &placed {
            let point = address_to_point(&item.code).unwrap();
            assert_eq!(point_to_address(point, 3).unwrap(), item.code);
        }
    }

    #[test]
    fn test_empty_document() {
        let mut ingestor = Ingestor::new(2).unwrap();
        let mut sink = MemorySink::default();
        assert_eq!(ingestor.ingest(9, &[], &mut sink).unwrap(), None);
        assert!(sink.bounds.is_empty());
        assert_eq!(ingestor.next_address(), 0);
    }

    #[test]
    fn test_exhaustion_is_all_or_nothing() {
        let mut ingestor = Ingestor::new(1).unwrap();
        ingestor.assign(&toks("a b")).unwrap();
        assert!(matches!(
            ingestor.assign(&toks("c d")),
            Err(GlyphError::AddressExhausted { depth: 1 })
        ));
        assert_eq!(ingestor.next_address(), 2);
        assert_eq!(ingestor.assign(&toks("c")).unwrap()[0].code, "2");
        assert_eq!(ingestor.remaining(), 0);
    }

    #[test]
    fn test_resume() {
        let mut ingestor = Ingestor::resume(2, 7).unwrap();
        assert_eq!(ingestor.assign(&toks("a")).unwrap()[0].code, "21");
        assert!(Ingestor::resume(2, 10).is_err());
    }
}
