use slotmap::DefaultKey;

/// Identifier for an element of the induction stream.
///
/// Terminals index the deduplicated token table; rules index the table of
/// symbols known to the current induction run.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub(crate) enum SymbolId {
    Terminal(u32),
    Rule(u32),
}

/// A node in the doubly-linked stream.
#[derive(Debug)]
pub(crate) struct SymbolNode {
    pub symbol: SymbolId,
    pub prev: Option<DefaultKey>,
    pub next: Option<DefaultKey>,
}

impl SymbolNode {
    pub(crate) fn new(symbol: SymbolId) -> Self {
        Self {
            symbol,
            prev: None,
            next: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_node_creation() {
        let node = SymbolNode::new(SymbolId::Terminal(3));
        assert_eq!(node.symbol, SymbolId::Terminal(3));
        assert_eq!(node.prev, None);
        assert_eq!(node.next, None);
    }

    #[test]
    fn test_terminal_and_rule_ids_differ() {
        assert_ne!(SymbolId::Terminal(0), SymbolId::Rule(0));
    }
}
