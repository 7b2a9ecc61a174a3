//! Symbol grammar: a DAG of rules named by fractal addresses.

use crate::address::{pow3, to_base3, MAX_ADDRESS_DEPTH};
use crate::error::{GlyphError, Result};
use ahash::{AHashMap as HashMap, AHashSet as HashSet};
use serde::{Deserialize, Serialize};

/// One element of a rule body: a raw token or a reference to another rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "value")]
pub enum Child {
    Token(String),
    Symbol(String),
}

impl Child {
    /// A literal token child.
    pub fn token(value: impl Into<String>) -> Self {
        Child::Token(value.into())
    }

    /// A reference to another rule.
    pub fn symbol(value: impl Into<String>) -> Self {
        Child::Symbol(value.into())
    }
}

/// A grammar production.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Base-3 address naming the rule.
    pub symbol: String,
    pub children: Vec<Child>,
    /// Literal tokens the rule stands for.
    pub expansion: Vec<String>,
    pub gain: f64,
    pub frequency: u32,
}

/// Problems found by [`Grammar::validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrammarReport {
    /// Symbols reached again while still on the DFS stack.
    pub cycles: Vec<String>,
    /// `(rule, missing)` pairs for references to unknown symbols.
    pub undefined: Vec<(String, String)>,
    /// Symbols registered by more than one rule.
    pub duplicates: Vec<String>,
}

impl GrammarReport {
    /// Returns true if no check found a problem.
    pub fn is_valid(&self) -> bool {
        self.cycles.is_empty() && self.undefined.is_empty() && self.duplicates.is_empty()
    }

    /// The first problem as an error, cycles first.
    pub fn into_result(self) -> Result<()> {
        if let Some(symbol) = self.cycles.into_iter().next() {
            return Err(GlyphError::CycleDetected { symbol });
        }
        if let Some((_, symbol)) = self.undefined.into_iter().next() {
            return Err(GlyphError::UndefinedSymbol { symbol });
        }
        if let Some(symbol) = self.duplicates.into_iter().next() {
            return Err(GlyphError::MalformedDictionary(format!(
                "symbol {symbol} registered twice"
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnStack,
    Done,
}

#[derive(Serialize, Deserialize)]
struct GrammarRecord {
    depth: usize,
    rules: Vec<Rule>,
}

/// Rules keyed by their address, plus the set of addresses in use.
///
/// `define_symbol` is the only mutator. It refuses children that are not
/// already defined, which keeps the rule graph acyclic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "GrammarRecord", into = "GrammarRecord")]
pub struct Grammar {
    /// Rules in definition order.
    rules: Vec<Rule>,
    /// Symbol to the first rule registering it.
    index: HashMap<String, usize>,
    symbols: HashSet<String>,
    depth: usize,
    /// Per-depth scan position; addresses are never released.
    cursors: Vec<u64>,
}

impl Grammar {
    /// Creates an empty grammar.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a grammar from persisted rules without checking them.
    /// Run [`Grammar::validate`] before trusting the result.
    pub fn from_rules(rules: Vec<Rule>) -> Self {
        let mut grammar = Self::new();
        for rule in rules {
            grammar.register(rule);
        }
        grammar
    }

    fn register(&mut self, rule: Rule) {
        self.depth = self.depth.max(rule.symbol.len());
        self.symbols.insert(rule.symbol.clone());
        self.index
            .entry(rule.symbol.clone())
            .or_insert(self.rules.len());
        self.rules.push(rule);
    }

    /// First unused address of exactly `depth` digits.
    pub fn next_available_path(&mut self, depth: usize) -> Result<String> {
        let capacity = pow3(depth).ok_or(GlyphError::AddressExhausted { depth })?;
        if self.cursors.len() <= depth {
            self.cursors.resize(depth + 1, 0);
        }

        let mut value = self.cursors[depth];
        while value < capacity {
            let code = to_base3(value, depth)?;
            if !self.symbols.contains(&code) {
                self.cursors[depth] = value;
                return Ok(code);
            }
            value += 1;
        }
        self.cursors[depth] = capacity;
        Err(GlyphError::AddressExhausted { depth })
    }

    /// Shallowest free address, trying depth 1 upwards.
    fn allocate(&mut self) -> Result<String> {
        for depth in 1..=MAX_ADDRESS_DEPTH {
            match self.next_available_path(depth) {
                Ok(code) => return Ok(code),
                Err(GlyphError::AddressExhausted { .. }) => continue,
                Err(e) => return Err(e),
            }
        }
        Err(GlyphError::DepthLimit {
            limit: MAX_ADDRESS_DEPTH,
        })
    }

    /// Defines a new rule and returns its symbol.
    pub fn define_symbol(
        &mut self,
        children: Vec<Child>,
        expansion: Vec<String>,
        frequency: u32,
    ) -> Result<String> {
        self.define_scored_symbol(children, expansion, frequency, 0.0)
    }

    /// Like [`Grammar::define_symbol`], recording the rule's MDL gain.
    pub fn define_scored_symbol(
        &mut self,
        children: Vec<Child>,
        expansion: Vec<String>,
        frequency: u32,
        gain: f64,
    ) -> Result<String> {
        for child in &children {
            if let Child::Symbol(symbol) = child {
                if !self.index.contains_key(symbol) {
                    return Err(GlyphError::UndefinedSymbol {
                        symbol: symbol.clone(),
                    });
                }
            }
        }

        let symbol = self.allocate()?;
        self.register(Rule {
            symbol: symbol.clone(),
            children,
            expansion,
            gain,
            frequency,
        });
        Ok(symbol)
    }

    /// Looks up the rule named `symbol`.
    pub fn get(&self, symbol: &str) -> Option<&Rule> {
        self.index.get(symbol).map(|&i| &self.rules[i])
    }

    /// Returns true if `symbol` names a defined rule.
    pub fn contains(&self, symbol: &str) -> bool {
        self.symbols.contains(symbol)
    }

    /// Rules in definition order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Every symbol allocated so far.
    pub fn symbols(&self) -> &HashSet<String> {
        &self.symbols
    }

    /// Length of the longest symbol ever assigned.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if no rule is defined.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Fully expands `symbol` into raw tokens.
    pub fn expand_symbol(&self, symbol: &str) -> Result<Vec<String>> {
        self.expand(symbol)?
            .map(|token| token.map(str::to_owned))
            .collect()
    }

    /// Expands a mixed sequence of tokens and symbols into raw tokens.
    pub fn expand_children(&self, children: &[Child]) -> Result<Vec<String>> {
        let mut out = Vec::new();
        for child in children {
            match child {
                Child::Token(token) => out.push(token.clone()),
                Child::Symbol(symbol) => out.extend(self.expand_symbol(symbol)?),
            }
        }
        Ok(out)
    }

    /// Depth-first walk over every rule. Returns rule indices in post-order
    /// (children before parents) and calls `on_back_edge` for every
    /// reference to a rule still on the stack.
    fn walk(&self, mut on_back_edge: impl FnMut(&str)) -> Vec<usize> {
        let mut marks = vec![Mark::Unvisited; self.rules.len()];
        let mut order = Vec::with_capacity(self.rules.len());

        for root in 0..self.rules.len() {
            if marks[root] != Mark::Unvisited {
                continue;
            }
            marks[root] = Mark::OnStack;
            let mut stack = vec![(root, 0usize)];

            while let Some(frame) = stack.last_mut() {
                let (node, pos) = *frame;
                let children = &self.rules[node].children;
                if pos == children.len() {
                    marks[node] = Mark::Done;
                    order.push(node);
                    stack.pop();
                    continue;
                }
                frame.1 += 1;

                let Child::Symbol(symbol) = &children[pos] else {
                    continue;
                };
                let Some(&child) = self.index.get(symbol) else {
                    continue;
                };
                match marks[child] {
                    Mark::Unvisited => {
                        marks[child] = Mark::OnStack;
                        stack.push((child, 0));
                    }
                    Mark::OnStack => on_back_edge(symbol),
                    Mark::Done => {}
                }
            }
        }

        order
    }

    /// Returns true if any rule reaches itself.
    pub fn has_cycles(&self) -> bool {
        let mut found = false;
        self.walk(|_| found = true);
        found
    }

    /// Symbols ordered so that every rule follows the rules it references.
    pub fn topological_sort(&self) -> Result<Vec<String>> {
        let mut cycle = None;
        let order = self.walk(|symbol| {
            cycle.get_or_insert_with(|| symbol.to_owned());
        });
        if let Some(symbol) = cycle {
            return Err(GlyphError::CycleDetected { symbol });
        }
        Ok(order
            .into_iter()
            .map(|i| self.rules[i].symbol.clone())
            .collect())
    }

    /// Reports cycles, references to unknown symbols and duplicate symbols.
    pub fn validate(&self) -> GrammarReport {
        let mut report = GrammarReport::default();

        self.walk(|symbol| {
            if !report.cycles.iter().any(|s| s == symbol) {
                report.cycles.push(symbol.to_owned());
            }
        });

        for rule in &self.rules {
            for child in &rule.children {
                if let Child::Symbol(symbol) = child {
                    if !self.symbols.contains(symbol) {
                        report.undefined.push((rule.symbol.clone(), symbol.clone()));
                    }
                }
            }
        }

        for (i, rule) in self.rules.iter().enumerate() {
            if self.index.get(&rule.symbol) != Some(&i)
                && !report.duplicates.contains(&rule.symbol)
            {
                report.duplicates.push(rule.symbol.clone());
            }
        }

        report
    }
}

impl From<GrammarRecord> for Grammar {
    fn from(record: GrammarRecord) -> Self {
        let mut grammar = Grammar::from_rules(record.rules);
        grammar.depth = grammar.depth.max(record.depth);
        grammar
    }
}

impl From<Grammar> for GrammarRecord {
    fn from(grammar: Grammar) -> Self {
        GrammarRecord {
            depth: grammar.depth,
            rules: grammar.rules,
        }
    }
}
