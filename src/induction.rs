//! Pair induction over a symbol stream.
//!
//! Each round finds the most frequent adjacent pair, asks the cost model
//! whether a two-child rule for it pays off, and if so defines the rule and
//! replaces every non-overlapping occurrence, left to right. The hybrid
//! strategy spends the first share of its budget on plain RePair rounds and
//! the rest on Sequitur rounds, which only accept pairs seen at least twice.
//!
//! # Example
//!
//! ```
//! use fractal_glyph::{induce_tokens, Grammar, InductionConfig};
//!
//! let tokens: Vec<String> = "the quick fox the quick fox the quick fox"
//!     .split(' ')
//!     .map(String::from)
//!     .collect();
//!
//! let mut grammar = Grammar::new();
//! let outcome = induce_tokens(&mut grammar, &tokens, &InductionConfig::default()).unwrap();
//!
//! assert!(outcome.stream.len() < tokens.len());
//! assert_eq!(grammar.expand_children(&outcome.stream).unwrap(), tokens);
//! ```

use crate::error::Result;
use crate::grammar::{Child, Grammar};
use crate::mdl::RuleShape;
use crate::miner::joined_len;
use crate::symbol::{SymbolId, SymbolNode};
use ahash::AHashMap as HashMap;
use serde::{Deserialize, Serialize};
use slotmap::{DefaultKey, SlotMap};
use tracing::{debug, info};

/// Symbol length assumed when estimating the gain of a new pair rule.
pub const ESTIMATED_SYMBOL_LEN: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Repair,
    Sequitur,
    #[default]
    Hybrid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Repair,
    /// Only pairs occurring at least twice are promoted.
    Sequitur,
}

/// Induction settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InductionConfig {
    /// Upper bound on rounds, across both phases. Default: 1000.
    pub max_iterations: usize,
    /// Weight of rule definition cost. Default: 1.0.
    pub lambda: f64,
    /// Default: hybrid.
    pub strategy: Strategy,
    /// Share of the budget the hybrid strategy spends on RePair. Default: 0.7.
    pub repair_share: f64,
}

impl Default for InductionConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            lambda: 1.0,
            strategy: Strategy::Hybrid,
            repair_share: 0.7,
        }
    }
}

impl InductionConfig {
    /// Parses a config from JSON, filling in defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Number of leading rounds the hybrid strategy runs as RePair.
    pub fn repair_rounds(&self) -> usize {
        (self.max_iterations as f64 * self.repair_share.clamp(0.0, 1.0)).floor() as usize
    }

    /// The phase that governs `round` (zero-based).
    pub fn phase_for(&self, round: usize) -> Phase {
        match self.strategy {
            Strategy::Repair => Phase::Repair,
            Strategy::Sequitur => Phase::Sequitur,
            Strategy::Hybrid if round < self.repair_rounds() => Phase::Repair,
            Strategy::Hybrid => Phase::Sequitur,
        }
    }
}

/// Why induction stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// No adjacent pair left, or none frequent enough for the phase.
    NoPair,
    /// The best pair would not pay for its definition.
    NoGain,
    Budget,
}

/// Result of an induction run.
#[derive(Debug, Clone, PartialEq)]
pub struct InductionOutcome {
    /// The rewritten stream.
    pub stream: Vec<Child>,
    /// Symbols defined by this run, in order.
    pub rules: Vec<String>,
    pub repair_rounds: usize,
    pub sequitur_rounds: usize,
    pub stop: StopReason,
    /// Stream length before induction.
    pub input_length: usize,
}

impl InductionOutcome {
    /// Output length as a percentage of input length. Lower is better.
    pub fn compression_ratio(&self) -> f64 {
        if self.input_length == 0 {
            0.0
        } else {
            (self.stream.len() as f64 / self.input_length as f64) * 100.0
        }
    }
}

/// A pair of adjacent symbols with its non-overlapping frequency.
#[derive(Debug, Clone, Copy)]
struct PairRecord {
    frequency: u32,
    /// Stream position of the first occurrence, for tie-breaking.
    first_seen: usize,
    pair: (SymbolId, SymbolId),
}

/// Rewrites one stream, defining rules in a caller-owned grammar.
pub struct PairInducer<'g> {
    grammar: &'g mut Grammar,
    config: InductionConfig,

    /// Stream storage (doubly-linked list nodes)
    symbols: SlotMap<DefaultKey, SymbolNode>,
    head: Option<DefaultKey>,
    tail: Option<DefaultKey>,
    length: usize,
    input_length: usize,

    /// Deduplicated terminals and their joined widths
    terminals: Vec<String>,
    terminal_index: HashMap<String, u32>,

    /// Rule symbols seen by this run, with their expansion widths
    rule_symbols: Vec<String>,
    rule_expansions: Vec<Vec<String>>,
    rule_index: HashMap<String, u32>,
}

impl<'g> PairInducer<'g> {
    /// Creates an inducer with an empty stream over `grammar`.
    pub fn new(grammar: &'g mut Grammar, config: InductionConfig) -> Self {
        Self {
            grammar,
            config,
            symbols: SlotMap::new(),
            head: None,
            tail: None,
            length: 0,
            input_length: 0,
            terminals: Vec::new(),
            terminal_index: HashMap::default(),
            rule_symbols: Vec::new(),
            rule_expansions: Vec::new(),
            rule_index: HashMap::default(),
        }
    }

    /// Appends one stream element. Symbols must already be defined in the
    /// grammar.
    pub fn push(&mut self, child: Child) -> Result<()> {
        let id = match child {
            Child::Token(token) => self.intern_terminal(token),
            Child::Symbol(symbol) => match self.rule_index.get(&symbol) {
                Some(&index) => SymbolId::Rule(index),
                None => {
                    let expansion = self.grammar.expand_symbol(&symbol)?;
                    self.intern_rule(symbol, expansion)
                }
            },
        };

        let key = self.symbols.insert(SymbolNode::new(id));
        self.symbols[key].prev = self.tail;
        match self.tail {
            Some(tail) => self.symbols[tail].next = Some(key),
            None => self.head = Some(key),
        }
        self.tail = Some(key);
        self.length += 1;
        self.input_length += 1;
        Ok(())
    }

    /// Appends children in order.
    pub fn extend<I: IntoIterator<Item = Child>>(&mut self, iter: I) -> Result<()> {
        for child in iter {
            self.push(child)?;
        }
        Ok(())
    }

    fn intern_terminal(&mut self, token: String) -> SymbolId {
        if let Some(&index) = self.terminal_index.get(&token) {
            return SymbolId::Terminal(index);
        }
        let index = self.terminals.len() as u32;
        self.terminal_index.insert(token.clone(), index);
        self.terminals.push(token);
        SymbolId::Terminal(index)
    }

    fn intern_rule(&mut self, symbol: String, expansion: Vec<String>) -> SymbolId {
        let index = self.rule_symbols.len() as u32;
        self.rule_index.insert(symbol.clone(), index);
        self.rule_symbols.push(symbol);
        self.rule_expansions.push(expansion);
        SymbolId::Rule(index)
    }

    fn to_child(&self, id: SymbolId) -> Child {
        match id {
            SymbolId::Terminal(i) => Child::Token(self.terminals[i as usize].clone()),
            SymbolId::Rule(i) => Child::Symbol(self.rule_symbols[i as usize].clone()),
        }
    }

    fn expansion_of(&self, id: SymbolId) -> Vec<String> {
        match id {
            SymbolId::Terminal(i) => vec![self.terminals[i as usize].clone()],
            SymbolId::Rule(i) => self.rule_expansions[i as usize].clone(),
        }
    }

    fn width_of(&self, id: SymbolId) -> usize {
        match id {
            SymbolId::Terminal(i) => self.terminals[i as usize].chars().count(),
            SymbolId::Rule(i) => joined_len(&self.rule_expansions[i as usize]),
        }
    }

    /// Counts adjacent pairs. Runs of one repeated symbol are counted the
    /// way they will be replaced: in non-overlapping left-to-right pairs.
    fn count_pairs(&self) -> HashMap<(SymbolId, SymbolId), PairRecord> {
        let mut counts: HashMap<(SymbolId, SymbolId), PairRecord> = HashMap::default();
        let mut current = self.head;
        let mut position = 0;
        let mut overlapped: Option<DefaultKey> = None;

        while let Some(key) = current {
            let next = self.symbols[key].next;

            if let Some(next_key) = next {
                let pair = (self.symbols[key].symbol, self.symbols[next_key].symbol);
                let repeated = pair.0 == pair.1;

                if repeated && overlapped == Some(key) {
                    overlapped = None;
                } else {
                    counts
                        .entry(pair)
                        .or_insert(PairRecord {
                            frequency: 0,
                            first_seen: position,
                            pair,
                        })
                        .frequency += 1;
                    overlapped = repeated.then_some(next_key);
                }
            }

            current = next;
            position += 1;
        }

        counts
    }

    /// Highest frequency, earliest first occurrence on ties.
    fn most_frequent_pair(&self) -> Option<PairRecord> {
        self.count_pairs().into_values().max_by(|a, b| {
            a.frequency
                .cmp(&b.frequency)
                .then_with(|| b.first_seen.cmp(&a.first_seen))
        })
    }

    /// Replaces every non-overlapping occurrence of `pair`, left to right.
    fn replace_pair(&mut self, pair: (SymbolId, SymbolId), rule: SymbolId) -> u32 {
        let mut count = 0;
        let mut current = self.head;

        while let Some(first_key) = current {
            let Some(second_key) = self.symbols[first_key].next else {
                break;
            };

            if (self.symbols[first_key].symbol, self.symbols[second_key].symbol) != pair {
                current = Some(second_key);
                continue;
            }

            let before = self.symbols[first_key].prev;
            let after = self.symbols[second_key].next;

            let rule_key = self.symbols.insert(SymbolNode::new(rule));
            self.symbols[rule_key].prev = before;
            self.symbols[rule_key].next = after;

            match before {
                Some(prev) => self.symbols[prev].next = Some(rule_key),
                None => self.head = Some(rule_key),
            }
            match after {
                Some(next) => self.symbols[next].prev = Some(rule_key),
                None => self.tail = Some(rule_key),
            }

            self.symbols.remove(first_key);
            self.symbols.remove(second_key);
            self.length -= 1;
            count += 1;

            current = after;
        }

        count
    }

    /// The current stream, front to back.
    pub fn stream(&self) -> Vec<Child> {
        let mut out = Vec::with_capacity(self.length);
        let mut current = self.head;
        while let Some(key) = current {
            out.push(self.to_child(self.symbols[key].symbol));
            current = self.symbols[key].next;
        }
        out
    }

    /// Current stream length.
    pub fn len(&self) -> usize {
        self.length
    }

    /// Returns true if the stream is empty.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Runs rounds until no pair qualifies, the best pair has no gain, or
    /// the budget runs out.
    pub fn run(mut self) -> Result<InductionOutcome> {
        let mut rules = Vec::new();
        let mut repair_rounds = 0;
        let mut sequitur_rounds = 0;
        let mut round = 0;

        let stop = loop {
            if round >= self.config.max_iterations {
                break StopReason::Budget;
            }
            let phase = self.config.phase_for(round);

            let Some(best) = self.most_frequent_pair() else {
                break StopReason::NoPair;
            };
            if phase == Phase::Sequitur && best.frequency < 2 {
                break StopReason::NoPair;
            }

            let (left, right) = best.pair;
            let shape = RuleShape {
                symbol_len: ESTIMATED_SYMBOL_LEN,
                child_count: 2,
                expansion_len: self.width_of(left) + 1 + self.width_of(right),
            };
            let gain = shape.gain(best.frequency, self.config.lambda);
            if gain <= 0.0 {
                break StopReason::NoGain;
            }

            let mut expansion = self.expansion_of(left);
            expansion.extend(self.expansion_of(right));
            let children = vec![self.to_child(left), self.to_child(right)];

            let symbol = self.grammar.define_scored_symbol(
                children,
                expansion.clone(),
                best.frequency,
                gain,
            )?;
            let id = self.intern_rule(symbol.clone(), expansion);
            let replaced = self.replace_pair(best.pair, id);
            debug_assert_eq!(replaced, best.frequency, "counted and replaced pairs differ");

            debug!(
                round,
                ?phase,
                %symbol,
                frequency = best.frequency,
                gain,
                stream = self.length,
                "promoted pair"
            );

            match phase {
                Phase::Repair => repair_rounds += 1,
                Phase::Sequitur => sequitur_rounds += 1,
            }
            rules.push(symbol);
            round += 1;
        };

        info!(
            input = self.input_length,
            output = self.length,
            rules = rules.len(),
            repair_rounds,
            sequitur_rounds,
            ?stop,
            "pair induction finished"
        );

        Ok(InductionOutcome {
            stream: self.stream(),
            rules,
            repair_rounds,
            sequitur_rounds,
            stop,
            input_length: self.input_length,
        })
    }
}

/// Runs induction over a mixed token/symbol stream.
pub fn induce(
    grammar: &mut Grammar,
    stream: Vec<Child>,
    config: &InductionConfig,
) -> Result<InductionOutcome> {
    let mut inducer = PairInducer::new(grammar, config.clone());
    inducer.extend(stream)?;
    inducer.run()
}

/// Runs induction over raw tokens.
pub fn induce_tokens(
    grammar: &mut Grammar,
    tokens: &[String],
    config: &InductionConfig,
) -> Result<InductionOutcome> {
    induce(
        grammar,
        tokens.iter().cloned().map(Child::Token).collect(),
        config,
    )
}
