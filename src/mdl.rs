//! Minimum-description-length cost model for grammar rules.

use crate::grammar::Rule;
use crate::miner::joined_len;

/// Fixed cost of introducing a rule definition.
pub const DEFINITION_OVERHEAD: usize = 3;

/// The sizes the cost model looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleShape {
    pub symbol_len: usize,
    pub child_count: usize,
    /// Length of the expansion joined by single spaces.
    pub expansion_len: usize,
}

impl RuleShape {
    /// Measures a rule.
    pub fn of(rule: &Rule) -> Self {
        Self {
            symbol_len: rule.symbol.chars().count(),
            child_count: rule.children.len(),
            expansion_len: joined_len(&rule.expansion),
        }
    }

    /// `lambda * (overhead + |symbol| + 2 * |children| + |expansion|)`.
    pub fn cost(&self, lambda: f64) -> f64 {
        let units = DEFINITION_OVERHEAD + self.symbol_len + 2 * self.child_count + self.expansion_len;
        lambda * units as f64
    }

    /// `(|expansion| - |symbol|) * frequency`.
    pub fn savings(&self, frequency: u32) -> f64 {
        (self.expansion_len as f64 - self.symbol_len as f64) * frequency as f64
    }

    /// `savings - cost`.
    pub fn gain(&self, frequency: u32, lambda: f64) -> f64 {
        self.savings(frequency) - self.cost(lambda)
    }
}

/// Definition cost of `rule`, scaled by `lambda`.
pub fn rule_cost(rule: &Rule, lambda: f64) -> f64 {
    RuleShape::of(rule).cost(lambda)
}

/// Characters saved by substituting `rule` at `frequency` sites.
pub fn rule_savings(rule: &Rule, frequency: u32) -> f64 {
    RuleShape::of(rule).savings(frequency)
}

/// Net MDL gain of defining `rule`. Accept only when positive.
pub fn mdl_gain(rule: &Rule, frequency: u32, lambda: f64) -> f64 {
    RuleShape::of(rule).gain(frequency, lambda)
}

/// A rule is worth defining only when it saves more than it costs.
pub fn accepts(rule: &Rule, frequency: u32, lambda: f64) -> bool {
    mdl_gain(rule, frequency, lambda) > 0.0
}

/// The candidate with the highest positive gain at its own frequency.
/// Ties keep the earliest candidate.
pub fn find_best_rule(candidates: &[Rule], lambda: f64) -> Option<&Rule> {
    let mut best: Option<(&Rule, f64)> = None;
    for rule in candidates {
        let gain = mdl_gain(rule, rule.frequency, lambda);
        if gain <= 0.0 {
            continue;
        }
        if best.map_or(true, |(_, top)| gain > top) {
            best = Some((rule, gain));
        }
    }
    best.map(|(rule, _)| rule)
}
