use crate::error::{GlyphError, Result};
use crate::grammar::{Child, Grammar, Rule};
use ahash::AHashSet as HashSet;

/// Iterator that expands a symbol into its raw tokens.
///
/// Uses an explicit stack of `(rule, next child)` frames instead of
/// recursion, so deep grammars cannot overflow the call stack. A reference
/// back to a rule still being expanded yields `CycleDetected` and ends the
/// iteration.
pub struct Expand<'a> {
    grammar: &'a Grammar,
    stack: Vec<(&'a Rule, usize)>,
    on_stack: HashSet<&'a str>,
}

impl<'a> Expand<'a> {
    fn new(grammar: &'a Grammar, root: &'a Rule) -> Self {
        let mut on_stack = HashSet::default();
        on_stack.insert(root.symbol.as_str());
        Self {
            grammar,
            stack: vec![(root, 0)],
            on_stack,
        }
    }

    fn fail(&mut self, error: GlyphError) -> Option<Result<&'a str>> {
        self.stack.clear();
        Some(Err(error))
    }
}

impl<'a> Iterator for Expand<'a> {
    type Item = Result<&'a str>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (rule, pos) = self.stack.last_mut()?;
            let rule: &'a Rule = *rule;

            let Some(child) = rule.children.get(*pos) else {
                self.on_stack.remove(rule.symbol.as_str());
                self.stack.pop();
                continue;
            };
            *pos += 1;

            match child {
                Child::Token(token) => return Some(Ok(token.as_str())),
                Child::Symbol(symbol) => {
                    if self.on_stack.contains(symbol.as_str()) {
                        return self.fail(GlyphError::CycleDetected {
                            symbol: symbol.clone(),
                        });
                    }
                    let Some(next) = self.grammar.get(symbol) else {
                        return self.fail(GlyphError::UndefinedSymbol {
                            symbol: symbol.clone(),
                        });
                    };
                    self.on_stack.insert(next.symbol.as_str());
                    self.stack.push((next, 0));
                }
            }
        }
    }
}

impl Grammar {
    /// Returns an iterator over the raw tokens `symbol` stands for.
    pub fn expand(&self, symbol: &str) -> Result<Expand<'_>> {
        let root = self.get(symbol).ok_or_else(|| GlyphError::UndefinedSymbol {
            symbol: symbol.to_owned(),
        })?;
        Ok(Expand::new(self, root))
    }
}
