//! This module defines [RuleSet].

use std::fmt;

use super::{
    rule::{Rule, RuleKind},
    symbol::{SymbolDisplay, SymbolTable},
};

/// A collection of [Rule]s together with the [SymbolTable] their symbols live in
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    symbols: SymbolTable,
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Create a new [RuleSet].
    pub fn new(symbols: SymbolTable, rules: Vec<Rule>) -> Self {
        Self { symbols, rules }
    }

    /// Return the symbol table of this rule set.
    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Return the rules of this rule set.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Return an iterator over the rules of this rule set.
    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    /// Return the number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Return whether this rule set contains no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Return the number of rules of the given kind.
    pub fn count_kind(&self, kind: RuleKind) -> usize {
        self.rules.iter().filter(|rule| rule.kind() == kind).count()
    }

    /// Return whether the rule set contains `rule` (up to variable renaming).
    pub fn contains(&self, rule: &Rule) -> bool {
        self.rules.contains(rule)
    }

    /// Keep only the rules satisfying `predicate`.
    pub fn retain<Filter: FnMut(&Rule) -> bool>(&mut self, filter: Filter) {
        self.rules.retain(filter)
    }

    /// Split this rule set into its symbol table and its rules.
    pub fn into_parts(self) -> (SymbolTable, Vec<Rule>) {
        (self.symbols, self.rules)
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rule in &self.rules {
            writeln!(f, "{}", rule.display(&self.symbols))?;
        }

        Ok(())
    }
}
