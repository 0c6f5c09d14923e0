//! This module defines [SymbolTable], the arena of interned symbols.
//!
//! Predicates, function symbols and constants are referred to by small integer handles,
//! which makes comparing and hashing atoms cheap.
//! Names are only needed for displaying rules.

use std::{collections::HashMap, fmt, sync::Arc};

macro_rules! symbol_handle {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            /// Return the position of this symbol in the [SymbolTable].
            pub fn index(self) -> usize {
                self.0 as usize
            }

            pub(crate) fn from_index(index: usize) -> Self {
                Self(u32::try_from(index).expect("symbol table exceeds u32::MAX entries"))
            }
        }
    };
}

symbol_handle!(
    /// Handle of an interned predicate
    Predicate
);
symbol_handle!(
    /// Handle of an interned function symbol
    ///
    /// Function symbols are only created through skolemization.
    FunctionSymbol
);
symbol_handle!(
    /// Handle of an interned constant
    Constant
);

/// A symbol name together with its arity
#[derive(Debug, Clone)]
struct SymbolEntry {
    name: Arc<str>,
    arity: usize,
}

/// Arity of a symbol differs from a previous use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ArityConflict {
    /// Arity the symbol was registered with
    pub(crate) expected: usize,
}

/// Interning arena for all symbols occurring in a rule set
#[derive(Debug, Default, Clone)]
pub struct SymbolTable {
    predicates: Vec<SymbolEntry>,
    predicate_lookup: HashMap<Arc<str>, Predicate>,

    functions: Vec<SymbolEntry>,
    function_lookup: HashMap<Arc<str>, FunctionSymbol>,

    constants: Vec<Arc<str>>,
    constant_lookup: HashMap<Arc<str>, Constant>,

    /// Number assigned to each rule that received Skolem symbols, keyed by its canonical text
    skolem_rules: HashMap<String, usize>,
}

impl SymbolTable {
    /// Create a new empty [SymbolTable].
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the [Predicate] with the given name and arity, interning it if necessary.
    pub(crate) fn predicate(&mut self, name: &str, arity: usize) -> Result<Predicate, ArityConflict> {
        if let Some(&predicate) = self.predicate_lookup.get(name) {
            let expected = self.predicates[predicate.index()].arity;
            return if expected == arity {
                Ok(predicate)
            } else {
                Err(ArityConflict { expected })
            };
        }

        let name: Arc<str> = Arc::from(name);
        let predicate = Predicate::from_index(self.predicates.len());
        self.predicates.push(SymbolEntry {
            name: name.clone(),
            arity,
        });
        self.predicate_lookup.insert(name, predicate);

        Ok(predicate)
    }

    /// Return the [Constant] with the given name, interning it if necessary.
    pub fn constant(&mut self, name: &str) -> Constant {
        if let Some(&constant) = self.constant_lookup.get(name) {
            return constant;
        }

        let name: Arc<str> = Arc::from(name);
        let constant = Constant::from_index(self.constants.len());
        self.constants.push(name.clone());
        self.constant_lookup.insert(name, constant);

        constant
    }

    /// Return the Skolem [FunctionSymbol] for the existential variable
    /// with position `existential` in the rule identified by `rule_key`.
    ///
    /// The result only depends on the two keys,
    /// so normalizing the same rule twice yields the same symbol.
    pub(crate) fn skolem(&mut self, rule_key: &str, existential: usize, arity: usize) -> FunctionSymbol {
        let next_rule = self.skolem_rules.len();
        let rule_number = *self
            .skolem_rules
            .entry(rule_key.to_string())
            .or_insert(next_rule);

        let name = format!("sk{rule_number}_{existential}");
        if let Some(&function) = self.function_lookup.get(name.as_str()) {
            debug_assert_eq!(self.functions[function.index()].arity, arity);
            return function;
        }

        let name: Arc<str> = Arc::from(name);
        let function = FunctionSymbol::from_index(self.functions.len());
        self.functions.push(SymbolEntry {
            name: name.clone(),
            arity,
        });
        self.function_lookup.insert(name, function);

        function
    }

    /// Find a predicate by its name.
    pub fn lookup_predicate(&self, name: &str) -> Option<Predicate> {
        self.predicate_lookup.get(name).copied()
    }

    /// Return the name of a [Predicate].
    pub fn predicate_name(&self, predicate: Predicate) -> &str {
        &self.predicates[predicate.index()].name
    }

    /// Return the arity of a [Predicate].
    pub fn predicate_arity(&self, predicate: Predicate) -> usize {
        self.predicates[predicate.index()].arity
    }

    /// Return the name of a [FunctionSymbol].
    pub fn function_name(&self, function: FunctionSymbol) -> &str {
        &self.functions[function.index()].name
    }

    /// Return the arity of a [FunctionSymbol].
    pub fn function_arity(&self, function: FunctionSymbol) -> usize {
        self.functions[function.index()].arity
    }

    /// Return the name of a [Constant].
    pub fn constant_name(&self, constant: Constant) -> &str {
        &self.constants[constant.index()]
    }

    /// Return an iterator over all interned predicates.
    pub fn predicates(&self) -> impl Iterator<Item = Predicate> {
        (0..self.predicates.len()).map(Predicate::from_index)
    }

    /// Return the number of Skolem function symbols created so far.
    pub fn skolem_count(&self) -> usize {
        self.functions.len()
    }
}

/// Values that need a [SymbolTable] to be displayed
pub trait SymbolDisplay {
    /// Write `self` into the formatter, resolving names through `symbols`.
    fn fmt_symbols(&self, symbols: &SymbolTable, f: &mut fmt::Formatter<'_>) -> fmt::Result;

    /// Return an object implementing [fmt::Display] for `self`.
    fn display<'a>(&'a self, symbols: &'a SymbolTable) -> Displayed<'a, Self>
    where
        Self: Sized,
    {
        Displayed {
            value: self,
            symbols,
        }
    }
}

/// A value bound to the [SymbolTable] its names are stored in
#[derive(Debug, Clone, Copy)]
pub struct Displayed<'a, T> {
    value: &'a T,
    symbols: &'a SymbolTable,
}

impl<T: SymbolDisplay> fmt::Display for Displayed<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value.fmt_symbols(self.symbols, f)
    }
}
