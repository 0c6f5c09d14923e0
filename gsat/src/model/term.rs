//! This module defines [Term] and its components.

use std::{fmt, sync::Arc};

#[cfg(test)]
use quickcheck::{Arbitrary, Gen};

use super::symbol::{Constant, FunctionSymbol, SymbolDisplay, SymbolTable};

/// Variable
///
/// Variables are scoped to a single rule
/// and identified by a number within that rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable(u32);

impl Variable {
    /// Create a new [Variable].
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Return the number identifying this variable.
    pub fn id(self) -> u32 {
        self.0
    }

    /// Return the variable with its number shifted by `offset`.
    pub(crate) fn shifted(self, offset: u32) -> Self {
        Self(self.0 + offset)
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?x{}", self.0)
    }
}

/// Term
///
/// Terms are immutable; function terms are reference counted
/// so that unchanged subterms are shared between rules.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Term {
    /// Variable
    Variable(Variable),
    /// Constant
    Constant(Constant),
    /// Skolem function applied to a list of terms
    Function(Arc<FunctionTerm>),
}

/// Function term
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionTerm {
    symbol: FunctionSymbol,
    arguments: Box<[Term]>,
}

impl FunctionTerm {
    /// Return the function symbol of this term.
    pub fn symbol(&self) -> FunctionSymbol {
        self.symbol
    }

    /// Return the arguments of this term.
    pub fn arguments(&self) -> &[Term] {
        &self.arguments
    }
}

impl Term {
    /// Create a variable term.
    pub fn variable(id: u32) -> Self {
        Self::Variable(Variable::new(id))
    }

    /// Create a function term.
    pub fn function<Arguments: IntoIterator<Item = Term>>(
        symbol: FunctionSymbol,
        arguments: Arguments,
    ) -> Self {
        Self::Function(Arc::new(FunctionTerm {
            symbol,
            arguments: arguments.into_iter().collect(),
        }))
    }

    /// Return whether this term is a variable.
    pub fn is_variable(&self) -> bool {
        matches!(self, Term::Variable(_))
    }

    /// Return whether this term is a function term.
    pub fn is_function(&self) -> bool {
        matches!(self, Term::Function(_))
    }

    /// Return whether this term contains no variables.
    pub fn is_ground(&self) -> bool {
        match self {
            Term::Variable(_) => false,
            Term::Constant(_) => true,
            Term::Function(function) => function.arguments.iter().all(Term::is_ground),
        }
    }

    /// Return whether `variable` occurs in this term.
    pub fn contains_variable(&self, variable: Variable) -> bool {
        match self {
            Term::Variable(other) => *other == variable,
            Term::Constant(_) => false,
            Term::Function(function) => function
                .arguments
                .iter()
                .any(|argument| argument.contains_variable(variable)),
        }
    }

    /// Return an iterator over all variables occurring in this term (with repetitions).
    pub fn variables<'a>(&'a self) -> Box<dyn Iterator<Item = Variable> + 'a> {
        match self {
            Term::Variable(variable) => Box::new(std::iter::once(*variable)),
            Term::Constant(_) => Box::new(std::iter::empty()),
            Term::Function(function) => {
                Box::new(function.arguments.iter().flat_map(|term| term.variables()))
            }
        }
    }

    /// Replace variables according to `map`.
    ///
    /// Returns `None` if no variable was replaced,
    /// in which case the caller can keep using the original term.
    /// Function terms are only rebuilt if one of their arguments changed.
    pub fn replace_variables<Map>(&self, map: &Map) -> Option<Term>
    where
        Map: Fn(Variable) -> Option<Term>,
    {
        match self {
            Term::Variable(variable) => map(*variable),
            Term::Constant(_) => None,
            Term::Function(function) => {
                let mut replaced: Option<Vec<Term>> = None;

                for (index, argument) in function.arguments.iter().enumerate() {
                    match (argument.replace_variables(map), &mut replaced) {
                        (Some(new), Some(arguments)) => arguments.push(new),
                        (Some(new), None) => {
                            let mut arguments = function.arguments[..index].to_vec();
                            arguments.push(new);
                            replaced = Some(arguments);
                        }
                        (None, Some(arguments)) => arguments.push(argument.clone()),
                        (None, None) => {}
                    }
                }

                replaced.map(|arguments| Term::function(function.symbol, arguments))
            }
        }
    }
}

impl From<Variable> for Term {
    fn from(value: Variable) -> Self {
        Self::Variable(value)
    }
}

impl From<Constant> for Term {
    fn from(value: Constant) -> Self {
        Self::Constant(value)
    }
}

impl SymbolDisplay for Term {
    fn fmt_symbols(&self, symbols: &SymbolTable, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Variable(variable) => write!(f, "{variable}"),
            Term::Constant(constant) => f.write_str(symbols.constant_name(*constant)),
            Term::Function(function) => {
                write!(f, "{}(", symbols.function_name(function.symbol))?;

                for (index, argument) in function.arguments.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    argument.fmt_symbols(symbols, f)?;
                }

                f.write_str(")")
            }
        }
    }
}

/// Function symbols used by generated terms, with arities 1 and 2
#[cfg(test)]
const ARBITRARY_FUNCTIONS: [(usize, usize); 2] = [(0, 1), (1, 2)];

#[cfg(test)]
fn arbitrary_term(g: &mut Gen, depth: usize) -> Term {
    let choice = u8::arbitrary(g) % if depth == 0 { 2 } else { 3 };

    match choice {
        0 => Term::variable(u32::arbitrary(g) % 4),
        1 => Term::Constant(Constant::from_index(usize::arbitrary(g) % 3)),
        _ => {
            let (symbol, arity) = ARBITRARY_FUNCTIONS[usize::arbitrary(g) % ARBITRARY_FUNCTIONS.len()];
            Term::function(
                FunctionSymbol::from_index(symbol),
                (0..arity).map(|_| arbitrary_term(g, depth - 1)).collect::<Vec<_>>(),
            )
        }
    }
}

#[cfg(test)]
impl Arbitrary for Term {
    fn arbitrary(g: &mut Gen) -> Self {
        arbitrary_term(g, 2)
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use crate::model::symbol::{Constant, FunctionSymbol};

    use super::{Term, Variable};

    #[test]
    fn replace_shares_unchanged_subterms() {
        let f = FunctionSymbol::from_index(0);
        let a = Term::Constant(Constant::from_index(0));

        let inner = Term::function(f, vec![a.clone()]);
        let outer = Term::function(f, vec![inner.clone(), Term::variable(0)]);

        let replaced = outer
            .replace_variables(&|variable| (variable == Variable::new(0)).then(|| a.clone()))
            .unwrap();

        let (Term::Function(replaced), Term::Function(inner)) = (&replaced, &inner) else {
            panic!("expected function terms");
        };
        let Term::Function(kept) = &replaced.arguments()[0] else {
            panic!("expected function term");
        };

        assert!(Arc::ptr_eq(kept, inner));
        assert_eq!(replaced.arguments()[1], a);
    }

    #[test]
    fn replace_without_match_returns_none() {
        let f = FunctionSymbol::from_index(0);
        let term = Term::function(f, vec![Term::variable(1)]);

        assert!(term.replace_variables(&|_| None).is_none());
        assert!(!term.is_ground());
        assert!(term.contains_variable(Variable::new(1)));
        assert_eq!(term.variables().collect::<Vec<_>>(), vec![Variable::new(1)]);
    }
}
