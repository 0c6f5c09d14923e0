//! This module defines [UnificationIndex],
//! a path index retrieving all stored atoms that unify with a query atom.

use std::{
    collections::{BTreeSet, HashMap, HashSet},
    hash::Hash,
};

use crate::{
    logic::unification::unify_atoms,
    model::{Atom, Constant, FunctionSymbol, Predicate, Term},
};

/// Identifies a stored (atom, value) pair
///
/// Identifiers are never reused, so ordering by them is ordering by insertion time.
type EntryId = usize;

/// Label of a term position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Label {
    Variable,
    Constant(Constant),
    Function(FunctionSymbol),
}

impl Label {
    fn of(term: &Term) -> Self {
        match term {
            Term::Variable(_) => Label::Variable,
            Term::Constant(constant) => Label::Constant(*constant),
            Term::Function(function) => Label::Function(function.symbol()),
        }
    }
}

/// A term position reached by some path from the atom root
#[derive(Debug, Default)]
struct PathNode {
    /// All entries with a term at this position
    entries: BTreeSet<EntryId>,
    /// Entries grouped by the label of their term at this position
    labels: HashMap<Label, LabelNode>,
}

/// Entries sharing a label at some position, together with the positions below that label
#[derive(Debug, Default)]
struct LabelNode {
    entries: BTreeSet<EntryId>,
    /// One node for each argument position of a function or predicate label
    arguments: Vec<PathNode>,
}

impl LabelNode {
    fn with_arity(arity: usize) -> Self {
        Self {
            entries: BTreeSet::new(),
            arguments: (0..arity).map(|_| PathNode::default()).collect(),
        }
    }

    fn insert(&mut self, terms: &[Term], id: EntryId) {
        debug_assert_eq!(self.arguments.len(), terms.len());

        self.entries.insert(id);
        for (node, term) in self.arguments.iter_mut().zip(terms) {
            node.insert(term, id);
        }
    }

    fn remove(&mut self, terms: &[Term], id: EntryId) {
        self.entries.remove(&id);
        for (node, term) in self.arguments.iter_mut().zip(terms) {
            node.remove(term, id);
        }
    }

    /// Return the entries whose arguments may unify with `terms`.
    fn retrieve(&self, terms: &[Term]) -> BTreeSet<EntryId> {
        let mut result: Option<BTreeSet<EntryId>> = None;

        for (node, term) in self.arguments.iter().zip(terms) {
            let candidates = node.retrieve(term);
            let intersection = match result {
                Some(previous) => previous.intersection(&candidates).copied().collect(),
                None => candidates,
            };

            if intersection.is_empty() {
                return intersection;
            }
            result = Some(intersection);
        }

        result.unwrap_or_else(|| self.entries.clone())
    }
}

impl PathNode {
    fn insert(&mut self, term: &Term, id: EntryId) {
        self.entries.insert(id);

        let arguments = arguments(term);
        self.labels
            .entry(Label::of(term))
            .or_insert_with(|| LabelNode::with_arity(arguments.len()))
            .insert(arguments, id);
    }

    fn remove(&mut self, term: &Term, id: EntryId) {
        self.entries.remove(&id);

        let label = Label::of(term);
        if let Some(node) = self.labels.get_mut(&label) {
            node.remove(arguments(term), id);

            if node.entries.is_empty() {
                self.labels.remove(&label);
            }
        }
    }

    /// Return the entries whose term at this position may unify with `term`.
    fn retrieve(&self, term: &Term) -> BTreeSet<EntryId> {
        if term.is_variable() {
            return self.entries.clone();
        }

        let mut result = match self.labels.get(&Label::Variable) {
            Some(variables) => variables.entries.clone(),
            None => BTreeSet::new(),
        };
        if let Some(node) = self.labels.get(&Label::of(term)) {
            result.extend(node.retrieve(arguments(term)));
        }

        result
    }
}

/// Return the arguments of a function term, or nothing for other terms.
fn arguments(term: &Term) -> &[Term] {
    match term {
        Term::Function(function) => function.arguments(),
        Term::Variable(_) | Term::Constant(_) => &[],
    }
}

/// A stored (atom, value) pair
#[derive(Debug)]
struct IndexEntry<V> {
    atom: Atom,
    value: V,
    /// How often this pair was inserted
    count: usize,
}

/// Index over atoms supporting the retrieval of all stored atoms unifying with a query
///
/// Each stored atom is associated with a value, usually the identifier of the rule it belongs to.
/// The index is a trie over term positions: for each position, entries are grouped
/// by the symbol found there, with variables grouped under a label of their own.
/// A query only visits the branches of its own symbols and the variable branches,
/// and the remaining candidates are confirmed by unification.
/// Variables of stored atoms and of queries are considered to be distinct.
#[derive(Debug)]
pub struct UnificationIndex<V> {
    predicates: HashMap<Predicate, LabelNode>,
    entries: HashMap<EntryId, IndexEntry<V>>,
    lookup: HashMap<(Atom, V), EntryId>,
    next_id: EntryId,
}

impl<V> Default for UnificationIndex<V> {
    fn default() -> Self {
        Self {
            predicates: HashMap::new(),
            entries: HashMap::new(),
            lookup: HashMap::new(),
            next_id: 0,
        }
    }
}

impl<V: Clone + Eq + Hash> UnificationIndex<V> {
    /// Create a new empty [UnificationIndex].
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the number of distinct (atom, value) pairs stored in the index.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Store `atom` with associated `value`.
    ///
    /// Inserting the same pair several times requires the same number of removals.
    pub fn put(&mut self, atom: Atom, value: V) {
        let key = (atom, value);
        if let Some(id) = self.lookup.get(&key) {
            if let Some(entry) = self.entries.get_mut(id) {
                entry.count += 1;
            }
            return;
        }

        let (atom, value) = key;
        let id = self.next_id;
        self.next_id += 1;

        self.predicates
            .entry(atom.predicate())
            .or_insert_with(|| LabelNode::with_arity(atom.arity()))
            .insert(atom.terms(), id);

        self.lookup.insert((atom.clone(), value.clone()), id);
        self.entries.insert(
            id,
            IndexEntry {
                atom,
                value,
                count: 1,
            },
        );
    }

    /// Remove one occurrence of the pair `atom` and `value`.
    ///
    /// Returns `false` if the pair is not stored in the index.
    pub fn remove(&mut self, atom: &Atom, value: &V) -> bool {
        let key = (atom.clone(), value.clone());
        let Some(&id) = self.lookup.get(&key) else {
            return false;
        };

        if let Some(entry) = self.entries.get_mut(&id) {
            if entry.count > 1 {
                entry.count -= 1;
                return true;
            }
        }

        self.lookup.remove(&key);
        self.entries.remove(&id);

        if let Some(node) = self.predicates.get_mut(&atom.predicate()) {
            node.remove(atom.terms(), id);

            if node.entries.is_empty() {
                self.predicates.remove(&atom.predicate());
            }
        }

        true
    }

    /// Return all stored (atom, value) pairs whose atom unifies with `query`,
    /// in the order of their insertion.
    pub fn unifiable<'a>(&'a self, query: &'a Atom) -> impl Iterator<Item = (&'a Atom, &'a V)> {
        let candidates = match self.predicates.get(&query.predicate()) {
            Some(node) if node.arguments.len() == query.arity() => node.retrieve(query.terms()),
            _ => BTreeSet::new(),
        };
        let offset = query.max_variable().map_or(0, |variable| variable.id() + 1);

        candidates.into_iter().filter_map(move |id| {
            let entry = self.entries.get(&id)?;
            unify_atoms(query, &entry.atom.shifted(offset)).map(|_| (&entry.atom, &entry.value))
        })
    }

    /// Return the values of all stored atoms that unify with `query`,
    /// without duplicates and in the order of their first insertion.
    pub fn get(&self, query: &Atom) -> Vec<V> {
        let mut seen = HashSet::new();

        self.unifiable(query)
            .filter(|(_, value)| seen.insert(*value))
            .map(|(_, value)| value.clone())
            .collect()
    }
}

#[cfg(test)]
mod test {
    use std::collections::BTreeSet;

    use quickcheck_macros::quickcheck;
    use test_log::test;

    use crate::{
        logic::unification::unify_atoms,
        model::{
            symbol::{Constant, FunctionSymbol, Predicate},
            Atom, Term,
        },
    };

    use super::UnificationIndex;

    fn x(id: u32) -> Term {
        Term::variable(id)
    }

    fn brute_force(stored: &[(Atom, usize)], query: &Atom) -> BTreeSet<usize> {
        let offset = query.max_variable().map_or(0, |variable| variable.id() + 1);

        stored
            .iter()
            .filter(|(atom, _)| unify_atoms(query, &atom.shifted(offset)).is_some())
            .map(|(_, value)| *value)
            .collect()
    }

    fn retrieved(index: &UnificationIndex<usize>, query: &Atom) -> BTreeSet<usize> {
        index.get(query).into_iter().collect()
    }

    #[test]
    fn function_terms_against_variables() {
        let r = Predicate::from_index(0);
        let f = FunctionSymbol::from_index(0);
        let g = FunctionSymbol::from_index(1);

        let mut index = UnificationIndex::new();
        index.put(Atom::new(r, vec![Term::function(f, vec![x(1)])]), "T1");

        assert_eq!(index.get(&Atom::new(r, vec![x(1)])), vec!["T1"]);
        assert_eq!(
            index.get(&Atom::new(r, vec![Term::function(f, vec![x(0)])])),
            vec!["T1"]
        );
        assert!(index
            .get(&Atom::new(r, vec![Term::function(g, vec![x(1)])]))
            .is_empty());
        assert!(index
            .get(&Atom::new(r, vec![Term::Constant(Constant::from_index(0))]))
            .is_empty());
        assert!(index
            .get(&Atom::new(Predicate::from_index(1), vec![x(1)]))
            .is_empty());
    }

    #[test]
    fn variables_match_everything() {
        let r = Predicate::from_index(0);
        let f = FunctionSymbol::from_index(0);
        let a = Term::Constant(Constant::from_index(0));

        let mut index = UnificationIndex::new();
        index.put(Atom::new(r, vec![a.clone(), x(0)]), 0);
        index.put(Atom::new(r, vec![Term::function(f, vec![a.clone()]), a.clone()]), 1);
        index.put(Atom::new(r, vec![x(0), x(0)]), 2);

        assert_eq!(index.get(&Atom::new(r, vec![x(0), x(1)])), vec![0, 1, 2]);
        assert_eq!(index.get(&Atom::new(r, vec![a.clone(), a.clone()])), vec![0, 2]);
        assert_eq!(
            index.get(&Atom::new(r, vec![x(0), Term::function(f, vec![x(0)])])),
            vec![0]
        );
    }

    #[test]
    fn insert_remove_cycles() {
        let t = Predicate::from_index(0);
        let f = FunctionSymbol::from_index(0);
        let g = FunctionSymbol::from_index(1);

        let first = Atom::new(t, vec![x(0), Term::function(f, vec![x(1)]), x(2)]);
        let second = Atom::new(
            t,
            vec![x(0), Term::function(f, vec![Term::function(g, vec![x(1)])]), x(2)],
        );
        let shallow = Atom::new(t, vec![x(5), Term::function(f, vec![x(6)]), x(7)]);
        let deep = Atom::new(
            t,
            vec![x(5), Term::function(f, vec![Term::function(g, vec![x(6)])]), x(7)],
        );
        let constant = Atom::new(
            t,
            vec![
                x(5),
                Term::function(f, vec![Term::Constant(Constant::from_index(0))]),
                x(7),
            ],
        );

        let mut index = UnificationIndex::new();
        index.put(first.clone(), 1);
        index.put(second.clone(), 2);

        assert_eq!(index.get(&shallow), vec![1, 2]);
        assert_eq!(index.get(&deep), vec![1, 2]);
        assert_eq!(index.get(&constant), vec![1]);

        assert!(index.remove(&first, &1));
        assert_eq!(index.get(&shallow), vec![2]);
        assert_eq!(index.get(&deep), vec![2]);
        assert!(index.get(&constant).is_empty());
        assert!(!index.remove(&first, &1));

        index.put(first.clone(), 1);
        assert_eq!(index.get(&shallow), vec![2, 1]);
        assert_eq!(index.get(&constant), vec![1]);

        assert!(index.remove(&second, &2));
        assert!(index.remove(&first, &1));
        assert!(index.is_empty());
        assert!(index.get(&shallow).is_empty());
        assert!(index.predicates.is_empty());
    }

    #[test]
    fn entries_are_reference_counted() {
        let r = Predicate::from_index(0);
        let atom = Atom::new(r, vec![x(0)]);
        let other = Atom::new(r, vec![x(1)]);

        let mut index = UnificationIndex::new();
        index.put(atom.clone(), 7);
        index.put(atom.clone(), 7);
        index.put(other.clone(), 7);
        assert_eq!(index.len(), 2);
        assert_eq!(index.get(&atom), vec![7]);

        assert!(index.remove(&atom, &7));
        assert!(index.remove(&other, &7));
        assert_eq!(index.get(&atom), vec![7]);

        assert!(index.remove(&atom, &7));
        assert!(index.get(&atom).is_empty());
    }

    #[quickcheck]
    fn retrieval_agrees_with_unification(stored: Vec<Atom>, removed: Vec<usize>, query: Atom) -> bool {
        let mut index = UnificationIndex::new();
        let mut remaining: Vec<(Atom, usize)> = Vec::new();

        for (value, atom) in stored.into_iter().enumerate() {
            index.put(atom.clone(), value);
            remaining.push((atom, value));
        }

        for position in removed {
            if remaining.is_empty() {
                break;
            }

            let (atom, value) = remaining.remove(position % remaining.len());
            index.remove(&atom, &value);
        }

        retrieved(&index, &query) == brute_force(&remaining, &query)
    }
}
