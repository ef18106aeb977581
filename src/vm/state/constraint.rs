//! This module contains the key-equality constraints that a path accumulates
//! as the virtual machine forks on symbolic property keys.

use std::fmt::{Display, Formatter};

use crate::vm::value::BoxedVal;

/// Whether a constraint asserts equality or inequality.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub enum Relation {
    Equal,
    NotEqual,
}

/// A single assumption about a symbolic key, of the form `key == name` or
/// `key != name`.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Constraint {
    /// The symbolic key the assumption is about.
    pub key: BoxedVal,

    /// The relation assumed between the key and the name.
    pub relation: Relation,

    /// The sensitive name the key is compared against.
    pub name: String,
}

impl Display for Constraint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let operator = match self.relation {
            Relation::Equal => "==",
            Relation::NotEqual => "!=",
        };
        write!(f, "{} {operator} {:?}", self.key, self.name)
    }
}

/// What the constraints of a path say about a particular symbolic key.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum KeyResolution {
    /// The key has been assumed equal to this name.
    Resolved(String),

    /// The key is not fixed, and could still equal any of these names.
    ///
    /// An empty list means the key is known to differ from every name that
    /// was asked about.
    Open(Vec<String>),
}

/// The ordered list of constraints accumulated on a path.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Constraints {
    items: Vec<Constraint>,
}

impl Constraints {
    /// Creates an empty constraint list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assumes that `key` equals `name`.
    ///
    /// # Panics
    ///
    /// Panics in debug builds if the assumption contradicts an existing one.
    /// The virtual machine only forks on names that [`Self::resolve`] reports
    /// as still open, so this is a programmer bug.
    pub fn assume_equal(&mut self, key: BoxedVal, name: impl Into<String>) {
        let name = name.into();
        debug_assert!(
            self.admits(&key, &name),
            "Assumption {key} == {name:?} contradicts the path's constraints"
        );
        self.items.push(Constraint {
            key,
            relation: Relation::Equal,
            name,
        });
    }

    /// Assumes that `key` differs from `name`.
    pub fn assume_not_equal(&mut self, key: BoxedVal, name: impl Into<String>) {
        let name = name.into();
        self.items.push(Constraint {
            key,
            relation: Relation::NotEqual,
            name,
        });
    }

    /// Works out which of `names` the symbolic `key` may still equal.
    #[must_use]
    pub fn resolve(&self, key: &BoxedVal, names: &[String]) -> KeyResolution {
        if let Some(fixed) = self
            .items
            .iter()
            .find(|c| c.relation == Relation::Equal && &c.key == key)
        {
            return KeyResolution::Resolved(fixed.name.clone());
        }

        let open = names
            .iter()
            .filter(|name| self.admits(key, name))
            .cloned()
            .collect();
        KeyResolution::Open(open)
    }

    /// Checks whether assuming `key == name` is consistent with the
    /// constraints so far.
    #[must_use]
    pub fn admits(&self, key: &BoxedVal, name: &str) -> bool {
        self.items.iter().filter(|c| &c.key == key).all(|c| match c.relation {
            Relation::Equal => c.name == name,
            Relation::NotEqual => c.name != name,
        })
    }

    /// Checks that no key is assumed equal to two different names, nor both
    /// equal and unequal to the same name.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.items
            .iter()
            .filter(|c| c.relation == Relation::Equal)
            .all(|c| self.admits(&c.key, &c.name))
    }

    /// Gets the constraints in the order they were assumed.
    #[must_use]
    pub fn as_slice(&self) -> &[Constraint] {
        self.items.as_slice()
    }

    /// Gets the number of constraints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Checks if no constraints have been assumed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod test {
    use crate::vm::{
        state::constraint::{Constraints, KeyResolution},
        value::SymbolicValue,
    };

    fn names() -> Vec<String> {
        vec!["role".into(), "toString".into()]
    }

    #[test]
    fn unconstrained_keys_are_open_to_every_name() {
        let constraints = Constraints::new();
        let key = SymbolicValue::introduce(0, "p");

        assert_eq!(constraints.resolve(&key, &names()), KeyResolution::Open(names()));
    }

    #[test]
    fn equality_fixes_the_key() {
        let mut constraints = Constraints::new();
        let key = SymbolicValue::introduce(0, "p");
        constraints.assume_equal(key.clone(), "role");

        assert_eq!(
            constraints.resolve(&key, &names()),
            KeyResolution::Resolved("role".into())
        );
        assert!(!constraints.admits(&key, "toString"));
        assert!(constraints.is_consistent());
        assert_eq!(constraints.as_slice()[0].to_string(), "p == \"role\"");
    }

    #[test]
    fn inequalities_narrow_the_candidates() {
        let mut constraints = Constraints::new();
        let key = SymbolicValue::introduce(0, "p");
        let other = SymbolicValue::introduce(0, "q");
        constraints.assume_not_equal(key.clone(), "role");

        assert_eq!(
            constraints.resolve(&key, &names()),
            KeyResolution::Open(vec!["toString".into()])
        );
        assert_eq!(constraints.resolve(&other, &names()), KeyResolution::Open(names()));
    }
}
