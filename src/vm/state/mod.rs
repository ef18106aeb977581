//! The state representation for a single path of the symbolic virtual
//! machine, and utilities for dealing with said representation.

pub mod constraint;
pub mod heap;

use std::{
    collections::BTreeMap,
    fmt::{Display, Formatter},
};

use crate::{
    error::{
        container::Locatable,
        execution::{Error, LocatedError, Result},
    },
    oracle::{AssertionRecord, Outcome},
    vm::{
        state::{constraint::Constraints, heap::Heap},
        value::BoxedVal,
    },
};

/// The identifier of a path within a single run.
///
/// Identifiers are allocated in the order that paths are created, so the
/// initial path is always `0`.
#[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct PathId(pub usize);

impl Display for PathId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "path#{}", self.0)
    }
}

/// The state of one branch of exploration.
///
/// A path owns everything it can observe: its heap, the program's variable
/// bindings, the constraints assumed to reach it, and the assertion outcomes
/// recorded along it. Forking copies all of these, so no two paths ever share
/// mutable state.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PathState {
    /// The identifier of this path.
    id: PathId,

    /// The path this one was forked from, if any.
    parent: Option<PathId>,

    /// The objects reachable on this path.
    heap: Heap,

    /// The values bound to the program's names on this path.
    bindings: BTreeMap<String, BoxedVal>,

    /// The key-equality assumptions made to reach this path.
    constraints: Constraints,

    /// The outcomes of the assertions evaluated on this path, in order.
    outcomes: Vec<AssertionRecord>,

    /// The number of fork points along this path.
    fork_depth: usize,

    /// The error that ended exploration of this path early, if any.
    abandoned: Option<LocatedError>,
}

impl PathState {
    /// Constructs the initial path state with the provided `heap` and
    /// `bindings`.
    #[must_use]
    pub fn new_at_start(heap: Heap, bindings: BTreeMap<String, BoxedVal>) -> Self {
        let id = PathId(0);
        let parent = None;
        let constraints = Constraints::new();
        let outcomes = Vec::new();
        let fork_depth = 0;
        let abandoned = None;
        Self {
            id,
            parent,
            heap,
            bindings,
            constraints,
            outcomes,
            fork_depth,
            abandoned,
        }
    }

    /// Forks the state, producing a copy with identifier `id` whose parent is
    /// this state.
    #[must_use]
    pub fn fork(&self, id: PathId) -> Self {
        let mut child = self.clone();
        child.id = id;
        child.parent = Some(self.id);
        child
    }

    /// Gets the identifier of this path.
    #[must_use]
    pub fn id(&self) -> PathId {
        self.id
    }

    /// Gets the identifier of the path this one was forked from.
    #[must_use]
    pub fn parent(&self) -> Option<PathId> {
        self.parent
    }

    /// Gets the heap of this path.
    #[must_use]
    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    /// Gets the heap of this path.
    #[must_use]
    pub fn heap_mut(&mut self) -> &mut Heap {
        &mut self.heap
    }

    /// Binds `value` to `name`, replacing any existing binding.
    pub fn bind(&mut self, name: impl Into<String>, value: BoxedVal) {
        self.bindings.insert(name.into(), value);
    }

    /// Looks up the value bound to `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if `name` is not bound on this path.
    pub fn lookup(&self, name: &str, location: u32) -> Result<&BoxedVal> {
        self.bindings.get(name).ok_or_else(|| {
            Error::UnboundName {
                name: name.to_string(),
            }
            .locate(location)
        })
    }

    /// Gets all of the bindings on this path.
    #[must_use]
    pub fn bindings(&self) -> &BTreeMap<String, BoxedVal> {
        &self.bindings
    }

    /// Gets the constraints assumed to reach this path.
    #[must_use]
    pub fn constraints(&self) -> &Constraints {
        &self.constraints
    }

    /// Gets the constraints assumed to reach this path.
    #[must_use]
    pub fn constraints_mut(&mut self) -> &mut Constraints {
        &mut self.constraints
    }

    /// Records the outcome of an assertion.
    pub fn record(&mut self, record: AssertionRecord) {
        self.outcomes.push(record);
    }

    /// Gets the assertion outcomes recorded on this path.
    #[must_use]
    pub fn outcomes(&self) -> &[AssertionRecord] {
        self.outcomes.as_slice()
    }

    /// Checks if any assertion on this path was violated.
    #[must_use]
    pub fn has_violation(&self) -> bool {
        self.outcomes.iter().any(|o| o.outcome == Outcome::Violated)
    }

    /// Gets the number of fork points along this path.
    #[must_use]
    pub fn fork_depth(&self) -> usize {
        self.fork_depth
    }

    /// Notes that this path passed through another fork point.
    pub fn deepen(&mut self) {
        self.fork_depth += 1;
    }

    /// Marks the path as abandoned because of `error`.
    pub fn abandon(&mut self, error: LocatedError) {
        self.abandoned = Some(error);
    }

    /// Gets the error that ended exploration of this path, if any.
    #[must_use]
    pub fn abandoned(&self) -> Option<&LocatedError> {
        self.abandoned.as_ref()
    }
}

#[cfg(test)]
mod test {
    use std::collections::BTreeMap;

    use crate::{
        error::execution::Error,
        vm::{
            state::{heap::Heap, PathId, PathState},
            value::SymbolicValue,
        },
    };

    #[test]
    fn forks_do_not_share_state() {
        let mut parent = PathState::new_at_start(Heap::new(), BTreeMap::new());
        parent.bind("p", SymbolicValue::introduce(0, "p"));

        let mut child = parent.fork(PathId(1));
        child.bind("q", SymbolicValue::introduce(1, "q"));
        child
            .constraints_mut()
            .assume_not_equal(SymbolicValue::introduce(1, "k"), "role");

        assert_eq!(child.parent(), Some(PathId(0)));
        assert!(parent.lookup("q", 2).is_err());
        assert!(parent.constraints().is_empty());
        assert!(child.lookup("p", 2).is_ok());
    }

    #[test]
    fn unbound_names_are_reported() {
        let state = PathState::new_at_start(Heap::new(), BTreeMap::new());
        let error = state.lookup("customer", 3).unwrap_err();

        assert_eq!(error.location, 3);
        assert_eq!(
            error.payload,
            Error::UnboundName {
                name: "customer".into(),
            }
        );
    }
}
