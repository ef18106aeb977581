//! This module contains the assertion oracle, which judges the predicates of a
//! program against the state of each path and reduces the outcomes of all
//! paths to a verdict.

use std::fmt::{Display, Formatter};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    error::execution::Result,
    program::Operand,
    vm::state::PathState,
};

/// A predicate over the values visible on a path.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    /// Holds if the operand depends on attacker-controlled input.
    IsSymbolic(Operand),

    /// Holds if the inner predicate does not.
    Not(Box<Predicate>),

    /// Holds if every inner predicate holds.
    All(Vec<Predicate>),

    /// Holds if any inner predicate holds.
    Any(Vec<Predicate>),
}

impl Predicate {
    /// Constructs the predicate that `operand` is symbolic.
    #[must_use]
    pub fn is_symbolic(operand: Operand) -> Self {
        Self::IsSymbolic(operand)
    }

    /// Constructs the predicate that `operand` is not symbolic, which is the
    /// usual form of a taint assertion.
    #[must_use]
    pub fn is_concrete(operand: Operand) -> Self {
        Self::negate(Self::IsSymbolic(operand))
    }

    /// Constructs the negation of `predicate`.
    #[must_use]
    pub fn negate(predicate: Self) -> Self {
        Self::Not(Box::new(predicate))
    }

    /// Evaluates the predicate against `state`.
    ///
    /// Every sub-predicate is evaluated, so an unbound name anywhere in the
    /// predicate is reported even where it could not affect the result.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if the predicate refers to a name that is not bound on
    /// the path.
    pub fn evaluate(&self, state: &PathState, location: u32) -> Result<bool> {
        match self {
            Self::IsSymbolic(Operand::Binding(name)) => {
                Ok(state.lookup(name, location)?.is_symbolic())
            }
            Self::IsSymbolic(Operand::Literal(_)) => Ok(false),
            Self::Not(inner) => Ok(!inner.evaluate(state, location)?),
            Self::All(inner) => Ok(Self::evaluate_all(inner, state, location)?
                .into_iter()
                .all(|held| held)),
            Self::Any(inner) => Ok(Self::evaluate_all(inner, state, location)?
                .into_iter()
                .any(|held| held)),
        }
    }

    /// Evaluates each of `predicates` against `state`.
    fn evaluate_all(predicates: &[Self], state: &PathState, location: u32) -> Result<Vec<bool>> {
        predicates
            .iter()
            .map(|p| p.evaluate(state, location))
            .collect()
    }
}

impl Display for Predicate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IsSymbolic(operand) => write!(f, "is_symbolic({operand})"),
            Self::Not(inner) => write!(f, "!{inner}"),
            Self::All(inner) if inner.is_empty() => write!(f, "true"),
            Self::Any(inner) if inner.is_empty() => write!(f, "false"),
            Self::All(inner) => write!(f, "({})", inner.iter().join(" && ")),
            Self::Any(inner) => write!(f, "({})", inner.iter().join(" || ")),
        }
    }
}

/// The outcome of evaluating an assertion on one path.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Held,
    Violated,
}

/// The record of an assertion evaluated on a path.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct AssertionRecord {
    /// The index of the assertion in the program.
    pub location: u32,

    /// The text of the predicate that was asserted.
    pub predicate: String,

    /// Whether the predicate held.
    pub outcome: Outcome,
}

/// Evaluates `predicate` against `state`, recording the outcome on the path.
///
/// A violation is recorded like any other outcome, and exploration of the path
/// continues.
///
/// # Errors
///
/// Returns [`Err`] if the predicate cannot be evaluated on the path.
pub fn check(state: &mut PathState, predicate: &Predicate, location: u32) -> Result<Outcome> {
    let outcome = if predicate.evaluate(state, location)? {
        Outcome::Held
    } else {
        Outcome::Violated
    };

    state.record(AssertionRecord {
        location,
        predicate: predicate.to_string(),
        outcome,
    });

    Ok(outcome)
}

/// The conclusion of an analysis over every path.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// At least one path violated an assertion.
    Vulnerable,

    /// No path violated an assertion.
    Safe,
}

impl Display for Verdict {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vulnerable => write!(f, "vulnerable"),
            Self::Safe => write!(f, "safe"),
        }
    }
}

/// Reduces the outcomes recorded on `states` to a verdict.
#[must_use]
pub fn verdict(states: &[PathState]) -> Verdict {
    if states.iter().any(PathState::has_violation) {
        Verdict::Vulnerable
    } else {
        Verdict::Safe
    }
}

#[cfg(test)]
mod test {
    use std::collections::BTreeMap;

    use crate::{
        oracle::{check, verdict, Outcome, Predicate, Verdict},
        program::{Literal, Operand},
        vm::{
            state::{heap::Heap, PathId, PathState},
            value::{known::KnownData, Provenance, SymbolicValue},
        },
    };

    fn state() -> PathState {
        let mut state = PathState::new_at_start(Heap::new(), BTreeMap::new());
        state.bind("t", SymbolicValue::introduce(0, "t"));
        state.bind(
            "role",
            SymbolicValue::known(0, KnownData::string("user"), Provenance::Initial),
        );
        state
    }

    #[test]
    fn predicates_combine() -> anyhow::Result<()> {
        let state = state();
        let tainted = Predicate::is_symbolic(Operand::binding("t"));
        let clean = Predicate::is_symbolic(Operand::binding("role"));

        assert!(tainted.evaluate(&state, 0)?);
        assert!(!clean.evaluate(&state, 0)?);
        assert!(Predicate::Any(vec![tainted.clone(), clean.clone()]).evaluate(&state, 0)?);
        assert!(!Predicate::All(vec![tainted, clean]).evaluate(&state, 0)?);
        assert!(!Predicate::is_symbolic(Operand::literal(Literal::Null)).evaluate(&state, 0)?);

        Ok(())
    }

    #[test]
    fn unbound_names_fail_evaluation_even_when_irrelevant() {
        let state = state();
        let predicate = Predicate::Any(vec![
            Predicate::is_symbolic(Operand::binding("t")),
            Predicate::is_symbolic(Operand::binding("missing")),
        ]);

        assert!(predicate.evaluate(&state, 4).is_err());
    }

    #[test]
    fn violations_are_recorded_without_stopping() -> anyhow::Result<()> {
        let mut state = state();
        let first = check(&mut state, &Predicate::is_concrete(Operand::binding("t")), 3)?;
        let second = check(&mut state, &Predicate::is_concrete(Operand::binding("role")), 4)?;

        assert_eq!(first, Outcome::Violated);
        assert_eq!(second, Outcome::Held);
        assert_eq!(state.outcomes().len(), 2);
        assert_eq!(state.outcomes()[0].predicate, "!is_symbolic(t)");
        assert_eq!(state.outcomes()[0].location, 3);

        Ok(())
    }

    #[test]
    fn any_violation_makes_the_verdict_vulnerable() -> anyhow::Result<()> {
        let safe = state();
        let mut unsafe_path = safe.fork(PathId(1));
        check(&mut unsafe_path, &Predicate::is_concrete(Operand::binding("t")), 0)?;

        assert_eq!(verdict(&[safe.clone()]), Verdict::Safe);
        assert_eq!(verdict(&[safe, unsafe_path]), Verdict::Vulnerable);
        assert_eq!(verdict(&[]), Verdict::Safe);

        Ok(())
    }
}
