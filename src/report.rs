//! This module contains the report produced at the end of an analysis.

use serde::Serialize;

use crate::{
    oracle::{self, AssertionRecord, Outcome, Verdict},
    vm::state::PathState,
};

/// The result of analysing a program.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct AnalysisReport {
    /// Whether any path violated an assertion.
    pub verdict: Verdict,

    /// The paths that were explored, ordered by identifier.
    pub paths: Vec<PathReport>,
}

impl AnalysisReport {
    /// Builds the report for the final `states` of every path.
    #[must_use]
    pub fn new(states: &[PathState]) -> Self {
        let verdict = oracle::verdict(states);
        let paths = states.iter().map(PathReport::from).collect();
        Self { verdict, paths }
    }

    /// Checks if the analysis found a violation.
    #[must_use]
    pub fn is_vulnerable(&self) -> bool {
        self.verdict == Verdict::Vulnerable
    }

    /// Gets the paths on which at least one assertion was violated.
    pub fn violating_paths(&self) -> impl Iterator<Item = &PathReport> {
        self.paths.iter().filter(|p| p.has_violation())
    }

    /// Gets the path with the identifier `id`.
    #[must_use]
    pub fn path(&self, id: usize) -> Option<&PathReport> {
        self.paths.iter().find(|p| p.id == id)
    }

    /// Renders the report as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// The report for a single path.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct PathReport {
    /// The identifier of the path.
    pub id: usize,

    /// The identifier of the path this one was forked from.
    pub parent: Option<usize>,

    /// The assumptions made to reach the path, such as `p == "role"`.
    pub constraints: Vec<String>,

    /// The outcomes of the assertions evaluated on the path, in order.
    pub outcomes: Vec<AssertionRecord>,

    /// The error that ended the path early, if any.
    pub abandoned: Option<String>,
}

impl PathReport {
    /// Checks if any assertion on this path was violated.
    #[must_use]
    pub fn has_violation(&self) -> bool {
        self.outcomes.iter().any(|o| o.outcome == Outcome::Violated)
    }

    /// Gets the outcome of the assertion at `location`, if it was evaluated on
    /// this path.
    #[must_use]
    pub fn outcome_at(&self, location: u32) -> Option<Outcome> {
        self.outcomes
            .iter()
            .find(|o| o.location == location)
            .map(|o| o.outcome)
    }
}

impl From<&PathState> for PathReport {
    fn from(state: &PathState) -> Self {
        let id = state.id().0;
        let parent = state.parent().map(|p| p.0);
        let constraints = state
            .constraints()
            .as_slice()
            .iter()
            .map(ToString::to_string)
            .collect();
        let outcomes = state.outcomes().to_vec();
        let abandoned = state.abandoned().map(ToString::to_string);
        Self {
            id,
            parent,
            constraints,
            outcomes,
            abandoned,
        }
    }
}

#[cfg(test)]
mod test {
    use std::collections::BTreeMap;

    use crate::{
        oracle::{check, Outcome, Predicate, Verdict},
        program::Operand,
        report::AnalysisReport,
        vm::{
            state::{heap::Heap, PathId, PathState},
            value::SymbolicValue,
        },
    };

    #[test]
    fn report_describes_every_path() -> anyhow::Result<()> {
        let key = SymbolicValue::introduce(0, "p");
        let mut root = PathState::new_at_start(Heap::new(), BTreeMap::new());
        root.bind("t", SymbolicValue::introduce(1, "t"));

        let mut forked = root.fork(PathId(1));
        forked.constraints_mut().assume_equal(key.clone(), "role");
        check(&mut forked, &Predicate::is_concrete(Operand::binding("t")), 4)?;
        root.constraints_mut().assume_not_equal(key, "role");

        let report = AnalysisReport::new(&[root, forked]);
        assert_eq!(report.verdict, Verdict::Vulnerable);
        assert!(report.is_vulnerable());
        assert_eq!(report.violating_paths().count(), 1);

        let path = report.path(1).unwrap();
        assert_eq!(path.parent, Some(0));
        assert_eq!(path.constraints, vec!["p == \"role\"".to_string()]);
        assert_eq!(path.outcome_at(4), Some(Outcome::Violated));
        assert_eq!(report.path(0).unwrap().constraints, vec!["p != \"role\"".to_string()]);

        let json = report.to_json()?;
        assert!(json.contains("\"verdict\": \"vulnerable\""));
        assert!(json.contains("\"outcome\": \"violated\""));

        Ok(())
    }
}
