//! This module contains the definition of the explorer itself.

pub mod state;

use tracing::info;

use crate::{
    error,
    explorer::state::State,
    program::Program,
    report::AnalysisReport,
    vm,
    vm::VM,
    watchdog::DynWatchdog,
};

/// Creates a new explorer wrapping the provided `program`, and with the
/// provided `vm_config`.
#[must_use]
pub fn new(
    program: Program,
    vm_config: vm::Config,
    watchdog: DynWatchdog,
) -> Explorer<state::HasProgram> {
    let state = state::HasProgram {
        vm_config,
        watchdog,
    };
    Explorer { program, state }
}

/// The core of the analysis, the `Explorer` is responsible for ingesting a
/// program and outputting a report on whether any of its assertions can be
/// violated.
///
/// # Enforcing Valid State Transitions
///
/// The explorer enforces that only correct state transitions can occur through
/// use of structs that implement the exact state required by it at any given
/// point.
///
/// There is the [`Self::state`] function that provides access to the state data
/// of whichever state the explorer is currently in.
pub struct Explorer<S: State> {
    /// The program that is being analyzed.
    program: Program,

    /// The internal state of the explorer.
    state: S,
}

/// The safe operations available in all states.
///
/// # Modifying the Explorer
///
/// If you feel the need to modify the explorer outside of the standard
/// transitions, perhaps as part of external extensions to the library, you
/// will need to use one of the following functions:
///
/// - [`Explorer::state_mut`]
/// - [`Explorer::transform_state`]
///
/// Both of these are unsafe as they allow violating the invariants of the
/// explorer's state. Be very careful and be sure that you know what you are
/// doing if you reach for these.
impl<S: State> Explorer<S> {
    /// Gets a reference to the program being analyzed.
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Gets an immutable reference to the current state of the explorer.
    pub fn state(&self) -> &S {
        &self.state
    }
}

/// Unsafe operations available in all states.
///
/// These operations are capable of **violating the state invariants** of the
/// explorer, and must be used with the _utmost_ care.
impl<S: State> Explorer<S> {
    /// Gets a mutable reference to the current state of the explorer.
    ///
    /// # Safety
    ///
    /// Do not mutate the state instance unless you totally understand the
    /// state that the explorer is in, and the implications of doing so.
    pub unsafe fn state_mut(&mut self) -> &mut S {
        &mut self.state
    }

    /// Forces the explorer into the state `NS`, with the value of the state
    /// created by applying `transform` to the explorer's current state and
    /// disregarding any safety with regard to state transitions.
    ///
    /// # Safety
    ///
    /// Do not force a state transition for the explorer unless you totally
    /// understand the state that the explorer is in, and the implications
    /// of doing so.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if the provided `transform` returns [`Err`].
    pub unsafe fn transform_state<NS: State>(
        self,
        transform: impl FnOnce(&Program, S) -> error::Result<NS>,
    ) -> error::Result<Explorer<NS>> {
        let state = transform(&self.program, self.state)?;
        let program = self.program;

        Ok(Explorer { program, state })
    }
}

/// A type that allows the user to easily name the initial state of the
/// explorer.
pub type InitialExplorer = Explorer<state::HasProgram>;

/// Operations available on a newly-created explorer.
impl Explorer<state::HasProgram> {
    /// Executes the analysis process from beginning to end, performing all the
    /// intermediate steps automatically and returning the report.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if any step in the process fails. In particular, an
    /// exploration that exceeds its budget or is stopped by the watchdog is an
    /// error rather than a partial report.
    pub fn analyze(self) -> error::Result<AnalysisReport> {
        let explorer = self.prepare_vm()?;
        let explorer = explorer.execute()?;
        let explorer = explorer.judge();
        let report = explorer.report();

        Ok(report.clone())
    }

    /// Prepares the virtual machine for symbolic execution of the program.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if the program's initial objects are malformed.
    pub fn prepare_vm(self) -> error::Result<Explorer<state::VMReady>> {
        unsafe {
            self.transform_state(|program, old_state| {
                let vm = VM::new(program, old_state.vm_config, old_state.watchdog)?;
                Ok(state::VMReady { vm })
            })
        }
    }
}

/// Operations available on an explorer that has a virtual machine ready to
/// execute the program.
impl Explorer<state::VMReady> {
    /// Symbolically executes the program on the [`VM`] along every path.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if execution in the virtual machine fails fatally.
    /// Paths abandoned because of a non-fatal error are part of the result.
    pub fn execute(self) -> error::Result<Explorer<state::ExecutionComplete>> {
        unsafe {
            self.transform_state(|_, mut old_state| {
                old_state.vm.execute()?;
                let execution_result = old_state.vm.consume();
                Ok(state::ExecutionComplete { execution_result })
            })
        }
    }
}

/// Operations available on an explorer whose virtual machine has completed
/// execution of the program.
impl Explorer<state::ExecutionComplete> {
    /// Judges the outcomes recorded on every path and builds the report.
    #[allow(clippy::missing_panics_doc)] // Explicit closure can never return Err
    #[must_use]
    pub fn judge(self) -> Explorer<state::Judged> {
        unsafe {
            // Safe to unwrap as we guarantee that the internal operations cannot fail.
            self.transform_state(|_, old_state| {
                let execution_result = old_state.execution_result;
                let report = AnalysisReport::new(&execution_result.states);
                info!(
                    verdict = %report.verdict,
                    paths = report.paths.len(),
                    violating = report.violating_paths().count(),
                    "analysis complete"
                );
                Ok(state::Judged {
                    execution_result,
                    report,
                })
            })
            .expect("Explicit closure cannot return Err")
        }
    }
}

/// Operations available on an explorer that has judged every path.
impl Explorer<state::Judged> {
    /// Gets the results of executing the program.
    #[must_use]
    pub fn execution_result(&self) -> &vm::ExecutionResult {
        &self.state.execution_result
    }

    /// Gets the report of the analysis.
    #[must_use]
    pub fn report(&self) -> &AnalysisReport {
        &self.state.report
    }
}

#[cfg(test)]
mod test {
    use crate::{
        explorer,
        operation::{assertion::Assert, property::Set, symbolic::IntroduceSymbolic},
        oracle::{Predicate, Verdict},
        program::{Literal, ObjectDeclaration, Operand, Program},
        vm::Config,
        watchdog::LazyWatchdog,
    };

    #[test]
    fn pipeline_steps_can_be_taken_individually() -> anyhow::Result<()> {
        let program = Program::new()
            .with_object(ObjectDeclaration::new("customer"))
            .then(IntroduceSymbolic::new("p", "p"))
            .then(Set::new(
                Operand::binding("customer"),
                Operand::binding("p"),
                Operand::literal(Literal::Bool(true)),
            ))
            .then(Assert::new(Predicate::is_concrete(Operand::binding("p"))));
        let explorer = explorer::new(program, Config::default(), LazyWatchdog.in_rc());

        let explorer = explorer.prepare_vm()?;
        let explorer = explorer.execute()?;
        let explorer = explorer.judge();

        assert_eq!(explorer.execution_result().states.len(), 4);
        assert_eq!(explorer.report().verdict, Verdict::Vulnerable);
        assert_eq!(explorer.program().operations().len(), 3);

        Ok(())
    }

    #[test]
    fn malformed_programs_fail_to_prepare() {
        let program = Program::new()
            .with_object(ObjectDeclaration::new("customer"))
            .with_object(ObjectDeclaration::new("customer"));
        let explorer = explorer::new(program, Config::default(), LazyWatchdog.in_rc());

        assert!(explorer.prepare_vm().is_err());
    }
}
