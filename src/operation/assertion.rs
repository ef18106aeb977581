//! Operations that check the program's expectations about taint.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    operation::{ExecuteResult, Operation},
    oracle::{self, Outcome, Predicate},
    vm::VM,
};

/// The `Assert` operation evaluates a predicate on the current path and
/// records the outcome.
///
/// # Semantics
///
/// A violated predicate is recorded on the path and execution of the path
/// continues, so later assertions are still evaluated.
///
/// # Errors
///
/// The path is abandoned if the predicate refers to a name that is not bound
/// on it.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Assert {
    pub predicate: Predicate,
}

impl Assert {
    /// Constructs the operation asserting `predicate`.
    #[must_use]
    pub fn new(predicate: Predicate) -> Self {
        Self { predicate }
    }
}

impl Operation for Assert {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        let instruction_pointer = vm.instruction_pointer()?;
        let state = vm.state_mut()?;
        let outcome = oracle::check(state, &self.predicate, instruction_pointer)?;

        if outcome == Outcome::Violated {
            debug!(
                path = %state.id(),
                location = instruction_pointer,
                predicate = %self.predicate,
                "assertion violated"
            );
        }

        Ok(())
    }

    fn as_text_code(&self) -> String {
        format!("assert {}", self.predicate)
    }
}

#[cfg(test)]
mod test {
    use crate::{
        operation::{
            assertion::Assert,
            property::{Get, Set},
            symbolic::IntroduceSymbolic,
        },
        oracle::{Outcome, Predicate},
        program::{Literal, ObjectDeclaration, Operand, Program},
        vm::{Config, VM},
        watchdog::LazyWatchdog,
    };

    #[test]
    fn assertions_are_judged_per_path() -> anyhow::Result<()> {
        let program = Program::new()
            .with_object(
                ObjectDeclaration::new("customer").with_property("role", Literal::string("user")),
            )
            .then(IntroduceSymbolic::new("p", "p"))
            .then(IntroduceSymbolic::new("t", "t"))
            .then(Set::new(
                Operand::binding("customer"),
                Operand::binding("p"),
                Operand::binding("t"),
            ))
            .then(Get::new(
                Operand::binding("customer"),
                Operand::literal(Literal::string("role")),
                "role",
            ))
            .then(Assert::new(Predicate::is_concrete(Operand::binding("role"))))
            .then(Assert::new(Predicate::is_concrete(Operand::binding("p"))));
        let config = Config::default().with_sensitive_names(["role"]);
        let mut vm = VM::new(&program, config, LazyWatchdog.in_rc())?;
        vm.execute()?;
        let result = vm.consume();

        let outcomes = |index: usize| -> Vec<Outcome> {
            result.states[index]
                .outcomes()
                .iter()
                .map(|record| record.outcome)
                .collect()
        };
        assert_eq!(outcomes(0), vec![Outcome::Held, Outcome::Violated]);
        assert_eq!(outcomes(1), vec![Outcome::Violated, Outcome::Violated]);

        Ok(())
    }
}
