//! Operations that introduce attacker-controlled values and combine values
//! into strings.

use serde::{Deserialize, Serialize};

use crate::{
    operation::{ExecuteResult, Operation},
    program::Operand,
    vm::{value::SymbolicValue, VM},
};

/// The `IntroduceSymbolic` operation creates a fresh attacker-controlled value.
///
/// # Semantics
///
/// | Input  | Output                       |
/// | :----: | :--------------------------: |
/// | `name` | `into := <fresh symbol name>` |
///
/// Introducing a second value with the same `name` yields a distinct symbol.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct IntroduceSymbolic {
    /// The label displayed for the symbol in reports.
    pub name: String,

    /// The binding that receives the symbol.
    pub into: String,
}

impl IntroduceSymbolic {
    /// Constructs the operation introducing a symbol labelled `name` into the
    /// binding `into`.
    #[must_use]
    pub fn new(name: impl Into<String>, into: impl Into<String>) -> Self {
        let name = name.into();
        let into = into.into();
        Self { name, into }
    }
}

impl Operation for IntroduceSymbolic {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        let instruction_pointer = vm.instruction_pointer()?;
        let value = SymbolicValue::introduce(instruction_pointer, self.name.as_str());
        vm.state_mut()?.bind(self.into.as_str(), value);

        Ok(())
    }

    fn as_text_code(&self) -> String {
        format!("{} = symbolic({:?})", self.into, self.name)
    }
}

/// The `Concat` operation joins two values into a string, as the `+` operator
/// and template literals do.
///
/// # Semantics
///
/// | Input           | Output                 |
/// | :-------------: | :--------------------: |
/// | `left`, `right` | `into := left + right` |
///
/// Object operands are converted through their `toString` member first. The
/// result is symbolic if either converted operand is.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Concat {
    pub left:  Operand,
    pub right: Operand,
    pub into:  String,
}

impl Concat {
    /// Constructs the operation binding `left + right` to `into`.
    #[must_use]
    pub fn new(left: Operand, right: Operand, into: impl Into<String>) -> Self {
        let into = into.into();
        Self { left, right, into }
    }
}

impl Operation for Concat {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        let instruction_pointer = vm.instruction_pointer()?;
        let left = vm.evaluate(&self.left)?;
        let right = vm.evaluate(&self.right)?;

        // Objects take part in concatenation through their string form
        let state = vm.state()?;
        let left = state.heap().stringify(vm.registry(), left, instruction_pointer)?;
        let right = state.heap().stringify(vm.registry(), right, instruction_pointer)?;

        let result = SymbolicValue::concat(instruction_pointer, left, right);
        vm.state_mut()?.bind(self.into.as_str(), result);

        Ok(())
    }

    fn as_text_code(&self) -> String {
        format!("{} = {} + {}", self.into, self.left, self.right)
    }
}

/// The `Stringify` operation converts a value to a string, as an implicit
/// conversion would.
///
/// # Semantics
///
/// | Input   | Output                  |
/// | :-----: | :---------------------: |
/// | `value` | `into := String(value)` |
///
/// Objects convert by calling the `toString` member they resolve.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Stringify {
    pub value: Operand,
    pub into:  String,
}

impl Stringify {
    /// Constructs the operation binding the string form of `value` to `into`.
    #[must_use]
    pub fn new(value: Operand, into: impl Into<String>) -> Self {
        let into = into.into();
        Self { value, into }
    }
}

impl Operation for Stringify {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        let instruction_pointer = vm.instruction_pointer()?;
        let value = vm.evaluate(&self.value)?;
        let result = vm
            .state()?
            .heap()
            .stringify(vm.registry(), value, instruction_pointer)?;
        vm.state_mut()?.bind(self.into.as_str(), result);

        Ok(())
    }

    fn as_text_code(&self) -> String {
        format!("{} = String({})", self.into, self.value)
    }
}

#[cfg(test)]
mod test {
    use crate::{
        operation::symbolic::{Concat, IntroduceSymbolic, Stringify},
        program::{Literal, ObjectDeclaration, Operand, Program},
        vm::{value::known::KnownData, Config, VM},
        watchdog::LazyWatchdog,
    };

    fn run(program: &Program) -> anyhow::Result<VM> {
        let mut vm = VM::new(program, Config::default(), LazyWatchdog.in_rc())?;
        vm.execute()?;
        Ok(vm)
    }

    #[test]
    fn introduced_values_are_bound_as_symbols() -> anyhow::Result<()> {
        let program = Program::new().then(IntroduceSymbolic::new("t", "t"));
        let result = run(&program)?.consume();

        let state = &result.states[0];
        assert!(state.lookup("t", 0)?.is_symbolic());
        assert_eq!(state.lookup("t", 0)?.to_string(), "t");

        Ok(())
    }

    #[test]
    fn concatenation_taints_the_result() -> anyhow::Result<()> {
        let program = Program::new()
            .then(IntroduceSymbolic::new("t", "t"))
            .then(Concat::new(
                Operand::literal(Literal::string("Hello, ")),
                Operand::binding("t"),
                "greeting",
            ))
            .then(Concat::new(
                Operand::literal(Literal::string("a")),
                Operand::literal(Literal::Number(1)),
                "plain",
            ));
        let result = run(&program)?.consume();

        let state = &result.states[0];
        assert!(state.lookup("greeting", 0)?.is_symbolic());
        assert_eq!(
            state.lookup("plain", 0)?.as_known(),
            Some(&KnownData::string("a1"))
        );

        Ok(())
    }

    #[test]
    fn objects_stringify_through_their_to_string_member() -> anyhow::Result<()> {
        let program = Program::new()
            .with_object(ObjectDeclaration::new("customer"))
            .then(Stringify::new(Operand::binding("customer"), "text"));
        let result = run(&program)?.consume();

        assert_eq!(
            result.states[0].lookup("text", 0)?.as_known(),
            Some(&KnownData::object_string_tag())
        );

        Ok(())
    }
}
