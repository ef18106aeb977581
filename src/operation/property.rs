//! Operations that create objects and access their properties.

use std::collections::BTreeMap;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    error::{
        container::Locatable,
        execution::{Error, Result},
    },
    operation::{ExecuteResult, Operation},
    program::{Literal, Operand},
    vm::{
        state::{
            constraint::KeyResolution,
            heap::{JsObject, ObjectHandle},
        },
        value::{known::KnownData, BoxedVal, Provenance, SymbolicValue, SymbolicValueData},
        KeyChoice,
        PropertyKey,
        VM,
    },
};

/// The `NewObject` operation creates a plain object.
///
/// # Semantics
///
/// | Input                     | Output                             |
/// | :-----------------------: | :--------------------------------: |
/// | `properties`, `prototype` | `into := { ...properties }`        |
///
/// Without a `prototype` the object chains directly to the root, where the
/// built-in members live.
///
/// # Errors
///
/// The path is abandoned if `prototype` is given but is neither an object,
/// `null`, nor attacker-controlled.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct NewObject {
    /// The binding that receives the new object.
    pub into: String,

    /// The own properties the object is created with.
    #[serde(default)]
    pub properties: BTreeMap<String, Literal>,

    /// The value the object's prototype is linked to.
    #[serde(default)]
    pub prototype: Option<Operand>,
}

impl NewObject {
    /// Constructs the operation creating an empty object bound to `into`.
    #[must_use]
    pub fn new(into: impl Into<String>) -> Self {
        let into = into.into();
        let properties = BTreeMap::new();
        let prototype = None;
        Self {
            into,
            properties,
            prototype,
        }
    }

    /// Adds the own property `key` with the value `value` to the object.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: Literal) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    /// Links the object's prototype to `prototype`.
    #[must_use]
    pub fn with_prototype(mut self, prototype: Operand) -> Self {
        self.prototype = Some(prototype);
        self
    }
}

impl Operation for NewObject {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        let instruction_pointer = vm.instruction_pointer()?;
        let prototype = self
            .prototype
            .as_ref()
            .map(|operand| vm.evaluate(operand))
            .transpose()?;

        // Build the object from the literal properties
        let mut object = JsObject::new(self.into.as_str());
        for (key, value) in &self.properties {
            let value =
                SymbolicValue::known(instruction_pointer, value.to_known(), Provenance::Literal);
            object.insert(key.as_str(), value);
        }

        // Place it on the heap, linking the prototype if one was asked for
        let state = vm.state_mut()?;
        let handle = state.heap_mut().allocate(object);
        if let Some(prototype) = prototype {
            state
                .heap_mut()
                .set_prototype(handle, prototype, instruction_pointer)?;
        }

        let reference = SymbolicValue::known(
            instruction_pointer,
            KnownData::Object(handle),
            Provenance::Execution,
        );
        state.bind(self.into.as_str(), reference);

        Ok(())
    }

    fn as_text_code(&self) -> String {
        let properties = self
            .properties
            .iter()
            .map(|(key, value)| format!("{key}: {value}"))
            .join(", ");
        match &self.prototype {
            Some(prototype) => {
                format!("{} = {{ {properties} }} with prototype {prototype}", self.into)
            }
            None => format!("{} = {{ {properties} }}", self.into),
        }
    }
}

/// The `Set` operation writes a value under a property key, as
/// `object[key] = value` does.
///
/// # Semantics
///
/// | Input                    | Output                 |
/// | :----------------------: | :--------------------: |
/// | `object`, `key`, `value` | `object[key] := value` |
///
/// A concrete key writes directly. A symbolic key forks the current path once
/// for each sensitive name it may still equal, performing the write under that
/// name, and continues on the current path with the value written under the
/// unresolved key. A key fixed by the program whose string form is not
/// modelled is written under the unresolved key without forking.
///
/// # Errors
///
/// The path is abandoned if `object` is not an object reference or if the
/// write would create a prototype cycle. Exceeding the exploration budget
/// aborts the run.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Set {
    pub object: Operand,
    pub key:    Operand,
    pub value:  Operand,
}

impl Set {
    /// Constructs the operation performing `object[key] = value`.
    #[must_use]
    pub fn new(object: Operand, key: Operand, value: Operand) -> Self {
        Self { object, key, value }
    }
}

impl Operation for Set {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        let instruction_pointer = vm.instruction_pointer()?;
        let object = vm.evaluate_object(&self.object, "set")?;
        let key = vm.evaluate_key(&self.key)?;
        let value = vm.evaluate(&self.value)?;

        match key {
            PropertyKey::Name(name) => {
                let (registry, state) = vm.split_state_mut()?;
                state
                    .heap_mut()
                    .set(registry, object, &name, value, instruction_pointer)
            }
            PropertyKey::Symbolic(key) => {
                vm.fork_on_key(&key, |registry, state, choice| match choice {
                    KeyChoice::Name(name) => state.heap_mut().set(
                        registry,
                        object,
                        name,
                        value.clone(),
                        instruction_pointer,
                    ),
                    KeyChoice::Unresolved => state.heap_mut().set_unresolved(
                        object,
                        key.clone(),
                        value.clone(),
                        instruction_pointer,
                    ),
                })
            }
            PropertyKey::Opaque(key) => vm.state_mut()?.heap_mut().set_unresolved(
                object,
                key,
                value,
                instruction_pointer,
            ),
        }
    }

    fn as_text_code(&self) -> String {
        format!("{}[{}] = {}", self.object, self.key, self.value)
    }
}

/// The `Get` operation reads the value under a property key, as
/// `object[key]` does.
///
/// # Semantics
///
/// | Input           | Output                |
/// | :-------------: | :-------------------: |
/// | `object`, `key` | `into := object[key]` |
///
/// Reading from an attacker-controlled value yields a symbolic property read.
/// Reading under a symbolic key reads the name the key has been fixed to on
/// this path, if any, and otherwise yields a symbolic property read. When
/// [`crate::vm::Config::fork_on_symbolic_reads`] is set, symbolic keys fork in
/// the same way as for [`Set`].
///
/// # Errors
///
/// The path is abandoned if `object` is a concrete value that is not an
/// object.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Get {
    pub object: Operand,
    pub key:    Operand,
    pub into:   String,
}

impl Get {
    /// Constructs the operation binding `object[key]` to `into`.
    #[must_use]
    pub fn new(object: Operand, key: Operand, into: impl Into<String>) -> Self {
        let into = into.into();
        Self { object, key, into }
    }
}

impl Operation for Get {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        let instruction_pointer = vm.instruction_pointer()?;
        let target = vm.evaluate(&self.object)?;
        let key = vm.evaluate_key(&self.key)?;

        let object = match receiver(&target, "get", instruction_pointer)? {
            Receiver::Object(handle) => handle,
            Receiver::Symbolic => {
                let read = tainted_read(target, key, instruction_pointer);
                vm.state_mut()?.bind(self.into.as_str(), read);
                return Ok(());
            }
        };

        let value = match key {
            PropertyKey::Name(name) => {
                vm.state()?
                    .heap()
                    .get(vm.registry(), object, &name, instruction_pointer)?
            }
            PropertyKey::Symbolic(key) if vm.config().fork_on_symbolic_reads => {
                return vm.fork_on_key(&key, |registry, state, choice| {
                    let value = match choice {
                        KeyChoice::Name(name) => {
                            state.heap().get(registry, object, name, instruction_pointer)?
                        }
                        KeyChoice::Unresolved => {
                            state.heap().get_symbolic(object, &key, instruction_pointer)?
                        }
                    };
                    state.bind(self.into.as_str(), value);
                    Ok(())
                });
            }
            PropertyKey::Symbolic(key) => read_without_forking(vm, object, &key)?,
            PropertyKey::Opaque(key) => {
                vm.state()?
                    .heap()
                    .get_symbolic(object, &key, instruction_pointer)?
            }
        };

        vm.state_mut()?.bind(self.into.as_str(), value);

        Ok(())
    }

    fn as_text_code(&self) -> String {
        format!("{} = {}[{}]", self.into, self.object, self.key)
    }
}

/// The `CallMember` operation resolves a member of an object and calls it, as
/// `object[key](...args)` does.
///
/// # Semantics
///
/// | Input                   | Output                          |
/// | :---------------------: | :-----------------------------: |
/// | `object`, `key`, `args` | `into := object[key](...args)`  |
///
/// Built-in members use their modelled behaviour, functions defined by the
/// program yield an opaque result, and attacker-controlled members yield a
/// symbolic result. Symbolic keys are resolved as for [`Get`].
///
/// # Errors
///
/// The path is abandoned if `object` is a concrete value that is not an
/// object, or if the member it resolves is not callable.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct CallMember {
    pub object: Operand,
    pub key:    Operand,
    #[serde(default)]
    pub args:   Vec<Operand>,
    pub into:   String,
}

impl CallMember {
    /// Constructs the operation binding `object[key](...args)` to `into`.
    #[must_use]
    pub fn new(object: Operand, key: Operand, args: Vec<Operand>, into: impl Into<String>) -> Self {
        let into = into.into();
        Self {
            object,
            key,
            args,
            into,
        }
    }
}

impl Operation for CallMember {
    fn execute(&self, vm: &mut VM) -> ExecuteResult {
        let instruction_pointer = vm.instruction_pointer()?;
        let target = vm.evaluate(&self.object)?;
        let key = vm.evaluate_key(&self.key)?;
        let args = self
            .args
            .iter()
            .map(|arg| vm.evaluate(arg))
            .collect::<Result<Vec<_>>>()?;

        let object = match receiver(&target, "call_member", instruction_pointer)? {
            Receiver::Object(handle) => handle,
            Receiver::Symbolic => {
                let callee = tainted_read(target, key, instruction_pointer);
                let result = SymbolicValue::new(
                    instruction_pointer,
                    SymbolicValueData::CallResult { callee, args },
                    Provenance::Execution,
                );
                vm.state_mut()?.bind(self.into.as_str(), result);
                return Ok(());
            }
        };

        let result = match key {
            PropertyKey::Name(name) => vm.state()?.heap().call_member(
                vm.registry(),
                object,
                &name,
                args,
                instruction_pointer,
            )?,
            PropertyKey::Symbolic(key) if vm.config().fork_on_symbolic_reads => {
                return vm.fork_on_key(&key, |registry, state, choice| {
                    let heap = state.heap();
                    let result = match choice {
                        KeyChoice::Name(name) => heap.call_member(
                            registry,
                            object,
                            name,
                            args.clone(),
                            instruction_pointer,
                        )?,
                        KeyChoice::Unresolved => {
                            let callee = heap.get_symbolic(object, &key, instruction_pointer)?;
                            heap.call(registry, callee, args.clone(), instruction_pointer)?
                        }
                    };
                    state.bind(self.into.as_str(), result);
                    Ok(())
                });
            }
            PropertyKey::Symbolic(key) => {
                let callee = read_without_forking(vm, object, &key)?;
                vm.state()?
                    .heap()
                    .call(vm.registry(), callee, args, instruction_pointer)?
            }
            PropertyKey::Opaque(key) => {
                let heap = vm.state()?.heap();
                let callee = heap.get_symbolic(object, &key, instruction_pointer)?;
                heap.call(vm.registry(), callee, args, instruction_pointer)?
            }
        };

        vm.state_mut()?.bind(self.into.as_str(), result);

        Ok(())
    }

    fn as_text_code(&self) -> String {
        format!(
            "{} = {}[{}]({})",
            self.into,
            self.object,
            self.key,
            self.args.iter().join(", ")
        )
    }
}

/// What a property access is performed on.
enum Receiver {
    Object(ObjectHandle),
    Symbolic,
}

/// Classifies `target` as the receiver of a property access by `operation`.
fn receiver(target: &BoxedVal, operation: &str, location: u32) -> Result<Receiver> {
    if target.is_symbolic() {
        return Ok(Receiver::Symbolic);
    }

    target
        .as_known()
        .and_then(KnownData::as_object)
        .map(Receiver::Object)
        .ok_or_else(|| Error::invalid_kind(operation, target.kind_name()).locate(location))
}

/// Constructs the read of `key` from the attacker-controlled `target`.
fn tainted_read(target: BoxedVal, key: PropertyKey, location: u32) -> BoxedVal {
    let key = key.into_value(location);
    SymbolicValue::new(
        location,
        SymbolicValueData::PropertyRead {
            object: target,
            key,
        },
        Provenance::Execution,
    )
}

/// Reads the symbolic `key` from `object` on the current path without
/// forking.
///
/// If an earlier fork fixed the key to a name, that name is read. Otherwise
/// the read is symbolic.
fn read_without_forking(vm: &VM, object: ObjectHandle, key: &BoxedVal) -> Result<BoxedVal> {
    let location = vm.instruction_pointer()?;
    let state = vm.state()?;
    match state
        .constraints()
        .resolve(key, vm.registry().sensitive_names())
    {
        KeyResolution::Resolved(name) => state.heap().get(vm.registry(), object, &name, location),
        KeyResolution::Open(_) => state.heap().get_symbolic(object, key, location),
    }
}
