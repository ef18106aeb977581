//! This module contains the representation of a program under analysis: the
//! objects it starts with and the sequence of operations it performs.
//!
//! Programs can be decoded from JSON. An operation is an object tagged with
//! its `op`, and an operand is either a `binding` or a `literal`:
//!
//! ```
//! use property_taint::program::Program;
//!
//! let program = Program::from_json(
//!     r#"{
//!         "objects": [
//!             { "binding": "customer", "properties": { "role": { "string": "user" } } }
//!         ],
//!         "operations": [
//!             { "op": "introduce_symbolic", "name": "p", "into": "p" },
//!             { "op": "introduce_symbolic", "name": "t", "into": "t" },
//!             {
//!                 "op": "set",
//!                 "object": { "binding": "customer" },
//!                 "key": { "binding": "p" },
//!                 "value": { "binding": "t" }
//!             }
//!         ]
//!     }"#,
//! )
//! .unwrap();
//!
//! assert_eq!(program.operations().len(), 3);
//! ```

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::{Display, Formatter},
};

use serde::{Deserialize, Serialize};

use crate::{
    error::{
        container::Locatable,
        program::{Error, Result},
    },
    operation::{
        assertion::Assert,
        property::{CallMember, Get, NewObject, Set},
        symbolic::{Concat, IntroduceSymbolic, Stringify},
        Operation,
    },
    vm::{
        state::{
            heap::{Heap, JsObject},
            PathState,
        },
        value::{known::KnownData, Provenance, SymbolicValue},
    },
};

/// A concrete value written in the program.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Literal {
    Undefined,
    Null,
    Bool(bool),
    Number(i64),
    String(String),

    /// A function defined by the program, referred to by name.
    Function(String),
}

impl Literal {
    /// Constructs a string literal.
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    /// Constructs a reference to the function named `name`.
    #[must_use]
    pub fn function(name: impl Into<String>) -> Self {
        Self::Function(name.into())
    }

    /// Converts the literal into the known data it denotes.
    #[must_use]
    pub fn to_known(&self) -> KnownData {
        match self {
            Self::Undefined => KnownData::Undefined,
            Self::Null => KnownData::Null,
            Self::Bool(b) => KnownData::Bool(*b),
            Self::Number(n) => KnownData::Number(*n),
            Self::String(s) => KnownData::Str(s.clone()),
            Self::Function(name) => KnownData::Function { name: name.clone() },
        }
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Function(name) => write!(f, "{name}"),
            other => write!(f, "{}", other.to_known()),
        }
    }
}

/// An input to an operation.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operand {
    /// The value bound to a name on the current path.
    Binding(String),

    /// A concrete value.
    Literal(Literal),
}

impl Operand {
    /// Constructs an operand referring to the binding `name`.
    #[must_use]
    pub fn binding(name: impl Into<String>) -> Self {
        Self::Binding(name.into())
    }

    /// Constructs an operand with the concrete value `literal`.
    #[must_use]
    pub fn literal(literal: Literal) -> Self {
        Self::Literal(literal)
    }
}

impl Display for Operand {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Binding(name) => write!(f, "{name}"),
            Self::Literal(literal) => write!(f, "{literal}"),
        }
    }
}

/// An object that exists before the first operation executes.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ObjectDeclaration {
    /// The name the object is bound to.
    pub binding: String,

    /// The own properties of the object.
    #[serde(default)]
    pub properties: BTreeMap<String, Literal>,

    /// The binding of an earlier declared object to use as the prototype.
    #[serde(default)]
    pub prototype: Option<String>,
}

impl ObjectDeclaration {
    /// Declares an empty object bound to `binding`.
    #[must_use]
    pub fn new(binding: impl Into<String>) -> Self {
        let binding = binding.into();
        let properties = BTreeMap::new();
        let prototype = None;
        Self {
            binding,
            properties,
            prototype,
        }
    }

    /// Adds the own property `key` with the value `value`.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: Literal) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    /// Uses the object bound to `prototype` as this object's prototype.
    #[must_use]
    pub fn with_prototype(mut self, prototype: impl Into<String>) -> Self {
        self.prototype = Some(prototype.into());
        self
    }
}

/// A single operation of a program.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Instruction {
    IntroduceSymbolic(IntroduceSymbolic),
    NewObject(NewObject),
    Set(Set),
    Get(Get),
    CallMember(CallMember),
    Concat(Concat),
    Stringify(Stringify),
    Assert(Assert),
}

impl Instruction {
    /// Gets the operation to execute for this instruction.
    #[must_use]
    pub fn operation(&self) -> &dyn Operation {
        match self {
            Self::IntroduceSymbolic(op) => op,
            Self::NewObject(op) => op,
            Self::Set(op) => op,
            Self::Get(op) => op,
            Self::CallMember(op) => op,
            Self::Concat(op) => op,
            Self::Stringify(op) => op,
            Self::Assert(op) => op,
        }
    }
}

/// Generates the conversions from each operation into an [`Instruction`].
macro_rules! instruction_from {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for Instruction {
                fn from(value: $variant) -> Self {
                    Self::$variant(value)
                }
            }
        )*
    };
}

instruction_from!(
    IntroduceSymbolic,
    NewObject,
    Set,
    Get,
    CallMember,
    Concat,
    Stringify,
    Assert,
);

/// A program under analysis.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Program {
    /// The objects that exist before the first operation.
    #[serde(default)]
    objects: Vec<ObjectDeclaration>,

    /// The operations, in execution order.
    #[serde(default)]
    operations: Vec<Instruction>,
}

impl Program {
    /// Constructs an empty program.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes a program from `json` and validates it.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if `json` does not describe a program, or if the
    /// program's initial objects are malformed.
    pub fn from_json(json: &str) -> Result<Self> {
        let program: Self = serde_json::from_str(json)?;
        program.validate()?;
        Ok(program)
    }

    /// Adds the initial object `object` to the program.
    #[must_use]
    pub fn with_object(mut self, object: ObjectDeclaration) -> Self {
        self.objects.push(object);
        self
    }

    /// Appends `instruction` to the program's operations.
    #[must_use]
    pub fn then(mut self, instruction: impl Into<Instruction>) -> Self {
        self.operations.push(instruction.into());
        self
    }

    /// Gets the initial objects of the program.
    #[must_use]
    pub fn objects(&self) -> &[ObjectDeclaration] {
        self.objects.as_slice()
    }

    /// Gets the operations of the program in execution order.
    #[must_use]
    pub fn operations(&self) -> &[Instruction] {
        self.operations.as_slice()
    }

    /// Checks that the initial objects are well formed.
    ///
    /// Each binding may be declared once, and a prototype must name an object
    /// declared before the one using it. This also rules out prototype cycles
    /// among the initial objects.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] located at the index of the first malformed
    /// declaration.
    pub fn validate(&self) -> Result<()> {
        let mut declared = BTreeSet::new();
        for (index, object) in self.objects.iter().enumerate() {
            let location = u32::try_from(index).unwrap_or(u32::MAX);
            if let Some(prototype) = &object.prototype {
                if !declared.contains(prototype.as_str()) {
                    return Err(Error::UnknownPrototype {
                        object:    object.binding.clone(),
                        prototype: prototype.clone(),
                    }
                    .locate(location));
                }
            }

            if !declared.insert(object.binding.as_str()) {
                return Err(Error::DuplicateBinding {
                    name: object.binding.clone(),
                }
                .locate(location));
            }
        }

        Ok(())
    }

    /// Constructs the path state the program starts executing in, with every
    /// initial object allocated and bound.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if the program's initial objects are malformed.
    pub fn initial_state(&self) -> Result<PathState> {
        self.validate()?;

        let mut heap = Heap::new();
        let mut bindings = BTreeMap::new();
        for (index, declaration) in self.objects.iter().enumerate() {
            let location = u32::try_from(index).unwrap_or(u32::MAX);
            let mut object = JsObject::new(declaration.binding.as_str());
            for (key, value) in &declaration.properties {
                object.insert(
                    key.as_str(),
                    SymbolicValue::known(0, value.to_known(), Provenance::Initial),
                );
            }
            let handle = heap.allocate(object);

            if let Some(prototype) = &declaration.prototype {
                let parent = bindings.get(prototype).cloned().ok_or_else(|| {
                    Error::UnknownPrototype {
                        object:    declaration.binding.clone(),
                        prototype: prototype.clone(),
                    }
                    .locate(location)
                })?;
                heap.set_prototype(handle, parent, 0).map_err(|e| {
                    Error::Malformed {
                        message: e.to_string(),
                    }
                    .locate(location)
                })?;
            }

            let reference = SymbolicValue::known(0, KnownData::Object(handle), Provenance::Initial);
            bindings.insert(declaration.binding.clone(), reference);
        }

        Ok(PathState::new_at_start(heap, bindings))
    }
}

#[cfg(test)]
mod test {
    use crate::{
        error::program::Error,
        operation::{property::Get, symbolic::IntroduceSymbolic},
        oracle::Predicate,
        program::{Instruction, Literal, ObjectDeclaration, Operand, Program},
        vm::value::known::KnownData,
    };

    #[test]
    fn programs_decode_from_json() -> anyhow::Result<()> {
        let program = Program::from_json(
            r#"{
                "objects": [
                    { "binding": "base", "properties": { "tier": { "string": "gold" } } },
                    {
                        "binding": "customer",
                        "properties": {
                            "name": { "string": "person" },
                            "role": { "string": "user" }
                        },
                        "prototype": "base"
                    }
                ],
                "operations": [
                    { "op": "introduce_symbolic", "name": "p", "into": "p" },
                    {
                        "op": "get",
                        "object": { "binding": "customer" },
                        "key": { "literal": { "string": "role" } },
                        "into": "role"
                    },
                    {
                        "op": "assert",
                        "predicate": { "not": { "is_symbolic": { "binding": "role" } } }
                    }
                ]
            }"#,
        )?;

        assert_eq!(program.objects().len(), 2);
        assert_eq!(
            program.operations()[0],
            Instruction::from(IntroduceSymbolic::new("p", "p"))
        );
        assert_eq!(
            program.operations()[1],
            Instruction::from(Get::new(
                Operand::binding("customer"),
                Operand::literal(Literal::string("role")),
                "role"
            ))
        );
        assert!(matches!(
            &program.operations()[2],
            Instruction::Assert(assert)
                if assert.predicate == Predicate::is_concrete(Operand::binding("role"))
        ));

        Ok(())
    }

    #[test]
    fn malformed_json_is_reported() {
        let error = Program::from_json(r#"{ "operations": [{ "op": "jump" }] }"#).unwrap_err();
        assert!(matches!(error.payload, Error::Malformed { .. }));
    }

    #[test]
    fn duplicate_bindings_are_rejected() {
        let program = Program::new()
            .with_object(ObjectDeclaration::new("customer"))
            .with_object(ObjectDeclaration::new("customer"));

        let error = program.validate().unwrap_err();
        assert_eq!(error.location, 1);
        assert_eq!(
            error.payload,
            Error::DuplicateBinding {
                name: "customer".into(),
            }
        );
    }

    #[test]
    fn prototypes_must_be_declared_first() {
        let program = Program::new()
            .with_object(ObjectDeclaration::new("customer").with_prototype("base"))
            .with_object(ObjectDeclaration::new("base"));

        let error = program.initial_state().unwrap_err();
        assert!(matches!(error.payload, Error::UnknownPrototype { .. }));
    }

    #[test]
    fn initial_state_binds_every_object() -> anyhow::Result<()> {
        let program = Program::new()
            .with_object(ObjectDeclaration::new("base"))
            .with_object(
                ObjectDeclaration::new("customer")
                    .with_property("role", Literal::string("user"))
                    .with_prototype("base"),
            );
        let state = program.initial_state()?;

        assert_eq!(state.heap().len(), 2);
        let customer = state.lookup("customer", 0)?;
        assert!(matches!(customer.as_known(), Some(KnownData::Object(_))));

        Ok(())
    }
}
