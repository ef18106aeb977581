//! This module contains the definition of the [`SymbolicValue`] and its
//! supporting types.
//!
//! A symbolic value is either concretely [`known`], or it is an execution tree
//! rooted in one or more attacker-controlled symbols. Taint propagation falls
//! out of the tree structure: a value is symbolic exactly when one of its
//! leaves is a symbol.

pub mod known;

use std::fmt::{Display, Formatter};

use derivative::Derivative;
use itertools::Itertools;
use uuid::Uuid;

use crate::vm::value::known::KnownData;

/// The type of a boxed symbolic value.
pub type BoxedVal = Box<SymbolicValue>;

/// A `SymbolicValue` is an "execution tree" that records the operations that
/// were made to a piece of data during execution.
///
/// # Equality
///
/// Two values are equal when their data is equal. The location at which a
/// value was recorded and its provenance are metadata and do not contribute
/// to its identity, which allows a value read back from the heap to compare
/// equal to the value that was written.
#[derive(Clone, Debug, Derivative)]
#[derivative(Eq, Hash, PartialEq)]
pub struct SymbolicValue {
    /// The index of the operation at which this part of the execution tree was
    /// recorded.
    #[derivative(PartialEq = "ignore", Hash = "ignore")]
    pub location: u32,

    /// The actual execution tree that forms this value.
    pub data: SymbolicValueData,

    /// Where the value came from.
    #[derivative(PartialEq = "ignore", Hash = "ignore")]
    pub provenance: Provenance,
}

impl SymbolicValue {
    /// Constructs a new `SymbolicValue` representing the operation performed at
    /// `location` on the symbolic `data`.
    ///
    /// It returns [`Box<Self>`] as in the vast majority of cases this type is
    /// used in a recursive data type and hence indirection is needed.
    #[must_use]
    pub fn new(location: u32, data: SymbolicValueData, provenance: Provenance) -> BoxedVal {
        Box::new(Self {
            location,
            data,
            provenance,
        })
    }

    /// Introduces a fresh attacker-controlled symbol at `location`, labelled
    /// with `label` for display purposes.
    ///
    /// Every call allocates a new identifier, so two introductions with the
    /// same label are still distinct values.
    #[must_use]
    pub fn introduce(location: u32, label: impl Into<String>) -> BoxedVal {
        let id = SymbolId::fresh();
        let label = label.into();
        Self::new(
            location,
            SymbolicValueData::Symbol { id, label },
            Provenance::Introduced,
        )
    }

    /// Constructs a new value that is concretely `known`.
    #[must_use]
    pub fn known(location: u32, known: KnownData, provenance: Provenance) -> BoxedVal {
        Self::new(location, SymbolicValueData::Known { value: known }, provenance)
    }

    /// Constructs the string concatenation of `left` and `right`.
    ///
    /// Where both sides convert to concrete strings the result is folded into
    /// a known string. Otherwise the result is a concatenation node, which is
    /// symbolic whenever either operand is.
    #[must_use]
    pub fn concat(location: u32, left: BoxedVal, right: BoxedVal) -> BoxedVal {
        let folded = match (left.as_known(), right.as_known()) {
            (Some(l), Some(r)) => l
                .to_property_key()
                .zip(r.to_property_key())
                .map(|(l, r)| l + &r),
            _ => None,
        };

        match folded {
            Some(string) => Self::known(location, KnownData::Str(string), Provenance::Execution),
            None => Self::new(
                location,
                SymbolicValueData::Concat { left, right },
                Provenance::Execution,
            ),
        }
    }

    /// Checks whether the value depends on attacker-controlled input.
    #[must_use]
    pub fn is_symbolic(&self) -> bool {
        self.data.is_symbolic()
    }

    /// Gets the known data of this value, if it is concretely known.
    #[must_use]
    pub fn as_known(&self) -> Option<&KnownData> {
        match &self.data {
            SymbolicValueData::Known { value } => Some(value),
            _ => None,
        }
    }

    /// Gets the string this value denotes when used as a property key, if that
    /// is concretely known.
    #[must_use]
    pub fn as_property_key(&self) -> Option<String> {
        self.as_known().and_then(KnownData::to_property_key)
    }

    /// Gets the name of the kind of this value, for use in diagnostics.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match &self.data {
            SymbolicValueData::Known { value } => value.kind_name(),
            _ if self.is_symbolic() => "symbolic",
            _ => "opaque",
        }
    }
}

impl Display for SymbolicValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.data)
    }
}

/// A unique identifier for an introduced symbol.
#[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct SymbolId(Uuid);

impl SymbolId {
    /// Allocates a new identifier that has never been handed out before.
    #[must_use]
    pub fn fresh() -> Self {
        Self(Uuid::new_v4())
    }
}

/// The execution tree structures that allow the virtual machine to track how
/// attacker-controlled input flows through the program.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum SymbolicValueData {
    /// A value that is known concretely.
    Known { value: KnownData },

    /// An attacker-controlled value about which nothing is known but its
    /// identity.
    Symbol { id: SymbolId, label: String },

    /// String concatenation of two values.
    Concat { left: BoxedVal, right: BoxedVal },

    /// A property read whose outcome could not be resolved concretely, either
    /// because the receiver, the key, or the receiver's prototype is
    /// attacker-controlled.
    PropertyRead { object: BoxedVal, key: BoxedVal },

    /// The result of calling `callee` with `args`, where the callee's body is
    /// not modelled.
    CallResult { callee: BoxedVal, args: Vec<BoxedVal> },
}

impl SymbolicValueData {
    /// Checks whether the data depends on attacker-controlled input.
    ///
    /// Any node incorporating a symbolic operand is itself symbolic.
    #[must_use]
    pub fn is_symbolic(&self) -> bool {
        match self {
            Self::Known { .. } => false,
            Self::Symbol { .. } => true,
            Self::Concat { left, right } => left.is_symbolic() || right.is_symbolic(),
            Self::PropertyRead { object, key } => object.is_symbolic() || key.is_symbolic(),
            Self::CallResult { callee, args } => {
                callee.is_symbolic() || args.iter().any(|a| a.is_symbolic())
            }
        }
    }
}

impl Display for SymbolicValueData {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Known { value } => write!(f, "{value}"),
            Self::Symbol { label, .. } => write!(f, "{label}"),
            Self::Concat { left, right } => write!(f, "({left} + {right})"),
            Self::PropertyRead { object, key } => write!(f, "{object}[{key}]"),
            Self::CallResult { callee, args } => {
                write!(f, "{callee}({})", args.iter().join(", "))
            }
        }
    }
}

/// The provenance of a value describes where it entered the program.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub enum Provenance {
    /// Introduced as attacker-controlled input.
    Introduced,

    /// A literal written in the program under analysis.
    Literal,

    /// An own property that the object was declared with.
    Initial,

    /// Resolved from the built-in member registry.
    BuiltIn,

    /// Produced by executing an operation.
    Execution,
}
