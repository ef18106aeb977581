//! This module contains the representation of data whose content is
//! concretely known during symbolic execution.

use std::fmt::{Display, Formatter};

use crate::{constant::OBJECT_STRING_TAG, vm::state::heap::ObjectHandle};

/// The type of data whose value is concretely known during symbolic execution.
///
/// # Representation
///
/// Only the value kinds that participate in property access are represented.
/// Numbers are kept as integers as no arithmetic is modelled beyond their use
/// as property keys and their string conversion.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum KnownData {
    /// The `undefined` value.
    Undefined,

    /// The `null` value.
    Null,

    /// A boolean.
    Bool(bool),

    /// An integral number.
    Number(i64),

    /// A string.
    Str(String),

    /// A reference to an object on the heap of the current path.
    Object(ObjectHandle),

    /// A reference to a function defined by the program under analysis.
    ///
    /// The body of the function is not modelled, only its identity.
    Function { name: String },

    /// A reference to a built-in member that an object resolved without
    /// having an own property of that name.
    BuiltIn { name: String, receiver: ObjectHandle },

    /// The root of every prototype chain, where the built-in members live.
    RootPrototype,

    /// The sentinel returned when a property lookup finds nothing.
    Absent,
}

impl KnownData {
    /// Constructs a known string from `value`.
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::Str(value.into())
    }

    /// Gets the name of the kind of this value, for use in diagnostics.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::Str(_) => "string",
            Self::Object(_) | Self::RootPrototype => "object",
            Self::Function { .. } => "function",
            Self::BuiltIn { .. } => "built-in function",
            Self::Absent => "absent",
        }
    }

    /// Gets the object handle if this value is an object reference.
    #[must_use]
    pub fn as_object(&self) -> Option<ObjectHandle> {
        match self {
            Self::Object(handle) => Some(*handle),
            _ => None,
        }
    }

    /// Converts the value into the string that would be used for it as a
    /// property key.
    ///
    /// Returns [`None`] for object references, as their conversion depends on
    /// the `toString` member they resolve and hence on the heap. The root
    /// prototype always converts through the built-in member.
    #[must_use]
    pub fn to_property_key(&self) -> Option<String> {
        match self {
            Self::Undefined | Self::Absent => Some("undefined".into()),
            Self::Null => Some("null".into()),
            Self::Bool(b) => Some(b.to_string()),
            Self::Number(n) => Some(n.to_string()),
            Self::Str(s) => Some(s.clone()),
            Self::Function { name } => Some(format!("function {name}() {{ [code] }}")),
            Self::BuiltIn { name, .. } => Some(format!("function {name}() {{ [native code] }}")),
            Self::RootPrototype => Some(OBJECT_STRING_TAG.into()),
            Self::Object(_) => None,
        }
    }

    /// Gets the canonical string form of a plain object.
    #[must_use]
    pub fn object_string_tag() -> Self {
        Self::string(OBJECT_STRING_TAG)
    }
}

impl Display for KnownData {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Undefined => write!(f, "undefined"),
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Str(s) => write!(f, "{s:?}"),
            Self::Object(handle) => write!(f, "{handle}"),
            Self::Function { name } => write!(f, "function {name}"),
            Self::BuiltIn { name, receiver } => write!(f, "{receiver}.[[{name}]]"),
            Self::RootPrototype => write!(f, "Object.prototype"),
            Self::Absent => write!(f, "<absent>"),
        }
    }
}

#[cfg(test)]
mod test {
    use crate::vm::{state::heap::ObjectHandle, value::known::KnownData};

    #[test]
    fn primitives_convert_to_property_keys() {
        assert_eq!(KnownData::Number(3).to_property_key(), Some("3".into()));
        assert_eq!(KnownData::Null.to_property_key(), Some("null".into()));
        assert_eq!(
            KnownData::string("role").to_property_key(),
            Some("role".into())
        );
        assert_eq!(KnownData::Object(ObjectHandle(0)).to_property_key(), None);
        assert_eq!(
            KnownData::RootPrototype.to_property_key(),
            Some("[object Object]".into())
        );
    }

    #[test]
    fn strings_display_quoted() {
        assert_eq!(KnownData::string("role").to_string(), "\"role\"");
        assert_eq!(KnownData::Absent.kind_name(), "absent");
    }
}
