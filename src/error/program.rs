//! This module contains errors pertaining to the construction and validation
//! of the [`crate::program::Program`] handed to the explorer.

use thiserror::Error;

use crate::error::container;

/// Errors that occur while validating or decoding a program.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum Error {
    #[error("The binding `{name}` is declared by more than one initial object")]
    DuplicateBinding { name: String },

    #[error("Initial object `{object}` names `{prototype}` as its prototype, but no such object is declared before it")]
    UnknownPrototype { object: String, prototype: String },

    #[error("The program could not be decoded: {message}")]
    Malformed { message: String },
}

/// A program error with an associated location.
///
/// For errors in the initial objects the location is the index of the object
/// declaration, as these precede the operation sequence.
pub type LocatedError = container::Located<Error>;

/// A container of program errors.
pub type Errors = container::Errors<LocatedError>;

/// The result type for methods that may have program errors.
pub type Result<T> = std::result::Result<T, LocatedError>;

/// Make it possible to attach locations to these errors.
impl container::Locatable for Error {
    type Located = LocatedError;

    fn locate(self, index: u32) -> Self::Located {
        container::Located {
            location: index,
            payload:  self,
        }
    }
}

/// Decoding errors from `serde_json` carry no program location, so they are
/// attached to the start of the program.
impl From<serde_json::Error> for LocatedError {
    fn from(value: serde_json::Error) -> Self {
        let message = value.to_string();
        container::Located {
            location: 0,
            payload:  Error::Malformed { message },
        }
    }
}
