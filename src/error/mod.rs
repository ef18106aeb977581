//! This module contains the primary error type for the explorer's interface.
//! It also re-exports the more specific error types that are
//! subsystem-specific.

pub mod container;
pub mod execution;
pub mod program;

use thiserror::Error;

/// The interface result type for the library.
///
/// # Usage
///
/// Any function considered to be part of the public interface of the library
/// should return this result type. Subsystems should return the more-specific
/// child error types as appropriate.
pub type Result<T> = std::result::Result<T, Errors>;

/// The interface error type for the library.
///
/// All errors returned from the library interface (and hence encountered by the
/// clients of the library) should be members of this enum.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum Error {
    /// Errors from validating or decoding the program.
    #[error(transparent)]
    Program(#[from] program::Error),

    /// Errors from the virtual machine subsystem of the library.
    #[error(transparent)]
    Execution(#[from] execution::Error),
}

impl Error {
    /// Checks whether this error means that the analysis did not run to
    /// completion.
    #[must_use]
    pub fn is_incomplete_analysis(&self) -> bool {
        match self {
            Self::Execution(e) => e.is_fatal(),
            Self::Program(_) => false,
        }
    }
}

/// Make it possible to attach locations to these errors.
impl container::Locatable for Error {
    type Located = LocatedError;

    fn locate(self, operation_index: u32) -> Self::Located {
        container::Located {
            location: operation_index,
            payload:  self,
        }
    }
}

/// A library error with an associated program location.
pub type LocatedError = container::Located<Error>;

/// A container of errors that may occur in the explorer.
pub type Errors = container::Errors<LocatedError>;

/// Allow simple conversions from located program errors by re-wrapping the
/// located error around the more general payload.
impl From<program::LocatedError> for LocatedError {
    fn from(value: program::LocatedError) -> Self {
        let location = value.location;
        let payload = Error::from(value.payload);
        Self { location, payload }
    }
}

/// Allow simple conversions from located program errors into the Errors
/// container.
impl From<program::LocatedError> for Errors {
    fn from(value: program::LocatedError) -> Self {
        let re_wrapped: LocatedError = value.into();
        re_wrapped.into()
    }
}

/// Allow simple conversions from located execution errors by re-wrapping the
/// located error around the more general payload.
impl From<execution::LocatedError> for LocatedError {
    fn from(value: execution::LocatedError) -> Self {
        let location = value.location;
        let payload = Error::from(value.payload);
        Self { location, payload }
    }
}

/// Allow simple conversions from located execution errors into the Errors
/// container.
impl From<execution::LocatedError> for Errors {
    fn from(value: execution::LocatedError) -> Self {
        let re_wrapped: LocatedError = value.into();
        re_wrapped.into()
    }
}

/// Allow conversion from the execution errors container to the general errors
/// container.
impl From<execution::Errors> for Errors {
    fn from(value: execution::Errors) -> Self {
        let errs: Vec<execution::LocatedError> = value.into();
        let new_errs: Vec<LocatedError> = errs.into_iter().map(Into::into).collect();

        new_errs.into()
    }
}
