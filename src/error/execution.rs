//! This module contains errors pertaining to the symbolic execution of the
//! program under analysis.

use std::fmt::{Display, Formatter};

use thiserror::Error;

use crate::error::container;

/// Errors that occur during the execution of the program by the
/// [`crate::vm::VM`].
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum Error {
    #[error("`{operation}` cannot be applied to a value of kind {found}")]
    InvalidKind { operation: String, found: String },

    #[error("Linking object {object} to prototype {prototype} would create a prototype cycle")]
    PrototypeCycle { object: u32, prototype: u32 },

    #[error("The name `{name}` is not bound on this path")]
    UnboundName { name: String },

    #[error("No object exists for handle {handle}")]
    NoSuchObject { handle: u32 },

    #[error("A VM thread was requested but none are available")]
    NoSuchThread,

    #[error("Tried to step the virtual machine when no target operation exists")]
    InvalidStep,

    #[error("The {budget} budget of {limit} was exceeded; the analysis is incomplete")]
    BudgetExceeded { budget: Budget, limit: usize },

    #[error("Execution was stopped by the watchdog; the analysis is incomplete")]
    StoppedByWatchdog,
}

impl Error {
    /// Checks whether the error aborts the entire run rather than just the
    /// path on which it occurred.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::BudgetExceeded { .. }
                | Self::StoppedByWatchdog
                | Self::NoSuchThread
                | Self::InvalidStep
        )
    }

    /// Constructs an [`Error::InvalidKind`] for `operation` applied to a value
    /// described as `found`.
    #[must_use]
    pub fn invalid_kind(operation: impl Into<String>, found: impl Into<String>) -> Self {
        let operation = operation.into();
        let found = found.into();
        Self::InvalidKind { operation, found }
    }
}

/// The resource limits that bound exploration.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub enum Budget {
    /// The total number of path states created in a run.
    Paths,

    /// The number of forks along a single path.
    ForkDepth,
}

impl Display for Budget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Paths => write!(f, "path count"),
            Self::ForkDepth => write!(f, "fork depth"),
        }
    }
}

/// An execution error with an associated location in the program.
pub type LocatedError = container::Located<Error>;

/// A container of execution errors used for aggregation of errors during
/// execution.
pub type Errors = container::Errors<LocatedError>;

/// The result type for methods that may have execution errors.
pub type Result<T> = std::result::Result<T, LocatedError>;

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
