//! This module contains the [`Operation`] trait, and the concrete
//! implementation of each of the abstract operations that a program under
//! analysis is made of.

pub mod assertion;
pub mod property;
pub mod symbolic;

use std::fmt::Debug;

use crate::{error::execution, vm::VM};

/// The result type for executing an operation.
pub type ExecuteResult = execution::Result<()>;

/// This trait forms the core of the `Operation` representation. It provides
/// the basic set of operations that are required of all program operations,
/// and is implemented by each of the concrete operations.
///
/// # Object Safety
///
/// This trait must remain
/// [object safe](https://doc.rust-lang.org/reference/items/traits.html#object-safety)
/// as the implementors of the trait are dispatched dynamically by the
/// [`VM`].
///
/// # Paths
///
/// An operation only ever acts on the path of the thread at the front of the
/// virtual machine's queue. Operations that need to branch do so through
/// [`VM::fork_on_key`].
pub trait Operation
where
    Self: Debug,
{
    /// Executes the operation, modifying the state of the [`VM`]
    /// appropriately.
    ///
    /// # Errors
    ///
    /// If the state of the current path does not allow execution of the
    /// operation. Non-fatal errors abandon the current path only.
    fn execute(&self, vm: &mut VM) -> ExecuteResult;

    /// Gets a textual representation of the operation to aid in debugging.
    fn as_text_code(&self) -> String;
}
