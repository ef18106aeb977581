//! This module contains the definition of the [`VMThread`] type, representing
//! the divergent execution paths that can be taken during symbolic execution.

use crate::vm::state::{PathId, PathState};

/// A `VMThread` is a representation of a given execution path during the course
/// of symbolic execution.
///
/// The construct can be forked at will to represent the branches in execution,
/// but contains no logic for performing that execution itself.
#[derive(Clone, Debug)]
pub struct VMThread {
    /// The virtual machine's state for this thread of execution.
    state: PathState,

    /// The index of the operation this thread executes next.
    instruction_pointer: u32,
}

impl VMThread {
    /// Constructs a new virtual machine thread with `state` as the initial
    /// state at `instruction_pointer`.
    #[must_use]
    pub fn new(state: PathState, instruction_pointer: u32) -> Self {
        Self {
            state,
            instruction_pointer,
        }
    }

    /// Gets the current virtual machine state for this virtual machine thread.
    #[must_use]
    pub fn state(&self) -> &PathState {
        &self.state
    }

    /// Gets the current virtual machine state for this virtual machine thread.
    #[must_use]
    pub fn state_mut(&mut self) -> &mut PathState {
        &mut self.state
    }

    /// Gets the index of the operation this thread is currently executing.
    #[must_use]
    pub fn instruction_pointer(&self) -> u32 {
        self.instruction_pointer
    }

    /// Moves the thread on to the next operation.
    pub fn step(&mut self) {
        self.instruction_pointer += 1;
    }

    /// Forks the virtual machine thread at the current point of execution,
    /// giving the new path the identifier `id`.
    ///
    /// Both threads point at the same operation after the fork.
    #[must_use]
    pub fn fork(&self, id: PathId) -> Self {
        let state = self.state.fork(id);
        let instruction_pointer = self.instruction_pointer;
        Self {
            state,
            instruction_pointer,
        }
    }
}

impl From<VMThread> for PathState {
    fn from(value: VMThread) -> Self {
        value.state
    }
}
