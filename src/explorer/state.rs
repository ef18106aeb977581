//! This module contains the state tracking functionality for the explorer.

use std::fmt::Debug;

use crate::{
    report::AnalysisReport,
    vm,
    vm::{ExecutionResult, VM},
    watchdog::DynWatchdog,
};

/// A marker trait that says that the type implementing it is an explorer
/// state.
///
/// Explorer states can be transitioned between as part of the
/// [`crate::explorer::Explorer`] state machine, and are intended to enforce
/// that correct state transitions take place.
pub trait State
where
    Self: Debug + Sized,
{
}

/// The initial state for the explorer.
#[derive(Debug)]
pub struct HasProgram {
    /// The virtual machine configuration.
    pub vm_config: vm::Config,

    /// The watchdog that is monitoring the progress of the explorer.
    pub watchdog: DynWatchdog,
}
impl State for HasProgram {}

/// The explorer has prepared the virtual machine to symbolically execute the
/// program.
#[derive(Debug)]
pub struct VMReady {
    /// The virtual machine, prepared with the input program and ready to
    /// execute.
    pub vm: VM,
}
impl State for VMReady {}

/// The explorer has executed the program along every path.
#[derive(Debug)]
pub struct ExecutionComplete {
    /// The result from executing the program.
    pub execution_result: ExecutionResult,
}
impl State for ExecutionComplete {}

/// The explorer has judged the outcome of every path and produced its report.
#[derive(Debug)]
pub struct Judged {
    /// The result from executing the program.
    pub execution_result: ExecutionResult,

    /// The report describing the verdict and every path.
    pub report: AnalysisReport,
}
impl State for Judged {}
