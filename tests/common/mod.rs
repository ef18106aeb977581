//! This module contains common utilities for simplifying the writing of
//! integration tests for this library.

#![cfg(test)]

use std::fs;

use anyhow::anyhow;
use property_taint as pt;
use property_taint::{
    explorer::InitialExplorer,
    program::Program,
    vm,
    watchdog::LazyWatchdog,
};

/// Loads the program described by the JSON file at the provided `path`.
pub fn load_program(path: impl Into<String>) -> anyhow::Result<Program> {
    let path = path.into();
    let contents = fs::read_to_string(&path).map_err(|_| anyhow!("File {path} not available"))?;
    let program = Program::from_json(&contents)?;

    Ok(program)
}

/// Constructs a new explorer to analyze the program at the provided `path`,
/// forking on exactly the provided sensitive `names`.
///
/// It uses the default configuration for everything else.
#[allow(unused)] // It is actually
pub fn new_explorer_from_path(
    path: impl Into<String>,
    names: &[&str],
) -> anyhow::Result<InitialExplorer> {
    let config = vm::Config::default().with_sensitive_names(names.iter().copied());
    new_explorer_with_config(path, config)
}

/// Constructs a new explorer to analyze the program at the provided `path`
/// with the provided `config`.
#[allow(unused)] // It is actually
pub fn new_explorer_with_config(
    path: impl Into<String>,
    config: vm::Config,
) -> anyhow::Result<InitialExplorer> {
    let program = load_program(path)?;
    Ok(pt::new(program, config, LazyWatchdog.in_rc()))
}
