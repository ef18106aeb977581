//! This module is an integration test that checks that the exploration budget
//! bounds the number of paths without silently truncating the analysis.
#![cfg(test)]

use property_taint::{
    error::{self, execution::Budget, execution::Error},
    vm,
};

mod common;

const PROGRAM: &str = "./asset/two_writes.json";

const NAMES: [&str; 5] = ["role", "__proto__", "toString", "isAdmin", "valueOf"];

#[test]
fn sequential_writes_multiply_paths() -> anyhow::Result<()> {
    let config = vm::Config::default()
        .with_sensitive_names(NAMES)
        .with_maximum_paths(36);
    let explorer = common::new_explorer_with_config(PROGRAM, config)?;
    let report = explorer.analyze()?;

    assert_eq!(report.paths.len(), 36);

    // Every path fixes or excludes each key exactly once per name
    for path in &report.paths {
        let equalities = path.constraints.iter().filter(|c| c.contains("==")).count();
        assert!(equalities <= 2);
    }

    Ok(())
}

#[test]
fn exceeding_the_path_budget_fails_the_analysis() -> anyhow::Result<()> {
    let config = vm::Config::default()
        .with_sensitive_names(NAMES)
        .with_maximum_paths(35);
    let explorer = common::new_explorer_with_config(PROGRAM, config)?;

    let errors = explorer.analyze().unwrap_err();
    let last = errors.payloads().last().unwrap();
    assert!(last.payload.is_incomplete_analysis());
    assert_eq!(
        last.payload,
        error::Error::from(Error::BudgetExceeded {
            budget: Budget::Paths,
            limit:  35,
        })
    );

    Ok(())
}
