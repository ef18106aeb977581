//! This module is an integration test that checks whether a computed-key write
//! can replace the member used for string conversion.
#![cfg(test)]

use property_taint::oracle::{Outcome, Verdict};

mod common;

#[test]
fn to_string_can_be_overwritten() -> anyhow::Result<()> {
    let explorer = common::new_explorer_from_path("./asset/customer_role.json", &["toString"])?;
    let report = explorer.analyze()?;

    assert_eq!(report.verdict, Verdict::Vulnerable);
    assert_eq!(report.paths.len(), 2);

    // Overwriting `toString` leaves the role alone but taints the conversion
    let overwritten = report.path(1).unwrap();
    assert_eq!(overwritten.constraints, vec!["p == \"toString\"".to_string()]);
    assert_eq!(overwritten.outcome_at(4), Some(Outcome::Held));
    assert_eq!(overwritten.outcome_at(6), Some(Outcome::Violated));

    assert!(!report.path(0).unwrap().has_violation());

    Ok(())
}
