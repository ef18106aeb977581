//! This library implements a symbolic analysis of property writes made under
//! computed keys (`object[key] = value`) in a JavaScript-like object model. It
//! decides whether such a write, with both the key and the value under an
//! attacker's control, can make the key alias a security-sensitive member and
//! so let later reads observe attacker-controlled content where trusted
//! content was expected.
//!
//! Note that this library does not model full JavaScript semantics. It models
//! exactly the parts of property access that matter for these escapes: own
//! properties, built-in members, and prototype-chain fallback.
//!
//! # How it Works
//!
//! From a very high level, the analysis is performed as follows:
//!
//! 1. A [`program::Program`] is ingested. This is a set of initial objects and
//!    a sequence of [`operation::Operation`]s over them.
//! 2. The operations are executed symbolically on a specialised [`vm::VM`].
//!    Attacker input is a [`vm::value::SymbolicValue`] whose content is
//!    unknown but whose taint is tracked through every operation.
//! 3. Whenever a write uses a symbolic key, the [`vm::VM`] forks the current
//!    path once for each sensitive name the key may equal, plus once for the
//!    case where it equals none of them. Each path records the key-equality
//!    constraints that led to it.
//! 4. Assertions in the program are judged on every path by the [`oracle`],
//!    recording which held and which were violated.
//! 5. The outcomes of all paths are reduced to a verdict and written to an
//!    [`AnalysisReport`].
//!
//! # Basic Usage
//!
//! For the most basic usage of the library, it is sufficient to construct an
//! explorer with [`new`] and call the `.analyze` method on it.
//!
//! ```
//! use property_taint as pt;
//! use property_taint::{
//!     operation::{assertion::Assert, property::Get, property::Set, symbolic::IntroduceSymbolic},
//!     oracle::{Predicate, Verdict},
//!     program::{Literal, ObjectDeclaration, Operand, Program},
//!     vm,
//!     watchdog::LazyWatchdog,
//! };
//!
//! let program = Program::new()
//!     .with_object(
//!         ObjectDeclaration::new("customer")
//!             .with_property("name", Literal::string("person"))
//!             .with_property("role", Literal::string("user")),
//!     )
//!     .then(IntroduceSymbolic::new("p", "p"))
//!     .then(IntroduceSymbolic::new("t", "t"))
//!     .then(Set::new(
//!         Operand::binding("customer"),
//!         Operand::binding("p"),
//!         Operand::binding("t"),
//!     ))
//!     .then(Get::new(
//!         Operand::binding("customer"),
//!         Operand::literal(Literal::string("role")),
//!         "role",
//!     ))
//!     .then(Assert::new(Predicate::is_concrete(Operand::binding("role"))));
//!
//! let config = vm::Config::default().with_sensitive_names(["role"]);
//! let report = pt::new(program, config, LazyWatchdog.in_rc())
//!     .analyze()
//!     .unwrap();
//!
//! assert_eq!(report.verdict, Verdict::Vulnerable);
//! assert_eq!(report.paths.len(), 2);
//! ```

#![warn(clippy::all, clippy::cargo, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)] // Allows for better API naming

pub mod constant;
pub mod error;
pub mod explorer;
pub mod operation;
pub mod oracle;
pub mod program;
pub mod report;
pub mod vm;
pub mod watchdog;

// Re-exports to provide the library interface.
pub use explorer::new;
pub use report::AnalysisReport;
