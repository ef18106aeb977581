//! This module contains constants that are needed throughout the codebase.

/// The property names that are considered security-relevant when no explicit
/// registry is supplied to the [`crate::vm::Config`].
///
/// These cover an access-control field, the prototype pivot, and the default
/// string-conversion member.
pub const DEFAULT_SENSITIVE_NAMES: [&str; 3] = ["role", "__proto__", "toString"];

/// The member names that every object resolves even when it has no own
/// property of that name.
pub const DEFAULT_BUILT_IN_MEMBERS: [&str; 4] =
    ["toString", "toLocaleString", "valueOf", "hasOwnProperty"];

/// The property names whose assignment redirects an object's prototype link
/// rather than writing an own property.
pub const DEFAULT_PROTOTYPE_PIVOTS: [&str; 1] = ["__proto__"];

/// The canonical string form produced by the default string-conversion
/// built-ins on a plain object.
pub const OBJECT_STRING_TAG: &str = "[object Object]";

/// The default maximum number of path states that may be created over the
/// course of a single run.
///
/// Each symbolic-keyed write against a registry of `n` names multiplies the
/// number of live paths by `n + 1`, so this bounds the combined effect of all
/// such writes in one program.
pub const DEFAULT_MAXIMUM_PATHS: usize = 4096;

/// The default maximum number of forks that may occur along any one path.
pub const DEFAULT_MAXIMUM_FORK_DEPTH: usize = 16;

/// The default for whether reads under a symbolic key fork on the sensitive
/// names in the same way that writes do.
pub const DEFAULT_FORK_ON_SYMBOLIC_READS: bool = false;

/// The default number of loop iterations the explorer will wait before
/// polling the watchdog.
pub const DEFAULT_WATCHDOG_POLL_LOOP_ITERATIONS: usize = 100;
