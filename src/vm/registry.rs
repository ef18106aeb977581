//! This module contains the analysis-wide registry of property names that the
//! virtual machine treats specially.

use std::collections::BTreeSet;

use itertools::Itertools;

use crate::vm::Config;

/// The read-only name registry for a single run.
///
/// It is built once from the [`Config`] and shared by every path, as none of
/// its contents change during exploration.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Registry {
    /// The security-relevant names that a symbolic key is forked against, in
    /// the order in which the forks are created.
    sensitive_names: Vec<String>,

    /// The names that every object resolves to a built-in member.
    built_in_members: BTreeSet<String>,

    /// The names whose assignment relinks the prototype.
    prototype_pivots: BTreeSet<String>,
}

impl Registry {
    /// Constructs the registry described by `config`.
    ///
    /// Duplicate sensitive names are collapsed, keeping the first occurrence,
    /// so that no two forks of the same write assume the same name.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        let sensitive_names = config.sensitive_names.iter().unique().cloned().collect();
        let built_in_members = config.built_in_members.iter().cloned().collect();
        let prototype_pivots = config.prototype_pivots.iter().cloned().collect();

        Self {
            sensitive_names,
            built_in_members,
            prototype_pivots,
        }
    }

    /// Gets the sensitive names in fork order.
    #[must_use]
    pub fn sensitive_names(&self) -> &[String] {
        self.sensitive_names.as_slice()
    }

    /// Checks if `name` resolves to a built-in member on every object.
    #[must_use]
    pub fn is_built_in(&self, name: &str) -> bool {
        self.built_in_members.contains(name)
    }

    /// Checks if assigning to `name` redirects an object's prototype.
    #[must_use]
    pub fn is_prototype_pivot(&self, name: &str) -> bool {
        self.prototype_pivots.contains(name)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

#[cfg(test)]
mod test {
    use crate::vm::{registry::Registry, Config};

    #[test]
    fn duplicate_sensitive_names_are_collapsed() {
        let config = Config::default().with_sensitive_names(["role", "toString", "role"]);
        let registry = Registry::new(&config);

        assert_eq!(registry.sensitive_names(), &["role", "toString"]);
    }

    #[test]
    fn default_registry_knows_the_usual_members() {
        let registry = Registry::default();

        assert!(registry.is_built_in("toString"));
        assert!(registry.is_prototype_pivot("__proto__"));
        assert!(!registry.is_built_in("role"));
    }
}
