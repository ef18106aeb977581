//! This module contains the object model of the symbolic virtual machine: the
//! heap of objects for a path, and the property lookup, assignment and member
//! call semantics over it.
//!
//! # Lookup Order
//!
//! A property read on an object resolves, in order:
//!
//! 1. An own property of that name.
//! 2. For a prototype pivot name, the object's current prototype link.
//! 3. A built-in member of that name.
//! 4. An own property of each object along the prototype chain.
//! 5. The [`KnownData::Absent`] sentinel.
//!
//! Built-in members conceptually live at the root of every prototype chain.
//! If any link in the chain has been overwritten with an attacker-controlled
//! value, that root is no longer reachable: the built-in tier is skipped and a
//! read that reaches the tainted link yields a symbolic property read of the
//! attacker's prototype.

use std::{
    collections::BTreeMap,
    fmt::{Display, Formatter},
};

use crate::{
    error::{
        container::Locatable,
        execution::{Error, Result},
    },
    vm::{
        registry::Registry,
        value::{known::KnownData, BoxedVal, Provenance, SymbolicValue, SymbolicValueData},
    },
};

/// Opaque handle referencing an object on the heap of a path.
///
/// Handles are non-owning: any number of objects may link to the same
/// prototype through its handle.
#[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ObjectHandle(pub u32);

impl Display for ObjectHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "obj#{}", self.0)
    }
}

/// The target of an object's fallback lookup.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Prototype {
    /// The object chains directly to the root, where the built-ins live.
    Root,

    /// The object has had its prototype set to `null`.
    ///
    /// Built-in members remain resolvable as they are modelled as part of
    /// every object.
    Null,

    /// The object falls back to another object on the same heap.
    Object(ObjectHandle),

    /// The prototype link was overwritten with an attacker-controlled value.
    Tainted(BoxedVal),
}

/// A plain object.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct JsObject {
    /// The program binding the object was declared under, for reporting.
    label: String,

    /// The own properties with concretely known keys.
    properties: BTreeMap<String, BoxedVal>,

    /// Writes made under symbolic keys that are known to differ from every
    /// sensitive name.
    ///
    /// These are kept apart from `properties` as nothing is known about the
    /// key other than what it is not.
    unresolved: Vec<(BoxedVal, BoxedVal)>,

    /// The fallback lookup target.
    prototype: Prototype,
}

impl JsObject {
    /// Creates a new object with no own properties that chains to the root.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        let label = label.into();
        let properties = BTreeMap::new();
        let unresolved = Vec::new();
        let prototype = Prototype::Root;
        Self {
            label,
            properties,
            unresolved,
            prototype,
        }
    }

    /// Gets the label of the object.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Gets the own property named `key`, if one exists.
    #[must_use]
    pub fn own(&self, key: &str) -> Option<&BoxedVal> {
        self.properties.get(key)
    }

    /// Gets the own properties of the object in key order.
    pub fn own_properties(&self) -> impl Iterator<Item = (&String, &BoxedVal)> {
        self.properties.iter()
    }

    /// Gets the writes made to the object under unresolved symbolic keys.
    #[must_use]
    pub fn unresolved(&self) -> &[(BoxedVal, BoxedVal)] {
        self.unresolved.as_slice()
    }

    /// Gets the prototype link of the object.
    #[must_use]
    pub fn prototype(&self) -> &Prototype {
        &self.prototype
    }

    /// Writes `value` as an own property under `key`, replacing any existing
    /// own property of that name.
    pub fn insert(&mut self, key: impl Into<String>, value: BoxedVal) {
        self.properties.insert(key.into(), value);
    }
}

/// The heap of objects for a single path.
///
/// Each path owns its heap by value, so forking a path copies the heap and
/// siblings never observe each other's writes.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Heap {
    objects: Vec<JsObject>,
}

impl Heap {
    /// Creates a new, empty heap.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Places `object` on the heap and returns its handle.
    ///
    /// # Panics
    ///
    /// Panics if the number of objects exceeds [`u32::MAX`]. This is a
    /// programmer bug.
    pub fn allocate(&mut self, object: JsObject) -> ObjectHandle {
        let index = u32::try_from(self.objects.len())
            .unwrap_or_else(|_| panic!("Object count should not exceed {}", u32::MAX));
        self.objects.push(object);
        ObjectHandle(index)
    }

    /// Gets the number of objects on the heap.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Checks if the heap holds no objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Gets the object for `handle`.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if no object exists for `handle`.
    pub fn object(&self, handle: ObjectHandle, location: u32) -> Result<&JsObject> {
        self.objects
            .get(handle.0 as usize)
            .ok_or(Error::NoSuchObject { handle: handle.0 }.locate(location))
    }

    /// Gets the object for `handle` mutably.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if no object exists for `handle`.
    pub fn object_mut(&mut self, handle: ObjectHandle, location: u32) -> Result<&mut JsObject> {
        self.objects
            .get_mut(handle.0 as usize)
            .ok_or(Error::NoSuchObject { handle: handle.0 }.locate(location))
    }

    /// Reads the property `key` from the object at `handle`, following the
    /// lookup order described in the [module documentation](self).
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if `handle` or any object on its prototype chain does
    /// not exist.
    pub fn get(
        &self,
        registry: &Registry,
        handle: ObjectHandle,
        key: &str,
        location: u32,
    ) -> Result<BoxedVal> {
        let receiver = self.object(handle, location)?;
        if let Some(value) = receiver.own(key) {
            return Ok(value.clone());
        }

        if registry.is_prototype_pivot(key) {
            return Ok(self.prototype_value(&receiver.prototype, location));
        }

        if registry.is_built_in(key) && self.tainted_link(handle, location)?.is_none() {
            let name = key.to_string();
            return Ok(SymbolicValue::known(
                location,
                KnownData::BuiltIn {
                    name,
                    receiver: handle,
                },
                Provenance::BuiltIn,
            ));
        }

        let mut link = receiver.prototype.clone();
        loop {
            match link {
                Prototype::Root | Prototype::Null => break,
                Prototype::Object(parent) => {
                    let parent = self.object(parent, location)?;
                    if let Some(value) = parent.own(key) {
                        return Ok(value.clone());
                    }
                    link = parent.prototype.clone();
                }
                Prototype::Tainted(attacker) => {
                    let key = SymbolicValue::known(
                        location,
                        KnownData::string(key),
                        Provenance::Execution,
                    );
                    return Ok(SymbolicValue::new(
                        location,
                        SymbolicValueData::PropertyRead {
                            object: attacker,
                            key,
                        },
                        Provenance::Execution,
                    ));
                }
            }
        }

        Ok(SymbolicValue::known(
            location,
            KnownData::Absent,
            Provenance::Execution,
        ))
    }

    /// Writes `value` under `key` on the object at `handle`.
    ///
    /// After this returns, [`Self::get`] for the same `key` returns `value`,
    /// regardless of any built-in or prototype entry previously visible there.
    ///
    /// Writing an object reference, `null`, or a symbolic value under a
    /// prototype pivot name relinks the prototype instead of creating an own
    /// property. Any other value under a pivot name is stored as an own
    /// property.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if `handle` does not exist, or if the write would link
    /// the object into a prototype cycle.
    pub fn set(
        &mut self,
        registry: &Registry,
        handle: ObjectHandle,
        key: &str,
        value: BoxedVal,
        location: u32,
    ) -> Result<()> {
        if registry.is_prototype_pivot(key) {
            if let Some(link) = Self::link_for(&value) {
                return self.link_prototype(handle, link, Some(key), location);
            }
        }

        self.object_mut(handle, location)?.insert(key, value);
        Ok(())
    }

    /// Sets the prototype of the object at `handle` to `value` directly, as the
    /// prototype clause of an object literal would.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if `handle` does not exist, if `value` cannot be a
    /// prototype, or if the link would create a prototype cycle.
    pub fn set_prototype(
        &mut self,
        handle: ObjectHandle,
        value: BoxedVal,
        location: u32,
    ) -> Result<()> {
        let Some(link) = Self::link_for(&value) else {
            return Err(Error::invalid_kind("set prototype", value.kind_name()).locate(location));
        };

        self.link_prototype(handle, link, None, location)
    }

    /// Records a write of `value` under the symbolic `key` that is known not
    /// to equal any sensitive name.
    ///
    /// A later write under an identical key replaces the earlier one.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if `handle` does not exist.
    pub fn set_unresolved(
        &mut self,
        handle: ObjectHandle,
        key: BoxedVal,
        value: BoxedVal,
        location: u32,
    ) -> Result<()> {
        let object = self.object_mut(handle, location)?;
        match object.unresolved.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => object.unresolved.push((key, value)),
        }

        Ok(())
    }

    /// Reads the value written under the symbolic `key` on the object at
    /// `handle`, if an identical key has been written to.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if `handle` does not exist.
    pub fn get_unresolved(
        &self,
        handle: ObjectHandle,
        key: &BoxedVal,
        location: u32,
    ) -> Result<Option<BoxedVal>> {
        let object = self.object(handle, location)?;
        Ok(object
            .unresolved
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone()))
    }

    /// Reads `key` from the object at `handle` when the key is known to differ
    /// from every sensitive name, or when its string form is not modelled.
    ///
    /// A write under an identical key is read back. Otherwise nothing can be
    /// said about the result beyond it being a property read under an
    /// attacker-controlled key.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if `handle` does not exist.
    pub fn get_symbolic(
        &self,
        handle: ObjectHandle,
        key: &BoxedVal,
        location: u32,
    ) -> Result<BoxedVal> {
        if let Some(value) = self.get_unresolved(handle, key, location)? {
            return Ok(value);
        }

        let object =
            SymbolicValue::known(location, KnownData::Object(handle), Provenance::Execution);
        Ok(SymbolicValue::new(
            location,
            SymbolicValueData::PropertyRead {
                object,
                key: key.clone(),
            },
            Provenance::Execution,
        ))
    }

    /// Resolves `key` on the object at `handle` and calls the result with
    /// `args`.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if `handle` does not exist or if the resolved member is
    /// not callable.
    pub fn call_member(
        &self,
        registry: &Registry,
        handle: ObjectHandle,
        key: &str,
        args: Vec<BoxedVal>,
        location: u32,
    ) -> Result<BoxedVal> {
        let callee = self.get(registry, handle, key, location)?;
        self.call(registry, callee, args, location)
    }

    /// Calls `callee` with `args`.
    ///
    /// - Built-in members use their modelled behaviour.
    /// - Functions defined by the program yield an opaque call result that is
    ///   symbolic exactly when one of the arguments is.
    /// - Symbolic callees yield a symbolic call result.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if `callee` is a concrete value that is not callable.
    pub fn call(
        &self,
        registry: &Registry,
        callee: BoxedVal,
        args: Vec<BoxedVal>,
        location: u32,
    ) -> Result<BoxedVal> {
        match callee.as_known() {
            Some(KnownData::BuiltIn { name, receiver }) => {
                return self.call_built_in(registry, name, *receiver, &args, location);
            }
            Some(KnownData::Function { .. }) | None => (),
            Some(other) => {
                return Err(Error::invalid_kind("call", other.kind_name()).locate(location));
            }
        }

        Ok(SymbolicValue::new(
            location,
            SymbolicValueData::CallResult { callee, args },
            Provenance::Execution,
        ))
    }

    /// Converts `value` to a string as an implicit conversion would.
    ///
    /// Objects convert by calling the `toString` member they resolve, which
    /// is where an overwritten string-conversion member becomes observable.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if `value` is an object whose `toString` member cannot
    /// be called.
    pub fn stringify(
        &self,
        registry: &Registry,
        value: BoxedVal,
        location: u32,
    ) -> Result<BoxedVal> {
        let string = match value.as_known() {
            Some(KnownData::Object(handle)) => {
                return self.call_member(registry, *handle, "toString", vec![], location);
            }
            Some(known) => known.to_property_key().unwrap_or_default(),
            None => return Ok(value),
        };

        Ok(SymbolicValue::known(
            location,
            KnownData::Str(string),
            Provenance::Execution,
        ))
    }

    /// Executes the modelled behaviour of the built-in member `name` called on
    /// `receiver`.
    fn call_built_in(
        &self,
        registry: &Registry,
        name: &str,
        receiver: ObjectHandle,
        args: &[BoxedVal],
        location: u32,
    ) -> Result<BoxedVal> {
        let result = match name {
            "toString" | "toLocaleString" => KnownData::object_string_tag(),
            "valueOf" => KnownData::Object(receiver),
            "hasOwnProperty" => {
                let Some(key) = args.first() else {
                    let owned = self.object(receiver, location)?.own("undefined").is_some();
                    return Ok(SymbolicValue::known(
                        location,
                        KnownData::Bool(owned),
                        Provenance::BuiltIn,
                    ));
                };
                match key.as_property_key() {
                    Some(key) => {
                        let object = self.object(receiver, location)?;
                        let owned = object.own(&key).is_some()
                            || (registry.is_prototype_pivot(&key)
                                && matches!(object.prototype, Prototype::Tainted(_)));
                        KnownData::Bool(owned)
                    }
                    None => {
                        let callee = SymbolicValue::known(
                            location,
                            KnownData::BuiltIn {
                                name: name.to_string(),
                                receiver,
                            },
                            Provenance::BuiltIn,
                        );
                        return Ok(SymbolicValue::new(
                            location,
                            SymbolicValueData::CallResult {
                                callee,
                                args: args.to_vec(),
                            },
                            Provenance::Execution,
                        ));
                    }
                }
            }
            _ => KnownData::Undefined,
        };

        Ok(SymbolicValue::known(location, result, Provenance::BuiltIn))
    }

    /// Gets the prototype link that `value` denotes, or [`None`] if it cannot
    /// be a prototype.
    fn link_for(value: &BoxedVal) -> Option<Prototype> {
        match value.as_known() {
            Some(KnownData::Object(parent)) => Some(Prototype::Object(*parent)),
            Some(KnownData::Null) => Some(Prototype::Null),
            Some(KnownData::RootPrototype) => Some(Prototype::Root),
            Some(_) => None,
            None if value.is_symbolic() => Some(Prototype::Tainted(value.clone())),
            None => None,
        }
    }

    /// Replaces the prototype link of the object at `handle` with `link`,
    /// dropping any own property stored under the pivot name `key`.
    fn link_prototype(
        &mut self,
        handle: ObjectHandle,
        link: Prototype,
        key: Option<&str>,
        location: u32,
    ) -> Result<()> {
        if let Prototype::Object(parent) = &link {
            self.check_acyclic(handle, *parent, location)?;
        }

        let object = self.object_mut(handle, location)?;
        if let Some(key) = key {
            object.properties.remove(key);
        }
        object.prototype = link;
        Ok(())
    }

    /// Checks that linking `handle` to `parent` would not create a cycle.
    fn check_acyclic(
        &self,
        handle: ObjectHandle,
        parent: ObjectHandle,
        location: u32,
    ) -> Result<()> {
        let mut current = Some(parent);
        while let Some(candidate) = current {
            if candidate == handle {
                return Err(Error::PrototypeCycle {
                    object:    handle.0,
                    prototype: parent.0,
                }
                .locate(location));
            }
            current = match &self.object(candidate, location)?.prototype {
                Prototype::Object(next) => Some(*next),
                _ => None,
            };
        }

        Ok(())
    }

    /// Finds the first attacker-controlled link on the prototype chain of the
    /// object at `handle`, if any.
    fn tainted_link(&self, handle: ObjectHandle, location: u32) -> Result<Option<BoxedVal>> {
        let mut link = self.object(handle, location)?.prototype.clone();
        loop {
            link = match link {
                Prototype::Root | Prototype::Null => return Ok(None),
                Prototype::Tainted(value) => return Ok(Some(value)),
                Prototype::Object(parent) => self.object(parent, location)?.prototype.clone(),
            };
        }
    }

    /// Gets the value that reading a pivot name observes for `link`.
    fn prototype_value(&self, link: &Prototype, location: u32) -> BoxedVal {
        match link {
            Prototype::Tainted(value) => value.clone(),
            Prototype::Object(parent) => SymbolicValue::known(
                location,
                KnownData::Object(*parent),
                Provenance::Execution,
            ),
            Prototype::Null => {
                SymbolicValue::known(location, KnownData::Null, Provenance::Execution)
            }
            Prototype::Root => {
                SymbolicValue::known(location, KnownData::RootPrototype, Provenance::BuiltIn)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use crate::{
        error::execution::Error,
        vm::{
            registry::Registry,
            state::heap::{Heap, JsObject, ObjectHandle},
            value::{known::KnownData, Provenance, SymbolicValue},
            Config,
        },
    };

    fn literal(value: &str) -> Box<SymbolicValue> {
        SymbolicValue::known(0, KnownData::string(value), Provenance::Literal)
    }

    /// Creates a heap holding `{ name: "person", role: "user" }`.
    fn customer_heap() -> (Heap, ObjectHandle) {
        let mut heap = Heap::new();
        let mut customer = JsObject::new("customer");
        customer.insert("name", literal("person"));
        customer.insert("role", literal("user"));
        let handle = heap.allocate(customer);
        (heap, handle)
    }

    #[test]
    fn own_properties_are_read_back() -> anyhow::Result<()> {
        let registry = Registry::default();
        let (heap, customer) = customer_heap();

        let role = heap.get(&registry, customer, "role", 1)?;
        assert_eq!(role, literal("user"));

        let missing = heap.get(&registry, customer, "email", 1)?;
        assert_eq!(missing.as_known(), Some(&KnownData::Absent));

        Ok(())
    }

    #[test]
    fn writes_shadow_built_ins_and_prototypes() -> anyhow::Result<()> {
        let registry = Registry::default();
        let (mut heap, customer) = customer_heap();

        let mut parent = JsObject::new("parent");
        parent.insert("tier", literal("gold"));
        let parent = heap.allocate(parent);
        heap.set(
            &registry,
            customer,
            "__proto__",
            SymbolicValue::known(0, KnownData::Object(parent), Provenance::Literal),
            1,
        )?;
        assert_eq!(heap.get(&registry, customer, "tier", 2)?, literal("gold"));

        for key in ["tier", "toString", "role"] {
            let value = SymbolicValue::introduce(3, "t");
            heap.set(&registry, customer, key, value.clone(), 3)?;
            assert_eq!(heap.get(&registry, customer, key, 4)?, value);
        }

        Ok(())
    }

    #[test]
    fn built_ins_resolve_before_the_prototype_chain() -> anyhow::Result<()> {
        let registry = Registry::default();
        let (mut heap, customer) = customer_heap();

        let mut parent = JsObject::new("parent");
        parent.insert("toString", literal("shadowed"));
        let parent = heap.allocate(parent);
        heap.set(
            &registry,
            customer,
            "__proto__",
            SymbolicValue::known(0, KnownData::Object(parent), Provenance::Literal),
            1,
        )?;

        let member = heap.get(&registry, customer, "toString", 2)?;
        assert!(matches!(
            member.as_known(),
            Some(KnownData::BuiltIn { name, .. }) if name == "toString"
        ));

        let string = heap.call_member(&registry, customer, "toString", vec![], 3)?;
        assert_eq!(string.as_known(), Some(&KnownData::object_string_tag()));

        Ok(())
    }

    #[test]
    fn tainted_prototype_makes_fallback_reads_symbolic() -> anyhow::Result<()> {
        let registry = Registry::default();
        let (mut heap, customer) = customer_heap();

        let attacker = SymbolicValue::introduce(0, "t");
        heap.set(&registry, customer, "__proto__", attacker.clone(), 1)?;

        assert_eq!(heap.get(&registry, customer, "__proto__", 2)?, attacker);
        assert!(heap.get(&registry, customer, "isAdmin", 2)?.is_symbolic());
        assert!(!heap.get(&registry, customer, "role", 2)?.is_symbolic());

        let converted = heap.call_member(&registry, customer, "toString", vec![], 3)?;
        assert!(converted.is_symbolic());

        Ok(())
    }

    #[test]
    fn prototype_cycles_are_rejected() -> anyhow::Result<()> {
        let registry = Registry::default();
        let mut heap = Heap::new();
        let a = heap.allocate(JsObject::new("a"));
        let b = heap.allocate(JsObject::new("b"));

        heap.set(
            &registry,
            b,
            "__proto__",
            SymbolicValue::known(0, KnownData::Object(a), Provenance::Literal),
            0,
        )?;
        let result = heap.set(
            &registry,
            a,
            "__proto__",
            SymbolicValue::known(1, KnownData::Object(b), Provenance::Literal),
            1,
        );

        let error = result.unwrap_err();
        assert_eq!(error.location, 1);
        assert_eq!(
            error.payload,
            Error::PrototypeCycle {
                object:    a.0,
                prototype: b.0,
            }
        );

        Ok(())
    }

    #[test]
    fn prototypes_can_be_set_without_a_pivot_name() -> anyhow::Result<()> {
        let config = Config::default().with_prototype_pivots(Vec::<String>::new());
        let registry = Registry::new(&config);
        let (mut heap, customer) = customer_heap();
        let mut parent = JsObject::new("parent");
        parent.insert("tier", literal("gold"));
        let parent = heap.allocate(parent);

        heap.set_prototype(
            customer,
            SymbolicValue::known(0, KnownData::Object(parent), Provenance::Literal),
            1,
        )?;
        assert_eq!(heap.get(&registry, customer, "tier", 2)?, literal("gold"));

        let error = heap.set_prototype(customer, literal("nope"), 3).unwrap_err();
        assert!(matches!(error.payload, Error::InvalidKind { .. }));

        Ok(())
    }

    #[test]
    fn calling_a_non_function_is_an_invalid_kind() {
        let registry = Registry::default();
        let (heap, customer) = customer_heap();

        let result = heap.call_member(&registry, customer, "role", vec![], 5);
        assert!(matches!(
            result.unwrap_err().payload,
            Error::InvalidKind { .. }
        ));
    }

    #[test]
    fn unresolved_writes_are_kept_apart() -> anyhow::Result<()> {
        let registry = Registry::default();
        let (mut heap, customer) = customer_heap();
        let key = SymbolicValue::introduce(0, "p");
        let value = SymbolicValue::introduce(0, "t");

        heap.set_unresolved(customer, key.clone(), value.clone(), 1)?;

        assert_eq!(heap.get_unresolved(customer, &key, 2)?, Some(value.clone()));
        assert_eq!(heap.get_symbolic(customer, &key, 2)?, value);
        assert_eq!(heap.get(&registry, customer, "role", 2)?, literal("user"));

        let other = SymbolicValue::introduce(0, "q");
        assert!(heap.get_symbolic(customer, &other, 2)?.is_symbolic());

        Ok(())
    }

    #[test]
    fn has_own_property_sees_own_keys() -> anyhow::Result<()> {
        let registry = Registry::default();
        let (heap, customer) = customer_heap();

        let yes =
            heap.call_member(&registry, customer, "hasOwnProperty", vec![literal("role")], 1)?;
        assert_eq!(yes.as_known(), Some(&KnownData::Bool(true)));

        let unknown = heap.call_member(
            &registry,
            customer,
            "hasOwnProperty",
            vec![SymbolicValue::introduce(0, "p")],
            1,
        )?;
        assert!(unknown.is_symbolic());

        Ok(())
    }

    #[test]
    fn root_prototype_stringifies_to_the_object_tag() -> anyhow::Result<()> {
        let registry = Registry::default();
        let (heap, customer) = customer_heap();

        let root = heap.get(&registry, customer, "__proto__", 0)?;
        assert_eq!(root.as_known(), Some(&KnownData::RootPrototype));

        let text = heap.stringify(&registry, root, 0)?;
        assert_eq!(text.as_known(), Some(&KnownData::string("[object Object]")));

        Ok(())
    }
}
