//! Shared, mutable composite objects.
//!
//! An [`Object`] is the unit of structure in a traced program: an
//! insertion-ordered table of named members plus an optional prototype
//! from which further members are inherited. Members can be replaced in
//! place, which is what lets the weaver swap callables for wrappers.

use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::value::Value;

/// Maximum prototype chain length followed during lookups.
const MAX_PROTOTYPE_CHAIN: usize = 64;

/// A computed member. Reading it may fail.
#[derive(Clone)]
pub struct Accessor(Rc<dyn Fn() -> Result<Value>>);

impl Accessor {
    /// Creates an accessor from a closure.
    pub fn new<F>(read: F) -> Self
    where
        F: Fn() -> Result<Value> + 'static,
    {
        Self(Rc::new(read))
    }

    /// Runs the accessor.
    ///
    /// # Errors
    ///
    /// Returns whatever error the accessor raises.
    pub fn read(&self) -> Result<Value> {
        (self.0)()
    }
}

/// Storage for one member.
#[derive(Clone)]
pub enum Slot {
    /// A plain stored value.
    Value(Value),
    /// A computed value.
    Accessor(Accessor),
}

impl Slot {
    /// Resolves the slot to a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the slot is an accessor and it fails.
    pub fn read(&self) -> Result<Value> {
        match self {
            Self::Value(v) => Ok(v.clone()),
            Self::Accessor(a) => a.read(),
        }
    }
}

#[derive(Clone)]
struct Member {
    name: Arc<str>,
    slot: Slot,
    enumerable: bool,
}

#[derive(Default)]
struct ObjectData {
    members: RefCell<Vec<Member>>,
    prototype: RefCell<Option<Object>>,
}

/// A shared composite value with named members.
///
/// Cloning an `Object` clones the handle, not the members.
#[derive(Clone, Default)]
pub struct Object(Rc<ObjectData>);

impl Object {
    /// Creates an empty object with no prototype.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty object inheriting from `prototype`.
    #[must_use]
    pub fn with_prototype(prototype: Object) -> Self {
        let obj = Self::new();
        obj.set_prototype(Some(prototype));
        obj
    }

    /// Builder-style member insertion.
    #[must_use]
    pub fn with(self, name: impl Into<Arc<str>>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Returns the prototype, if any.
    #[must_use]
    pub fn prototype(&self) -> Option<Object> {
        self.0.prototype.borrow().clone()
    }

    /// Replaces the prototype.
    pub fn set_prototype(&self, prototype: Option<Object>) {
        *self.0.prototype.borrow_mut() = prototype;
    }

    /// Writes an own, enumerable member, replacing any existing own member
    /// of the same name in place (enumeration order is preserved).
    pub fn set(&self, name: impl Into<Arc<str>>, value: impl Into<Value>) {
        self.put(name.into(), Slot::Value(value.into()), true);
    }

    /// Writes an own member that is skipped by enumeration.
    pub fn set_hidden(&self, name: impl Into<Arc<str>>, value: impl Into<Value>) {
        self.put(name.into(), Slot::Value(value.into()), false);
    }

    /// Defines an enumerable accessor member.
    pub fn define_accessor<F>(&self, name: impl Into<Arc<str>>, read: F)
    where
        F: Fn() -> Result<Value> + 'static,
    {
        self.put(name.into(), Slot::Accessor(Accessor::new(read)), true);
    }

    /// Copies a raw slot onto this object as an own enumerable member.
    pub fn set_slot(&self, name: impl Into<Arc<str>>, slot: Slot) {
        self.put(name.into(), slot, true);
    }

    fn put(&self, name: Arc<str>, slot: Slot, enumerable: bool) {
        let mut members = self.0.members.borrow_mut();
        if let Some(existing) = members.iter_mut().find(|m| m.name == name) {
            existing.slot = slot;
            existing.enumerable = enumerable;
        } else {
            members.push(Member {
                name,
                slot,
                enumerable,
            });
        }
    }

    /// Removes an own member. Returns true if it existed.
    pub fn remove(&self, name: &str) -> bool {
        let mut members = self.0.members.borrow_mut();
        let before = members.len();
        members.retain(|m| &*m.name != name);
        members.len() != before
    }

    /// Returns true if the object has an own member with this name.
    #[must_use]
    pub fn has_own(&self, name: &str) -> bool {
        self.0.members.borrow().iter().any(|m| &*m.name == name)
    }

    /// Looks up the slot for `name`, searching the prototype chain.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<Slot> {
        let mut current = Some(self.clone());
        let mut hops = 0;
        while let Some(obj) = current {
            if let Some(slot) = obj.own_slot(name) {
                return Some(slot);
            }
            hops += 1;
            if hops > MAX_PROTOTYPE_CHAIN {
                return None;
            }
            current = obj.prototype();
        }
        None
    }

    fn own_slot(&self, name: &str) -> Option<Slot> {
        self.0
            .members
            .borrow()
            .iter()
            .find(|m| &*m.name == name)
            .map(|m| m.slot.clone())
    }

    /// Reads a member, searching the prototype chain.
    ///
    /// The member table is not borrowed while an accessor runs, so
    /// accessors may freely read or write this object.
    ///
    /// # Errors
    ///
    /// Returns an error if no such member exists or its accessor fails.
    pub fn get(&self, name: &str) -> Result<Value> {
        match self.lookup(name) {
            Some(slot) => slot.read(),
            None => Err(Error::member_not_found(name)),
        }
    }

    /// Returns the names of own enumerable members, in insertion order.
    #[must_use]
    pub fn own_keys(&self) -> Vec<Arc<str>> {
        self.0
            .members
            .borrow()
            .iter()
            .filter(|m| m.enumerable)
            .map(|m| m.name.clone())
            .collect()
    }

    /// Returns own enumerable members with their raw slots.
    #[must_use]
    pub fn own_entries(&self) -> Vec<(Arc<str>, Slot)> {
        self.0
            .members
            .borrow()
            .iter()
            .filter(|m| m.enumerable)
            .map(|m| (m.name.clone(), m.slot.clone()))
            .collect()
    }

    /// Returns the names of all enumerable members, own first, then
    /// inherited ones not shadowed by a nearer member.
    #[must_use]
    pub fn keys(&self) -> Vec<Arc<str>> {
        let mut seen: HashSet<Arc<str>> = HashSet::new();
        let mut visited: HashSet<usize> = HashSet::new();
        let mut keys = Vec::new();
        let mut current = Some(self.clone());

        while let Some(obj) = current {
            if !visited.insert(obj.id()) {
                break;
            }
            for member in obj.0.members.borrow().iter() {
                // Hidden members still shadow inherited ones.
                if seen.insert(member.name.clone()) && member.enumerable {
                    keys.push(member.name.clone());
                }
            }
            current = obj.prototype();
        }

        keys
    }

    /// Returns the number of own members (enumerable or not).
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.members.borrow().len()
    }

    /// Returns true if the object has no own members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.members.borrow().is_empty()
    }

    /// Returns true if both handles refer to the same object.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Returns a stable identity for this object, valid while it is alive.
    #[must_use]
    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<object {:#x} ({} members)>", self.id(), self.len())
    }
}
