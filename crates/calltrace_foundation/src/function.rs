//! Callable values.
//!
//! A [`Function`] pairs a native body with the metadata the tracer needs:
//! an optional declared name, an optional textual source used for name
//! recovery, an own property table (statics), an optional prototype
//! (construction template), and the "woven" marker set by the weaver.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use crate::context::Context;
use crate::error::Result;
use crate::object::Object;
use crate::value::Value;

/// Signature of a native function body: context, receiver, arguments.
pub type NativeBody = dyn Fn(&Context, &Value, &[Value]) -> Result<Value>;

struct FunctionData {
    name: Option<Arc<str>>,
    source: Option<Arc<str>>,
    body: Rc<NativeBody>,
    properties: Object,
    prototype: RefCell<Option<Object>>,
    woven: Cell<bool>,
}

/// A shared callable.
///
/// Cloning a `Function` clones the handle; identity is preserved.
#[derive(Clone)]
pub struct Function(Rc<FunctionData>);

impl Function {
    /// Creates a named function.
    pub fn new<F>(name: impl Into<Arc<str>>, body: F) -> Self
    where
        F: Fn(&Context, &Value, &[Value]) -> Result<Value> + 'static,
    {
        Self::builder(body).name(name).build()
    }

    /// Creates a function with no declared name.
    pub fn anonymous<F>(body: F) -> Self
    where
        F: Fn(&Context, &Value, &[Value]) -> Result<Value> + 'static,
    {
        Self::builder(body).build()
    }

    /// Starts building a function around `body`.
    pub fn builder<F>(body: F) -> FunctionBuilder
    where
        F: Fn(&Context, &Value, &[Value]) -> Result<Value> + 'static,
    {
        FunctionBuilder {
            name: None,
            source: None,
            body: Rc::new(body),
            properties: Object::new(),
            prototype: None,
        }
    }

    /// Runs the body directly, without touching the call stack.
    ///
    /// Programs should go through [`Context::call`] instead so the call is
    /// visible to ancestor reconstruction.
    ///
    /// # Errors
    ///
    /// Returns whatever error the body raises.
    pub fn invoke(&self, ctx: &Context, this: &Value, args: &[Value]) -> Result<Value> {
        let body = Rc::clone(&self.0.body);
        body(ctx, this, args)
    }

    /// Returns the declared name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.0.name.as_deref()
    }

    /// Returns the textual source representation, if one was attached.
    #[must_use]
    pub fn source(&self) -> Option<&str> {
        self.0.source.as_deref()
    }

    /// Returns the own property table.
    #[must_use]
    pub fn properties(&self) -> &Object {
        &self.0.properties
    }

    /// Returns the construction template, if any.
    #[must_use]
    pub fn prototype(&self) -> Option<Object> {
        self.0.prototype.borrow().clone()
    }

    /// Replaces the construction template.
    pub fn set_prototype(&self, prototype: Option<Object>) {
        *self.0.prototype.borrow_mut() = prototype;
    }

    /// Returns true if the weaver produced (or protected) this function.
    #[must_use]
    pub fn is_woven(&self) -> bool {
        self.0.woven.get()
    }

    /// Marks this function as woven so weaving skips it.
    pub fn mark_woven(&self) {
        self.0.woven.set(true);
    }

    /// Returns true if both handles refer to the same function.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Returns a stable identity for this function, valid while it is alive.
    #[must_use]
    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.0).cast::<()>() as usize
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let woven = if self.is_woven() { " woven" } else { "" };
        match self.name() {
            Some(name) => write!(f, "<fn {name}{woven}>"),
            None => write!(f, "<fn{woven}>"),
        }
    }
}

/// Builder for [`Function`].
pub struct FunctionBuilder {
    name: Option<Arc<str>>,
    source: Option<Arc<str>>,
    body: Rc<NativeBody>,
    properties: Object,
    prototype: Option<Object>,
}

impl FunctionBuilder {
    /// Sets the declared name.
    #[must_use]
    pub fn name(mut self, name: impl Into<Arc<str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Attaches a textual source representation.
    #[must_use]
    pub fn source(mut self, source: impl Into<Arc<str>>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Adds a static property.
    #[must_use]
    pub fn property(self, name: impl Into<Arc<str>>, value: impl Into<Value>) -> Self {
        self.properties.set(name, value);
        self
    }

    /// Sets the construction template.
    #[must_use]
    pub fn prototype(mut self, prototype: Object) -> Self {
        self.prototype = Some(prototype);
        self
    }

    /// Finishes the function.
    #[must_use]
    pub fn build(self) -> Function {
        Function(Rc::new(FunctionData {
            name: self.name,
            source: self.source,
            body: self.body,
            properties: self.properties,
            prototype: RefCell::new(self.prototype),
            woven: Cell::new(false),
        }))
    }
}
