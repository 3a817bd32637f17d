//! The instrumentation engine.
//!
//! A [`Weaver`] walks a live object graph and replaces every eligible
//! function member with a wrapper that reports the call to the registered
//! [`Advice`]. Wrappers also report the un-instrumented callers found on
//! the call stack as reconstructed frames, and opportunistically weave the
//! values their originals return.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashSet};
use std::rc::{Rc, Weak};
use std::sync::Arc;

use calltrace_foundation::{Context, Error, Function, Object, Result, Value};
use tracing::{debug, trace};

use crate::advice::{Advice, AdviceToken, CallDescriptor, NoopAdvice};
use crate::blacklist::Blacklist;
use crate::config::WeaverConfig;
use crate::stack::{self, AncestorFrame};

// =============================================================================
// Interception Table
// =============================================================================

/// One entry of the interception table.
#[derive(Clone, Debug)]
pub struct Interception {
    /// Qualified name the wrapper was installed under.
    pub name: Arc<str>,
    /// The function that was replaced.
    pub original: Function,
    /// The wrapper now installed in its place.
    pub wrapper: Function,
}

/// Summary of one weave pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WeaveReport {
    /// Functions replaced by wrappers.
    pub wrapped: usize,
    /// Composite values traversed.
    pub visited: usize,
    /// Members skipped by the blacklist, the woven marker, or the exclusion set.
    pub skipped: usize,
    /// Members whose read failed.
    pub faulted: usize,
}

// =============================================================================
// Weaver State
// =============================================================================

struct WeaverState {
    advice: RefCell<Rc<dyn Advice>>,
    blacklist: RefCell<Blacklist>,
    max_depth: Cell<usize>,
    ancestor_limit: usize,
    result_weave_depth: usize,
    call_depth: Cell<u32>,
    in_advice: Cell<bool>,
    last_stack: RefCell<Vec<AncestorFrame>>,
    excluded: RefCell<Vec<Value>>,
    table: RefCell<BTreeMap<Arc<str>, Interception>>,
}

/// Sets the reentrancy guard for the lifetime of the value.
struct AdviceGuard<'a>(&'a Cell<bool>);

impl<'a> AdviceGuard<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for AdviceGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Handle to an instrumentation engine.
///
/// Cloning the handle shares the engine. Wrappers hold only a weak
/// reference, so dropping every handle turns them into plain pass-throughs.
#[derive(Clone)]
pub struct Weaver {
    state: Rc<WeaverState>,
}

impl Weaver {
    /// Creates a weaver from a configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a blacklist pattern fails to compile.
    pub fn new(config: WeaverConfig) -> Result<Self> {
        let blacklist = Blacklist::from_patterns(&config.blacklist)?;
        Ok(Self::with_blacklist(&config, blacklist))
    }

    fn with_blacklist(config: &WeaverConfig, blacklist: Blacklist) -> Self {
        Self {
            state: Rc::new(WeaverState {
                advice: RefCell::new(Rc::new(NoopAdvice)),
                blacklist: RefCell::new(blacklist),
                max_depth: Cell::new(config.max_depth),
                ancestor_limit: config.ancestor_limit,
                result_weave_depth: config.result_weave_depth,
                call_depth: Cell::new(0),
                in_advice: Cell::new(false),
                last_stack: RefCell::new(Vec::new()),
                excluded: RefCell::new(Vec::new()),
                table: RefCell::new(BTreeMap::new()),
            }),
        }
    }

    /// Registers the advice, replacing any previous one.
    pub fn set_advice(&self, advice: Rc<dyn Advice>) {
        *self.state.advice.borrow_mut() = advice;
    }

    /// Returns the active blacklist.
    #[must_use]
    pub fn blacklist(&self) -> Blacklist {
        self.state.blacklist.borrow().clone()
    }

    /// Returns the active maximum traversal depth.
    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.state.max_depth.get()
    }

    /// Returns the current call depth.
    #[must_use]
    pub fn call_depth(&self) -> u32 {
        self.state.call_depth.get()
    }

    /// Marks a host-opaque value so weaving never touches it.
    pub fn exclude(&self, value: impl Into<Value>) {
        let value = value.into();
        if value.is_composite() {
            self.state.excluded.borrow_mut().push(value);
        }
    }

    /// Resets the call depth and the last reconstructed stack.
    pub fn reset_call_state(&self) {
        self.state.call_depth.set(0);
        self.state.last_stack.borrow_mut().clear();
    }

    /// Returns the interception table, ordered by qualified name.
    #[must_use]
    pub fn interceptions(&self) -> Vec<Interception> {
        self.state.table.borrow().values().cloned().collect()
    }

    /// Looks up the interception installed under a qualified name.
    #[must_use]
    pub fn interception(&self, name: &str) -> Option<Interception> {
        self.state.table.borrow().get(name).cloned()
    }

    // -------------------------------------------------------------------------
    // Weaving
    // -------------------------------------------------------------------------

    /// Weaves every eligible function reachable from `root`.
    ///
    /// `blacklist` and `max_depth`, when given, replace the persistent
    /// settings used by this and all later passes. Weaving the same graph
    /// again is safe: existing wrappers are recognised and skipped.
    pub fn weave(
        &self,
        namespace: &str,
        root: &Value,
        blacklist: Option<Blacklist>,
        max_depth: Option<usize>,
    ) -> WeaveReport {
        if !root.is_composite() {
            return WeaveReport::default();
        }

        if let Some(blacklist) = blacklist {
            *self.state.blacklist.borrow_mut() = blacklist;
        }
        if let Some(depth) = max_depth {
            self.state.max_depth.set(depth);
        }

        let report = self.run_pass(namespace, root, self.state.max_depth.get());
        debug!(
            namespace,
            wrapped = report.wrapped,
            visited = report.visited,
            skipped = report.skipped,
            faulted = report.faulted,
            "weave pass complete"
        );
        report
    }

    fn run_pass(&self, namespace: &str, root: &Value, max_depth: usize) -> WeaveReport {
        let Some(members) = root.members() else {
            return WeaveReport::default();
        };
        let mut pass = WeavePass {
            weaver: self,
            max_depth,
            visited: HashSet::new(),
            held: Vec::new(),
            report: WeaveReport::default(),
        };
        pass.visit(namespace, members, 1);
        pass.report
    }

    /// Returns a pre-woven function exposing [`Weaver::weave`] to programs.
    ///
    /// Arguments: namespace string, root value, optional object whose
    /// string members are blacklist patterns, optional integer max depth.
    #[must_use]
    pub fn weave_function(&self) -> Function {
        let state = Rc::downgrade(&self.state);
        let function = Function::new("weave", move |_, _, args| {
            let Some(state) = state.upgrade() else {
                return Ok(Value::Nil);
            };
            let weaver = Weaver { state };
            let namespace = args
                .first()
                .and_then(Value::as_str)
                .ok_or_else(|| Error::arity_mismatch("namespace string".into(), args.len()))?;
            let root = args.get(1).cloned().unwrap_or(Value::Nil);
            let blacklist = match args.get(2).and_then(Value::as_object) {
                Some(patterns) => Some(blacklist_from_object(patterns)?),
                None => None,
            };
            let max_depth = args
                .get(3)
                .and_then(Value::as_int)
                .and_then(|d| usize::try_from(d).ok())
                .filter(|d| *d > 0);
            let report = weaver.weave(namespace, &root, blacklist, max_depth);
            Ok(Value::Int(i64::try_from(report.wrapped).unwrap_or(i64::MAX)))
        });
        function.mark_woven();
        function
    }

    fn is_excluded(&self, value: &Value) -> bool {
        self.state
            .excluded
            .borrow()
            .iter()
            .any(|e| e.same_ref(value))
    }

    fn is_blacklisted(&self, name: &str) -> bool {
        self.state.blacklist.borrow().is_match(name)
    }

    fn record(&self, name: Arc<str>, original: &Function, wrapper: &Function) {
        self.state.table.borrow_mut().insert(
            name.clone(),
            Interception {
                name,
                original: original.clone(),
                wrapper: wrapper.clone(),
            },
        );
    }

    /// Creates the intercepting wrapper for `original`.
    fn wrap(&self, full_name: &Arc<str>, original: &Function) -> Function {
        let state: Weak<WeaverState> = Rc::downgrade(&self.state);
        let name = Arc::clone(full_name);
        let target = original.clone();

        let mut builder = Function::builder(move |ctx, this, args| match state.upgrade() {
            Some(state) => Weaver { state }.intercept(ctx, &name, &target, this, args),
            None => target.invoke(ctx, this, args),
        });
        if let Some(declared) = original.name() {
            builder = builder.name(declared);
        }
        if let Some(source) = original.source() {
            builder = builder.source(source);
        }

        let wrapper = builder.build();
        wrapper.set_prototype(original.prototype());
        wrapper.mark_woven();
        wrapper
    }

    // -------------------------------------------------------------------------
    // Interception
    // -------------------------------------------------------------------------

    fn intercept(
        &self,
        ctx: &Context,
        full_name: &Arc<str>,
        original: &Function,
        this: &Value,
        args: &[Value],
    ) -> Result<Value> {
        let state = &self.state;
        if state.in_advice.get() {
            return original.invoke(ctx, this, args);
        }

        let entry_depth = state.call_depth.get();
        let advice = Rc::clone(&*state.advice.borrow());
        let ancestors = stack::reconstruct(ctx, state.ancestor_limit);

        let token = {
            let _guard = AdviceGuard::enter(&state.in_advice);
            self.report_ancestors(&*advice, entry_depth, ancestors);
            let depth = state.call_depth.get() + 1;
            state.call_depth.set(depth);
            advice.before(&CallDescriptor::entered(
                Arc::clone(full_name),
                args.to_vec(),
                depth,
            ))
        };

        let result = match original.invoke(ctx, this, args) {
            Ok(value) => value,
            Err(err) => {
                state.call_depth.set(entry_depth);
                return Err(err);
            }
        };

        self.complete(&*advice, token, &result);

        if result.is_composite() && state.result_weave_depth > 0 && !self.is_excluded(&result) {
            self.run_pass(full_name, &result, state.result_weave_depth);
        }

        state.call_depth.set(entry_depth);
        Ok(result)
    }

    fn complete(&self, advice: &dyn Advice, token: AdviceToken, result: &Value) {
        let _guard = AdviceGuard::enter(&self.state.in_advice);
        advice.after(token, result);
    }

    /// Reports the ancestors that differ from the previous walk.
    ///
    /// Every ancestor occupies one depth level whether or not it is
    /// reported, so calls made under an already reported caller nest
    /// beneath it.
    fn report_ancestors(&self, advice: &dyn Advice, entry_depth: u32, ancestors: Vec<AncestorFrame>) {
        let state = &self.state;
        let previous = state.last_stack.replace(Vec::new());
        let unchanged = stack::common_prefix(&previous, &ancestors);

        let mut depth = entry_depth;
        for (i, frame) in ancestors.iter().enumerate() {
            depth += 1;
            if i >= unchanged {
                advice.before(&CallDescriptor::reconstructed(
                    Arc::clone(&frame.name),
                    frame.args.clone(),
                    depth,
                ));
            }
        }

        state.call_depth.set(depth);
        *state.last_stack.borrow_mut() = ancestors;
    }
}

impl Default for Weaver {
    fn default() -> Self {
        Self::with_blacklist(&WeaverConfig::default(), Blacklist::new())
    }
}

fn blacklist_from_object(patterns: &Object) -> Result<Blacklist> {
    let mut sources = Vec::new();
    for key in patterns.keys() {
        if let Some(source) = patterns.get(&key)?.as_str() {
            sources.push(source.to_string());
        }
    }
    Blacklist::from_patterns(sources)
}

// =============================================================================
// Weave Pass
// =============================================================================

/// Traversal state for one weave pass. The visited set is dropped with it.
struct WeavePass<'w> {
    weaver: &'w Weaver,
    max_depth: usize,
    visited: HashSet<usize>,
    // Holds visited objects so their addresses stay unique for the pass.
    held: Vec<Object>,
    report: WeaveReport,
}

impl WeavePass<'_> {
    fn visit(&mut self, namespace: &str, members: &Object, depth: usize) {
        if !self.visited.insert(members.id()) {
            return;
        }
        self.held.push(members.clone());
        self.report.visited += 1;

        for key in members.keys() {
            let full_name: Arc<str> = format!("{namespace}.{key}").into();

            let value = match members.get(&key) {
                Ok(value) => value,
                Err(err) => {
                    trace!(member = %full_name, error = %err, "skipping unreadable member");
                    self.report.faulted += 1;
                    continue;
                }
            };

            if !value.is_composite() {
                continue;
            }

            if self.weaver.is_blacklisted(&full_name) {
                trace!(member = %full_name, "blacklisted");
                self.report.skipped += 1;
                continue;
            }

            match &value {
                Value::Fn(function) => {
                    if function.is_woven() || self.weaver.is_excluded(&value) {
                        self.report.skipped += 1;
                        continue;
                    }
                    self.weave_function(&full_name, members, &key, function, depth);
                }
                Value::Object(object) => {
                    if self.weaver.is_excluded(&value) {
                        self.report.skipped += 1;
                        continue;
                    }
                    if depth + 1 < self.max_depth {
                        self.visit(&full_name, object, depth + 1);
                    }
                }
                _ => {}
            }
        }
    }

    fn weave_function(
        &mut self,
        full_name: &Arc<str>,
        owner: &Object,
        key: &Arc<str>,
        original: &Function,
        depth: usize,
    ) {
        let wrapper = self.weaver.wrap(full_name, original);
        owner.set(Arc::clone(key), wrapper.clone());
        self.weaver.record(Arc::clone(full_name), original, &wrapper);
        self.report.wrapped += 1;

        // Functions carry members of their own.
        if depth + 1 < self.max_depth {
            self.visit(full_name, original.properties(), depth + 1);
        }

        // Copied after the descent so statics keep their woven form.
        for (name, slot) in original.properties().own_entries() {
            wrapper.properties().set_slot(name, slot);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
