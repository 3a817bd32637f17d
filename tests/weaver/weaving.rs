//! Integration tests for weave passes
//!
//! Tests idempotence, blacklists, cycles, depth limits, and fault tolerance.

use calltrace_foundation::{Error, Function, Object, Value};
use calltrace_weaver::{Blacklist, Weaver, WeaverConfig};

fn noop(name: &str) -> Function {
    Function::new(name, |_, _, _| Ok(Value::Nil))
}

/// `app.{a, b, nested.{c, deeper.{d}}}`
fn sample_graph() -> Object {
    let deeper = Object::new().with("d", noop("d"));
    let nested = Object::new().with("c", noop("c")).with("deeper", deeper);
    Object::new()
        .with("a", noop("a"))
        .with("b", noop("b"))
        .with("nested", nested)
}

fn wrapped_names(weaver: &Weaver) -> Vec<String> {
    weaver
        .interceptions()
        .iter()
        .map(|i| i.name.to_string())
        .collect()
}

// =============================================================================
// Idempotence
// =============================================================================

#[test]
fn reweaving_never_double_wraps() {
    let weaver = Weaver::default();
    let app = sample_graph();
    let root = Value::from(app.clone());

    assert_eq!(weaver.weave("app", &root, None, None).wrapped, 4);
    let wrapper = app.get("a").unwrap();
    let again = weaver.weave("app", &root, None, None);

    assert_eq!(again.wrapped, 0);
    assert!(app.get("a").unwrap().same_ref(&wrapper));
    let entry = weaver.interception("app.a").unwrap();
    assert!(!entry.original.is_woven());
    assert!(entry.wrapper.is_woven());
}

#[test]
fn overlapping_graphs_are_woven_independently() {
    let weaver = Weaver::default();
    let shared = Object::new().with("f", noop("f"));
    let first = Object::new().with("shared", shared.clone());
    let second = Object::new().with("shared", shared).with("g", noop("g"));

    weaver.weave("one", &Value::from(first), None, None);
    let report = weaver.weave("two", &Value::from(second), None, None);
    assert_eq!(report.wrapped, 1);
    assert!(weaver.interception("two.g").is_some());
}

// =============================================================================
// Blacklist
// =============================================================================

#[test]
fn blacklisted_subtrees_are_not_entered() {
    let weaver = Weaver::default();
    let blacklist = Blacklist::from_patterns(["^app\\.nested$", "\\.b$"]).unwrap();
    weaver.weave("app", &Value::from(sample_graph()), Some(blacklist), None);
    assert_eq!(wrapped_names(&weaver), vec!["app.a"]);
}

#[test]
fn blacklist_persists_until_replaced() {
    let weaver = Weaver::default();
    let blacklist = Blacklist::from_patterns(["a$"]).unwrap();
    weaver.weave("first", &Value::from(sample_graph()), Some(blacklist), None);
    weaver.weave("second", &Value::from(sample_graph()), None, None);
    assert!(weaver.interception("second.a").is_none());
    assert!(weaver.interception("second.b").is_some());

    weaver.weave("third", &Value::from(sample_graph()), Some(Blacklist::new()), None);
    assert!(weaver.interception("third.a").is_some());
}

#[test]
fn invalid_patterns_are_rejected_up_front() {
    assert!(Blacklist::from_patterns(["ok", "(unclosed"]).is_err());
    assert!(Weaver::new(WeaverConfig::new().with_blacklist_pattern("[")).is_err());
}

// =============================================================================
// Traversal Bounds
// =============================================================================

#[test]
fn cycles_terminate() {
    let weaver = Weaver::default();
    let app = Object::new().with("f", noop("f"));
    app.set("self", app.clone());
    let inner = Object::new().with("back", app.clone()).with("g", noop("g"));
    app.set("inner", inner);

    let report = weaver.weave("app", &Value::from(app.clone()), None, None);
    assert_eq!(report.wrapped, 2);
    assert_eq!(report.visited, 2);

    app.remove("self");
    app.remove("inner");
}

#[test]
fn max_depth_limits_descent() {
    let weaver = Weaver::default();
    weaver.weave("app", &Value::from(sample_graph()), None, Some(3));
    assert_eq!(wrapped_names(&weaver), vec!["app.a", "app.b", "app.nested.c"]);
    assert_eq!(weaver.max_depth(), 3);
}

#[test]
fn faulting_members_do_not_stop_siblings() {
    let weaver = Weaver::default();
    let app = Object::new().with("before", noop("before"));
    app.define_accessor("broken", || Err(Error::member_access("broken", "faulted")));
    app.set("after", noop("after"));

    let report = weaver.weave("app", &Value::from(app), None, None);
    assert_eq!(report.faulted, 1);
    assert_eq!(report.wrapped, 2);
}

#[test]
fn inherited_members_are_woven_in_place() {
    let weaver = Weaver::default();
    let proto = Object::new().with("inherited", noop("inherited"));
    let app = Object::with_prototype(proto.clone()).with("own", noop("own"));

    weaver.weave("app", &Value::from(app.clone()), None, None);
    assert!(app.has_own("inherited"));
    assert!(!proto.get("inherited").unwrap().as_fn().unwrap().is_woven());
}

#[test]
fn function_statics_are_carried_over() {
    let weaver = Weaver::default();
    let proto = Object::new().with("kind", "widget");
    let ctor = Function::builder(|_, _, _| Ok(Value::Nil))
        .name("Widget")
        .property("VERSION", 2)
        .property("create", noop("create"))
        .prototype(proto.clone())
        .build();
    let app = Object::new().with("Widget", ctor);

    weaver.weave("app", &Value::from(app.clone()), None, None);
    let wrapper = app.get("Widget").unwrap();
    let wrapper = wrapper.as_fn().unwrap();
    assert!(wrapper.is_woven());
    assert_eq!(wrapper.name(), Some("Widget"));
    assert_eq!(wrapper.properties().get("VERSION").unwrap(), Value::Int(2));
    assert!(wrapper.prototype().unwrap().ptr_eq(&proto));
    assert!(
        wrapper.properties().get("create").unwrap().as_fn().unwrap().is_woven(),
        "statics keep their woven form"
    );
    assert!(weaver.interception("app.Widget.create").is_some());
}

#[test]
fn excluded_values_are_left_alone() {
    let weaver = Weaver::default();
    let plugin = Object::new().with("render", noop("render"));
    let app = Object::new().with("plugin", plugin.clone()).with("f", noop("f"));
    weaver.exclude(plugin);
    weaver.weave("app", &Value::from(app), None, None);
    assert_eq!(wrapped_names(&weaver), vec!["app.f"]);
}

#[test]
fn weave_function_is_never_instrumented() {
    let weaver = Weaver::default();
    let app = Object::new().with("weave", weaver.weave_function());
    let report = weaver.weave("app", &Value::from(app), None, None);
    assert_eq!(report.wrapped, 0);
    assert_eq!(report.skipped, 1);
}
