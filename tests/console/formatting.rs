//! Integration tests for value formatting
//!
//! Tests truncation bounds, composite enumeration, and name recovery.

use calltrace_console::{UNKNOWN_NAME, ValueFormatter, Verbosity, function_name};
use calltrace_foundation::{Error, Function, Object, Value};

#[test]
fn long_text_is_truncated_unless_exhaustive() {
    let text = Value::from("x".repeat(80));

    let plain = ValueFormatter::new(Verbosity::plain()).format(&text);
    assert_eq!(plain.chars().count(), 52);
    assert_eq!(plain, format!("'{}...'", "x".repeat(47)));

    let full = ValueFormatter::new(Verbosity::exhaustive()).format(&text);
    assert_eq!(full, format!("'{}'", "x".repeat(80)));
}

#[test]
fn composites_need_verbosity() {
    let proto = Object::new().with("inherited", true);
    let obj = Object::with_prototype(proto)
        .with("n", 1)
        .with("child", Object::new())
        .with("cb", Function::new("cb", |_, _, _| Ok(Value::Nil)));
    let value = Value::from(obj);

    assert_eq!(ValueFormatter::new(Verbosity::plain()).format(&value), "{object}");
    assert_eq!(
        ValueFormatter::new(Verbosity::exhaustive()).format(&value),
        "{n:1, child:{object}, cb:{function}, inherited:true}"
    );
}

#[test]
fn detailed_output_stays_bounded() {
    let obj = Object::new();
    for i in 0..20 {
        obj.set(format!("member{i}"), i);
    }
    let text = ValueFormatter::new(Verbosity::detailed()).format(&Value::from(obj));
    assert!(text.chars().count() <= 52);
    assert!(text.ends_with("...}"));
}

#[test]
fn enumeration_failure_falls_back_to_placeholder() {
    let obj = Object::new().with("ok", 1);
    obj.define_accessor("bad", || Err(Error::member_access("bad", "denied")));
    let text = ValueFormatter::new(Verbosity::exhaustive()).format(&Value::from(obj));
    assert_eq!(text, "{object}");
}

#[test]
fn function_names_are_recovered() {
    let named = Function::new("send", |_, _, _| Ok(Value::Nil));
    let from_source = Function::builder(|_, _, _| Ok(Value::Nil))
        .source("function compose(to) { return draft; }")
        .build();
    let unknown = Function::anonymous(|_, _, _| Ok(Value::Nil));

    assert_eq!(function_name(&named), "send");
    assert_eq!(function_name(&from_source), "compose");
    assert_eq!(function_name(&unknown), UNKNOWN_NAME);
    assert_eq!(
        ValueFormatter::default().format(&Value::from(named)),
        "function send()"
    );
}

mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn quoted_text_never_exceeds_bound(text in ".{0,200}") {
            let out = ValueFormatter::new(Verbosity::plain()).format(&Value::from(text.as_str()));
            prop_assert!(out.chars().count() <= 52);
            prop_assert!(out.starts_with('\''));
        }

        #[test]
        fn exhaustive_text_is_verbatim(text in ".{0,200}") {
            let out = ValueFormatter::new(Verbosity::exhaustive()).format(&Value::from(text.as_str()));
            prop_assert_eq!(out, format!("'{text}'"));
        }
    }
}
