//! Integration tests for Value, Object, and Function
//!
//! Tests member enumeration, prototypes, accessors, and identity.

use calltrace_foundation::{Error, Function, Object, Value};

// =============================================================================
// Values
// =============================================================================

#[test]
fn type_names() {
    assert_eq!(Value::Nil.type_name(), "nil");
    assert_eq!(Value::Bool(true).type_name(), "bool");
    assert_eq!(Value::Int(1).type_name(), "int");
    assert_eq!(Value::Float(1.5).type_name(), "float");
    assert_eq!(Value::from("x").type_name(), "string");
    assert_eq!(Value::from(Object::new()).type_name(), "object");
    assert_eq!(
        Value::from(Function::new("f", |_, _, _| Ok(Value::Nil))).type_name(),
        "function"
    );
}

#[test]
fn composites_compare_by_identity() {
    let a = Object::new();
    let b = Object::new();
    assert_eq!(Value::from(a.clone()), Value::from(a.clone()));
    assert_ne!(Value::from(a), Value::from(b));
    assert_eq!(Value::from("same"), Value::from("same"));
}

#[test]
fn only_objects_and_functions_are_composite() {
    assert!(Value::from(Object::new()).is_composite());
    assert!(Value::from(Function::new("f", |_, _, _| Ok(Value::Nil))).is_composite());
    assert!(!Value::from("text").is_composite());
    assert!(!Value::Nil.is_composite());
}

// =============================================================================
// Objects
// =============================================================================

#[test]
fn keys_list_own_then_inherited() {
    let proto = Object::new().with("shared", 1).with("name", "proto");
    let obj = Object::with_prototype(proto).with("name", "own").with("extra", 2);
    let keys: Vec<String> = obj.keys().iter().map(ToString::to_string).collect();
    assert_eq!(keys, vec!["name", "extra", "shared"]);
    assert_eq!(obj.get("name").unwrap(), Value::from("own"));
    assert_eq!(obj.get("shared").unwrap(), Value::Int(1));
}

#[test]
fn hidden_members_are_not_enumerated() {
    let obj = Object::new().with("visible", 1);
    obj.set_hidden("secret", 2);
    assert_eq!(obj.own_keys().len(), 1);
    assert_eq!(obj.get("secret").unwrap(), Value::Int(2));
}

#[test]
fn set_replaces_in_place() {
    let obj = Object::new().with("a", 1).with("b", 2);
    obj.set("a", 3);
    let keys: Vec<String> = obj.own_keys().iter().map(ToString::to_string).collect();
    assert_eq!(keys, vec!["a", "b"]);
    assert_eq!(obj.get("a").unwrap(), Value::Int(3));
}

#[test]
fn faulting_accessor_fails_reads() {
    let obj = Object::new();
    obj.define_accessor("guarded", || Err(Error::member_access("guarded", "denied")));
    assert!(obj.get("guarded").is_err());
    assert!(obj.keys().iter().any(|k| &**k == "guarded"));
}

#[test]
fn cyclic_prototype_chain_terminates() {
    let a = Object::new().with("a", 1);
    let b = Object::with_prototype(a.clone()).with("b", 2);
    a.set_prototype(Some(b.clone()));
    assert_eq!(b.keys().len(), 2);
    assert!(b.get("missing").is_err());
}

// =============================================================================
// Functions
// =============================================================================

#[test]
fn builder_sets_metadata() {
    let proto = Object::new();
    let f = Function::builder(|_, _, _| Ok(Value::Nil))
        .name("Widget")
        .source("function Widget(size) {}")
        .property("DEFAULT_SIZE", 3)
        .prototype(proto.clone())
        .build();
    assert_eq!(f.name(), Some("Widget"));
    assert_eq!(f.source(), Some("function Widget(size) {}"));
    assert_eq!(f.properties().get("DEFAULT_SIZE").unwrap(), Value::Int(3));
    assert!(f.prototype().unwrap().ptr_eq(&proto));
    assert!(!f.is_woven());
}

#[test]
fn function_members_are_its_properties() {
    let f = Function::new("f", |_, _, _| Ok(Value::Nil));
    f.properties().set("helper", "x");
    assert_eq!(Value::from(f).get("helper").unwrap(), Value::from("x"));
}
