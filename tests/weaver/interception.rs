//! Integration tests for intercepting wrappers
//!
//! Tests advice delivery, failure transparency, depth bookkeeping, and
//! ancestor reconstruction.

use std::rc::Rc;

use calltrace_foundation::{Context, Error, Function, Object, Value};
use calltrace_weaver::{RECURSION, TOO_DEEP, Weaver, WeaverConfig};

use crate::Recorder;

fn woven(weaver: &Weaver, app: &Object) -> Rc<Recorder> {
    let recorder = Rc::new(Recorder::default());
    weaver.set_advice(recorder.clone());
    weaver.weave("app", &Value::from(app.clone()), None, None);
    recorder
}

#[test]
fn failures_pass_through_unchanged() {
    let weaver = Weaver::default();
    let app = Object::new().with(
        "fail",
        Function::new("fail", |_, _, _| Err(Error::thrown(Value::Int(418)))),
    );
    let recorder = woven(&weaver, &app);

    let ctx = Context::new();
    let err = ctx.call_method(&Value::from(app), "fail", &[]).unwrap_err();
    assert_eq!(err.thrown_value(), Some(&Value::Int(418)));
    assert_eq!(recorder.calls.borrow().len(), 1);
    assert!(recorder.returns.borrow().is_empty());
    assert_eq!(weaver.call_depth(), 0);
}

#[test]
fn return_values_are_untouched() {
    let weaver = Weaver::default();
    let app = Object::new().with(
        "add",
        Function::new("add", |_, _, args| {
            let sum: i64 = args.iter().filter_map(Value::as_int).sum();
            Ok(Value::Int(sum))
        }),
    );
    let recorder = woven(&weaver, &app);

    let ctx = Context::new();
    let result = ctx
        .call_method(&Value::from(app), "add", &[Value::Int(2), Value::Int(3)])
        .unwrap();
    assert_eq!(result, Value::Int(5));
    assert_eq!(recorder.returns.borrow()[0].1, Value::Int(5));
}

#[test]
fn nested_instrumented_calls_nest_depths() {
    let weaver = Weaver::default();
    let app = Object::new();
    app.set("leaf", Function::new("leaf", |_, _, _| Ok(Value::Nil)));
    app.set(
        "branch",
        Function::new("branch", |ctx, this, _| {
            ctx.call_method(this, "leaf", &[])?;
            ctx.call_method(this, "leaf", &[])
        }),
    );
    let recorder = woven(&weaver, &app);

    let ctx = Context::new();
    ctx.call_method(&Value::from(app), "branch", &[]).unwrap();
    let depths: Vec<u32> = recorder.calls.borrow().iter().map(|c| c.depth).collect();
    assert_eq!(depths, vec![1, 2, 2]);
    assert_eq!(weaver.call_depth(), 0);
}

#[test]
fn reconstructed_callers_get_no_completion() {
    let weaver = Weaver::default();
    let app = Object::new().with("work", Function::new("work", |_, _, _| Ok(Value::Int(1))));
    let recorder = woven(&weaver, &app);

    let target = Value::from(app);
    let handler = Function::new("onClick", move |ctx, _, _| ctx.call_method(&target, "work", &[]));
    let ctx = Context::new();
    ctx.call(&handler, &Value::Nil, &[Value::from("button")]).unwrap();

    let calls = recorder.calls.borrow();
    assert_eq!(calls.len(), 2);
    assert!(calls[0].reconstructed);
    assert_eq!(&*calls[0].name, "onClick");
    assert_eq!(calls[0].args, vec![Value::from("button")]);
    assert!(!calls[1].reconstructed);
    assert_eq!(calls[1].depth, 2);

    let returns = recorder.returns.borrow();
    assert_eq!(returns.len(), 1);
    assert_eq!(returns[0].0.0, 2);
}

#[test]
fn recursion_in_callers_is_cut_with_a_sentinel() {
    let weaver = Weaver::default();
    let app = Object::new().with("work", Function::new("work", |_, _, _| Ok(Value::Nil)));
    let recorder = woven(&weaver, &app);

    let target = Value::from(app);
    let slot: Rc<std::cell::RefCell<Option<Function>>> = Rc::default();
    let inner = Rc::clone(&slot);
    let walk = Function::new("walk", move |ctx, _, args| {
        let n = args.first().and_then(Value::as_int).unwrap_or(0);
        if n == 0 {
            return ctx.call_method(&target, "work", &[]);
        }
        let me = inner.borrow().clone().unwrap();
        ctx.call(&me, &Value::Nil, &[Value::Int(n - 1)])
    });
    *slot.borrow_mut() = Some(walk.clone());

    let ctx = Context::new();
    ctx.call(&walk, &Value::Nil, &[Value::Int(3)]).unwrap();
    slot.borrow_mut().take();

    assert_eq!(recorder.names(), vec![RECURSION, "walk", "app.work"]);
}

#[test]
fn long_caller_chains_are_cut_with_a_sentinel() {
    let weaver = Weaver::new(WeaverConfig::new().with_ancestor_limit(3)).unwrap();
    let app = Object::new().with("work", Function::new("work", |_, _, _| Ok(Value::Nil)));
    let recorder = woven(&weaver, &app);

    let target = Value::from(app);
    let mut call: Function = Function::new("f0", move |ctx, _, _| ctx.call_method(&target, "work", &[]));
    for i in 1..6 {
        let next = call.clone();
        call = Function::new(format!("f{i}"), move |ctx, _, _| ctx.call(&next, &Value::Nil, &[]));
    }
    Context::new().call(&call, &Value::Nil, &[]).unwrap();

    assert_eq!(recorder.names(), vec![TOO_DEEP, "f2", "f1", "f0", "app.work"]);
}

#[test]
fn advice_reentry_is_not_traced() {
    struct Chatty {
        app: Value,
        ctx: Context,
        seen: std::cell::Cell<usize>,
    }
    impl calltrace_weaver::Advice for Chatty {
        fn before(&self, _call: &calltrace_weaver::CallDescriptor) -> calltrace_weaver::AdviceToken {
            self.seen.set(self.seen.get() + 1);
            let _ = self.ctx.call_method(&self.app, "helper", &[]);
            calltrace_weaver::AdviceToken::default()
        }
    }

    let weaver = Weaver::default();
    let app = Object::new()
        .with("helper", Function::new("helper", |_, _, _| Ok(Value::Nil)))
        .with("main", Function::new("main", |_, _, _| Ok(Value::Nil)));
    weaver.weave("app", &Value::from(app.clone()), None, None);

    let ctx = Context::new();
    let advice = Rc::new(Chatty {
        app: Value::from(app.clone()),
        ctx: ctx.clone(),
        seen: std::cell::Cell::new(0),
    });
    weaver.set_advice(advice.clone());
    ctx.call_method(&Value::from(app), "main", &[]).unwrap();
    assert_eq!(advice.seen.get(), 1);
}
