//! A small mail client used as the traced program.
//!
//! The graph lives under the `app` namespace. Scenarios drive it through
//! handler functions that are deliberately left out of the graph, so their
//! frames show up as reconstructed callers.

use std::cell::RefCell;
use std::rc::Rc;

use calltrace_foundation::{Context, Error, Function, Object, Result, Value};

/// Namespace the demo graph is woven under.
pub const NAMESPACE: &str = "app";

const MESSAGES: [&str; 3] = [
    "  From: alice  Subject: lunch?  ",
    "From: bob Subject: quarterly numbers are in, see attached spreadsheet for details",
    " From: carol Subject: re: re: re: offsite ",
];

// =============================================================================
// Graph
// =============================================================================

/// The demo program graph and the members a host treats specially.
pub struct DemoApp {
    /// The `app` namespace object.
    pub root: Object,
    /// An embedded object that must never be woven.
    pub plugin: Object,
}

impl DemoApp {
    /// Builds the graph.
    #[must_use]
    pub fn build() -> Self {
        let util = util();
        let plugin = Object::new().with(
            "render",
            Function::new("render", |_, _, _| Ok(Value::from("<widget>"))),
        );

        let root = Object::new()
            .with("name", "calltrace demo")
            .with("version", Value::Int(3))
            .with("util", util.clone())
            .with("mail", mail(&util))
            .with("plugin", plugin.clone());

        root.define_accessor("secret", || Err(Error::member_access("secret", "guarded")));
        root.set("root", root.clone());

        Self { root, plugin }
    }

    /// Returns the namespace object as a value.
    #[must_use]
    pub fn value(&self) -> Value {
        Value::from(self.root.clone())
    }
}

impl Drop for DemoApp {
    fn drop(&mut self) {
        // Break the self-reference so the graph is freed.
        self.root.remove("root");
    }
}

fn util() -> Object {
    let util = Object::new();
    util.set(
        "trim",
        Function::new("trim", |_, _, args| {
            Ok(args
                .first()
                .and_then(Value::as_str)
                .map_or(Value::Nil, |s| Value::from(s.trim())))
        }),
    );
    util.set(
        "format",
        Function::new("format", |_, _, args| {
            let parts: Vec<String> = args.iter().map(ToString::to_string).collect();
            Ok(Value::from(parts.join(" ")))
        }),
    );
    util
}

fn mail(util: &Object) -> Object {
    let folder_proto = Object::new().with("kind", "folder");
    let folder = Function::builder(|_, _, args| {
        let name = args.first().cloned().unwrap_or(Value::from("inbox"));
        Ok(Value::from(Object::new().with("name", name)))
    })
    .name("Folder")
    .property("DEFAULT", "inbox")
    .property(
        "open",
        Function::new("open", |_, _, args| Ok(args.first().cloned().unwrap_or(Value::Nil))),
    )
    .prototype(folder_proto)
    .build();

    let mail = Object::new().with("Folder", folder);

    let util_ref = Value::from(util.clone());
    mail.set(
        "parse",
        Function::new("parse", move |ctx, _, args| {
            let raw = args.first().cloned().unwrap_or(Value::Nil);
            let clean = ctx.call_method(&util_ref, "trim", &[raw])?;
            Ok(Value::from(Object::new().with("text", clean)))
        }),
    );

    mail.set(
        "fetch",
        Function::new("fetch", |ctx, this, args| {
            let folder = args.first().cloned().unwrap_or(Value::from("inbox"));
            ctx.call_method(&this.get("Folder")?, "open", &[folder])?;
            let mut count = 0;
            for raw in MESSAGES {
                ctx.call_method(this, "parse", &[Value::from(raw)])?;
                count += 1;
            }
            Ok(Value::Int(count))
        }),
    );

    mail.set(
        "compose",
        Function::new("compose", |_, _, args| {
            let to = args.first().cloned().unwrap_or(Value::Nil);
            let draft = Object::new().with("to", to);
            draft.set(
                "send",
                Function::new("send", |_, this, args| {
                    let Some(draft) = this.as_object() else {
                        return Ok(Value::Bool(false));
                    };
                    draft.set("body", args.first().cloned().unwrap_or(Value::Nil));
                    Ok(Value::Bool(true))
                }),
            );
            Ok(Value::from(draft))
        }),
    );

    mail.set(
        "reject",
        Function::new("reject", |_, _, _| Err(Error::thrown("mailbox full"))),
    );

    mail
}

// =============================================================================
// Scenarios
// =============================================================================

/// A scripted interaction with the demo graph.
pub struct Scenario {
    /// Name used on the command line.
    pub name: &'static str,
    /// One-line description.
    pub description: &'static str,
    run: fn(&Context, &Value) -> Result<Value>,
}

impl Scenario {
    /// Runs the scenario against `app`.
    ///
    /// # Errors
    ///
    /// Propagates any failure raised by the program.
    pub fn run(&self, ctx: &Context, app: &Value) -> Result<Value> {
        (self.run)(ctx, app)
    }
}

/// All scenarios, in display order.
pub static SCENARIOS: [Scenario; 6] = [
    Scenario {
        name: "inbox",
        description: "click handler fetches and parses the inbox",
        run: run_inbox,
    },
    Scenario {
        name: "compose",
        description: "compose a draft and send it (the draft is woven on return)",
        run: run_compose,
    },
    Scenario {
        name: "fail",
        description: "a mailbox call that fails",
        run: run_fail,
    },
    Scenario {
        name: "recurse",
        description: "a recursive un-instrumented walker",
        run: run_recurse,
    },
    Scenario {
        name: "burst",
        description: "many top-level formatting calls",
        run: run_burst,
    },
    Scenario {
        name: "reweave",
        description: "the program asks for its own namespace to be woven again",
        run: run_reweave,
    },
];

/// Looks up a scenario by name.
#[must_use]
pub fn scenario(name: &str) -> Option<&'static Scenario> {
    SCENARIOS.iter().find(|s| s.name == name)
}

fn run_inbox(ctx: &Context, app: &Value) -> Result<Value> {
    let mail = app.get("mail")?;
    let handler = Function::new("onInboxClick", move |ctx, _, args| {
        ctx.call_method(&mail, "fetch", args)
    });
    ctx.call(&handler, &Value::Nil, &[Value::from("inbox")])
}

fn run_compose(ctx: &Context, app: &Value) -> Result<Value> {
    let mail = app.get("mail")?;
    let handler = Function::anonymous(move |ctx, _, _| {
        let draft = ctx.call_method(&mail, "compose", &[Value::from("bob")])?;
        ctx.call_method(&draft, "send", &[Value::from("see you at noon")])
    });
    ctx.call(&handler, &Value::Nil, &[])
}

fn run_fail(ctx: &Context, app: &Value) -> Result<Value> {
    let mail = app.get("mail")?;
    let handler = Function::new("onSend", move |ctx, _, _| ctx.call_method(&mail, "reject", &[]));
    ctx.call(&handler, &Value::Nil, &[])
}

fn run_recurse(ctx: &Context, app: &Value) -> Result<Value> {
    let util = app.get("util")?;
    let slot: Rc<RefCell<Option<Function>>> = Rc::new(RefCell::new(None));
    let inner = Rc::clone(&slot);
    let walk = Function::new("walk", move |ctx, _, args| {
        let n = args.first().and_then(Value::as_int).unwrap_or(0);
        if n <= 0 {
            return ctx.call_method(&util, "trim", &[Value::from("  bottom  ")]);
        }
        let me = inner.borrow().clone().ok_or_else(|| Error::not_callable("walk", "nil"))?;
        ctx.call(&me, &Value::Nil, &[Value::Int(n - 1)])
    });
    *slot.borrow_mut() = Some(walk.clone());
    let result = ctx.call(&walk, &Value::Nil, &[Value::Int(3)]);
    slot.borrow_mut().take();
    result
}

fn run_burst(ctx: &Context, app: &Value) -> Result<Value> {
    let util = app.get("util")?;
    let mut last = Value::Nil;
    for i in 0..20 {
        last = ctx.call_method(&util, "format", &[Value::from("tick"), Value::Int(i)])?;
    }
    Ok(last)
}

fn run_reweave(ctx: &Context, app: &Value) -> Result<Value> {
    ctx.call_method(app, "weave", &[Value::from(NAMESPACE), app.clone()])
}
