//! Session state for the REPL.
//!
//! A session owns the traced program, the weaver instrumenting it, and the
//! console collecting its trace. The weaver reports through a
//! [`TracerAdvice`] that feeds the console.

use std::rc::Rc;

use calltrace_console::{ConsoleConfig, LatestStatus, TraceConsole, TracerAdvice};
use calltrace_foundation::{Context, Error, Result, Value};
use calltrace_weaver::{Blacklist, WeaveReport, Weaver, WeaverConfig};
use tracing::{debug, info};

use crate::demo::{DemoApp, NAMESPACE, scenario};

/// Configuration for a [`Session`].
#[derive(Clone, Debug, Default)]
pub struct SessionConfig {
    /// Weaver settings.
    pub weaver: WeaverConfig,
    /// Console settings.
    pub console: ConsoleConfig,
}

/// The traced program plus its instrumentation.
pub struct Session {
    ctx: Context,
    app: DemoApp,
    weaver: Weaver,
    console: Rc<TraceConsole>,
    tracer: Rc<TracerAdvice>,
    status: Rc<LatestStatus>,
    last_weave: Option<WeaveReport>,
}

impl Session {
    /// Creates a session. Nothing is woven until [`weave`](Self::weave).
    ///
    /// # Errors
    ///
    /// Returns an error if a configured blacklist pattern does not compile.
    pub fn new(config: SessionConfig) -> Result<Self> {
        let weaver = Weaver::new(config.weaver)?;
        let status = Rc::new(LatestStatus::new());
        let console = Rc::new(TraceConsole::new(&config.console).with_status(status.clone()));
        let tracer = Rc::new(TracerAdvice::new(console.clone()));
        weaver.set_advice(tracer.clone());

        let app = DemoApp::build();
        app.root.set("weave", weaver.weave_function());
        weaver.exclude(app.plugin.clone());

        Ok(Self {
            ctx: Context::new(),
            app,
            weaver,
            console,
            tracer,
            status,
            last_weave: None,
        })
    }

    // -------------------------------------------------------------------------
    // Instrumentation
    // -------------------------------------------------------------------------

    /// Weaves the program namespace with the persistent settings.
    pub fn weave(&mut self) -> WeaveReport {
        self.weave_with(None, None)
    }

    /// Weaves the program namespace, replacing the blacklist and depth
    /// limit when given.
    pub fn weave_with(&mut self, blacklist: Option<Blacklist>, max_depth: Option<usize>) -> WeaveReport {
        let report = self.weaver.weave(NAMESPACE, &self.app.value(), blacklist, max_depth);
        info!(wrapped = report.wrapped, "namespace woven");
        self.last_weave = Some(report);
        report
    }

    /// Returns the report of the most recent weave, if any.
    #[must_use]
    pub fn last_weave(&self) -> Option<WeaveReport> {
        self.last_weave
    }

    /// Returns true once the namespace has been woven.
    #[must_use]
    pub fn is_woven(&self) -> bool {
        self.last_weave.is_some()
    }

    // -------------------------------------------------------------------------
    // Execution
    // -------------------------------------------------------------------------

    /// Runs a named scenario.
    ///
    /// # Errors
    ///
    /// Returns an error if no scenario has that name, or propagates the
    /// program's failure.
    pub fn run(&self, name: &str) -> Result<Value> {
        let scenario = scenario(name).ok_or_else(|| Error::member_not_found(name))?;
        debug!(scenario = name, "running scenario");
        scenario.run(&self.ctx, &self.app.value())
    }

    /// Discards the trace and the weaver's call bookkeeping.
    pub fn clear(&self) {
        self.console.clear();
        self.weaver.reset_call_state();
    }

    /// Attaches a note to the most recent frames.
    pub fn annotate(&self, text: impl Into<String>) {
        self.tracer.annotate(text);
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// Returns the console.
    #[must_use]
    pub fn console(&self) -> &TraceConsole {
        &self.console
    }

    /// Returns the weaver.
    #[must_use]
    pub fn weaver(&self) -> &Weaver {
        &self.weaver
    }

    /// Returns the latest status line, if any progress was reported.
    #[must_use]
    pub fn status(&self) -> Option<String> {
        self.status.text()
    }

    /// Returns the number of calls the tracer has reported.
    #[must_use]
    pub fn calls_reported(&self) -> u64 {
        self.tracer.calls_reported()
    }

    /// Returns the program namespace.
    #[must_use]
    pub fn app(&self) -> Value {
        self.app.value()
    }
}
