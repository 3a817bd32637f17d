//! The host-facing trace console.
//!
//! [`TraceConsole`] ties a [`TraceModel`] to a [`TreeRenderer`]: it accepts
//! notifications as a [`NotificationSink`], schedules render passes through
//! a [`Debouncer`], and exposes the view commands a host wires to its
//! controls.

use std::cell::{Ref, RefCell};
use std::rc::Rc;
use std::sync::Arc;

use tracing::debug;

use crate::config::{ConsoleConfig, DisplayMode};
use crate::debounce::{Clock, Debouncer, SystemClock};
use crate::format::Verbosity;
use crate::render::TreeRenderer;
use crate::trace::{FrameId, NotifyOutcome, TraceModel};
use crate::tracer::{Notification, NotificationSink};

// =============================================================================
// Status Sink
// =============================================================================

/// Formats the status line for a frame count.
#[must_use]
pub fn status_text(count: usize) -> String {
    format!("{count} methods traced.")
}

/// Receiver of progress reports.
pub trait StatusSink {
    /// Reports the number of frames traced so far.
    fn frames_traced(&self, count: usize);
}

/// Status sink that discards reports.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullStatus;

impl StatusSink for NullStatus {
    fn frames_traced(&self, _count: usize) {}
}

/// Status sink that keeps the latest report.
#[derive(Debug, Default)]
pub struct LatestStatus {
    latest: RefCell<Option<usize>>,
}

impl LatestStatus {
    /// Creates an empty status holder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the latest reported count.
    #[must_use]
    pub fn count(&self) -> Option<usize> {
        *self.latest.borrow()
    }

    /// Returns the latest status line.
    #[must_use]
    pub fn text(&self) -> Option<String> {
        self.count().map(status_text)
    }
}

impl StatusSink for LatestStatus {
    fn frames_traced(&self, count: usize) {
        *self.latest.borrow_mut() = Some(count);
    }
}

// =============================================================================
// Trace Console
// =============================================================================

struct ConsoleState {
    model: TraceModel,
    renderer: TreeRenderer,
    timer: Debouncer,
}

/// Trace model, renderer, and render scheduling behind one handle.
///
/// All commands take `&self`; the console is shared between the advice that
/// feeds it and the host that displays it.
pub struct TraceConsole {
    state: RefCell<ConsoleState>,
    clock: Rc<dyn Clock>,
    status: Rc<dyn StatusSink>,
}

impl Default for TraceConsole {
    fn default() -> Self {
        Self::new(&ConsoleConfig::default())
    }
}

impl TraceConsole {
    /// Creates a console using the system clock and no status sink.
    #[must_use]
    pub fn new(config: &ConsoleConfig) -> Self {
        Self {
            state: RefCell::new(ConsoleState {
                model: TraceModel::new().with_progress_interval(config.progress_interval),
                renderer: TreeRenderer::new(config),
                timer: Debouncer::new(config.debounce),
            }),
            clock: Rc::new(SystemClock),
            status: Rc::new(NullStatus),
        }
    }

    /// Builder method to replace the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Rc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Builder method to attach a status sink.
    #[must_use]
    pub fn with_status(mut self, status: Rc<dyn StatusSink>) -> Self {
        self.status = status;
        self
    }

    /// Runs `f` on the state, then reports the frame count if asked to.
    fn with_state<R>(&self, report: bool, f: impl FnOnce(&mut ConsoleState) -> R) -> R {
        let (result, count) = {
            let mut state = self.state.borrow_mut();
            let result = f(&mut *state);
            (result, state.model.frame_count())
        };
        if report {
            self.status.frames_traced(count);
        }
        result
    }

    // -------------------------------------------------------------------------
    // View Commands
    // -------------------------------------------------------------------------

    /// Materialises pending output and returns the rendered view.
    pub fn show(&self) -> String {
        self.with_state(true, |s| {
            s.timer.cancel();
            s.renderer.materialize(&s.model, None, false);
            s.renderer.render(&s.model)
        })
    }

    /// Fires the render timer if it is due. Returns true if a pass ran.
    pub fn poll(&self) -> bool {
        let now = self.clock.now();
        let fired = self.state.borrow_mut().timer.fire_if_due(now);
        if fired {
            self.with_state(true, |s| s.renderer.materialize(&s.model, None, false));
        }
        fired
    }

    /// Returns true if a render pass is scheduled.
    #[must_use]
    pub fn render_pending(&self) -> bool {
        self.state.borrow().timer.is_pending()
    }

    /// Discards all output and materialises again from the root.
    pub fn refresh(&self) {
        self.with_state(true, |s| s.renderer.refresh(&s.model));
    }

    /// Stops (or resumes) accepting notifications.
    pub fn pause(&self, paused: bool) {
        debug!(paused, "trace intake");
        self.state.borrow_mut().model.pause(paused);
    }

    /// Returns true if notifications are being dropped.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.state.borrow().model.is_paused()
    }

    /// Discards the whole trace.
    pub fn clear(&self) {
        let discarded = self.with_state(true, |s| {
            let discarded = s.model.frame_count();
            s.model.clear();
            s.timer.cancel();
            s.renderer.refresh(&s.model);
            discarded
        });
        debug!(discarded, "trace cleared");
    }

    /// Switches between stack and flat mode.
    pub fn set_stack_mode(&self, stack: bool) {
        let mode = if stack { DisplayMode::Stack } else { DisplayMode::Flat };
        self.with_state(true, |s| {
            s.renderer.set_mode(mode);
            s.renderer.refresh(&s.model)
        });
    }

    /// Toggles composite enumeration.
    pub fn set_detailed(&self, detailed: bool) {
        self.set_verbosity(|v| v.detailed = detailed);
    }

    /// Toggles untruncated output.
    pub fn set_exhaustive(&self, exhaustive: bool) {
        self.set_verbosity(|v| v.exhaustive = exhaustive);
    }

    fn set_verbosity(&self, change: impl FnOnce(&mut Verbosity)) {
        self.with_state(false, |s| {
            let mut verbosity = s.renderer.verbosity();
            change(&mut verbosity);
            s.renderer.set_verbosity(verbosity);
            s.renderer.update(&s.model);
        });
    }

    /// Toggles one frame's expansion. Ignored in flat mode or for unknown
    /// frames; returns false in that case.
    pub fn toggle(&self, id: FrameId) -> bool {
        if !self.accepts_expansion(id) {
            return false;
        }
        self.with_state(true, |s| s.renderer.materialize(&s.model, Some(id), false));
        true
    }

    /// Expands a frame and all its descendants. Ignored in flat mode or for
    /// unknown frames; returns false in that case.
    pub fn expand_all(&self, id: FrameId) -> bool {
        if !self.accepts_expansion(id) {
            return false;
        }
        self.with_state(true, |s| s.renderer.materialize_all(&s.model, id));
        true
    }

    fn accepts_expansion(&self, id: FrameId) -> bool {
        let state = self.state.borrow();
        state.renderer.mode().is_stack() && state.model.get(id).is_some()
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Returns the visible lines without materialising anything.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        let state = self.state.borrow();
        state.renderer.lines(&state.model)
    }

    /// Returns the display mode.
    #[must_use]
    pub fn mode(&self) -> DisplayMode {
        self.state.borrow().renderer.mode()
    }

    /// Returns the formatting verbosity.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        self.state.borrow().renderer.verbosity()
    }

    /// Returns the number of frames traced.
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.state.borrow().model.frame_count()
    }

    /// Returns the most frequently entered callables.
    #[must_use]
    pub fn hot_functions(&self, limit: usize) -> Vec<(Arc<str>, usize)> {
        self.state.borrow().model.hot_functions(limit)
    }

    /// Borrows the underlying model.
    #[must_use]
    pub fn model(&self) -> Ref<'_, TraceModel> {
        Ref::map(self.state.borrow(), |s| &s.model)
    }
}

impl NotificationSink for TraceConsole {
    fn notify(&self, notification: Notification) {
        let now = self.clock.now();
        let outcome = {
            let mut state = self.state.borrow_mut();
            let outcome = state.model.notify(notification);
            if let NotifyOutcome::Appended { top_level: true, .. } = outcome {
                state.timer.arm(now);
            }
            outcome
        };
        if let NotifyOutcome::Appended {
            progress: Some(count),
            ..
        } = outcome
        {
            self.status.frames_traced(count);
        }
    }
}
