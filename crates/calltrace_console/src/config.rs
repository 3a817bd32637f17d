//! Configuration for the trace console.

use std::time::Duration;

use crate::format::Verbosity;

/// Default delay between the last top-level call and the render pass.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

/// Default number of frames between progress reports.
pub const DEFAULT_PROGRESS_INTERVAL: usize = 500;

/// Default length above which text is truncated.
pub const DEFAULT_TEXT_LIMIT: usize = 50;

/// Default number of characters kept when text is truncated.
pub const DEFAULT_TEXT_KEEP: usize = 47;

/// How the trace tree is displayed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DisplayMode {
    /// Directly entered calls in arrival order, ignoring hierarchy.
    #[default]
    Flat,
    /// The full call tree, including reconstructed callers.
    Stack,
}

impl DisplayMode {
    /// Returns true for [`DisplayMode::Stack`].
    #[must_use]
    pub const fn is_stack(self) -> bool {
        matches!(self, Self::Stack)
    }
}

/// Configuration for a [`TraceConsole`](crate::TraceConsole).
#[derive(Clone, Debug)]
pub struct ConsoleConfig {
    /// Render coalescing delay.
    pub debounce: Duration,
    /// Frames between progress reports (0 disables them).
    pub progress_interval: usize,
    /// Text longer than this is truncated unless exhaustive.
    pub text_limit: usize,
    /// Characters kept before the ellipsis when truncating.
    pub text_keep: usize,
    /// Initial display mode.
    pub mode: DisplayMode,
    /// Initial formatting verbosity.
    pub verbosity: Verbosity,
    /// Whether rendered lines carry ANSI styling.
    pub color: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            text_limit: DEFAULT_TEXT_LIMIT,
            text_keep: DEFAULT_TEXT_KEEP,
            mode: DisplayMode::Flat,
            verbosity: Verbosity::plain(),
            color: false,
        }
    }
}

impl ConsoleConfig {
    /// Creates a default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the render coalescing delay.
    #[must_use]
    pub fn with_debounce(mut self, delay: Duration) -> Self {
        self.debounce = delay;
        self
    }

    /// Builder method to set the progress interval.
    #[must_use]
    pub fn with_progress_interval(mut self, frames: usize) -> Self {
        self.progress_interval = frames;
        self
    }

    /// Builder method to set the truncation limits.
    #[must_use]
    pub fn with_text_limits(mut self, limit: usize, keep: usize) -> Self {
        self.text_limit = limit;
        self.text_keep = keep.min(limit);
        self
    }

    /// Builder method to set the display mode.
    #[must_use]
    pub fn with_mode(mut self, mode: DisplayMode) -> Self {
        self.mode = mode;
        self
    }

    /// Builder method to set the verbosity.
    #[must_use]
    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Builder method to enable ANSI styling.
    #[must_use]
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }
}
