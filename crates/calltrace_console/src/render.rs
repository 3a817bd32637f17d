//! Lazy materialisation of the call tree into text.
//!
//! The renderer keeps its own per-frame state (materialised, expanded,
//! cached label) alongside a read-only view of the [`TraceModel`]. A frame's
//! children are only formatted when it is expanded, so very large traces
//! cost nothing until they are looked at.

use crate::config::{ConsoleConfig, DisplayMode};
use crate::format::{ValueFormatter, Verbosity, format_frame};
use crate::trace::{FrameId, ROOT, TraceModel};

/// Renders a [`TraceModel`] in stack or flat mode.
#[derive(Clone, Debug)]
pub struct TreeRenderer {
    mode: DisplayMode,
    formatter: ValueFormatter,
    color: bool,
    materialized: Vec<bool>,
    expanded: Vec<bool>,
    labels: Vec<Option<String>>,
    /// Frames emitted under each container, in emission order.
    emitted: Vec<Vec<FrameId>>,
}

impl Default for TreeRenderer {
    fn default() -> Self {
        Self::new(&ConsoleConfig::default())
    }
}

impl TreeRenderer {
    /// Creates a renderer with nothing materialised.
    #[must_use]
    pub fn new(config: &ConsoleConfig) -> Self {
        Self {
            mode: config.mode,
            formatter: ValueFormatter::new(config.verbosity)
                .with_limits(config.text_limit, config.text_keep),
            color: config.color,
            materialized: Vec::new(),
            expanded: Vec::new(),
            labels: Vec::new(),
            emitted: Vec::new(),
        }
    }

    /// Returns the display mode.
    #[must_use]
    pub fn mode(&self) -> DisplayMode {
        self.mode
    }

    /// Sets the display mode. Call [`refresh`](Self::refresh) afterwards;
    /// the two modes render disjoint subsets.
    pub fn set_mode(&mut self, mode: DisplayMode) {
        self.mode = mode;
    }

    /// Returns the formatting verbosity.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        self.formatter.verbosity()
    }

    /// Sets the formatting verbosity. Call [`update`](Self::update)
    /// afterwards to re-render existing labels.
    pub fn set_verbosity(&mut self, verbosity: Verbosity) {
        self.formatter.set_verbosity(verbosity);
    }

    /// Returns true if the frame has been materialised.
    #[must_use]
    pub fn is_materialized(&self, id: FrameId) -> bool {
        self.materialized.get(id).copied().unwrap_or(false)
    }

    /// Returns true if the frame is expanded.
    #[must_use]
    pub fn is_expanded(&self, id: FrameId) -> bool {
        self.expanded.get(id).copied().unwrap_or(false)
    }

    fn grow(&mut self, len: usize) {
        if self.materialized.len() < len {
            self.materialized.resize(len, false);
            self.expanded.resize(len, false);
            self.labels.resize(len, None);
            self.emitted.resize(len, Vec::new());
        }
    }

    fn emit(&mut self, model: &TraceModel, container: FrameId, id: FrameId) {
        self.materialized[id] = true;
        self.labels[id] = model
            .get(id)
            .map(|frame| format_frame(frame, &self.formatter, self.color));
        self.emitted[container].push(id);
    }

    // -------------------------------------------------------------------------
    // Materialisation
    // -------------------------------------------------------------------------

    /// Materialises pending output and returns how many frames were emitted.
    ///
    /// In stack mode, toggles the expansion of `frame` (the root if `None`),
    /// or forces it open when `expand_only` is set, then emits every child
    /// not yet materialised. In flat mode `frame` is ignored and every
    /// pending directly entered frame is emitted in arrival order.
    pub fn materialize(&mut self, model: &TraceModel, frame: Option<FrameId>, expand_only: bool) -> usize {
        self.grow(model.len());
        match self.mode {
            DisplayMode::Stack => self.materialize_children(model, frame.unwrap_or(ROOT), expand_only),
            DisplayMode::Flat => self.materialize_flat(model),
        }
    }

    fn materialize_children(&mut self, model: &TraceModel, parent: FrameId, expand_only: bool) -> usize {
        let children = model.children(parent);
        if children.is_empty() {
            return 0;
        }

        if !self.expanded[parent] {
            self.expanded[parent] = true;
        } else if !expand_only {
            self.expanded[parent] = false;
        }

        let mut emitted = 0;
        for &child in children {
            if !self.materialized[child] {
                self.emit(model, parent, child);
                emitted += 1;
            }
        }
        emitted
    }

    fn materialize_flat(&mut self, model: &TraceModel) -> usize {
        let mut emitted = 0;
        for frame in model.frames().iter().skip(1) {
            if !self.materialized[frame.id] && !frame.reconstructed {
                self.emit(model, ROOT, frame.id);
                emitted += 1;
            }
        }
        emitted
    }

    /// Forces `frame` and every descendant open.
    pub fn materialize_all(&mut self, model: &TraceModel, frame: FrameId) -> usize {
        let mut emitted = 0;
        let mut pending = vec![frame];
        while let Some(id) = pending.pop() {
            let children = model.children(id);
            if children.is_empty() {
                continue;
            }
            emitted += self.materialize(model, Some(id), true);
            pending.extend(children.iter().rev());
        }
        emitted
    }

    /// Discards all output and materialises again from the root.
    pub fn refresh(&mut self, model: &TraceModel) -> usize {
        self.reset();
        self.materialize(model, None, false)
    }

    /// Re-renders the labels of materialised frames without touching
    /// expansion state.
    pub fn update(&mut self, model: &TraceModel) {
        self.grow(model.len());
        for (id, label) in self.labels.iter_mut().enumerate().skip(1) {
            if self.materialized[id] {
                *label = model
                    .get(id)
                    .map(|frame| format_frame(frame, &self.formatter, self.color));
            }
        }
    }

    /// Forgets all per-frame state.
    pub fn reset(&mut self) {
        self.materialized.clear();
        self.expanded.clear();
        self.labels.clear();
        self.emitted.clear();
    }

    // -------------------------------------------------------------------------
    // Output
    // -------------------------------------------------------------------------

    /// Returns the visible lines.
    ///
    /// In stack mode each line is indented by its nesting and prefixed with
    /// `+` (collapsed, has children) or `-` (expanded). Children of collapsed
    /// frames are hidden even if they were materialised earlier.
    #[must_use]
    pub fn lines(&self, model: &TraceModel) -> Vec<String> {
        let mut lines = Vec::new();
        let Some(top) = self.emitted.first() else {
            return lines;
        };

        if self.mode == DisplayMode::Flat {
            lines.extend(top.iter().filter_map(|&id| self.labels[id].clone()));
            return lines;
        }

        let mut pending: Vec<(FrameId, usize)> = top.iter().rev().map(|&id| (id, 0)).collect();
        while let Some((id, level)) = pending.pop() {
            let Some(label) = &self.labels[id] else {
                continue;
            };
            let marker = match (model.children(id).is_empty(), self.expanded[id]) {
                (true, _) => ' ',
                (false, true) => '-',
                (false, false) => '+',
            };
            lines.push(format!("{}{marker} {label}", "  ".repeat(level)));
            if self.expanded[id] {
                pending.extend(self.emitted[id].iter().rev().map(|&child| (child, level + 1)));
            }
        }
        lines
    }

    /// Returns the visible output as one string.
    #[must_use]
    pub fn render(&self, model: &TraceModel) -> String {
        self.lines(model).join("\n")
    }
}
