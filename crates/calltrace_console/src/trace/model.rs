//! The call tree and its insertion algorithm.
//!
//! Frames are appended in arrival order and never removed individually.
//! Each new frame is attached under the nearest frame on the path from the
//! last-attached frame (the cursor) to the root whose depth is less than
//! its own.

use std::collections::HashMap;
use std::sync::Arc;

use calltrace_weaver::CallDescriptor;

use super::frame::{CallFrame, FrameId, ROOT};
use crate::config::DEFAULT_PROGRESS_INTERVAL;
use crate::tracer::Notification;

/// What a notification did to the model.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// The model is paused; nothing changed.
    Dropped,
    /// An annotation was attached to existing frames.
    Annotated,
    /// A frame was appended.
    Appended {
        /// The new frame's id.
        id: FrameId,
        /// True if the frame has depth 1 and should trigger a render.
        top_level: bool,
        /// Frame count, when a progress report is due.
        progress: Option<usize>,
    },
}

/// The assembled call tree.
#[derive(Clone, Debug)]
pub struct TraceModel {
    frames: Vec<CallFrame>,
    cursor: FrameId,
    paused: bool,
    progress_interval: usize,
}

impl Default for TraceModel {
    fn default() -> Self {
        Self::new()
    }
}

impl TraceModel {
    /// Creates a model holding only the root.
    #[must_use]
    pub fn new() -> Self {
        Self {
            frames: vec![CallFrame::root()],
            cursor: ROOT,
            paused: false,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }

    /// Builder method to set how often progress is reported (0 disables it).
    #[must_use]
    pub fn with_progress_interval(mut self, frames: usize) -> Self {
        self.progress_interval = frames;
        self
    }

    // -------------------------------------------------------------------------
    // Intake
    // -------------------------------------------------------------------------

    /// Applies one notification.
    pub fn notify(&mut self, notification: Notification) -> NotifyOutcome {
        if self.paused {
            return NotifyOutcome::Dropped;
        }
        match notification {
            Notification::Annotation(text) => {
                self.annotate(text);
                NotifyOutcome::Annotated
            }
            Notification::Call(call) => {
                let id = self.push(&call);
                let count = self.frame_count();
                let progress = (self.progress_interval > 0 && count % self.progress_interval == 0)
                    .then_some(count);
                NotifyOutcome::Appended {
                    id,
                    top_level: call.depth == 1,
                    progress,
                }
            }
        }
    }

    /// Attaches a note to the last top-level frame and to the cursor.
    fn annotate(&mut self, text: String) {
        if let Some(&last_top) = self.frames[ROOT].children.last() {
            self.frames[last_top].annotation = Some(text.clone());
        }
        if self.cursor != ROOT {
            self.frames[self.cursor].annotation = Some(text);
        }
    }

    /// Appends a frame for `call` and returns its id.
    fn push(&mut self, call: &CallDescriptor) -> FrameId {
        let id = self.frames.len();
        let target = call.depth.saturating_sub(1);

        let mut parent = self.cursor;
        while parent != ROOT && self.frames[parent].depth > target {
            parent = self.frames[parent].parent.unwrap_or(ROOT);
        }

        let mut frame = CallFrame::from_descriptor(id, call);
        frame.parent = Some(parent);
        self.frames.push(frame);
        self.frames[parent].children.push(id);
        self.cursor = id;
        id
    }

    // -------------------------------------------------------------------------
    // Control
    // -------------------------------------------------------------------------

    /// Drops (or resumes accepting) notifications.
    pub fn pause(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Returns true if notifications are being dropped.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Discards every frame and resets to the empty root.
    pub fn clear(&mut self) {
        self.frames.clear();
        self.frames.push(CallFrame::root());
        self.cursor = ROOT;
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Returns the root frame.
    #[must_use]
    pub fn root(&self) -> &CallFrame {
        &self.frames[ROOT]
    }

    /// Returns a frame by id.
    #[must_use]
    pub fn get(&self, id: FrameId) -> Option<&CallFrame> {
        self.frames.get(id)
    }

    /// Returns every frame, indexed by id.
    #[must_use]
    pub fn frames(&self) -> &[CallFrame] {
        &self.frames
    }

    /// Returns the children of a frame (empty for unknown ids).
    #[must_use]
    pub fn children(&self, id: FrameId) -> &[FrameId] {
        self.frames.get(id).map_or(&[], |f| f.children.as_slice())
    }

    /// Returns the last-attached frame.
    #[must_use]
    pub fn cursor(&self) -> FrameId {
        self.cursor
    }

    /// Returns the number of frames, excluding the root.
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.frames.len() - 1
    }

    /// Returns the size of the frame sequence, including the root.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Returns true if only the root exists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.len() == 1
    }

    /// Counts directly entered frames per name, most frequent first.
    ///
    /// Callables that dominate this list are candidates for the blacklist.
    #[must_use]
    pub fn hot_functions(&self, limit: usize) -> Vec<(Arc<str>, usize)> {
        let mut counts: HashMap<Arc<str>, usize> = HashMap::new();
        for frame in self.frames.iter().skip(1).filter(|f| !f.reconstructed) {
            *counts.entry(Arc::clone(&frame.name)).or_default() += 1;
        }
        let mut hot: Vec<_> = counts.into_iter().collect();
        hot.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        hot.truncate(limit);
        hot
    }
}
