//! Configuration for the weaver.

/// Default maximum traversal depth.
pub const DEFAULT_MAX_DEPTH: usize = 100;

/// Default bound on reconstructed ancestors per call.
pub const DEFAULT_ANCESTOR_LIMIT: usize = 50;

/// Configuration for a [`Weaver`](crate::Weaver).
#[derive(Clone, Debug)]
pub struct WeaverConfig {
    /// Blacklist pattern sources.
    pub blacklist: Vec<String>,
    /// Maximum traversal depth for weave passes.
    pub max_depth: usize,
    /// Maximum number of un-instrumented ancestors collected per call.
    pub ancestor_limit: usize,
    /// Traversal depth used when weaving values returned by instrumented calls.
    pub result_weave_depth: usize,
}

impl Default for WeaverConfig {
    fn default() -> Self {
        Self {
            blacklist: Vec::new(),
            max_depth: DEFAULT_MAX_DEPTH,
            ancestor_limit: DEFAULT_ANCESTOR_LIMIT,
            result_weave_depth: 1,
        }
    }
}

impl WeaverConfig {
    /// Creates a default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to add a blacklist pattern.
    #[must_use]
    pub fn with_blacklist_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.blacklist.push(pattern.into());
        self
    }

    /// Builder method to set the traversal depth.
    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Builder method to set the ancestor limit.
    #[must_use]
    pub fn with_ancestor_limit(mut self, limit: usize) -> Self {
        self.ancestor_limit = limit;
        self
    }

    /// Builder method to set the depth used for weaving returned values.
    /// Zero disables result weaving.
    #[must_use]
    pub fn with_result_weave_depth(mut self, depth: usize) -> Self {
        self.result_weave_depth = depth;
        self
    }
}
