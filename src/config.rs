//! Model configuration.

use serde::{Deserialize, Serialize};

use crate::graph::errors::DEFAULT_STACK_SIZE;
use crate::Result;

/// Tunables of one [`Model`](crate::Model).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Depth of the error stack; older entries are dropped.
    pub error_stack_depth: usize,
    /// Longest alias chain followed by `get_value` before giving up.
    pub max_proxy_depth: usize,
    /// Traversal order of `Model::query`. Connectors always go width-first.
    pub width_first_queries: bool,
    /// Mirror logged errors to `tracing`.
    pub echo_errors: bool,
    /// Whether `run` calls emulators.
    pub emulate_on_run: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            error_stack_depth: DEFAULT_STACK_SIZE,
            max_proxy_depth: 16,
            width_first_queries: false,
            echo_errors: true,
            emulate_on_run: true,
        }
    }
}

impl ModelConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn with_error_stack_depth(mut self, depth: usize) -> Self {
        self.error_stack_depth = depth;
        self
    }

    pub fn with_width_first_queries(mut self, width_first: bool) -> Self {
        self.width_first_queries = width_first;
        self
    }

    pub fn with_echo_errors(mut self, echo: bool) -> Self {
        self.echo_errors = echo;
        self
    }
}
