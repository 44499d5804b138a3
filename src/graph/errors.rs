//! Bounded error stack owned by a model.
//!
//! Engine components never propagate failures to the caller of
//! `configure()`; they log here and carry on with partial results.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::catalog::CatalogueCode;

pub const DEFAULT_STACK_SIZE: usize = 10;

/// One logged error: a stable code and a `Class.method.text` message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub code: CatalogueCode,
    pub message: String,
}

impl ErrorMessage {
    pub fn status_report(&self) -> String {
        format!("E{:x}:{}", self.code.0, self.message)
    }
}

#[derive(Debug, Clone)]
pub struct ErrorContext {
    stack: VecDeque<ErrorMessage>,
    capacity: usize,
    /// Entries pushed out by newer ones.
    dropped: usize,
    pub exit_code: i32,
    echo: bool,
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new(DEFAULT_STACK_SIZE)
    }
}

impl ErrorContext {
    /// A zero capacity falls back to [`DEFAULT_STACK_SIZE`].
    pub fn new(capacity: usize) -> Self {
        let capacity = if capacity == 0 { DEFAULT_STACK_SIZE } else { capacity };
        Self {
            stack: VecDeque::with_capacity(capacity),
            capacity,
            dropped: 0,
            exit_code: 0,
            echo: true,
        }
    }

    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    /// Record an error; the oldest entry goes when the stack is full.
    pub fn log(&mut self, code: CatalogueCode, class: &str, method: &str, text: &str) -> CatalogueCode {
        let entry = ErrorMessage { code, message: format!("{class}.{method}.{text}") };
        if self.echo {
            tracing::warn!(code = %code, "{}", entry.message);
        }
        if self.stack.len() == self.capacity {
            self.stack.pop_front();
            self.dropped += 1;
        }
        self.stack.push_back(entry);
        code
    }

    pub fn count(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn entries(&self) -> impl Iterator<Item = &ErrorMessage> {
        self.stack.iter()
    }

    /// The most recent entry carrying `code`.
    pub fn code_to_message(&self, code: CatalogueCode) -> Option<&ErrorMessage> {
        self.stack.iter().rev().find(|e| e.code == code)
    }

    pub fn clear(&mut self) {
        self.stack.clear();
        self.dropped = 0;
    }

    pub fn status_report(&self) -> String {
        let mut out = String::from("ErrorStack:{");
        for entry in &self.stack {
            out.push('\n');
            out.push_str(&entry.status_report());
        }
        out.push_str(&format!("}},\nExitCode={}.", self.exit_code));
        out
    }
}
