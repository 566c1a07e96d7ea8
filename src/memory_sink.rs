// SPDX-License-Identifier: MIT OR Apache-2.0

//! An in-memory collecting sink.
//!
//! `MemorySink` captures each delivered message as an owned line rather
//! than writing it anywhere, which makes it the workhorse for unit tests
//! and for embedding environments where stderr is redirected or
//! unavailable. Register it through an [`Arc`](std::sync::Arc) to keep a
//! handle for reading the captured lines back:
//!
//! ```
//! use logfan::{MemorySink, Verbosity};
//! use std::sync::Arc;
//!
//! let sink = Arc::new(MemorySink::new());
//! logfan::add_sink("capture", Box::new(sink.clone()), Verbosity::MAX);
//! logfan::log!(INFO, "hello");
//! assert!(sink.drain().contains("hello"));
//! logfan::remove_sink("capture");
//! ```

use crate::message::Message;
use crate::sink::Sink;
use std::sync::Mutex;

/// A sink that stores every delivered line in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self {
            lines: Mutex::new(Vec::new()),
        }
    }

    /// Number of lines captured so far.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Returns a copy of the captured lines without clearing them.
    pub fn lines(&self) -> Vec<String> {
        self.lock().clone()
    }

    /// Joins all captured lines with newlines and clears the buffer.
    pub fn drain(&self) -> String {
        let mut lines = self.lock();
        let joined = lines.join("\n");
        lines.clear();
        joined
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<String>> {
        match self.lines.lock() {
            Ok(lines) => lines,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Sink for MemorySink {
    fn write(&self, message: &Message<'_>) {
        // The view does not outlive the dispatch call; copy it.
        self.lock().push(message.to_line());
    }

    // Nothing buffered outside the Vec, so flush and close are no-ops.
}
