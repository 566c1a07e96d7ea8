// SPDX-License-Identifier: MIT OR Apache-2.0

//! The destination trait implemented by everything log messages fan out to.

use crate::message::Message;
use std::fmt::Debug;
use std::sync::Arc;

/// A registered destination for log messages beyond the console.
///
/// Implementations are owned by the registry as `Box<dyn Sink>` and are
/// invoked synchronously, under the shared dispatch lock, for every message
/// whose severity passes the sink's threshold. A slow or blocking `write`
/// therefore stalls every other logging thread for its duration; sinks must
/// be cheap or defer expensive work internally.
///
/// A sink may log from inside its own `write` (the dispatch lock is
/// re-entrant), but it must not add or remove sinks from there.
///
/// Failures inside a sink are the sink's own responsibility; the core does
/// not observe or report them.
pub trait Sink: Debug + Send + Sync {
    /// Deliver one message. The [`Message`] view is only valid for the
    /// duration of this call; copy what you keep.
    fn write(&self, message: &Message<'_>);

    /// Flush buffered output. Called on every delivery in unbuffered mode,
    /// from the background flush thread otherwise, and always during the
    /// fatal path.
    fn flush(&self) {}

    /// Called exactly once, synchronously, when the sink is removed from
    /// the registry (including registry teardown).
    fn close(&self) {}
}

/// Sharing a sink between the registry and the caller (for example to read
/// back a [`MemorySink`](crate::MemorySink) in tests) works by registering
/// an `Arc` of it.
impl<S: Sink> Sink for Arc<S> {
    fn write(&self, message: &Message<'_>) {
        (**self).write(message)
    }

    fn flush(&self) {
        (**self).flush()
    }

    fn close(&self) {
        (**self).close()
    }
}
