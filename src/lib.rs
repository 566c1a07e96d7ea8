// SPDX-License-Identifier: MIT OR Apache-2.0
/*!
# logfan

logfan is an in-process logging core: severity-tagged text messages from
any thread fan out to the console plus an arbitrary set of registered
sinks, each with its own verbosity threshold.

# The shape of it

* A signed [`Verbosity`] scale: `FATAL < ERROR < WARNING < INFO = 0`, then
  user levels `1..=9`. A message reaches a destination iff its severity is
  at or below that destination's threshold, and nothing is ever rendered
  when no destination would accept it.
* A process-wide sink registry ([`add_sink`], [`add_file`],
  [`remove_sink`], [`remove_all_sinks`]) guarded by one re-entrant lock
  shared with dispatch, so a sink may log from inside its own callback.
* Scoped logging ([`log_scope!`]) that prints paired open/close lines with
  elapsed time and indents everything in between, per destination.
* A thread-local error-context stack ([`error_context!`]) that costs a few
  pointer writes to maintain and is rendered only when something goes
  wrong.
* A fatal path (FATAL logs, failed [`check!`] assertions, and caught
  crash signals) that reports a stack trace and the error context, flushes
  every sink, consults an optional user fatal handler, and terminates.

# Example

```
use logfan::{MemorySink, Verbosity};
use std::sync::Arc;

let sink = Arc::new(MemorySink::new());
logfan::add_sink("capture", Box::new(sink.clone()), Verbosity::MAX);

logfan::log!(INFO, "hello from {}", "logfan");
{
    logfan::log_scope!(INFO, "doing work");
    logfan::error_context!("Working on item", 7);
    logfan::log!(WARNING, "this line is indented");
}

assert!(sink.drain().contains("this line is indented"));
logfan::remove_sink("capture");
```

# Delivery contract

Delivery is synchronous, in-process, and best-effort: a slow sink stalls
every logging thread for the duration of its callback, and failures inside
a sink are the sink's own business. There is no buffering-with-replay and
no cross-process transport. By default every delivery is flushed
immediately; [`set_flush_interval_ms`] trades that for a background
flusher.
*/

mod dispatch;
mod error;
pub mod error_context;
mod file_sink;
mod macros;
mod memory_sink;
mod message;
mod registry;
mod remutex;
mod scope;
mod sink;
mod verbosity;

#[cfg(unix)]
mod crash;

pub use error::Error;
pub use error_context::{EcHandle, get_error_context, get_error_context_for, get_thread_ec_handle};
pub use file_sink::{FileMode, FileSink};
pub use memory_sink::MemorySink;
pub use message::Message;
pub use registry::{
    FatalHandler, add_file, add_sink, clear_fatal_handler, current_verbosity_cutoff, enabled,
    remove_all_sinks, remove_sink, set_colorlog, set_fatal_handler, set_flush_interval_ms,
    set_severity_enabled, set_stderr_verbosity, severity_enabled, shutdown, stderr_verbosity,
};
pub use scope::ScopeGuard;
pub use sink::Sink;
pub use verbosity::Verbosity;

pub use dispatch::{flush, set_thread_name};

#[cfg(unix)]
pub use crash::{SignalOptions, install_signal_handlers};

#[doc(hidden)]
pub mod hidden {
    pub use crate::dispatch::{abort, check_failed, check_failed_binary, log, raw_log};
    pub use crate::error_context::EcEntry;
}
