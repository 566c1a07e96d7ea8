// SPDX-License-Identifier: MIT OR Apache-2.0

//! The process-wide sink registry and configuration surface.
//!
//! The registry owns every registered sink, the console settings, and the
//! installed fatal handler. All mutations happen under the shared
//! re-entrant lock and recompute the maximum sink threshold before the
//! lock is released, so the derived verbosity cutoff (the most permissive
//! threshold across the console and all sinks) is always consistent with
//! the current sink set. The cutoff itself is read from atomics without
//! taking the lock; it is the fast path that lets [`log!`](crate::log!)
//! return before formatting anything.
//!
//! Sink identifiers are unique at all times: registering a duplicate is a
//! check failure (fatal), removing an unknown identifier is an ERROR log
//! plus a `false` return.

use crate::error::Error;
use crate::file_sink::{FileMode, FileSink};
use crate::message::Message;
use crate::remutex::{ReentrantMutex, ReentrantMutexGuard};
use crate::sink::Sink;
use crate::verbosity::Verbosity;
use std::cell::{Cell, RefCell};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicI8, AtomicU16, AtomicU64, Ordering};

/// Installed with [`set_fatal_handler`]; may divert control flow by
/// panicking, in which case the process is not aborted.
pub type FatalHandler = Box<dyn Fn(&Message<'_>) + Send + Sync>;

pub(crate) struct SinkEntry {
    pub id: String,
    pub sink: Box<dyn Sink>,
    pub verbosity: Verbosity,
    /// Scope indentation depth for this sink. Mutated by active scopes
    /// whose severity passes the sink's threshold.
    pub indentation: Cell<u64>,
}

pub(crate) struct RegistryInner {
    pub sinks: RefCell<Vec<SinkEntry>>,
    pub stderr_indentation: Cell<u64>,
    pub fatal_handler: RefCell<Option<FatalHandler>>,
}

// One lock shared by the registry, the dispatch engine, and the crash
// handler. Re-entrant so a sink callback may itself log.
static REGISTRY: ReentrantMutex<RegistryInner> = ReentrantMutex::new(RegistryInner {
    sinks: RefCell::new(Vec::new()),
    stderr_indentation: Cell::new(0),
    fatal_handler: RefCell::new(None),
});

static STDERR_VERBOSITY: AtomicI8 = AtomicI8::new(Verbosity::INFO.0);
static MAX_SINK_VERBOSITY: AtomicI8 = AtomicI8::new(Verbosity::OFF.0);
static COLORLOG: AtomicBool = AtomicBool::new(true);
static FLUSH_INTERVAL_MS: AtomicU64 = AtomicU64::new(0);
// Bitmask of individually disabled message severities, bit 0 = FATAL.
static SEVERITY_DISABLED: AtomicU16 = AtomicU16::new(0);

pub(crate) fn lock() -> ReentrantMutexGuard<'static, RegistryInner> {
    REGISTRY.lock()
}

/// The most permissive threshold across the console and all registered
/// sinks. No message is rendered if its severity exceeds this cutoff.
pub fn current_verbosity_cutoff() -> Verbosity {
    let stderr = STDERR_VERBOSITY.load(Ordering::Relaxed);
    let sinks = MAX_SINK_VERBOSITY.load(Ordering::Relaxed);
    Verbosity(stderr.max(sinks))
}

/// Whether a message at `verbosity` would be delivered anywhere at all:
/// the severity is not individually disabled and at least one destination's
/// threshold accepts it. This is the check the logging macros perform
/// before evaluating their format arguments.
#[inline]
pub fn enabled(verbosity: Verbosity) -> bool {
    severity_enabled(verbosity) && verbosity <= current_verbosity_cutoff()
}

fn severity_bit(verbosity: Verbosity) -> Option<u16> {
    if verbosity.is_message_severity() {
        Some(1u16 << (verbosity.0 - Verbosity::FATAL.0) as u32)
    } else {
        None
    }
}

/// Enables or disables one message severity outright. A disabled severity
/// produces no output anywhere, console or sinks, regardless of any
/// threshold; such messages are dropped before their format arguments are
/// evaluated. Every severity starts enabled. Check failures and
/// [`abort!`](crate::abort!) are exempt from the toggle.
///
/// Thresholds other than message severities (e.g. `OFF`) are ignored.
pub fn set_severity_enabled(verbosity: Verbosity, enabled: bool) {
    let Some(bit) = severity_bit(verbosity) else {
        return;
    };
    if enabled {
        SEVERITY_DISABLED.fetch_and(!bit, Ordering::Relaxed);
    } else {
        SEVERITY_DISABLED.fetch_or(bit, Ordering::Relaxed);
    }
}

/// Whether `verbosity` is currently enabled as a message severity.
pub fn severity_enabled(verbosity: Verbosity) -> bool {
    match severity_bit(verbosity) {
        Some(bit) => SEVERITY_DISABLED.load(Ordering::Relaxed) & bit == 0,
        None => false,
    }
}

/// Must be called with the lock held, after any change to the sink set.
fn recompute_max_sink_verbosity(inner: &RegistryInner) {
    let max = inner
        .sinks
        .borrow()
        .iter()
        .map(|entry| entry.verbosity)
        .max()
        .unwrap_or(Verbosity::OFF);
    MAX_SINK_VERBOSITY.store(max.0, Ordering::Relaxed);
}

/// Registers a named sink with a verbosity threshold.
///
/// The registry takes ownership; to keep a handle to the sink, register an
/// `Arc` of it. Registering an identifier that already exists is a check
/// failure and routes through the fatal path.
pub fn add_sink(id: impl Into<String>, sink: Box<dyn Sink>, verbosity: Verbosity) {
    let id = id.into();
    let inner = lock();
    let duplicate = inner.sinks.borrow().iter().any(|entry| entry.id == id);
    if duplicate {
        crate::dispatch::check_failed(
            file!(),
            line!(),
            "sink identifiers are unique",
            format_args!("a sink with id '{}' is already registered", id),
        );
        return; // reached only when a fatal handler diverted and returned
    }
    inner.sinks.borrow_mut().push(SinkEntry {
        id,
        sink,
        verbosity,
        indentation: Cell::new(0),
    });
    recompute_max_sink_verbosity(&inner);
}

/// Registers a [`FileSink`] under the path string as its identifier and
/// logs one INFO line announcing the destination.
///
/// An unopenable path is a recoverable configuration error: it is logged
/// at ERROR severity and returned to the caller.
pub fn add_file(path: impl AsRef<Path>, mode: FileMode, verbosity: Verbosity) -> Result<(), Error> {
    let path = path.as_ref();
    let sink = match FileSink::new(path, mode) {
        Ok(sink) => sink,
        Err(error) => {
            crate::log!(ERROR, "{}", error);
            return Err(error);
        }
    };
    let id = path.display().to_string();
    add_sink(id, Box::new(sink), verbosity);
    crate::log!(
        INFO,
        "Logging to '{}', mode: {:?}, verbosity: {}",
        path.display(),
        mode,
        verbosity
    );
    Ok(())
}

/// Removes a sink by identifier, invoking its close hook first. Returns
/// whether the identifier was found; a missing identifier is reported as
/// an ERROR log line and has no other side effects.
pub fn remove_sink(id: &str) -> bool {
    let inner = lock();
    let index = inner
        .sinks
        .borrow()
        .iter()
        .position(|entry| entry.id == id);
    let Some(index) = index else {
        drop(inner);
        crate::log!(ERROR, "Failed to locate sink with id '{}'", id);
        return false;
    };
    // Close before removal; the shared borrow allows the hook to log.
    inner.sinks.borrow()[index].sink.close();
    inner.sinks.borrow_mut().remove(index);
    recompute_max_sink_verbosity(&inner);
    true
}

/// Closes and removes every registered sink. Idempotent; calling it on an
/// empty registry is a no-op. Used at shutdown.
pub fn remove_all_sinks() {
    let inner = lock();
    for entry in inner.sinks.borrow().iter() {
        entry.sink.close();
    }
    inner.sinks.borrow_mut().clear();
    recompute_max_sink_verbosity(&inner);
}

/// Flushes everything, then closes and removes every sink. An ordered
/// teardown call for the end of the process; nothing here relies on static
/// destruction order.
pub fn shutdown() {
    crate::dispatch::flush();
    remove_all_sinks();
}

/// Sets the console (stderr) verbosity threshold. `Verbosity::OFF`
/// silences the console entirely. Takes effect on the next logging call.
pub fn set_stderr_verbosity(verbosity: Verbosity) {
    STDERR_VERBOSITY.store(verbosity.0, Ordering::Relaxed);
}

pub fn stderr_verbosity() -> Verbosity {
    Verbosity(STDERR_VERBOSITY.load(Ordering::Relaxed))
}

/// Whether console output is colorized when stderr is a terminal.
pub fn set_colorlog(enabled: bool) {
    COLORLOG.store(enabled, Ordering::Relaxed);
}

pub(crate) fn colorlog() -> bool {
    COLORLOG.load(Ordering::Relaxed)
}

/// Sets the flush interval. `0` means unbuffered: every delivery flushes
/// the console and each written sink synchronously. A non-zero interval
/// lazily starts one background thread that flushes dirty destinations on
/// that cadence; the thread runs for the life of the process and re-reads
/// the interval every cycle, so later changes take effect on the next
/// cycle.
pub fn set_flush_interval_ms(interval_ms: u64) {
    FLUSH_INTERVAL_MS.store(interval_ms, Ordering::Relaxed);
}

pub(crate) fn flush_interval_ms() -> u64 {
    FLUSH_INTERVAL_MS.load(Ordering::Relaxed)
}

/// Installs the handler invoked once per terminal event, after reporting
/// and the first flush, before the process aborts. The handler may divert
/// control flow by panicking; the panic propagates out of the logging call
/// and the abort is skipped.
pub fn set_fatal_handler(handler: impl Fn(&Message<'_>) + Send + Sync + 'static) {
    let inner = lock();
    *inner.fatal_handler.borrow_mut() = Some(Box::new(handler));
}

pub fn clear_fatal_handler() {
    let inner = lock();
    *inner.fatal_handler.borrow_mut() = None;
}
