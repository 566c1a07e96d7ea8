// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rendering and fan-out.
//!
//! The dispatch engine turns a logging call into rendered text (preamble,
//! indentation, prefix, body), writes it to the console when the console
//! threshold accepts it, and invokes every accepting sink with a
//! [`Message`] built for that sink's own indentation depth. FATAL messages
//! additionally emit a stack trace and the calling thread's error-context
//! block, flush everything, invoke the installed fatal handler, and abort
//! the process.
//!
//! Nothing here is reached for a message whose severity exceeds the global
//! cutoff; the macros check [`enabled`](crate::enabled) before evaluating
//! their format arguments, which is the crate's primary performance
//! guarantee.

use crate::message::Message;
use crate::registry;
use crate::verbosity::Verbosity;
use std::cell::RefCell;
use std::fmt;
use std::io::Write;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

const THREAD_NAME_WIDTH: usize = 16;
const FILE_WIDTH: usize = 23;
/// One scope level of indentation, four columns wide.
const INDENTATION_UNIT: &str = ".   ";

const ANSI_RESET: &str = "\x1b[0m";
const ANSI_BOLD: &str = "\x1b[1m";
const ANSI_DIM: &str = "\x1b[2m";
const ANSI_RED: &str = "\x1b[31m";
const ANSI_LIGHT_RED: &str = "\x1b[91m";
const ANSI_LIGHT_GRAY: &str = "\x1b[37m";

static START_INSTANT: OnceLock<Instant> = OnceLock::new();

/// Uptime is measured from the first logging call in the process.
fn start_instant() -> Instant {
    *START_INSTANT.get_or_init(Instant::now)
}

static NEEDS_FLUSHING: AtomicBool = AtomicBool::new(false);
static FLUSH_THREAD_STARTED: AtomicBool = AtomicBool::new(false);

thread_local! {
    static THREAD_NAME: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Overrides the name printed in the preamble for the calling thread.
/// Without an override the std thread name is used, falling back to a
/// numeric thread id.
pub fn set_thread_name(name: &str) {
    THREAD_NAME.with(|slot| *slot.borrow_mut() = Some(name.to_string()));
}

fn current_thread_name() -> String {
    let override_name = THREAD_NAME.with(|slot| slot.borrow().clone());
    if let Some(name) = override_name {
        return name;
    }
    match std::thread::current().name() {
        Some(name) => name.to_string(),
        None => format!("thread {}", crate::remutex::current_thread_id()),
    }
}

/// Basename of a source path, for the fixed-width preamble column.
pub(crate) fn filename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

fn indentation(depth: u64) -> String {
    INDENTATION_UNIT.repeat(depth.min(100) as usize)
}

pub(crate) fn print_preamble(verbosity: Verbosity, file: &str, line: u32) -> String {
    let now = chrono::Local::now();
    let uptime = start_instant().elapsed().as_secs_f64();
    let mut thread_name = current_thread_name();
    thread_name.truncate(THREAD_NAME_WIDTH);
    format!(
        "{} ({:8.3}s) [{:<thread_width$}]{:>file_width$}:{:<5} {:>3}| ",
        now.format("%Y-%m-%d %H:%M:%S%.3f"),
        uptime,
        thread_name,
        filename(file),
        line,
        verbosity.glyph(),
        thread_width = THREAD_NAME_WIDTH,
        file_width = FILE_WIDTH,
    )
}

/// The ordinary logging entry point behind [`log!`](crate::log!). Returns
/// without rendering when the severity misses the cutoff.
pub fn log(verbosity: Verbosity, file: &str, line: u32, args: fmt::Arguments<'_>) {
    debug_assert!(
        verbosity.is_message_severity(),
        "OFF is a threshold, not a message severity"
    );
    if !registry::enabled(verbosity) {
        return;
    }
    let text = fmt::format(args);
    log_to_everywhere(verbosity, file, line, "", &text);
}

/// Logs without preamble or indentation, for exact text control or
/// maximal throughput. Severity filtering still applies.
pub fn raw_log(verbosity: Verbosity, file: &str, line: u32, args: fmt::Arguments<'_>) {
    if !registry::enabled(verbosity) {
        return;
    }
    let text = fmt::format(args);
    let message = Message {
        verbosity,
        file,
        line,
        preamble: "",
        indentation: "",
        prefix: "",
        text: &text,
    };
    log_message(&message, false, true);
}

/// Explicit abort request behind [`abort!`](crate::abort!). Always renders
/// and routes through the fatal path, regardless of the cutoff or any
/// per-severity toggle.
pub fn abort(file: &str, line: u32, args: fmt::Arguments<'_>) {
    log_to_everywhere(Verbosity::FATAL, file, line, "", &fmt::format(args));
}

/// Failed `check!` assertion. Always renders and routes through the fatal
/// path, regardless of the cutoff.
pub fn check_failed(file: &str, line: u32, expr_text: &str, args: fmt::Arguments<'_>) {
    let prefix = format!("CHECK FAILED:  {}  ", expr_text);
    log_to_everywhere(Verbosity::FATAL, file, line, &prefix, &fmt::format(args));
}

/// Failed binary `check_*!` assertion; shows both operands' source text
/// (in `expr_text`) and their evaluated values.
pub fn check_failed_binary(
    file: &str,
    line: u32,
    expr_text: &str,
    lhs: &dyn fmt::Debug,
    rhs: &dyn fmt::Debug,
    args: fmt::Arguments<'_>,
) {
    let prefix = format!("CHECK FAILED:  {}  ", expr_text);
    let text = format!("({:?} vs {:?})  {}", lhs, rhs, fmt::format(args));
    log_to_everywhere(Verbosity::FATAL, file, line, &prefix, &text);
}

pub(crate) fn log_to_everywhere(
    verbosity: Verbosity,
    file: &str,
    line: u32,
    prefix: &str,
    text: &str,
) {
    let preamble = print_preamble(verbosity, file, line);
    let message = Message {
        verbosity,
        file,
        line,
        preamble: &preamble,
        indentation: "",
        prefix,
        text,
    };
    log_message(&message, true, true);
}

/// Single delivery point for every rendered message. Holds the shared
/// lock across the console write and all sink callbacks; re-entrant, so a
/// callback may log again. `abort_if_fatal` is cleared only by the signal
/// path, which must not recursively abort itself.
pub(crate) fn log_message(message: &Message<'_>, with_indentation: bool, abort_if_fatal: bool) {
    let inner = registry::lock();
    let verbosity = message.verbosity;

    if verbosity <= Verbosity::FATAL {
        let trace = std::backtrace::Backtrace::force_capture();
        raw_log(
            Verbosity::ERROR,
            message.file,
            message.line,
            format_args!("Stack trace:\n{}", trace),
        );
        let error_context = crate::error_context::get_error_context();
        if !error_context.is_empty() {
            raw_log(
                Verbosity::ERROR,
                message.file,
                message.line,
                format_args!("{}", error_context),
            );
        }
    }

    let unbuffered = registry::flush_interval_ms() == 0;

    if verbosity <= registry::stderr_verbosity() {
        let indent = if with_indentation {
            indentation(inner.stderr_indentation.get())
        } else {
            String::new()
        };
        let view = Message {
            indentation: &indent,
            ..*message
        };
        write_to_stderr(&view);
        if unbuffered {
            let _ = std::io::stderr().flush();
        } else {
            NEEDS_FLUSHING.store(true, Ordering::Relaxed);
        }
    }

    {
        let sinks = inner.sinks.borrow();
        for entry in sinks.iter() {
            if verbosity <= entry.verbosity {
                let indent = if with_indentation {
                    indentation(entry.indentation.get())
                } else {
                    String::new()
                };
                let view = Message {
                    indentation: &indent,
                    ..*message
                };
                entry.sink.write(&view);
                if unbuffered {
                    entry.sink.flush();
                } else {
                    NEEDS_FLUSHING.store(true, Ordering::Relaxed);
                }
            }
        }
    }

    maybe_start_flush_thread();

    if verbosity <= Verbosity::FATAL {
        flush();
        let had_handler = {
            let handler = inner.fatal_handler.borrow();
            if let Some(handler) = handler.as_ref() {
                // May divert by panicking; then neither the second flush
                // nor the abort happens and the panic propagates out of
                // the logging call.
                handler(message);
                true
            } else {
                false
            }
        };
        if had_handler {
            flush();
        }
        if abort_if_fatal {
            std::process::abort();
        }
    }
}

fn write_to_stderr(message: &Message<'_>) {
    let colorize = registry::colorlog() && stderr_has_color();
    let mut stderr = std::io::stderr().lock();
    if !colorize {
        let _ = writeln!(stderr, "{}", message);
        return;
    }
    if message.verbosity > Verbosity::WARNING {
        // INFO and verbose levels: dim preamble, plain-to-bold body.
        let body_style = if message.verbosity == Verbosity::INFO {
            ANSI_BOLD
        } else {
            ANSI_LIGHT_GRAY
        };
        let _ = writeln!(
            stderr,
            "{}{}{}{}{}{}{}{}{}",
            ANSI_RESET,
            ANSI_DIM,
            message.preamble,
            message.indentation,
            ANSI_RESET,
            body_style,
            message.prefix,
            message.text,
            ANSI_RESET,
        );
    } else {
        let color = if message.verbosity == Verbosity::WARNING {
            ANSI_RED
        } else {
            ANSI_LIGHT_RED
        };
        let _ = writeln!(
            stderr,
            "{}{}{}{}{}{}{}{}",
            ANSI_RESET,
            ANSI_BOLD,
            color,
            message.preamble,
            message.indentation,
            message.prefix,
            message.text,
            ANSI_RESET,
        );
    }
}

fn stderr_has_color() -> bool {
    static HAS_COLOR: OnceLock<bool> = OnceLock::new();
    *HAS_COLOR.get_or_init(|| {
        use is_terminal::IsTerminal;
        std::io::stderr().is_terminal()
    })
}

/// Flushes the console and every registered sink, clearing the
/// needs-flush flag. Safe from any thread, including one already inside a
/// logging call.
pub fn flush() {
    let inner = registry::lock();
    let _ = std::io::stderr().flush();
    for entry in inner.sinks.borrow().iter() {
        entry.sink.flush();
    }
    NEEDS_FLUSHING.store(false, Ordering::Relaxed);
}

/// Lazily starts the background flush thread the first time buffered
/// flushing (non-zero interval) is in effect during a delivery. The
/// thread runs for the life of the process and re-reads the interval each
/// cycle; if the interval is later set back to 0 it idles at a floor
/// cadence while synchronous flushing resumes on the delivery path.
fn maybe_start_flush_thread() {
    if registry::flush_interval_ms() == 0 {
        return;
    }
    if FLUSH_THREAD_STARTED.swap(true, Ordering::Relaxed) {
        return;
    }
    let spawned = std::thread::Builder::new()
        .name("logfan-flush".to_string())
        .spawn(|| {
            loop {
                if NEEDS_FLUSHING.load(Ordering::Relaxed) {
                    flush();
                }
                let interval_ms = registry::flush_interval_ms().clamp(1, 10_000);
                std::thread::sleep(Duration::from_millis(interval_ms));
            }
        });
    if spawned.is_err() {
        FLUSH_THREAD_STARTED.store(false, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_strips_directories() {
        assert_eq!(filename("src/lib.rs"), "lib.rs");
        assert_eq!(filename("/a/b/c.rs"), "c.rs");
        assert_eq!(filename(r"a\b\c.rs"), "c.rs");
        assert_eq!(filename("plain.rs"), "plain.rs");
    }

    #[test]
    fn indentation_repeats_unit() {
        assert_eq!(indentation(0), "");
        assert_eq!(indentation(2), ".   .   ");
    }

    #[test]
    fn preamble_layout() {
        let preamble = print_preamble(Verbosity::WARNING, "src/dispatch.rs", 42);
        assert!(preamble.contains("dispatch.rs:42"));
        assert!(preamble.ends_with("  W| "));
        // date + milliseconds up front
        assert_eq!(&preamble[4..5], "-");
        assert!(preamble.contains('.'));
    }
}
