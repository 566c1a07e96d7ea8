// SPDX-License-Identifier: MIT OR Apache-2.0

//! The user-facing macro surface.
//!
//! Every macro checks the global verbosity cutoff before evaluating its
//! format arguments, so a filtered-out call costs one atomic load and a
//! comparison and nothing else.

/// Logs at a named level: `log!(INFO, "loaded {} items", count)`.
///
/// The first argument is one of the [`Verbosity`](crate::Verbosity)
/// associated constants (`FATAL`, `ERROR`, `WARNING`, `INFO`). For
/// numeric user levels use [`vlog!`](crate::vlog!).
///
/// A `FATAL` log renders a stack trace and the calling thread's error
/// context, flushes every destination, invokes the installed fatal
/// handler, and aborts the process.
///
/// ```
/// logfan::log!(INFO, "starting up with {} workers", 4);
/// ```
#[macro_export]
macro_rules! log {
    ($level:ident, $($arg:tt)+) => {
        $crate::vlog!($crate::Verbosity::$level, $($arg)+)
    };
}

/// Logs at an arbitrary [`Verbosity`](crate::Verbosity) expression:
/// `vlog!(Verbosity(2), "details: {}", details)`.
#[macro_export]
macro_rules! vlog {
    ($verbosity:expr, $($arg:tt)+) => {{
        let __logfan_verbosity = $verbosity;
        if $crate::enabled(__logfan_verbosity) {
            $crate::hidden::log(__logfan_verbosity, file!(), line!(), format_args!($($arg)+));
        }
    }};
}

/// Logs only when `cond` holds; neither the condition's consequences nor
/// the format arguments are evaluated otherwise.
///
/// ```
/// let failures = 0;
/// logfan::log_if!(WARNING, failures > 0, "{} failures", failures);
/// ```
#[macro_export]
macro_rules! log_if {
    ($level:ident, $cond:expr, $($arg:tt)+) => {
        if $cond {
            $crate::log!($level, $($arg)+);
        }
    };
}

/// Logs without preamble or indentation, for exact text control.
///
/// ```
/// logfan::raw_log!(INFO, "bare line, no preamble");
/// ```
#[macro_export]
macro_rules! raw_log {
    ($level:ident, $($arg:tt)+) => {
        $crate::vraw_log!($crate::Verbosity::$level, $($arg)+)
    };
}

/// [`raw_log!`](crate::raw_log!) with an arbitrary
/// [`Verbosity`](crate::Verbosity) expression.
#[macro_export]
macro_rules! vraw_log {
    ($verbosity:expr, $($arg:tt)+) => {{
        let __logfan_verbosity = $verbosity;
        if $crate::enabled(__logfan_verbosity) {
            $crate::hidden::raw_log(__logfan_verbosity, file!(), line!(), format_args!($($arg)+));
        }
    }};
}

/// Renders a FATAL message and terminates the process, regardless of any
/// verbosity threshold or per-severity toggle.
///
/// Unlike `log!(FATAL, ...)`, which is filtered like any other message,
/// this always runs the full fatal sequence: stack trace and error
/// context, flush, the installed fatal handler (which may divert by
/// panicking), flush, abort. Prefer it when termination must not depend on
/// the logging configuration.
///
/// ```no_run
/// logfan::abort!("unrecoverable: {} is gone", "/var/data");
/// ```
#[macro_export]
macro_rules! abort {
    ($($arg:tt)+) => {
        $crate::hidden::abort(file!(), line!(), format_args!($($arg)+))
    };
}

/// Enters a named logical scope that ends with the enclosing block.
///
/// Logs an opening line now and a closing line with the elapsed seconds
/// when the block ends, indenting everything logged in between for each
/// destination that accepted the scope's severity. Expands to a hygienic
/// `let` binding, so it is a statement:
///
/// ```
/// fn rebuild_index(shard: u32) {
///     logfan::log_scope!(INFO, "rebuilding index shard {}", shard);
///     // ... indented work ...
/// }
/// # rebuild_index(3);
/// ```
#[macro_export]
macro_rules! log_scope {
    ($level:ident, $($arg:tt)+) => {
        $crate::vlog_scope!($crate::Verbosity::$level, $($arg)+)
    };
}

/// [`log_scope!`](crate::log_scope!) with an arbitrary
/// [`Verbosity`](crate::Verbosity) expression.
#[macro_export]
macro_rules! vlog_scope {
    ($verbosity:expr, $($arg:tt)+) => {
        let __logfan_scope = $crate::ScopeGuard::new(
            $verbosity,
            file!(),
            line!(),
            format_args!($($arg)+),
        );
    };
}

/// Pushes a "what was I doing" entry onto the calling thread's
/// error-context stack for the rest of the enclosing block.
///
/// The value is captured by move together with a rendering function for
/// its type; it is only formatted if the context is actually rendered
/// (on FATAL, or via [`get_error_context`](crate::get_error_context)).
///
/// ```
/// fn parse(path: &str) {
///     logfan::error_context!("Parsing file", path.to_string());
///     // ... a crash in here reports the file being parsed ...
/// }
/// # parse("demo.conf");
/// ```
#[macro_export]
macro_rules! error_context {
    ($descr:expr, $value:expr) => {
        let __logfan_ec_entry = $crate::hidden::EcEntry::new(file!(), line!(), $descr, $value);
        let __logfan_ec_guard = __logfan_ec_entry.push();
    };
}

/// Fatal assertion: routes through the FATAL path when the condition is
/// false, regardless of any verbosity threshold.
///
/// ```
/// let connected = true;
/// logfan::check!(connected, "must be connected before sending");
/// ```
#[macro_export]
macro_rules! check {
    ($cond:expr $(,)?) => {
        $crate::check!($cond, "")
    };
    ($cond:expr, $($arg:tt)+) => {
        if !($cond) {
            $crate::hidden::check_failed(
                file!(),
                line!(),
                stringify!($cond),
                format_args!($($arg)+),
            );
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __logfan_check_binary {
    ($lhs:expr, $rhs:expr, $op:tt, $($arg:tt)+) => {{
        let __logfan_lhs = &$lhs;
        let __logfan_rhs = &$rhs;
        if !(__logfan_lhs $op __logfan_rhs) {
            $crate::hidden::check_failed_binary(
                file!(),
                line!(),
                concat!(stringify!($lhs), " ", stringify!($op), " ", stringify!($rhs)),
                __logfan_lhs,
                __logfan_rhs,
                format_args!($($arg)+),
            );
        }
    }};
}

/// Fatal equality assertion; the diagnostic shows both expressions'
/// source text and their evaluated values.
///
/// ```
/// logfan::check_eq!(2 + 2, 4);
/// ```
#[macro_export]
macro_rules! check_eq {
    ($lhs:expr, $rhs:expr $(,)?) => { $crate::__logfan_check_binary!($lhs, $rhs, ==, "") };
    ($lhs:expr, $rhs:expr, $($arg:tt)+) => { $crate::__logfan_check_binary!($lhs, $rhs, ==, $($arg)+) };
}

/// Fatal inequality assertion. See [`check_eq!`](crate::check_eq!).
#[macro_export]
macro_rules! check_ne {
    ($lhs:expr, $rhs:expr $(,)?) => { $crate::__logfan_check_binary!($lhs, $rhs, !=, "") };
    ($lhs:expr, $rhs:expr, $($arg:tt)+) => { $crate::__logfan_check_binary!($lhs, $rhs, !=, $($arg)+) };
}

/// Fatal `<` assertion. See [`check_eq!`](crate::check_eq!).
#[macro_export]
macro_rules! check_lt {
    ($lhs:expr, $rhs:expr $(,)?) => { $crate::__logfan_check_binary!($lhs, $rhs, <, "") };
    ($lhs:expr, $rhs:expr, $($arg:tt)+) => { $crate::__logfan_check_binary!($lhs, $rhs, <, $($arg)+) };
}

/// Fatal `<=` assertion. See [`check_eq!`](crate::check_eq!).
#[macro_export]
macro_rules! check_le {
    ($lhs:expr, $rhs:expr $(,)?) => { $crate::__logfan_check_binary!($lhs, $rhs, <=, "") };
    ($lhs:expr, $rhs:expr, $($arg:tt)+) => { $crate::__logfan_check_binary!($lhs, $rhs, <=, $($arg)+) };
}

/// Fatal `>` assertion. See [`check_eq!`](crate::check_eq!).
#[macro_export]
macro_rules! check_gt {
    ($lhs:expr, $rhs:expr $(,)?) => { $crate::__logfan_check_binary!($lhs, $rhs, >, "") };
    ($lhs:expr, $rhs:expr, $($arg:tt)+) => { $crate::__logfan_check_binary!($lhs, $rhs, >, $($arg)+) };
}

/// Fatal `>=` assertion. See [`check_eq!`](crate::check_eq!).
#[macro_export]
macro_rules! check_ge {
    ($lhs:expr, $rhs:expr $(,)?) => { $crate::__logfan_check_binary!($lhs, $rhs, >=, "") };
    ($lhs:expr, $rhs:expr, $($arg:tt)+) => { $crate::__logfan_check_binary!($lhs, $rhs, >=, $($arg)+) };
}
