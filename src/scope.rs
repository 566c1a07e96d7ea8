// SPDX-License-Identifier: MIT OR Apache-2.0

//! RAII scope tracking.
//!
//! A [`ScopeGuard`] logs an opening line at construction and a closing
//! line with the elapsed seconds when it drops, and indents every message
//! logged in between for each destination whose threshold accepted the
//! scope's severity. Indentation is a per-destination counter, not a stack
//! of names, so interleaved scopes on different threads keep independent,
//! balanced depths.
//!
//! Use the [`log_scope!`](crate::log_scope!) macro, which binds the guard
//! to a hygienic local so the scope ends with the enclosing block:
//!
//! ```
//! fn load(count: u32) {
//!     logfan::log_scope!(INFO, "loading {} assets", count);
//!     // ... work; nested log lines are indented one level ...
//! } // closing line with elapsed time logs here
//! # load(1);
//! ```

use crate::registry;
use crate::verbosity::Verbosity;
use std::fmt;
use std::time::Instant;

/// Tracks one named, severity-tagged logical scope.
///
/// If the severity misses the global cutoff at construction time the guard
/// is inert: nothing is logged, nothing is indented, and destruction is a
/// no-op. The only cost paid is the cutoff comparison.
#[derive(Debug)]
pub struct ScopeGuard {
    verbosity: Verbosity,
    file: &'static str,
    line: u32,
    name: String,
    start: Instant,
    /// Whether the console was indented for this scope.
    indent_stderr: bool,
    active: bool,
}

impl ScopeGuard {
    pub fn new(
        verbosity: Verbosity,
        file: &'static str,
        line: u32,
        args: fmt::Arguments<'_>,
    ) -> Self {
        if !registry::enabled(verbosity) {
            return Self {
                verbosity,
                file,
                line,
                name: String::new(),
                start: Instant::now(),
                indent_stderr: false,
                active: false,
            };
        }

        let inner = registry::lock();
        let indent_stderr = verbosity <= registry::stderr_verbosity();
        let start = Instant::now();
        let name = fmt::format(args);
        crate::dispatch::log_to_everywhere(verbosity, file, line, "{ ", &name);

        if indent_stderr {
            inner.stderr_indentation.set(inner.stderr_indentation.get() + 1);
        }
        for entry in inner.sinks.borrow().iter() {
            if verbosity <= entry.verbosity {
                entry.indentation.set(entry.indentation.get() + 1);
            }
        }

        Self {
            verbosity,
            file,
            line,
            name,
            start,
            indent_stderr,
            active: true,
        }
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        if !self.active {
            return;
        }
        let inner = registry::lock();
        if self.indent_stderr {
            let depth = inner.stderr_indentation.get();
            inner.stderr_indentation.set(depth.saturating_sub(1));
        }
        for entry in inner.sinks.borrow().iter() {
            // A sink registered mid-scope was never incremented; the
            // saturating decrement keeps its depth from going negative.
            if self.verbosity <= entry.verbosity {
                let depth = entry.indentation.get();
                entry.indentation.set(depth.saturating_sub(1));
            }
        }
        let elapsed = self.start.elapsed().as_secs_f64();
        crate::dispatch::log(
            self.verbosity,
            self.file,
            self.line,
            format_args!("}} {:.3} s: {}", elapsed, self.name),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_sink::MemorySink;
    use std::sync::Arc;

    #[test]
    fn indentation_is_balanced_per_destination() {
        let _guard = crate::test_support::registry_guard();
        crate::remove_all_sinks();
        crate::set_stderr_verbosity(Verbosity::OFF);
        let sink = Arc::new(MemorySink::new());
        crate::add_sink("scoped", Box::new(sink.clone()), Verbosity::INFO);

        crate::log!(INFO, "before");
        {
            let _outer = ScopeGuard::new(Verbosity::INFO, file!(), line!(), format_args!("outer"));
            crate::log!(INFO, "depth one");
            {
                let _inner =
                    ScopeGuard::new(Verbosity::INFO, file!(), line!(), format_args!("inner"));
                crate::log!(INFO, "depth two");
            }
        }
        crate::log!(INFO, "after");

        let lines = sink.lines();
        let find = |needle: &str| {
            lines
                .iter()
                .find(|line| line.contains(needle))
                .unwrap_or_else(|| panic!("missing line: {}", needle))
                .clone()
        };
        assert!(!find("before").contains(".   "));
        assert!(find("{ outer").ends_with("{ outer"));
        assert!(find("depth one").contains(".   depth one"));
        assert!(find("depth two").contains(".   .   depth two"));
        // Closing lines log at the scope's own depth.
        assert!(find("s: inner").contains(".   }"));
        assert!(find("s: outer").contains("} "));
        assert!(!find("after").contains(".   "));

        crate::remove_all_sinks();
        crate::set_stderr_verbosity(Verbosity::INFO);
    }

    #[test]
    fn filtered_scope_is_inert() {
        let _guard = crate::test_support::registry_guard();
        crate::remove_all_sinks();
        crate::set_stderr_verbosity(Verbosity::OFF);
        let sink = Arc::new(MemorySink::new());
        crate::add_sink("quiet", Box::new(sink.clone()), Verbosity::ERROR);

        {
            // INFO exceeds every threshold; the guard must do nothing.
            let _scope = ScopeGuard::new(Verbosity::INFO, file!(), line!(), format_args!("quiet"));
            crate::log!(ERROR, "inside");
        }

        let lines = sink.lines();
        assert_eq!(lines.len(), 1);
        // No indentation from the inert scope, no open/close lines.
        assert!(lines[0].contains("inside"));
        assert!(!lines[0].contains(".   "));

        crate::remove_all_sinks();
        crate::set_stderr_verbosity(Verbosity::INFO);
    }

    #[test]
    fn scope_only_indents_accepting_sinks() {
        let _guard = crate::test_support::registry_guard();
        crate::remove_all_sinks();
        crate::set_stderr_verbosity(Verbosity::OFF);
        let verbose = Arc::new(MemorySink::new());
        let errors_only = Arc::new(MemorySink::new());
        crate::add_sink("verbose", Box::new(verbose.clone()), Verbosity::MAX);
        crate::add_sink("errors-only", Box::new(errors_only.clone()), Verbosity::ERROR);

        {
            let _scope = ScopeGuard::new(Verbosity::INFO, file!(), line!(), format_args!("work"));
            crate::log!(ERROR, "went wrong");
        }

        assert!(
            verbose
                .lines()
                .iter()
                .any(|line| line.contains(".   went wrong"))
        );
        // The ERROR-only sink never accepted the INFO scope, so its copy
        // is unindented.
        assert!(
            errors_only
                .lines()
                .iter()
                .any(|line| line.contains("went wrong") && !line.contains(".   "))
        );

        crate::remove_all_sinks();
        crate::set_stderr_verbosity(Verbosity::INFO);
    }
}
