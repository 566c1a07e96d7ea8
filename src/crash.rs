// SPDX-License-Identifier: MIT OR Apache-2.0

//! Best-effort reporting when the process is about to die abnormally.
//!
//! [`install_signal_handlers`] registers a handler for an enumerated set
//! of abnormal-termination signals. When one fires, the handler first
//! performs only allocation-free writes straight to the stderr file
//! descriptor naming the signal. After that — gated by
//! [`SignalOptions::unsafe_report`], because it is not strictly
//! signal-safe — it attempts the full FATAL reporting sequence (stack
//! trace, error context, fatal handler, flush) with process termination
//! suppressed and any panic raised during reporting swallowed. Finally it
//! restores the signal's default disposition and re-raises, so the process
//! terminates with the expected signal-based exit status instead of
//! masking it.
//!
//! The unsafe reporting step allocates and takes locks from signal
//! context. That is a deliberate trade-off: the process is dying anyway,
//! and the report is usually worth the residual risk. Deployments that
//! disagree set `unsafe_report: false` and keep only the raw writes.

#![cfg(unix)]

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::message::Message;
use crate::verbosity::Verbosity;

/// Which signals to catch and whether the non-signal-safe reporting pass
/// runs. The default catches everything and reports fully.
#[derive(Debug, Clone, Copy)]
pub struct SignalOptions {
    /// Attempt the full reporting sequence from signal context.
    pub unsafe_report: bool,
    pub sigabrt: bool,
    pub sigbus: bool,
    pub sigfpe: bool,
    pub sigill: bool,
    pub sigint: bool,
    pub sigsegv: bool,
    pub sigterm: bool,
}

impl SignalOptions {
    /// Catch no signals. Useful to restrict to a hand-picked set.
    pub fn none() -> Self {
        Self {
            unsafe_report: false,
            sigabrt: false,
            sigbus: false,
            sigfpe: false,
            sigill: false,
            sigint: false,
            sigsegv: false,
            sigterm: false,
        }
    }
}

impl Default for SignalOptions {
    fn default() -> Self {
        Self {
            unsafe_report: true,
            sigabrt: true,
            sigbus: true,
            sigfpe: true,
            sigill: true,
            sigint: true,
            sigsegv: true,
            sigterm: true,
        }
    }
}

static UNSAFE_REPORT: AtomicBool = AtomicBool::new(true);

static SIGNALS: &[(libc::c_int, &str)] = &[
    (libc::SIGABRT, "SIGABRT"),
    (libc::SIGBUS, "SIGBUS"),
    (libc::SIGFPE, "SIGFPE"),
    (libc::SIGILL, "SIGILL"),
    (libc::SIGINT, "SIGINT"),
    (libc::SIGSEGV, "SIGSEGV"),
    (libc::SIGTERM, "SIGTERM"),
];

/// Installs the crash handler for the signals selected in `options`.
/// Failure to install any single handler is reported as an ERROR log line
/// and does not affect the others.
pub fn install_signal_handlers(options: SignalOptions) {
    UNSAFE_REPORT.store(options.unsafe_report, Ordering::Relaxed);
    let selected = |signum: libc::c_int| match signum {
        libc::SIGABRT => options.sigabrt,
        libc::SIGBUS => options.sigbus,
        libc::SIGFPE => options.sigfpe,
        libc::SIGILL => options.sigill,
        libc::SIGINT => options.sigint,
        libc::SIGSEGV => options.sigsegv,
        libc::SIGTERM => options.sigterm,
        _ => false,
    };
    for &(signum, name) in SIGNALS {
        if !selected(signum) {
            continue;
        }
        // Safety: installing a handler whose body only performs
        // async-signal-safe work unconditionally; the unsafe reporting
        // pass is opt-in and documented above.
        let failed = unsafe {
            let mut action: libc::sigaction = std::mem::zeroed();
            action.sa_sigaction = signal_handler as usize;
            action.sa_flags = 0;
            libc::sigemptyset(&mut action.sa_mask);
            libc::sigaction(signum, &action, std::ptr::null_mut()) != 0
        };
        if failed {
            crate::log!(ERROR, "Failed to install handler for {}", name);
        }
    }
}

/// Allocation-free write straight to the stderr file descriptor.
fn write_raw(text: &str) {
    // Safety: plain write(2) on fd 2; best-effort, result ignored.
    unsafe {
        libc::write(libc::STDERR_FILENO, text.as_ptr().cast(), text.len());
    }
}

extern "C" fn signal_handler(signum: libc::c_int) {
    let name = SIGNALS
        .iter()
        .find(|(number, _)| *number == signum)
        .map_or("UNKNOWN SIGNAL", |(_, name)| name);

    // Signal-safe part: raw writes only, no allocation, no locks.
    write_raw("\n");
    if crate::registry::colorlog() {
        write_raw("\x1b[0m"); // reset any half-written color sequence
    }
    write_raw("logfan caught a signal: ");
    write_raw(name);
    write_raw("\n");

    if UNSAFE_REPORT.load(Ordering::Relaxed) {
        // Guaranteed termination beats successful reporting: swallow
        // anything the reporting path raises, including a diverting
        // fatal handler.
        let _ = catch_unwind(AssertUnwindSafe(|| {
            crate::dispatch::flush();
            let preamble = crate::dispatch::print_preamble(Verbosity::FATAL, "", 0);
            let message = Message {
                verbosity: Verbosity::FATAL,
                file: "",
                line: 0,
                preamble: &preamble,
                indentation: "",
                prefix: "Signal: ",
                text: name,
            };
            // Termination suppressed: we re-raise below instead, so the
            // exit status reflects the signal rather than an abort.
            crate::dispatch::log_message(&message, false, false);
        }));
    }

    // Safety: restore the default disposition and deliver the signal
    // again so the process dies the way the kernel expects.
    unsafe {
        let mut action: libc::sigaction = std::mem::zeroed();
        action.sa_sigaction = libc::SIG_DFL;
        libc::sigemptyset(&mut action.sa_mask);
        libc::sigaction(signum, &action, std::ptr::null_mut());
        libc::raise(signum);
    }
}
