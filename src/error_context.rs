// SPDX-License-Identifier: MIT OR Apache-2.0

//! A thread-local breadcrumb stack rendered only on failure.
//!
//! Each [`error_context!`](crate::error_context!) statement links a
//! stack-owned entry in front of the calling thread's head pointer and
//! installs a guard that unlinks it at the end of the enclosing block.
//! Entries capture a value by move together with a rendering function
//! chosen for its type at compile time; the value is only formatted when a
//! render is actually requested, so the steady-state cost of a push is a
//! few pointer writes and no allocation.
//!
//! The stack is per-thread and lock-free by construction: only the owning
//! thread ever writes its own head. [`get_thread_ec_handle`] captures a
//! handle that another thread may render through
//! [`get_error_context_for`], which is `unsafe` because it is only sound
//! while the owning thread's stack is frozen.
//!
//! ```
//! logfan::error_context!("Parsing file", "example.conf");
//! let block = logfan::get_error_context();
//! assert!(block.contains("Parsing file"));
//! assert!(block.contains("example.conf"));
//! ```

use std::cell::Cell;
use std::fmt::{Display, Write};
use std::marker::PhantomData;
use std::ptr;

thread_local! {
    static EC_HEAD: Cell<*const EcHeader> = const { Cell::new(ptr::null()) };
}

/// Type-erased header linked into the thread-local stack. Lives inside an
/// [`EcEntry`] on the pushing scope's stack frame.
pub struct EcHeader {
    file: &'static str,
    line: u32,
    descr: &'static str,
    /// Points at the sibling `value` field; set when the entry is pushed.
    value: Cell<*const ()>,
    /// Renders `value` for the concrete captured type.
    print_value: unsafe fn(*const (), &mut String),
    previous: Cell<*const EcHeader>,
}

/// A pending error-context entry. Created by the
/// [`error_context!`](crate::error_context!) macro, which immediately
/// [`push`](EcEntry::push)es it; the entry itself owns the captured value
/// and must stay in place while the returned guard is alive (the borrow
/// in the guard enforces this).
pub struct EcEntry<T: Display> {
    header: EcHeader,
    value: T,
}

impl<T: Display> EcEntry<T> {
    pub fn new(file: &'static str, line: u32, descr: &'static str, value: T) -> Self {
        Self {
            header: EcHeader {
                file,
                line,
                descr,
                value: Cell::new(ptr::null()),
                print_value: print_value::<T>,
                previous: Cell::new(ptr::null()),
            },
            value,
        }
    }

    /// Links this entry in front of the calling thread's stack. The entry
    /// is unlinked when the returned guard drops, which restores the
    /// previous head; guards created later in the same block drop first,
    /// so the stack discipline is LIFO by construction.
    pub fn push(&self) -> EcGuard<'_> {
        self.header.value.set(&self.value as *const T as *const ());
        EC_HEAD.with(|head| {
            self.header.previous.set(head.get());
            head.set(&self.header as *const EcHeader);
        });
        EcGuard {
            header: &self.header,
            _not_send: PhantomData,
        }
    }
}

unsafe fn print_value<T: Display>(value: *const (), out: &mut String) {
    // Safety: `value` was derived from `&EcEntry<T>::value` and the entry
    // outlives every reader by the stack discipline.
    let value = unsafe { &*(value as *const T) };
    let _ = write!(out, "{}", value);
}

/// Unlinks its entry on drop.
pub struct EcGuard<'a> {
    header: &'a EcHeader,
    /// The guard must pop on the thread that pushed.
    _not_send: PhantomData<*const ()>,
}

impl Drop for EcGuard<'_> {
    fn drop(&mut self) {
        EC_HEAD.with(|head| {
            debug_assert_eq!(
                head.get(),
                self.header as *const EcHeader,
                "error-context entries must be popped in LIFO order"
            );
            head.set(self.header.previous.get());
        });
    }
}

/// A captured reference to some thread's error-context stack at a point in
/// time. `Send` so it can be handed to a watchdog or crash-reporting
/// thread; see [`get_error_context_for`] for the validity rules.
#[derive(Debug, Clone, Copy)]
pub struct EcHandle {
    head: *const EcHeader,
}

// Safety: the handle is an opaque pointer; all dereferencing happens in
// `get_error_context_for`, which carries the safety contract.
unsafe impl Send for EcHandle {}

/// Captures a handle to the calling thread's current error-context stack.
pub fn get_thread_ec_handle() -> EcHandle {
    EcHandle {
        head: EC_HEAD.with(|head| head.get()),
    }
}

/// Renders the calling thread's error-context stack, oldest entry first.
/// Returns an empty string when no entries are active.
pub fn get_error_context() -> String {
    // Safety: the head belongs to the calling thread.
    unsafe { render(EC_HEAD.with(|head| head.get())) }
}

/// Renders the stack behind a handle captured on another thread.
///
/// # Safety
///
/// The handle is a read-only snapshot with no synchronization. The caller
/// must guarantee that the owning thread does not push or pop
/// error-context entries, and does not leave the scopes that own them,
/// for the duration of this call — typically because that thread is
/// blocked, or because the process is in its crash path.
pub unsafe fn get_error_context_for(handle: EcHandle) -> String {
    unsafe { render(handle.head) }
}

const BANNER: &str = "------------------------------------------------";

unsafe fn render(head: *const EcHeader) -> String {
    let mut stack = Vec::new();
    let mut cursor = head;
    while !cursor.is_null() {
        stack.push(cursor);
        cursor = unsafe { (*cursor).previous.get() };
    }
    if stack.is_empty() {
        return String::new();
    }

    let mut out = String::new();
    out.push_str(BANNER);
    out.push('\n');
    for entry in stack.iter().rev() {
        let entry = unsafe { &**entry };
        let descr = format!("{}:", entry.descr);
        let _ = write!(
            out,
            "[ErrorContext] {:>23}:{:<5} {:<20} ",
            crate::dispatch::filename(entry.file),
            entry.line,
            descr
        );
        unsafe { (entry.print_value)(entry.value.get(), &mut out) };
        out.push('\n');
    }
    out.push_str(BANNER);
    out
}
