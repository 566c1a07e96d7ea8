// SPDX-License-Identifier: MIT OR Apache-2.0

//! The ephemeral message view handed to sinks.
//!
//! A [`Message`] borrows every piece of rendered text for the duration of a
//! single dispatch call. It is never stored by the core; a sink that needs
//! the text beyond its callback must copy it (see [`Message::to_line`]).
//!
//! The pieces are kept separate rather than pre-joined so that each
//! destination can be given its own indentation without re-rendering the
//! preamble or body, and so that sinks which only care about severity can
//! skip the text entirely.

use crate::verbosity::Verbosity;
use std::fmt::{self, Display};

/// A single log message, valid only for the duration of one dispatch call.
#[derive(Debug, Clone, Copy)]
pub struct Message<'a> {
    /// Severity of this message. Never `OFF`.
    pub verbosity: Verbosity,
    /// Source file of the logging call site.
    pub file: &'a str,
    /// Source line of the logging call site.
    pub line: u32,
    /// Fixed-width rendering of timestamp, uptime, thread name, file:line
    /// and severity glyph. Empty for raw messages.
    pub preamble: &'a str,
    /// Rendered indentation for the destination receiving this view.
    /// Empty for raw messages and outside of scopes.
    pub indentation: &'a str,
    /// Assertion/failure banner (for example `CHECK FAILED:  ...`) or the
    /// scope-entry marker; usually empty.
    pub prefix: &'a str,
    /// The formatted message body.
    pub text: &'a str,
}

impl Message<'_> {
    /// Joins the pieces into the on-disk line format,
    /// `preamble + indentation + prefix + text`, without the trailing
    /// newline. This is the copy a persistent sink should keep.
    pub fn to_line(&self) -> String {
        format!(
            "{}{}{}{}",
            self.preamble, self.indentation, self.prefix, self.text
        )
    }
}

impl Display for Message<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}{}",
            self.preamble, self.indentation, self.prefix, self.text
        )
    }
}
