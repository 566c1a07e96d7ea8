// SPDX-License-Identifier: MIT OR Apache-2.0

//! The ordered verbosity scale shared by messages and destinations.
//!
//! Lower numeric values are more severe. The named band runs
//! `FATAL < ERROR < WARNING < INFO`, with `INFO` at zero; positive values
//! up to [`Verbosity::MAX`] are user-defined verbose levels, least severe.
//! [`Verbosity::OFF`] is a sentinel below `FATAL` that is only meaningful
//! as a destination threshold ("accept nothing") and must never be used as
//! a message severity.
//!
//! A message of severity `S` is delivered to a destination with threshold
//! `T` iff `S <= T`.

use std::fmt::{self, Display};

/// A message severity or destination threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Verbosity(pub i8);

impl Verbosity {
    /// Only valid as a destination threshold, meaning "accept nothing".
    pub const OFF: Verbosity = Verbosity(-9);
    /// Terminal severity. Logging at this level aborts the process.
    pub const FATAL: Verbosity = Verbosity(-3);
    pub const ERROR: Verbosity = Verbosity(-2);
    pub const WARNING: Verbosity = Verbosity(-1);
    /// The default console threshold.
    pub const INFO: Verbosity = Verbosity(0);
    /// The least severe user verbosity level.
    pub const MAX: Verbosity = Verbosity(9);

    /// One-character glyph used in the rendered preamble.
    pub fn glyph(self) -> char {
        match self {
            v if v <= Verbosity::FATAL => 'F',
            Verbosity::ERROR => 'E',
            Verbosity::WARNING => 'W',
            Verbosity::INFO => 'I',
            Verbosity(n) => char::from_digit(n.clamp(1, 9) as u32, 10).unwrap_or('9'),
        }
    }

    /// Whether this value may be used as a message severity.
    ///
    /// `OFF` and anything below `FATAL` are thresholds only.
    pub fn is_message_severity(self) -> bool {
        self >= Verbosity::FATAL && self <= Verbosity::MAX
    }
}

impl Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Verbosity::OFF => write!(f, "OFF"),
            Verbosity::FATAL => write!(f, "FATAL"),
            Verbosity::ERROR => write!(f, "ERROR"),
            Verbosity::WARNING => write!(f, "WARNING"),
            Verbosity::INFO => write!(f, "INFO"),
            Verbosity(n) => write!(f, "{}", n),
        }
    }
}

impl From<i8> for Verbosity {
    fn from(value: i8) -> Self {
        Verbosity(value)
    }
}

/*
Boilerplate notes.

Copy/Ord/Hash are all derived; the type is a transparent i8 and the numeric
order is the severity order, which is exactly what we want for threshold
comparisons. Default is deliberately not implemented: a "default severity"
is ambiguous between INFO-the-message-level and INFO-the-threshold.
*/
