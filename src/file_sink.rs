// SPDX-License-Identifier: MIT OR Apache-2.0

//! A file-backed sink.
//!
//! Each delivered message becomes one line on disk:
//! `preamble + indentation + prefix + body + newline`. There is no
//! structured encoding; consumers that need structure must parse the text
//! or register their own sink that inspects [`Message`] fields directly.

use crate::error::Error;
use crate::message::Message;
use crate::sink::Sink;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// How [`FileSink::new`] treats an existing file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileMode {
    /// Start over, discarding any previous contents.
    Truncate,
    /// Keep previous contents and append to the end.
    Append,
}

/// A sink that writes each message as one line to a file.
///
/// Output is buffered through a [`BufWriter`]; the registry drives
/// [`Sink::flush`] either synchronously (flush interval 0) or from the
/// background flush thread. I/O errors after a successful open are
/// swallowed, per the crate's delivery contract.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl FileSink {
    pub fn new(path: impl AsRef<Path>, mode: FileMode) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        let mut options = OpenOptions::new();
        options.create(true).write(true);
        match mode {
            FileMode::Truncate => options.truncate(true),
            FileMode::Append => options.append(true),
        };
        let file = options.open(&path).map_err(|source| Error::OpenLogFile {
            path: path.clone(),
            source,
        })?;
        Ok(Self {
            path,
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Sink for FileSink {
    fn write(&self, message: &Message<'_>) {
        let mut writer = match self.writer.lock() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        };
        let _ = writeln!(writer, "{}", message);
    }

    fn flush(&self) {
        let mut writer = match self.writer.lock() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        };
        let _ = writer.flush();
    }

    fn close(&self) {
        self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verbosity::Verbosity;

    fn message<'a>(text: &'a str) -> Message<'a> {
        Message {
            verbosity: Verbosity::INFO,
            file: "test.rs",
            line: 1,
            preamble: "",
            indentation: "",
            prefix: "",
            text,
        }
    }

    #[test]
    fn truncate_discards_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.log");

        let sink = FileSink::new(&path, FileMode::Truncate).unwrap();
        sink.write(&message("first run"));
        sink.close();
        drop(sink);

        let sink = FileSink::new(&path, FileMode::Truncate).unwrap();
        sink.write(&message("second run"));
        sink.close();
        drop(sink);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "second run\n");
    }

    #[test]
    fn append_keeps_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.log");

        let sink = FileSink::new(&path, FileMode::Truncate).unwrap();
        sink.write(&message("first run"));
        sink.close();
        drop(sink);

        let sink = FileSink::new(&path, FileMode::Append).unwrap();
        sink.write(&message("second run"));
        sink.close();
        drop(sink);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "first run\nsecond run\n");
    }

    #[test]
    fn unopenable_path_is_a_recoverable_error() {
        let dir = tempfile::tempdir().unwrap();
        // The directory itself is not a writable file path.
        let result = FileSink::new(dir.path(), FileMode::Truncate);
        assert!(matches!(result, Err(Error::OpenLogFile { .. })));
    }
}
