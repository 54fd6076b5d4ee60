//! # procrun Output Sinks (`common::process::sink`)
//!
//! File: cli/src/common/process/sink.rs
//!
//! ## Overview
//!
//! Defines the `OutputSink` capability the process runner writes to while a
//! command runs, plus `BufferedSink`, an in-memory sink that holds output until
//! it is revealed. The streaming terminal sink lives in `common::ui`.
//!
//! A sink receives, in order:
//! 1. a `Running command: ...` line before the process starts,
//! 2. every stdout and stderr chunk as it arrives,
//! 3. either a `Finished running command: ...` line, or a `show()` call when
//!    the process exits non-zero.
//!
use std::io::Write;
use tracing::debug;

/// Output destination for a running command, analogous to a log/console view.
pub trait OutputSink: Send {
    /// Appends `line` followed by a line terminator.
    fn append_line(&mut self, line: &str);

    /// Appends `text` exactly as received.
    fn append(&mut self, text: &str);

    /// Makes the sink visible to the user. Called before a failure is reported.
    fn show(&mut self);
}

/// # Buffered Sink (`BufferedSink`)
///
/// Keeps everything written to it in memory and records whether it was
/// revealed. When constructed with [`BufferedSink::deferred`], the buffered
/// text is written to the given writer on the first `show()`, so output
/// only reaches the user if the command fails.
pub struct BufferedSink {
    contents: String,
    shown: bool,
    reveal_to: Option<Box<dyn Write + Send>>,
}

impl BufferedSink {
    /// Creates a sink that only buffers.
    pub fn new() -> Self {
        Self {
            contents: String::new(),
            shown: false,
            reveal_to: None,
        }
    }

    /// Creates a sink that buffers and flushes its contents to `writer` when shown.
    pub fn deferred(writer: Box<dyn Write + Send>) -> Self {
        Self {
            contents: String::new(),
            shown: false,
            reveal_to: Some(writer),
        }
    }

    /// Everything appended so far.
    pub fn contents(&self) -> &str {
        &self.contents
    }

    /// Whether `show()` has been called.
    pub fn was_shown(&self) -> bool {
        self.shown
    }
}

impl Default for BufferedSink {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputSink for BufferedSink {
    fn append_line(&mut self, line: &str) {
        self.contents.push_str(line);
        self.contents.push('\n');
    }

    fn append(&mut self, text: &str) {
        self.contents.push_str(text);
    }

    fn show(&mut self) {
        if self.shown {
            return;
        }
        self.shown = true;
        if let Some(writer) = self.reveal_to.as_mut() {
            debug!("Revealing {} bytes of buffered output", self.contents.len());
            // Best effort: a closed terminal must not mask the command failure.
            let _ = writer.write_all(self.contents.as_bytes());
            let _ = writer.flush();
        }
    }
}
