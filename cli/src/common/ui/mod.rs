//! # procrun UI Utilities Module (`common::ui`)
//!
//! File: cli/src/common/ui/mod.rs
//!
//! ## Overview
//!
//! Terminal-facing output for the CLI. `ConsoleSink` is the live "output
//! window": it writes every line and chunk of a running command straight to
//! the terminal and, when a failure reveals it, prints a banner so the user
//! knows the output above belongs to the failed command.
//!
use crate::common::process::OutputSink;
use std::io::{self, Write};

/// Banner written when a failing command reveals the console.
const REVEAL_BANNER: &str = "--- command failed, see output above ---";

/// Streams command output to a writer (stderr by default).
pub struct ConsoleSink {
    writer: Box<dyn Write + Send>,
}

impl ConsoleSink {
    pub fn stderr() -> Self {
        Self::new(Box::new(io::stderr()))
    }

    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self { writer }
    }
}

// Terminal write errors are ignored: losing console output must not change
// the outcome of the command being run.
impl OutputSink for ConsoleSink {
    fn append_line(&mut self, line: &str) {
        let _ = writeln!(self.writer, "{}", line);
    }

    fn append(&mut self, text: &str) {
        let _ = self.writer.write_all(text.as_bytes());
        let _ = self.writer.flush();
    }

    fn show(&mut self) {
        let _ = writeln!(self.writer, "{}", REVEAL_BANNER);
        let _ = self.writer.flush();
    }
}
