//! Single updating status line on the terminal.

use std::io::{self, Write};

use crossterm::{
    cursor::MoveToColumn,
    queue,
    style::Print,
    terminal::{Clear, ClearType},
};

use dozen_core::{StatusLine, StatusSink};

/// Rewrites one terminal line in place for every status update.
///
/// Write failures are logged once and otherwise ignored; the control loop
/// never stops because the display went away.
pub struct TerminalSink<W: Write> {
    out: W,
    wrote_any: bool,
    failed: bool,
}

impl<W: Write> TerminalSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            wrote_any: false,
            failed: false,
        }
    }

    /// Move past the status line so later output starts on a fresh line.
    pub fn finish(&mut self) -> io::Result<()> {
        if self.wrote_any {
            self.out.write_all(b"\n")?;
        }
        self.out.flush()
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> StatusSink for TerminalSink<W> {
    fn emit(&mut self, line: &StatusLine) {
        let result = queue!(
            self.out,
            MoveToColumn(0),
            Clear(ClearType::CurrentLine),
            Print(line)
        )
        .and_then(|()| self.out.flush());

        match result {
            Ok(()) => self.wrote_any = true,
            Err(e) if !self.failed => {
                self.failed = true;
                tracing::warn!(%e, "Failed to write status line");
            }
            Err(_) => {}
        }
    }
}
