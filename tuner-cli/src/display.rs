//! Terminal surface: each frame clears the screen and redraws from the top.

use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::terminal::{Clear, ClearType};
use std::io::{self, Stdout, Write};
use tuner_core::{Frame, FrameSink};

pub struct TerminalDisplay<W: Write + Send> {
    out: W,
}

impl TerminalDisplay<Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> TerminalDisplay<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write + Send> FrameSink for TerminalDisplay<W> {
    fn show(&mut self, frame: &Frame) -> io::Result<()> {
        queue!(self.out, MoveTo(0, 0), Clear(ClearType::All))?;
        for line in frame.lines() {
            writeln!(self.out, "{}", line)?;
        }
        self.out.flush()
    }
}
