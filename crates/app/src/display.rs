use anyhow::{Context, Result};
use log::warn;
use pelikello_ui::{Display, FrameBuffer};
use std::io::{self, Stdout, Write};

const HIDE_CURSOR: &str = "\x1b[?25l";
const SHOW_CURSOR: &str = "\x1b[?25h";
const CLEAR_SCREEN: &str = "\x1b[2J";
const HOME: &str = "\x1b[H";

/// Draws frames on an ANSI terminal, two pixel rows per text line.
///
/// The cursor is hidden while frames are shown and restored on drop.
pub struct TerminalDisplay<W: Write> {
    out: W,
    started: bool,
    line: String,
}

impl TerminalDisplay<Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalDisplay<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            started: false,
            line: String::new(),
        }
    }

    fn write_frame(&mut self, frame: &FrameBuffer) -> io::Result<()> {
        if !self.started {
            self.out.write_all(HIDE_CURSOR.as_bytes())?;
            self.out.write_all(CLEAR_SCREEN.as_bytes())?;
            self.started = true;
        }
        self.out.write_all(HOME.as_bytes())?;

        for y in (0..frame.height()).step_by(2) {
            self.line.clear();
            for x in 0..frame.width() {
                let top = frame.pixel(x, y);
                let bottom = y + 1 < frame.height() && frame.pixel(x, y + 1);
                self.line.push(match (top, bottom) {
                    (true, true) => '█',
                    (true, false) => '▀',
                    (false, true) => '▄',
                    (false, false) => ' ',
                });
            }
            self.line.push_str("\r\n");
            self.out.write_all(self.line.as_bytes())?;
        }
        self.out.flush()
    }
}

impl<W: Write> Display for TerminalDisplay<W> {
    fn present(&mut self, frame: &FrameBuffer) -> Result<()> {
        self.write_frame(frame)
            .context("Failed to write frame to terminal")
    }
}

impl<W: Write> Drop for TerminalDisplay<W> {
    fn drop(&mut self) {
        if !self.started {
            return;
        }
        let restored = self
            .out
            .write_all(SHOW_CURSOR.as_bytes())
            .and_then(|_| self.out.flush());
        if let Err(e) = restored {
            warn!("Failed to restore terminal cursor: {}", e);
        }
    }
}
