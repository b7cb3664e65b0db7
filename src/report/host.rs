use std::io;

use log::debug;

use super::directives::Directive;
use super::Render;

/// Display surface that executes directives in order onto a terminal stream.
pub struct TerminalHost<W: io::Write> {
    out: W,
}

impl<W: io::Write> TerminalHost<W> {
    pub fn new(out: W) -> TerminalHost<W> {
        TerminalHost { out }
    }

    pub fn execute(&mut self, directives: &[Directive]) -> io::Result<()> {
        for directive in directives {
            directive.render(&mut self.out)?;
        }
        debug!("rendered report, directives={}", directives.len());

        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
