//! Output sinks for redacted lines.

use std::io::{self, Write};

/// Receives redacted lines in input order.
pub trait Emitter {
    /// Write one line; the terminator is added here.
    fn emit(&mut self, line: &str) -> io::Result<()>;

    /// Flush anything buffered. Called once after the last line.
    fn finish(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// An [`Emitter`] over any writer. Wrap files in a `BufWriter`.
pub struct WriterEmitter<W: Write> {
    writer: W,
}

impl<W: Write> WriterEmitter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Emitter for WriterEmitter<W> {
    fn emit(&mut self, line: &str) -> io::Result<()> {
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")
    }

    fn finish(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Collects lines in memory.
#[derive(Debug, Default)]
pub struct VecEmitter {
    pub lines: Vec<String>,
}

impl Emitter for VecEmitter {
    fn emit(&mut self, line: &str) -> io::Result<()> {
        self.lines.push(line.to_string());
        Ok(())
    }
}
