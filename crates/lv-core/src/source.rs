//! Line sources: plain files, gzip files and stdin.
//!
//! Lines are split on `\n` with a trailing `\r` removed. Invalid UTF-8 is
//! replaced rather than rejected; such a line then fails to parse and is
//! skipped like any other malformed line.

use flate2::bufread::MultiGzDecoder;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Something that yields log lines one at a time.
pub trait LineSource {
    /// The next line without its terminator, or `None` at end of input.
    fn next_line(&mut self) -> io::Result<Option<String>>;
}

/// A [`LineSource`] over any buffered reader.
pub struct ReaderSource<R: BufRead> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: BufRead> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
        }
    }
}

impl<R: BufRead> LineSource for ReaderSource<R> {
    fn next_line(&mut self) -> io::Result<Option<String>> {
        self.buf.clear();
        if self.reader.read_until(b'\n', &mut self.buf)? == 0 {
            return Ok(None);
        }
        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
            if self.buf.last() == Some(&b'\r') {
                self.buf.pop();
            }
        }
        Ok(Some(String::from_utf8_lossy(&self.buf).into_owned()))
    }
}

/// Whether `path` should be read through a gzip decoder: a `.gz`
/// extension, or content starting with the gzip magic bytes.
fn is_gzip(path: &Path, head: &[u8]) -> bool {
    path.extension().map_or(false, |ext| ext == "gz") || head.starts_with(&GZIP_MAGIC)
}

/// Open a log file, decompressing it if it is gzip.
pub fn open_path(path: &Path) -> io::Result<Box<dyn LineSource + Send>> {
    let mut reader = BufReader::new(File::open(path)?);
    if is_gzip(path, reader.fill_buf()?) {
        tracing::debug!(path = %path.display(), "reading gzip input");
        let decoder = MultiGzDecoder::new(reader);
        Ok(Box::new(ReaderSource::new(BufReader::new(decoder))))
    } else {
        Ok(Box::new(ReaderSource::new(reader)))
    }
}

/// Lines from standard input.
pub fn stdin_source() -> ReaderSource<io::StdinLock<'static>> {
    ReaderSource::new(io::stdin().lock())
}
