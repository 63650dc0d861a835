//! logveil command line support.
//!
//! The `logveil` binary streams MongoDB server logs through an
//! [`lv_redact::RedactionEngine`]. This crate holds everything around the
//! engine: line sources (plain, gzip, stdin), output emitters, the per-line
//! loop and the concurrent multi-file batch, logging setup and exit codes.

pub mod emit;
pub mod error;
pub mod exit_codes;
pub mod logging;
pub mod pipeline;
pub mod source;

pub use emit::{Emitter, VecEmitter, WriterEmitter};
pub use error::RunError;
pub use exit_codes::ExitCode;
pub use pipeline::{output_path, redact_file, redact_files, redact_stream, RunStats};
pub use source::{open_path, stdin_source, LineSource, ReaderSource};
