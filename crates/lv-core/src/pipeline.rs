//! Read, redact and write: the per-line loop and the multi-file batch.

use crate::emit::{Emitter, WriterEmitter};
use crate::error::RunError;
use crate::source::{open_path, LineSource};
use lv_redact::RedactionEngine;
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

/// Line counts for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub read: u64,
    pub emitted: u64,
    /// Lines dropped as malformed.
    pub skipped: u64,
}

impl RunStats {
    pub fn merge(&mut self, other: &RunStats) {
        self.read += other.read;
        self.emitted += other.emitted;
        self.skipped += other.skipped;
    }
}

/// Redact every line of `source` into `emitter`.
///
/// Malformed lines are skipped and counted. Only I/O failures end the
/// stream early.
pub fn redact_stream(
    engine: &RedactionEngine,
    source: &mut dyn LineSource,
    emitter: &mut dyn Emitter,
) -> io::Result<RunStats> {
    let mut stats = RunStats::default();
    while let Some(line) = source.next_line()? {
        stats.read += 1;
        match engine.redact_line(&line) {
            Ok(redacted) => {
                emitter.emit(&redacted)?;
                stats.emitted += 1;
            }
            Err(err) => {
                stats.skipped += 1;
                tracing::debug!(line = stats.read, reason = %err, "skipped line");
            }
        }
    }
    emitter.finish()?;
    Ok(stats)
}

/// Output path for the `index`-th input of a batch: `<prefix>.<index>`.
pub fn output_path(prefix: &Path, index: usize) -> PathBuf {
    let mut name = prefix.as_os_str().to_owned();
    name.push(format!(".{}", index));
    PathBuf::from(name)
}

/// Redact one file into another.
pub fn redact_file(
    engine: &RedactionEngine,
    input: &Path,
    output: &Path,
) -> Result<RunStats, RunError> {
    let mut source = open_path(input).map_err(|source| RunError::Open {
        path: input.to_path_buf(),
        source,
    })?;
    let file = File::create(output).map_err(|source| RunError::Create {
        path: output.to_path_buf(),
        source,
    })?;
    let mut emitter = WriterEmitter::new(BufWriter::new(file));
    let stats = redact_stream(engine, source.as_mut(), &mut emitter).map_err(|source| {
        RunError::Stream {
            label: input.display().to_string(),
            source,
        }
    })?;

    tracing::info!(
        input = %input.display(),
        output = %output.display(),
        read = stats.read,
        emitted = stats.emitted,
        skipped = stats.skipped,
        "redacted file"
    );
    Ok(stats)
}

/// Redact several files concurrently, one scoped thread per input, all
/// sharing `engine` and so the same pseudonym mapping. Input `i` is
/// written to `<prefix>.<i>`.
pub fn redact_files(
    engine: &RedactionEngine,
    inputs: &[PathBuf],
    prefix: &Path,
) -> Result<RunStats, RunError> {
    let results: Vec<Result<RunStats, RunError>> = std::thread::scope(|scope| {
        let handles: Vec<_> = inputs
            .iter()
            .enumerate()
            .map(|(index, input)| {
                let output = output_path(prefix, index);
                let handle = scope.spawn(move || redact_file(engine, input, &output));
                (input, handle)
            })
            .collect();

        handles
            .into_iter()
            .map(|(input, handle)| {
                handle.join().unwrap_or_else(|_| {
                    Err(RunError::WorkerPanicked {
                        path: input.clone(),
                    })
                })
            })
            .collect()
    });

    let mut total = RunStats::default();
    for result in results {
        total.merge(&result?);
    }
    tracing::info!(
        files = inputs.len(),
        read = total.read,
        emitted = total.emitted,
        skipped = total.skipped,
        "batch complete"
    );
    Ok(total)
}
