//! Errors surfaced by the logveil CLI.

use crate::exit_codes::ExitCode;
use lv_redact::RedactionError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that end a run. Line-local problems never get here: malformed
/// lines are skipped and counted instead.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("invalid arguments: {0}")]
    Args(String),

    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create {}: {source}", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("i/o error on {label}: {source}")]
    Stream {
        label: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Redaction(#[from] RedactionError),

    #[error("worker thread panicked while processing {}", path.display())]
    WorkerPanicked { path: PathBuf },
}

impl RunError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            RunError::Args(_) => ExitCode::ArgsError,
            RunError::Open { .. } | RunError::Create { .. } | RunError::Stream { .. } => {
                ExitCode::IoError
            }
            RunError::Redaction(err) => ExitCode::from(err),
            RunError::WorkerPanicked { .. } => ExitCode::InternalError,
        }
    }
}
