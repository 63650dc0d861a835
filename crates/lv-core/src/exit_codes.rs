//! Exit codes for the logveil CLI.
//!
//! Exit code ranges:
//! - 0: Success
//! - 10-19: User/environment errors (recoverable by user action)
//! - 20-29: Internal errors (bugs, should be reported)

use lv_redact::RedactionError;

/// Exit codes for logveil operations.
///
/// These codes are a stable contract for scripts wrapping the tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Every input was processed. Skipped malformed lines do not change this.
    Clean = 0,

    // ========================================================================
    // User / Environment Errors (10-19)
    // ========================================================================
    /// Invalid arguments or flag combinations
    ArgsError = 10,

    /// Unreadable or contradictory config, or an unusable key file
    ConfigError = 11,

    // ========================================================================
    // Internal Errors (20-29)
    // ========================================================================
    /// Internal error (bug - please report)
    InternalError = 20,

    /// Reading input or writing output failed
    IoError = 21,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the error code name as a string constant.
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK_CLEAN",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}

impl From<&RedactionError> for ExitCode {
    fn from(err: &RedactionError) -> Self {
        match err {
            RedactionError::PatternError(_) | RedactionError::EncryptionError(_) => {
                ExitCode::ArgsError
            }
            RedactionError::ConfigError(_) | RedactionError::KeyError(_) => ExitCode::ConfigError,
            RedactionError::IoError(_) => ExitCode::IoError,
            RedactionError::MalformedLine(_) | RedactionError::JsonError(_) => {
                ExitCode::InternalError
            }
        }
    }
}
