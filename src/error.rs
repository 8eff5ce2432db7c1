//! Error types for PDF rendering

use std::path::PathBuf;

use thiserror::Error;

use crate::process::ProcessResult;

/// Result type alias for rendering operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while rendering a PDF
///
/// The variants are deliberately distinct kinds rather than one stringly
/// error: a scheduler retrying failed renders must treat a timed-out process
/// differently from a missing binary, and a missing binary differently from
/// a nonzero exit.
#[derive(Error, Debug)]
pub enum Error {
    /// The configured Chromium executable does not exist
    #[error("Chromium executable not found at: {0}. Install Chromium or set CHROMEPDF_CHROME_PATH")]
    BinaryNotFound(PathBuf),

    /// The configured Chromium executable exists but cannot be executed
    #[error("Chromium at {0} is not executable")]
    BinaryNotExecutable(PathBuf),

    /// The OS refused to spawn the process
    #[error("failed to start process `{command}`: {source}")]
    ProcessStart {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The process ran past its wall-clock deadline and was killed
    #[error("process timed out after {0} seconds")]
    ProcessTimeout(u64),

    /// The process exited with a nonzero code (raised by `run_or_fail` only)
    #[error("process failed with exit code {}{}", .code, fmt_stderr(.result))]
    ProcessFailed { code: i32, result: ProcessResult },

    /// The browser process failed or timed out while rendering
    #[error("PDF rendering failed: {0}")]
    RenderFailed(#[source] Box<Error>),

    /// The browser reported success but produced no file at the target path
    #[error("PDF was not generated at expected path: {0}")]
    OutputMissing(PathBuf),

    /// Filesystem error around temp files and output handling
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn fmt_stderr(result: &ProcessResult) -> String {
    let stderr = result.error_output();
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {}", stderr.trim_end())
    }
}

impl Error {
    /// Whether a retry could plausibly succeed without operator intervention.
    ///
    /// Timeouts are transient-load failures; everything else needs either an
    /// environment fix (binary, spawn) or a content fix (render, output).
    /// External schedulers use this to decide retry-ability; the crate itself
    /// never retries.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::ProcessTimeout(_) => true,
            Error::RenderFailed(inner) => inner.is_retryable(),
            _ => false,
        }
    }
}
