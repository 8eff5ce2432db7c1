//! Temporary input files handed to the browser
//!
//! The renderer never passes HTML on the command line; it writes the content
//! to a uniquely-named temp file and hands Chromium a `file://` URL. The
//! file is removed on drop, so no exit path of a render can leak it.

use std::io::Write;
use std::path::{Path, PathBuf};

use log::warn;
use tempfile::NamedTempFile;

use crate::error::Result;

/// A uniquely-named temporary file with a `file://` URL
pub struct TemporaryFile {
    // None once deleted; delete() is idempotent.
    file: Option<NamedTempFile>,
    path: PathBuf,
}

impl TemporaryFile {
    /// Write `content` to a fresh temp file with the given extension.
    pub fn from_content(content: &[u8], extension: &str) -> Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("chromepdf_")
            .suffix(&format!(".{}", extension))
            .tempfile()?;
        file.write_all(content)?;
        file.flush()?;

        let path = file.path().to_path_buf();
        Ok(Self {
            file: Some(file),
            path,
        })
    }

    /// Write HTML content to a fresh `.html` temp file.
    pub fn from_html(html: &str) -> Result<Self> {
        Self::from_content(html.as_bytes(), "html")
    }

    /// Path of the file on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `file://` URL for the file, as Chromium expects its input.
    pub fn url(&self) -> String {
        format!("file://{}", self.path.display())
    }

    /// Delete the file now. Calling this more than once is a no-op.
    pub fn delete(&mut self) {
        if let Some(file) = self.file.take() {
            if let Err(e) = file.close() {
                warn!("failed to delete temp file {}: {}", self.path.display(), e);
            }
        }
    }
}

impl Drop for TemporaryFile {
    fn drop(&mut self) {
        self.delete();
    }
}
