//! chromepdf
//!
//! HTML to PDF rendering by shelling out to a headless Chromium binary.
//!
//! # Features
//!
//! - **Process Runner**: bounded, non-blocking external-process execution
//!   with incremental pipe draining and forced termination on timeout
//! - **Chrome Renderer**: binary validation, deterministic flag mapping,
//!   and output verification around a single `--print-to-pdf` invocation
//! - **Fluent Builder**: format, orientation, margins, backgrounds,
//!   header/footer, script-settling wait, and scale, with `@page` CSS
//!   injection
//!
//! # Example
//!
//! ```no_run
//! use chromepdf::{Pdf, PdfConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PdfConfig {
//!     chrome_path: "/usr/bin/chromium".into(),
//!     timeout_secs: 60,
//!     ..Default::default()
//! };
//!
//! let pdf = Pdf::new(config);
//! pdf.html("<h1>Hello</h1>")
//!     .landscape()
//!     .save("/tmp/hello.pdf")?;
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::sync::Arc;

pub mod error;
pub use error::{Error, Result};

pub mod process;
pub use process::{Process, ProcessResult};

pub mod options;
pub use options::{Margins, Orientation, PdfOptions};

pub mod renderer;
pub use renderer::{ChromeRenderer, Renderer};

pub mod builder;
pub use builder::PdfBuilder;

// Temp-file support for the HTML handed to the browser
pub mod support;

/// Configuration for PDF rendering
///
/// The defaults match a stock Linux Chromium install: binary at
/// `/usr/bin/chromium` and a 60-second process timeout. Both can be
/// overridden per instance or through the `CHROMEPDF_CHROME_PATH` and
/// `CHROMEPDF_TIMEOUT` environment variables via [`PdfConfig::from_env`].
#[derive(Debug, Clone)]
pub struct PdfConfig {
    /// Path to the Chrome/Chromium executable
    pub chrome_path: PathBuf,
    /// Maximum seconds to wait for Chromium to render one PDF
    pub timeout_secs: u64,
    /// Options applied to every render unless overridden on the builder
    pub defaults: PdfOptions,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            chrome_path: PathBuf::from("/usr/bin/chromium"),
            timeout_secs: 60,
            defaults: PdfOptions::default(),
        }
    }
}

impl PdfConfig {
    /// Default configuration with environment overrides applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("CHROMEPDF_CHROME_PATH") {
            config.chrome_path = PathBuf::from(path);
        }
        if let Some(timeout) = std::env::var("CHROMEPDF_TIMEOUT")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.timeout_secs = timeout;
        }

        config
    }
}

/// Entry point producing PDF builders backed by a shared renderer
///
/// One `Pdf` instance can serve many concurrent renders; the renderer's
/// one-time binary validation is the only shared state, and it is idempotent.
#[derive(Clone)]
pub struct Pdf {
    renderer: Arc<dyn Renderer>,
    defaults: PdfOptions,
}

impl Pdf {
    /// Create an entry point with a Chromium renderer built from `config`.
    pub fn new(config: PdfConfig) -> Self {
        let renderer = ChromeRenderer::new(config.chrome_path, config.timeout_secs);
        Self {
            renderer: Arc::new(renderer),
            defaults: config.defaults,
        }
    }

    /// Create an entry point around a custom rendering backend.
    pub fn with_renderer(renderer: Arc<dyn Renderer>, defaults: PdfOptions) -> Self {
        Self { renderer, defaults }
    }

    /// Start a builder from raw HTML.
    pub fn html(&self, html: impl Into<String>) -> PdfBuilder {
        self.builder().html(html)
    }

    /// Start a fresh builder carrying the configured default options.
    pub fn builder(&self) -> PdfBuilder {
        PdfBuilder::new(self.renderer.clone(), self.defaults.clone())
    }
}

impl Default for Pdf {
    fn default() -> Self {
        Self::new(PdfConfig::from_env())
    }
}
