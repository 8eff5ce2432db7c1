//! Rendering backends
//!
//! `ChromeRenderer` shells out to a headless Chromium binary via argv. It
//! does not speak the DevTools protocol and does not keep a browser alive
//! between renders; every render is one fresh process.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use log::debug;

use crate::error::{Error, Result};
use crate::options::{Orientation, PdfOptions};
use crate::process::Process;
use crate::support::TemporaryFile;

/// Core trait for rendering backends
pub trait Renderer: Send + Sync {
    /// Render HTML content to a PDF file at `output_path`.
    fn render(&self, html: &str, output_path: &Path, options: &PdfOptions) -> Result<()>;
}

/// Renderer backed by a headless Chromium binary
///
/// The binary path is validated at most once per instance, lazily before the
/// first render. The flag is a plain atomic rather than a lock: the check is
/// read-only and every racer reaches the same verdict, so concurrent first
/// renders may validate twice but can never observe a torn state.
pub struct ChromeRenderer {
    chrome_path: PathBuf,
    timeout_secs: u64,
    validated: AtomicBool,
}

impl ChromeRenderer {
    /// Create a renderer for the Chromium binary at `chrome_path`, with a
    /// per-render process timeout in seconds.
    pub fn new(chrome_path: impl Into<PathBuf>, timeout_secs: u64) -> Self {
        Self {
            chrome_path: chrome_path.into(),
            timeout_secs,
            validated: AtomicBool::new(false),
        }
    }

    /// Build the Chromium argv for one render call.
    ///
    /// Deterministic mapping from options to flags; the input URL is always
    /// the final argument.
    fn build_command(&self, input_url: &str, output_path: &Path, options: &PdfOptions) -> Vec<String> {
        let mut command = vec![
            self.chrome_path.display().to_string(),
            "--headless".to_string(),
            "--disable-gpu".to_string(),
            "--disable-software-rasterizer".to_string(),
            "--no-sandbox".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--disable-extensions".to_string(),
            "--disable-background-networking".to_string(),
            "--run-all-compositor-stages-before-draw".to_string(),
        ];

        command.push(format!("--print-to-pdf={}", output_path.display()));

        if !options.has_header_or_footer() {
            command.push("--no-pdf-header-footer".to_string());
        }

        if options.orientation == Orientation::Landscape {
            command.push("--landscape".to_string());
        }

        if options.print_background {
            command.push("--print-background".to_string());
        }

        if let Some(wait_ms) = options.wait_ms {
            command.push(format!("--virtual-time-budget={}", wait_ms));
        }

        if let Some(scale) = options.scale {
            command.push(format!("--scale={}", scale));
        }

        command.push(input_url.to_string());

        command
    }

    /// Stat the binary and check the execute bit. Fails before any process
    /// is spawned or temp file is written.
    fn validate_chrome_path(&self) -> Result<()> {
        if self.validated.load(Ordering::Acquire) {
            return Ok(());
        }

        let metadata = std::fs::metadata(&self.chrome_path)
            .map_err(|_| Error::BinaryNotFound(self.chrome_path.clone()))?;

        if !is_executable(&metadata) {
            return Err(Error::BinaryNotExecutable(self.chrome_path.clone()));
        }

        self.validated.store(true, Ordering::Release);
        Ok(())
    }
}

impl Renderer for ChromeRenderer {
    fn render(&self, html: &str, output_path: &Path, options: &PdfOptions) -> Result<()> {
        self.validate_chrome_path()?;

        // Dropped on every exit path below, so the input file never leaks.
        let temp_file = TemporaryFile::from_html(html)?;

        let command = self.build_command(&temp_file.url(), output_path, options);

        Process::from_command(command)
            .timeout(self.timeout_secs)
            .run_or_fail()
            .map_err(|e| Error::RenderFailed(Box::new(e)))?;

        // A clean exit is not proof of a PDF; misconfigured flags can exit
        // zero without writing anything.
        if !output_path.exists() {
            return Err(Error::OutputMissing(output_path.to_path_buf()));
        }

        debug!("rendered PDF at {}", output_path.display());
        Ok(())
    }
}

#[cfg(unix)]
fn is_executable(metadata: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &std::fs::Metadata) -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn renderer() -> ChromeRenderer {
        ChromeRenderer::new("/usr/bin/chromium", 60)
    }

    fn command_for(options: &PdfOptions) -> Vec<String> {
        renderer().build_command("file:///tmp/in.html", Path::new("/tmp/out.pdf"), options)
    }

    #[test]
    fn test_base_flags_and_argument_order() {
        let command = command_for(&PdfOptions::default());

        assert_eq!(command[0], "/usr/bin/chromium");
        assert!(command.contains(&"--headless".to_string()));
        assert!(command.contains(&"--no-sandbox".to_string()));
        assert!(command.contains(&"--run-all-compositor-stages-before-draw".to_string()));
        assert!(command.contains(&"--print-to-pdf=/tmp/out.pdf".to_string()));
        assert_eq!(command.last().unwrap(), "file:///tmp/in.html");
    }

    #[test]
    fn test_header_footer_suppression_by_default() {
        let command = command_for(&PdfOptions::default());
        assert!(command.contains(&"--no-pdf-header-footer".to_string()));
    }

    #[test]
    fn test_header_alone_suppresses_the_flag() {
        let options = PdfOptions {
            header: Some("<div>H</div>".to_string()),
            ..Default::default()
        };
        let command = command_for(&options);
        assert!(!command.contains(&"--no-pdf-header-footer".to_string()));
    }

    #[test]
    fn test_footer_alone_suppresses_the_flag() {
        let options = PdfOptions {
            footer: Some("<div>F</div>".to_string()),
            ..Default::default()
        };
        let command = command_for(&options);
        assert!(!command.contains(&"--no-pdf-header-footer".to_string()));
    }

    #[test]
    fn test_landscape_flag() {
        let options = PdfOptions {
            orientation: Orientation::Landscape,
            ..Default::default()
        };
        assert!(command_for(&options).contains(&"--landscape".to_string()));
        assert!(!command_for(&PdfOptions::default()).contains(&"--landscape".to_string()));
    }

    #[test]
    fn test_print_background_default_on() {
        assert!(command_for(&PdfOptions::default()).contains(&"--print-background".to_string()));

        let options = PdfOptions {
            print_background: false,
            ..Default::default()
        };
        assert!(!command_for(&options).contains(&"--print-background".to_string()));
    }

    #[test]
    fn test_wait_and_scale_flags() {
        let base = command_for(&PdfOptions::default());
        assert!(!base.iter().any(|a| a.starts_with("--virtual-time-budget")));
        assert!(!base.iter().any(|a| a.starts_with("--scale")));

        let options = PdfOptions {
            wait_ms: Some(500),
            scale: Some(0.8),
            ..Default::default()
        };
        let command = command_for(&options);
        assert!(command.contains(&"--virtual-time-budget=500".to_string()));
        assert!(command.contains(&"--scale=0.8".to_string()));
    }

    #[test]
    fn test_missing_binary() {
        let renderer = ChromeRenderer::new("/nonexistent/chromium", 60);
        let err = renderer
            .render("<h1>Hi</h1>", Path::new("/tmp/never.pdf"), &PdfOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::BinaryNotFound(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_executable_binary() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let fake = dir.path().join("chromium");
        std::fs::write(&fake, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&fake, std::fs::Permissions::from_mode(0o644)).unwrap();

        let renderer = ChromeRenderer::new(&fake, 60);
        let err = renderer
            .render("<h1>Hi</h1>", Path::new("/tmp/never.pdf"), &PdfOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::BinaryNotExecutable(_)));
    }
}
