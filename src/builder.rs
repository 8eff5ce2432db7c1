//! Fluent PDF builder
//!
//! Chained setters assemble one immutable [`PdfOptions`] record plus the
//! HTML content, then `save` or `output` hands everything to the renderer.
//! Each builder is consumed by a single render; nothing is shared across
//! calls.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::options::{Margins, Orientation, PdfOptions};
use crate::renderer::Renderer;

/// Builder for a single PDF render
///
/// # Examples
///
/// ```no_run
/// use chromepdf::Pdf;
///
/// # fn main() -> chromepdf::Result<()> {
/// let pdf = Pdf::default();
/// pdf.html("<h1>Invoice</h1>")
///     .landscape()
///     .margin(15)
///     .save("/tmp/invoice.pdf")?;
/// # Ok(())
/// # }
/// ```
pub struct PdfBuilder {
    renderer: Arc<dyn Renderer>,
    html: String,
    options: PdfOptions,
}

impl PdfBuilder {
    pub(crate) fn new(renderer: Arc<dyn Renderer>, options: PdfOptions) -> Self {
        Self {
            renderer,
            html: String::new(),
            options,
        }
    }

    /// Set the HTML content.
    pub fn html(mut self, html: impl Into<String>) -> Self {
        self.html = html.into();
        self
    }

    /// Set the page format (A4, Letter, Legal, ...).
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.options.format = format.into();
        self
    }

    /// Set the page orientation.
    pub fn orientation(mut self, orientation: Orientation) -> Self {
        self.options.orientation = orientation;
        self
    }

    /// Shorthand for landscape orientation.
    pub fn landscape(self) -> Self {
        self.orientation(Orientation::Landscape)
    }

    /// Shorthand for portrait orientation.
    pub fn portrait(self) -> Self {
        self.orientation(Orientation::Portrait)
    }

    /// Set page margins in millimeters.
    pub fn margins(mut self, top: u32, right: u32, bottom: u32, left: u32) -> Self {
        self.options.margins = Margins {
            top,
            right,
            bottom,
            left,
        };
        self
    }

    /// Set uniform margins on all sides, in millimeters.
    pub fn margin(self, margin: u32) -> Self {
        self.margins(margin, margin, margin, margin)
    }

    /// Enable or disable printing of CSS backgrounds.
    pub fn print_background(mut self, print: bool) -> Self {
        self.options.print_background = print;
        self
    }

    /// Set a custom header HTML.
    pub fn header(mut self, html: impl Into<String>) -> Self {
        self.options.header = Some(html.into());
        self
    }

    /// Set a custom footer HTML.
    pub fn footer(mut self, html: impl Into<String>) -> Self {
        self.options.footer = Some(html.into());
        self
    }

    /// Give client-side scripts a virtual-time budget (milliseconds) to
    /// settle before capture.
    pub fn wait_for(mut self, milliseconds: u64) -> Self {
        self.options.wait_ms = Some(milliseconds);
        self
    }

    /// Set the scale factor, clamped to 0.1..=2.0.
    pub fn scale(mut self, scale: f64) -> Self {
        self.options.scale = Some(scale.clamp(0.1, 2.0));
        self
    }

    /// Render the PDF to `path`, creating parent directories as needed.
    /// Returns the path on success.
    pub fn save(self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let html = wrap_with_page_styles(&self.html, &self.options);
        self.renderer.render(&html, path, &self.options)?;

        Ok(path.to_path_buf())
    }

    /// Render the PDF and return its bytes, leaving nothing on disk.
    pub fn output(self) -> Result<Vec<u8>> {
        let temp_dir = tempfile::tempdir()?;
        let temp_path = temp_dir.path().join("output.pdf");

        self.save(&temp_path)?;

        let bytes = std::fs::read(&temp_path)?;
        temp_dir.close().map_err(Error::Io)?;
        Ok(bytes)
    }

    #[cfg(test)]
    fn built_html(&self) -> String {
        wrap_with_page_styles(&self.html, &self.options)
    }

    #[cfg(test)]
    pub(crate) fn options(&self) -> &PdfOptions {
        &self.options
    }
}

/// Inject an `@page` rule carrying format, orientation, and margins, plus
/// exact color adjustment for printed backgrounds. Inserted before
/// `</head>` when the document has one, otherwise prepended.
fn wrap_with_page_styles(html: &str, options: &PdfOptions) -> String {
    let orientation = match options.orientation {
        Orientation::Landscape => " landscape",
        Orientation::Portrait => "",
    };

    let style = format!(
        "<style>\n\
         @page {{\n\
         size: {}{};\n\
         margin: {}mm {}mm {}mm {}mm;\n\
         }}\n\
         @media print {{\n\
         body {{\n\
         -webkit-print-color-adjust: exact;\n\
         print-color-adjust: exact;\n\
         }}\n\
         }}\n\
         </style>",
        options.format.to_lowercase(),
        orientation,
        options.margins.top,
        options.margins.right,
        options.margins.bottom,
        options.margins.left,
    );

    match find_ascii_case_insensitive(html, "</head>") {
        Some(pos) => {
            let mut out = String::with_capacity(html.len() + style.len());
            out.push_str(&html[..pos]);
            out.push_str(&style);
            out.push_str(&html[pos..]);
            out
        }
        None => format!("{}{}", style, html),
    }
}

/// Byte-window scan for an ASCII needle, ignoring ASCII case.
///
/// Folding whole strings with `to_lowercase` shifts byte offsets when the
/// surrounding text contains characters that grow under lowercasing, so the
/// scan compares windows of the original bytes instead. The needle's first
/// byte is ASCII, which makes every returned offset a char boundary.
fn find_ascii_case_insensitive(haystack: &str, needle: &str) -> Option<usize> {
    debug_assert!(needle.is_ascii());

    let haystack = haystack.as_bytes();
    let needle = needle.as_bytes();
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }

    (0..=haystack.len() - needle.len())
        .find(|&i| haystack[i..i + needle.len()].eq_ignore_ascii_case(needle))
}
