//! Render option value types
//!
//! `PdfOptions` is an immutable record consumed once per render to build the
//! Chromium command line; it is never mutated after construction and never
//! shared between renders. The types derive serde so job payloads can carry
//! them verbatim.

use serde::{Deserialize, Serialize};

/// Page orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Default for Orientation {
    fn default() -> Self {
        Orientation::Portrait
    }
}

/// Page margins in millimeters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Margins {
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub left: u32,
}

impl Margins {
    /// Uniform margins on all four sides.
    pub fn uniform(margin: u32) -> Self {
        Self {
            top: margin,
            right: margin,
            bottom: margin,
            left: margin,
        }
    }
}

impl Default for Margins {
    fn default() -> Self {
        Self::uniform(10)
    }
}

/// Options for a single render call
///
/// Defaults: A4 portrait, 10mm margins, CSS backgrounds printed, no custom
/// header/footer, no script-settling wait, no scale override.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfOptions {
    /// Paper format name (A4, Letter, Legal, ...), used by the `@page` rule
    pub format: String,
    pub orientation: Orientation,
    pub margins: Margins,
    /// Whether Chromium should print CSS backgrounds (default on)
    pub print_background: bool,
    /// Custom header HTML; setting it keeps Chromium's header machinery on
    pub header: Option<String>,
    /// Custom footer HTML; setting it keeps Chromium's footer machinery on
    pub footer: Option<String>,
    /// Virtual-time budget in milliseconds for client-side script settling
    pub wait_ms: Option<u64>,
    /// Print scale factor
    pub scale: Option<f64>,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            format: "A4".to_string(),
            orientation: Orientation::default(),
            margins: Margins::default(),
            print_background: true,
            header: None,
            footer: None,
            wait_ms: None,
            scale: None,
        }
    }
}

impl PdfOptions {
    /// Whether either a custom header or footer is present. Either one is
    /// enough to keep the `--no-pdf-header-footer` flag off the command.
    pub fn has_header_or_footer(&self) -> bool {
        self.header.is_some() || self.footer.is_some()
    }
}
