use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use image::ImageFormat;

use crate::error::PreviewError;
use crate::stitch::TrimParams;

/// Default edge length of a preview, in pixels.
pub const DEFAULT_SIZE: u32 = 1024;
/// Default device pixel density.
pub const DEFAULT_DPI: f64 = 96.0;
/// Sizes strictly above this use the big-plot layout.
pub const THUMBNAIL_MAX_SIZE: u32 = 128;

// ---------------------------------------------------------------------------
// Output kind
// ---------------------------------------------------------------------------

/// Where a rendered preview goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// Interactive window; blocks until closed.
    Screen,
    /// Raster file in the given format.
    File(ImageFormat),
}

impl FromStr for OutputKind {
    type Err = PreviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        if name == "screen" {
            return Ok(OutputKind::Screen);
        }
        match ImageFormat::from_extension(&name) {
            Some(format) if format.writing_enabled() => Ok(OutputKind::File(format)),
            _ => Err(PreviewError::UnsupportedOutput(s.to_string())),
        }
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputKind::Screen => write!(f, "screen"),
            OutputKind::File(format) => {
                let ext = format.extensions_str().first().copied().unwrap_or("?");
                write!(f, "{ext}")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Preview configuration
// ---------------------------------------------------------------------------

/// Style switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StyleFlags {
    /// Overlay rejection markers and shade trimmed/avoided wavelengths.
    pub debug: bool,
    /// Show full `1.23E-14` style y tick labels on big plots.
    pub full_ylabels: bool,
}

/// Everything one render call needs besides the data.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewConfig {
    pub output: OutputKind,
    /// Requested output path; the size suffix is added when writing.
    pub output_file: PathBuf,
    pub sizes: Vec<u32>,
    pub dpi: f64,
    pub trim: TrimParams,
    pub style: StyleFlags,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            output: OutputKind::File(ImageFormat::Png),
            output_file: PathBuf::from("preview.png"),
            sizes: vec![DEFAULT_SIZE],
            dpi: DEFAULT_DPI,
            trim: TrimParams::default(),
            style: StyleFlags::default(),
        }
    }
}
