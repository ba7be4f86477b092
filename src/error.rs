use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::data::fits::FitsError;

/// Prefix written in front of fatal, user-facing diagnostics.
pub const ERROR_PREFIX: &str = "*** SPEC_PREVIEWS ERROR:";

/// Everything that can go wrong between reading a spectrum and writing its previews.
#[derive(Error, Debug)]
pub enum PreviewError {
    // -- validation --
    #[error("Must provide a list of at least one order, input list is empty.")]
    EmptyAssociation,

    #[error("A spectrum must contain at least one association.")]
    EmptySpectrum,

    #[error("Order declares nelem={nelem} but its '{field}' array has {len} values.")]
    OrderLength {
        nelem: usize,
        field: &'static str,
        len: usize,
    },

    // -- structural --
    #[error(transparent)]
    Fits(#[from] FitsError),

    #[error("The provided stitched spectrum does not have the expected format, missing key '{0}'.")]
    MissingKey(String),

    #[error("Malformed value for key '{key}': {reason}")]
    BadValue { key: String, reason: String },

    #[error("Stitching service contract violated: {0}")]
    Contract(String),

    // -- resource --
    #[error("Output directory could not be created, {source}")]
    OutputDirPermission {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    // -- rendering backends --
    #[error("Plot rendering failed: {0}")]
    Render(String),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error("Preview window failed: {0}")]
    Display(String),

    #[error("Unsupported output type '{0}'.")]
    UnsupportedOutput(String),
}

impl PreviewError {
    /// Whether the driver should report this error as a fatal diagnostic and stop.
    pub fn is_fatal_resource(&self) -> bool {
        matches!(self, PreviewError::OutputDirPermission { .. })
    }

    /// Diagnostic line for stderr.
    pub fn diagnostic(&self) -> String {
        format!("{ERROR_PREFIX} {self}")
    }
}

/// Wrap a plotters drawing failure.
pub(crate) fn render_err<E: std::fmt::Display>(err: E) -> PreviewError {
    PreviewError::Render(err.to_string())
}

pub type Result<T> = std::result::Result<T, PreviewError>;
