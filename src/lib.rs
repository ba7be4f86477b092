//! Preview plots for HST/STIS 1D spectra.
//!
//! ```text
//!   FITS file ──► data::loader ──► Spectrum
//!                                     │
//!                     select::association_indices
//!                                     │
//!                  stitch::StitchService (stitch + plot metrics)
//!                                     │
//!                       render::render_preview ──► PNG/JPEG/... or window
//! ```

pub mod color;
pub mod config;
pub mod data;
pub mod error;
pub mod pipeline;
pub mod render;
pub mod select;
pub mod stitch;

pub use config::{OutputKind, PreviewConfig, StyleFlags};
pub use error::{PreviewError, Result};
pub use pipeline::make_previews;
