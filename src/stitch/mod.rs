//! Order stitching and plot metrics.
//!
//! The renderer only relies on the records defined here.  Where they come
//! from is behind [`StitchService`]: the built-in [`EdgeTrimStitcher`], or
//! results produced elsewhere and handed over as JSON ([`ExternalResults`]).

mod edge_trim;
mod external;

pub use edge_trim::EdgeTrimStitcher;
pub use external::ExternalResults;

use serde::Deserialize;

use crate::data::model::Association;
use crate::error::Result;

// ---------------------------------------------------------------------------
// Records exchanged with the renderer
// ---------------------------------------------------------------------------

/// One association with all of its orders merged into a single sequence.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StitchedSpectrum {
    pub wls: Vec<f64>,
    pub fls: Vec<f64>,
    pub flerrs: Vec<f64>,
    pub dqs: Vec<i32>,
    /// Short description shown at the top right of big plots.
    pub title: String,
}

impl StitchedSpectrum {
    /// Minimum and maximum finite wavelength, if any.
    pub fn finite_wavelength_range(&self) -> Option<(f64, f64)> {
        finite_range(&self.wls)
    }

    /// `(wavelength, flux)` pairs, split wherever either value is not finite.
    pub fn curve_segments(&self) -> Vec<Vec<(f64, f64)>> {
        let mut segments = Vec::new();
        let mut current = Vec::new();
        for (&wl, &fl) in self.wls.iter().zip(&self.fls) {
            if wl.is_finite() && fl.is_finite() {
                current.push((wl, fl));
            } else if !current.is_empty() {
                segments.push(std::mem::take(&mut current));
            }
        }
        if !current.is_empty() {
            segments.push(current);
        }
        segments
    }
}

/// A wavelength interval to de-emphasise on debug plots.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct AvoidRegion {
    pub minwl: f64,
    pub maxwl: f64,
}

/// Axis ranges and flux statistics for one stitched association.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotMetrics {
    /// Wavelength range after edge trimming; NaN bounds mean "nothing usable".
    pub optimal_xaxis_range: (f64, f64),
    pub y_axis_range: (f64, f64),
    pub median_flux: f64,
    pub median_fluxerr: f64,
    pub fluxerr_95th: f64,
    pub avoid_regions: Vec<AvoidRegion>,
}

impl PlotMetrics {
    /// Metrics for a spectrum with no usable points.
    pub fn unusable() -> Self {
        PlotMetrics {
            optimal_xaxis_range: (f64::NAN, f64::NAN),
            y_axis_range: (f64::NAN, f64::NAN),
            median_flux: f64::NAN,
            median_fluxerr: f64::NAN,
            fluxerr_95th: f64::NAN,
            avoid_regions: Vec::new(),
        }
    }

    /// Both bounds of the optimal x range are finite.
    pub fn has_finite_xaxis(&self) -> bool {
        self.optimal_xaxis_range.0.is_finite() && self.optimal_xaxis_range.1.is_finite()
    }
}

/// Edge-trimming parameters forwarded to the metrics computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrimParams {
    /// Consecutive passing points needed to mark a valid start/end.
    pub n_consecutive: usize,
    /// Max allowed ratio between a flux and the median flux.
    pub flux_scale_factor: f64,
    /// Max allowed ratio between a flux error and the median flux error.
    pub fluxerr_scale_factor: f64,
}

impl Default for TrimParams {
    fn default() -> Self {
        Self {
            n_consecutive: 20,
            flux_scale_factor: 10.0,
            fluxerr_scale_factor: 5.0,
        }
    }
}

/// Why a point would be excluded from the axis-range statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rejection {
    Kept,
    DataQuality,
    ZeroOrInvalid,
    FluxRatio,
    FluxErrRatio,
}

impl Rejection {
    pub const ALL: [Rejection; 5] = [
        Rejection::Kept,
        Rejection::DataQuality,
        Rejection::ZeroOrInvalid,
        Rejection::FluxRatio,
        Rejection::FluxErrRatio,
    ];
}

/// A single debug-overlay marker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayPoint {
    pub wl: f64,
    pub flux: f64,
    pub rejection: Rejection,
}

// ---------------------------------------------------------------------------
// Service seam
// ---------------------------------------------------------------------------

/// Stitches orders and computes the metrics the renderer needs.
pub trait StitchService {
    /// Merge all orders of an association into one sequence.
    fn stitch(&self, association: &Association) -> Result<StitchedSpectrum>;

    /// Axis ranges and flux statistics for a stitched sequence.
    fn plot_metrics(&self, stitched: &StitchedSpectrum, params: &TrimParams) -> PlotMetrics;

    /// Every plottable point tagged with its rejection criterion.
    fn debug_overlay(
        &self,
        stitched: &StitchedSpectrum,
        metrics: &PlotMetrics,
        params: &TrimParams,
    ) -> Vec<OverlayPoint>;
}

/// Min/max over the finite values of `values`.
pub(crate) fn finite_range(values: &[f64]) -> Option<(f64, f64)> {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}
