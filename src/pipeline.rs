use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::config::PreviewConfig;
use crate::data::loader::read_spectrum;
use crate::data::model::Spectrum;
use crate::error::{PreviewError, Result};
use crate::render::{render_preview, Figure};
use crate::select::association_indices;
use crate::stitch::{ExternalResults, PlotMetrics, StitchService, StitchedSpectrum};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Read `input`, pick the associations to show and render one preview per
/// requested size.
///
/// Stitching and metrics come from `external` when given, otherwise from
/// `service`. Returns the written files (empty in screen mode).
pub fn make_previews(
    input: &Path,
    config: &PreviewConfig,
    service: &dyn StitchService,
    external: Option<&ExternalResults>,
) -> Result<Vec<PathBuf>> {
    let spectrum = read_spectrum(input)?;
    let indices = association_indices(spectrum.len());
    info!(
        "{}: {} association(s), plotting {:?}",
        spectrum.file_name(),
        spectrum.len(),
        indices
    );

    let (stitched, metrics) = prepare(&spectrum, &indices, config, service, external)?;
    let figure = Figure {
        spectrum: &spectrum,
        indices: &indices,
        stitched: &stitched,
        metrics: &metrics,
    };

    let mut written = Vec::new();
    for &size in &config.sizes {
        debug!("rendering {size}px preview");
        if let Some(path) = render_preview(&figure, config, size, service)? {
            written.push(path);
        }
    }
    Ok(written)
}

/// Stitched spectra and metrics for the selected associations, in plotting order.
pub fn prepare(
    spectrum: &Spectrum,
    indices: &[usize],
    config: &PreviewConfig,
    service: &dyn StitchService,
    external: Option<&ExternalResults>,
) -> Result<(Vec<StitchedSpectrum>, Vec<PlotMetrics>)> {
    if let Some(results) = external {
        if results.len() != indices.len() {
            return Err(PreviewError::Contract(format!(
                "{} associations selected but {} stitched spectra supplied",
                indices.len(),
                results.len()
            )));
        }
        debug!("using {} externally stitched spectra", results.len());
        return Ok((results.stitched.clone(), results.metrics.clone()));
    }

    let associations = spectrum.associations();
    let mut stitched = Vec::with_capacity(indices.len());
    let mut metrics = Vec::with_capacity(indices.len());
    for &i in indices {
        let association = associations.get(i).ok_or_else(|| {
            PreviewError::Contract(format!(
                "association index {i} out of range for {} associations",
                associations.len()
            ))
        })?;
        let s = service.stitch(association)?;
        let m = service.plot_metrics(&s, &config.trim);
        debug!(
            "association {}: {} points, optimal x range {:?}",
            i + 1,
            s.wls.len(),
            m.optimal_xaxis_range
        );
        stitched.push(s);
        metrics.push(m);
    }
    Ok((stitched, metrics))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Association, Order};
    use crate::stitch::EdgeTrimStitcher;

    fn ramp_order(n: usize, start: f64) -> Order {
        let wls = (0..n).map(|i| start + i as f64).collect();
        let fls = (0..n).map(|i| 1.0 + (i % 3) as f64 * 0.1).collect();
        Order::new(Some(n), Some(wls), Some(fls), Some(vec![0.1; n]), None).unwrap()
    }

    fn spectrum(n_assoc: usize) -> Spectrum {
        let associations = (0..n_assoc)
            .map(|a| {
                let order = if a == 1 {
                    Order::zeroed(50)
                } else {
                    ramp_order(50, 1500.0)
                };
                Association::new(vec![order]).unwrap()
            })
            .collect();
        Spectrum::new("sample_x1d.fits", associations).unwrap()
    }

    #[test]
    fn prepares_one_record_per_selected_association() {
        let spectrum = spectrum(5);
        let indices = association_indices(spectrum.len());
        assert_eq!(indices, vec![0, 3, 4]);

        let (stitched, metrics) =
            prepare(&spectrum, &indices, &PreviewConfig::default(), &EdgeTrimStitcher, None).unwrap();
        assert_eq!(stitched.len(), 3);
        assert_eq!(metrics.len(), 3);
        assert!(metrics.iter().all(PlotMetrics::has_finite_xaxis));
    }

    #[test]
    fn all_zero_association_has_no_optimal_range() {
        let spectrum = spectrum(2);
        let (_, metrics) =
            prepare(&spectrum, &[0, 1], &PreviewConfig::default(), &EdgeTrimStitcher, None).unwrap();
        assert!(metrics[0].has_finite_xaxis());
        assert!(!metrics[1].has_finite_xaxis());
    }

    #[test]
    fn external_results_must_match_selection() {
        let spectrum = spectrum(2);
        let external = ExternalResults {
            stitched: vec![StitchedSpectrum::default()],
            metrics: vec![PlotMetrics::unusable()],
        };
        let err = prepare(
            &spectrum,
            &[0, 1],
            &PreviewConfig::default(),
            &EdgeTrimStitcher,
            Some(&external),
        )
        .unwrap_err();
        assert!(matches!(err, PreviewError::Contract(_)));

        let (stitched, _) = prepare(
            &spectrum,
            &[0],
            &PreviewConfig::default(),
            &EdgeTrimStitcher,
            Some(&external),
        )
        .unwrap();
        assert_eq!(stitched, external.stitched);
    }

    #[test]
    fn missing_input_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = make_previews(
            &tmp.path().join("absent.fits"),
            &PreviewConfig::default(),
            &EdgeTrimStitcher,
            None,
        )
        .unwrap_err();
        assert!(!err.is_fatal_resource());
    }
}
