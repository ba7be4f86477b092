use log::debug;

use super::{
    finite_range, AvoidRegion, OverlayPoint, PlotMetrics, Rejection, StitchService,
    StitchedSpectrum, TrimParams,
};
use crate::data::model::Association;
use crate::error::Result;

/// Geocoronal Lyman-alpha airglow, in Angstroms.
const LYMAN_ALPHA: AvoidRegion = AvoidRegion {
    minwl: 1214.0,
    maxwl: 1217.0,
};

/// Fractional padding added around the flux range.
const Y_PADDING: f64 = 0.1;

/// Built-in stitcher: wavelength-sorted concatenation of orders, plus metrics
/// that trim noisy spectrum edges by comparing each point with the median.
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeTrimStitcher;

impl StitchService for EdgeTrimStitcher {
    fn stitch(&self, association: &Association) -> Result<StitchedSpectrum> {
        let orders = association.orders();
        let mut points: Vec<(f64, f64, f64, i32)> = orders
            .iter()
            .flat_map(|o| {
                o.wavelengths()
                    .iter()
                    .zip(o.fluxes())
                    .zip(o.fluxerrs())
                    .zip(o.dqs())
                    .map(|(((&wl, &fl), &err), &dq)| (wl, fl, err, dq))
            })
            .collect();
        // Stable, so overlapping orders keep their file order; bad wavelengths go last.
        points.sort_by(|a, b| sort_key(a.0).total_cmp(&sort_key(b.0)));

        let title = if orders.len() > 1 {
            format!("{} orders stitched", orders.len())
        } else {
            String::new()
        };

        let mut stitched = StitchedSpectrum {
            title,
            ..Default::default()
        };
        for (wl, fl, err, dq) in points {
            stitched.wls.push(wl);
            stitched.fls.push(fl);
            stitched.flerrs.push(err);
            stitched.dqs.push(dq);
        }
        Ok(stitched)
    }

    fn plot_metrics(&self, stitched: &StitchedSpectrum, params: &TrimParams) -> PlotMetrics {
        let n = stitched.wls.len();
        let usable: Vec<bool> = (0..n).map(|i| is_usable(stitched, i)).collect();

        let mut abs_fluxes: Vec<f64> = Vec::new();
        let mut errs: Vec<f64> = Vec::new();
        for i in (0..n).filter(|&i| usable[i]) {
            abs_fluxes.push(stitched.fls[i].abs());
            errs.push(stitched.flerrs[i]);
        }
        if abs_fluxes.is_empty() {
            debug!("no usable points out of {n}");
            return PlotMetrics::unusable();
        }
        abs_fluxes.sort_by(f64::total_cmp);
        errs.sort_by(f64::total_cmp);

        let median_flux = percentile(&abs_fluxes, 50.0);
        let median_fluxerr = percentile(&errs, 50.0);
        let fluxerr_95th = percentile(&errs, 95.0);

        let passes: Vec<bool> = (0..n)
            .map(|i| {
                usable[i]
                    && stitched.fls[i].abs() <= params.flux_scale_factor * median_flux
                    && stitched.flerrs[i] <= params.fluxerr_scale_factor * median_fluxerr
            })
            .collect();

        let window = params.n_consecutive.clamp(1, n.max(1));
        let Some((first, last)) = trimmed_bounds(&passes, window) else {
            debug!("no run of {window} consecutive good points");
            return PlotMetrics {
                median_flux,
                median_fluxerr,
                fluxerr_95th,
                ..PlotMetrics::unusable()
            };
        };
        let optimal_xaxis_range = (stitched.wls[first], stitched.wls[last]);

        let avoid_regions: Vec<AvoidRegion> = finite_range(&stitched.wls)
            .filter(|&(lo, hi)| lo < LYMAN_ALPHA.maxwl && hi > LYMAN_ALPHA.minwl)
            .map(|_| vec![LYMAN_ALPHA])
            .unwrap_or_default();

        let in_window = |i: usize| usable[i] && (first..=last).contains(&i);
        let outside_avoid = |i: usize| {
            let wl = stitched.wls[i];
            !avoid_regions
                .iter()
                .any(|ar| wl >= ar.minwl && wl <= ar.maxwl)
        };
        let window_fluxes: Vec<f64> = (0..n)
            .filter(|&i| in_window(i) && outside_avoid(i))
            .map(|i| stitched.fls[i])
            .collect();
        let y_source: Vec<f64> = if window_fluxes.is_empty() {
            (0..n).filter(|&i| in_window(i)).map(|i| stitched.fls[i]).collect()
        } else {
            window_fluxes
        };
        let y_axis_range = finite_range(&y_source)
            .map(padded)
            .unwrap_or((f64::NAN, f64::NAN));

        PlotMetrics {
            optimal_xaxis_range,
            y_axis_range,
            median_flux,
            median_fluxerr,
            fluxerr_95th,
            avoid_regions,
        }
    }

    fn debug_overlay(
        &self,
        stitched: &StitchedSpectrum,
        metrics: &PlotMetrics,
        params: &TrimParams,
    ) -> Vec<OverlayPoint> {
        (0..stitched.wls.len())
            .filter(|&i| stitched.wls[i].is_finite() && stitched.fls[i].is_finite())
            .map(|i| {
                let flux = stitched.fls[i];
                let err = stitched.flerrs[i];
                let rejection = if stitched.dqs[i] != 0 {
                    Rejection::DataQuality
                } else if flux == 0.0 || !err.is_finite() {
                    Rejection::ZeroOrInvalid
                } else if flux.abs() > params.flux_scale_factor * metrics.median_flux {
                    Rejection::FluxRatio
                } else if err > params.fluxerr_scale_factor * metrics.median_fluxerr {
                    Rejection::FluxErrRatio
                } else {
                    Rejection::Kept
                };
                OverlayPoint {
                    wl: stitched.wls[i],
                    flux,
                    rejection,
                }
            })
            .collect()
    }
}

fn sort_key(wl: f64) -> f64 {
    if wl.is_finite() {
        wl
    } else {
        f64::INFINITY
    }
}

fn is_usable(s: &StitchedSpectrum, i: usize) -> bool {
    s.wls[i].is_finite()
        && s.fls[i].is_finite()
        && s.flerrs[i].is_finite()
        && s.fls[i] != 0.0
        && s.dqs[i] == 0
}

/// First index of the first run and last index of the last run of at least
/// `window` consecutive `true` values.
fn trimmed_bounds(passes: &[bool], window: usize) -> Option<(usize, usize)> {
    let mut first = None;
    let mut last = None;
    let mut run = 0;
    for (i, &ok) in passes.iter().enumerate() {
        run = if ok { run + 1 } else { 0 };
        if run >= window {
            first.get_or_insert(i + 1 - window);
            last = Some(i);
        }
    }
    Some((first?, last?))
}

/// Linear-interpolated percentile of an ascending, non-empty slice.
fn percentile(sorted: &[f64], q: f64) -> f64 {
    let pos = q / 100.0 * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

fn padded((lo, hi): (f64, f64)) -> (f64, f64) {
    let span = hi - lo;
    let pad = if span > 0.0 {
        span * Y_PADDING
    } else {
        hi.abs().max(f64::MIN_POSITIVE) * Y_PADDING
    };
    (lo - pad, hi + pad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Order;

    fn stitched(wls: Vec<f64>, fls: Vec<f64>) -> StitchedSpectrum {
        let n = wls.len();
        StitchedSpectrum {
            wls,
            fls,
            flerrs: vec![0.1; n],
            dqs: vec![0; n],
            title: String::new(),
        }
    }

    fn ramp(n: usize, start: f64) -> Vec<f64> {
        (0..n).map(|i| start + i as f64).collect()
    }

    #[test]
    fn stitch_sorts_orders_by_wavelength() {
        let high = Order::new(Some(2), Some(vec![3.0, 4.0]), Some(vec![30.0, 40.0]), None, None).unwrap();
        let low = Order::new(Some(2), Some(vec![1.0, 2.0]), Some(vec![10.0, 20.0]), None, Some(vec![0, 8])).unwrap();
        let assoc = Association::new(vec![high, low]).unwrap();

        let s = EdgeTrimStitcher.stitch(&assoc).unwrap();
        assert_eq!(s.wls, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(s.fls, vec![10.0, 20.0, 30.0, 40.0]);
        assert_eq!(s.dqs, vec![0, 8, 0, 0]);
        assert_eq!(s.title, "2 orders stitched");
    }

    #[test]
    fn single_order_has_no_title() {
        let assoc = Association::new(vec![Order::zeroed(3)]).unwrap();
        assert!(EdgeTrimStitcher.stitch(&assoc).unwrap().title.is_empty());
    }

    #[test]
    fn all_zero_flux_is_unusable() {
        let s = stitched(ramp(50, 2000.0), vec![0.0; 50]);
        let m = EdgeTrimStitcher.plot_metrics(&s, &TrimParams::default());
        assert!(!m.has_finite_xaxis());
        assert!(m.optimal_xaxis_range.0.is_nan());
    }

    #[test]
    fn noisy_edges_are_trimmed() {
        let mut fls = vec![1.0; 100];
        for f in fls.iter_mut().take(5) {
            *f = 50.0;
        }
        fls[97] = -80.0;
        let s = stitched(ramp(100, 3000.0), fls);
        let m = EdgeTrimStitcher.plot_metrics(&s, &TrimParams::default());

        assert_eq!(m.optimal_xaxis_range, (3005.0, 3096.0));
        assert_eq!(m.median_flux, 1.0);
        assert!((m.median_fluxerr - 0.1).abs() < 1e-12);
        assert!(m.avoid_regions.is_empty());
        // Flat flux of 1.0 padded by 10% of its magnitude.
        assert!((m.y_axis_range.0 - 0.9).abs() < 1e-12);
        assert!((m.y_axis_range.1 - 1.1).abs() < 1e-12);
    }

    #[test]
    fn short_spectrum_clamps_window() {
        let s = stitched(ramp(5, 1.0), vec![2.0; 5]);
        let m = EdgeTrimStitcher.plot_metrics(&s, &TrimParams::default());
        assert_eq!(m.optimal_xaxis_range, (1.0, 5.0));
    }

    #[test]
    fn lyman_alpha_is_avoided_in_y_range() {
        let wls = ramp(40, 1200.0);
        let fls: Vec<f64> = wls
            .iter()
            .map(|&wl| if (1214.0..=1217.0).contains(&wl) { 9.0 } else { 1.0 + (wl - 1200.0) * 0.01 })
            .collect();
        let s = stitched(wls, fls);
        let m = EdgeTrimStitcher.plot_metrics(&s, &TrimParams::default());

        assert_eq!(m.avoid_regions, vec![LYMAN_ALPHA]);
        assert!(m.has_finite_xaxis());
        assert!(m.y_axis_range.1 < 9.0);
    }

    #[test]
    fn percentiles_interpolate() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&v, 50.0), 2.5);
        assert_eq!(percentile(&v, 100.0), 4.0);
        assert!((percentile(&v, 95.0) - 3.85).abs() < 1e-12);
        assert_eq!(percentile(&[7.0], 95.0), 7.0);
    }

    #[test]
    fn trimmed_bounds_needs_a_full_run() {
        let p = [true, true, false, true, true, true, false, true, true, true];
        assert_eq!(trimmed_bounds(&p, 3), Some((3, 9)));
        assert_eq!(trimmed_bounds(&p, 4), None);
    }

    #[test]
    fn overlay_tags_each_criterion() {
        let mut s = stitched(ramp(6, 1.0), vec![1.0, 1.0, 0.0, 100.0, 1.0, f64::NAN]);
        s.dqs[1] = 16;
        s.flerrs[4] = 10.0;
        let params = TrimParams::default();
        let m = EdgeTrimStitcher.plot_metrics(&s, &params);
        let overlay = EdgeTrimStitcher.debug_overlay(&s, &m, &params);

        let tags: Vec<Rejection> = overlay.iter().map(|p| p.rejection).collect();
        assert_eq!(
            tags,
            vec![
                Rejection::Kept,
                Rejection::DataQuality,
                Rejection::ZeroOrInvalid,
                Rejection::FluxRatio,
                Rejection::FluxErrRatio,
            ]
        );
    }
}
