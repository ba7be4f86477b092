use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::TRANSPARENT;

use super::style::{FontSize, PlotMode, StyleContext};
use crate::color::{rejection_color, CURVE, GRID, LIGHT_GREY, TITLE};
use crate::error::{render_err, Result};
use crate::stitch::{finite_range, OverlayPoint, PlotMetrics, StitchedSpectrum};

pub(crate) type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

pub const DEGENERATE_MESSAGE: &str = "Fluxes are all 0.";
pub const DEGENERATE_MESSAGE_WRAPPED: &str = "Fluxes are \n all 0.";

const X_LABEL: &str = "Wavelength (\u{c5})";
const Y_LABEL: &str = "Flux (erg/s/cm\u{b2}/\u{c5})";

/// Big-plot axis label and x tick label sizes.
const AXIS_LABEL_FONT: FontSize = FontSize::Points(16.0);
const TICK_FONT: FontSize = FontSize::Points(14.0);

/// Relative padding added around the data extent of a natural axis range.
const AXIS_MARGIN: f64 = 0.05;

// ---------------------------------------------------------------------------
// Panel plan
// ---------------------------------------------------------------------------

/// Everything about one subplot that does not depend on the drawing backend.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelPlan {
    /// There is something worth plotting.
    Valid {
        x_range: (f64, f64),
        y_range: (f64, f64),
        /// Wavelength spans shaded grey in debug mode.
        shaded: Vec<(f64, f64)>,
        overlay: bool,
    },
    /// No usable flux: grey panel with a centered message.
    Degenerate {
        x_range: (f64, f64),
        message: &'static str,
        message_size: FontSize,
    },
}

impl PanelPlan {
    /// Decide how to draw one association.
    ///
    /// A non-finite optimal x range always produces the degenerate panel,
    /// whether or not debug mode is on.
    pub fn build(
        stitched: &StitchedSpectrum,
        metrics: &PlotMetrics,
        mode: PlotMode,
        debug: bool,
    ) -> Self {
        if !metrics.has_finite_xaxis() {
            let x_range = stitched.finite_wavelength_range().unwrap_or((0.0, 1.0));
            let (message, message_size) = match mode {
                PlotMode::Thumbnail => (DEGENERATE_MESSAGE_WRAPPED, FontSize::Small),
                PlotMode::BigPlot => (DEGENERATE_MESSAGE, FontSize::XLarge),
            };
            return PanelPlan::Degenerate {
                x_range: nonsingular(x_range),
                message,
                message_size,
            };
        }

        let x_range = natural_range(&stitched.wls);
        let metric_y = metrics.y_axis_range;
        let y_range = if debug || !(metric_y.0.is_finite() && metric_y.1.is_finite()) {
            natural_range(&stitched.fls)
        } else {
            nonsingular(metric_y)
        };

        let shaded = if debug {
            let data = stitched.finite_wavelength_range().unwrap_or(x_range);
            shaded_spans(x_range, data, metrics)
        } else {
            Vec::new()
        };

        PanelPlan::Valid {
            x_range,
            y_range,
            shaded,
            overlay: debug,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        matches!(self, PanelPlan::Degenerate { .. })
    }

    pub fn x_range(&self) -> (f64, f64) {
        match self {
            PanelPlan::Valid { x_range, .. } | PanelPlan::Degenerate { x_range, .. } => *x_range,
        }
    }

    pub fn y_range(&self) -> (f64, f64) {
        match self {
            PanelPlan::Valid { y_range, .. } => *y_range,
            PanelPlan::Degenerate { .. } => (0.0, 1.0),
        }
    }

    pub fn background(&self) -> Option<RGBColor> {
        self.is_degenerate().then_some(LIGHT_GREY)
    }

    pub fn shows_grid(&self) -> bool {
        !self.is_degenerate()
    }

    pub fn shows_y_labels(&self) -> bool {
        !self.is_degenerate()
    }

    pub fn message(&self) -> Option<(&'static str, FontSize)> {
        match self {
            PanelPlan::Degenerate {
                message,
                message_size,
                ..
            } => Some((message, *message_size)),
            PanelPlan::Valid { .. } => None,
        }
    }
}

/// The two thumbnail x ticks: the minimum and maximum finite wavelength.
pub fn thumbnail_ticks(stitched: &StitchedSpectrum) -> Option<[(f64, String); 2]> {
    stitched
        .finite_wavelength_range()
        .map(|(lo, hi)| [(lo, format!("{lo:6.1}")), (hi, format!("{hi:6.1}"))])
}

/// Data extent padded by [`AXIS_MARGIN`] on both sides.
fn natural_range(values: &[f64]) -> (f64, f64) {
    match finite_range(values) {
        Some((lo, hi)) if hi > lo => {
            let pad = (hi - lo) * AXIS_MARGIN;
            (lo - pad, hi + pad)
        }
        Some(range) => nonsingular(range),
        None => (0.0, 1.0),
    }
}

/// Widen an empty or inverted range so the axis can be drawn.
fn nonsingular((lo, hi): (f64, f64)) -> (f64, f64) {
    if !(lo.is_finite() && hi.is_finite()) {
        return (0.0, 1.0);
    }
    let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
    if hi > lo {
        return (lo, hi);
    }
    let pad = if lo == 0.0 { 0.5 } else { lo.abs() * AXIS_MARGIN };
    (lo - pad, hi + pad)
}

/// Trimmed edges of the data plus avoid regions, clipped to the visible x range.
fn shaded_spans(
    x_range: (f64, f64),
    (data_lo, data_hi): (f64, f64),
    metrics: &PlotMetrics,
) -> Vec<(f64, f64)> {
    let (opt_lo, opt_hi) = metrics.optimal_xaxis_range;
    let mut spans = vec![(data_lo, opt_lo), (opt_hi, data_hi)];
    spans.extend(metrics.avoid_regions.iter().map(|r| (r.minwl, r.maxwl)));
    spans
        .into_iter()
        .filter_map(|(a, b)| {
            let lo = a.max(x_range.0);
            let hi = b.min(x_range.1);
            (hi > lo).then_some((lo, hi))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tick labels
// ---------------------------------------------------------------------------

/// Power of ten factored out of the y tick labels, 0 when none is needed.
pub fn offset_exponent((lo, hi): (f64, f64)) -> i32 {
    let magnitude = lo.abs().max(hi.abs());
    if !magnitude.is_finite() || magnitude == 0.0 {
        return 0;
    }
    let exp = magnitude.log10().floor() as i32;
    if (-3..=4).contains(&exp) {
        0
    } else {
        exp
    }
}

fn trim_float(v: f64, decimals: usize) -> String {
    let s = format!("{v:.decimals$}");
    if !s.contains('.') {
        return s;
    }
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

// ---------------------------------------------------------------------------
// Drawing
// ---------------------------------------------------------------------------

/// Inputs for drawing one subplot.
pub struct Panel<'a> {
    pub plan: &'a PanelPlan,
    pub stitched: &'a StitchedSpectrum,
    pub overlay: &'a [OverlayPoint],
    pub mode: PlotMode,
    pub full_ylabels: bool,
    /// 1-based association number and association count, shown on big plots.
    pub position: (usize, usize),
    /// Number of subplots stacked in the figure.
    pub subplots: usize,
}

/// Pixel layout of a subplot inside its area.
struct Layout {
    top: u32,
    bottom: u32,
    x_label_area: u32,
    y_label_area: u32,
}

impl Layout {
    fn new(mode: PlotMode, size: u32, panels: usize, ctx: &StyleContext) -> Self {
        match mode {
            PlotMode::BigPlot => Layout {
                top: ctx.px(FontSize::Small) + 8,
                bottom: ctx.px(FontSize::Base) / 2,
                x_label_area: ctx.px(TICK_FONT) + ctx.px(AXIS_LABEL_FONT) + 12,
                y_label_area: (ctx.px(AXIS_LABEL_FONT) + ctx.px(FontSize::Base) * 4 + 8)
                    .max(StyleContext::frac(size, 0.125)),
            },
            PlotMode::Thumbnail => {
                let frame = ThumbnailFrame::new(size, panels);
                Layout {
                    top: 0,
                    bottom: frame.gap,
                    x_label_area: 0,
                    y_label_area: frame.left,
                }
            }
        }
    }
}

/// Space between stacked thumbnail panels, relative to one panel's height.
const THUMBNAIL_HSPACE: f64 = 0.2;

/// Figure-level margins of a thumbnail, in pixels.
///
/// Tick labels live in these margins rather than inside each panel, so their
/// room does not shrink as panels are added. `gap` separates consecutive
/// panels and holds the rotated x tick labels of the panel above it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ThumbnailFrame {
    pub top: u32,
    pub bottom: u32,
    pub left: u32,
    pub right: u32,
    pub gap: u32,
}

impl ThumbnailFrame {
    pub(crate) fn new(size: u32, panels: usize) -> Self {
        let (top, bottom, left, right) = (0.85, 0.3, 0.25, 0.8);
        let n = panels.max(1) as f64;
        let height = size as f64 * (top - bottom);
        let panel_height = height / (n + (n - 1.0) * THUMBNAIL_HSPACE);
        ThumbnailFrame {
            top: StyleContext::frac(size, 1.0 - top),
            bottom: StyleContext::frac(size, bottom),
            left: StyleContext::frac(size, left),
            right: StyleContext::frac(size, 1.0 - right),
            gap: (panel_height * THUMBNAIL_HSPACE).round() as u32,
        }
    }
}

/// Draw one subplot into `area`. `root` is the whole figure, used for text
/// placed in absolute pixel coordinates.
pub(crate) fn draw_panel(
    root: &Area<'_>,
    area: &Area<'_>,
    panel: &Panel<'_>,
    figure_size: u32,
    ctx: &StyleContext,
) -> Result<()> {
    let plan = panel.plan;
    let layout = Layout::new(panel.mode, figure_size, panel.subplots, ctx);
    let (x_lo, x_hi) = plan.x_range();
    let (y_lo, y_hi) = plan.y_range();

    if panel.mode == PlotMode::BigPlot {
        draw_titles(area, panel, &layout, ctx)?;
    }

    let mut chart = ChartBuilder::on(area)
        .margin_top(layout.top)
        .margin_bottom(layout.bottom)
        .x_label_area_size(layout.x_label_area)
        .y_label_area_size(layout.y_label_area)
        .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)
        .map_err(render_err)?;

    if let Some(bg) = plan.background() {
        chart.plotting_area().fill(&bg).map_err(render_err)?;
    }

    let shows_y = plan.shows_y_labels();
    let full = panel.full_ylabels && panel.mode == PlotMode::BigPlot;
    let exponent = if shows_y && !full {
        offset_exponent((y_lo, y_hi))
    } else {
        0
    };
    let scale = 10f64.powi(exponent);
    let y_fmt = move |v: &f64| {
        if !shows_y {
            String::new()
        } else if full {
            format!("{v:.2E}")
        } else {
            trim_float(v / scale, 3)
        }
    };
    let x_fmt = |v: &f64| trim_float(*v, 1);

    {
        let mut mesh = chart.configure_mesh();
        mesh.x_label_formatter(&x_fmt)
            .y_label_formatter(&y_fmt)
            .y_labels(6)
            .label_style(ctx.font(FontSize::Base))
            .bold_line_style(GRID.mix(0.6))
            .light_line_style(TRANSPARENT);
        match panel.mode {
            PlotMode::BigPlot => {
                mesh.x_labels(8)
                    .x_label_style(ctx.font(TICK_FONT))
                    .x_desc(X_LABEL)
                    .y_desc(Y_LABEL)
                    .axis_desc_style(ctx.font(AXIS_LABEL_FONT));
            }
            // Two explicit ticks are drawn below.
            PlotMode::Thumbnail => {
                mesh.x_labels(0);
            }
        }
        if !plan.shows_grid() {
            mesh.disable_mesh();
        }
        mesh.draw().map_err(render_err)?;
    }

    match plan {
        PanelPlan::Valid {
            shaded, overlay, ..
        } => {
            for &(a, b) in shaded {
                chart
                    .draw_series(std::iter::once(Rectangle::new(
                        [(a, y_lo), (b, y_hi)],
                        LIGHT_GREY.mix(0.5).filled(),
                    )))
                    .map_err(render_err)?;
            }
            for segment in clip_segments(panel.stitched.curve_segments(), (y_lo, y_hi)) {
                chart
                    .draw_series(LineSeries::new(segment, CURVE.stroke_width(1)))
                    .map_err(render_err)?;
            }
            if *overlay {
                let visible = panel.overlay.iter().filter(|p| {
                    (x_lo..=x_hi).contains(&p.wl) && (y_lo..=y_hi).contains(&p.flux)
                });
                chart
                    .draw_series(visible.map(|p| {
                        Circle::new((p.wl, p.flux), 2, rejection_color(p.rejection).filled())
                    }))
                    .map_err(render_err)?;
            }
        }
        PanelPlan::Degenerate { .. } => {
            if let Some((message, size)) = plan.message() {
                let font = ctx.font(size).color(&BLACK).pos(Pos::new(HPos::Center, VPos::Center));
                let line_px = (ctx.px(size) as f64 * 1.2) as i32;
                let lines: Vec<&str> = message.split('\n').map(str::trim).collect();
                let first = -(line_px * (lines.len() as i32 - 1)) / 2;
                let center = ((x_lo + x_hi) / 2.0, (y_lo + y_hi) / 2.0);
                chart
                    .draw_series(lines.iter().enumerate().map(|(i, line)| {
                        EmptyElement::at(center)
                            + Text::new(line.to_string(), (0, first + i as i32 * line_px), font.clone())
                    }))
                    .map_err(render_err)?;
            }
        }
    }

    if exponent != 0 {
        let (px, py) = chart.backend_coord(&(x_lo, y_hi));
        let style = ctx
            .font(FontSize::Small)
            .color(&BLACK)
            .pos(Pos::new(HPos::Left, VPos::Bottom));
        root.draw(&Text::new(format!("1e{exponent}"), (px, py - 2), style))
            .map_err(render_err)?;
    }

    if panel.mode == PlotMode::Thumbnail {
        if let Some(ticks) = thumbnail_ticks(panel.stitched) {
            let style = ctx
                .font(FontSize::Base)
                .transform(FontTransform::Rotate90)
                .color(&BLACK);
            for (wl, label) in ticks {
                let (px, py) = chart.backend_coord(&(wl.clamp(x_lo, x_hi), y_lo));
                root.draw(&PathElement::new(vec![(px, py), (px, py + 4)], BLACK))
                    .map_err(render_err)?;
                root.draw(&Text::new(label.trim().to_string(), (px, py + 6), style.clone()))
                    .map_err(render_err)?;
            }
        }
    }

    Ok(())
}

fn draw_titles(area: &Area<'_>, panel: &Panel<'_>, layout: &Layout, ctx: &StyleContext) -> Result<()> {
    let (w, _) = area.dim_in_pixel();
    let plot_left = layout.y_label_area as i32;
    let plot_right = w as i32;

    let centered = ctx
        .font(FontSize::Small)
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Top));
    let (i, n) = panel.position;
    if n > 1 {
        area.draw(&Text::new(
            format!("Association {i}/{n}"),
            ((plot_left + plot_right) / 2, 2),
            centered,
        ))
        .map_err(render_err)?;
    }

    if !panel.stitched.title.is_empty() {
        let right = ctx
            .font(FontSize::Small)
            .color(&TITLE)
            .pos(Pos::new(HPos::Right, VPos::Top));
        area.draw(&Text::new(panel.stitched.title.clone(), (plot_right - 2, 2), right))
            .map_err(render_err)?;
    }
    Ok(())
}

/// Clip line segments to the visible flux range.
///
/// A line leaving the range ends at its crossing with `y_lo` or `y_hi`, and a
/// line coming back starts a new run at its re-entry crossing.
fn clip_segments(segments: Vec<Vec<(f64, f64)>>, (y_lo, y_hi): (f64, f64)) -> Vec<Vec<(f64, f64)>> {
    let mut out = Vec::new();
    let mut flush = |run: &mut Vec<(f64, f64)>| {
        if !run.is_empty() {
            out.push(std::mem::take(run));
        }
    };

    for segment in segments {
        if let [only] = segment[..] {
            if (y_lo..=y_hi).contains(&only.1) {
                flush(&mut vec![only]);
            }
            continue;
        }

        let mut current = Vec::new();
        for pair in segment.windows(2) {
            let (p, q) = (pair[0], pair[1]);
            let Some((t0, t1)) = visible_span(p, q, (y_lo, y_hi)) else {
                flush(&mut current);
                continue;
            };
            if t0 > 0.0 {
                flush(&mut current);
            }
            if current.is_empty() {
                current.push(lerp(p, q, t0));
            }
            current.push(lerp(p, q, t1));
            if t1 < 1.0 {
                flush(&mut current);
            }
        }
        flush(&mut current);
    }
    out
}

/// Parameter interval of the line `p -> q` with `y_lo <= y <= y_hi`.
fn visible_span(p: (f64, f64), q: (f64, f64), (y_lo, y_hi): (f64, f64)) -> Option<(f64, f64)> {
    if !p.1.is_finite() || !q.1.is_finite() {
        return None;
    }
    let dy = q.1 - p.1;
    if dy == 0.0 {
        return (y_lo..=y_hi).contains(&p.1).then_some((0.0, 1.0));
    }
    let (ta, tb) = ((y_lo - p.1) / dy, (y_hi - p.1) / dy);
    let t0 = ta.min(tb).max(0.0);
    let t1 = ta.max(tb).min(1.0);
    (t0 < t1).then_some((t0, t1))
}

fn lerp(p: (f64, f64), q: (f64, f64), t: f64) -> (f64, f64) {
    if t <= 0.0 {
        p
    } else if t >= 1.0 {
        q
    } else {
        (p.0 + t * (q.0 - p.0), p.1 + t * (q.1 - p.1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stitch::AvoidRegion;

    fn stitched(fls: Vec<f64>) -> StitchedSpectrum {
        let wls = (0..fls.len()).map(|i| 1000.0 + i as f64 * 10.0).collect();
        StitchedSpectrum {
            wls,
            flerrs: vec![0.1; fls.len()],
            dqs: vec![0; fls.len()],
            fls,
            title: String::new(),
        }
    }

    fn metrics(x: (f64, f64), y: (f64, f64)) -> PlotMetrics {
        PlotMetrics {
            optimal_xaxis_range: x,
            y_axis_range: y,
            median_flux: 1.0,
            median_fluxerr: 0.1,
            fluxerr_95th: 0.1,
            avoid_regions: vec![AvoidRegion {
                minwl: 1020.0,
                maxwl: 1030.0,
            }],
        }
    }

    #[test]
    fn valid_panel_uses_metric_y_range() {
        let s = stitched(vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        let plan = PanelPlan::build(&s, &metrics((1010.0, 1030.0), (0.5, 4.5)), PlotMode::BigPlot, false);
        assert!(!plan.is_degenerate());
        assert_eq!(plan.y_range(), (0.5, 4.5));
        let (lo, hi) = plan.x_range();
        assert!((lo - 998.0).abs() < 1e-9 && (hi - 1042.0).abs() < 1e-9);
        assert!(plan.background().is_none());
        assert!(plan.shows_grid() && plan.shows_y_labels());
        match plan {
            PanelPlan::Valid { shaded, overlay, .. } => {
                assert!(shaded.is_empty());
                assert!(!overlay);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn debug_panel_uses_natural_y_and_shades() {
        let s = stitched(vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        let plan = PanelPlan::build(&s, &metrics((1010.0, 1030.0), (0.5, 4.5)), PlotMode::BigPlot, true);
        let (lo, hi) = plan.y_range();
        assert!((lo - 0.8).abs() < 1e-9 && (hi - 5.2).abs() < 1e-9);
        match plan {
            PanelPlan::Valid { shaded, overlay, .. } => {
                assert!(overlay);
                let expected = [(1000.0, 1010.0), (1030.0, 1040.0), (1020.0, 1030.0)];
                assert_eq!(shaded.len(), expected.len());
                for ((a, b), (ea, eb)) in shaded.iter().zip(expected) {
                    assert!((a - ea).abs() < 1e-9 && (b - eb).abs() < 1e-9);
                }
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn non_finite_x_range_is_degenerate_in_both_modes() {
        let s = stitched(vec![0.0; 4]);
        let m = metrics((f64::NAN, f64::NAN), (f64::NAN, f64::NAN));

        let big = PanelPlan::build(&s, &m, PlotMode::BigPlot, false);
        assert_eq!(big.message(), Some((DEGENERATE_MESSAGE, FontSize::XLarge)));
        assert_eq!(big.x_range(), (1000.0, 1030.0));
        assert_eq!(big.background(), Some(LIGHT_GREY));
        assert!(!big.shows_grid() && !big.shows_y_labels());

        let thumb = PanelPlan::build(&s, &m, PlotMode::Thumbnail, false);
        assert_eq!(thumb.message(), Some((DEGENERATE_MESSAGE_WRAPPED, FontSize::Small)));
    }

    #[test]
    fn degenerate_overrides_debug() {
        let s = stitched(vec![0.0; 4]);
        let m = metrics((1000.0, f64::NAN), (0.0, 1.0));
        let plan = PanelPlan::build(&s, &m, PlotMode::BigPlot, true);
        assert!(plan.is_degenerate());
    }

    #[test]
    fn thumbnail_ticks_are_extremes() {
        let mut s = stitched(vec![1.0, 2.0, 3.0]);
        s.wls[1] = f64::NAN;
        let [(lo, lo_label), (hi, hi_label)] = thumbnail_ticks(&s).unwrap();
        assert_eq!((lo, hi), (1000.0, 1020.0));
        assert_eq!(lo_label, "1000.0");
        assert_eq!(hi_label, "1020.0");
    }

    #[test]
    fn offset_exponent_only_for_extreme_magnitudes() {
        assert_eq!(offset_exponent((0.0, 4.0e-14)), -14);
        assert_eq!(offset_exponent((0.0, 250.0)), 0);
        assert_eq!(offset_exponent((0.0, 0.0)), 0);
        assert_eq!(trim_float(1.500, 3), "1.5");
        assert_eq!(trim_float(-0.0001, 3), "0");
        assert_eq!(trim_float(1200.0, 1), "1200");
    }

    #[test]
    fn thumbnail_label_space_does_not_shrink_with_panels() {
        let one = ThumbnailFrame::new(128, 1);
        let three = ThumbnailFrame::new(128, 3);
        assert_eq!((three.top, three.bottom, three.left, three.right), (19, 38, 32, 26));
        assert_eq!((one.bottom, one.left), (three.bottom, three.left));

        // Three panels and two gaps fill the axes band between the margins.
        let band = 128 - three.top - three.bottom;
        let cell = (band + three.gap) / 3;
        assert_eq!(three.gap, 4);
        assert!((3 * (cell - three.gap) + 2 * three.gap).abs_diff(band) <= 3);
        assert!(one.gap > three.gap);
    }

    fn assert_runs(actual: Vec<Vec<(f64, f64)>>, expected: &[&[(f64, f64)]]) {
        assert_eq!(actual.len(), expected.len(), "{actual:?}");
        for (run, want) in actual.iter().zip(expected) {
            assert_eq!(run.len(), want.len(), "{actual:?}");
            for (&(x, y), &(ex, ey)) in run.iter().zip(want.iter()) {
                assert!((x - ex).abs() < 1e-9 && (y - ey).abs() < 1e-9, "{actual:?}");
            }
        }
    }

    #[test]
    fn segments_end_at_the_y_range_boundary() {
        let segs = vec![vec![(0.0, 1.0), (1.0, 9.0), (2.0, 2.0), (3.0, 3.0)]];
        assert_runs(
            clip_segments(segs, (0.0, 5.0)),
            &[
                &[(0.0, 1.0), (0.5, 5.0)],
                &[(1.0 + 4.0 / 7.0, 5.0), (2.0, 2.0), (3.0, 3.0)],
            ],
        );
    }

    #[test]
    fn zig_zag_keeps_every_in_range_piece() {
        let segs = vec![vec![(0.0, 1.0), (1.0, 9.0), (2.0, 1.0), (3.0, 9.0), (4.0, 1.0)]];
        let runs = clip_segments(segs, (0.0, 5.0));
        assert!(runs.iter().all(|r| r.len() >= 2), "{runs:?}");
        assert_runs(
            runs,
            &[
                &[(0.0, 1.0), (0.5, 5.0)],
                &[(1.5, 5.0), (2.0, 1.0), (2.5, 5.0)],
                &[(3.5, 5.0), (4.0, 1.0)],
            ],
        );
    }

    #[test]
    fn line_through_the_range_keeps_its_middle() {
        let segs = vec![vec![(0.0, 9.0), (1.0, -3.0)], vec![(5.0, 7.0), (6.0, 8.0)]];
        assert_runs(
            clip_segments(segs, (0.0, 5.0)),
            &[&[(1.0 / 3.0, 5.0), (0.75, 0.0)]],
        );
    }
}
