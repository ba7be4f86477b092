//! Preview rendering.
//!
//! ```text
//!   Spectrum + stitched + metrics
//!        │
//!        ▼
//!   PanelPlan per association ──► plotters bitmap (RGB buffer)
//!                                        │
//!                          ┌─────────────┴─────────────┐
//!                          ▼                           ▼
//!                    image encoder               eframe window
//!                 (atomic file write)         (blocks until closed)
//! ```

pub mod panel;
pub mod style;
pub mod viewer;

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbImage};
use log::{debug, info, warn};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::color::TITLE;
use crate::config::{OutputKind, PreviewConfig};
use crate::data::model::Spectrum;
use crate::error::{render_err, PreviewError, Result};
use crate::stitch::{OverlayPoint, PlotMetrics, StitchService, StitchedSpectrum};

use panel::{draw_panel, Panel, PanelPlan, ThumbnailFrame};
use style::{FontConfig, FontSize, PlotMode, StyleContext};

/// Everything drawn in one figure, aligned by subplot.
pub struct Figure<'a> {
    pub spectrum: &'a Spectrum,
    /// Indices into `spectrum.associations()` of the plotted associations.
    pub indices: &'a [usize],
    pub stitched: &'a [StitchedSpectrum],
    pub metrics: &'a [PlotMetrics],
}

impl Figure<'_> {
    fn check(&self) -> Result<()> {
        if self.indices.is_empty() {
            return Err(PreviewError::Contract("no associations selected".to_string()));
        }
        if self.stitched.len() != self.indices.len() || self.metrics.len() != self.indices.len() {
            return Err(PreviewError::Contract(format!(
                "{} associations selected but {} stitched spectra and {} metrics records",
                self.indices.len(),
                self.stitched.len(),
                self.metrics.len()
            )));
        }
        if let Some(&bad) = self.indices.iter().find(|&&i| i >= self.spectrum.len()) {
            return Err(PreviewError::Contract(format!(
                "association index {bad} out of range for {} associations",
                self.spectrum.len()
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Render one figure at `size` pixels and deliver it.
///
/// Returns the written path in file mode, `None` once the window is closed in
/// screen mode.
pub fn render_preview(
    figure: &Figure<'_>,
    config: &PreviewConfig,
    size: u32,
    service: &dyn StitchService,
) -> Result<Option<PathBuf>> {
    figure.check()?;

    // Fail on the directory before spending time on drawing.
    let destination = match config.output {
        OutputKind::File(format) => {
            let path = output_path_for(&config.output_file, size);
            if let Some(dir) = path.parent() {
                ensure_output_dir(dir)?;
            }
            Some((path, format))
        }
        OutputKind::Screen => None,
    };

    let rgb = draw_figure(figure, config, size, service)?;

    match destination {
        Some((path, format)) => {
            write_raster(&path, size, rgb, format)?;
            info!("wrote {}", path.display());
            Ok(Some(path))
        }
        None => {
            viewer::show(&figure.spectrum.file_name(), size, rgb)?;
            Ok(None)
        }
    }
}

/// Draw the whole figure into a `size`×`size` RGB buffer.
pub fn draw_figure(
    figure: &Figure<'_>,
    config: &PreviewConfig,
    size: u32,
    service: &dyn StitchService,
) -> Result<Vec<u8>> {
    figure.check()?;
    let mode = PlotMode::for_size(size);
    let debug_mode = config.style.debug;
    let mut ctx = StyleContext::new(config.dpi);

    let plans: Vec<PanelPlan> = figure
        .stitched
        .iter()
        .zip(figure.metrics)
        .map(|(s, m)| PanelPlan::build(s, m, mode, debug_mode))
        .collect();
    let overlays: Vec<Vec<OverlayPoint>> = figure
        .stitched
        .iter()
        .zip(figure.metrics)
        .zip(&plans)
        .map(|((s, m), plan)| {
            if debug_mode && !plan.is_degenerate() {
                service.debug_overlay(s, m, &config.trim)
            } else {
                Vec::new()
            }
        })
        .collect();

    let mut buffer = vec![0u8; size as usize * size as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (size, size)).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;

        let panels_area = match mode {
            PlotMode::BigPlot => {
                ctx.scoped(FontConfig::DEFAULT, |ctx| -> Result<()> {
                    let style = ctx
                        .font(FontSize::Points(18.0))
                        .color(&TITLE)
                        .pos(Pos::new(HPos::Center, VPos::Top));
                    root.draw(&Text::new(
                        figure.spectrum.file_name(),
                        (size as i32 / 2, StyleContext::frac(size, 0.01) as i32),
                        style,
                    ))
                    .map_err(render_err)
                })?;
                root.margin(
                    StyleContext::frac(size, 1.0 - 0.915),
                    StyleContext::frac(size, 0.02),
                    StyleContext::frac(size, 0.02),
                    StyleContext::frac(size, 0.1),
                )
            }
            // Each panel keeps `gap` below it and the y label band on its
            // left, so the figure bottom margin gives up one gap.
            PlotMode::Thumbnail => {
                let frame = ThumbnailFrame::new(size, plans.len());
                root.margin(frame.top, frame.bottom.saturating_sub(frame.gap), 0, frame.right)
            }
        };

        let areas = panels_area.split_evenly((plans.len(), 1));
        let total = figure.spectrum.len();
        for (i, area) in areas.iter().enumerate() {
            let plan = &plans[i];
            let position = (figure.indices[i] + 1, total);
            debug!("association {}/{}: {:?}", position.0, position.1, plan);
            if plan.is_degenerate() {
                warn!(
                    "association {}/{} of {} has no usable fluxes",
                    position.0,
                    position.1,
                    figure.spectrum.file_name()
                );
            }
            let panel = Panel {
                plan,
                stitched: &figure.stitched[i],
                overlay: &overlays[i],
                mode,
                full_ylabels: config.style.full_ylabels,
                position,
                subplots: plans.len(),
            };
            ctx.scoped(mode.font(), |ctx| draw_panel(&root, area, &panel, size, ctx))?;
        }

        root.present().map_err(render_err)?;
    }
    Ok(buffer)
}

// ---------------------------------------------------------------------------
// File output
// ---------------------------------------------------------------------------

/// `<dir>/<stem>_<SSSS>.<ext>` for a requested `<dir>/<stem>.<ext>`.
pub fn output_path_for(requested: &Path, size: u32) -> PathBuf {
    let stem = requested
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match requested.extension() {
        Some(ext) => format!("{stem}_{size:04}.{}", ext.to_string_lossy()),
        None => format!("{stem}_{size:04}"),
    };
    requested.with_file_name(name)
}

/// Create `dir` (and parents) unless it already exists.
pub fn ensure_output_dir(dir: &Path) -> Result<()> {
    if dir.as_os_str().is_empty() || dir.is_dir() {
        return Ok(());
    }
    debug!("creating output directory {}", dir.display());
    fs::create_dir_all(dir).map_err(|e| classify_dir_error(dir, e))
}

fn classify_dir_error(dir: &Path, err: io::Error) -> PreviewError {
    if err.kind() == io::ErrorKind::PermissionDenied {
        PreviewError::OutputDirPermission {
            dir: dir.to_path_buf(),
            source: err,
        }
    } else {
        PreviewError::Io(err)
    }
}

/// Encode `rgb` and move it into place only once fully written.
pub fn write_raster(path: &Path, size: u32, rgb: Vec<u8>, format: ImageFormat) -> Result<()> {
    let image = RgbImage::from_raw(size, size, rgb)
        .ok_or_else(|| PreviewError::Render(format!("buffer does not hold a {size}x{size} image")))?;

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::Builder::new()
        .prefix(".preview-")
        .tempfile_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        image.write_to(&mut writer, format)?;
        writer.flush()?;
    }
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
