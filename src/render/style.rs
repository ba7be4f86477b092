use plotters::style::{FontDesc, IntoFont};

use crate::config::THUMBNAIL_MAX_SIZE;

/// Layout policy chosen from the requested pixel size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotMode {
    /// Diagnostic view: titles, axis labels, full tick set.
    BigPlot,
    /// Small preview: no titles, two x ticks, tight margins.
    Thumbnail,
}

impl PlotMode {
    pub fn for_size(size: u32) -> Self {
        if size > THUMBNAIL_MAX_SIZE {
            PlotMode::BigPlot
        } else {
            PlotMode::Thumbnail
        }
    }

    /// Font configuration the mode renders with.
    pub fn font(self) -> FontConfig {
        match self {
            PlotMode::BigPlot => FontConfig::DEFAULT,
            PlotMode::Thumbnail => FontConfig::THUMBNAIL,
        }
    }
}

/// Text sizes, relative to the active base size unless given in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FontSize {
    Base,
    Small,
    XLarge,
    Points(f64),
}

/// Font settings shared by everything drawn inside one styling branch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontConfig {
    pub family: &'static str,
    pub base_pt: f64,
}

impl FontConfig {
    pub const DEFAULT: FontConfig = FontConfig {
        family: "sans-serif",
        base_pt: 12.0,
    };

    pub const THUMBNAIL: FontConfig = FontConfig {
        family: "sans-serif",
        base_pt: 10.0,
    };
}

/// Explicit replacement for a process-wide font setting.
///
/// A configuration is pushed for the duration of a closure and popped when it
/// returns, so nothing leaks from one styling branch (or render call) into the
/// next.
#[derive(Debug)]
pub struct StyleContext {
    dpi: f64,
    stack: Vec<FontConfig>,
}

impl StyleContext {
    pub fn new(dpi: f64) -> Self {
        Self {
            dpi,
            stack: Vec::new(),
        }
    }

    /// Active configuration: the innermost pushed one, or the defaults.
    pub fn current(&self) -> FontConfig {
        self.stack.last().copied().unwrap_or(FontConfig::DEFAULT)
    }

    /// Number of configurations currently pushed.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Run `f` with `font` active.
    pub fn scoped<R>(&mut self, font: FontConfig, f: impl FnOnce(&StyleContext) -> R) -> R {
        self.stack.push(font);
        let out = f(self);
        self.stack.pop();
        out
    }

    /// Size in points after resolving relative sizes.
    pub fn points(&self, size: FontSize) -> f64 {
        let base = self.current().base_pt;
        match size {
            FontSize::Base => base,
            FontSize::Small => base * 0.833,
            FontSize::XLarge => base * 1.44,
            FontSize::Points(pt) => pt,
        }
    }

    /// Size in device pixels.
    pub fn px(&self, size: FontSize) -> u32 {
        pt_to_px(self.points(size), self.dpi)
    }

    pub fn font(&self, size: FontSize) -> FontDesc<'static> {
        (self.current().family, self.px(size) as f64).into_font()
    }

    /// Fraction of `size` pixels, rounded.
    pub fn frac(size: u32, fraction: f64) -> u32 {
        (size as f64 * fraction).round() as u32
    }
}

fn pt_to_px(pt: f64, dpi: f64) -> u32 {
    (pt * dpi / 72.0).round().max(1.0) as u32
}
