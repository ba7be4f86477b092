use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;

use spec_previews::config::{OutputKind, PreviewConfig, StyleFlags};
use spec_previews::error::{PreviewError, ERROR_PREFIX};
use spec_previews::make_previews;
use spec_previews::stitch::{EdgeTrimStitcher, ExternalResults, TrimParams};

/// Create preview plots of HST/STIS 1D spectra.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// x1d/sx1 FITS file to preview.
    input: PathBuf,

    /// Output path; `_<size>` is inserted before the extension.
    /// Defaults to the input name with the output type's extension.
    #[arg(short, long)]
    output_file: Option<PathBuf>,

    /// `screen`, or a raster format such as `png` or `jpeg`.
    #[arg(short = 't', long, default_value = "png")]
    output_type: String,

    /// Edge lengths in pixels; sizes above 128 get the full layout.
    #[arg(short, long, num_args = 1.., default_values_t = [128u32, 1024])]
    sizes: Vec<u32>,

    #[arg(long, default_value_t = spec_previews::config::DEFAULT_DPI)]
    dpi: f64,

    /// Max ratio between a flux and the median flux for edge trimming.
    #[arg(long, default_value_t = 10.0)]
    flux_scale_factor: f64,

    /// Max ratio between a flux error and the median flux error.
    #[arg(long, default_value_t = 5.0)]
    fluxerr_scale_factor: f64,

    /// Consecutive good points that mark the start and end of the spectrum.
    #[arg(long, default_value_t = 20)]
    n_consecutive: usize,

    /// Overlay rejection markers and shade ignored wavelengths.
    #[arg(long)]
    debug: bool,

    /// Full `1.23E-14` style y tick labels on big plots.
    #[arg(long)]
    full_ylabels: bool,

    /// JSON file with precomputed stitched spectra and plot metrics.
    #[arg(long)]
    stitched: Option<PathBuf>,
}

impl Args {
    fn into_config(self) -> Result<(PathBuf, PreviewConfig, Option<PathBuf>)> {
        let output: OutputKind = self
            .output_type
            .parse()
            .with_context(|| format!("invalid --output-type '{}'", self.output_type))?;
        let output_file = match (self.output_file, output) {
            (Some(path), _) => path,
            (None, kind) => self.input.with_extension(kind.to_string()),
        };
        let config = PreviewConfig {
            output,
            output_file,
            sizes: self.sizes,
            dpi: self.dpi,
            trim: TrimParams {
                n_consecutive: self.n_consecutive,
                flux_scale_factor: self.flux_scale_factor,
                fluxerr_scale_factor: self.fluxerr_scale_factor,
            },
            style: StyleFlags {
                debug: self.debug,
                full_ylabels: self.full_ylabels,
            },
        };
        Ok((self.input, config, self.stitched))
    }
}

fn run(args: Args) -> Result<()> {
    let (input, config, stitched) = args.into_config()?;
    log::debug!("configuration: {config:?}");

    let external = stitched
        .as_deref()
        .map(|path| {
            ExternalResults::read(path)
                .with_context(|| format!("reading stitched results from {}", path.display()))
        })
        .transpose()?;

    let written = make_previews(&input, &config, &EdgeTrimStitcher, external.as_ref())
        .with_context(|| format!("making previews of {}", input.display()))?;
    for path in &written {
        println!("{}", path.display());
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    if let Err(err) = run(Args::parse()) {
        match err.downcast_ref::<PreviewError>() {
            Some(preview) if preview.is_fatal_resource() => eprintln!("{}", preview.diagnostic()),
            _ => eprintln!("{ERROR_PREFIX} {err:#}"),
        }
        std::process::exit(1);
    }
}
