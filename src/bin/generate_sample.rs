use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use spec_previews::data::loader::write_spectrum;
use spec_previews::data::model::{Association, Order, Spectrum};

/// Write a synthetic multi-association x1d file for trying out the previews.
#[derive(Parser, Debug)]
struct Args {
    /// Destination FITS file.
    #[arg(default_value = "sample_x1d.fits")]
    output: PathBuf,

    /// Number of associations; the second one has all-zero fluxes.
    #[arg(short, long, default_value_t = 5)]
    associations: usize,

    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

/// Continuum plus emission lines plus noise, with a ragged blue edge.
fn generate_order(
    wl0: f64,
    dispersion: f64,
    nelem: usize,
    lines: &[(f64, f64, f64)],
    rng: &mut SimpleRng,
) -> Result<Order> {
    let continuum = 2.0e-14;
    let noise = 1.5e-15;
    let wavelengths: Vec<f64> = (0..nelem).map(|i| wl0 + i as f64 * dispersion).collect();
    let fluxes: Vec<f64> = wavelengths
        .iter()
        .enumerate()
        .map(|(i, &wl)| {
            let signal: f64 = lines
                .iter()
                .map(|&(mu, sigma, amp)| gaussian(wl, mu, sigma, amp))
                .sum();
            // Detector edge: a handful of wild points.
            let edge = if i < 8 { 40.0 * continuum * rng.next_f64() } else { 0.0 };
            continuum + signal + edge + rng.gauss(0.0, noise)
        })
        .collect();
    let errors = vec![noise; nelem];
    let dqs: Vec<i32> = (0..nelem)
        .map(|i| if i % 97 == 13 { 16 } else { 0 })
        .collect();

    Order::new(Some(nelem), Some(wavelengths), Some(fluxes), Some(errors), Some(dqs))
        .context("building order")
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let mut rng = SimpleRng::new(args.seed);

    // Lyman-alpha airglow, N V, C IV.
    let lines = [
        (1215.67, 1.5, 3.0e-13),
        (1240.0, 2.0, 4.0e-14),
        (1549.0, 3.0, 6.0e-14),
    ];

    let mut associations = Vec::with_capacity(args.associations);
    for a in 0..args.associations {
        let orders = if a == 1 {
            vec![Order::zeroed(1024), Order::zeroed(1024)]
        } else {
            let scale = 1.0 + a as f64 * 0.25;
            let scaled: Vec<_> = lines.iter().map(|&(mu, s, amp)| (mu, s, amp * scale)).collect();
            vec![
                generate_order(1150.0, 0.3, 1024, &scaled, &mut rng)?,
                generate_order(1420.0, 0.3, 1024, &scaled, &mut rng)?,
            ]
        };
        associations.push(Association::new(orders).context("building association")?);
    }

    let spectrum = Spectrum::new(&args.output, associations).context("building spectrum")?;
    write_spectrum(&args.output, &spectrum)
        .with_context(|| format!("writing {}", args.output.display()))?;

    println!(
        "Wrote {} associations ({} orders each) to {}",
        spectrum.len(),
        spectrum.associations()[0].orders().len(),
        args.output.display()
    );
    Ok(())
}
