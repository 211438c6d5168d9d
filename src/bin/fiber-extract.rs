use fiber_extract::{
    CollapseConfig, Extract, FiberSet, Interpolation, PsfImage, Spectrum, FIBER_RADIUS,
    MOFFAT_ALPHA,
};
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use nalgebra::DMatrix;
use rayon::prelude::*;
use serde::Serialize;
use std::{f64::consts::PI, path::PathBuf};
use strum_macros::EnumString;
use structopt::StructOpt;

#[derive(Debug, Clone, Copy, EnumString)]
#[strum(serialize_all = "lowercase")]
enum Model {
    Moffat,
    Gaussian,
    Tophat,
}

#[derive(Debug, StructOpt)]
#[structopt(
    name = "fiber-extract",
    about = "PSF-weighted extraction of point sources observed with a dithered fiber IFU"
)]
struct Opt {
    /// Seeing FWHM of the sources
    #[structopt(long, default_value = "1.8")]
    seeing: f64,
    /// ADR orientation angle [deg]
    #[structopt(short, long, default_value = "0")]
    angle: f64,
    /// Extraction PSF model: moffat, gaussian or tophat
    #[structopt(short, long, default_value = "moffat")]
    model: Model,
    /// Number of sources extracted in parallel
    #[structopt(short, long, default_value = "4")]
    n_source: usize,
    /// Collapse the fibers into images of the sources
    #[structopt(long)]
    image: bool,
    /// Number of wavelength chunks of the collapsed images
    #[structopt(long, default_value = "11")]
    nchunks: usize,
    /// Interpolation of the collapsed images: linear or cubic
    #[structopt(long, default_value = "linear")]
    interp: String,
    /// Smooth the collapsed images
    #[structopt(long)]
    convolve: bool,
    /// Extracted spectra CSV file
    #[structopt(short, long, default_value = "spectra.csv", parse(from_os_str))]
    output: PathBuf,
}

#[derive(Serialize)]
struct Record {
    source: usize,
    x: f64,
    y: f64,
    wavelength: f64,
    flux: f64,
    error: f64,
    true_flux: f64,
}

struct Extraction {
    source: usize,
    xy: (f64, f64),
    true_flux: Vec<f64>,
    spectrum: Spectrum,
    image_peak: Option<f64>,
}

/// Hexagonal IFU with fibers 1.5 apart
fn ifu(n_ring: i32) -> (Vec<f64>, Vec<f64>) {
    (-n_ring..=n_ring)
        .flat_map(|row| {
            (-n_ring..=n_ring).map(move |col| {
                (
                    2. * FIBER_RADIUS * (col as f64 + 0.5 * row.rem_euclid(2) as f64),
                    2. * FIBER_RADIUS * 3f64.sqrt() / 2. * row as f64,
                )
            })
        })
        .unzip()
}

/// Simulates the fibers spectra of a source at `(xs,ys)`
fn observe(
    extract: &Extract,
    xs: f64,
    ys: f64,
    seeing: f64,
) -> anyhow::Result<(FiberSet, Vec<f64>)> {
    let (ifux, ifuy) = ifu(5);
    let (x, y) = extract.dither_pattern().apply(&ifux, &ifuy);
    let truth = PsfImage::moffat(seeing, 12., 0.05, MOFFAT_ALPHA);
    let true_weights = extract.build_weights(xs, ys, &x, &y, &truth)?;
    // continuum with an emission line
    let true_flux: Vec<f64> = extract
        .wave()
        .iter()
        .map(|w| 50. + 0.01 * (w - 3470.) + 200. * (-0.5 * ((w - 5007.) / 4.).powi(2)).exp())
        .collect();
    let n_wave = true_flux.len();
    let data = DMatrix::from_fn(x.len(), n_wave, |f, i| {
        let phase = (f * 31 + i * 17) as f64;
        true_weights[(f, i)] * true_flux[i] + 0.5 * phase.sin()
    });
    let error = data.map(|d| (d.abs() + 1.).sqrt());
    let mask = DMatrix::from_fn(x.len(), n_wave, |f, i| {
        // a dead fiber and a bad column
        if f == 7 || i == 500 {
            0.
        } else {
            1.
        }
    });
    Ok((FiberSet::new(x, y, data, error, mask)?, true_flux))
}

fn psf_model(extract: &Extract, model: Model, seeing: f64) -> anyhow::Result<PsfImage> {
    let (boxsize, scale) = (10.5, 0.25);
    Ok(match model {
        Model::Moffat => extract.moffat_psf(seeing, boxsize, scale, MOFFAT_ALPHA),
        Model::Gaussian => {
            let std = seeing / (8. * 2f64.ln()).sqrt();
            extract.gaussian_psf(std, std, 0., boxsize, scale)
        }
        Model::Tophat => extract.tophat_psf(seeing / 2., boxsize, scale, FIBER_RADIUS)?,
    })
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opt = Opt::from_args();

    let extract = Extract::builder().adr_angle(opt.angle).build()?;
    let psf = psf_model(&extract, opt.model, opt.seeing)?;
    let cog = extract.psf_curve_of_growth(&psf);
    println!(
        "{:?} PSF: {:?} samples, 50% of the flux within {:.2}, 90% within {:.2}",
        opt.model,
        psf.shape(),
        cog.radius_at(0.5).unwrap_or(f64::NAN),
        cog.radius_at(0.9).unwrap_or(f64::NAN)
    );
    let config = CollapseConfig::default()
        .nchunks(opt.nchunks)
        .convolve_image(opt.convolve)
        .interp_kind(&opt.interp);
    if config.interp_kind != Interpolation::Linear {
        log::info!("collapsing with {} interpolation", config.interp_kind);
    }

    let sources: Vec<(usize, (f64, f64))> = (0..opt.n_source)
        .map(|k| {
            let o = 2. * PI * k as f64 / opt.n_source.max(1) as f64;
            (k, (1.5 * o.cos(), 1.5 * o.sin()))
        })
        .collect();

    let pb = ProgressBar::new(sources.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
            )?
            .progress_chars("#>-"),
    );
    let extractions = sources
        .into_par_iter()
        .progress_with(pb)
        .map(|(source, (xs, ys))| -> anyhow::Result<Extraction> {
            let (fibers, true_flux) = observe(&extract, xs, ys, opt.seeing)?;
            let weights = extract.build_weights(xs, ys, &fibers.x, &fibers.y, &psf)?;
            let spectrum = extract.get_spectrum(&fibers, &weights)?;
            let image_peak = if opt.image {
                let image = extract.make_collapsed_image(xs, ys, &fibers, &config)?;
                Some(image.image.max())
            } else {
                None
            };
            Ok(Extraction {
                source,
                xy: (xs, ys),
                true_flux,
                spectrum,
                image_peak,
            })
        })
        .collect::<anyhow::Result<Vec<Extraction>>>()?;

    let mut wtr = csv::Writer::from_path(&opt.output)?;
    for e in &extractions {
        let ratio: Vec<f64> = e
            .spectrum
            .flux
            .iter()
            .zip(&e.true_flux)
            .filter(|(f, _)| !f.is_nan())
            .map(|(f, t)| f / t)
            .collect();
        let mean_ratio = ratio.iter().sum::<f64>() / ratio.len() as f64;
        println!(
            "source #{} at ({:+.2},{:+.2}): {}/{} valid wavelengths, extracted/true flux: {:.4}{}",
            e.source,
            e.xy.0,
            e.xy.1,
            e.spectrum.n_valid(),
            e.spectrum.len(),
            mean_ratio,
            e.image_peak
                .map(|p| format!(", image peak: {p:.4}"))
                .unwrap_or_default()
        );
        for (i, wavelength) in extract.wave().iter().enumerate() {
            wtr.serialize(Record {
                source: e.source,
                x: e.xy.0,
                y: e.xy.1,
                wavelength: *wavelength,
                flux: e.spectrum.flux[i],
                error: e.spectrum.error[i],
                true_flux: e.true_flux[i],
            })?;
        }
    }
    wtr.flush()?;
    println!("spectra written to {:?}", opt.output);
    Ok(())
}
