//! Collapsed images
//!
//! The fiber spectra are collapsed over a wavelength range into an image
//! rectified on a regular grid. The wavelength range is divided in chunks, in
//! each chunk the fiber positions are corrected for the ADR at the chunk
//! central wavelength and the median over the chunks of the interpolated
//! images gives the collapsed image.

use crate::{
    convolution::{convolve, gaussian_kernel},
    fiber_area,
    interpolation::{Interpolation, ScatteredInterpolator},
    stats::{array_split, linspace, masked_median, median},
    Adr, Error, FiberSet, PsfImage, Result,
};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

/// Mask values below this are bad samples
pub const MASK_THRESHOLD: f64 = 1e-8;

/// Collapsed image parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollapseConfig {
    /// Pixel scale of the collapsed image
    pub scale: f64,
    /// 2.35 x the radius of the Gaussian smoothing kernel, in the units of the
    /// fiber positions
    pub seeing_fac: f64,
    /// Side length of the collapsed image
    pub boxsize: f64,
    /// Wavelength range `(low, high]`
    pub wrange: (f64, f64),
    /// Number of wavelength chunks used to correct for the ADR
    pub nchunks: usize,
    /// Smooth the image with a Gaussian kernel of FWHM `seeing_fac`
    pub convolve_image: bool,
    /// Interpolation of the fiber values on the image grid
    pub interp_kind: Interpolation,
}
impl Default for CollapseConfig {
    fn default() -> Self {
        Self {
            scale: 0.25,
            seeing_fac: 1.8,
            boxsize: 4.,
            wrange: (3470., 5540.),
            nchunks: 11,
            convolve_image: false,
            interp_kind: Interpolation::Linear,
        }
    }
}
impl CollapseConfig {
    pub fn scale(self, scale: f64) -> Self {
        Self { scale, ..self }
    }
    pub fn seeing_fac(self, seeing_fac: f64) -> Self {
        Self { seeing_fac, ..self }
    }
    pub fn boxsize(self, boxsize: f64) -> Self {
        Self { boxsize, ..self }
    }
    pub fn wrange(self, low: f64, high: f64) -> Self {
        Self {
            wrange: (low, high),
            ..self
        }
    }
    pub fn nchunks(self, nchunks: usize) -> Self {
        Self { nchunks, ..self }
    }
    pub fn convolve_image(self, convolve_image: bool) -> Self {
        Self {
            convolve_image,
            ..self
        }
    }
    /// Sets the interpolation kind: "linear" or "cubic"
    ///
    /// Any other kind is replaced by "linear" with a warning.
    pub fn interp_kind(self, kind: &str) -> Self {
        Self {
            interp_kind: Interpolation::from_kind(kind),
            ..self
        }
    }
}

/// Collapses the fiber spectra into an image centered on `(xc,yc)`
///
/// The image coordinates of the returned [PsfImage] are relative to `(xc,yc)`.
pub fn make_collapsed_image(
    xc: f64,
    yc: f64,
    fibers: &FiberSet,
    wave: &[f64],
    adr: &Adr,
    config: &CollapseConfig,
) -> Result<PsfImage> {
    if fibers.n_wave() != wave.len() {
        return Err(Error::shape(
            "fiber data",
            (fibers.n_fiber(), wave.len()),
            fibers.data.shape(),
        ));
    }
    let &CollapseConfig {
        scale,
        seeing_fac,
        boxsize,
        wrange,
        nchunks,
        convolve_image,
        interp_kind,
    } = config;

    let n = (boxsize / scale) as usize;
    let x = linspace(xc - boxsize / 2., xc + boxsize / 2., n);
    let y = linspace(yc - boxsize / 2., yc + boxsize / 2., n);
    let xgrid = DMatrix::from_fn(n, n, |_, j| x[j]);
    let ygrid = DMatrix::from_fn(n, n, |i, _| y[i]);

    let sel: Vec<usize> = wave
        .iter()
        .enumerate()
        .filter_map(|(i, w)| (*w > wrange.0 && *w <= wrange.1).then_some(i))
        .collect();
    let kernel = convolve_image.then(|| gaussian_kernel(seeing_fac / scale / 2.35));
    let pixel_to_fiber = scale * scale / fiber_area();

    let mut images = vec![];
    for (k, chunk) in array_split(sel.len(), nchunks).into_iter().enumerate() {
        let idx = &sel[chunk];
        if idx.is_empty() {
            log::warn!("wavelength chunk #{k} is empty, skipping it");
            continue;
        }
        // truncated mean index
        let ichunk = (idx.iter().sum::<usize>() as f64 / idx.len() as f64) as usize;
        let (dx, dy) = adr.offset(ichunk);

        let fiber_median: Vec<Option<f64>> = (0..fibers.n_fiber())
            .map(|f| {
                masked_median(
                    idx.iter()
                        .map(|&i| (fibers.data[(f, i)], fibers.mask[(f, i)] < MASK_THRESHOLD)),
                )
            })
            .collect();
        let total: f64 = fiber_median.iter().flatten().sum();
        let (points, values): (Vec<[f64; 2]>, Vec<f64>) = fiber_median
            .iter()
            .enumerate()
            .filter_map(|(f, v)| {
                v.map(|v| {
                    (
                        [fibers.x[f] - dx, fibers.y[f] - dy],
                        pixel_to_fiber * v / total,
                    )
                })
            })
            .unzip();
        let interp = ScatteredInterpolator::new(points, values)?.kind(interp_kind);
        let grid_z = xgrid.zip_map(&ygrid, |x, y| interp.eval_or(x, y, f64::NAN));
        images.push(match &kernel {
            Some(kernel) => convolve(&grid_z, kernel),
            None => grid_z,
        });
    }
    log::info!(
        "collapsed {} wavelengths in {} chunks",
        sel.len(),
        images.len()
    );

    let image = DMatrix::from_fn(n, n, |i, j| {
        let values: Vec<f64> = images.iter().map(|image| image[(i, j)]).collect();
        match median(&values) {
            Some(v) if !v.is_nan() => v,
            _ => 0f64,
        }
    });
    Ok(PsfImage::new(
        image,
        xgrid.add_scalar(-xc),
        ygrid.add_scalar(-yc),
    ))
}
