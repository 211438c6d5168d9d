//! Weighted spectral extraction

use crate::{stats::median, Error, FiberSet, Result};
use itertools::izip;
use nalgebra::DMatrix;

/// Fraction of the median weight below which a wavelength is rejected
pub const WEIGHT_REJECTION: f64 = 0.1;

/// Extracted spectrum and its error
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Spectrum {
    pub flux: Vec<f64>,
    pub error: Vec<f64>,
}
impl Spectrum {
    /// Combines the fibers spectra according to the `[fiber x wavelength]` weights
    ///
    /// At each wavelength:
    /// ```text
    /// flux  = Σ(data·mask·weight) / Σ(mask·weight²)
    /// error = sqrt(Σ(error²·mask·weight)) / Σ(mask·weight²)
    /// ```
    /// Wavelengths where `Σ(mask·weight²)` is less than a tenth of its median
    /// over all the wavelengths are set to NaN.
    pub fn new(
        data: &DMatrix<f64>,
        error: &DMatrix<f64>,
        mask: &DMatrix<f64>,
        weights: &DMatrix<f64>,
    ) -> Result<Self> {
        let expected = data.shape();
        for (what, m) in [
            ("fiber error", error),
            ("fiber mask", mask),
            ("extraction weights", weights),
        ] {
            if m.shape() != expected {
                return Err(Error::shape(what, expected, m.shape()));
            }
        }
        let (mut flux, mut spectrum_error, w): (Vec<f64>, Vec<f64>, Vec<f64>) = izip!(
            data.column_iter(),
            error.column_iter(),
            mask.column_iter(),
            weights.column_iter()
        )
        .map(|(d, e, m, w)| {
            let (num, var, norm) = izip!(d.iter(), e.iter(), m.iter(), w.iter()).fold(
                (0f64, 0f64, 0f64),
                |(num, var, norm), (d, e, m, w)| {
                    (num + d * m * w, var + e * e * m * w, norm + m * w * w)
                },
            );
            (num / norm, var.sqrt() / norm, norm)
        })
        .fold(
            (vec![], vec![], vec![]),
            |(mut flux, mut error, mut w), (f, e, n)| {
                flux.push(f);
                error.push(e);
                w.push(n);
                (flux, error, w)
            },
        );
        if let Some(median_w) = median(&w) {
            let threshold = median_w * WEIGHT_REJECTION;
            izip!(flux.iter_mut(), spectrum_error.iter_mut(), &w)
                .filter(|(_, _, w)| **w < threshold)
                .for_each(|(f, e, _)| {
                    *f = f64::NAN;
                    *e = f64::NAN;
                });
        }
        Ok(Self {
            flux,
            error: spectrum_error,
        })
    }
    /// Extracts the spectrum of a [FiberSet]
    pub fn from_fibers(fibers: &FiberSet, weights: &DMatrix<f64>) -> Result<Self> {
        Self::new(&fibers.data, &fibers.error, &fibers.mask, weights)
    }
    pub fn len(&self) -> usize {
        self.flux.len()
    }
    pub fn is_empty(&self) -> bool {
        self.flux.is_empty()
    }
    /// Number of valid (non NaN) wavelengths
    pub fn n_valid(&self) -> usize {
        self.flux.iter().filter(|f| !f.is_nan()).count()
    }
}
