//! Atmospheric differential refraction
//!
//! The ADR curve is a cubic fit to a fixed calibration table of
//! (wavelength, offset) pairs, projected on the IFU x and y axes according to
//! the orientation angle.

use crate::{Error, Result};
use nalgebra as na;

/// Calibration wavelengths
pub const ADR_WAVELENGTHS: [f64; 5] = [3500., 4000., 4500., 5000., 5500.];
/// Calibration offsets at [ADR_WAVELENGTHS]
pub const ADR_OFFSETS: [f64; 5] = [-0.74, -0.4, -0.08, 0.08, 0.20];
const DEGREE: usize = 3;

/// Least-squares polynomial
///
/// The fit is done in the normalized variable `(x - mean) / std` to keep the
/// Vandermonde matrix well conditioned.
#[derive(Debug, Clone, PartialEq)]
pub struct Polynomial {
    coefficients: Vec<f64>,
    mean: f64,
    std: f64,
}
impl Polynomial {
    /// Fits a polynomial of the given degree to the samples
    pub fn fit(x: &[f64], y: &[f64], degree: usize) -> Result<Self> {
        let n = x.len() as f64;
        let mean = x.iter().sum::<f64>() / n;
        let std = (x.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n).sqrt();
        let std = if std > 0. { std } else { 1. };
        let vandermonde = na::DMatrix::from_fn(x.len(), degree + 1, |i, j| {
            ((x[i] - mean) / std).powi(j as i32)
        });
        let rhs = na::DVector::from_column_slice(y);
        let coefficients = vandermonde
            .svd(true, true)
            .solve(&rhs, 1e-12)
            .map_err(|e| Error::AdrFit(e.to_string()))?;
        Ok(Self {
            coefficients: coefficients.iter().cloned().collect(),
            mean,
            std,
        })
    }
    /// Evaluates the polynomial at `x`
    pub fn eval(&self, x: f64) -> f64 {
        let t = (x - self.mean) / self.std;
        self.coefficients
            .iter()
            .rev()
            .fold(0f64, |acc, c| acc * t + c)
    }
}

/// ADR offsets sampled on a wavelength grid
#[derive(Debug, Clone, PartialEq)]
pub struct Adr {
    angle: f64,
    x: Vec<f64>,
    y: Vec<f64>,
}
impl Adr {
    /// Computes the ADR curve on `wave` for an orientation `angle` in degrees
    ///
    /// `angle=0` is along the IFU x-direction.
    pub fn new(wave: &[f64], angle: f64) -> Result<Self> {
        let poly = Polynomial::fit(&ADR_WAVELENGTHS, &ADR_OFFSETS, DEGREE)?;
        log::debug!("ADR polynomial fitted at {angle}deg");
        let (sin, cos) = angle.to_radians().sin_cos();
        let (x, y) = wave
            .iter()
            .map(|&w| {
                let offset = poly.eval(w);
                (cos * offset, sin * offset)
            })
            .unzip();
        Ok(Self { angle, x, y })
    }
    /// Orientation angle in degrees
    pub fn angle(&self) -> f64 {
        self.angle
    }
    /// ADR offsets along x
    pub fn x(&self) -> &[f64] {
        &self.x
    }
    /// ADR offsets along y
    pub fn y(&self) -> &[f64] {
        &self.y
    }
    /// The (x,y) offset at wavelength index `i`
    pub fn offset(&self, i: usize) -> (f64, f64) {
        (self.x[i], self.y[i])
    }
    pub fn len(&self) -> usize {
        self.x.len()
    }
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::linspace;

    #[test]
    fn polynomial_exact_cubic() {
        let x: Vec<f64> = (0..6).map(|i| 1000. + 500. * i as f64).collect();
        let y: Vec<f64> = x
            .iter()
            .map(|x| {
                let t = x / 1000.;
                1. - 2. * t + 0.5 * t * t - 0.1 * t * t * t
            })
            .collect();
        let poly = Polynomial::fit(&x, &y, 3).unwrap();
        for (x, y) in x.iter().zip(&y) {
            assert!((poly.eval(*x) - y).abs() < 1e-9);
        }
    }

    #[test]
    fn adr_along_x() {
        let wave = linspace(3470., 5540., 1036);
        let adr = Adr::new(&wave, 0.).unwrap();
        assert_eq!(adr.len(), wave.len());
        assert!(adr.y().iter().all(|y| y.abs() < 1e-15));
        // the cubic passes near, not through, the calibration points
        let poly = Polynomial::fit(&ADR_WAVELENGTHS, &ADR_OFFSETS, 3).unwrap();
        for (w, o) in ADR_WAVELENGTHS.iter().zip(ADR_OFFSETS) {
            assert!((poly.eval(*w) - o).abs() < 0.05, "{w}: {} vs {o}", poly.eval(*w));
        }
        // blue is negative, red is positive
        assert!(adr.x()[0] < -0.6);
        assert!(adr.x()[1035] > 0.1);
        assert!(adr.x()[0] < adr.x()[500] && adr.x()[500] < adr.x()[1035]);
    }

    #[test]
    fn adr_rotated() {
        let wave = linspace(3470., 5540., 1036);
        let adr0 = Adr::new(&wave, 0.).unwrap();
        let adr90 = Adr::new(&wave, 90.).unwrap();
        for i in [0, 300, 1035] {
            assert!(adr90.x()[i].abs() < 1e-12);
            assert!((adr90.y()[i] - adr0.x()[i]).abs() < 1e-12);
        }
        assert_eq!(adr90.angle(), 90.);
    }
}
