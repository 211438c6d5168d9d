//! Extraction weights
//!
//! The weight of a fiber at a given wavelength is the fraction of the PSF
//! collected by the fiber once its position is corrected for the ADR at that
//! wavelength.

use crate::{interpolation::ScatteredInterpolator, Adr, Error, PsfImage, Result};
use nalgebra::DMatrix;

/// Returns the `[fiber x wavelength]` weights of the fibers at `(ifux,ifuy)`
/// for a source at `(xc,yc)`
///
/// The PSF is linearly interpolated at the fiber positions and scaled by the
/// ratio of the fiber area to the PSF pixel area; fibers outside the PSF
/// grid get a weight of 0.
pub fn build_weights(
    xc: f64,
    yc: f64,
    ifux: &[f64],
    ifuy: &[f64],
    psf: &PsfImage,
    adr: &Adr,
) -> Result<DMatrix<f64>> {
    if ifuy.len() != ifux.len() {
        return Err(Error::shape(
            "fiber y positions",
            (ifux.len(), 1),
            (ifuy.len(), 1),
        ));
    }
    let interp = ScatteredInterpolator::new(
        psf.xgrid
            .iter()
            .zip(psf.ygrid.iter())
            .map(|(x, y)| [*x, *y])
            .collect(),
        psf.image.iter().cloned().collect(),
    )?;
    let fiber_to_pixel = psf.fiber_to_pixel();
    log::debug!(
        "building weights for {} fibers x {} wavelengths",
        ifux.len(),
        adr.len()
    );
    Ok(DMatrix::from_fn(ifux.len(), adr.len(), |f, i| {
        let (dx, dy) = adr.offset(i);
        interp.eval_or(ifux[f] - dx - xc, ifuy[f] - dy - yc, 0.) * fiber_to_pixel
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{fiber_area, stats::linspace};

    #[test]
    fn fiber_at_psf_center() {
        let wave = linspace(3470., 5540., 1036);
        let adr = Adr::new(&wave, 0.).unwrap();
        let psf = PsfImage::gaussian(0.8, 0.8, 0., 6., 0.25);
        let (xc, yc) = (0.3, -0.2);
        let i = 700;
        let (dx, dy) = adr.offset(i);
        let ifux = vec![xc + dx, 10., xc + dx + 0.5];
        let ifuy = vec![yc + dy, 0., yc + dy];
        let weights = build_weights(xc, yc, &ifux, &ifuy, &psf, &adr).unwrap();
        assert_eq!(weights.shape(), (3, 1036));
        let expected = psf.peak() * fiber_area() / 0.25f64.powi(2);
        assert!((weights[(0, i)] - expected).abs() < 1e-9 * expected);
        assert!(weights.row(1).iter().all(|w| *w == 0.));
        assert!(weights.iter().all(|w| *w >= 0.));
        assert!(weights[(2, i)] < weights[(0, i)]);
    }

    #[test]
    fn adr_moves_the_weights() {
        let wave = linspace(3470., 5540., 1036);
        let adr = Adr::new(&wave, 0.).unwrap();
        let psf = PsfImage::moffat(1.5, 6., 0.25, 3.5);
        let weights = build_weights(0., 0., &[-0.7, 0.2], &[0., 0.], &psf, &adr).unwrap();
        // the source drifts from x<0 in the blue to x>0 in the red
        assert!(weights[(0, 0)] > weights[(0, 1035)]);
        assert!(weights[(1, 0)] < weights[(1, 1035)]);
    }
}
