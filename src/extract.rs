use crate::{
    collapse, geometry, spectrum::Spectrum, stats::linspace, weights, Adr, CollapseConfig,
    CurveOfGrowth, DitherPattern, Error, FiberSet, PsfImage, Result,
};
use nalgebra::DMatrix;

/// Extraction session
///
/// Holds the wavelength grid, the ADR curve on that grid and the dither
/// pattern. A session is immutable; changing the ADR angle or the dither
/// pattern returns a new session.
#[derive(Debug, Clone, PartialEq)]
pub struct Extract {
    wave: Vec<f64>,
    adr: Adr,
    dither_pattern: DitherPattern,
}

/// [Extract] builder
#[derive(Debug, Clone)]
pub struct ExtractBuilder {
    wave: Option<Vec<f64>>,
    adr_angle: f64,
    dither_pattern: DitherPattern,
}
impl Default for ExtractBuilder {
    fn default() -> Self {
        Self {
            wave: None,
            adr_angle: 0f64,
            dither_pattern: DitherPattern::default(),
        }
    }
}
impl ExtractBuilder {
    /// Sets the wavelength grid, [Extract::default_wave] otherwise
    pub fn wave(self, wave: Vec<f64>) -> Self {
        Self {
            wave: Some(wave),
            ..self
        }
    }
    /// Sets the ADR orientation angle in degrees, 0 is along the IFU x axis
    pub fn adr_angle(self, adr_angle: f64) -> Self {
        Self { adr_angle, ..self }
    }
    /// Replaces the default dither pattern
    pub fn dither_pattern(self, dither_pattern: impl Into<DitherPattern>) -> Self {
        Self {
            dither_pattern: dither_pattern.into(),
            ..self
        }
    }
    pub fn build(self) -> Result<Extract> {
        let wave = self.wave.unwrap_or_else(Extract::default_wave);
        let adr = Adr::new(&wave, self.adr_angle)?;
        log::info!(
            "extraction session: {} wavelengths in [{:.1},{:.1}], ADR angle {}deg, {} exposures",
            wave.len(),
            wave.first().copied().unwrap_or(f64::NAN),
            wave.last().copied().unwrap_or(f64::NAN),
            self.adr_angle,
            self.dither_pattern.n_exposure()
        );
        Ok(Extract {
            wave,
            adr,
            dither_pattern: self.dither_pattern,
        })
    }
}

impl Extract {
    pub fn builder() -> ExtractBuilder {
        Default::default()
    }
    /// Session with the default wavelength grid, ADR angle and dither pattern
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }
    /// Default wavelength grid: 1036 wavelengths from 3470 to 5540
    pub fn default_wave() -> Vec<f64> {
        linspace(3470., 5540., 1036)
    }
    pub fn wave(&self) -> &[f64] {
        &self.wave
    }
    pub fn adr(&self) -> &Adr {
        &self.adr
    }
    pub fn dither_pattern(&self) -> &DitherPattern {
        &self.dither_pattern
    }
    /// Returns a session with the ADR computed for a new orientation `angle` in degrees
    pub fn with_adr_angle(self, angle: f64) -> Result<Self> {
        let adr = Adr::new(&self.wave, angle)?;
        Ok(Self { adr, ..self })
    }
    /// Returns a session with a new dither pattern
    pub fn with_dither_pattern(self, dither_pattern: impl Into<DitherPattern>) -> Self {
        Self {
            dither_pattern: dither_pattern.into(),
            ..self
        }
    }
    /// Area of intersection of two circles of radii `big_r` and `r` with centers `d` apart
    pub fn intersection_area(d: f64, big_r: f64, r: f64) -> f64 {
        geometry::intersection_area(d, big_r, r)
    }
    /// Tophat PSF, see [PsfImage::tophat]
    pub fn tophat_psf(
        &self,
        radius: f64,
        boxsize: f64,
        scale: f64,
        fibradius: f64,
    ) -> Result<PsfImage> {
        PsfImage::tophat(radius, boxsize, scale, fibradius)
    }
    /// Gaussian PSF, see [PsfImage::gaussian]
    pub fn gaussian_psf(
        &self,
        xstd: f64,
        ystd: f64,
        theta: f64,
        boxsize: f64,
        scale: f64,
    ) -> PsfImage {
        PsfImage::gaussian(xstd, ystd, theta, boxsize, scale)
    }
    /// Moffat PSF, see [PsfImage::moffat]
    pub fn moffat_psf(&self, seeing: f64, boxsize: f64, scale: f64, alpha: f64) -> PsfImage {
        PsfImage::moffat(seeing, boxsize, scale, alpha)
    }
    /// Curve of growth of a PSF
    pub fn psf_curve_of_growth(&self, psf: &PsfImage) -> CurveOfGrowth {
        psf.curve_of_growth()
    }
    /// Collapsed image of the fibers centered on `(xc,yc)`, see [collapse::make_collapsed_image]
    pub fn make_collapsed_image(
        &self,
        xc: f64,
        yc: f64,
        fibers: &FiberSet,
        config: &CollapseConfig,
    ) -> Result<PsfImage> {
        collapse::make_collapsed_image(xc, yc, fibers, &self.wave, &self.adr, config)
    }
    /// Extraction weights, see [weights::build_weights]
    pub fn build_weights(
        &self,
        xc: f64,
        yc: f64,
        ifux: &[f64],
        ifuy: &[f64],
        psf: &PsfImage,
    ) -> Result<DMatrix<f64>> {
        weights::build_weights(xc, yc, ifux, ifuy, psf, &self.adr)
    }
    /// Weighted spectral extraction, see [Spectrum::new]
    pub fn get_spectrum(&self, fibers: &FiberSet, weights: &DMatrix<f64>) -> Result<Spectrum> {
        if fibers.n_wave() != self.wave.len() {
            return Err(Error::shape(
                "fiber data",
                (fibers.n_fiber(), self.wave.len()),
                fibers.data.shape(),
            ));
        }
        Spectrum::from_fibers(fibers, weights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{adr::ADR_OFFSETS, MOFFAT_ALPHA};

    #[test]
    fn default_session() {
        let extract = Extract::new().unwrap();
        assert_eq!(extract.wave().len(), 1036);
        assert_eq!(extract.wave()[0], 3470.);
        assert_eq!(extract.wave()[1035], 5540.);
        assert_eq!(extract.adr().len(), 1036);
        assert_eq!(extract.adr().angle(), 0.);
        assert_eq!(extract.dither_pattern(), &DitherPattern::default());
        // blue end near the first calibration offset, red end near the last one
        assert!((extract.adr().x()[0] - ADR_OFFSETS[0]).abs() < 0.05);
        assert!((extract.adr().x()[1035] - ADR_OFFSETS[4]).abs() < 0.05);
    }

    #[test]
    fn rebuild() {
        let extract = Extract::new().unwrap();
        let x0 = extract.adr().x()[10];
        let extract = extract
            .with_adr_angle(90.)
            .unwrap()
            .with_dither_pattern(vec![[0., 0.], [0.5, 0.5]]);
        assert_eq!(extract.adr().angle(), 90.);
        assert!((extract.adr().y()[10] - x0).abs() < 1e-12);
        assert_eq!(extract.dither_pattern().n_exposure(), 2);
    }

    #[test]
    fn custom_wave() {
        let wave = linspace(3600., 5400., 100);
        let extract = Extract::builder().wave(wave).adr_angle(30.).build().unwrap();
        assert_eq!(extract.adr().len(), 100);
        let (dx, dy) = extract.adr().offset(0);
        assert!((dy / dx - 30f64.to_radians().tan()).abs() < 1e-12);
    }

    // point source observed with the default dither pattern
    #[test]
    fn end_to_end() {
        let extract = Extract::new().unwrap();
        let n_wave = extract.wave().len();
        let (ifux, ifuy): (Vec<f64>, Vec<f64>) = (-3i32..=3)
            .flat_map(|row| {
                (-3i32..=3).map(move |col| {
                    (
                        1.5 * (col as f64 + 0.5 * row.rem_euclid(2) as f64),
                        1.5 * 3f64.sqrt() / 2. * row as f64,
                    )
                })
            })
            .unzip();
        let (x, y) = extract.dither_pattern().apply(&ifux, &ifuy);
        let (xs, ys) = (0.6, 0.2);
        let seeing = 1.8;

        // fiber fluxes from a finely sampled PSF
        let truth = PsfImage::moffat(seeing, 12., 0.05, MOFFAT_ALPHA);
        let true_weights = extract.build_weights(xs, ys, &x, &y, &truth).unwrap();
        let flux: Vec<f64> = extract
            .wave()
            .iter()
            .map(|w| 100. + 0.01 * (w - 3470.))
            .collect();
        let data = DMatrix::from_fn(x.len(), n_wave, |f, i| true_weights[(f, i)] * flux[i]);
        let error = data.map(|d| d.abs().sqrt() + 1.);
        let mask = DMatrix::from_element(x.len(), n_wave, 1.);
        let fibers = FiberSet::new(x.clone(), y.clone(), data, error, mask).unwrap();

        let psf = extract.moffat_psf(seeing, 10.5, 0.25, MOFFAT_ALPHA);
        let weights = extract.build_weights(xs, ys, &x, &y, &psf).unwrap();
        let spectrum = extract.get_spectrum(&fibers, &weights).unwrap();
        assert_eq!(spectrum.len(), n_wave);
        assert_eq!(spectrum.n_valid(), n_wave);
        for i in (0..n_wave).step_by(97) {
            let ratio = spectrum.flux[i] / flux[i];
            assert!((ratio - 1.).abs() < 0.05, "#{i}: {ratio}");
            assert!(spectrum.error[i] > 0.);
        }

        let image = extract
            .make_collapsed_image(xs, ys, &fibers, &CollapseConfig::default())
            .unwrap();
        assert!(image.image.max() > 0.);
        assert!(image.image.iter().all(|v| v.is_finite()));
    }
}
