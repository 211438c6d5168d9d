/*!
# Point spread functions

A [PsfImage] is the PSF intensity sampled on a regular square grid together
with the grid x and y coordinates.
The builders ([tophat](PsfImage::tophat), [gaussian](PsfImage::gaussian),
[moffat](PsfImage::moffat)) sample the grid from `-boxsize/2` to
`boxsize/2` included with a pitch of `scale` and normalize the intensity to 1.
*/

use crate::{
    fiber_area, geometry::intersection_area, interpolation::ScatteredInterpolator,
    stats::arange, Result, FIBER_RADIUS,
};
use nalgebra::DMatrix;
use std::f64::consts::PI;

mod curve_of_growth;
mod profile;
pub use curve_of_growth::CurveOfGrowth;
pub use profile::{Gaussian2D, Moffat2D};

/// Default Moffat power index
pub const MOFFAT_ALPHA: f64 = 3.5;

/// Sampled PSF: intensity, x grid and y grid
///
/// All three matrices have the same shape, rows along y and columns along x.
#[derive(Debug, Clone, PartialEq)]
pub struct PsfImage {
    pub image: DMatrix<f64>,
    pub xgrid: DMatrix<f64>,
    pub ygrid: DMatrix<f64>,
}
impl PsfImage {
    /// Creates a PSF image from its 3 layers
    pub fn new(image: DMatrix<f64>, xgrid: DMatrix<f64>, ygrid: DMatrix<f64>) -> Self {
        Self {
            image,
            xgrid,
            ygrid,
        }
    }
    /// Samples `f(x,y)` on the grid `[-boxsize/2, boxsize/2]` with a pitch of `scale`
    pub fn sample<F>(boxsize: f64, scale: f64, f: F) -> Self
    where
        F: Fn(f64, f64) -> f64,
    {
        let x = arange(-boxsize / 2., boxsize / 2. + scale, scale);
        let y = x.clone();
        let xgrid = DMatrix::from_fn(y.len(), x.len(), |_, j| x[j]);
        let ygrid = DMatrix::from_fn(y.len(), x.len(), |i, _| y[i]);
        let image = xgrid.zip_map(&ygrid, f);
        Self::new(image, xgrid, ygrid)
    }
    /// Normalizes the intensity to a sum of 1
    pub fn normalize(mut self) -> Self {
        let sum = self.image.sum();
        self.image /= sum;
        self
    }
    /// Tophat PSF of given `radius` seen through fibers of radius `fibradius`
    ///
    /// The fiber overlap with the tophat disk is computed on rings around the
    /// tophat edge and the ring samples are linearly interpolated on the grid,
    /// the grid beyond the outermost ring is set to 0.
    pub fn tophat(radius: f64, boxsize: f64, scale: f64, fibradius: f64) -> Result<Self> {
        let t: Vec<f64> = crate::stats::linspace(0., 2. * PI, 360);
        let rings = arange(
            radius - fibradius,
            radius + fibradius * 7. / 6.,
            fibradius / 6.,
        );
        let fiber_area = PI * fibradius * fibradius;
        let (points, values): (Vec<[f64; 2]>, Vec<f64>) = rings
            .iter()
            .flat_map(|&ri| {
                let overlap = intersection_area(ri, radius, fibradius) / fiber_area;
                t.iter().map(move |&ti| {
                    let (sin, cos) = ti.sin_cos();
                    ([cos * ri, sin * ri], overlap)
                })
            })
            .unzip();
        let interp = ScatteredInterpolator::new(points, values)?;
        let psf = Self::sample(boxsize, scale, |x, y| interp.eval_or(x, y, 0.));
        Ok(psf.normalize())
    }
    /// Tophat PSF seen through the default fibers
    pub fn tophat_default_fiber(radius: f64, boxsize: f64, scale: f64) -> Result<Self> {
        Self::tophat(radius, boxsize, scale, FIBER_RADIUS)
    }
    /// Elliptical Gaussian PSF
    ///
    /// `xstd` and `ystd` are the standard deviations before the rotation by
    /// `theta` (radians, counterclockwise).
    pub fn gaussian(xstd: f64, ystd: f64, theta: f64, boxsize: f64, scale: f64) -> Self {
        let g = Gaussian2D::new(xstd, ystd, theta);
        Self::sample(boxsize, scale, |x, y| g.eval(x, y)).normalize()
    }
    /// Moffat PSF with the full width at half maximum `seeing` and the power index `alpha`
    pub fn moffat(seeing: f64, boxsize: f64, scale: f64, alpha: f64) -> Self {
        let m = Moffat2D::from_fwhm(seeing, alpha);
        Self::sample(boxsize, scale, |x, y| m.eval(x, y)).normalize()
    }
    /// Grid pitch inferred from the x grid
    pub fn scale(&self) -> f64 {
        (self.xgrid[(0, 1)] - self.xgrid[(0, 0)]).abs()
    }
    /// Grid (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        self.image.shape()
    }
    /// Maximum of the intensity
    pub fn peak(&self) -> f64 {
        self.image.max()
    }
    /// PSF intensity integrated over a fiber, per unit of PSF pixel
    pub fn fiber_to_pixel(&self) -> f64 {
        fiber_area() / self.scale().powi(2)
    }
    /// Returns the curve of growth of the PSF
    pub fn curve_of_growth(&self) -> CurveOfGrowth {
        CurveOfGrowth::new(self)
    }
}
