/*!
# Fiber spectral extraction

PSF-weighted extraction of point source spectra from fiber-fed integral field
spectrographs.

Given the calibrated spectra of the fibers around a source, the fiber
positions and a PSF model, the crate reconstructs
 - a rectified image of the source, collapsing the fiber spectra over a
 wavelength range in chunks corrected for the atmospheric differential
 refraction (ADR),
 - the flux calibrated spectrum of the source and its error, weighting each
 fiber by the fraction of the PSF it collects at each wavelength.

## Usage

```rust,no_run
use fiber_extract::{Extract, FiberSet, PsfImage, MOFFAT_ALPHA};
# fn main() -> anyhow::Result<()> {
# let fibers: FiberSet = unimplemented!();
let extract = Extract::builder().adr_angle(0.).build()?;
let psf = PsfImage::moffat(1.8, 10.5, 0.25, MOFFAT_ALPHA);
let weights = extract.build_weights(0., 0., &fibers.x, &fibers.y, &psf)?;
let spectrum = extract.get_spectrum(&fibers, &weights)?;
# Ok(())
# }
```
*/

use std::f64::consts::PI;

pub mod adr;
pub mod collapse;
pub mod convolution;
pub mod dither;
mod error;
mod extract;
mod fibers;
pub mod geometry;
pub mod interpolation;
pub mod psf;
pub mod spectrum;
pub mod stats;
pub mod weights;

pub use adr::Adr;
pub use collapse::CollapseConfig;
pub use dither::DitherPattern;
pub use error::{Error, Result};
pub use extract::{Extract, ExtractBuilder};
pub use fibers::FiberSet;
pub use interpolation::Interpolation;
pub use psf::{CurveOfGrowth, PsfImage, MOFFAT_ALPHA};
pub use spectrum::Spectrum;

/// Fiber radius
pub const FIBER_RADIUS: f64 = 0.75;

/// Fiber area
pub fn fiber_area() -> f64 {
    PI * FIBER_RADIUS * FIBER_RADIUS
}
