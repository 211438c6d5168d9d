//! Closed-form 2D profiles

/// Elliptical Gaussian of unit amplitude centered at the origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gaussian2D {
    a: f64,
    b: f64,
    c: f64,
}
impl Gaussian2D {
    /// Gaussian with standard deviations `xstd` and `ystd` before rotating by
    /// `theta` (radians, counterclockwise)
    pub fn new(xstd: f64, ystd: f64, theta: f64) -> Self {
        let (sin, cos) = theta.sin_cos();
        let (xstd2, ystd2) = (xstd * xstd, ystd * ystd);
        let sin2t = (2. * theta).sin();
        Self {
            a: 0.5 * (cos * cos / xstd2 + sin * sin / ystd2),
            b: 0.5 * (sin2t / xstd2 - sin2t / ystd2),
            c: 0.5 * (sin * sin / xstd2 + cos * cos / ystd2),
        }
    }
    pub fn eval(&self, x: f64, y: f64) -> f64 {
        (-(self.a * x * x + self.b * x * y + self.c * y * y)).exp()
    }
}

/// Radially symmetric Moffat profile of unit amplitude centered at the origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Moffat2D {
    gamma: f64,
    alpha: f64,
}
impl Moffat2D {
    pub fn new(gamma: f64, alpha: f64) -> Self {
        Self { gamma, alpha }
    }
    /// Moffat profile with the given full width at half maximum
    pub fn from_fwhm(fwhm: f64, alpha: f64) -> Self {
        Self {
            gamma: 0.5 * fwhm / (2f64.powf(1. / alpha) - 1.).sqrt(),
            alpha,
        }
    }
    pub fn gamma(&self) -> f64 {
        self.gamma
    }
    pub fn eval(&self, x: f64, y: f64) -> f64 {
        (1. + (x * x + y * y) / (self.gamma * self.gamma)).powf(-self.alpha)
    }
}
