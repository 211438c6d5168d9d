use crate::{Error, Result};
use nalgebra::DMatrix;

/// Fiber positions and spectra
///
/// The spectra, their errors and the mask are `[fiber x wavelength]`
/// matrices; mask values close to zero flag bad samples.
#[derive(Debug, Clone, PartialEq)]
pub struct FiberSet {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub data: DMatrix<f64>,
    pub error: DMatrix<f64>,
    pub mask: DMatrix<f64>,
}
impl FiberSet {
    pub fn new(
        x: Vec<f64>,
        y: Vec<f64>,
        data: DMatrix<f64>,
        error: DMatrix<f64>,
        mask: DMatrix<f64>,
    ) -> Result<Self> {
        if y.len() != x.len() {
            return Err(Error::shape("fiber y positions", (x.len(), 1), (y.len(), 1)));
        }
        let expected = (x.len(), data.ncols());
        for (what, m) in [("fiber data", &data), ("fiber error", &error), ("fiber mask", &mask)]
        {
            if m.shape() != expected {
                return Err(Error::shape(what, expected, m.shape()));
            }
        }
        Ok(Self {
            x,
            y,
            data,
            error,
            mask,
        })
    }
    pub fn n_fiber(&self) -> usize {
        self.x.len()
    }
    pub fn n_wave(&self) -> usize {
        self.data.ncols()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_checks() {
        let m = DMatrix::<f64>::zeros(2, 5);
        let fibers = FiberSet::new(vec![0., 1.], vec![0., 1.], m.clone(), m.clone(), m.clone());
        assert!(fibers.is_ok());
        let fibers = fibers.unwrap();
        assert_eq!((fibers.n_fiber(), fibers.n_wave()), (2, 5));
        assert!(FiberSet::new(vec![0.], vec![0.], m.clone(), m.clone(), m.clone()).is_err());
        let bad = DMatrix::<f64>::zeros(2, 4);
        assert!(matches!(
            FiberSet::new(vec![0., 1.], vec![0., 1.], m.clone(), bad, m),
            Err(Error::Shape { what: "fiber error", .. })
        ));
    }
}
