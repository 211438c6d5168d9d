//! Dither pattern
//!
//! The (x,y) offsets applied to the IFU for each exposure of an observation.

use serde::{Deserialize, Serialize};
use std::ops::Deref;

/// Ordered (x,y) offsets, one per exposure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DitherPattern(Vec<[f64; 2]>);
impl Default for DitherPattern {
    /// The 3-point pattern `[[0,0],[1.27,-0.73],[1.27,0.73]]`
    fn default() -> Self {
        Self(vec![[0., 0.], [1.27, -0.73], [1.27, 0.73]])
    }
}
impl Deref for DitherPattern {
    type Target = [[f64; 2]];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
impl From<Vec<[f64; 2]>> for DitherPattern {
    fn from(offsets: Vec<[f64; 2]>) -> Self {
        Self(offsets)
    }
}
impl DitherPattern {
    /// Number of exposures
    pub fn n_exposure(&self) -> usize {
        self.0.len()
    }
    /// Returns the fiber positions of all the exposures
    ///
    /// The positions are ordered exposure after exposure, each exposure being
    /// the IFU positions `(ifux, ifuy)` shifted by the exposure offset.
    pub fn apply(&self, ifux: &[f64], ifuy: &[f64]) -> (Vec<f64>, Vec<f64>) {
        self.0
            .iter()
            .flat_map(|[dx, dy]| {
                ifux.iter()
                    .zip(ifuy)
                    .map(move |(x, y)| (x + dx, y + dy))
            })
            .unzip()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_pattern() {
        let dither = DitherPattern::default();
        assert_eq!(dither.n_exposure(), 3);
        assert_eq!(dither[1], [1.27, -0.73]);
    }

    #[test]
    fn dithered_positions() {
        let dither = DitherPattern::default();
        let (x, y) = dither.apply(&[0., 1.], &[0., 2.]);
        assert_eq!(x.len(), 6);
        assert_eq!((x[3], y[3]), (2.27, 1.27));
        assert_eq!((x[4], y[4]), (1.27, 0.73));
    }
}
