use super::PsfImage;

/// Enclosed flux fraction versus radius
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurveOfGrowth {
    /// Radius sorted in ascending order, duplicates included
    pub radius: Vec<f64>,
    /// Normalized cumulative flux at each radius
    pub cog: Vec<f64>,
}
impl CurveOfGrowth {
    /// Computes the curve of growth of `psf`
    ///
    /// Only the grid samples within the largest x coordinate of the grid are
    /// used, so the curve ends at 1 at that radius.
    pub fn new(psf: &PsfImage) -> Self {
        let mut samples: Vec<(f64, f64)> = psf
            .xgrid
            .iter()
            .zip(psf.ygrid.iter())
            .zip(psf.image.iter())
            .map(|((x, y), v)| (x.hypot(*y), *v))
            .collect();
        samples.sort_by(|a, b| a.0.total_cmp(&b.0));
        let maxr = psf.xgrid.max();
        samples.retain(|(r, _)| *r <= maxr);
        let total: f64 = samples.iter().map(|(_, v)| v).sum();
        let (radius, cog) = samples
            .into_iter()
            .scan(0f64, |cumsum, (r, v)| {
                *cumsum += v;
                Some((r, *cumsum / total))
            })
            .unzip();
        Self { radius, cog }
    }
    /// Smallest radius enclosing at least the flux `fraction`
    pub fn radius_at(&self, fraction: f64) -> Option<f64> {
        self.radius
            .iter()
            .zip(&self.cog)
            .find_map(|(r, c)| (*c >= fraction).then_some(*r))
    }
    /// Enclosed flux fraction within `radius`
    pub fn fraction_within(&self, radius: f64) -> f64 {
        self.radius
            .iter()
            .zip(&self.cog)
            .take_while(|(r, _)| **r <= radius)
            .last()
            .map_or(0f64, |(_, c)| *c)
    }
    pub fn len(&self) -> usize {
        self.radius.len()
    }
    pub fn is_empty(&self) -> bool {
        self.radius.is_empty()
    }
}
