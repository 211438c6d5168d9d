//! Scattered data interpolation
//!
//! The samples are triangulated once with [triangle_rs::Delaunay] and the
//! triangles bounding boxes are indexed in an [rstar::RTree] so that every
//! evaluation only tests the few triangles that may contain the query point.
//! Points outside the convex hull of the samples evaluate to `None`, the
//! caller decides on the fill value.

use crate::{Error, Result};
use nalgebra as na;
use rstar::{
    primitives::{GeomWithData, Rectangle},
    RTree,
};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

type TriangleBox = GeomWithData<Rectangle<[f64; 2]>, usize>;

const EPSILON: f64 = 1e-10;

/// Interpolation scheme
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, Display, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    /// Barycentric interpolation within each triangle
    #[default]
    Linear,
    /// Cubic Bézier patch within each triangle, built from the vertex gradients
    ///
    /// The patches match the values and gradients at the vertices and are
    /// continuous across the triangle edges, but not smooth: the normal
    /// derivative may jump across an edge (no Clough-Tocher split).
    Cubic,
}
impl Interpolation {
    /// Parses an interpolation kind, falling back to [Interpolation::Linear]
    pub fn from_kind(kind: &str) -> Self {
        kind.parse().unwrap_or_else(|_| {
            log::warn!(r#"interp_kind must be "linear" or "cubic", found "{kind}""#);
            log::warn!(r#"Using "linear" for interp_kind"#);
            Interpolation::Linear
        })
    }
}

/// Interpolator over an irregular set of 2D samples
pub struct ScatteredInterpolator {
    points: Vec<[f64; 2]>,
    values: Vec<f64>,
    triangles: Vec<[usize; 3]>,
    tree: RTree<TriangleBox>,
    gradients: Option<Vec<[f64; 2]>>,
}
impl ScatteredInterpolator {
    /// Triangulates the `points` holding the sample `values`
    pub fn new(points: Vec<[f64; 2]>, values: Vec<f64>) -> Result<Self> {
        if points.len() < 3 || is_degenerate(&points) {
            return Err(Error::Triangulation(points.len()));
        }
        let nodes: Vec<f64> = points.iter().flat_map(|p| p.to_vec()).collect();
        let del = triangle_rs::Delaunay::builder()
            .add_nodes(&nodes)
            .set_switches("Q")
            .build();
        let triangles: Vec<[usize; 3]> = del
            .triangle_iter()
            .map(|t| [t[0], t[1], t[2]])
            .filter(|&[a, b, c]| signed_area(points[a], points[b], points[c]).abs() > 0.)
            .collect();
        if triangles.is_empty() {
            return Err(Error::Triangulation(points.len()));
        }
        log::debug!(
            "triangulated {} points into {} triangles",
            points.len(),
            triangles.len()
        );
        let tree = RTree::bulk_load(
            triangles
                .iter()
                .enumerate()
                .map(|(k, t)| {
                    let (lower, upper) = t.iter().fold(
                        ([f64::INFINITY; 2], [f64::NEG_INFINITY; 2]),
                        |(mut lower, mut upper), &i| {
                            for d in 0..2 {
                                lower[d] = lower[d].min(points[i][d] - EPSILON);
                                upper[d] = upper[d].max(points[i][d] + EPSILON);
                            }
                            (lower, upper)
                        },
                    );
                    GeomWithData::new(Rectangle::from_corners(lower, upper), k)
                })
                .collect(),
        );
        Ok(Self {
            points,
            values,
            triangles,
            tree,
            gradients: None,
        })
    }
    /// Switches to the given interpolation scheme
    pub fn kind(self, kind: Interpolation) -> Self {
        match kind {
            Interpolation::Linear => Self {
                gradients: None,
                ..self
            },
            Interpolation::Cubic => {
                let gradients = Some(self.estimate_gradients());
                Self { gradients, ..self }
            }
        }
    }
    /// Number of triangles
    pub fn n_triangles(&self) -> usize {
        self.triangles.len()
    }
    /// Finds the triangle containing `(x,y)` and its barycentric coordinates
    fn locate(&self, x: f64, y: f64) -> Option<(&[usize; 3], [f64; 3])> {
        self.tree.locate_all_at_point(&[x, y]).find_map(|tb| {
            let t = &self.triangles[tb.data];
            let [a, b, c] = t.map(|i| self.points[i]);
            let area = signed_area(a, b, c);
            let l0 = signed_area([x, y], b, c) / area;
            let l1 = signed_area(a, [x, y], c) / area;
            let l2 = 1. - l0 - l1;
            (l0 >= -EPSILON && l1 >= -EPSILON && l2 >= -EPSILON).then_some((t, [l0, l1, l2]))
        })
    }
    /// Interpolated value at `(x,y)`, `None` outside the convex hull
    pub fn eval(&self, x: f64, y: f64) -> Option<f64> {
        let (t, l) = self.locate(x, y)?;
        Some(match &self.gradients {
            None => t.iter().zip(l).map(|(&i, l)| self.values[i] * l).sum(),
            Some(gradients) => self.bezier(t, l, gradients),
        })
    }
    /// Interpolated value at `(x,y)` or `fill_value` outside the convex hull
    pub fn eval_or(&self, x: f64, y: f64, fill_value: f64) -> f64 {
        self.eval(x, y).unwrap_or(fill_value)
    }
    fn bezier(&self, t: &[usize; 3], l: [f64; 3], gradients: &[[f64; 2]]) -> f64 {
        let p = t.map(|i| self.points[i]);
        let f = t.map(|i| self.values[i]);
        let g = t.map(|i| gradients[i]);
        // control point on edge i->j next to vertex i
        let edge = |i: usize, j: usize| {
            f[i] + (g[i][0] * (p[j][0] - p[i][0]) + g[i][1] * (p[j][1] - p[i][1])) / 3.
        };
        let (b210, b120) = (edge(0, 1), edge(1, 0));
        let (b201, b102) = (edge(0, 2), edge(2, 0));
        let (b021, b012) = (edge(1, 2), edge(2, 1));
        let e = (b210 + b120 + b201 + b102 + b021 + b012) / 6.;
        let c = (f[0] + f[1] + f[2]) / 3.;
        let b111 = e + 0.5 * (e - c);
        let [u, v, w] = l;
        f[0] * u * u * u
            + f[1] * v * v * v
            + f[2] * w * w * w
            + 3. * (b210 * u * u * v
                + b120 * u * v * v
                + b201 * u * u * w
                + b102 * u * w * w
                + b021 * v * v * w
                + b012 * v * w * w)
            + 6. * b111 * u * v * w
    }
    /// Least-squares gradient at each vertex from its neighbors in the triangulation
    fn estimate_gradients(&self) -> Vec<[f64; 2]> {
        let mut neighbors = vec![vec![]; self.points.len()];
        for &[a, b, c] in &self.triangles {
            for (i, j) in [(a, b), (b, c), (c, a)] {
                neighbors[i].push(j);
                neighbors[j].push(i);
            }
        }
        neighbors
            .into_iter()
            .enumerate()
            .map(|(i, mut nn)| {
                nn.sort_unstable();
                nn.dedup();
                let (a, b) = nn.iter().fold(
                    (na::Matrix2::<f64>::zeros(), na::Vector2::<f64>::zeros()),
                    |(a, b), &j| {
                        let d = na::Vector2::new(
                            self.points[j][0] - self.points[i][0],
                            self.points[j][1] - self.points[i][1],
                        );
                        (a + d * d.transpose(), b + d * (self.values[j] - self.values[i]))
                    },
                );
                a.try_inverse()
                    .map(|inv| {
                        let g = inv * b;
                        [g[0], g[1]]
                    })
                    .unwrap_or([0f64; 2])
            })
            .collect()
    }
}

// coincident or collinear points
fn is_degenerate(points: &[[f64; 2]]) -> bool {
    let p0 = points[0];
    let d2 = |p: &[f64; 2]| (p[0] - p0[0]).powi(2) + (p[1] - p0[1]).powi(2);
    let Some(&q) = points.iter().max_by(|a, b| d2(a).total_cmp(&d2(b))) else {
        return true;
    };
    let l2 = d2(&q);
    l2 == 0.
        || points
            .iter()
            .all(|&p| signed_area(p0, q, p).abs() <= EPSILON * l2)
}

fn signed_area(a: [f64; 2], b: [f64; 2], c: [f64; 2]) -> f64 {
    0.5 * ((b[0] - a[0]) * (c[1] - a[1]) - (c[0] - a[0]) * (b[1] - a[1]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(f: impl Fn(f64, f64) -> f64) -> (Vec<[f64; 2]>, Vec<f64>) {
        (0..11)
            .flat_map(|i| (0..11).map(move |j| [i as f64 * 0.2 - 1., j as f64 * 0.2 - 1.]))
            .map(|p| (p, f(p[0], p[1])))
            .unzip()
    }

    #[test]
    fn kind_parsing() {
        assert_eq!(Interpolation::from_kind("cubic"), Interpolation::Cubic);
        assert_eq!(Interpolation::from_kind("linear"), Interpolation::Linear);
        assert_eq!(Interpolation::from_kind("nearest"), Interpolation::Linear);
        assert_eq!(Interpolation::Cubic.to_string(), "cubic");
    }

    #[test]
    fn too_few_points() {
        assert!(ScatteredInterpolator::new(vec![[0., 0.], [1., 0.]], vec![1., 2.]).is_err());
    }

    #[test]
    fn degenerate_points() {
        assert!(ScatteredInterpolator::new(vec![[1., 1.]; 4], vec![1.; 4]).is_err());
        let line: Vec<[f64; 2]> = (0..5).map(|i| [i as f64, 2. * i as f64]).collect();
        assert!(ScatteredInterpolator::new(line, vec![0.; 5]).is_err());
    }

    #[test]
    fn linear_reproduces_plane() {
        let (points, values) = grid(|x, y| 2. * x - 3. * y + 0.5);
        let interp = ScatteredInterpolator::new(points, values).unwrap();
        for (x, y) in [(0.13, -0.41), (-0.99, 0.98), (0.5, 0.5), (1., -1.)] {
            let z = interp.eval(x, y).unwrap();
            assert!((z - (2. * x - 3. * y + 0.5)).abs() < 1e-9, "({x},{y}): {z}");
        }
    }

    #[test]
    fn outside_hull() {
        let (points, values) = grid(|x, _| x);
        let interp = ScatteredInterpolator::new(points, values).unwrap();
        assert!(interp.eval(1.5, 0.).is_none());
        assert_eq!(interp.eval_or(0., -1.2, 0.), 0.);
        assert!(interp.eval_or(0., -1.2, f64::NAN).is_nan());
    }

    #[test]
    fn cubic_reproduces_plane_and_nodes() {
        let (points, values) = grid(|x, y| 1. + x + y);
        let interp = ScatteredInterpolator::new(points.clone(), values.clone())
            .unwrap()
            .kind(Interpolation::Cubic);
        for (x, y) in [(0.13, -0.41), (0.77, 0.21)] {
            assert!((interp.eval(x, y).unwrap() - (1. + x + y)).abs() < 1e-9);
        }
        for (p, v) in points.iter().zip(&values).step_by(7) {
            assert!((interp.eval(p[0], p[1]).unwrap() - v).abs() < 1e-9);
        }
    }

    #[test]
    fn cubic_on_curved_surface() {
        let f = |x: f64, y: f64| (x * x + y * y) * 0.5;
        let (points, values) = grid(f);
        let cubic = ScatteredInterpolator::new(points, values)
            .unwrap()
            .kind(Interpolation::Cubic);
        for (x, y) in [(0.13, -0.41), (0.31, 0.05), (-0.45, 0.27), (0.05, 0.55)] {
            let z = cubic.eval(x, y).unwrap();
            assert!((z - f(x, y)).abs() < 1e-2, "({x},{y}): {z} vs {}", f(x, y));
        }
    }
}
